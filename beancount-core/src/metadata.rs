use std::borrow::Cow;
use std::collections::BTreeMap;

use rust_decimal::Decimal;

/// Metadata that can be attached to other Beancount information.
///
/// Keys are kept ordered so that rendering is deterministic.
pub type Meta<'a> = BTreeMap<Cow<'a, str>, MetaValue<'a>>;

/// An enum of the valid values in a metadata map.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum MetaValue<'a> {
    Text(Cow<'a, str>),
    Account(super::account::Account<'a>),
    Number(Decimal),
}

impl<'a> From<&'a str> for MetaValue<'a> {
    fn from(s: &'a str) -> Self {
        MetaValue::Text(Cow::Borrowed(s))
    }
}

impl From<String> for MetaValue<'_> {
    fn from(s: String) -> Self {
        MetaValue::Text(Cow::Owned(s))
    }
}

impl From<usize> for MetaValue<'_> {
    fn from(n: usize) -> Self {
        MetaValue::Number(Decimal::from(n))
    }
}

/// Tag associated with a transaction directive.  Tags allow you to mark a subset of transactions,
/// enabling filtering on a tag(s) when generating a report.
///
/// In the below transaction, #paypal is the tag:
///
/// ```text
///
/// 2020-03-02 ! "Coffee Roasters" #paypal
///     Assets:Paypal:Balance         -12.50 USD
///     Expenses:Uncategorized         12.50 USD
/// ```
///
/// <https://docs.google.com/document/d/1wAMVrKIA2qtRGmoVDSUBJGmYZSygUaR0uOMW1GV3YE0/edit#heading=h.oivvp5olom2v>
pub type Tag<'a> = Cow<'a, str>;

/// Links provide a way to link transactions together.  You may think of the link as a special kind
/// of tag that can be used to group together a set of financially related transactions over time.
///
/// <https://docs.google.com/document/d/1wAMVrKIA2qtRGmoVDSUBJGmYZSygUaR0uOMW1GV3YE0/edit#heading=h.k4v5vkjukel7>
pub type Link<'a> = Cow<'a, str>;
