use std::borrow::Cow;

use rust_decimal::Decimal;
use typed_builder::TypedBuilder;

use super::Currency;

/// A number of units of a certain commodity.
#[derive(Clone, Debug, Eq, PartialEq, TypedBuilder)]
pub struct Amount<'a> {
    /// The value of the amount.
    pub num: Decimal,

    /// The commodity of the amount.
    pub currency: Currency<'a>,
}

impl<'a> Amount<'a> {
    pub fn new<C: Into<Cow<'a, str>>>(num: Decimal, currency: C) -> Self {
        Amount {
            num,
            currency: currency.into(),
        }
    }
}
