use typed_builder::TypedBuilder;

use super::account::Account;
use super::amount::Amount;
use super::flags::Flag;
use super::metadata::Meta;

/// Represents a transaction posting.  Postings represent a single amount being deposited to or
/// withdrawn from an account.
///
/// A posting may carry a per-unit price, the amount and commodity following the `@`:
///
/// ```text
/// 2020-03-04 * "General Currency Conversion" #paypal #currency-conversion
///     Assets:Paypal:Balance            -100.00 USD
///     Assets:Paypal:Balance              91.23 EUR @ 1.0961 USD
/// ```
///
/// <https://docs.google.com/document/d/1wAMVrKIA2qtRGmoVDSUBJGmYZSygUaR0uOMW1GV3YE0/edit#heading=h.mtqrwt24wnzs>
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
pub struct Posting<'a> {
    /// Account being posted to.
    pub account: Account<'a>,

    /// The amount being posted.
    pub units: Amount<'a>,

    /// The per-unit price of this posting.
    #[builder(default)]
    pub price: Option<Amount<'a>>,

    #[builder(default)]
    pub flag: Option<Flag<'a>>,

    #[builder(default)]
    pub meta: Meta<'a>,
}

impl Posting<'_> {
    /// The amount this posting contributes to the transaction balance: the units converted
    /// through the price when there is one.
    pub fn weight(&self) -> Amount<'_> {
        match &self.price {
            Some(price) => Amount::new(self.units.num * price.num, price.currency.as_ref()),
            None => Amount::new(self.units.num, self.units.currency.as_ref()),
        }
    }
}
