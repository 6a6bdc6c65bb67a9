use std::borrow::Cow;
use std::collections::BTreeSet;

use typed_builder::TypedBuilder;

use super::account::Account;
use super::amount::Amount;
use super::date::Date;
use super::flags::Flag;
use super::metadata::{Link, Meta, Tag};
use super::posting::Posting;
use super::Currency;

/// One of the directives an importer can emit.
#[derive(Clone, Debug, PartialEq)]
pub enum Directive<'a> {
    Open(Open<'a>),
    Pad(Pad<'a>),
    Balance(Balance<'a>),
    Transaction(Transaction<'a>),
}

impl<'a> Directive<'a> {
    pub fn as_transaction(&self) -> Option<&Transaction<'a>> {
        match self {
            Directive::Transaction(txn) => Some(txn),
            _ => None,
        }
    }

    pub fn as_balance(&self) -> Option<&Balance<'a>> {
        match self {
            Directive::Balance(balance) => Some(balance),
            _ => None,
        }
    }
}

impl<'a> From<Open<'a>> for Directive<'a> {
    fn from(open: Open<'a>) -> Self {
        Directive::Open(open)
    }
}

impl<'a> From<Pad<'a>> for Directive<'a> {
    fn from(pad: Pad<'a>) -> Self {
        Directive::Pad(pad)
    }
}

impl<'a> From<Balance<'a>> for Directive<'a> {
    fn from(balance: Balance<'a>) -> Self {
        Directive::Balance(balance)
    }
}

impl<'a> From<Transaction<'a>> for Directive<'a> {
    fn from(txn: Transaction<'a>) -> Self {
        Directive::Transaction(txn)
    }
}

/// Represents an `open` directive, which opens an account and optionally constrains the
/// commodities it may hold.
///
/// ```text
/// 2015-01-01 open Assets:Paypal:Balance USD,EUR
/// ```
///
/// <https://docs.google.com/document/d/1wAMVrKIA2qtRGmoVDSUBJGmYZSygUaR0uOMW1GV3YE0/edit#heading=h.omdaqt2d8hmn>
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
pub struct Open<'a> {
    /// Date the account was opened.
    pub date: Date,

    /// Account being opened.
    pub account: Account<'a>,

    /// Commodities allowed in the account.  Empty means any commodity.
    #[builder(default)]
    pub currencies: Vec<Currency<'a>>,

    #[builder(default)]
    pub meta: Meta<'a>,
}

/// Represents a `pad` directive, which inserts a balancing transaction from `pad_from_account`
/// so that the next balance assertion on `pad_to_account` holds.
///
/// ```text
/// 2016-01-01 pad Assets:Schwab:PersonalChecking Equity:Opening-Balances
/// ```
///
/// <https://docs.google.com/document/d/1wAMVrKIA2qtRGmoVDSUBJGmYZSygUaR0uOMW1GV3YE0/edit#heading=h.aw8ic3d8k2rq>
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
pub struct Pad<'a> {
    pub date: Date,

    /// Account that receives the padding.
    pub pad_to_account: Account<'a>,

    /// Account the padding is taken from.
    pub pad_from_account: Account<'a>,

    #[builder(default)]
    pub meta: Meta<'a>,
}

/// Represents a `balance` directive, which is a way for you to input your statement balance into
/// the flow of transactions.
///
/// It tells Beancount to verify that the number of units of a particular commodity in some account
/// should equal some expected value at the beginning of the given day.
///
/// ```text
/// 2020-01-06 balance Assets:Upwork:Balance     100 USD
/// ```
///
/// <https://docs.google.com/document/d/1wAMVrKIA2qtRGmoVDSUBJGmYZSygUaR0uOMW1GV3YE0/edit#heading=h.l0pvgeniwvq8>
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
pub struct Balance<'a> {
    /// Date of the balance.
    pub date: Date,

    /// Account to check the balance of.
    pub account: Account<'a>,

    /// Amount to balance.
    pub amount: Amount<'a>,

    #[builder(default)]
    pub meta: Meta<'a>,
}

/// Represents a transaction: a dated, flagged set of postings that sum to zero.
///
/// ```text
/// 2020-01-05 * "Withdrawal to bank: xxxx-1234" #Upwork-Withdrawal
///     Assets:Upwork:Balance                     -500 USD
///     Assets:InTransit:Upwork:Schwab-1234        500 USD
/// ```
///
/// <https://docs.google.com/document/d/1wAMVrKIA2qtRGmoVDSUBJGmYZSygUaR0uOMW1GV3YE0/edit#heading=h.up4dj751q84w>
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
pub struct Transaction<'a> {
    pub date: Date,

    #[builder(default)]
    pub flag: Flag<'a>,

    #[builder(default)]
    pub payee: Option<Cow<'a, str>>,

    pub narration: Cow<'a, str>,

    #[builder(default)]
    pub tags: BTreeSet<Tag<'a>>,

    #[builder(default)]
    pub links: BTreeSet<Link<'a>>,

    pub postings: Vec<Posting<'a>>,

    #[builder(default)]
    pub meta: Meta<'a>,
}
