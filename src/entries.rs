//! Constructors for the directives every importer emits.

use std::borrow::Cow;
use std::path::Path;

use beancount_core::{
    Account, AccountType, Amount, Date, Directive, Meta, MetaValue, Open, Pad, Posting,
};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

pub const DEFAULT_CURRENCY: &str = "USD";

/// Builds an account from its root and static components.
pub fn account(ty: AccountType, parts: &[&'static str]) -> Account<'static> {
    Account::builder()
        .ty(ty)
        .parts(parts.iter().map(|p| Cow::Borrowed(*p)).collect())
        .build()
}

/// Fallback for money coming in that no rule categorised.
pub fn income_fallback() -> Account<'static> {
    account(AccountType::Income, &["Uncategorized"])
}

/// Fallback for money going out that no rule categorised.
pub fn expense_fallback() -> Account<'static> {
    account(AccountType::Expenses, &["Uncategorized"])
}

fn opening_balances() -> Account<'static> {
    account(AccountType::Equity, &["Opening-Balances"])
}

/// `filename` and `lineno` metadata pointing back at the CSV record an entry came from.
pub fn source_meta(file: &Path, line: usize) -> Meta<'static> {
    let mut meta = Meta::new();
    meta.insert(
        Cow::Borrowed("filename"),
        MetaValue::from(file.display().to_string()),
    );
    meta.insert(Cow::Borrowed("lineno"), MetaValue::from(line));
    meta
}

/// An `open` directive for each account, all restricted to `currencies`.
pub fn open_accounts(
    accounts: &[Account<'static>],
    date: NaiveDate,
    currencies: &[String],
) -> Vec<Directive<'static>> {
    let currencies: Vec<Cow<'static, str>> =
        currencies.iter().map(|c| Cow::Owned(c.clone())).collect();
    accounts
        .iter()
        .map(|account| {
            Open::builder()
                .date(Date::from(date))
                .account(account.clone())
                .currencies(currencies.clone())
                .build()
                .into()
        })
        .collect()
}

/// A `pad` directive filling `account` from the opening-balances equity account.
pub fn pad_account(account: &Account<'static>, date: NaiveDate) -> Directive<'static> {
    Pad::builder()
        .date(Date::from(date))
        .pad_to_account(account.clone())
        .pad_from_account(opening_balances())
        .build()
        .into()
}

pub fn simple_posting(account: &Account<'static>, num: Decimal, currency: &str) -> Posting<'static> {
    Posting::builder()
        .account(account.clone())
        .units(Amount::new(num, currency.to_string()))
        .build()
}

/// Two postings moving `num` into `pos_acc` and out of `neg_acc`.
pub fn posting_pair(
    pos_acc: &Account<'static>,
    neg_acc: &Account<'static>,
    num: Decimal,
    currency: &str,
) -> Vec<Posting<'static>> {
    vec![
        simple_posting(pos_acc, num, currency),
        simple_posting(neg_acc, -num, currency),
    ]
}

/// Rounds `value` to `digits` significant figures, dropping trailing zeros.
pub fn round_significant(value: Decimal, digits: u32) -> Decimal {
    value
        .round_sf_with_strategy(digits, RoundingStrategy::MidpointNearestEven)
        .unwrap_or(value)
        .normalize()
}
