use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use typed_builder::TypedBuilder;

use super::account_types::AccountType;

/// Represents an account.
///
/// Beancount accumulates commodities in accounts.  An account name is a
/// colon-separated list of capitalized words which begin with a letter, and whose first word must
/// be one of the five acceptable account types.
///
/// Some example accounts:
///
/// ```text
/// Assets:Paypal:Balance
/// Assets:InTransit:Upwork:Schwab-1234
/// Equity:Earnings:Previous
/// Income:Upwork:Hourly
/// Expenses:Donations:Paypal
/// ```
///
/// <https://docs.google.com/document/d/1wAMVrKIA2qtRGmoVDSUBJGmYZSygUaR0uOMW1GV3YE0/edit#heading=h.17ry42rqbuiu>
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, TypedBuilder)]
pub struct Account<'a> {
    /// Type of the account.
    pub ty: AccountType,

    /// Parts of the account following the account type.
    pub parts: Vec<Cow<'a, str>>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("account `{0}` does not start with Assets, Liabilities, Equity, Income or Expenses")]
    UnknownRoot(String),
    #[error("account `{0}` has no components after its root")]
    MissingComponents(String),
    #[error("account `{0}` contains an empty component")]
    EmptyComponent(String),
}

impl<'a> Account<'a> {
    /// Parse a colon-separated account name, borrowing its components from `name`.
    pub fn parse(name: &'a str) -> Result<Self, AccountError> {
        let mut pieces = name.split(':');
        let ty = pieces
            .next()
            .and_then(|root| root.parse::<AccountType>().ok())
            .ok_or_else(|| AccountError::UnknownRoot(name.to_string()))?;
        let parts: Vec<Cow<'a, str>> = pieces.map(Cow::Borrowed).collect();
        if parts.is_empty() {
            return Err(AccountError::MissingComponents(name.to_string()));
        }
        if parts.iter().any(|p| p.is_empty()) {
            return Err(AccountError::EmptyComponent(name.to_string()));
        }
        Ok(Account { ty, parts })
    }

    /// Returns a new account with `part` appended as the last component.
    pub fn join<S: Into<Cow<'a, str>>>(&self, part: S) -> Self {
        let mut parts = self.parts.clone();
        parts.push(part.into());
        Account { ty: self.ty, parts }
    }

    pub fn into_owned(self) -> Account<'static> {
        Account {
            ty: self.ty,
            parts: self
                .parts
                .into_iter()
                .map(|p| Cow::Owned(p.into_owned()))
                .collect(),
        }
    }
}

impl FromStr for Account<'static> {
    type Err = AccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Account::parse(s).map(Account::into_owned)
    }
}

impl fmt::Display for Account<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ty.default_name())?;
        for part in &self.parts {
            write!(f, ":{}", part)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let acc = Account::parse("Assets:InTransit:Upwork:Schwab-1234").unwrap();
        assert_eq!(acc.ty, AccountType::Assets);
        assert_eq!(acc.parts.len(), 3);
        assert_eq!(acc.to_string(), "Assets:InTransit:Upwork:Schwab-1234");
    }

    #[test]
    fn parse_rejects_bad_names() {
        assert_eq!(
            Account::parse("Cash:Wallet"),
            Err(AccountError::UnknownRoot("Cash:Wallet".into()))
        );
        assert_eq!(
            Account::parse("Assets"),
            Err(AccountError::MissingComponents("Assets".into()))
        );
        assert_eq!(
            Account::parse("Assets::Paypal"),
            Err(AccountError::EmptyComponent("Assets::Paypal".into()))
        );
    }

    #[test]
    fn join_appends_component() {
        let prefix: Account<'static> = "Income:Schwab:Interest".parse().unwrap();
        assert_eq!(
            prefix.join("PersonalChecking").to_string(),
            "Income:Schwab:Interest:PersonalChecking"
        );
    }
}
