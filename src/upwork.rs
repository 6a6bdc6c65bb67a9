//! Upwork transaction statements (`statements_<start>_<end>.csv`), newest row first.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use beancount_core::{Account, AccountType, Date, Directive, Flag, MetaValue, Transaction};
use chrono::NaiveDate;
use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;
use serde::Deserialize;
use typed_builder::TypedBuilder;

use crate::balance::BalanceTracker;
use crate::entries::{account, open_accounts, posting_pair, source_meta, DEFAULT_CURRENCY};
use crate::error::{ImportError, Result};
use crate::importer::{
    header_matches, match_file_name, parse_amount, parse_date, strip_bom, Importer, RowOrder,
};

lazy_static! {
    static ref FILE_NAME: Regex =
        Regex::new(r"^statements_[0-9]{4}-[0-9]{2}-[0-9]{2}_([0-9]{4}-[0-9]{2}-[0-9]{2})\.csv$")
            .expect("valid regex");
    static ref LAST_FOUR: Regex = Regex::new(r".*: xxxx-([0-9]{4})").expect("valid regex");
}

const HEADERS: [&str; 13] = [
    "Date",
    "Ref ID",
    "Type",
    "Description",
    "Agency",
    "Freelancer",
    "Team",
    "Account Name",
    "PO",
    "Amount",
    "Amount in local currency",
    "Currency",
    "Balance",
];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TxnType {
    Withdrawal,
    FixedPrice,
    Bonus,
    Hourly,
    Refund,
    ServiceFee,
    Miscellaneous,
}

impl TxnType {
    fn parse(raw: &str, line: usize) -> Result<Self> {
        Ok(match raw.trim() {
            "Withdrawal" => TxnType::Withdrawal,
            "Fixed Price" => TxnType::FixedPrice,
            "Bonus" => TxnType::Bonus,
            "Hourly" => TxnType::Hourly,
            "Refund" => TxnType::Refund,
            "Service Fee" => TxnType::ServiceFee,
            "Miscellaneous" => TxnType::Miscellaneous,
            other => {
                return Err(ImportError::UnrecognizedType {
                    line,
                    value: other.to_string(),
                })
            }
        })
    }

    pub fn tag(self) -> &'static str {
        match self {
            TxnType::Withdrawal => "Upwork-Withdrawal",
            TxnType::FixedPrice => "Upwork-FixedPrice",
            TxnType::Bonus => "Upwork-Bonus",
            TxnType::Hourly => "Upwork-Hourly",
            TxnType::Refund => "Upwork-Refund",
            TxnType::ServiceFee => "Upwork-ServiceFee",
            TxnType::Miscellaneous => "Upwork-Miscellaneous",
        }
    }

    /// Counter-account for every type except withdrawals, which go in transit.
    fn category(self) -> Option<Account<'static>> {
        let (ty, leaf) = match self {
            TxnType::Withdrawal => return None,
            TxnType::FixedPrice => (AccountType::Income, "FixedPrice"),
            TxnType::Bonus => (AccountType::Income, "Bonus"),
            TxnType::Hourly => (AccountType::Income, "Hourly"),
            TxnType::Miscellaneous => (AccountType::Income, "Miscellaneous"),
            TxnType::Refund => (AccountType::Expenses, "Refund"),
            TxnType::ServiceFee => (AccountType::Expenses, "ServiceFee"),
        };
        Some(account(ty, &["Upwork", leaf]))
    }

    const ALL: [TxnType; 7] = [
        TxnType::Withdrawal,
        TxnType::FixedPrice,
        TxnType::Bonus,
        TxnType::Hourly,
        TxnType::Refund,
        TxnType::ServiceFee,
        TxnType::Miscellaneous,
    ];
}

pub fn balance_account() -> Account<'static> {
    account(AccountType::Assets, &["Upwork", "Balance"])
}

/// Where a withdrawal sits until it lands in the bank account ending in `last_four`.
pub fn in_transit_account(last_four: &str) -> Account<'static> {
    account(AccountType::Assets, &["InTransit", "Upwork"]).join(format!("Schwab-{}", last_four))
}

/// Last four digits of the destination account in a withdrawal description such as
/// `Withdrawal Method: Direct to U.S. bank (ACH) - Account ending in: xxxx-1234`.
fn last_four(description: &str, line: usize) -> Result<String> {
    LAST_FOUR
        .captures(description)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| ImportError::AccountSuffix {
            line,
            description: description.to_string(),
        })
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpworkRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Amount")]
    pub amount: String,
    #[serde(rename = "Currency")]
    pub currency: String,
    #[serde(rename = "Balance")]
    pub balance: String,
}

fn default_open_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 1, 1).expect("valid date")
}

#[derive(Clone, Debug, PartialEq, Deserialize, TypedBuilder)]
#[serde(deny_unknown_fields)]
pub struct UpworkImporter {
    /// Last four digits of each bank account withdrawals are sent to, mapped to its ledger
    /// account.
    #[builder(default)]
    #[serde(default)]
    pub bank_accounts: BTreeMap<String, String>,

    #[builder(default = default_open_date())]
    #[serde(default = "default_open_date")]
    pub open_date: NaiveDate,
}

impl UpworkImporter {
    fn preamble(&self) -> Vec<Directive<'static>> {
        let mut accounts = vec![balance_account()];
        accounts.extend(TxnType::ALL.iter().filter_map(|t| t.category()));
        accounts.extend(self.bank_accounts.keys().map(|k| in_transit_account(k)));
        open_accounts(&accounts, self.open_date, &[DEFAULT_CURRENCY.to_string()])
    }

    /// Classifies one record, returning the entries it produces.
    pub fn classify(
        &self,
        file: &Path,
        line: usize,
        row: &UpworkRow,
        balances: &mut BalanceTracker,
    ) -> Result<Vec<Directive<'static>>> {
        let date = parse_date(&row.date, line)?;
        let kind = TxnType::parse(&row.kind, line)?;
        let num = match parse_amount(&row.amount, line)? {
            Some(num) => num,
            None => {
                debug!("line {}: no amount, skipping", line);
                return Ok(Vec::new());
            }
        };
        let currency = match row.currency.trim() {
            "" => DEFAULT_CURRENCY,
            cur => cur,
        };

        let mut meta = source_meta(file, line);
        let counter = match kind.category() {
            Some(category) => category,
            None => {
                let last_four = last_four(&row.description, line)?;
                let destination = self.bank_accounts.get(&last_four).ok_or_else(|| {
                    ImportError::MissingMapping {
                        line,
                        last_four: last_four.clone(),
                    }
                })?;
                let destination: Account<'static> = destination.parse()?;
                meta.insert(Cow::Borrowed("destination"), MetaValue::Account(destination));
                in_transit_account(&last_four)
            }
        };

        // Amounts are signed from the balance's side: withdrawals and fees are negative.
        let postings = posting_pair(&balance_account(), &counter, num, currency);
        let tags: BTreeSet<Cow<'static, str>> = std::iter::once(Cow::Borrowed(kind.tag())).collect();
        let txn = Transaction::builder()
            .date(Date::from(date))
            .flag(Flag::Okay)
            .narration(Cow::Owned(row.description.clone()))
            .tags(tags)
            .postings(postings)
            .meta(meta.clone())
            .build();
        let mut entries = vec![Directive::from(txn)];

        let balance = parse_amount(&row.balance, line)?.ok_or_else(|| {
            ImportError::MalformedRow {
                line,
                message: "missing running balance".to_string(),
            }
        })?;
        let due = balances.observe(&balance_account(), date, currency, balance, &meta);
        entries.extend(due.into_iter().map(Directive::from));
        Ok(entries)
    }
}

impl Importer for UpworkImporter {
    fn name(&self) -> &'static str {
        "upwork"
    }

    fn identify(&self, file: &Path) -> Result<bool> {
        if match_file_name(&FILE_NAME, file).is_none() {
            return Ok(false);
        }
        let mut rdr = match csv::ReaderBuilder::new().has_headers(false).from_path(file) {
            Ok(rdr) => rdr,
            Err(_) => return Ok(false),
        };
        let mut header = csv::StringRecord::new();
        Ok(rdr.read_record(&mut header).unwrap_or(false) && header_matches(&header, &HEADERS))
    }

    fn file_account(&self, _file: &Path) -> Option<Account<'static>> {
        Some(account(AccountType::Assets, &["Upwork"]))
    }

    fn file_date(&self, file: &Path) -> Option<NaiveDate> {
        let caps = match_file_name(&FILE_NAME, file)?;
        NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()
    }

    fn extract(&self, file: &Path) -> Result<Vec<Directive<'static>>> {
        let mut entries = self.preamble();
        let mut rdr = csv::ReaderBuilder::new().from_path(file)?;
        let headers = strip_bom(rdr.headers()?);

        let mut balances = BalanceTracker::new(RowOrder::ReverseChronological);
        let mut record = csv::StringRecord::new();
        while rdr.read_record(&mut record)? {
            let line = record.position().map_or(0, |p| p.line() as usize);
            let row: UpworkRow = record.deserialize(Some(&headers))?;
            entries.extend(self.classify(file, line, &row, &mut balances)?);
        }

        info!("{}: extracted {} entries", file.display(), entries.len());
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beancount_core::Amount;
    use rust_decimal_macros::dec;

    const FILE: &str = "statements_2020-01-01_2020-01-31.csv";

    fn importer() -> UpworkImporter {
        let mut bank_accounts = BTreeMap::new();
        bank_accounts.insert("1234".to_string(), "Assets:Schwab:Checking".to_string());
        UpworkImporter::builder().bank_accounts(bank_accounts).build()
    }

    fn row(date: &str, kind: &str, description: &str, amount: &str, balance: &str) -> UpworkRow {
        UpworkRow {
            date: date.to_string(),
            kind: kind.to_string(),
            description: description.to_string(),
            amount: amount.to_string(),
            currency: "USD".to_string(),
            balance: balance.to_string(),
        }
    }

    fn classify(rows: &[UpworkRow]) -> Result<Vec<Directive<'static>>> {
        let importer = importer();
        let mut balances = BalanceTracker::new(RowOrder::ReverseChronological);
        let mut out = Vec::new();
        for (i, r) in rows.iter().enumerate() {
            out.extend(importer.classify(Path::new(FILE), i + 2, r, &mut balances)?);
        }
        Ok(out)
    }

    #[test]
    fn withdrawal_goes_in_transit() {
        let entries = classify(&[row(
            "Jan 5, 2020",
            "Withdrawal",
            "Withdrawal Method: Direct to U.S. bank (ACH) - Account ending in: xxxx-1234",
            "-500.00",
            "100.00",
        )])
        .unwrap();
        assert_eq!(entries.len(), 2);

        let txn = entries[0].as_transaction().unwrap();
        assert_eq!(txn.postings[0].account, balance_account());
        assert_eq!(txn.postings[0].units, Amount::new(dec!(-500.00), "USD"));
        assert_eq!(
            txn.postings[1].account.to_string(),
            "Assets:InTransit:Upwork:Schwab-1234"
        );
        assert_eq!(txn.postings[1].units, Amount::new(dec!(500.00), "USD"));
        assert!(txn.tags.contains("Upwork-Withdrawal"));
        assert_eq!(
            txn.meta.get("destination"),
            Some(&MetaValue::Account("Assets:Schwab:Checking".parse().unwrap()))
        );

        let balance = entries[1].as_balance().unwrap();
        assert_eq!(balance.date.to_string(), "2020-01-06");
        assert_eq!(balance.account, balance_account());
        assert_eq!(balance.amount, Amount::new(dec!(100.00), "USD"));
    }

    #[test]
    fn earnings_and_fees_are_categorised() {
        let entries = classify(&[
            row("Jan 5, 2020", "Service Fee", "Service Fee for contract", "-6.00", "54.00"),
            row("Jan 5, 2020", "Hourly", "Invoice for hours", "60.00", "60.00"),
        ])
        .unwrap();
        let txns: Vec<_> = entries.iter().filter_map(|d| d.as_transaction()).collect();
        assert_eq!(txns[0].postings[1].account.to_string(), "Expenses:Upwork:ServiceFee");
        assert_eq!(txns[0].postings[1].units, Amount::new(dec!(6.00), "USD"));
        assert!(txns[0].tags.contains("Upwork-ServiceFee"));
        assert_eq!(txns[1].postings[1].account.to_string(), "Income:Upwork:Hourly");
        assert_eq!(txns[1].flag, Flag::Okay);

        let balances: Vec<_> = entries.iter().filter_map(|d| d.as_balance()).collect();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].amount, Amount::new(dec!(54.00), "USD"));
    }

    #[test]
    fn withdrawal_without_account_number_is_fatal() {
        let err = classify(&[row("Jan 5, 2020", "Withdrawal", "To bank", "-5", "0")]).unwrap_err();
        assert!(matches!(err, ImportError::AccountSuffix { line: 2, .. }));
    }

    #[test]
    fn unmapped_account_is_fatal() {
        let err = classify(&[row(
            "Jan 5, 2020",
            "Withdrawal",
            "Account ending in: xxxx-9999",
            "-5",
            "0",
        )])
        .unwrap_err();
        assert!(matches!(
            err,
            ImportError::MissingMapping { line: 2, ref last_four } if last_four == "9999"
        ));
    }

    #[test]
    fn missing_balance_is_fatal() {
        let err = classify(&[
            row("Jan 5, 2020", "Hourly", "Invoice", "10.00", ""),
            row("Jan 5, 2020", "Hourly", "Invoice", "50.00", "90.00"),
        ])
        .unwrap_err();
        assert!(matches!(err, ImportError::MalformedRow { line: 2, .. }));
    }

    #[test]
    fn empty_amount_is_skipped() {
        let entries = classify(&[
            row("Jan 5, 2020", "Hourly", "Pending invoice", "", "100.00"),
            row("Jan 5, 2020", "Hourly", "Invoice", "40.00", "100.00"),
        ])
        .unwrap();
        let txns: Vec<_> = entries.iter().filter_map(|d| d.as_transaction()).collect();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].meta.get("lineno"), Some(&MetaValue::from(3usize)));

        let balances: Vec<_> = entries.iter().filter_map(|d| d.as_balance()).collect();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].amount, Amount::new(dec!(100.00), "USD"));
    }

    #[test]
    fn blank_currency_defaults_to_usd() {
        let mut bonus = row("Jan 5, 2020", "Bonus", "Bonus for great work", "25.00", "25.00");
        bonus.currency = "  ".to_string();
        let entries = classify(&[bonus]).unwrap();
        let txn = entries[0].as_transaction().unwrap();
        assert_eq!(txn.postings[0].units, Amount::new(dec!(25.00), "USD"));
        assert_eq!(txn.postings[1].units, Amount::new(dec!(-25.00), "USD"));
        assert_eq!(txn.postings[1].account.to_string(), "Income:Upwork:Bonus");
        assert_eq!(
            entries[1].as_balance().unwrap().amount,
            Amount::new(dec!(25.00), "USD")
        );
    }

    #[test]
    fn unknown_type_is_fatal() {
        let err = classify(&[row("Jan 5, 2020", "Payment", "", "5", "5")]).unwrap_err();
        assert!(matches!(err, ImportError::UnrecognizedType { line: 2, .. }));
    }

    #[test]
    fn preamble_opens_categories_and_transit_accounts() {
        let opened: Vec<String> = importer()
            .preamble()
            .iter()
            .filter_map(|d| match d {
                Directive::Open(open) => Some(open.account.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(opened.len(), 8);
        assert_eq!(opened[0], "Assets:Upwork:Balance");
        assert!(opened.contains(&"Expenses:Upwork:Refund".to_string()));
        assert_eq!(opened[7], "Assets:InTransit:Upwork:Schwab-1234");
    }

    #[test]
    fn file_date_is_statement_end() {
        assert_eq!(
            importer().file_date(Path::new(FILE)),
            NaiveDate::from_ymd_opt(2020, 1, 31)
        );
        assert!(importer()
            .file_date(Path::new("statements_2020-01-01.csv"))
            .is_none());
    }
}
