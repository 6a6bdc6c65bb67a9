//! Schwab Bank checking export (`<Name>_Checking_Transactions_<YYYYMMDD>-<n>.CSV`).
//!
//! The file starts with a title line, then the header, then two summary lines that are not
//! transactions.  Rows are newest first and every money column carries a `$`.

use std::borrow::Cow;
use std::path::Path;

use beancount_core::{Account, AccountType, Date, Directive, Flag, Transaction};
use chrono::NaiveDate;
use csv::StringRecord;
use lazy_static::lazy_static;
use log::info;
use regex::Regex;
use serde::Deserialize;
use typed_builder::TypedBuilder;

use crate::balance::BalanceTracker;
use crate::entries::{
    account, expense_fallback, income_fallback, open_accounts, pad_account, posting_pair,
    source_meta, DEFAULT_CURRENCY,
};
use crate::error::{ImportError, Result};
use crate::importer::{
    header_matches, match_file_name, parse_amount, parse_date, strip_bom, Importer, RowOrder,
};

lazy_static! {
    static ref IDENTIFY_NAME: Regex =
        Regex::new(r"^[A-Za-z]*_Checking_Transactions_[0-9]{8}-[0-9]*\.CSV$")
            .expect("valid regex");
    static ref ACCOUNT_NAME: Regex =
        Regex::new(r"^([A-Za-z].*)_Transactions_([0-9]{8})-[0-9]*\.CSV$").expect("valid regex");
}

const HEADERS: [&str; 7] = [
    "Date",
    "Type",
    "Check #",
    "Description",
    "Withdrawal (-)",
    "Deposit (+)",
    "RunningBalance",
];

/// 1-based line numbers that never hold transactions.
const SKIP_LINES: [usize; 3] = [1, 3, 4];
const HEADER_LINE: usize = 2;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TxnType {
    Ach,
    Atm,
    AtmRebate,
    Check,
    Deposit,
    InterestAdjust,
    Transfer,
    Visa,
    Wire,
}

impl TxnType {
    fn parse(raw: &str, line: usize) -> Result<Self> {
        Ok(match raw.trim() {
            "ACH" => TxnType::Ach,
            "ATM" => TxnType::Atm,
            "ATMREBATE" => TxnType::AtmRebate,
            "CHECK" => TxnType::Check,
            "DEPOSIT" => TxnType::Deposit,
            "INTADJUST" => TxnType::InterestAdjust,
            "TRANSFER" => TxnType::Transfer,
            "VISA" => TxnType::Visa,
            "WIRE" => TxnType::Wire,
            other => {
                return Err(ImportError::UnrecognizedType {
                    line,
                    value: other.to_string(),
                })
            }
        })
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SchwabRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Withdrawal (-)")]
    pub withdrawal: String,
    #[serde(rename = "Deposit (+)")]
    pub deposit: String,
    #[serde(rename = "RunningBalance")]
    pub balance: String,
}

/// Ledger accounts derived from one export's filename.
#[derive(Clone, Debug, PartialEq)]
pub struct SchwabAccounts {
    pub checking: Account<'static>,
    pub atm_rebate: Account<'static>,
    pub interest: Account<'static>,
}

fn default_prefix() -> String {
    "Assets:Schwab".to_string()
}

fn default_open_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2016, 1, 1).expect("valid date")
}

#[derive(Clone, Debug, PartialEq, Deserialize, TypedBuilder)]
#[serde(deny_unknown_fields)]
pub struct SchwabImporter {
    /// Parent of the per-file checking account, e.g. `Assets:Schwab`.
    #[builder(default = default_prefix())]
    #[serde(default = "default_prefix")]
    pub account_prefix: String,

    #[builder(default = default_open_date())]
    #[serde(default = "default_open_date")]
    pub open_date: NaiveDate,
}

/// `Personal_Checking_Transactions_20200105-1.CSV` → `PersonalChecking`.
fn account_suffix(file: &Path) -> Option<String> {
    let caps = match_file_name(&ACCOUNT_NAME, file)?;
    Some(caps[1].replace('_', ""))
}

impl SchwabImporter {
    pub fn accounts(&self, file: &Path) -> Result<SchwabAccounts> {
        let suffix =
            account_suffix(file).ok_or_else(|| ImportError::UnidentifiedFile(file.into()))?;
        let checking: Account<'static> = format!("{}:{}", self.account_prefix, suffix).parse()?;
        let income = |leaf: &'static str| {
            account(AccountType::Income, &["Schwab", leaf]).join(suffix.clone())
        };
        Ok(SchwabAccounts {
            checking,
            atm_rebate: income("AtmRebate"),
            interest: income("Interest"),
        })
    }

    /// Classifies one record, returning the entries it produces.
    pub fn classify(
        &self,
        file: &Path,
        line: usize,
        row: &SchwabRow,
        accounts: &SchwabAccounts,
        balances: &mut BalanceTracker,
    ) -> Result<Vec<Directive<'static>>> {
        let date = parse_date(&row.date, line)?;
        let kind = TxnType::parse(&row.kind, line)?;

        let (income, flag) = match kind {
            TxnType::AtmRebate => (accounts.atm_rebate.clone(), Flag::Okay),
            TxnType::InterestAdjust => (accounts.interest.clone(), Flag::Okay),
            // TODO: transfers name the other Schwab account in the description; route them
            // there instead of the uncategorized fallbacks.
            _ => (income_fallback(), Flag::Warning),
        };

        let withdrawal = parse_amount(&row.withdrawal, line)?;
        let deposit = parse_amount(&row.deposit, line)?;
        let postings = match (withdrawal, deposit) {
            (Some(num), None) => {
                posting_pair(&expense_fallback(), &accounts.checking, num, DEFAULT_CURRENCY)
            }
            (None, Some(num)) => posting_pair(&accounts.checking, &income, num, DEFAULT_CURRENCY),
            _ => {
                return Err(ImportError::MalformedRow {
                    line,
                    message: format!(
                        "expected exactly one of '{}' and '{}' to be present, but found ({:?}, {:?})",
                        HEADERS[4], HEADERS[5], row.withdrawal, row.deposit
                    ),
                })
            }
        };

        let meta = source_meta(file, line);
        let txn = Transaction::builder()
            .date(Date::from(date))
            .flag(flag)
            .narration(Cow::Owned(row.description.clone()))
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
        let due = balances.observe(&accounts.checking, date, DEFAULT_CURRENCY, balance, &meta);
        entries.extend(due.into_iter().map(Directive::from));
        Ok(entries)
    }
}

/// Reads every record with its 1-based line number, leaving out the known junk lines.
fn read_records(file: &Path) -> Result<Vec<(usize, StringRecord)>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(file)?;
    let mut out = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let line = i + 1;
        if SKIP_LINES.contains(&line) {
            continue;
        }
        out.push((line, record?));
    }
    Ok(out)
}

/// Reads no further than the header line.
fn read_header(file: &Path) -> Result<Option<StringRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(file)?;
    let mut record = StringRecord::new();
    for _ in 0..HEADER_LINE {
        if !rdr.read_record(&mut record)? {
            return Ok(None);
        }
    }
    Ok(Some(record))
}

impl Importer for SchwabImporter {
    fn name(&self) -> &'static str {
        "schwab"
    }

    fn identify(&self, file: &Path) -> Result<bool> {
        if match_file_name(&IDENTIFY_NAME, file).is_none() {
            return Ok(false);
        }
        Ok(match read_header(file) {
            Ok(Some(header)) => header_matches(&header, &HEADERS),
            _ => false,
        })
    }

    fn file_account(&self, file: &Path) -> Option<Account<'static>> {
        self.accounts(file).ok().map(|accounts| accounts.checking)
    }

    fn file_date(&self, file: &Path) -> Option<NaiveDate> {
        let caps = match_file_name(&ACCOUNT_NAME, file)?;
        let digits = &caps[2];
        NaiveDate::from_ymd_opt(
            digits[..4].parse().ok()?,
            digits[4..6].parse().ok()?,
            digits[6..].parse().ok()?,
        )
    }

    fn extract(&self, file: &Path) -> Result<Vec<Directive<'static>>> {
        let accounts = self.accounts(file)?;
        let mut entries = open_accounts(
            &[
                accounts.checking.clone(),
                accounts.atm_rebate.clone(),
                accounts.interest.clone(),
            ],
            self.open_date,
            &[DEFAULT_CURRENCY.to_string()],
        );
        entries.push(pad_account(&accounts.checking, self.open_date));

        let mut records = read_records(file)?.into_iter();
        let headers = match records.next() {
            Some((_, headers)) => strip_bom(&headers),
            None => return Err(ImportError::UnidentifiedFile(file.into())),
        };

        let mut balances = BalanceTracker::new(RowOrder::ReverseChronological);
        for (line, record) in records {
            let row: SchwabRow = record.deserialize(Some(&headers))?;
            entries.extend(self.classify(file, line, &row, &accounts, &mut balances)?);
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

    const FILE: &str = "Personal_Checking_Transactions_20200105-1.CSV";

    fn row(date: &str, kind: &str, withdrawal: &str, deposit: &str, balance: &str) -> SchwabRow {
        SchwabRow {
            date: date.to_string(),
            kind: kind.to_string(),
            description: format!("{} row", kind),
            withdrawal: withdrawal.to_string(),
            deposit: deposit.to_string(),
            balance: balance.to_string(),
        }
    }

    fn classify(rows: &[SchwabRow]) -> Result<Vec<Directive<'static>>> {
        let importer = SchwabImporter::builder().build();
        let accounts = importer.accounts(Path::new(FILE))?;
        let mut balances = BalanceTracker::new(RowOrder::ReverseChronological);
        let mut out = Vec::new();
        for (i, r) in rows.iter().enumerate() {
            out.extend(importer.classify(Path::new(FILE), i + 5, r, &accounts, &mut balances)?);
        }
        Ok(out)
    }

    #[test]
    fn accounts_come_from_the_filename() {
        let importer = SchwabImporter::builder().build();
        let accounts = importer.accounts(Path::new(FILE)).unwrap();
        assert_eq!(accounts.checking.to_string(), "Assets:Schwab:PersonalChecking");
        assert_eq!(
            accounts.atm_rebate.to_string(),
            "Income:Schwab:AtmRebate:PersonalChecking"
        );
        assert_eq!(
            accounts.interest.to_string(),
            "Income:Schwab:Interest:PersonalChecking"
        );
        assert_eq!(
            importer.file_date(Path::new(FILE)),
            NaiveDate::from_ymd_opt(2020, 1, 5)
        );
    }

    #[test]
    fn non_ascii_digits_are_not_a_file_date() {
        let importer = SchwabImporter::builder().build();
        // 20200105 in Devanagari digits.
        let name = format!(
            "Personal_Checking_Transactions_{}-1.CSV",
            "\u{968}\u{966}\u{968}\u{966}\u{966}\u{967}\u{966}\u{96b}"
        );
        let file = Path::new(&name);
        assert_eq!(importer.file_date(file), None);
        assert!(importer.file_account(file).is_none());
        assert!(!importer.identify(file).unwrap());
    }

    #[test]
    fn identify_stops_at_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(FILE);
        let mut contents = b"\"Transactions for Checking account\"\n".to_vec();
        contents.extend_from_slice(
            b"\"Date\",\"Type\",\"Check #\",\"Description\",\"Withdrawal (-)\",\"Deposit (+)\",\"RunningBalance\"\n",
        );
        // Bytes that are not UTF-8 further down must not matter.
        contents.extend_from_slice(b"\"Pending\xff Transactions\"\n");
        std::fs::write(&file, contents).unwrap();

        let importer = SchwabImporter::builder().build();
        assert!(importer.identify(&file).unwrap());
    }

    #[test]
    fn withdrawal_and_deposit_postings() {
        let entries = classify(&[
            row("01/05/2020", "VISA", "$12.34", "", "$987.66"),
            row("01/04/2020", "DEPOSIT", "", "$1,000.00", "$1,000.00"),
        ])
        .unwrap();
        let txns: Vec<_> = entries.iter().filter_map(|d| d.as_transaction()).collect();

        assert_eq!(txns[0].postings[0].account, expense_fallback());
        assert_eq!(txns[0].postings[0].units, Amount::new(dec!(12.34), "USD"));
        assert_eq!(
            txns[0].postings[1].account.to_string(),
            "Assets:Schwab:PersonalChecking"
        );
        assert_eq!(txns[0].postings[1].units, Amount::new(dec!(-12.34), "USD"));
        assert_eq!(txns[0].flag, Flag::Warning);

        assert_eq!(txns[1].postings[0].units, Amount::new(dec!(1000.00), "USD"));
        assert_eq!(txns[1].postings[1].account, income_fallback());
    }

    #[test]
    fn rebates_and_interest_are_categorised() {
        let entries = classify(&[
            row("01/31/2020", "INTADJUST", "", "$0.41", "$1,000.41"),
            row("01/30/2020", "ATMREBATE", "", "$3.00", "$1,000.00"),
        ])
        .unwrap();
        let txns: Vec<_> = entries.iter().filter_map(|d| d.as_transaction()).collect();
        assert_eq!(
            txns[0].postings[1].account.to_string(),
            "Income:Schwab:Interest:PersonalChecking"
        );
        assert_eq!(txns[0].flag, Flag::Okay);
        assert_eq!(
            txns[1].postings[1].account.to_string(),
            "Income:Schwab:AtmRebate:PersonalChecking"
        );
    }

    #[test]
    fn balance_is_asserted_the_next_day() {
        let entries = classify(&[
            row("01/05/2020", "VISA", "$10.00", "", "$90.00"),
            row("01/05/2020", "VISA", "$10.00", "", "$100.00"),
            row("01/04/2020", "ACH", "", "$110.00", "$110.00"),
        ])
        .unwrap();
        let balances: Vec<_> = entries.iter().filter_map(|d| d.as_balance()).collect();
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0].date.to_string(), "2020-01-06");
        assert_eq!(balances[0].amount, Amount::new(dec!(90.00), "USD"));
        assert_eq!(balances[1].date.to_string(), "2020-01-05");
        assert_eq!(balances[1].amount, Amount::new(dec!(110.00), "USD"));
    }

    #[test]
    fn both_or_neither_amount_is_fatal() {
        let err = classify(&[row("01/05/2020", "ACH", "$1.00", "$1.00", "$5.00")]).unwrap_err();
        assert!(matches!(err, ImportError::MalformedRow { line: 5, .. }));
        let err = classify(&[row("01/05/2020", "ACH", "", "", "$5.00")]).unwrap_err();
        assert!(matches!(err, ImportError::MalformedRow { line: 5, .. }));
    }

    #[test]
    fn unknown_type_is_fatal() {
        let err = classify(&[row("01/05/2020", "ZELLE", "$1.00", "", "$5.00")]).unwrap_err();
        assert!(matches!(
            err,
            ImportError::UnrecognizedType { line: 5, ref value } if value == "ZELLE"
        ));
    }
}
