//! The importer protocol shared by every vendor, plus the small file and field helpers the
//! vendors use to recognise their exports.

use std::path::Path;

use beancount_core::{Account, Directive};
use chrono::NaiveDate;
use csv::StringRecord;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::{ImportError, Result};

/// Beancount's ingest protocol: recognise a downloaded file, say where it should be filed, and
/// turn it into directives.
pub trait Importer {
    /// Short identifier used in CLI output.
    fn name(&self) -> &'static str;

    /// Whether `file` is an export this importer understands: both its filename and its header
    /// row must match.  A file that cannot be read is not an error here, it is simply declined.
    fn identify(&self, file: &Path) -> Result<bool>;

    /// The account whose documents directory the file belongs in.
    fn file_account(&self, file: &Path) -> Option<Account<'static>>;

    /// The date the file should be filed under.
    fn file_date(&self, file: &Path) -> Option<NaiveDate>;

    /// Converts the whole file into directives.  Any row-level error aborts the file.
    fn extract(&self, file: &Path) -> Result<Vec<Directive<'static>>>;
}

/// Which way the running balance column flows through the file.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RowOrder {
    /// Oldest row first.  The running balance on the last row of a day is the opening balance of
    /// the next day seen.
    Chronological,
    /// Newest row first.  The first row seen for a day carries that day's closing balance.
    ReverseChronological,
}

pub(crate) fn file_name(file: &Path) -> Option<&str> {
    file.file_name().and_then(|name| name.to_str())
}

/// Captures of `re` against the file's basename.
pub(crate) fn match_file_name<'f>(re: &Regex, file: &'f Path) -> Option<regex::Captures<'f>> {
    file_name(file).and_then(|name| re.captures(name))
}

/// Compares a header record against the expected column names.  A leading byte-order mark on
/// the first column is ignored.
pub(crate) fn header_matches(record: &StringRecord, expected: &[&str]) -> bool {
    record.len() == expected.len()
        && record
            .iter()
            .zip(expected)
            .enumerate()
            .all(|(i, (field, want))| {
                let field = if i == 0 {
                    field.trim_start_matches('\u{feff}')
                } else {
                    field
                };
                field == *want
            })
}

/// The header record with any byte-order mark removed from its first column, for use with
/// `StringRecord::deserialize`.
pub(crate) fn strip_bom(record: &StringRecord) -> StringRecord {
    record
        .iter()
        .map(|field| field.trim_start_matches('\u{feff}'))
        .collect()
}

/// Parses a money column.  Currency symbols, thousands separators and surrounding whitespace are
/// ignored; an empty field is `None`.
pub(crate) fn parse_amount(raw: &str, line: usize) -> Result<Option<Decimal>> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Ok(None);
    }
    cleaned
        .parse::<Decimal>()
        .map(Some)
        .map_err(|_| ImportError::InvalidAmount {
            line,
            value: raw.to_string(),
        })
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%b %d, %Y", "%B %d, %Y"];

/// Parses the date formats the supported vendors write.
pub(crate) fn parse_date(raw: &str, line: usize) -> Result<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| ImportError::InvalidDate {
            line,
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn amounts_are_cleaned() {
        assert_eq!(parse_amount("$1,234.50", 1).unwrap(), Some(dec!(1234.50)));
        assert_eq!(parse_amount(" -500 ", 1).unwrap(), Some(dec!(-500)));
        assert_eq!(parse_amount("", 1).unwrap(), None);
        assert!(matches!(
            parse_amount("ten", 7),
            Err(ImportError::InvalidAmount { line: 7, .. })
        ));
    }

    #[test]
    fn vendor_date_formats() {
        let jan5 = NaiveDate::from_ymd_opt(2020, 1, 5).unwrap();
        assert_eq!(parse_date("2020-01-05", 1).unwrap(), jan5);
        assert_eq!(parse_date("01/05/2020", 1).unwrap(), jan5);
        assert_eq!(parse_date("1/5/2020", 1).unwrap(), jan5);
        assert_eq!(parse_date("Jan 5, 2020", 1).unwrap(), jan5);
        assert!(parse_date("yesterday", 1).is_err());
    }

    #[test]
    fn header_ignores_bom() {
        let record = StringRecord::from(vec!["\u{feff}Date", "Amount"]);
        assert!(header_matches(&record, &["Date", "Amount"]));
        assert!(!header_matches(&record, &["Date", "Amount", "Balance"]));
        assert_eq!(strip_bom(&record), StringRecord::from(vec!["Date", "Amount"]));
    }
}
