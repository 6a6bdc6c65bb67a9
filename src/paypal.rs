//! PayPal activity export (`paypal-transactions_<start>_<end>.CSV`).
//!
//! Rows are chronological.  PayPal reports some rows that leave the running balance untouched;
//! those are dropped.  A currency conversion arrives as two consecutive rows, one per currency,
//! and is merged into a single priced transaction.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::path::Path;

use beancount_core::{
    Account, AccountType, Amount, Date, Directive, Flag, Posting, Transaction,
};
use chrono::NaiveDate;
use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;
use typed_builder::TypedBuilder;

use crate::balance::BalanceTracker;
use crate::entries::{
    account, expense_fallback, income_fallback, open_accounts, pad_account, posting_pair,
    round_significant, simple_posting, source_meta, DEFAULT_CURRENCY,
};
use crate::error::{ImportError, Result};
use crate::importer::{
    header_matches, match_file_name, parse_amount, parse_date, strip_bom, Importer, RowOrder,
};

lazy_static! {
    static ref FILE_NAME: Regex =
        Regex::new(r"^paypal-transactions_[0-9]{4}-[0-9]{2}-[0-9]{2}_([0-9]{4}-[0-9]{2}-[0-9]{2})\.CSV$")
            .expect("valid regex");
}

const HEADERS: [&str; 10] = [
    "Date",
    "Time",
    "TimeZone",
    "Name",
    "Type",
    "Status",
    "Currency",
    "Amount",
    "Receipt ID",
    "Balance",
];

/// Types that are reported but never move money.
const SKIP_TYPES: [&str; 2] = ["Request Received", "Request Sent"];

const CONVERSION_TAG: &str = "currency-conversion";
const PAYPAL_TAG: &str = "paypal";

/// Ledger accounts owned by the PayPal importer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PaypalAccount {
    Balance,
    Held,
    Donations,
    InTransit,
}

impl PaypalAccount {
    pub const ALL: [PaypalAccount; 4] = [
        PaypalAccount::Balance,
        PaypalAccount::Held,
        PaypalAccount::Donations,
        PaypalAccount::InTransit,
    ];

    pub fn account(self) -> Account<'static> {
        match self {
            PaypalAccount::Balance => account(AccountType::Assets, &["Paypal", "Balance"]),
            PaypalAccount::Held => account(AccountType::Assets, &["Paypal", "Held"]),
            PaypalAccount::Donations => {
                account(AccountType::Expenses, &["Donations", "Paypal"])
            }
            PaypalAccount::InTransit => account(AccountType::Assets, &["InTransit", "Paypal"]),
        }
    }
}

/// Where withdrawals made before the cutoff date are booked.
fn previous_earnings() -> Account<'static> {
    account(AccountType::Equity, &["Earnings", "Previous"])
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TxnStatus {
    Completed,
    Denied,
    Expired,
    Pending,
    Reversed,
}

impl TxnStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TxnStatus::Completed => "Completed",
            TxnStatus::Denied => "Denied",
            TxnStatus::Expired => "Expired",
            TxnStatus::Pending => "Pending",
            TxnStatus::Reversed => "Reversed",
        }
    }

    fn parse(raw: &str, line: usize) -> Result<Self> {
        match raw.trim() {
            "Completed" => Ok(TxnStatus::Completed),
            "Denied" => Ok(TxnStatus::Denied),
            "Expired" => Ok(TxnStatus::Expired),
            "Pending" => Ok(TxnStatus::Pending),
            "Reversed" => Ok(TxnStatus::Reversed),
            other => Err(ImportError::UnrecognizedStatus {
                line,
                value: other.to_string(),
            }),
        }
    }
}

/// PayPal transaction types that get special routing.  Everything else falls back to the
/// uncategorized income/expense accounts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum TxnKind {
    Withdrawal,
    Donation,
    Hold,
    Conversion,
    Other,
}

impl TxnKind {
    fn of(raw: &str) -> Self {
        match raw {
            "General Withdrawal" => TxnKind::Withdrawal,
            "Donation Payment" => TxnKind::Donation,
            "Payment Hold" | "Payment Release" => TxnKind::Hold,
            "General Currency Conversion" => TxnKind::Conversion,
            _ => TxnKind::Other,
        }
    }
}

/// One record of the export, as written by PayPal.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PaypalRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Currency")]
    pub currency: String,
    #[serde(rename = "Amount")]
    pub amount: String,
    #[serde(rename = "Balance")]
    pub balance: String,
}

/// First half of a currency conversion, waiting for its second row.
#[derive(Clone, Debug)]
struct PendingLeg {
    posting: Posting<'static>,
    line: usize,
}

/// Everything one extraction carries from row to row.
#[derive(Clone, Debug)]
pub struct PaypalState {
    balances: BalanceTracker,
    pending: Option<PendingLeg>,
}

impl Default for PaypalState {
    fn default() -> Self {
        PaypalState {
            balances: BalanceTracker::new(RowOrder::Chronological),
            pending: None,
        }
    }
}

fn default_open_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 1).expect("valid date")
}

fn default_currencies() -> Vec<String> {
    vec![DEFAULT_CURRENCY.to_string()]
}

fn default_pad() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Deserialize, TypedBuilder)]
#[serde(deny_unknown_fields)]
pub struct PaypalImporter {
    /// Withdrawals before this date were already settled in a previous ledger.
    pub clear_before_date: NaiveDate,

    #[builder(default = default_currencies())]
    #[serde(default = "default_currencies")]
    pub currencies: Vec<String>,

    #[builder(default = default_open_date())]
    #[serde(default = "default_open_date")]
    pub open_date: NaiveDate,

    /// Emit a pad from opening balances into the balance account.
    #[builder(default = true)]
    #[serde(default = "default_pad")]
    pub pad: bool,

    /// Reject files where a conversion row has no partner instead of dropping the row.
    #[builder(default)]
    #[serde(default)]
    pub strict_conversions: bool,
}

impl PaypalImporter {
    fn preamble(&self) -> Vec<Directive<'static>> {
        let accounts: Vec<_> = PaypalAccount::ALL.iter().map(|a| a.account()).collect();
        let mut entries = open_accounts(&accounts, self.open_date, &self.currencies);
        if self.pad {
            entries.push(pad_account(&PaypalAccount::Balance.account(), self.open_date));
        }
        entries
    }

    /// Classifies one record, returning the entries it produces.
    pub fn classify(
        &self,
        file: &Path,
        line: usize,
        row: &PaypalRow,
        state: &mut PaypalState,
    ) -> Result<Vec<Directive<'static>>> {
        let date = parse_date(&row.date, line)?;
        let kind_raw = row.kind.trim();
        let status = TxnStatus::parse(&row.status, line)?;

        let num = match parse_amount(&row.amount, line)? {
            Some(num) => num,
            None => {
                debug!("line {}: no amount, skipping", line);
                return Ok(vec![]);
            }
        };
        let currency = match row.currency.trim() {
            "" => DEFAULT_CURRENCY,
            cur => cur,
        };
        let balance = parse_amount(&row.balance, line)?.ok_or_else(|| {
            ImportError::MalformedRow {
                line,
                message: "missing running balance".to_string(),
            }
        })?;

        if state.balances.is_ghost(currency, balance) {
            debug!("line {}: balance unchanged, skipping ghost row", line);
            return Ok(vec![]);
        }
        if SKIP_TYPES.contains(&kind_raw) {
            debug!("line {}: `{}` moves no money, skipping", line, kind_raw);
            return Ok(vec![]);
        }

        let balance_account = PaypalAccount::Balance.account();
        let mut meta = source_meta(file, line);
        meta.insert(Cow::Borrowed("status"), status.as_str().into());
        meta.insert(Cow::Borrowed("type"), kind_raw.to_string().into());

        let kind = TxnKind::of(kind_raw);
        let narration = match row.name.trim() {
            "" => kind_raw,
            name => name,
        };
        let mut entries = Vec::new();
        if kind == TxnKind::Conversion {
            if let Some(postings) = self.convert(line, num, currency, state)? {
                let txn = Transaction::builder()
                    .date(Date::from(date))
                    .flag(Flag::Okay)
                    .narration(Cow::Owned(narration.to_string()))
                    .tags(tags(&[PAYPAL_TAG, CONVERSION_TAG]))
                    .postings(postings)
                    .meta(meta)
                    .build();
                entries.push(txn.into());
            }
        } else {
            self.drop_pending(state)?;
            let (other, flag) = self.route(kind, date, num);
            let txn = Transaction::builder()
                .date(Date::from(date))
                .flag(flag)
                .narration(Cow::Owned(narration.to_string()))
                .tags(tags(&[PAYPAL_TAG]))
                .postings(posting_pair(&balance_account, &other, num, currency))
                .meta(meta)
                .build();
            entries.push(txn.into());
        }

        let balance_meta = source_meta(file, line);
        let due = state
            .balances
            .observe(&balance_account, date, currency, balance, &balance_meta);
        entries.extend(due.into_iter().map(Directive::from));
        Ok(entries)
    }

    /// The account on the other side of the balance account, and the flag to use.
    fn route(
        &self,
        kind: TxnKind,
        date: NaiveDate,
        num: Decimal,
    ) -> (Account<'static>, Flag<'static>) {
        match kind {
            TxnKind::Withdrawal if date < self.clear_before_date => {
                (previous_earnings(), Flag::Warning)
            }
            TxnKind::Withdrawal => (PaypalAccount::InTransit.account(), Flag::Warning),
            TxnKind::Donation => (PaypalAccount::Donations.account(), Flag::Okay),
            TxnKind::Hold => (PaypalAccount::Held.account(), Flag::Okay),
            TxnKind::Conversion | TxnKind::Other if num > Decimal::ZERO => {
                (income_fallback(), Flag::Warning)
            }
            TxnKind::Conversion | TxnKind::Other => (expense_fallback(), Flag::Warning),
        }
    }

    /// Buffers the first conversion row, or returns both legs once the second arrives.
    fn convert(
        &self,
        line: usize,
        num: Decimal,
        currency: &str,
        state: &mut PaypalState,
    ) -> Result<Option<Vec<Posting<'static>>>> {
        let balance_account = PaypalAccount::Balance.account();
        let leg = simple_posting(&balance_account, num, currency);
        let first = match state.pending.take() {
            None => {
                state.pending = Some(PendingLeg { posting: leg, line });
                return Ok(None);
            }
            Some(first) => first.posting,
        };

        // The legs sum to zero once the second is priced in the first's currency.
        let rate = (-first.units.num)
            .checked_div(num)
            .ok_or_else(|| ImportError::MalformedRow {
                line,
                message: "currency conversion leg with zero amount".to_string(),
            })?;
        let price = Amount::new(round_significant(rate, 5), first.units.currency.clone());
        let second = Posting { price: Some(price), ..leg };

        Ok(Some(vec![first, second]))
    }

    /// Discards a conversion leg that never found its partner.
    fn drop_pending(&self, state: &mut PaypalState) -> Result<()> {
        if let Some(leg) = state.pending.take() {
            if self.strict_conversions {
                return Err(ImportError::UnpairedConversion {
                    line: leg.line,
                    currency: leg.posting.units.currency.to_string(),
                });
            }
            warn!(
                "line {}: currency conversion leg in {} has no partner, dropping it",
                leg.line, leg.posting.units.currency
            );
        }
        Ok(())
    }
}

fn tags(names: &[&'static str]) -> BTreeSet<Cow<'static, str>> {
    names.iter().map(|t| Cow::Borrowed(*t)).collect()
}

impl Importer for PaypalImporter {
    fn name(&self) -> &'static str {
        "paypal"
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
        Some(account(AccountType::Assets, &["Paypal"]))
    }

    fn file_date(&self, file: &Path) -> Option<NaiveDate> {
        let caps = match_file_name(&FILE_NAME, file)?;
        NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()
    }

    fn extract(&self, file: &Path) -> Result<Vec<Directive<'static>>> {
        let mut entries = self.preamble();
        let mut rdr = csv::ReaderBuilder::new().from_path(file)?;
        let headers = strip_bom(rdr.headers()?);

        let mut state = PaypalState::default();
        let mut record = csv::StringRecord::new();
        while rdr.read_record(&mut record)? {
            let line = record.position().map_or(0, |p| p.line() as usize);
            let row: PaypalRow = record.deserialize(Some(&headers))?;
            entries.extend(self.classify(file, line, &row, &mut state)?);
        }
        self.drop_pending(&mut state)?;

        info!("{}: extracted {} entries", file.display(), entries.len());
        Ok(entries)
    }
}
