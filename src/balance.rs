use std::collections::{BTreeMap, HashSet};

use beancount_core::{Account, Amount, Balance, Date, Meta};
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::importer::RowOrder;

/// Places balance assertions while a file is read row by row.
///
/// One tracker lives for exactly one extraction.  It remembers which transaction dates have
/// already produced assertions and the latest running balance per currency.
#[derive(Clone, Debug)]
pub struct BalanceTracker {
    order: RowOrder,
    asserted: HashSet<NaiveDate>,
    previous: BTreeMap<String, Decimal>,
}

impl BalanceTracker {
    pub fn new(order: RowOrder) -> Self {
        BalanceTracker {
            order,
            asserted: HashSet::new(),
            previous: BTreeMap::new(),
        }
    }

    /// True when `balance` repeats the last running balance recorded for `currency`, i.e. the
    /// row did not move any money.
    pub fn is_ghost(&self, currency: &str, balance: Decimal) -> bool {
        self.previous.get(currency) == Some(&balance)
    }

    /// Records a processed row and returns the assertions that become due because `date` has
    /// not been seen before.
    ///
    /// Chronological files assert every known currency on the new date with the balance carried
    /// by the previous row.  Reverse-chronological files assert the row's own balance on the
    /// following day, since the first row seen for a day is that day's last.
    pub fn observe(
        &mut self,
        account: &Account<'static>,
        date: NaiveDate,
        currency: &str,
        balance: Decimal,
        meta: &Meta<'static>,
    ) -> Vec<Balance<'static>> {
        let mut due = Vec::new();
        if self.asserted.insert(date) {
            match self.order {
                RowOrder::Chronological => {
                    for (cur, prev) in &self.previous {
                        due.push(assertion(account, date.into(), *prev, cur, meta));
                    }
                }
                RowOrder::ReverseChronological => {
                    let next_day = Date::from(date).next_day();
                    due.push(assertion(account, next_day, balance, currency, meta));
                }
            }
        }
        self.previous.insert(currency.to_string(), balance);
        due
    }
}

fn assertion(
    account: &Account<'static>,
    date: Date,
    num: Decimal,
    currency: &str,
    meta: &Meta<'static>,
) -> Balance<'static> {
    Balance::builder()
        .date(date)
        .account(account.clone())
        .amount(Amount::new(num, currency.to_string()))
        .meta(meta.clone())
        .build()
}
