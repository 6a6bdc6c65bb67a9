//! Which importers are enabled and how each is configured.

use std::path::Path;

use beancount_core::{Account, Directive};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::Result;
use crate::importer::Importer;
use crate::paypal::PaypalImporter;
use crate::schwab::SchwabImporter;
use crate::upwork::UpworkImporter;

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "bean-import.toml";

/// Importer sections of `bean-import.toml`.  A section that is left out disables its importer.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub paypal: Option<PaypalImporter>,
    pub schwab: Option<SchwabImporter>,
    pub upwork: Option<UpworkImporter>,
}

impl Default for Config {
    /// Used when there is no configuration file.  PayPal stays off because its withdrawal cutoff
    /// has no sensible default.
    fn default() -> Self {
        Config {
            paypal: None,
            schwab: Some(SchwabImporter::builder().build()),
            upwork: Some(UpworkImporter::builder().build()),
        }
    }
}

impl Config {
    pub fn from_toml(s: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Enabled importers in identification order.
    pub fn importers(&self) -> Vec<VendorImporter> {
        let mut importers = Vec::new();
        if let Some(paypal) = &self.paypal {
            importers.push(VendorImporter::Paypal(paypal.clone()));
        }
        if let Some(schwab) = &self.schwab {
            importers.push(VendorImporter::Schwab(schwab.clone()));
        }
        if let Some(upwork) = &self.upwork {
            importers.push(VendorImporter::Upwork(upwork.clone()));
        }
        importers
    }
}

/// One of the supported vendor importers.
#[derive(Clone, Debug, PartialEq)]
pub enum VendorImporter {
    Paypal(PaypalImporter),
    Schwab(SchwabImporter),
    Upwork(UpworkImporter),
}

macro_rules! dispatch {
    ($self:ident, $importer:ident => $call:expr) => {
        match $self {
            VendorImporter::Paypal($importer) => $call,
            VendorImporter::Schwab($importer) => $call,
            VendorImporter::Upwork($importer) => $call,
        }
    };
}

impl Importer for VendorImporter {
    fn name(&self) -> &'static str {
        dispatch!(self, i => i.name())
    }

    fn identify(&self, file: &Path) -> Result<bool> {
        dispatch!(self, i => i.identify(file))
    }

    fn file_account(&self, file: &Path) -> Option<Account<'static>> {
        dispatch!(self, i => i.file_account(file))
    }

    fn file_date(&self, file: &Path) -> Option<NaiveDate> {
        dispatch!(self, i => i.file_date(file))
    }

    fn extract(&self, file: &Path) -> Result<Vec<Directive<'static>>> {
        dispatch!(self, i => i.extract(file))
    }
}

/// The first importer that accepts `file`.
pub fn identify<'i>(
    importers: &'i [VendorImporter],
    file: &Path,
) -> Result<Option<&'i VendorImporter>> {
    for importer in importers {
        if importer.identify(file)? {
            return Ok(Some(importer));
        }
    }
    Ok(None)
}
