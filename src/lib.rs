//! Importers that turn vendor CSV exports into Beancount directives.
//!
//! Each vendor module recognises its own export files and classifies every row into
//! transactions and balance assertions.  [`config::Config`] decides which importers are enabled.

pub mod balance;
pub mod config;
pub mod entries;
pub mod error;
pub mod importer;
pub mod paypal;
pub mod schwab;
pub mod upwork;

pub use crate::config::{Config, VendorImporter};
pub use crate::error::{ImportError, Result};
pub use crate::importer::{Importer, RowOrder};
pub use crate::paypal::PaypalImporter;
pub use crate::schwab::SchwabImporter;
pub use crate::upwork::UpworkImporter;
