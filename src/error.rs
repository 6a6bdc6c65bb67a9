use std::io;
use std::path::PathBuf;

use beancount_core::AccountError;
use thiserror::Error;

/// Errors raised while identifying or extracting a vendor export.
///
/// Row-level variants carry the 1-based line number of the offending CSV record.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: unrecognized transaction type `{value}`")]
    UnrecognizedType { line: usize, value: String },

    #[error("line {line}: unrecognized transaction status `{value}`")]
    UnrecognizedStatus { line: usize, value: String },

    #[error("line {line}: could not extract account number from withdrawal description `{description}`")]
    AccountSuffix { line: usize, description: String },

    #[error("line {line}: no bank account configured for account number ending in {last_four}")]
    MissingMapping { line: usize, last_four: String },

    #[error("line {line}: {message}")]
    MalformedRow { line: usize, message: String },

    #[error("line {line}: invalid amount `{value}`")]
    InvalidAmount { line: usize, value: String },

    #[error("line {line}: invalid date `{value}`")]
    InvalidDate { line: usize, value: String },

    #[error("invalid account name: {0}")]
    InvalidAccount(#[from] AccountError),

    #[error("line {line}: currency conversion leg in {currency} has no matching second leg")]
    UnpairedConversion { line: usize, currency: String },

    #[error("{} is not a file this importer understands", .0.display())]
    UnidentifiedFile(PathBuf),
}

pub type Result<T> = std::result::Result<T, ImportError>;
