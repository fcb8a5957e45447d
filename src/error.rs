// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Error taxonomy shared by the ledger core.
//!
//! - [`Error::Validation`] malformed or out-of-range input, never persisted.
//! - [`Error::Format`] a spreadsheet header or row cannot be interpreted.
//! - [`Error::NotFound`] the record is absent or owned by someone else.
//! - [`Error::Storage`] the SQLite layer failed.
//! - [`Error::Gateway`] the model service failed; absorbed by classification.
//! - [`Error::Import`] a normalized batch could not be persisted.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("{}", format_message(.row, .message))]
    Format {
        row: Option<usize>,
        message: String,
    },
    #[error("Transaction {id} not found")]
    NotFound { id: i64 },
    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
    #[error("Model service unavailable: {0}")]
    Gateway(String),
    #[error("Failed to save {pending} imported transactions: {source}")]
    Import {
        pending: usize,
        #[source]
        source: Box<Error>,
    },
}

fn format_message(row: &Option<usize>, message: &str) -> String {
    match row {
        Some(row) => format!("row {}: {}", row, message),
        None => message.to_string(),
    }
}

impl Error {
    pub fn format(message: impl Into<String>) -> Self {
        Error::Format {
            row: None,
            message: message.into(),
        }
    }

    pub fn format_at(row: usize, message: impl Into<String>) -> Self {
        Error::Format {
            row: Some(row),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }
}
