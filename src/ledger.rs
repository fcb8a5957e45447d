// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Manual entry, receipt drafts and patching. Input is validated here,
//! before the store.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::gateway::{Classifier, ReceiptDraft};
use crate::importer::parse_date_flexible;
use crate::models::{
    Kind, NewTransaction, OTHER_CATEGORY, Source, Transaction, TransactionPatch, max_amount,
};

const RECEIPT_DESCRIPTION: &str = "Receipt upload";
use crate::store;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRequest {
    pub amount: Decimal,
    pub kind: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub date: String,
}

fn ensure_positive(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::validation("amount must be positive"));
    }
    if amount > max_amount() {
        return Err(Error::validation(format!(
            "amount {} exceeds {}",
            amount,
            max_amount()
        )));
    }
    Ok(())
}

fn parse_iso_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| Error::validation(format!("invalid date '{}', use YYYY-MM-DD", raw)))
}

pub fn create_manual(
    conn: &Connection,
    classifier: &dyn Classifier,
    user_id: i64,
    req: CreateRequest,
) -> Result<Transaction> {
    let date = parse_iso_date(&req.date)?;
    ensure_positive(req.amount)?;
    let kind: Kind = req.kind.parse()?;

    let description = req.description.trim().to_string();
    let category = resolve_category(classifier, kind, &req.category, &description);

    store::create(
        conn,
        &NewTransaction {
            user_id,
            amount: req.amount,
            kind,
            category,
            description,
            date,
            source: Source::Manual,
        },
    )
}

fn resolve_category(classifier: &dyn Classifier, kind: Kind, given: &str, description: &str) -> String {
    let mut category = given.trim().to_string();
    if category.is_empty() && kind == Kind::Expense {
        category = classifier.classify(description).trim().to_string();
    }
    if category.is_empty() {
        category = OTHER_CATEGORY.to_string();
    }
    category
}

/// Records the transaction an OCR scan proposed. The amount is required; a
/// missing date means `today`, a missing kind means expense.
pub fn record_receipt(
    conn: &Connection,
    classifier: &dyn Classifier,
    user_id: i64,
    draft: &ReceiptDraft,
    today: NaiveDate,
) -> Result<Transaction> {
    let amount = draft
        .amount
        .ok_or_else(|| Error::validation("receipt has no recognizable amount"))?;
    ensure_positive(amount)?;
    let date = match draft.date.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => parse_date_flexible(raw)
            .ok_or_else(|| Error::validation(format!("invalid receipt date '{}'", raw)))?,
        None => today,
    };
    let kind = match draft.kind.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw.parse()?,
        None => Kind::Expense,
    };
    let description = draft
        .description
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(RECEIPT_DESCRIPTION)
        .to_string();
    let category = resolve_category(
        classifier,
        kind,
        draft.category.as_deref().unwrap_or(""),
        &description,
    );

    store::create(
        conn,
        &NewTransaction {
            user_id,
            amount,
            kind,
            category,
            description,
            date,
            source: Source::Receipt,
        },
    )
}

/// Applies only the fields present in `patch`, then overwrites the record.
pub fn update(conn: &Connection, id: i64, user_id: i64, patch: TransactionPatch) -> Result<Transaction> {
    let mut tx = store::get_by_id(conn, id, user_id)?;
    if let Some(amount) = patch.amount {
        ensure_positive(amount)?;
        tx.amount = amount;
    }
    if let Some(kind) = patch.kind {
        tx.kind = kind;
    }
    if let Some(category) = patch.category {
        let category = category.trim().to_string();
        if category.is_empty() {
            return Err(Error::validation("category must not be empty"));
        }
        tx.category = category;
    }
    if let Some(description) = patch.description {
        tx.description = description.trim().to_string();
    }
    if let Some(date) = patch.date {
        tx.date = date;
    }
    store::update(conn, &tx)
}
