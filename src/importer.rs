// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Spreadsheet import.
//!
//! A worksheet (xlsx/xls/ods, first sheet only) or delimited text is turned
//! into a grid of trimmed strings, the header is matched against
//! [`COLUMN_ALIASES`], and every data row is normalized into a
//! [`NewTransaction`]. Any row that cannot be interpreted rejects the whole
//! file; the surviving batch is written in a single store transaction.

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::io::Cursor;

use crate::error::{Error, Result};
use crate::gateway::Classifier;
use crate::models::{Kind, NewTransaction, OTHER_CATEGORY, Source, Transaction, max_amount};
use crate::store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Date,
    Amount,
    Kind,
    Description,
    Category,
}

impl Column {
    pub fn name(&self) -> &'static str {
        match self {
            Column::Date => "date",
            Column::Amount => "amount",
            Column::Kind => "type",
            Column::Description => "description",
            Column::Category => "category",
        }
    }
}

/// Recognized header spellings per logical column, in priority order.
pub const COLUMN_ALIASES: &[(Column, &[&str])] = &[
    (Column::Date, &["date", "дата"]),
    (Column::Amount, &["amount", "сумма", "sum"]),
    (Column::Kind, &["type", "тип", "kind"]),
    (
        Column::Description,
        &["description", "описание", "desc", "note", "notes"],
    ),
    (Column::Category, &["category", "категория"]),
];

/// Accepted date layouts, tried in order.
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%m/%d/%Y", "%Y/%m/%d"];

/// Substrings of a type cell that mark a row as income.
pub const INCOME_TOKENS: &[&str] = &["income", "доход"];

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

/// Rows of one worksheet. `first_row` is the 1-based sheet row of `rows[0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub rows: Vec<Vec<String>>,
    pub first_row: usize,
}

pub fn read_grid(bytes: &[u8]) -> Result<Grid> {
    if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
        read_workbook(bytes)
    } else {
        read_delimited(bytes)
    }
}

fn read_workbook(bytes: &[u8]) -> Result<Grid> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| Error::format(format!("Failed to open spreadsheet: {}", e)))?;
    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| Error::format("Spreadsheet contains no sheets"))?;
    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| Error::format(format!("Failed to read sheet '{}': {}", first, e)))?;
    let first_row = range.start().map(|(r, _)| r as usize + 1).unwrap_or(1);
    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    tracing::debug!(sheet = %first, "read worksheet");
    Ok(Grid { rows, first_row })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(d) => d.date().to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) => s.split('T').next().unwrap_or(s.as_str()).to_string(),
        other => other.to_string(),
    }
}

fn read_delimited(bytes: &[u8]) -> Result<Grid> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| Error::format("File is neither a spreadsheet nor UTF-8 text"))?;
    let text = text.trim_start_matches('\u{feff}');
    let header_line = text.lines().next().unwrap_or("");
    let delimiter = if header_line.contains(';') && !header_line.contains(',') {
        b';'
    } else {
        b','
    };
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| Error::format(format!("Malformed CSV: {}", e)))?;
        rows.push(record.iter().map(|s| s.trim().to_string()).collect());
    }
    Ok(Grid { rows, first_row: 1 })
}

/// Header positions of the logical columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: usize,
    pub amount: usize,
    pub kind: Option<usize>,
    pub description: Option<usize>,
    pub category: Option<usize>,
}

impl ColumnMap {
    pub fn from_header(header: &[String]) -> Result<Self> {
        let index: HashMap<String, usize> = header
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_lowercase(), i))
            .collect();
        let find = |col: Column| {
            COLUMN_ALIASES
                .iter()
                .filter(|(c, _)| *c == col)
                .flat_map(|(_, aliases)| aliases.iter())
                .find_map(|alias| index.get(*alias).copied())
        };

        let date = find(Column::Date);
        let amount = find(Column::Amount);
        match (date, amount) {
            (Some(date), Some(amount)) => Ok(ColumnMap {
                date,
                amount,
                kind: find(Column::Kind),
                description: find(Column::Description),
                category: find(Column::Category),
            }),
            _ => {
                let missing: Vec<&str> = [(Column::Date, date), (Column::Amount, amount)]
                    .iter()
                    .filter(|(_, idx)| idx.is_none())
                    .map(|(col, _)| col.name())
                    .collect();
                Err(Error::format(format!(
                    "Missing required column(s): {}",
                    missing.join(", ")
                )))
            }
        }
    }
}

/// Signed amount after dropping whitespace group separators and reading a
/// comma as the decimal point.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    cleaned.parse::<Decimal>().ok()
}

pub fn parse_date_flexible(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Direction and magnitude of a row. A negative amount is always an expense.
pub fn resolve_kind(kind_cell: &str, signed: Decimal) -> (Kind, Decimal) {
    let lowered = kind_cell.trim().to_lowercase();
    if signed.is_sign_negative() {
        return (Kind::Expense, signed.abs());
    }
    let income = INCOME_TOKENS.iter().any(|t| lowered.contains(t))
        || (lowered.is_empty() && signed > Decimal::ZERO);
    let kind = if income { Kind::Income } else { Kind::Expense };
    (kind, signed)
}

fn cell(row: &[String], col: Option<usize>) -> &str {
    col.and_then(|c| row.get(c))
        .map(|s| s.trim())
        .unwrap_or("")
}

pub struct Importer<'a> {
    classifier: &'a dyn Classifier,
}

impl<'a> Importer<'a> {
    pub fn new(classifier: &'a dyn Classifier) -> Self {
        Importer { classifier }
    }

    pub fn normalize(&self, user_id: i64, bytes: &[u8]) -> Result<Vec<NewTransaction>> {
        let grid = read_grid(bytes)?;
        self.normalize_grid(user_id, &grid)
    }

    pub fn normalize_grid(&self, user_id: i64, grid: &Grid) -> Result<Vec<NewTransaction>> {
        if grid.rows.len() < 2 {
            return Err(Error::format(
                "Spreadsheet must have a header row and at least one data row",
            ));
        }
        let columns = ColumnMap::from_header(&grid.rows[0])?;

        let mut out = Vec::new();
        for (offset, row) in grid.rows[1..].iter().enumerate() {
            let row_no = grid.first_row + 1 + offset;
            if row.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            if let Some(tx) = self.normalize_row(user_id, &columns, row, row_no)? {
                out.push(tx);
            }
        }
        tracing::debug!(rows = out.len(), "normalized spreadsheet rows");
        Ok(out)
    }

    fn normalize_row(
        &self,
        user_id: i64,
        columns: &ColumnMap,
        row: &[String],
        row_no: usize,
    ) -> Result<Option<NewTransaction>> {
        let amount_raw = cell(row, Some(columns.amount));
        if amount_raw.is_empty() {
            return Ok(None);
        }
        let signed = parse_amount(amount_raw)
            .ok_or_else(|| Error::format_at(row_no, format!("invalid amount '{}'", amount_raw)))?;
        if signed.is_zero() {
            return Err(Error::format_at(
                row_no,
                format!("amount must be non-zero, got '{}'", amount_raw),
            ));
        }
        if signed.abs() > max_amount() {
            return Err(Error::format_at(
                row_no,
                format!("amount '{}' exceeds {}", amount_raw, max_amount()),
            ));
        }

        let date_raw = cell(row, Some(columns.date));
        let date = parse_date_flexible(date_raw)
            .ok_or_else(|| Error::format_at(row_no, format!("invalid date '{}'", date_raw)))?;

        let (kind, amount) = resolve_kind(cell(row, columns.kind), signed);
        let description = cell(row, columns.description).to_string();

        let mut category = cell(row, columns.category).to_string();
        if category.is_empty() && kind == Kind::Expense {
            category = self.classifier.classify(&description).trim().to_string();
        }
        if category.is_empty() {
            category = OTHER_CATEGORY.to_string();
        }

        Ok(Some(NewTransaction {
            user_id,
            amount,
            kind,
            category,
            description,
            date,
            source: Source::Spreadsheet,
        }))
    }

    /// Normalizes and persists the file. Nothing is written unless every row
    /// is valid and the whole batch commits.
    pub fn import(&self, conn: &mut Connection, user_id: i64, bytes: &[u8]) -> Result<Vec<Transaction>> {
        let pending = self.normalize(user_id, bytes)?;
        let saved = store::bulk_create(conn, &pending).map_err(|e| Error::Import {
            pending: pending.len(),
            source: Box::new(e),
        })?;
        tracing::info!(user = user_id, imported = saved.len(), "spreadsheet imported");
        Ok(saved)
    }
}
