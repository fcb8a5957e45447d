// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Typed access to the ledger tables. Every statement that touches a single
//! record is scoped by `(id, user_id)`.

use chrono::{Local, Months, NaiveDate, NaiveDateTime};
use rusqlite::types::{ToSql, Type};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::models::{
    DateRange, Filter, Kind, MonthlyTotal, NewTransaction, Page, TaxSettings, Transaction,
};

const COLUMNS: &str =
    "id, user_id, amount, kind, category, description, date, source, created_at";

fn text_col<T>(r: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = r.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_transaction(r: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: r.get(0)?,
        user_id: r.get(1)?,
        amount: text_col(r, 2)?,
        kind: text_col(r, 3)?,
        category: r.get(4)?,
        description: r.get(5)?,
        date: r.get(6)?,
        source: text_col(r, 7)?,
        created_at: r.get(8)?,
    })
}

fn insert(conn: &Connection, new: &NewTransaction) -> Result<Transaction> {
    let (id, created_at) = conn.query_row(
        "INSERT INTO transactions(user_id, amount, kind, category, description, date, source)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         RETURNING id, created_at",
        params![
            new.user_id,
            new.amount.to_string(),
            new.kind.as_str(),
            new.category,
            new.description,
            new.date.to_string(),
            new.source.as_str()
        ],
        |r| Ok((r.get::<_, i64>(0)?, r.get::<_, NaiveDateTime>(1)?)),
    )?;
    Ok(Transaction {
        id,
        user_id: new.user_id,
        amount: new.amount,
        kind: new.kind,
        category: new.category.clone(),
        description: new.description.clone(),
        date: new.date,
        source: new.source,
        created_at,
    })
}

pub fn create(conn: &Connection, new: &NewTransaction) -> Result<Transaction> {
    let tx = insert(conn, new)?;
    tracing::info!(id = tx.id, user = tx.user_id, kind = %tx.kind, "recorded transaction");
    Ok(tx)
}

/// Inserts the whole batch in one SQLite transaction. Any failing row rolls
/// back every row of the call.
pub fn bulk_create(conn: &mut Connection, items: &[NewTransaction]) -> Result<Vec<Transaction>> {
    let tx = conn.transaction()?;
    let mut saved = Vec::with_capacity(items.len());
    for item in items {
        saved.push(insert(&tx, item)?);
    }
    tx.commit()?;
    tracing::info!(count = saved.len(), "committed transaction batch");
    Ok(saved)
}

pub fn list(conn: &Connection, filter: &Filter) -> Result<Page<Transaction>> {
    let mut clause = String::from("user_id = ?");
    let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(filter.user_id)];

    if let Some(kind) = filter.kind {
        clause.push_str(" AND kind = ?");
        values.push(Box::new(kind.as_str()));
    }
    if let Some(ref category) = filter.category {
        clause.push_str(" AND category = ?");
        values.push(Box::new(category.clone()));
    }
    if let Some(from) = filter.from {
        clause.push_str(" AND date >= ?");
        values.push(Box::new(from.to_string()));
    }
    if let Some(to) = filter.to {
        clause.push_str(" AND date <= ?");
        values.push(Box::new(to.to_string()));
    }

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM transactions WHERE {}", clause),
        params_from_iter(values.iter()),
        |r| r.get(0),
    )?;

    let (limit, offset) = filter.window();
    values.push(Box::new(limit));
    values.push(Box::new(offset));
    let sql = format!(
        "SELECT {} FROM transactions WHERE {} ORDER BY date DESC, id DESC LIMIT ? OFFSET ?",
        COLUMNS, clause
    );
    tracing::debug!(%sql, "listing transactions");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), row_to_transaction)?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(Page {
        data,
        total: total as u64,
    })
}

pub fn get_by_id(conn: &Connection, id: i64, user_id: i64) -> Result<Transaction> {
    conn.query_row(
        &format!(
            "SELECT {} FROM transactions WHERE id = ?1 AND user_id = ?2",
            COLUMNS
        ),
        params![id, user_id],
        row_to_transaction,
    )
    .optional()?
    .ok_or(Error::NotFound { id })
}

/// Overwrites the mutable fields of an owned record.
pub fn update(conn: &Connection, tx: &Transaction) -> Result<Transaction> {
    let changed = conn.execute(
        "UPDATE transactions
         SET amount = ?1, kind = ?2, category = ?3, description = ?4, date = ?5
         WHERE id = ?6 AND user_id = ?7",
        params![
            tx.amount.to_string(),
            tx.kind.as_str(),
            tx.category,
            tx.description,
            tx.date.to_string(),
            tx.id,
            tx.user_id
        ],
    )?;
    if changed == 0 {
        return Err(Error::NotFound { id: tx.id });
    }
    tracing::info!(id = tx.id, user = tx.user_id, "updated transaction");
    get_by_id(conn, tx.id, tx.user_id)
}

pub fn delete(conn: &Connection, id: i64, user_id: i64) -> Result<()> {
    let changed = conn.execute(
        "DELETE FROM transactions WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    if changed == 0 {
        return Err(Error::NotFound { id });
    }
    tracing::info!(id, user = user_id, "deleted transaction");
    Ok(())
}

/// Owned transactions dated inside `range`, oldest first.
pub fn in_range(
    conn: &Connection,
    user_id: i64,
    range: &DateRange,
    kind: Option<Kind>,
) -> Result<Vec<Transaction>> {
    let mut sql = format!(
        "SELECT {} FROM transactions WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3",
        COLUMNS
    );
    let mut values: Vec<Box<dyn ToSql>> = vec![
        Box::new(user_id),
        Box::new(range.from.to_string()),
        Box::new(range.to.to_string()),
    ];
    if let Some(kind) = kind {
        sql.push_str(" AND kind = ?4");
        values.push(Box::new(kind.as_str()));
    }
    sql.push_str(" ORDER BY date ASC, id ASC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), row_to_transaction)?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}

/// (income, expense) sums over `range`.
pub fn period_totals(conn: &Connection, user_id: i64, range: &DateRange) -> Result<(Decimal, Decimal)> {
    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;
    for tx in in_range(conn, user_id, range, None)? {
        match tx.kind {
            Kind::Income => income += tx.amount,
            Kind::Expense => expense += tx.amount,
        }
    }
    Ok((income, expense))
}

pub fn monthly_totals(conn: &Connection, user_id: i64, months_back: u32) -> Result<Vec<MonthlyTotal>> {
    monthly_totals_as_of(conn, user_id, months_back, Local::now().date_naive())
}

/// Totals grouped by (calendar month, kind) over the `months_back` months
/// before `today`, ascending by month.
pub fn monthly_totals_as_of(
    conn: &Connection,
    user_id: i64,
    months_back: u32,
    today: NaiveDate,
) -> Result<Vec<MonthlyTotal>> {
    let since = today
        .checked_sub_months(Months::new(months_back))
        .unwrap_or(NaiveDate::MIN);
    let mut stmt = conn.prepare(
        "SELECT substr(date, 1, 7), kind, amount FROM transactions
         WHERE user_id = ?1 AND date >= ?2 AND date <= ?3",
    )?;
    let mut rows = stmt.query(params![user_id, since.to_string(), today.to_string()])?;

    let mut grouped: BTreeMap<(String, Kind), Decimal> = BTreeMap::new();
    while let Some(r) = rows.next()? {
        let month: String = r.get(0)?;
        let kind: Kind = text_col(r, 1)?;
        let amount: Decimal = text_col(r, 2)?;
        *grouped.entry((month, kind)).or_insert(Decimal::ZERO) += amount;
    }
    Ok(grouped
        .into_iter()
        .map(|((month, kind), total)| MonthlyTotal { month, kind, total })
        .collect())
}

pub fn tax_settings(conn: &Connection, user_id: i64) -> Result<Option<TaxSettings>> {
    let settings = conn
        .query_row(
            "SELECT user_id, tax_rate, business_type, quarterly_start_month
             FROM tax_settings WHERE user_id = ?1",
            params![user_id],
            |r| {
                Ok(TaxSettings {
                    user_id: r.get(0)?,
                    tax_rate: text_col(r, 1)?,
                    business_type: r.get(2)?,
                    quarterly_start_month: r.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(settings)
}

pub fn upsert_tax_settings(conn: &Connection, settings: &TaxSettings) -> Result<()> {
    conn.execute(
        "INSERT INTO tax_settings(user_id, tax_rate, business_type, quarterly_start_month)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(user_id) DO UPDATE SET
            tax_rate = excluded.tax_rate,
            business_type = excluded.business_type,
            quarterly_start_month = excluded.quarterly_start_month",
        params![
            settings.user_id,
            settings.tax_rate.to_string(),
            settings.business_type,
            settings.quarterly_start_month
        ],
    )?;
    Ok(())
}
