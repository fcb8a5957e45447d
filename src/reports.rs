// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-only derivations over one owner's ledger.

use chrono::{Datelike, Duration, NaiveDate};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

use crate::error::Result;
use crate::models::{
    CashFlowPoint, CategoryBreakdown, DateRange, Granularity, Kind, MonthPoint, MonthlyTotal,
    Summary,
};
use crate::store;

pub fn summary(conn: &Connection, user_id: i64, range: &DateRange) -> Result<Summary> {
    let (income, expense) = store::period_totals(conn, user_id, range)?;
    Ok(Summary {
        total_income: income,
        total_expenses: expense,
        profit: income - expense,
        period: range.label(),
    })
}

pub fn category_breakdown(
    conn: &Connection,
    user_id: i64,
    range: &DateRange,
    kind: Kind,
) -> Result<Vec<CategoryBreakdown>> {
    let mut per_category: HashMap<String, (Decimal, u64)> = HashMap::new();
    for tx in store::in_range(conn, user_id, range, Some(kind))? {
        let entry = per_category.entry(tx.category).or_insert((Decimal::ZERO, 0));
        entry.0 += tx.amount;
        entry.1 += 1;
    }
    let total: Decimal = per_category.values().map(|(amount, _)| *amount).sum();

    let mut items: Vec<CategoryBreakdown> = per_category
        .into_iter()
        .map(|(category, (amount, count))| CategoryBreakdown {
            percent: if total > Decimal::ZERO {
                amount * Decimal::ONE_HUNDRED / total
            } else {
                Decimal::ZERO
            },
            category,
            amount,
            count,
        })
        .collect();
    items.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.category.cmp(&b.category)));
    Ok(items)
}

/// First day of the bucket containing `date`. Weeks start on Monday.
pub fn bucket_start(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Day => date,
        Granularity::Week => date - Duration::days(date.weekday().num_days_from_monday() as i64),
        Granularity::Month => date.with_day(1).unwrap_or(date),
    }
}

/// Attaches a running balance to chronologically ordered (bucket, income,
/// expense) triples.
pub fn running_balance<I>(buckets: I) -> Vec<CashFlowPoint>
where
    I: IntoIterator<Item = (NaiveDate, Decimal, Decimal)>,
{
    let mut balance = Decimal::ZERO;
    buckets
        .into_iter()
        .map(|(date, income, expense)| {
            balance += income - expense;
            CashFlowPoint {
                date,
                income,
                expense,
                balance,
            }
        })
        .collect()
}

pub fn cash_flow(
    conn: &Connection,
    user_id: i64,
    range: &DateRange,
    granularity: Granularity,
) -> Result<Vec<CashFlowPoint>> {
    let mut buckets: BTreeMap<NaiveDate, (Decimal, Decimal)> = BTreeMap::new();
    for tx in store::in_range(conn, user_id, range, None)? {
        let entry = buckets
            .entry(bucket_start(tx.date, granularity))
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        match tx.kind {
            Kind::Income => entry.0 += tx.amount,
            Kind::Expense => entry.1 += tx.amount,
        }
    }
    // BTreeMap iteration is ascending by bucket date.
    Ok(running_balance(
        buckets
            .into_iter()
            .map(|(date, (income, expense))| (date, income, expense)),
    ))
}

pub fn monthly_totals(conn: &Connection, user_id: i64, months_back: u32) -> Result<Vec<MonthlyTotal>> {
    store::monthly_totals(conn, user_id, months_back)
}

/// Pivots (month, kind) totals into one point per month, ascending.
pub fn monthly_series(totals: &[MonthlyTotal]) -> Vec<MonthPoint> {
    let mut months: BTreeMap<&str, (Decimal, Decimal)> = BTreeMap::new();
    for t in totals {
        let entry = months
            .entry(t.month.as_str())
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        match t.kind {
            Kind::Income => entry.0 += t.total,
            Kind::Expense => entry.1 += t.total,
        }
    }
    months
        .into_iter()
        .map(|(month, (income, expense))| MonthPoint {
            month: month.to_string(),
            income,
            expense,
        })
        .collect()
}
