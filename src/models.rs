// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Label applied when no category can be determined.
pub const OTHER_CATEGORY: &str = "Other";

pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Largest amount a single record may carry. Keeps every ledger sum
/// representable as a `Decimal`.
pub fn max_amount() -> Decimal {
    Decimal::from(1_000_000_000_000i64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Income,
    Expense,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Income => "income",
            Kind::Expense => "expense",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(Kind::Income),
            "expense" => Ok(Kind::Expense),
            other => Err(Error::validation(format!(
                "kind must be income or expense, got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Manual,
    Spreadsheet,
    Receipt,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Manual => "manual",
            Source::Spreadsheet => "spreadsheet",
            Source::Receipt => "receipt",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Source::Manual),
            "spreadsheet" => Ok(Source::Spreadsheet),
            "receipt" => Ok(Source::Receipt),
            other => Err(Error::validation(format!("unknown source '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub kind: Kind,
    pub category: String,
    pub description: String,
    pub date: NaiveDate,
    pub source: Source,
    pub created_at: NaiveDateTime,
}

/// A ledger entry before the store has assigned `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub user_id: i64,
    pub amount: Decimal,
    pub kind: Kind,
    pub category: String,
    pub description: String,
    pub date: NaiveDate,
    pub source: Source,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionPatch {
    pub amount: Option<Decimal>,
    pub kind: Option<Kind>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}

impl TransactionPatch {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.kind.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.date.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub user_id: i64,
    pub kind: Option<Kind>,
    pub category: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub page: i64,
    pub page_size: i64,
}

impl Filter {
    pub fn for_user(user_id: i64) -> Self {
        Filter {
            user_id,
            kind: None,
            category: None,
            from: None,
            to: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// (limit, offset) after coercing a zero page or page size to the defaults.
    /// The offset saturates for absurd page numbers.
    pub fn window(&self) -> (i64, i64) {
        let page = if self.page < 1 { 1 } else { self.page };
        let size = if self.page_size < 1 {
            DEFAULT_PAGE_SIZE
        } else {
            self.page_size
        };
        (size, (page - 1).saturating_mul(size))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    pub month: String, // YYYY-MM
    pub kind: Kind,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthPoint {
    pub month: String, // YYYY-MM
    pub income: Decimal,
    pub expense: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxSettings {
    pub user_id: i64,
    pub tax_rate: Decimal,
    pub business_type: String,
    pub quarterly_start_month: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyPayment {
    pub quarter: u32,
    pub due_date: NaiveDate,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub taxable_income: Decimal,
    pub tax_rate: Decimal,
    pub estimated_tax: Decimal,
    pub net_profit: Decimal,
    pub quarterly_payments: Vec<QuarterlyPayment>,
    pub optimization_tips: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub profit: Decimal,
    pub period: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub category: String,
    pub amount: Decimal,
    pub count: u64,
    pub percent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashFlowPoint {
    pub date: NaiveDate,
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Week,
    Month,
}

impl FromStr for Granularity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(Granularity::Day),
            "week" => Ok(Granularity::Week),
            "month" => Ok(Granularity::Month),
            other => Err(Error::validation(format!(
                "granularity must be day, week or month, got '{}'",
                other
            ))),
        }
    }
}

/// Inclusive calendar interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        DateRange { from, to }
    }

    /// The 30 days leading up to and including `today`.
    pub fn trailing_30_days(today: NaiveDate) -> Self {
        DateRange {
            from: today - chrono::Duration::days(30),
            to: today,
        }
    }

    pub fn calendar_year(year: i32) -> Option<Self> {
        Some(DateRange {
            from: NaiveDate::from_ymd_opt(year, 1, 1)?,
            to: NaiveDate::from_ymd_opt(year, 12, 31)?,
        })
    }

    pub fn label(&self) -> String {
        format!("{}..{}", self.from, self.to)
    }
}
