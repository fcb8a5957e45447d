// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::models::{DateRange, Estimate, QuarterlyPayment, TaxSettings};
use crate::store;

pub const DEFAULT_BUSINESS_TYPE: &str = "general";
pub const DEFAULT_START_MONTH: u32 = 1;

pub fn default_rate() -> Decimal {
    Decimal::from(20)
}

pub fn default_settings(user_id: i64) -> TaxSettings {
    TaxSettings {
        user_id,
        tax_rate: default_rate(),
        business_type: DEFAULT_BUSINESS_TYPE.to_string(),
        quarterly_start_month: DEFAULT_START_MONTH,
    }
}

/// Replaces out-of-range values with the defaults instead of rejecting them.
pub fn clamp_settings(mut s: TaxSettings) -> TaxSettings {
    if s.tax_rate <= Decimal::ZERO || s.tax_rate > Decimal::ONE_HUNDRED {
        s.tax_rate = default_rate();
    }
    if !(1..=12).contains(&s.quarterly_start_month) {
        s.quarterly_start_month = DEFAULT_START_MONTH;
    }
    s.business_type = s.business_type.trim().to_string();
    if s.business_type.is_empty() {
        s.business_type = DEFAULT_BUSINESS_TYPE.to_string();
    }
    s
}

/// Stored settings, or the defaults when the user never saved any.
pub fn settings(conn: &Connection, user_id: i64) -> Result<TaxSettings> {
    Ok(store::tax_settings(conn, user_id)?.unwrap_or_else(|| default_settings(user_id)))
}

pub fn save_settings(conn: &Connection, user_id: i64, input: TaxSettings) -> Result<TaxSettings> {
    let settings = clamp_settings(TaxSettings { user_id, ..input });
    store::upsert_tax_settings(conn, &settings)?;
    tracing::info!(user = user_id, rate = %settings.tax_rate, "saved tax settings");
    Ok(settings)
}

/// Four equal installments. Installment `i` covers month
/// `((start - 1 + 3i) mod 12) + 1` and is due on the 15th of the month after.
/// The due year moves forward when the covered month wrapped past December.
pub fn quarterly_schedule(total_tax: Decimal, year: i32, start_month: u32) -> Option<Vec<QuarterlyPayment>> {
    let per_quarter = total_tax / Decimal::from(4);
    (0..4u32)
        .map(|i| {
            let covered = ((start_month - 1 + i * 3) % 12) + 1;
            let pay_year = if covered < start_month { year + 1 } else { year };
            let (due_year, due_month) = if covered == 12 {
                (pay_year + 1, 1)
            } else {
                (pay_year, covered + 1)
            };
            Some(QuarterlyPayment {
                quarter: i + 1,
                due_date: NaiveDate::from_ymd_opt(due_year, due_month, 15)?,
                amount: per_quarter,
            })
        })
        .collect()
}

pub fn optimization_tips(income: Decimal, expenses: Decimal, tax_rate: Decimal) -> Vec<String> {
    let mut tips = Vec::new();
    let expense_ratio = if income > Decimal::ZERO {
        expenses / income * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };
    let thirty = Decimal::from(30);
    let eighty = Decimal::from(80);
    let simplified_threshold = Decimal::from(25);

    if expense_ratio < thirty {
        tips.push(
            "Your expense ratio is low: consider reinvesting profits in equipment or marketing to reduce taxable income."
                .to_string(),
        );
    }
    if expense_ratio > eighty {
        tips.push(
            "High expense ratio detected: review recurring costs and identify areas to cut."
                .to_string(),
        );
    }
    if tax_rate > simplified_threshold {
        tips.push(format!(
            "Your tax rate is {:.1}%: explore whether your business qualifies for a simplified tax regime.",
            tax_rate
        ));
    }
    tips.push("Keep all receipts and invoices to maximize deductible business expenses.".to_string());
    tips.push(
        "Consider a retirement/pension fund contribution, these are typically tax-deductible."
            .to_string(),
    );
    tips
}

pub fn estimate(settings: &TaxSettings, income: Decimal, expenses: Decimal, year: i32) -> Result<Estimate> {
    let settings = clamp_settings(settings.clone());
    let taxable_income = (income - expenses).max(Decimal::ZERO);
    let estimated_tax = taxable_income * settings.tax_rate / Decimal::ONE_HUNDRED;
    let quarterly_payments = quarterly_schedule(estimated_tax, year, settings.quarterly_start_month)
        .ok_or_else(|| Error::validation(format!("year {} is out of range", year)))?;

    Ok(Estimate {
        taxable_income,
        tax_rate: settings.tax_rate,
        estimated_tax,
        net_profit: taxable_income - estimated_tax,
        quarterly_payments,
        optimization_tips: optimization_tips(income, expenses, settings.tax_rate),
    })
}

pub fn estimate_for_year(conn: &Connection, user_id: i64, year: i32) -> Result<Estimate> {
    let settings = settings(conn, user_id)?;
    let range = DateRange::calendar_year(year)
        .ok_or_else(|| Error::validation(format!("year {} is out of range", year)))?;
    let (income, expenses) = store::period_totals(conn, user_id, &range)?;
    tracing::debug!(user = user_id, year, %income, %expenses, "estimating tax");
    estimate(&settings, income, expenses, year)
}

