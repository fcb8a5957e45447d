// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Config;
use crate::models::{Estimate, TaxSettings};
use crate::tax;
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, pretty_table};
use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use rusqlite::Connection;

pub fn handle(conn: &Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("settings", sub)) => {
            let s = tax::settings(conn, cfg.user_id)?;
            print_settings(sub, &s)?;
        }
        Some(("set", sub)) => {
            let input = TaxSettings {
                user_id: cfg.user_id,
                tax_rate: parse_decimal(sub.get_one::<String>("rate").context("--rate is required")?)?,
                business_type: sub
                    .get_one::<String>("business_type")
                    .cloned()
                    .unwrap_or_default(),
                quarterly_start_month: sub.get_one::<u32>("start_month").copied().unwrap_or(1),
            };
            let saved = tax::save_settings(conn, cfg.user_id, input)?;
            print_settings(sub, &saved)?;
        }
        Some(("estimate", sub)) => {
            let year = sub
                .get_one::<i32>("year")
                .copied()
                .unwrap_or_else(|| Local::now().year());
            let est = tax::estimate_for_year(conn, cfg.user_id, year)?;
            print_estimate(sub, year, &est)?;
        }
        _ => {}
    }
    Ok(())
}

fn print_settings(sub: &clap::ArgMatches, s: &TaxSettings) -> Result<()> {
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), s)? {
        println!(
            "{}",
            pretty_table(
                &["Tax rate", "Business type", "Quarter start month"],
                vec![vec![
                    format!("{}%", s.tax_rate),
                    s.business_type.clone(),
                    s.quarterly_start_month.to_string(),
                ]],
            )
        );
    }
    Ok(())
}

fn print_estimate(sub: &clap::ArgMatches, year: i32, est: &Estimate) -> Result<()> {
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), est)? {
        return Ok(());
    }
    println!(
        "{}",
        pretty_table(
            &["Year", "Taxable income", "Rate", "Estimated tax", "Net profit"],
            vec![vec![
                year.to_string(),
                fmt_money(&est.taxable_income),
                format!("{}%", est.tax_rate),
                fmt_money(&est.estimated_tax),
                fmt_money(&est.net_profit),
            ]],
        )
    );
    let rows = est
        .quarterly_payments
        .iter()
        .map(|q| vec![format!("Q{}", q.quarter), q.due_date.to_string(), fmt_money(&q.amount)])
        .collect();
    println!("{}", pretty_table(&["Quarter", "Due", "Amount"], rows));
    for tip in &est.optimization_tips {
        println!("- {}", tip);
    }
    Ok(())
}
