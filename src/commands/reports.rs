// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Config;
use crate::models::{DateRange, Granularity, Kind};
use crate::reports;
use crate::utils::{fmt_money, maybe_print_json, parse_date, pretty_table};
use anyhow::{Result, bail};
use chrono::Local;
use rusqlite::Connection;

pub fn handle(conn: &Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(conn, cfg, sub)?,
        Some(("breakdown", sub)) => breakdown(conn, cfg, sub)?,
        Some(("cashflow", sub)) => cashflow(conn, cfg, sub)?,
        Some(("monthly", sub)) => monthly(conn, cfg, sub)?,
        _ => {}
    }
    Ok(())
}

/// `--from`/`--to`, falling back to the trailing 30 days.
pub fn range_from_matches(sub: &clap::ArgMatches) -> Result<DateRange> {
    let default = DateRange::trailing_30_days(Local::now().date_naive());
    let from = match sub.get_one::<String>("from") {
        Some(s) => parse_date(s)?,
        None => default.from,
    };
    let to = match sub.get_one::<String>("to") {
        Some(s) => parse_date(s)?,
        None => default.to,
    };
    if from > to {
        bail!("--from {} is after --to {}", from, to);
    }
    Ok(DateRange::new(from, to))
}

fn summary(conn: &Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let range = range_from_matches(sub)?;
    let s = reports::summary(conn, cfg.user_id, &range)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
        println!(
            "{}",
            pretty_table(
                &["Period", "Income", "Expenses", "Profit"],
                vec![vec![
                    s.period.clone(),
                    fmt_money(&s.total_income),
                    fmt_money(&s.total_expenses),
                    fmt_money(&s.profit),
                ]],
            )
        );
    }
    Ok(())
}

fn breakdown(conn: &Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let range = range_from_matches(sub)?;
    let kind = match sub.get_one::<String>("kind") {
        Some(k) => k.parse::<Kind>()?,
        None => Kind::Expense,
    };
    let items = reports::category_breakdown(conn, cfg.user_id, &range, kind)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &items)? {
        let rows = items
            .iter()
            .map(|c| {
                vec![
                    c.category.clone(),
                    fmt_money(&c.amount),
                    c.count.to_string(),
                    format!("{:.1}%", c.percent),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Category", "Amount", "Count", "Share"], rows)
        );
    }
    Ok(())
}

fn cashflow(conn: &Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let range = range_from_matches(sub)?;
    let granularity = match sub.get_one::<String>("granularity") {
        Some(g) => g.parse::<Granularity>()?,
        None => Granularity::default(),
    };
    let points = reports::cash_flow(conn, cfg.user_id, &range, granularity)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &points)? {
        let rows = points
            .iter()
            .map(|p| {
                vec![
                    p.date.to_string(),
                    fmt_money(&p.income),
                    fmt_money(&p.expense),
                    fmt_money(&p.balance),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Bucket", "Income", "Expense", "Balance"], rows)
        );
    }
    Ok(())
}

fn monthly(conn: &Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let months = sub.get_one::<u32>("months").copied().unwrap_or(12);
    let totals = reports::monthly_totals(conn, cfg.user_id, months)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &totals)? {
        let rows = reports::monthly_series(&totals)
            .into_iter()
            .map(|p| vec![p.month, fmt_money(&p.income), fmt_money(&p.expense)])
            .collect();
        println!("{}", pretty_table(&["Month", "Income", "Expense"], rows));
    }
    Ok(())
}
