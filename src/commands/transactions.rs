// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Config;
use crate::gateway::MlClient;
use crate::ledger::{self, CreateRequest};
use crate::models::{Filter, Kind, Transaction, TransactionPatch};
use crate::store;
use crate::utils::{fmt_money, maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, cfg, sub)?,
        Some(("list", sub)) => list(conn, cfg, sub)?,
        Some(("show", sub)) => show(conn, cfg, sub)?,
        Some(("update", sub)) => update(conn, cfg, sub)?,
        Some(("rm", sub)) => remove(conn, cfg, sub)?,
        _ => {}
    }
    Ok(())
}

fn required<'a>(sub: &'a clap::ArgMatches, name: &str) -> Result<&'a String> {
    sub.get_one::<String>(name)
        .with_context(|| format!("--{} is required", name))
}

fn add(conn: &Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let req = CreateRequest {
        amount: parse_decimal(required(sub, "amount")?)?,
        kind: required(sub, "kind")?.clone(),
        category: sub.get_one::<String>("category").cloned().unwrap_or_default(),
        description: sub
            .get_one::<String>("description")
            .cloned()
            .unwrap_or_default(),
        date: required(sub, "date")?.clone(),
    };
    let classifier = MlClient::new(&cfg.ml_url, cfg.ml_timeout)?;
    let tx = ledger::create_manual(conn, &classifier, cfg.user_id, req)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &tx)? {
        println!(
            "Recorded {} {} on {} in '{}' (id {})",
            tx.kind,
            fmt_money(&tx.amount),
            tx.date,
            tx.category,
            tx.id
        );
    }
    Ok(())
}

/// Builds the listing filter for `user_id` from `tx list` arguments.
pub fn filter_from_matches(user_id: i64, sub: &clap::ArgMatches) -> Result<Filter> {
    let mut filter = Filter::for_user(user_id);
    if let Some(kind) = sub.get_one::<String>("kind") {
        filter.kind = Some(kind.parse::<Kind>()?);
    }
    filter.category = sub
        .get_one::<String>("category")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    if let Some(from) = sub.get_one::<String>("from") {
        filter.from = Some(parse_date(from)?);
    }
    if let Some(to) = sub.get_one::<String>("to") {
        filter.to = Some(parse_date(to)?);
    }
    if let Some(page) = sub.get_one::<i64>("page") {
        filter.page = *page;
    }
    if let Some(size) = sub.get_one::<i64>("page_size") {
        filter.page_size = *size;
    }
    Ok(filter)
}

pub fn table_rows(txs: &[Transaction]) -> Vec<Vec<String>> {
    txs.iter()
        .map(|t| {
            vec![
                t.id.to_string(),
                t.date.to_string(),
                t.kind.to_string(),
                fmt_money(&t.amount),
                t.category.clone(),
                t.description.clone(),
                t.source.to_string(),
            ]
        })
        .collect()
}

const HEADERS: [&str; 7] = ["ID", "Date", "Kind", "Amount", "Category", "Description", "Source"];

fn list(conn: &Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let filter = filter_from_matches(cfg.user_id, sub)?;
    let page = store::list(conn, &filter)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &page)? {
        println!("{}", pretty_table(&HEADERS, table_rows(&page.data)));
        let (limit, offset) = filter.window();
        println!(
            "Showing {} of {} (page size {}, offset {})",
            page.data.len(),
            page.total,
            limit,
            offset
        );
    }
    Ok(())
}

fn show(conn: &Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").context("id is required")?;
    let tx = store::get_by_id(conn, id, cfg.user_id)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &tx)? {
        println!("{}", pretty_table(&HEADERS, table_rows(std::slice::from_ref(&tx))));
    }
    Ok(())
}

pub fn patch_from_matches(sub: &clap::ArgMatches) -> Result<TransactionPatch> {
    Ok(TransactionPatch {
        amount: sub
            .get_one::<String>("amount")
            .map(|s| parse_decimal(s))
            .transpose()?,
        kind: sub
            .get_one::<String>("kind")
            .map(|s| s.parse::<Kind>())
            .transpose()?,
        category: sub.get_one::<String>("category").cloned(),
        description: sub.get_one::<String>("description").cloned(),
        date: sub
            .get_one::<String>("date")
            .map(|s| parse_date(s))
            .transpose()?,
    })
}

fn update(conn: &Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").context("id is required")?;
    let patch = patch_from_matches(sub)?;
    if patch.is_empty() {
        anyhow::bail!("Nothing to update; pass at least one of --amount, --kind, --date, --category, --description");
    }
    let tx = ledger::update(conn, id, cfg.user_id, patch)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &tx)? {
        println!("Updated transaction {}", tx.id);
    }
    Ok(())
}

fn remove(conn: &Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").context("id is required")?;
    store::delete(conn, id, cfg.user_id)?;
    println!("Removed transaction {}", id);
    Ok(())
}
