// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Config;
use crate::gateway::{Classifier, MlClient, ReceiptDraft};
use crate::ledger;
use crate::reports;
use crate::utils::{fmt_money, maybe_print_json};
use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::Connection;
use std::path::Path;

const CHAT_CONTEXT_MONTHS: u32 = 3;

pub fn handle(conn: &Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    let client = MlClient::new(&cfg.ml_url, cfg.ml_timeout)?;
    match m.subcommand() {
        Some(("classify", sub)) => {
            let description = sub
                .get_one::<String>("description")
                .context("description is required")?;
            println!("{}", client.classify(description));
        }
        Some(("forecast", sub)) => {
            let months = sub.get_one::<u32>("months").copied().unwrap_or(12);
            let history = reports::monthly_series(&reports::monthly_totals(conn, cfg.user_id, months)?);
            let forecast = client
                .forecast(&history)
                .with_context(|| format!("Forecast via {}", client.base_url()))?;
            println!("{}", serde_json::to_string_pretty(&forecast)?);
        }
        Some(("chat", sub)) => {
            let message = sub.get_one::<String>("message").context("message is required")?;
            let context = reports::monthly_series(&reports::monthly_totals(
                conn,
                cfg.user_id,
                CHAT_CONTEXT_MONTHS,
            )?);
            let reply = client
                .chat(cfg.user_id, message, &context)
                .with_context(|| format!("Chat via {}", client.base_url()))?;
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
        Some(("ocr", sub)) => ocr(conn, cfg, &client, sub)?,
        _ => {}
    }
    Ok(())
}

fn ocr(conn: &Connection, cfg: &Config, client: &MlClient, sub: &clap::ArgMatches) -> Result<()> {
    let path = sub.get_one::<String>("path").context("--path is required")?.trim();
    let bytes = std::fs::read(path).with_context(|| format!("Open receipt {}", path))?;
    let filename = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("receipt.jpg");
    let scan = client
        .ocr(bytes, filename)
        .with_context(|| format!("OCR via {}", client.base_url()))?;

    if !sub.get_flag("record") {
        if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &scan)? {
            println!("{}", serde_json::to_string_pretty(&scan)?);
        }
        return Ok(());
    }
    let draft = ReceiptDraft::from_scan(&scan)?;
    let tx = ledger::record_receipt(conn, client, cfg.user_id, &draft, Local::now().date_naive())?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &tx)? {
        println!(
            "Recorded receipt {} on {} in '{}' (id {})",
            fmt_money(&tx.amount),
            tx.date,
            tx.category,
            tx.id
        );
    }
    Ok(())
}
