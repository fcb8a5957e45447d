// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::transactions::table_rows;
use crate::config::Config;
use crate::gateway::MlClient;
use crate::importer::Importer;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;

#[derive(Serialize)]
struct ImportReport<T: Serialize> {
    imported: usize,
    data: T,
}

pub fn handle(conn: &mut Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    let path = m.get_one::<String>("path").context("--path is required")?.trim();
    let bytes = std::fs::read(path).with_context(|| format!("Open spreadsheet {}", path))?;

    let classifier = MlClient::new(&cfg.ml_url, cfg.ml_timeout)?;
    let saved = Importer::new(&classifier)
        .import(conn, cfg.user_id, &bytes)
        .with_context(|| format!("Import {}", path))?;

    let report = ImportReport {
        imported: saved.len(),
        data: &saved,
    };
    if !maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &report)? {
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Kind", "Amount", "Category", "Description", "Source"],
                table_rows(&saved),
            )
        );
        println!("Imported {} transactions from {}", saved.len(), path);
    }
    Ok(())
}
