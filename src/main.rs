// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use fintrack::{cli, commands, config::Config, db};

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fintrack={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    let cfg = Config::from_matches(&matches)?;
    init_tracing(&cfg.log_level);

    let db_path = cfg.resolve_db_path()?;
    let mut conn = db::open_at(&db_path)?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db_path.display());
        }
        Some(("tx", sub)) => commands::transactions::handle(&conn, &cfg, sub)?,
        Some(("import", sub)) => commands::importer::handle(&mut conn, &cfg, sub)?,
        Some(("report", sub)) => commands::reports::handle(&conn, &cfg, sub)?,
        Some(("tax", sub)) => commands::tax::handle(&conn, &cfg, sub)?,
        Some(("ml", sub)) => commands::ml::handle(&conn, &cfg, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
