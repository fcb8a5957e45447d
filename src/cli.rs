// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};
use std::path::PathBuf;

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print JSON lines"),
    )
}

fn range_args(cmd: Command) -> Command {
    cmd.arg(Arg::new("from").long("from").help("Start date YYYY-MM-DD (default: 30 days ago)"))
        .arg(Arg::new("to").long("to").help("End date YYYY-MM-DD (default: today)"))
}

pub fn build_cli() -> Command {
    Command::new("fintrack")
        .about("Income/expense ledger with spreadsheet import, reports and tax estimates")
        .version(clap::crate_version!())
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .env("FINTRACK_DB")
                .value_parser(value_parser!(PathBuf))
                .help("Ledger database path"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .global(true)
                .env("FINTRACK_USER")
                .value_parser(value_parser!(i64))
                .default_value("1")
                .help("Owner id every command acts for"),
        )
        .arg(
            Arg::new("ml_url")
                .long("ml-url")
                .global(true)
                .env("FINTRACK_ML_URL")
                .default_value(crate::config::DEFAULT_ML_URL)
                .help("Base URL of the categorization/forecast service"),
        )
        .arg(
            Arg::new("ml_timeout")
                .long("ml-timeout")
                .global(true)
                .env("FINTRACK_ML_TIMEOUT")
                .value_parser(value_parser!(u64))
                .default_value("5")
                .help("Model service timeout in seconds"),
        )
        .arg(
            Arg::new("log_level")
                .long("log-level")
                .global(true)
                .env("FINTRACK_LOG")
                .default_value("info")
                .help("Log level (error, warn, info, debug, trace)"),
        )
        .subcommand(Command::new("init").about("Create the ledger database"))
        .subcommand(
            Command::new("tx")
                .about("Manage transactions")
                .subcommand(
                    json_flags(
                        Command::new("add")
                            .about("Record a transaction")
                            .arg(
                                Arg::new("amount")
                                    .long("amount")
                                    .required(true)
                                    .allow_hyphen_values(true),
                            )
                            .arg(
                                Arg::new("kind")
                                    .long("kind")
                                    .required(true)
                                    .value_parser(["income", "expense"]),
                            )
                            .arg(Arg::new("date").long("date").required(true))
                            .arg(Arg::new("category").long("category"))
                            .arg(Arg::new("description").long("description")),
                    ),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List transactions, newest first")
                        .arg(
                            Arg::new("kind")
                                .long("kind")
                                .value_parser(["income", "expense"]),
                        )
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("from").long("from"))
                        .arg(Arg::new("to").long("to"))
                        .arg(
                            Arg::new("page")
                                .long("page")
                                .value_parser(value_parser!(i64))
                                .allow_negative_numbers(true)
                                .default_value("1"),
                        )
                        .arg(
                            Arg::new("page_size")
                                .long("page-size")
                                .value_parser(value_parser!(i64))
                                .allow_negative_numbers(true)
                                .default_value("50"),
                        ),
                ))
                .subcommand(json_flags(
                    Command::new("show")
                        .about("Show one transaction")
                        .arg(Arg::new("id").required(true).value_parser(value_parser!(i64))),
                ))
                .subcommand(json_flags(
                    Command::new("update")
                        .about("Change some fields of a transaction")
                        .arg(Arg::new("id").required(true).value_parser(value_parser!(i64)))
                        .arg(Arg::new("amount").long("amount").allow_hyphen_values(true))
                        .arg(
                            Arg::new("kind")
                                .long("kind")
                                .value_parser(["income", "expense"]),
                        )
                        .arg(Arg::new("date").long("date"))
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("description").long("description")),
                ))
                .subcommand(
                    Command::new("rm")
                        .about("Delete a transaction")
                        .arg(Arg::new("id").required(true).value_parser(value_parser!(i64))),
                ),
        )
        .subcommand(json_flags(
            Command::new("import")
                .about("Import transactions from a spreadsheet (xlsx, xls, ods or csv)")
                .arg(Arg::new("path").long("path").required(true)),
        ))
        .subcommand(
            Command::new("report")
                .about("Aggregated reports")
                .subcommand(json_flags(range_args(
                    Command::new("summary").about("Income, expenses and profit"),
                )))
                .subcommand(json_flags(range_args(
                    Command::new("breakdown")
                        .about("Totals per category")
                        .arg(
                            Arg::new("kind")
                                .long("kind")
                                .value_parser(["income", "expense"])
                                .default_value("expense"),
                        ),
                )))
                .subcommand(json_flags(range_args(
                    Command::new("cashflow")
                        .about("Bucketed cash flow with running balance")
                        .arg(
                            Arg::new("granularity")
                                .long("granularity")
                                .value_parser(["day", "week", "month"])
                                .default_value("day"),
                        ),
                )))
                .subcommand(json_flags(
                    Command::new("monthly").about("Monthly totals").arg(
                        Arg::new("months")
                            .long("months")
                            .value_parser(value_parser!(u32))
                            .default_value("12"),
                    ),
                )),
        )
        .subcommand(
            Command::new("tax")
                .about("Tax settings and estimates")
                .subcommand(json_flags(Command::new("settings").about("Show tax settings")))
                .subcommand(json_flags(
                    Command::new("set")
                        .about("Save tax settings")
                        .arg(Arg::new("rate").long("rate").required(true).allow_hyphen_values(true))
                        .arg(Arg::new("business_type").long("business-type"))
                        .arg(
                            Arg::new("start_month")
                                .long("start-month")
                                .value_parser(value_parser!(u32))
                                .default_value("1"),
                        ),
                ))
                .subcommand(json_flags(
                    Command::new("estimate")
                        .about("Estimate tax and quarterly payments for a year")
                        .arg(
                            Arg::new("year")
                                .long("year")
                                .value_parser(value_parser!(i32))
                                .help("Calendar year (default: current year)"),
                        ),
                )),
        )
        .subcommand(
            Command::new("ml")
                .about("Model service pass-through")
                .subcommand(
                    Command::new("classify")
                        .about("Suggest a category for a description")
                        .arg(Arg::new("description").required(true)),
                )
                .subcommand(
                    Command::new("forecast").about("Forecast from the last 12 months").arg(
                        Arg::new("months")
                            .long("months")
                            .value_parser(value_parser!(u32))
                            .default_value("12"),
                    ),
                )
                .subcommand(
                    Command::new("chat")
                        .about("Ask the assistant about recent finances")
                        .arg(Arg::new("message").required(true)),
                )
                .subcommand(json_flags(
                    Command::new("ocr")
                        .about("Scan a receipt image")
                        .arg(Arg::new("path").long("path").required(true))
                        .arg(
                            Arg::new("record")
                                .long("record")
                                .action(ArgAction::SetTrue)
                                .help("Save the proposed transaction to the ledger"),
                        ),
                )),
        )
}
