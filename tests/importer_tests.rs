// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use fintrack::config::Config;
use fintrack::gateway::{Classifier, MlClient};
use fintrack::importer::{ColumnMap, Importer, parse_amount, parse_date_flexible, read_grid};
use fintrack::models::{Filter, Kind, Source};
use fintrack::{Error, cli, commands::importer, db, store};
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_xlsxwriter::Workbook;
use std::cell::RefCell;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

struct Fixed {
    label: &'static str,
    seen: RefCell<Vec<String>>,
}

impl Fixed {
    fn new(label: &'static str) -> Self {
        Fixed {
            label,
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl Classifier for Fixed {
    fn classify(&self, description: &str) -> String {
        self.seen.borrow_mut().push(description.to_string());
        self.label.to_string()
    }
}

fn conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

#[test]
fn header_aliases_are_case_insensitive() {
    let header: Vec<String> = ["Date", "Sum", "Note"].iter().map(|s| s.to_string()).collect();
    let map = ColumnMap::from_header(&header).unwrap();
    assert_eq!(map.date, 0);
    assert_eq!(map.amount, 1);
    assert_eq!(map.description, Some(2));
    assert_eq!(map.kind, None);
    assert_eq!(map.category, None);
}

#[test]
fn missing_required_columns_are_named() {
    let header: Vec<String> = ["Description", "Category"].iter().map(|s| s.to_string()).collect();
    let err = ColumnMap::from_header(&header).unwrap_err();
    assert_eq!(err.to_string(), "Missing required column(s): date, amount");
}

#[test]
fn amounts_accept_grouping_and_decimal_comma() {
    assert_eq!(parse_amount("1 234,56"), Some(dec("1234.56")));
    assert_eq!(parse_amount("-45.5"), Some(dec("-45.5")));
    assert_eq!(parse_amount("abc"), None);
}

#[test]
fn dates_accept_each_layout() {
    assert_eq!(parse_date_flexible("2024-03-15"), Some(d("2024-03-15")));
    assert_eq!(parse_date_flexible("15.03.2024"), Some(d("2024-03-15")));
    assert_eq!(parse_date_flexible("03/15/2024"), Some(d("2024-03-15")));
    assert_eq!(parse_date_flexible("2024/03/15"), Some(d("2024-03-15")));
    assert_eq!(parse_date_flexible("March 15"), None);
}

#[test]
fn rows_are_normalized_with_kind_and_category_rules() {
    let csv = "date,amount,type,description,category\n\
               2024-03-01,-45.5,,Groceries,\n\
               2024-03-02,1200,Income,Invoice 17,\n\
               2024-03-03,80,expense,Printer paper,Office\n\
               ,,,,\n\
               2024-03-04,,,Skipped,\n";
    let classifier = Fixed::new("Food");
    let rows = Importer::new(&classifier).normalize(7, csv.as_bytes()).unwrap();
    assert_eq!(rows.len(), 3);

    assert_eq!(rows[0].kind, Kind::Expense);
    assert_eq!(rows[0].amount, dec("45.5"));
    assert_eq!(rows[0].category, "Food");

    assert_eq!(rows[1].kind, Kind::Income);
    assert_eq!(rows[1].category, "Other");

    assert_eq!(rows[2].category, "Office");
    assert!(rows.iter().all(|r| r.user_id == 7 && r.source == Source::Spreadsheet));
    assert_eq!(*classifier.seen.borrow(), vec!["Groceries".to_string()]);
}

#[test]
fn semicolon_files_with_localized_headers() {
    let csv = "\u{feff}Дата;Сумма;Тип;Описание\n15.03.2024;1 234,56;Доход;Оплата\n16.03.2024;-300;;Аренда\n";
    let rows = Importer::new(&Fixed::new("Rent"))
        .normalize(1, csv.as_bytes())
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date, d("2024-03-15"));
    assert_eq!(rows[0].amount, dec("1234.56"));
    assert_eq!(rows[0].kind, Kind::Income);
    assert_eq!(rows[1].kind, Kind::Expense);
    assert_eq!(rows[1].category, "Rent");
}

#[test]
fn bad_row_rejects_the_file_and_persists_nothing() {
    let mut conn = conn();
    let csv = "date,amount,category\n2024-01-01,10,Food\nyesterday,5,Food\n";
    let err = Importer::new(&Fixed::new("Food"))
        .import(&mut conn, 1, csv.as_bytes())
        .unwrap_err();
    match &err {
        Error::Format { row, message } => {
            assert_eq!(*row, Some(3));
            assert!(message.contains("yesterday"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.to_string(), "row 3: invalid date 'yesterday'");
    assert_eq!(store::list(&conn, &Filter::for_user(1)).unwrap().total, 0);
}

#[test]
fn zero_and_garbage_amounts_are_rejected() {
    let classifier = Fixed::new("Food");
    let zero = "date,amount\n2024-01-01,0\n";
    assert!(matches!(
        Importer::new(&classifier).normalize(1, zero.as_bytes()),
        Err(Error::Format { row: Some(2), .. })
    ));
    let garbage = "date,amount\n2024-01-01,12abc\n";
    assert!(matches!(
        Importer::new(&classifier).normalize(1, garbage.as_bytes()),
        Err(Error::Format { row: Some(2), .. })
    ));
}

#[test]
fn header_only_file_is_a_format_error() {
    assert!(matches!(
        Importer::new(&Fixed::new("x")).normalize(1, b"date,amount\n"),
        Err(Error::Format { row: None, .. })
    ));
}

#[test]
fn unreachable_model_service_falls_back_to_other() {
    let client = MlClient::new("http://127.0.0.1:9", Duration::from_millis(300)).unwrap();
    let rows = Importer::new(&client)
        .normalize(1, b"date,amount,description\n2024-05-01,-12,Lunch\n")
        .unwrap();
    assert_eq!(rows[0].category, "Other");
}

#[test]
fn first_worksheet_of_a_workbook_is_imported() {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        for (col, title) in ["Date", "Amount", "Type", "Category"].iter().enumerate() {
            sheet.write_string(0, col as u16, *title).unwrap();
        }
        sheet.write_string(1, 0, "2024-02-10").unwrap();
        sheet.write_number(1, 1, -12.5).unwrap();
        sheet.write_string(1, 3, "Transport").unwrap();
        sheet.write_string(2, 0, "11.02.2024").unwrap();
        sheet.write_number(2, 1, 300).unwrap();
        sheet.write_string(2, 2, "income").unwrap();
    }
    {
        let other = workbook.add_worksheet();
        other.write_string(0, 0, "Date").unwrap();
        other.write_string(0, 1, "Amount").unwrap();
        other.write_string(1, 0, "2024-02-12").unwrap();
        other.write_number(1, 1, 999).unwrap();
    }
    let bytes = workbook.save_to_buffer().unwrap();

    let grid = read_grid(&bytes).unwrap();
    assert_eq!(grid.first_row, 1);
    assert_eq!(grid.rows.len(), 3);

    let mut conn = conn();
    let saved = Importer::new(&Fixed::new("Other"))
        .import(&mut conn, 3, &bytes)
        .unwrap();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].amount, dec("12.5"));
    assert_eq!(saved[0].kind, Kind::Expense);
    assert_eq!(saved[0].category, "Transport");
    assert_eq!(saved[1].date, d("2024-02-11"));
    assert_eq!(saved[1].kind, Kind::Income);
    assert_eq!(store::list(&conn, &Filter::for_user(3)).unwrap().total, 2);
}

#[test]
fn cli_import_trims_path_and_persists() {
    let mut conn = conn();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "date,amount,type,category,description\n2025-02-03,500,income,,Consulting\n2025-02-04,-5.00,,Food,Snacks"
    )
    .unwrap();
    file.flush().unwrap();

    let path = file.path().to_str().unwrap().to_string();
    let padded = format!("  {}  ", path);
    let matches = cli::build_cli().get_matches_from([
        "fintrack",
        "--user",
        "4",
        "--ml-url",
        "http://127.0.0.1:9",
        "import",
        "--path",
        padded.as_str(),
    ]);
    let cfg = Config::from_matches(&matches).unwrap();
    let Some(("import", sub)) = matches.subcommand() else {
        panic!("no import subcommand");
    };
    importer::handle(&mut conn, &cfg, sub).unwrap();

    let page = store::list(&conn, &Filter::for_user(4)).unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.data[0].category, "Food");
    assert_eq!(page.data[1].category, "Other");
}

#[test]
fn amounts_above_the_ceiling_are_row_errors() {
    let mut conn = conn();
    let csv = "date,amount,category\n\
               2024-01-01,79228162514264337593543950335,Sales\n\
               2024-01-02,79228162514264337593543950335,Sales\n";
    let err = Importer::new(&Fixed::new("x"))
        .import(&mut conn, 1, csv.as_bytes())
        .unwrap_err();
    assert!(matches!(err, Error::Format { row: Some(2), .. }));
    assert_eq!(store::list(&conn, &Filter::for_user(1)).unwrap().total, 0);

    let summary = fintrack::reports::summary(
        &conn,
        1,
        &fintrack::models::DateRange::new(d("2024-01-01"), d("2024-01-31")),
    )
    .unwrap();
    assert_eq!(summary.total_income, Decimal::ZERO);
}

#[test]
fn storage_failure_reports_pending_rows() {
    let mut conn = conn();
    conn.execute_batch("DROP TABLE transactions;").unwrap();
    let csv = "date,amount,category\n2024-01-01,10,Food\n2024-01-02,-4,Food\n,,\n2024-01-03,7,Food\n";
    let err = Importer::new(&Fixed::new("Food"))
        .import(&mut conn, 1, csv.as_bytes())
        .unwrap_err();
    match err {
        Error::Import { pending, source } => {
            assert_eq!(pending, 3);
            assert!(matches!(*source, Error::Storage(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}
