// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use fintrack::models::{DateRange, Filter, Kind, MonthlyTotal, NewTransaction, Source};
use fintrack::{Error, db, store};
use rusqlite::Connection;
use rust_decimal::Decimal;

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

fn new_tx(user_id: i64, amount: &str, kind: Kind, category: &str, date: &str) -> NewTransaction {
    NewTransaction {
        user_id,
        amount: dec(amount),
        kind,
        category: category.to_string(),
        description: String::new(),
        date: d(date),
        source: Source::Manual,
    }
}

#[test]
fn create_then_fetch_round_trips_fields() {
    let conn = conn();
    let created = store::create(
        &conn,
        &NewTransaction {
            description: "Coffee beans".into(),
            ..new_tx(1, "12.50", Kind::Expense, "Food", "2024-03-02")
        },
    )
    .unwrap();
    assert!(created.id > 0);

    let fetched = store::get_by_id(&conn, created.id, 1).unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.amount, dec("12.5"));
    assert_eq!(fetched.source, Source::Manual);
}

#[test]
fn records_are_invisible_to_other_owners() {
    let conn = conn();
    let tx = store::create(&conn, &new_tx(1, "10", Kind::Income, "Sales", "2024-01-01")).unwrap();

    assert!(matches!(
        store::get_by_id(&conn, tx.id, 2),
        Err(Error::NotFound { .. })
    ));
    assert!(matches!(
        store::delete(&conn, tx.id, 2),
        Err(Error::NotFound { .. })
    ));
    let mut foreign = tx.clone();
    foreign.user_id = 2;
    assert!(matches!(
        store::update(&conn, &foreign),
        Err(Error::NotFound { .. })
    ));

    assert_eq!(store::list(&conn, &Filter::for_user(2)).unwrap().total, 0);
    store::delete(&conn, tx.id, 1).unwrap();
    assert!(store::get_by_id(&conn, tx.id, 1).is_err());
}

#[test]
fn list_filters_orders_and_paginates() {
    let conn = conn();
    for day in 1..=5 {
        let kind = if day % 2 == 0 { Kind::Income } else { Kind::Expense };
        store::create(
            &conn,
            &new_tx(1, "5", kind, "Misc", &format!("2024-02-0{}", day)),
        )
        .unwrap();
    }

    let mut filter = Filter::for_user(1);
    filter.page_size = 2;
    filter.page = 3;
    let page = store::list(&conn, &filter).unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].date, d("2024-02-01"));

    let first = store::list(
        &conn,
        &Filter {
            page: 1,
            ..filter.clone()
        },
    )
    .unwrap();
    assert_eq!(first.data[0].date, d("2024-02-05"));

    let incomes = store::list(
        &conn,
        &Filter {
            kind: Some(Kind::Income),
            from: Some(d("2024-02-03")),
            ..Filter::for_user(1)
        },
    )
    .unwrap();
    assert_eq!(incomes.total, 1);
    assert_eq!(incomes.data[0].date, d("2024-02-04"));
}

#[test]
fn zero_page_and_page_size_fall_back_to_defaults() {
    let conn = conn();
    for day in 1..=3 {
        store::create(
            &conn,
            &new_tx(1, "1", Kind::Expense, "Misc", &format!("2024-02-0{}", day)),
        )
        .unwrap();
    }
    let filter = Filter {
        page: 0,
        page_size: 0,
        ..Filter::for_user(1)
    };
    assert_eq!(filter.window(), (50, 0));
    assert_eq!(store::list(&conn, &filter).unwrap().data.len(), 3);
}

#[test]
fn bulk_create_is_all_or_nothing() {
    let mut conn = conn();
    let batch = vec![
        new_tx(1, "10", Kind::Expense, "Food", "2024-01-01"),
        new_tx(1, "20", Kind::Expense, "", "2024-01-02"),
    ];
    assert!(matches!(
        store::bulk_create(&mut conn, &batch),
        Err(Error::Storage(_))
    ));
    assert_eq!(store::list(&conn, &Filter::for_user(1)).unwrap().total, 0);

    let ok = vec![
        new_tx(1, "10", Kind::Expense, "Food", "2024-01-01"),
        new_tx(1, "20", Kind::Income, "Sales", "2024-01-02"),
    ];
    let saved = store::bulk_create(&mut conn, &ok).unwrap();
    assert_eq!(saved.len(), 2);
    assert!(saved[0].id < saved[1].id);
}

#[test]
fn period_totals_cover_inclusive_range() {
    let conn = conn();
    store::create(&conn, &new_tx(1, "100", Kind::Income, "Sales", "2024-03-01")).unwrap();
    store::create(&conn, &new_tx(1, "30", Kind::Expense, "Rent", "2024-03-31")).unwrap();
    store::create(&conn, &new_tx(1, "7", Kind::Expense, "Rent", "2024-04-01")).unwrap();

    let range = DateRange::new(d("2024-03-01"), d("2024-03-31"));
    let (income, expense) = store::period_totals(&conn, 1, &range).unwrap();
    assert_eq!(income, dec("100"));
    assert_eq!(expense, dec("30"));
}

#[test]
fn monthly_totals_group_by_month_and_kind() {
    let conn = conn();
    store::create(&conn, &new_tx(1, "999", Kind::Income, "Old", "2024-01-01")).unwrap();
    store::create(&conn, &new_tx(1, "100", Kind::Income, "Sales", "2024-03-20")).unwrap();
    store::create(&conn, &new_tx(1, "40", Kind::Expense, "Rent", "2024-04-01")).unwrap();
    store::create(&conn, &new_tx(1, "10", Kind::Expense, "Food", "2024-04-10")).unwrap();
    store::create(&conn, &new_tx(2, "5", Kind::Expense, "Food", "2024-04-10")).unwrap();

    let totals = store::monthly_totals_as_of(&conn, 1, 3, d("2024-06-15")).unwrap();
    assert_eq!(
        totals,
        vec![
            MonthlyTotal {
                month: "2024-03".into(),
                kind: Kind::Income,
                total: dec("100"),
            },
            MonthlyTotal {
                month: "2024-04".into(),
                kind: Kind::Expense,
                total: dec("50"),
            },
        ]
    );
}

#[test]
fn open_at_creates_schema_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.sqlite");
    {
        let conn = db::open_at(&path).unwrap();
        store::create(&conn, &new_tx(1, "1", Kind::Income, "Sales", "2024-01-01")).unwrap();
    }
    let conn = db::open_at(&path).unwrap();
    assert_eq!(store::list(&conn, &Filter::for_user(1)).unwrap().total, 1);
}

#[test]
fn huge_page_number_yields_empty_page() {
    let conn = conn();
    store::create(&conn, &new_tx(1, "1", Kind::Expense, "Misc", "2024-02-01")).unwrap();
    let filter = Filter {
        page: i64::MAX,
        ..Filter::for_user(1)
    };
    assert_eq!(filter.window(), (50, i64::MAX));
    let page = store::list(&conn, &filter).unwrap();
    assert_eq!(page.total, 1);
    assert!(page.data.is_empty());
}

#[test]
fn schema_rejects_amounts_above_the_ceiling() {
    let mut conn = conn();
    let batch = vec![new_tx(
        1,
        "79228162514264337593543950335",
        Kind::Income,
        "Sales",
        "2024-01-01",
    )];
    assert!(matches!(
        store::bulk_create(&mut conn, &batch),
        Err(Error::Storage(_))
    ));
    store::create(&conn, &new_tx(1, "1000000000000", Kind::Income, "Sales", "2024-01-01")).unwrap();
}

#[test]
fn schema_init_is_idempotent_and_leaves_pragmas_alone() {
    let conn = conn();
    db::init_schema(&conn).unwrap();
    let fk: i64 = conn
        .query_row("PRAGMA foreign_keys", [], |r| r.get(0))
        .unwrap();
    assert_eq!(fk, 0);
}
