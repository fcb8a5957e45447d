// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use fintrack::models::{DateRange, Granularity, Kind, MonthPoint, MonthlyTotal, NewTransaction, Source};
use fintrack::{db, reports, store};
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

fn add(conn: &Connection, amount: &str, kind: Kind, category: &str, date: &str) {
    store::create(
        conn,
        &NewTransaction {
            user_id: 1,
            amount: dec(amount),
            kind,
            category: category.to_string(),
            description: String::new(),
            date: d(date),
            source: Source::Manual,
        },
    )
    .unwrap();
}

fn march() -> DateRange {
    DateRange::new(d("2024-03-01"), d("2024-03-31"))
}

#[test]
fn summary_reports_profit_and_period() {
    let conn = conn();
    add(&conn, "1000", Kind::Income, "Sales", "2024-03-05");
    add(&conn, "250.75", Kind::Expense, "Rent", "2024-03-10");
    add(&conn, "99", Kind::Expense, "Rent", "2024-02-28");

    let s = reports::summary(&conn, 1, &march()).unwrap();
    assert_eq!(s.total_income, dec("1000"));
    assert_eq!(s.total_expenses, dec("250.75"));
    assert_eq!(s.profit, dec("749.25"));
    assert_eq!(s.period, "2024-03-01..2024-03-31");
}

#[test]
fn summary_of_empty_range_is_zero() {
    let conn = conn();
    let s = reports::summary(&conn, 1, &march()).unwrap();
    assert_eq!(s.profit, Decimal::ZERO);
}

#[test]
fn breakdown_sorts_by_amount_and_shares_sum_to_hundred() {
    let conn = conn();
    add(&conn, "20", Kind::Expense, "Food", "2024-03-01");
    add(&conn, "30", Kind::Expense, "Food", "2024-03-02");
    add(&conn, "30", Kind::Expense, "Travel", "2024-03-03");
    add(&conn, "20", Kind::Expense, "Office", "2024-03-04");
    add(&conn, "500", Kind::Income, "Sales", "2024-03-04");

    let items = reports::category_breakdown(&conn, 1, &march(), Kind::Expense).unwrap();
    let names: Vec<&str> = items.iter().map(|c| c.category.as_str()).collect();
    assert_eq!(names, vec!["Food", "Travel", "Office"]);
    assert_eq!(items[0].count, 2);
    assert_eq!(items[0].amount, dec("50"));
    assert_eq!(items[0].percent, dec("50"));
    let total: Decimal = items.iter().map(|c| c.percent).sum();
    assert_eq!(total, dec("100"));
}

#[test]
fn breakdown_of_nothing_is_empty() {
    let conn = conn();
    assert!(
        reports::category_breakdown(&conn, 1, &march(), Kind::Income)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn running_balance_accumulates_net_flow() {
    let points = reports::running_balance(vec![
        (d("2024-01-01"), dec("100"), dec("40")),
        (d("2024-01-02"), Decimal::ZERO, dec("20")),
        (d("2024-01-03"), dec("50"), Decimal::ZERO),
    ]);
    let balances: Vec<Decimal> = points.iter().map(|p| p.balance).collect();
    assert_eq!(balances, vec![dec("60"), dec("40"), dec("90")]);
}

#[test]
fn buckets_start_on_monday_and_first_of_month() {
    assert_eq!(
        reports::bucket_start(d("2024-03-06"), Granularity::Week),
        d("2024-03-04")
    );
    assert_eq!(
        reports::bucket_start(d("2024-03-04"), Granularity::Week),
        d("2024-03-04")
    );
    assert_eq!(
        reports::bucket_start(d("2024-03-31"), Granularity::Month),
        d("2024-03-01")
    );
    assert_eq!(
        reports::bucket_start(d("2024-03-31"), Granularity::Day),
        d("2024-03-31")
    );
}

#[test]
fn weekly_cash_flow_groups_and_carries_balance() {
    let conn = conn();
    add(&conn, "100", Kind::Income, "Sales", "2024-03-04");
    add(&conn, "30", Kind::Expense, "Food", "2024-03-06");
    add(&conn, "20", Kind::Expense, "Food", "2024-03-12");

    let points = reports::cash_flow(&conn, 1, &march(), Granularity::Week).unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].date, d("2024-03-04"));
    assert_eq!(points[0].income, dec("100"));
    assert_eq!(points[0].expense, dec("30"));
    assert_eq!(points[0].balance, dec("70"));
    assert_eq!(points[1].date, d("2024-03-11"));
    assert_eq!(points[1].balance, dec("50"));
}

#[test]
fn daily_cash_flow_skips_empty_days() {
    let conn = conn();
    add(&conn, "10", Kind::Income, "Sales", "2024-03-01");
    add(&conn, "5", Kind::Expense, "Food", "2024-03-20");
    let points = reports::cash_flow(&conn, 1, &march(), Granularity::Day).unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points[1].balance, dec("5"));
}

#[test]
fn monthly_series_pivots_kinds() {
    let totals = vec![
        MonthlyTotal {
            month: "2024-03".into(),
            kind: Kind::Income,
            total: dec("100"),
        },
        MonthlyTotal {
            month: "2024-03".into(),
            kind: Kind::Expense,
            total: dec("40"),
        },
        MonthlyTotal {
            month: "2024-04".into(),
            kind: Kind::Expense,
            total: dec("10"),
        },
    ];
    assert_eq!(
        reports::monthly_series(&totals),
        vec![
            MonthPoint {
                month: "2024-03".into(),
                income: dec("100"),
                expense: dec("40"),
            },
            MonthPoint {
                month: "2024-04".into(),
                income: Decimal::ZERO,
                expense: dec("10"),
            },
        ]
    );
}
