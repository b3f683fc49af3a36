use chrono::NaiveDate;
use condofin::api::parse_transaction_page;
use condofin::domain::{
    derive, enumerate_periods, format_cents, resolve, FilterChange, FilterMode, FilterStore, FiscalPeriod,
    TransactionFilters, TransactionQuery, TransactionSummaryRaw, TransactionType,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_resolved_ranges_cover_whole_months() {
    for year in [2023, 2024, 2100] {
        for month in 1..=12 {
            let token = format!("{:04}-{:02}", year, month);
            let range = resolve(Some(&token)).unwrap().unwrap();
            assert_eq!(range.from, date(year, month, 1));
            let next = range.to.succ_opt().unwrap();
            assert_eq!(chrono::Datelike::day(&next), 1);
            assert_ne!(chrono::Datelike::month(&next), month);
        }
    }

    let feb = resolve(Some("2024-02")).unwrap().unwrap();
    assert_eq!(feb.to_string_inclusive(), "2024-02-29");
    let dec = resolve(Some("2023-12")).unwrap().unwrap();
    assert_eq!(dec.to_string_inclusive(), "2023-12-31");
}

#[test]
fn test_blank_period_is_unrestricted() {
    assert_eq!(resolve(None).unwrap(), None);
    assert_eq!(resolve(Some("")).unwrap(), None);
    assert_eq!(resolve(Some("  ")).unwrap(), None);
    assert!(resolve(Some("2024-00")).is_err());
    assert!(resolve(Some("24-02")).is_err());
}

#[test]
fn test_normal_payment_amount_clamps() {
    let raw = |income, advance, late| TransactionSummaryRaw {
        total_income: income,
        advance_payment_amount: advance,
        late_payment_amount: late,
        ..Default::default()
    };
    assert_eq!(derive(raw(1000, 200, 300), FilterMode::Normal).normal_payment_amount, 500);
    assert_eq!(derive(raw(100, 80, 50), FilterMode::Normal).normal_payment_amount, 0);
    assert_eq!(derive(raw(1000, 200, 300), FilterMode::Late).normal_payment_amount, 0);
    assert_eq!(derive(raw(1000, 200, 300), FilterMode::Advance).normal_payment_amount, 0);
}

#[test]
fn test_extreme_amounts_never_panic() {
    let summary = TransactionSummaryRaw::from_value(&serde_json::json!({
        "total_income": "92233720368547759"
    }));
    assert_eq!(summary.total_income, 0);

    let page = parse_transaction_page(
        br#"{"data":[],"summary":{"total_income":0,"advance_payment_amount":100000000000000000,"late_payment_amount":1}}"#,
    )
    .unwrap();
    assert_eq!(page.summary.advance_payment_amount, i64::MAX);
    assert_eq!(derive(page.summary, FilterMode::Normal).normal_payment_amount, 0);

    let page = parse_transaction_page(br#"{"items":[],"summary":{"net_balance":-1e30}}"#).unwrap();
    assert_eq!(format_cents(page.summary.net_balance), "-92233720368547758.08");
}

#[test]
fn test_store_page_bookkeeping() {
    let mut store = FilterStore::new();
    store.set_filter(FilterChange::Page(5));
    assert_eq!(store.filters().page, 5);

    store.set_filter(FilterChange::Type(Some(TransactionType::Income)));
    assert_eq!(store.filters().page, 1);

    store.set_filter(FilterChange::Page(3));
    assert_eq!(store.filters().page, 3);

    store.set_filters([
        FilterChange::Type(Some(TransactionType::Expense)),
        FilterChange::Page(7),
    ]);
    assert_eq!(store.filters().page, 1);
    assert_eq!(store.filters().transaction_type, Some(TransactionType::Expense));

    store.set_filters([
        FilterChange::Search(Some("agua".into())),
        FilterChange::PageSize(50),
    ]);
    store.reset_filters();
    assert_eq!(*store.filters(), TransactionFilters::default());
    assert_eq!(store.filters().page_size, 20);
}

#[test]
fn test_snapshots_are_immutable() {
    let mut store = FilterStore::new();
    let before = store.filters();
    store.set_filter(FilterChange::Search(Some("cuota".into())));
    assert_eq!(before.search, None);
    assert_eq!(store.filters().search.as_deref(), Some("cuota"));
}

#[test]
fn test_enumeration_window() {
    let today = date(2024, 1, 15);
    let periods = enumerate_periods(today, 12, 1);
    assert_eq!(periods.len(), 14);
    assert!(periods.windows(2).all(|w| w[0] < w[1]));

    let current = FiscalPeriod::containing(today);
    assert_eq!(periods.iter().filter(|p| **p == current).count(), 1);
    assert_eq!(periods.first().unwrap().to_string(), "2023-01");
    assert_eq!(periods.last().unwrap().to_string(), "2024-02");
}

#[test]
fn test_query_key_tracks_every_filter() {
    let mut store = FilterStore::new();
    let base = TransactionQuery::from_filters(&store.filters(), FilterMode::Normal, false)
        .unwrap()
        .key();

    store.set_filter(FilterChange::FiscalPeriod(Some("2024-02".into())));
    let with_period = TransactionQuery::from_filters(&store.filters(), FilterMode::Normal, false)
        .unwrap()
        .key();
    assert_ne!(base, with_period);

    let advance = TransactionQuery::from_filters(&store.filters(), FilterMode::Advance, false)
        .unwrap()
        .key();
    assert_ne!(with_period, advance);
    assert!(advance.as_str().contains("is_advance=true"));

    // Same inputs, same key.
    let again = TransactionQuery::from_filters(&store.filters(), FilterMode::Normal, false)
        .unwrap()
        .key();
    assert_eq!(with_period, again);
}
