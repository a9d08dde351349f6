use chrono::{TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    Engine, EngineError, ExpenditureKind, ExpenditureListFilter, ExpenditureUpdate, MoneyCents,
    MonthWindow, NewExpenditure,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for username in ["alice", "bob"] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, name) VALUES (?, ?)",
            vec![username.into(), Option::<String>::None.into()],
        ))
        .await
        .unwrap();
    }
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn ledger_with_category(engine: &Engine) -> (String, Uuid) {
    let ledger_id = engine.new_ledger("Casa", "alice").await.unwrap();
    let category_id = engine
        .new_category(&ledger_id, "Bollette", "alice")
        .await
        .unwrap();
    (ledger_id, category_id)
}

fn money(raw: &str) -> MoneyCents {
    raw.parse().unwrap()
}

#[tokio::test]
async fn expected_prospect_tracks_linked_actuals() {
    let (engine, _db) = engine_with_db().await;
    let (_ledger_id, category_id) = ledger_with_category(&engine).await;

    let rent = engine
        .new_expenditure(
            NewExpenditure {
                name: "Rent".to_string(),
                value: money("1000"),
                category_id,
                date: None,
                is_expected: true,
                expected_expenditure_id: None,
            },
            "alice",
        )
        .await
        .unwrap();

    let first = engine
        .new_expenditure(
            NewExpenditure {
                name: "Rent deposit".to_string(),
                value: money("400"),
                category_id,
                date: None,
                is_expected: false,
                expected_expenditure_id: Some(rent),
            },
            "alice",
        )
        .await
        .unwrap();
    engine
        .new_expenditure(
            NewExpenditure {
                name: "Rent balance".to_string(),
                value: money("300"),
                category_id,
                date: None,
                is_expected: false,
                expected_expenditure_id: Some(rent),
            },
            "alice",
        )
        .await
        .unwrap();

    let from_expected = engine.expenditure_prospect(rent, "alice").await.unwrap();
    assert_eq!(from_expected.actual, money("700"));
    assert_eq!(from_expected.expected, Some(money("1000")));
    assert_eq!(from_expected.delta, Some(money("300")));

    // A linked actual sees the same aggregate, not just its own value.
    let from_actual = engine.expenditure_prospect(first, "alice").await.unwrap();
    assert_eq!(from_actual, from_expected);
}

#[tokio::test]
async fn standalone_actual_has_no_expected_view() {
    let (engine, _db) = engine_with_db().await;
    let (_ledger_id, category_id) = ledger_with_category(&engine).await;

    let groceries = engine
        .new_expenditure(
            NewExpenditure {
                name: "Groceries".to_string(),
                value: money("84.20"),
                category_id,
                date: None,
                is_expected: false,
                expected_expenditure_id: None,
            },
            "alice",
        )
        .await
        .unwrap();

    let prospect = engine
        .expenditure_prospect(groceries, "alice")
        .await
        .unwrap();
    assert_eq!(prospect.actual, money("84.20"));
    assert_eq!(prospect.expected, None);
    assert_eq!(prospect.delta, None);
}

#[tokio::test]
async fn expected_line_cannot_link_another_expected() {
    let (engine, _db) = engine_with_db().await;
    let (_ledger_id, category_id) = ledger_with_category(&engine).await;

    let rent = engine
        .new_expenditure(
            NewExpenditure {
                name: "Rent".to_string(),
                value: money("1000"),
                category_id,
                date: None,
                is_expected: true,
                expected_expenditure_id: None,
            },
            "alice",
        )
        .await
        .unwrap();

    let err = engine
        .new_expenditure(
            NewExpenditure {
                name: "Utilities".to_string(),
                value: money("150"),
                category_id,
                date: None,
                is_expected: true,
                expected_expenditure_id: Some(rent),
            },
            "alice",
        )
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ConflictingExpectation);

    // Same conflict when an update turns a linked row expected.
    let actual = engine
        .new_expenditure(
            NewExpenditure {
                name: "Utilities".to_string(),
                value: money("150"),
                category_id,
                date: None,
                is_expected: false,
                expected_expenditure_id: None,
            },
            "alice",
        )
        .await
        .unwrap();
    let err = engine
        .update_expenditure(
            actual,
            ExpenditureUpdate {
                is_expected: Some(true),
                expected_expenditure_id: Some(Some(rent)),
                ..Default::default()
            },
            "alice",
        )
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ConflictingExpectation);
}

#[tokio::test]
async fn turning_a_linked_row_expected_clears_the_link() {
    let (engine, _db) = engine_with_db().await;
    let (_ledger_id, category_id) = ledger_with_category(&engine).await;

    let rent = engine
        .new_expenditure(
            NewExpenditure {
                name: "Rent".to_string(),
                value: money("1000"),
                category_id,
                date: None,
                is_expected: true,
                expected_expenditure_id: None,
            },
            "alice",
        )
        .await
        .unwrap();
    let actual = engine
        .new_expenditure(
            NewExpenditure {
                name: "Rent payment".to_string(),
                value: money("1000"),
                category_id,
                date: None,
                is_expected: false,
                expected_expenditure_id: Some(rent),
            },
            "alice",
        )
        .await
        .unwrap();

    engine
        .update_expenditure(
            actual,
            ExpenditureUpdate {
                is_expected: Some(true),
                ..Default::default()
            },
            "alice",
        )
        .await
        .unwrap();

    let row = engine.expenditure(actual, "alice").await.unwrap();
    assert!(row.is_expected);
    assert_eq!(row.expected_expenditure_id, None);
}

#[tokio::test]
async fn linked_actual_inherits_the_expected_category() {
    let (engine, _db) = engine_with_db().await;
    let (ledger_id, bills) = ledger_with_category(&engine).await;
    let spare = engine
        .new_category(&ledger_id, "Varie", "alice")
        .await
        .unwrap();

    let rent = engine
        .new_expenditure(
            NewExpenditure {
                name: "Rent".to_string(),
                value: money("1000"),
                category_id: bills,
                date: None,
                is_expected: true,
                expected_expenditure_id: None,
            },
            "alice",
        )
        .await
        .unwrap();

    // Recorded against the wrong category, corrected to the linked one.
    let actual = engine
        .new_expenditure(
            NewExpenditure {
                name: "Rent payment".to_string(),
                value: money("1000"),
                category_id: spare,
                date: None,
                is_expected: false,
                expected_expenditure_id: Some(rent),
            },
            "alice",
        )
        .await
        .unwrap();

    let row = engine.expenditure(actual, "alice").await.unwrap();
    assert_eq!(row.category_id, bills);
    assert_eq!(row.ledger_id, ledger_id);
}

#[tokio::test]
async fn deleting_an_expected_line_unlinks_its_actuals() {
    let (engine, _db) = engine_with_db().await;
    let (_ledger_id, category_id) = ledger_with_category(&engine).await;

    let rent = engine
        .new_expenditure(
            NewExpenditure {
                name: "Rent".to_string(),
                value: money("1000"),
                category_id,
                date: None,
                is_expected: true,
                expected_expenditure_id: None,
            },
            "alice",
        )
        .await
        .unwrap();
    let actual = engine
        .new_expenditure(
            NewExpenditure {
                name: "Rent payment".to_string(),
                value: money("1000"),
                category_id,
                date: None,
                is_expected: false,
                expected_expenditure_id: Some(rent),
            },
            "alice",
        )
        .await
        .unwrap();

    engine.delete_expenditure(rent, "alice").await.unwrap();

    let row = engine.expenditure(actual, "alice").await.unwrap();
    assert_eq!(row.expected_expenditure_id, None);

    let prospect = engine.expenditure_prospect(actual, "alice").await.unwrap();
    assert_eq!(prospect.expected, None);
}

#[tokio::test]
async fn list_honours_every_filter() {
    let (engine, _db) = engine_with_db().await;
    let (ledger_id, category_id) = ledger_with_category(&engine).await;

    let march = Utc.with_ymd_and_hms(2023, 3, 10, 12, 0, 0).unwrap();
    let april = Utc.with_ymd_and_hms(2023, 4, 10, 12, 0, 0).unwrap();
    for (name, value, date, is_expected) in [
        ("Rent", "1000", march, true),
        ("Groceries", "84.20", march, false),
        ("Groceries again", "60", april, false),
    ] {
        engine
            .new_expenditure(
                NewExpenditure {
                    name: name.to_string(),
                    value: money(value),
                    category_id,
                    date: Some(date),
                    is_expected,
                    expected_expenditure_id: None,
                },
                "alice",
            )
            .await
            .unwrap();
    }

    let by_name = engine
        .list_expenditures(
            &ledger_id,
            &ExpenditureListFilter {
                name_query: Some("Groceries".to_string()),
                ..Default::default()
            },
            "alice",
        )
        .await
        .unwrap();
    assert_eq!(by_name.len(), 2);
    // Newest first.
    assert_eq!(by_name[0].name, "Groceries again");

    let expected_only = engine
        .list_expenditures(
            &ledger_id,
            &ExpenditureListFilter {
                kind: ExpenditureKind::Expected,
                ..Default::default()
            },
            "alice",
        )
        .await
        .unwrap();
    assert_eq!(expected_only.len(), 1);
    assert_eq!(expected_only[0].name, "Rent");

    let in_march = engine
        .list_expenditures(
            &ledger_id,
            &ExpenditureListFilter {
                from: Some(Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap()),
                to: Some(Utc.with_ymd_and_hms(2023, 4, 1, 0, 0, 0).unwrap()),
                ..Default::default()
            },
            "alice",
        )
        .await
        .unwrap();
    assert_eq!(in_march.len(), 2);

    let cheap = engine
        .list_expenditures(
            &ledger_id,
            &ExpenditureListFilter {
                min_value: Some(money("50")),
                max_value: Some(money("100")),
                ..Default::default()
            },
            "alice",
        )
        .await
        .unwrap();
    assert_eq!(cheap.len(), 2);
}

#[tokio::test]
async fn list_rejects_inverted_ranges() {
    let (engine, _db) = engine_with_db().await;
    let (ledger_id, _category_id) = ledger_with_category(&engine).await;

    let err = engine
        .list_expenditures(
            &ledger_id,
            &ExpenditureListFilter {
                from: Some(Utc.with_ymd_and_hms(2023, 4, 1, 0, 0, 0).unwrap()),
                to: Some(Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap()),
                ..Default::default()
            },
            "alice",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .list_expenditures(
            &ledger_id,
            &ExpenditureListFilter {
                min_value: Some(money("100")),
                max_value: Some(money("50")),
                ..Default::default()
            },
            "alice",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn copy_previous_month_shifts_expected_lines() {
    let (engine, _db) = engine_with_db().await;
    let (ledger_id, category_id) = ledger_with_category(&engine).await;

    let march_rent = Utc.with_ymd_and_hms(2023, 3, 5, 9, 0, 0).unwrap();
    for (name, value, is_expected) in [("Rent", "1000", true), ("Groceries", "84.20", false)] {
        engine
            .new_expenditure(
                NewExpenditure {
                    name: name.to_string(),
                    value: money(value),
                    category_id,
                    date: Some(march_rent),
                    is_expected,
                    expected_expenditure_id: None,
                },
                "alice",
            )
            .await
            .unwrap();
    }

    let april = MonthWindow::of(chrono_tz::UTC, 4, 2023).unwrap();
    let copied = engine
        .copy_expected_from_previous_month(&ledger_id, &april, "alice")
        .await
        .unwrap();
    assert_eq!(copied, 1);

    let in_april = engine
        .list_expenditures(
            &ledger_id,
            &ExpenditureListFilter {
                from: Some(april.start),
                to: Some(april.end),
                ..Default::default()
            },
            "alice",
        )
        .await
        .unwrap();
    assert_eq!(in_april.len(), 1);
    let copy = &in_april[0];
    assert_eq!(copy.name, "Rent");
    assert_eq!(copy.value, money("1000"));
    assert!(copy.is_expected);
    assert_eq!(copy.expected_expenditure_id, None);
    assert_eq!(copy.date, Utc.with_ymd_and_hms(2023, 4, 5, 9, 0, 0).unwrap());
}

#[tokio::test]
async fn copy_previous_month_clamps_end_of_month_dates() {
    let (engine, _db) = engine_with_db().await;
    let (ledger_id, category_id) = ledger_with_category(&engine).await;

    engine
        .new_expenditure(
            NewExpenditure {
                name: "Rent".to_string(),
                value: money("1000"),
                category_id,
                date: Some(Utc.with_ymd_and_hms(2023, 1, 31, 10, 0, 0).unwrap()),
                is_expected: true,
                expected_expenditure_id: None,
            },
            "alice",
        )
        .await
        .unwrap();

    let february = MonthWindow::of(chrono_tz::UTC, 2, 2023).unwrap();
    let copied = engine
        .copy_expected_from_previous_month(&ledger_id, &february, "alice")
        .await
        .unwrap();
    assert_eq!(copied, 1);

    let in_february = engine
        .list_expenditures(
            &ledger_id,
            &ExpenditureListFilter {
                from: Some(february.start),
                to: Some(february.end),
                ..Default::default()
            },
            "alice",
        )
        .await
        .unwrap();
    assert_eq!(in_february.len(), 1);
    // Jan 31 has no Feb counterpart; the date clamps to Feb 28.
    assert_eq!(
        in_february[0].date,
        Utc.with_ymd_and_hms(2023, 2, 28, 10, 0, 0).unwrap()
    );
    assert!(february.contains(in_february[0].date));
}

#[tokio::test]
async fn ledgers_are_listed_per_member_sorted_by_name() {
    let (engine, _db) = engine_with_db().await;

    let casa = engine.new_ledger("Casa", "alice").await.unwrap();
    engine.new_ledger("Auto", "alice").await.unwrap();
    engine.new_ledger("Barca", "bob").await.unwrap();
    engine.add_ledger_member(&casa, "bob", "alice").await.unwrap();

    let for_alice = engine.ledgers_for_user("alice").await.unwrap();
    let names: Vec<&str> = for_alice.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, ["Auto", "Casa"]);

    let for_bob = engine.ledgers_for_user("bob").await.unwrap();
    let names: Vec<&str> = for_bob.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, ["Barca", "Casa"]);
}

#[tokio::test]
async fn non_members_cannot_see_a_ledger() {
    let (engine, _db) = engine_with_db().await;
    let (ledger_id, category_id) = ledger_with_category(&engine).await;

    let err = engine
        .list_expenditures(&ledger_id, &ExpenditureListFilter::default(), "bob")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("ledger not exists".to_string())
    );

    let err = engine.category(category_id, "bob").await.unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("category not exists".to_string())
    );

    engine
        .add_ledger_member(&ledger_id, "bob", "alice")
        .await
        .unwrap();
    engine
        .list_expenditures(&ledger_id, &ExpenditureListFilter::default(), "bob")
        .await
        .unwrap();
}
