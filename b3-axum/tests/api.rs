use axum::http::StatusCode;
use axum_test::TestServer;
use b3_axum::router;
use b3_core::{
    models::TradeRecord,
    ports::{Application, TradeRepository as _},
};
use b3_sqlite::{Db, config::SqliteConfig};
use rstest::rstest;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::str::FromStr as _;
use time::{Date, macros::date};

/// An application whose calendar is pinned to a fixed date.
#[derive(Clone)]
struct TestApp {
    db: Db,
    today: Date,
}

impl Application for TestApp {
    type Repository = Db;

    fn database(&self) -> &Self::Repository {
        &self.db
    }

    fn today(&self) -> Date {
        self.today
    }
}

fn trade(code: &str, price: &str, quantity: u64, trade_date: Date) -> TradeRecord {
    TradeRecord {
        trade_date,
        instrument_code: code.to_owned(),
        negotiated_price: Decimal::from_str(price).unwrap(),
        negotiated_quantity: quantity,
        closing_time: "103000123".to_owned(),
    }
}

/// A server over a database holding a few days of PETR4 trades.
///
/// "Today" is Wednesday 2024-05-08, so the default window starts on Monday 2024-04-29.
async fn server() -> anyhow::Result<TestServer> {
    server_with(Vec::new()).await
}

async fn server_with(extra: Vec<TradeRecord>) -> anyhow::Result<TestServer> {
    let db = Db::open(&SqliteConfig::default()).await?;
    db.save_batch(vec![
        trade("PETR4", "38.10", 1_000, date!(2024 - 04 - 26)),
        trade("PETR4", "37.20", 400, date!(2024 - 04 - 29)),
        trade("PETR4", "37.90", 300, date!(2024 - 04 - 29)),
        trade("PETR4", "36.50", 500, date!(2024 - 05 - 06)),
        trade("VALE3", "61.20", 9_000, date!(2024 - 05 - 06)),
    ])
    .await?;
    db.save_batch(extra).await?;

    let app = TestApp {
        db,
        today: date!(2024 - 05 - 08),
    };
    Ok(TestServer::new(router(app))?)
}

#[tokio::test]
async fn health_reports_ok() -> anyhow::Result<()> {
    let server = server().await?;
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "ok" }));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn aggregates_from_an_explicit_start_date() -> anyhow::Result<()> {
    let server = server().await?;

    let response = server
        .get("/api/v1/trades/aggregated")
        .add_query_param("ticker", "PETR4")
        .add_query_param("data_inicio", "2024-04-26")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["ticker"], "PETR4");
    assert_eq!(body["max_range_value"], "38.1");
    assert_eq!(body["max_daily_volume"], 1_000);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn defaults_to_the_last_seven_business_days() -> anyhow::Result<()> {
    let server = server().await?;

    // 2024-04-26 falls outside the default window
    let response = server
        .get("/api/v1/trades/aggregated")
        .add_query_param("ticker", "PETR4")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["max_range_value"], "37.9");
    assert_eq!(body["max_daily_volume"], 700);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn the_default_window_leaves_out_today() -> anyhow::Result<()> {
    let server = server_with(vec![trade("PETR4", "99.00", 9_999, date!(2024 - 05 - 08))]).await?;

    let response = server
        .get("/api/v1/trades/aggregated")
        .add_query_param("ticker", "PETR4")
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["max_range_value"], "37.9");
    assert_eq!(body["max_daily_volume"], 700);

    // an explicit start date reaches up to the latest trade
    let response = server
        .get("/api/v1/trades/aggregated")
        .add_query_param("ticker", "PETR4")
        .add_query_param("data_inicio", "2024-05-01")
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["max_range_value"], "99");
    assert_eq!(body["max_daily_volume"], 9_999);
    Ok(())
}

#[rstest]
#[case::missing_ticker(&[("data_inicio", "2024-04-26")])]
#[case::blank_ticker(&[("ticker", "  ")])]
#[case::malformed_date(&[("ticker", "PETR4"), ("data_inicio", "26/04/2024")])]
#[case::impossible_date(&[("ticker", "PETR4"), ("data_inicio", "2024-02-30")])]
#[tokio::test]
async fn rejects_bad_parameters(#[case] params: &[(&str, &str)]) -> anyhow::Result<()> {
    let server = server().await?;

    let mut request = server.get("/api/v1/trades/aggregated");
    for (key, value) in params {
        request = request.add_query_param(key, value);
    }

    request.await.assert_status(StatusCode::BAD_REQUEST);
    Ok(())
}

#[rstest]
#[case::unknown_ticker("ITUB4", "2024-04-01")]
#[case::empty_window("PETR4", "2024-05-07")]
#[tokio::test]
async fn reports_missing_data_as_not_found(
    #[case] ticker: &str,
    #[case] start: &str,
) -> anyhow::Result<()> {
    let server = server().await?;

    server
        .get("/api/v1/trades/aggregated")
        .add_query_param("ticker", ticker)
        .add_query_param("data_inicio", start)
        .await
        .assert_status(StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn storage_failures_are_internal_errors() -> anyhow::Result<()> {
    let db = Db::open(&SqliteConfig::default()).await?;
    db.reader.close().await;
    let app = TestApp {
        db,
        today: date!(2024 - 05 - 08),
    };
    let server = TestServer::new(router(app))?;

    server
        .get("/api/v1/trades/aggregated")
        .add_query_param("ticker", "PETR4")
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}

#[tokio::test]
async fn serves_its_openapi_description() -> anyhow::Result<()> {
    let server = server().await?;

    let response = server.get("/docs/api.json").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["paths"]["/api/v1/trades/aggregated"]["get"].is_object());

    server.get("/docs").await.assert_status_ok();
    Ok(())
}
