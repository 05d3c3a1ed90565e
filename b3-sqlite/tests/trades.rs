use b3_core::{
    models::{AggregationWindow, TradeRecord},
    ports::TradeRepository,
};
use b3_sqlite::{Db, config::SqliteConfig};
use rust_decimal::Decimal;
use std::str::FromStr as _;
use time::{Date, macros::date};

fn trade(code: &str, price: &str, quantity: u64, trade_date: Date) -> TradeRecord {
    TradeRecord {
        trade_date,
        instrument_code: code.to_owned(),
        negotiated_price: Decimal::from_str(price).unwrap(),
        negotiated_quantity: quantity,
        closing_time: "103000123".to_owned(),
    }
}

async fn count(db: &Db) -> anyhow::Result<i64> {
    Ok(sqlx::query_scalar("select count(*) from trade")
        .fetch_one(&db.reader)
        .await?)
}

#[tokio::test]
async fn aggregates_max_price_and_busiest_day() -> anyhow::Result<()> {
    let db = Db::open(&SqliteConfig::default()).await?;

    db.save_batch(vec![
        trade("PETR4", "19.50", 100, date!(2024 - 05 - 02)),
        trade("PETR4", "20.00", 200, date!(2024 - 05 - 02)),
        trade("PETR4", "19.75", 250, date!(2024 - 05 - 03)),
        trade("VALE3", "61.20", 10_000, date!(2024 - 05 - 03)),
    ])
    .await?;

    let data = db
        .aggregate("PETR4", AggregationWindow::starting(date!(2024 - 05 - 01)))
        .await?
        .unwrap();
    assert_eq!(data.instrument_code, "PETR4");
    assert_eq!(data.max_range_value, Decimal::from_str("20.00")?);
    assert_eq!(data.max_daily_volume, 300);

    // only the later day falls inside the window
    let data = db
        .aggregate("PETR4", AggregationWindow::starting(date!(2024 - 05 - 03)))
        .await?
        .unwrap();
    assert_eq!(data.max_range_value, Decimal::from_str("19.75")?);
    assert_eq!(data.max_daily_volume, 250);

    Ok(())
}

#[tokio::test]
async fn nothing_to_aggregate_is_none() -> anyhow::Result<()> {
    let db = Db::open(&SqliteConfig::default()).await?;
    db.save_batch(vec![trade("PETR4", "19.50", 100, date!(2024 - 05 - 02))])
        .await?;

    assert!(
        db.aggregate("XXXX3", AggregationWindow::starting(date!(2024 - 05 - 01)))
            .await?
            .is_none()
    );
    assert!(
        db.aggregate("PETR4", AggregationWindow::starting(date!(2024 - 05 - 03)))
            .await?
            .is_none()
    );
    Ok(())
}

#[tokio::test]
async fn a_rejected_batch_leaves_no_rows() -> anyhow::Result<()> {
    let db = Db::open(&SqliteConfig::default()).await?;
    db.save_batch(vec![trade("PETR4", "19.50", 100, date!(2024 - 05 - 02))])
        .await?;

    // the last row violates the instrument code constraint
    let result = db
        .save_batch(vec![
            trade("PETR4", "30.00", 500, date!(2024 - 05 - 02)),
            trade("PETR4", "31.00", 500, date!(2024 - 05 - 02)),
            trade("", "1.00", 1, date!(2024 - 05 - 02)),
        ])
        .await;
    assert!(result.is_err());

    assert_eq!(count(&db).await?, 1);
    let data = db
        .aggregate("PETR4", AggregationWindow::starting(date!(2024 - 05 - 01)))
        .await?
        .unwrap();
    assert_eq!(data.max_range_value, Decimal::from_str("19.50")?);
    assert_eq!(data.max_daily_volume, 100);
    Ok(())
}

#[tokio::test]
async fn an_unrepresentable_price_fails_the_whole_batch() -> anyhow::Result<()> {
    let db = Db::open(&SqliteConfig::default()).await?;

    let result = db
        .save_batch(vec![
            trade("PETR4", "19.50", 100, date!(2024 - 05 - 02)),
            trade("PETR4", "0.000000001", 100, date!(2024 - 05 - 02)),
        ])
        .await;
    assert!(matches!(result, Err(sqlx::Error::Encode(_))));
    assert_eq!(count(&db).await?, 0);
    Ok(())
}

#[tokio::test]
async fn large_batches_span_several_statements() -> anyhow::Result<()> {
    let db = Db::open(&SqliteConfig::default()).await?;

    let batch = (0..2_500)
        .map(|i| trade("PETR4", "10.01", i, date!(2024 - 05 - 02)))
        .collect();
    db.save_batch(batch).await?;
    db.save_batch(Vec::new()).await?;

    assert_eq!(count(&db).await?, 2_500);
    let data = db
        .aggregate("PETR4", AggregationWindow::starting(date!(2024 - 05 - 02)))
        .await?
        .unwrap();
    assert_eq!(data.max_daily_volume, (0..2_500).sum::<u64>());
    Ok(())
}

#[tokio::test]
async fn trades_survive_reopening_a_file_database() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = SqliteConfig {
        database_path: Some(dir.path().join("trades.db")),
        create_if_missing: true,
    };

    {
        let db = Db::open(&config).await?;
        db.save_batch(vec![trade("PETR4", "19.50", 100, date!(2024 - 05 - 02))])
            .await?;
        db.writer.close().await;
        db.reader.close().await;
    }

    let db = Db::open(&config).await?;
    let data = db
        .aggregate("PETR4", AggregationWindow::starting(date!(2024 - 05 - 01)))
        .await?
        .unwrap();
    assert_eq!(data.max_daily_volume, 100);
    Ok(())
}

#[tokio::test]
async fn a_bounded_window_leaves_out_its_end_date() -> anyhow::Result<()> {
    let db = Db::open(&SqliteConfig::default()).await?;
    db.save_batch(vec![
        trade("PETR4", "19.50", 100, date!(2024 - 05 - 07)),
        trade("PETR4", "25.00", 900, date!(2024 - 05 - 08)),
    ])
    .await?;

    let bounded = AggregationWindow {
        start: date!(2024 - 05 - 01),
        end: Some(date!(2024 - 05 - 08)),
    };
    let data = db.aggregate("PETR4", bounded).await?.unwrap();
    assert_eq!(data.max_range_value, Decimal::from_str("19.50")?);
    assert_eq!(data.max_daily_volume, 100);

    let only_the_end = AggregationWindow {
        start: date!(2024 - 05 - 08),
        end: Some(date!(2024 - 05 - 08)),
    };
    assert!(db.aggregate("PETR4", only_the_end).await?.is_none());
    Ok(())
}
