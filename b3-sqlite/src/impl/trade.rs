use crate::{Db, types::PriceUnits};
use b3_core::{
    models::{AggregatedData, AggregationWindow, TradeRecord},
    ports::TradeRepository,
};
use tracing::{Level, event};

// Five binds per row keeps each statement well under SQLite's parameter limit.
const ROWS_PER_STATEMENT: usize = 1000;

impl TradeRepository for Db {
    async fn save_batch(&self, batch: Vec<TradeRecord>) -> Result<(), Self::Error> {
        if batch.is_empty() {
            return Ok(());
        }

        // Convert everything up front so a bad value fails before the transaction starts
        let rows = batch
            .into_iter()
            .map(|record| {
                let price = PriceUnits::try_from(record.negotiated_price)
                    .map_err(|err| sqlx::Error::Encode(Box::new(err)))?;
                let quantity = i64::try_from(record.negotiated_quantity)
                    .map_err(|err| sqlx::Error::Encode(Box::new(err)))?;
                Ok((record, price, quantity))
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        let expected = rows.len() as u64;

        // dropping the transaction without committing rolls it back
        let mut tx = self.writer.begin().await?;
        let mut inserted = 0;

        for chunk in rows.chunks(ROWS_PER_STATEMENT) {
            let mut query_builder = sqlx::QueryBuilder::new(
                "insert into trade (trade_date, instrument_code, price_units, negotiated_quantity, closing_time) ",
            );
            query_builder.push_values(chunk, |mut b, (record, price, quantity)| {
                b.push_bind(record.trade_date)
                    .push_bind(record.instrument_code.as_str())
                    .push_bind(*price)
                    .push_bind(*quantity)
                    .push_bind(record.closing_time.as_str());
            });
            inserted += query_builder
                .build()
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        if inserted != expected {
            return Err(sqlx::Error::Protocol(format!(
                "inserted {inserted} rows, expected {expected}"
            )));
        }

        tx.commit().await?;
        event!(Level::TRACE, rows = inserted, "batch committed");
        Ok(())
    }

    async fn aggregate(
        &self,
        instrument_code: &str,
        window: AggregationWindow,
    ) -> Result<Option<AggregatedData>, Self::Error> {
        let (days, max_price, max_volume) = sqlx::query_as::<_, (i64, Option<PriceUnits>, Option<i64>)>(
            r#"
            with daily as (
                select
                    max(price_units) as max_price,
                    sum(negotiated_quantity) as volume
                from
                    trade
                where
                    instrument_code = $1
                and
                    trade_date >= $2
                and
                    ($3 is null or trade_date < $3)
                group by
                    trade_date
            )
            select
                count(*),
                max(max_price),
                max(volume)
            from
                daily
            "#,
        )
        .bind(instrument_code)
        .bind(window.start)
        .bind(window.end)
        .fetch_one(&self.reader)
        .await?;

        let (Some(max_price), Some(max_volume)) = (max_price, max_volume) else {
            return Ok(None);
        };
        let max_daily_volume =
            u64::try_from(max_volume).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        event!(
            Level::DEBUG,
            instrument_code,
            start = %window.start,
            end = ?window.end,
            days,
            "aggregated trades"
        );

        Ok(Some(AggregatedData {
            instrument_code: instrument_code.to_owned(),
            max_range_value: max_price.into(),
            max_daily_volume,
        }))
    }
}
