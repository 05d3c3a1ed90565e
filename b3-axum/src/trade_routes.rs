//! REST API endpoints for trade statistics.

use aide::axum::{ApiRouter, routing::get_with};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use b3_core::{
    models::{AggregatedData, AggregationWindow},
    ports::TradeRepository as _,
};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{Level, event};

use crate::ApiApplication;

/// Creates a router with trade-related endpoints.
pub fn router<T: ApiApplication>() -> ApiRouter<T> {
    ApiRouter::new().api_route(
        "/aggregated",
        get_with(aggregated::<T>, |op| op.tag("trades")),
    )
}

/// Query parameters for the aggregation endpoint
#[derive(Deserialize, JsonSchema)]
pub(crate) struct AggregatedQuery {
    /// The instrument to aggregate, e.g. `PETR4`
    ticker: Option<String>,
    /// First day of the window (`YYYY-MM-DD`). Defaults to the start of the
    /// last seven business days, ending yesterday.
    data_inicio: Option<String>,
}

/// Aggregate the trades of an instrument.
///
/// Computes the highest negotiated price, and the largest total quantity
/// traded on a single day, across every trade in the window. An explicit
/// `data_inicio` opens the window up to the latest trade; the default window
/// stops before today.
///
/// # Returns
///
/// - `200 OK`: The statistics
/// - `400 Bad Request`: `ticker` is missing or `data_inicio` is not a date
/// - `404 Not Found`: No trades for the instrument within the window
/// - `500 Internal Server Error`: Database query failed
pub(crate) async fn aggregated<T: ApiApplication>(
    State(app): State<T>,
    Query(query): Query<AggregatedQuery>,
) -> Result<Json<AggregatedData>, (StatusCode, String)> {
    let ticker = query
        .ticker
        .as_deref()
        .map(str::trim)
        .filter(|ticker| !ticker.is_empty())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                "the 'ticker' parameter is required".to_string(),
            )
        })?;

    let window = AggregationWindow::resolve(query.data_inicio.as_deref(), app.today())
        .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?;

    match app.database().aggregate(ticker, window).await {
        Ok(Some(data)) => Ok(Json(data)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            format!("no trades found for {ticker} since {}", window.start),
        )),
        Err(err) => {
            event!(Level::ERROR, err = err.to_string(), ticker, "aggregation failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to aggregate trades".to_string(),
            ))
        }
    }
}
