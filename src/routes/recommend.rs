use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::db::queries;
use crate::error::ApiError;
use crate::models::item::CatalogItem;

const RECOMMENDATION_LIMIT: i64 = 5;

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub temp: f64,
    pub weather: String,
}

#[derive(Serialize)]
pub struct RecommendResponse {
    pub recommendations: Vec<CatalogItem>,
}

/// GET /api/recommend-by-weather?temp=..&weather=..
pub async fn recommend_by_weather(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let types = types_for_weather(query.temp, &query.weather);
    let recommendations =
        queries::list_items_by_types(&state.db, &types, RECOMMENDATION_LIMIT).await?;

    Ok(Json(RecommendResponse { recommendations }))
}

/// Map conditions to a garment-type bucket. Precipitation overrides the
/// temperature bucket.
fn types_for_weather(temp: f64, weather: &str) -> Vec<String> {
    let condition = weather.to_lowercase();

    let set: &[&str] = if condition.contains("rain") {
        &["jacket", "raincoat", "dark-shirt"]
    } else if condition.contains("snow") {
        &["coat", "sweater", "boots"]
    } else if temp < 10.0 {
        &["jacket", "coat", "sweater", "boots", "pants", "hat"]
    } else if temp > 25.0 {
        &["t-shirt", "shorts", "skirt"]
    } else {
        &["t-shirt", "long-pants", "light-jacket"]
    };

    set.iter().map(|s| (*s).to_string()).collect()
}
