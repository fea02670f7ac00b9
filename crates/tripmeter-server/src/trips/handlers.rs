use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use tripmeter_core::error::TripmeterError;

use super::store::{NewTrip, Trip};
use crate::app_state::AppState;
use crate::error::ApiError;

pub async fn create_trip(
    State(state): State<AppState>,
    Json(body): Json<NewTrip>,
) -> Result<(StatusCode, Json<Trip>), ApiError> {
    let trip = state.trips().create(body).await?;
    tracing::debug!(id = trip.id, "trip created");
    Ok((StatusCode::CREATED, Json(trip)))
}

pub async fn list_trips(State(state): State<AppState>) -> Result<Json<Vec<Trip>>, ApiError> {
    Ok(Json(state.trips().list().await?))
}

pub async fn get_trip(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Trip>, ApiError> {
    let id: u64 = id
        .parse()
        .map_err(|_| TripmeterError::BadRequest(format!("invalid trip id: {id}")))?;
    state
        .trips()
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| TripmeterError::NotFound(format!("trip {id}")).into())
}
