use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{CreateTripRequest, LatestTripQuery, TripOut},
    services,
};
use crate::{auth::extractors::MaybeUser, error::AppError, state::AppState};

pub fn trip_routes() -> Router<AppState> {
    Router::new().route("/trip", get(get_latest_trip).post(create_trip))
}

#[instrument(skip(state, identity, payload))]
pub async fn create_trip(
    State(state): State<AppState>,
    MaybeUser(identity): MaybeUser,
    payload: Result<Json<CreateTripRequest>, JsonRejection>,
) -> Result<Json<TripOut>, AppError> {
    let Json(payload) = payload?;
    let trip = services::create_trip(&state, identity, payload).await?;
    Ok(Json(trip.into()))
}

#[instrument(skip(state, identity, query))]
pub async fn get_latest_trip(
    State(state): State<AppState>,
    MaybeUser(identity): MaybeUser,
    query: Result<Query<LatestTripQuery>, QueryRejection>,
) -> Result<Json<TripOut>, AppError> {
    let Query(query) = query?;
    let trip = services::latest_trip(&state, identity, query).await?;
    Ok(Json(trip.into()))
}
