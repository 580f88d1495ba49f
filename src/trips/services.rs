use tracing::{info, warn};

use super::{
    dto::{CreateTripRequest, LatestTripQuery},
    repo_types::{NewTrip, Trip, TripOwner},
};
use crate::{auth::services::Identity, error::AppError, state::AppState};

pub const MAX_ANONYMOUS_ID_CHARS: usize = 255;

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Trimmed ids must fit the `anonymous_id` column and carry no NUL bytes.
fn anonymous_owner(id: &str) -> Result<TripOwner, AppError> {
    if id.chars().count() > MAX_ANONYMOUS_ID_CHARS || id.contains('\0') {
        warn!(len = id.len(), "malformed anonymous_id");
        return Err(AppError::BadRequest(format!(
            "anonymous_id must be at most {MAX_ANONYMOUS_ID_CHARS} characters without NUL bytes"
        )));
    }
    Ok(TripOwner::Anonymous(id.to_string()))
}

/// Stores a trip for the caller. Authenticated callers own the trip by email
/// and any `anonymous_id` in the body is ignored.
pub async fn create_trip(
    state: &AppState,
    identity: Identity,
    req: CreateTripRequest,
) -> Result<Trip, AppError> {
    let owner = match identity {
        Identity::Authenticated(user) => TripOwner::User(user.email),
        Identity::Anonymous => match non_blank(req.anonymous_id.as_deref()) {
            Some(id) => anonymous_owner(id)?,
            None => {
                warn!("anonymous trip without anonymous_id");
                return Err(AppError::BadRequest(
                    "anonymous_id required when not logged in".into(),
                ));
            }
        },
    };

    if !req.origin.is_valid() || !req.destination.is_valid() {
        return Err(AppError::BadRequest(
            "coordinates out of range (lat -90..90, lng -180..180)".into(),
        ));
    }
    if !req.departure.is_valid() {
        return Err(AppError::BadRequest(
            "departure must be hour 0-23 and minute 0-59".into(),
        ));
    }

    let trip = state
        .trips
        .insert(NewTrip {
            owner,
            origin: req.origin,
            destination: req.destination,
            departure: req.departure,
        })
        .await?;
    info!(trip_id = trip.id, owner = ?trip.owner, "trip stored");
    Ok(trip)
}

/// Latest trip for the caller, or for an anonymous id when no token is sent.
pub async fn latest_trip(
    state: &AppState,
    identity: Identity,
    query: LatestTripQuery,
) -> Result<Trip, AppError> {
    let owner = match identity {
        Identity::Authenticated(user) => match non_blank(query.email.as_deref()) {
            Some(email) if email != user.email => {
                warn!(requested = %email, actual = %user.email, "trip lookup for another user");
                return Err(AppError::Forbidden(
                    "email must match authenticated user".into(),
                ));
            }
            _ => TripOwner::User(user.email),
        },
        Identity::Anonymous => match non_blank(query.anonymous_id.as_deref()) {
            Some(id) => anonymous_owner(id)?,
            None => {
                return Err(AppError::Unauthorized(
                    "Provide Authorization Bearer or query anonymous_id=".into(),
                ))
            }
        },
    };

    state
        .trips
        .latest_for(&owner)
        .await?
        .ok_or_else(|| AppError::NotFound("No trip found".into()))
}
