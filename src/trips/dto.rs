use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::{Departure, LatLng, Trip};

/// Request body for `POST /trip`. `anonymous_id` is only read for anonymous callers.
#[derive(Debug, Deserialize)]
pub struct CreateTripRequest {
    pub origin: LatLng,
    pub destination: LatLng,
    pub departure: Departure,
    #[serde(default)]
    pub anonymous_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LatestTripQuery {
    pub email: Option<String>,
    pub anonymous_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TripOut {
    pub id: i64,
    pub user_email: Option<String>,
    pub anonymous_id: Option<String>,
    pub origin: LatLng,
    pub destination: LatLng,
    pub departure: Departure,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Trip> for TripOut {
    fn from(t: Trip) -> Self {
        Self {
            id: t.id,
            user_email: t.owner.user_email().map(str::to_string),
            anonymous_id: t.owner.anonymous_id().map(str::to_string),
            origin: t.origin,
            destination: t.destination,
            departure: t.departure,
            created_at: t.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trips::repo_types::TripOwner;

    #[test]
    fn trip_out_shape() {
        let trip = Trip {
            id: 3,
            owner: TripOwner::Anonymous("abc".into()),
            origin: LatLng { lat: 1.5, lng: 2.5 },
            destination: LatLng { lat: 3.5, lng: 4.5 },
            departure: Departure { hour: 7, minute: 45 },
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_value(TripOut::from(trip)).unwrap();
        assert_eq!(json["id"], 3);
        assert!(json["user_email"].is_null());
        assert_eq!(json["anonymous_id"], "abc");
        assert_eq!(json["origin"]["lat"], 1.5);
        assert_eq!(json["destination"]["lng"], 4.5);
        assert_eq!(json["departure"]["hour"], 7);
        assert_eq!(json["departure"]["minute"], 45);
        assert_eq!(json["created_at"], "1970-01-01T00:00:00Z");
    }

    #[test]
    fn anonymous_id_is_optional_in_request() {
        let req: CreateTripRequest = serde_json::from_str(
            r#"{"origin":{"lat":1,"lng":2},"destination":{"lat":3,"lng":4},"departure":{"hour":9,"minute":0}}"#,
        )
        .unwrap();
        assert!(req.anonymous_id.is_none());
    }
}
