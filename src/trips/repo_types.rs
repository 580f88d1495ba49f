use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::db::StoreError;

/// Raw `trips` row. Ownership is two nullable columns here; `Trip` narrows it.
#[derive(Debug, Clone, FromRow)]
pub struct TripRow {
    pub id: i64,
    pub user_email: Option<String>,
    pub anonymous_id: Option<String>,
    pub origin_lat: f64,
    pub origin_lng: f64,
    pub dest_lat: f64,
    pub dest_lng: f64,
    pub departure_hour: i32,
    pub departure_minute: i32,
    pub created_at: OffsetDateTime,
}

/// Whoever a trip belongs to: a registered account or a client-chosen anonymous id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TripOwner {
    User(String),
    Anonymous(String),
}

impl TripOwner {
    pub fn user_email(&self) -> Option<&str> {
        match self {
            TripOwner::User(email) => Some(email),
            TripOwner::Anonymous(_) => None,
        }
    }

    pub fn anonymous_id(&self) -> Option<&str> {
        match self {
            TripOwner::User(_) => None,
            TripOwner::Anonymous(id) => Some(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Departure {
    pub hour: u8,
    pub minute: u8,
}

impl Departure {
    pub fn is_valid(&self) -> bool {
        self.hour <= 23 && self.minute <= 59
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTrip {
    pub owner: TripOwner,
    pub origin: LatLng,
    pub destination: LatLng,
    pub departure: Departure,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub id: i64,
    pub owner: TripOwner,
    pub origin: LatLng,
    pub destination: LatLng,
    pub departure: Departure,
    pub created_at: OffsetDateTime,
}

impl TryFrom<TripRow> for Trip {
    type Error = StoreError;

    fn try_from(r: TripRow) -> Result<Self, Self::Error> {
        let owner = match (r.user_email, r.anonymous_id) {
            (Some(email), None) => TripOwner::User(email),
            (None, Some(id)) => TripOwner::Anonymous(id),
            (Some(_), Some(_)) => {
                return Err(StoreError::Corrupt(format!("trip {} has two owners", r.id)))
            }
            (None, None) => return Err(StoreError::Corrupt(format!("trip {} has no owner", r.id))),
        };
        let departure = Departure {
            hour: u8::try_from(r.departure_hour)
                .map_err(|_| StoreError::Corrupt(format!("trip {} hour out of range", r.id)))?,
            minute: u8::try_from(r.departure_minute)
                .map_err(|_| StoreError::Corrupt(format!("trip {} minute out of range", r.id)))?,
        };
        Ok(Trip {
            id: r.id,
            owner,
            origin: LatLng {
                lat: r.origin_lat,
                lng: r.origin_lng,
            },
            destination: LatLng {
                lat: r.dest_lat,
                lng: r.dest_lng,
            },
            departure,
            created_at: r.created_at,
        })
    }
}
