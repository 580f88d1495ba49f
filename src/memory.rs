//! In-memory stores used by unit and router tests.

use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    auth::{repo::UserStore, repo_types::User},
    db::StoreError,
    trips::{
        repo::TripStore,
        repo_types::{NewTrip, Trip, TripOwner},
    },
};

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == email) {
            return Err(StoreError::Conflict);
        }
        let user = User {
            id: users.len() as i64 + 1,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }
}

#[derive(Default)]
pub struct InMemoryTripStore {
    trips: Mutex<Vec<Trip>>,
    frozen_at: Option<OffsetDateTime>,
}

impl InMemoryTripStore {
    /// Every insert gets the same timestamp.
    pub fn frozen_at(at: OffsetDateTime) -> Self {
        Self {
            trips: Mutex::default(),
            frozen_at: Some(at),
        }
    }
}

#[async_trait]
impl TripStore for InMemoryTripStore {
    async fn insert(&self, trip: NewTrip) -> Result<Trip, StoreError> {
        let mut trips = self.trips.lock().unwrap();
        let stored = Trip {
            id: trips.len() as i64 + 1,
            owner: trip.owner,
            origin: trip.origin,
            destination: trip.destination,
            departure: trip.departure,
            created_at: self.frozen_at.unwrap_or_else(OffsetDateTime::now_utc),
        };
        trips.push(stored.clone());
        Ok(stored)
    }

    async fn latest_for(&self, owner: &TripOwner) -> Result<Option<Trip>, StoreError> {
        let trips = self.trips.lock().unwrap();
        Ok(trips
            .iter()
            .filter(|t| &t.owner == owner)
            .max_by_key(|t| (t.created_at, t.id))
            .cloned())
    }
}

/// Behaves like a database that cannot be reached.
pub struct UnavailableStore;

#[async_trait]
impl UserStore for UnavailableStore {
    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn create(&self, _email: &str, _hash: &str) -> Result<User, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

#[async_trait]
impl TripStore for UnavailableStore {
    async fn insert(&self, _trip: NewTrip) -> Result<Trip, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn latest_for(&self, _owner: &TripOwner) -> Result<Option<Trip>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}
