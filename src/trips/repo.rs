use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{NewTrip, Trip, TripOwner, TripRow};
use crate::db::StoreError;

/// Persistence for trips. Trips are append-only.
#[async_trait]
pub trait TripStore: Send + Sync {
    async fn insert(&self, trip: NewTrip) -> Result<Trip, StoreError>;

    /// Most recent trip for `owner`: highest `created_at`, ties broken by highest id.
    async fn latest_for(&self, owner: &TripOwner) -> Result<Option<Trip>, StoreError>;
}

#[derive(Clone)]
pub struct PgTripStore {
    db: PgPool,
}

impl PgTripStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const TRIP_COLUMNS: &str = "id, user_email, anonymous_id, origin_lat, origin_lng, \
     dest_lat, dest_lng, departure_hour, departure_minute, created_at";

#[async_trait]
impl TripStore for PgTripStore {
    async fn insert(&self, trip: NewTrip) -> Result<Trip, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO trips (user_email, anonymous_id, origin_lat, origin_lng,
                               dest_lat, dest_lng, departure_hour, departure_minute)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TRIP_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, TripRow>(&sql)
            .bind(trip.owner.user_email())
            .bind(trip.owner.anonymous_id())
            .bind(trip.origin.lat)
            .bind(trip.origin.lng)
            .bind(trip.destination.lat)
            .bind(trip.destination.lng)
            .bind(i32::from(trip.departure.hour))
            .bind(i32::from(trip.departure.minute))
            .fetch_one(&self.db)
            .await?;
        Trip::try_from(row)
    }

    async fn latest_for(&self, owner: &TripOwner) -> Result<Option<Trip>, StoreError> {
        let (column, key) = match owner {
            TripOwner::User(email) => ("user_email", email),
            TripOwner::Anonymous(id) => ("anonymous_id", id),
        };
        let sql = format!(
            r#"
            SELECT {TRIP_COLUMNS}
            FROM trips
            WHERE {column} = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#
        );
        let row = sqlx::query_as::<_, TripRow>(&sql)
            .bind(key)
            .fetch_optional(&self.db)
            .await?;
        row.map(Trip::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{test_pool, unique_suffix},
        trips::repo_types::{Departure, LatLng},
    };
    use time::OffsetDateTime;

    fn new_trip(owner: TripOwner, hour: u8) -> NewTrip {
        NewTrip {
            owner,
            origin: LatLng { lat: 40.7128, lng: -74.006 },
            destination: LatLng { lat: 34.0522, lng: -118.2437 },
            departure: Departure { hour, minute: 30 },
        }
    }

    #[tokio::test]
    #[ignore = "needs a disposable Postgres in DATABASE_URL"]
    async fn insert_and_fetch_latest_by_owner() {
        let store = PgTripStore::new(test_pool().await);
        let suffix = unique_suffix();
        let email = TripOwner::User(format!("pg-{suffix}@example.com"));
        let anon = TripOwner::Anonymous(format!("anon-{suffix}"));

        assert_eq!(store.latest_for(&anon).await.unwrap(), None);

        let first = store.insert(new_trip(anon.clone(), 6)).await.unwrap();
        store.insert(new_trip(email.clone(), 7)).await.unwrap();
        let last = store.insert(new_trip(anon.clone(), 9)).await.unwrap();
        assert_eq!(first.owner, anon);
        assert!(last.id > first.id);

        assert_eq!(store.latest_for(&anon).await.unwrap(), Some(last));
        assert_eq!(store.latest_for(&email).await.unwrap().unwrap().departure.hour, 7);
    }

    #[tokio::test]
    #[ignore = "needs a disposable Postgres in DATABASE_URL"]
    async fn equal_timestamps_break_on_highest_id() {
        let pool = test_pool().await;
        let store = PgTripStore::new(pool.clone());
        let id = format!("tie-{}", unique_suffix());
        let created_at = OffsetDateTime::now_utc();

        for hour in [6, 7] {
            sqlx::query(
                r#"
                INSERT INTO trips (anonymous_id, origin_lat, origin_lng, dest_lat, dest_lng,
                                   departure_hour, departure_minute, created_at)
                VALUES ($1, 0, 0, 0, 0, $2, 0, $3)
                "#,
            )
            .bind(&id)
            .bind(hour)
            .bind(created_at)
            .execute(&pool)
            .await
            .unwrap();
        }

        let latest = store
            .latest_for(&TripOwner::Anonymous(id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.departure.hour, 7);
    }

    #[tokio::test]
    #[ignore = "needs a disposable Postgres in DATABASE_URL"]
    async fn schema_rejects_rows_without_single_owner() {
        let pool = test_pool().await;
        let err = sqlx::query(
            r#"
            INSERT INTO trips (user_email, anonymous_id, origin_lat, origin_lng, dest_lat,
                               dest_lng, departure_hour, departure_minute)
            VALUES ('both@example.com', 'both', 0, 0, 0, 0, 1, 0)
            "#,
        )
        .execute(&pool)
        .await
        .unwrap_err();
        assert!(matches!(StoreError::from(err), StoreError::Query(_)));
    }
}
