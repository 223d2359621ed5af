//! EventRepository - events, attendees and the history views derived from them

use super::{
    EventReader, EventWriter, HistoryReader, LocationReader, NewEvent, PoolType, StoreError,
};
use crate::entities::{Event, EventSnapshot, EventType, GeoPoint, HistoryEntry, Invitation};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use std::collections::HashSet;
use tracing::debug;

const EVENT_COLUMNS: &str = r#"
    SELECT
        e.event_id,
        e.title,
        e.description,
        e.host_id,
        e.latitude,
        e.longitude,
        e.starts_at,
        e.ends_at,
        e.is_public,
        e.event_type,
        e.max_participants,
        e.auto_matching_enabled,
        e.interest_tags,
        e.created_at
    FROM events e
"#;

#[derive(sqlx::FromRow)]
struct EventRow {
    event_id: i32,
    title: String,
    description: String,
    host_id: i32,
    latitude: f64,
    longitude: f64,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    is_public: bool,
    event_type: EventType,
    max_participants: i32,
    auto_matching_enabled: bool,
    interest_tags: Json<Vec<String>>,
    created_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            event_id: row.event_id,
            title: row.title,
            description: row.description,
            host_id: row.host_id,
            location: GeoPoint {
                latitude: row.latitude,
                longitude: row.longitude,
            },
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            is_public: row.is_public,
            event_type: row.event_type,
            max_participants: row.max_participants,
            auto_matching_enabled: row.auto_matching_enabled,
            interest_tags: row.interest_tags.0,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    event_type: EventType,
    starts_at: DateTime<Utc>,
    latitude: f64,
    longitude: f64,
}

pub struct EventRepository {
    connection_pool: PoolType,
}

impl EventRepository {
    pub fn new(connection_pool: PoolType) -> Self {
        Self { connection_pool }
    }

    async fn attendees_of(&self, event_id: i32) -> Result<HashSet<i32>, StoreError> {
        let rows: Vec<(i32,)> =
            sqlx::query_as("SELECT user_id FROM event_attendees WHERE event_id = ?")
                .bind(event_id)
                .fetch_all(&self.connection_pool)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn invitations_of(&self, event_id: i32) -> Result<Vec<Invitation>, StoreError> {
        let rows = sqlx::query_as::<_, Invitation>(
            r#"
            SELECT event_id, user_id, is_auto_matched, created_at
            FROM event_invitations
            WHERE event_id = ?
            ORDER BY invitation_seq ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.connection_pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl EventReader for EventRepository {
    async fn read_event(&self, event_id: i32) -> Result<Option<EventSnapshot>, StoreError> {
        let row =
            sqlx::query_as::<_, EventRow>(&format!("{EVENT_COLUMNS} WHERE e.event_id = ?"))
                .bind(event_id)
                .fetch_optional(&self.connection_pool)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let (attendees, invitations) =
            futures::future::try_join(self.attendees_of(event_id), self.invitations_of(event_id))
                .await?;

        Ok(Some(EventSnapshot {
            event: row.into(),
            attendees,
            invitations,
        }))
    }

    async fn list_visible(
        &self,
        viewer_id: i32,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Event>, StoreError> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            r#"{EVENT_COLUMNS}
            WHERE e.is_public = TRUE
              AND e.starts_at > ?
              AND NOT EXISTS (
                  SELECT 1 FROM event_declines d
                  WHERE d.event_id = e.event_id AND d.user_id = ?
              )
            ORDER BY e.starts_at ASC, e.event_id ASC
            LIMIT ?"#
        ))
        .bind(now)
        .bind(viewer_id)
        .bind(limit as i64)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(rows.into_iter().map(Event::from).collect())
    }
}

#[async_trait]
impl EventWriter for EventRepository {
    async fn create_event(&self, data: &NewEvent) -> Result<EventSnapshot, StoreError> {
        let now = Utc::now();
        let mut tx = self.connection_pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO events (
                title, description, host_id, latitude, longitude, starts_at, ends_at,
                is_public, event_type, max_participants, auto_matching_enabled,
                interest_tags, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.host_id)
        .bind(data.location.latitude)
        .bind(data.location.longitude)
        .bind(data.starts_at)
        .bind(data.ends_at)
        .bind(data.is_public)
        .bind(data.event_type)
        .bind(data.max_participants)
        .bind(data.auto_matching_enabled)
        .bind(Json(&data.interest_tags))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let event_id = i32::try_from(result.last_insert_id())
            .map_err(|_| StoreError::Malformed("event id out of range".to_string()))?;

        sqlx::query("INSERT INTO event_attendees (event_id, user_id, joined_at) VALUES (?, ?, ?)")
            .bind(event_id)
            .bind(data.host_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let mut invitations = Vec::new();
        for &user_id in &data.direct_invitees {
            if user_id == data.host_id {
                continue;
            }
            let exists: Option<(i32,)> =
                sqlx::query_as("SELECT user_id FROM users WHERE user_id = ?")
                    .bind(user_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if exists.is_none() {
                debug!("Skipping unknown direct invitee {}", user_id);
                continue;
            }
            let inserted = sqlx::query(
                r#"
                INSERT IGNORE INTO event_invitations (event_id, user_id, is_auto_matched, created_at)
                VALUES (?, ?, FALSE, ?)
                "#,
            )
            .bind(event_id)
            .bind(user_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            if inserted.rows_affected() == 1 {
                invitations.push(Invitation {
                    event_id,
                    user_id,
                    is_auto_matched: false,
                    created_at: now,
                });
            }
        }

        tx.commit().await?;

        Ok(EventSnapshot {
            event: Event {
                event_id,
                title: data.title.clone(),
                description: data.description.clone(),
                host_id: data.host_id,
                location: data.location,
                starts_at: data.starts_at,
                ends_at: data.ends_at,
                is_public: data.is_public,
                event_type: data.event_type,
                max_participants: data.max_participants,
                auto_matching_enabled: data.auto_matching_enabled,
                interest_tags: data.interest_tags.clone(),
                created_at: now,
            },
            attendees: HashSet::from([data.host_id]),
            invitations,
        })
    }
}

#[async_trait]
impl LocationReader for EventRepository {
    async fn last_known_location(&self, user_id: i32) -> Result<Option<GeoPoint>, StoreError> {
        let hosted: Option<(f64, f64)> = sqlx::query_as(
            r#"
            SELECT latitude, longitude FROM events
            WHERE host_id = ?
            ORDER BY starts_at DESC, event_id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.connection_pool)
        .await?;

        let point = match hosted {
            Some(point) => Some(point),
            None => {
                sqlx::query_as(
                    r#"
                    SELECT e.latitude, e.longitude FROM events e
                    JOIN event_attendees a ON a.event_id = e.event_id
                    WHERE a.user_id = ?
                    ORDER BY e.starts_at DESC, e.event_id DESC
                    LIMIT 1
                    "#,
                )
                .bind(user_id)
                .fetch_optional(&self.connection_pool)
                .await?
            }
        };

        Ok(point.map(|(latitude, longitude)| GeoPoint {
            latitude,
            longitude,
        }))
    }
}

#[async_trait]
impl HistoryReader for EventRepository {
    async fn history(
        &self,
        user_id: i32,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT e.event_type, e.starts_at, e.latitude, e.longitude
            FROM events e
            WHERE e.host_id = ?
               OR e.event_id IN (SELECT a.event_id FROM event_attendees a WHERE a.user_id = ?)
            ORDER BY
                e.starts_at > ? ASC,
                CASE WHEN e.starts_at <= ? THEN e.starts_at END DESC,
                e.starts_at ASC,
                e.event_id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .bind(limit as i64)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| HistoryEntry {
                event_type: row.event_type,
                starts_at: row.starts_at,
                location: GeoPoint {
                    latitude: row.latitude,
                    longitude: row.longitude,
                },
            })
            .collect())
    }
}
