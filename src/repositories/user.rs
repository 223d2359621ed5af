//! UserRepository - users joined with their profile side-table

use super::{PoolType, StoreError, UserReader};
use crate::entities::{DEFAULT_PREFERRED_RADIUS_KM, SkillLevel, User, UserProfile};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

const USER_COLUMNS: &str = r#"
    SELECT
        u.user_id,
        u.username,
        p.institution,
        p.program,
        p.enrollment_year,
        p.bio,
        p.interests,
        p.skills,
        p.auto_invite_enabled,
        p.preferred_radius_km
    FROM users u
    LEFT JOIN user_profiles p ON p.user_id = u.user_id
"#;

// profile columns are nullable because of the LEFT JOIN; the JSON ones are
// decoded loosely so one malformed profile cannot fail a whole batch
#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: i32,
    username: String,
    institution: Option<String>,
    program: Option<String>,
    enrollment_year: Option<String>,
    bio: Option<String>,
    interests: Option<Json<Value>>,
    skills: Option<Json<Value>>,
    auto_invite_enabled: Option<bool>,
    preferred_radius_km: Option<f64>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let user_id = row.user_id;
        Self {
            user_id,
            username: row.username,
            profile: UserProfile {
                institution: row.institution.unwrap_or_default(),
                program: row.program.unwrap_or_default(),
                enrollment_year: row.enrollment_year.unwrap_or_default(),
                bio: row.bio.unwrap_or_default(),
                interests: row
                    .interests
                    .map(|j| interests_from_json(user_id, j.0))
                    .unwrap_or_default(),
                skills: row
                    .skills
                    .map(|j| skills_from_json(user_id, j.0))
                    .unwrap_or_default(),
                auto_invite_enabled: row.auto_invite_enabled.unwrap_or(false),
                preferred_radius_km: row
                    .preferred_radius_km
                    .unwrap_or(DEFAULT_PREFERRED_RADIUS_KM),
            },
        }
    }
}

/// Keeps the string entries of a stored interest array
fn interests_from_json(user_id: i32, value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(interest) => Some(interest),
                other => {
                    warn!("Dropping non-string interest {} of user {}", other, user_id);
                    None
                }
            })
            .collect(),
        Value::Null => Vec::new(),
        other => {
            warn!("Interests of user {} are not an array: {}", user_id, other);
            Vec::new()
        }
    }
}

/// Keeps the skills of a stored object whose level is recognised
fn skills_from_json(user_id: i32, value: Value) -> BTreeMap<String, SkillLevel> {
    match value {
        Value::Object(entries) => entries
            .into_iter()
            .filter_map(|(skill, level)| {
                match level.as_str().and_then(SkillLevel::from_label) {
                    Some(level) => Some((skill, level)),
                    None => {
                        warn!("Dropping skill {:?} of user {}: level {}", skill, user_id, level);
                        None
                    }
                }
            })
            .collect(),
        Value::Null => BTreeMap::new(),
        other => {
            warn!("Skills of user {} are not an object: {}", user_id, other);
            BTreeMap::new()
        }
    }
}

pub struct UserRepository {
    connection_pool: PoolType,
}

impl UserRepository {
    pub fn new(connection_pool: PoolType) -> Self {
        Self { connection_pool }
    }
}

#[async_trait]
impl UserReader for UserRepository {
    async fn read_user(&self, user_id: i32) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{USER_COLUMNS} WHERE u.user_id = ?"))
            .bind(user_id)
            .fetch_optional(&self.connection_pool)
            .await?;

        Ok(row.map(User::from))
    }

    async fn find_candidates(
        &self,
        exclude: &HashSet<i32>,
        after_id: Option<i32>,
        limit: usize,
    ) -> Result<Vec<User>, StoreError> {
        let mut query_builder = sqlx::QueryBuilder::new(USER_COLUMNS);
        query_builder.push(" WHERE p.auto_invite_enabled = TRUE");

        if let Some(after_id) = after_id {
            query_builder.push(" AND u.user_id > ");
            query_builder.push_bind(after_id);
        }

        if !exclude.is_empty() {
            query_builder.push(" AND u.user_id NOT IN (");
            let mut separated = query_builder.separated(", ");
            for id in exclude {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");
        }

        query_builder.push(" ORDER BY u.user_id ASC LIMIT ");
        query_builder.push_bind(limit as i64);

        let rows = query_builder
            .build_query_as::<UserRow>()
            .fetch_all(&self.connection_pool)
            .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(interests: Option<Value>, skills: Option<Value>) -> UserRow {
        UserRow {
            user_id: 7,
            username: "user7".into(),
            institution: None,
            program: None,
            enrollment_year: None,
            bio: None,
            interests: interests.map(Json),
            skills: skills.map(Json),
            auto_invite_enabled: None,
            preferred_radius_km: None,
        }
    }

    #[test]
    fn well_formed_profile_is_kept() {
        let user = User::from(row(
            Some(json!(["Rust", "chess"])),
            Some(json!({ "rust": "Expert", "sql": "beginner" })),
        ));
        assert_eq!(user.profile.interests, vec!["Rust", "chess"]);
        assert_eq!(user.profile.skills["rust"], SkillLevel::Expert);
        assert_eq!(user.profile.skills["sql"], SkillLevel::Beginner);
    }

    #[test]
    fn bad_entries_are_dropped_not_fatal() {
        let user = User::from(row(
            Some(json!(["go", 3, null, "k8s"])),
            Some(json!({ "rust": "EXPERT", "go": "Master", "sql": 2 })),
        ));
        assert_eq!(user.profile.interests, vec!["go", "k8s"]);
        assert_eq!(user.profile.skills.len(), 1);
        assert_eq!(user.profile.skills["rust"], SkillLevel::Expert);
    }

    #[test]
    fn wrongly_shaped_columns_become_empty() {
        let user = User::from(row(Some(json!("chess, go")), Some(json!(["rust"]))));
        assert!(user.profile.interests.is_empty());
        assert!(user.profile.skills.is_empty());
    }

    #[test]
    fn missing_profile_is_opted_out() {
        let user = User::from(row(None, None));
        assert!(!user.profile.auto_invite_enabled);
        assert!(!UserProfile::default().auto_invite_enabled);
        assert_eq!(user.profile.preferred_radius_km, DEFAULT_PREFERRED_RADIUS_KM);

        // the column default agrees with the fallbacks above
        let schema = include_str!("../../migrations/20250101000000_init.sql");
        assert!(schema.contains("auto_invite_enabled BOOLEAN NOT NULL DEFAULT FALSE"));
    }
}
