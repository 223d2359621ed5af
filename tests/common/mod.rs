#![allow(dead_code)]

use axum_test::TestServer;
use axum_test::http::HeaderName;
use chrono::{Duration, Utc};
use eventmatch::core::AppState;
use eventmatch::entities::{Event, EventType, GeoPoint, User, UserProfile};
use eventmatch::matching::MatchSettings;
use eventmatch::repositories::MemoryStore;
use serde_json::{Value, json};
use std::sync::Arc;

pub const JWT_SECRET: &str = "integration-test-secret";

/// Host used by most fixtures
pub const HOST_ID: i32 = 1;

pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
    pub state: Arc<AppState>,
}

/// Builds a router over a fresh in-memory store with default matching settings
pub fn create_test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState::in_memory(
        store.clone(),
        JWT_SECRET.to_string(),
        MatchSettings::default(),
    ));
    let server = TestServer::new(eventmatch::create_router(state.clone()))
        .expect("Failed to create test server");
    TestApp {
        server,
        store,
        state,
    }
}

pub fn auth_header() -> HeaderName {
    HeaderName::from_static("authorization")
}

/// Mints a token the way the account service does
pub fn create_test_jwt(user_id: i32, username: &str, jwt_secret: &str) -> String {
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde::Serialize;

    #[derive(Serialize)]
    struct Claims {
        id: i32,
        username: String,
        exp: usize,
        iat: usize,
    }

    let now = Utc::now();
    let claims = Claims {
        id: user_id,
        username: username.to_string(),
        exp: (now + Duration::hours(24)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_ref()),
    )
    .expect("Failed to create JWT token")
}

/// Bearer header value for `user_id`
pub fn bearer(user_id: i32) -> String {
    let token = create_test_jwt(user_id, &format!("user{user_id}"), JWT_SECRET);
    format!("Bearer {token}")
}

pub fn user(user_id: i32, interests: &[&str]) -> User {
    User {
        user_id,
        username: format!("user{user_id}"),
        profile: UserProfile {
            interests: interests.iter().map(|s| s.to_string()).collect(),
            auto_invite_enabled: true,
            ..UserProfile::default()
        },
    }
}

/// Upcoming public event hosted by `host_id`, stored directly
pub fn seed_event(store: &MemoryStore, host_id: i32, tags: &[&str], max_participants: i32) -> i32 {
    let starts_at = Utc::now() + Duration::days(2);
    store.insert_event(Event {
        event_id: 0,
        title: "Study session".into(),
        description: String::new(),
        host_id,
        location: GeoPoint {
            latitude: 45.07,
            longitude: 7.69,
        },
        starts_at,
        ends_at: starts_at + Duration::hours(2),
        is_public: true,
        event_type: EventType::Study,
        max_participants,
        auto_matching_enabled: true,
        interest_tags: tags.iter().map(|s| s.to_string()).collect(),
        created_at: Utc::now(),
    })
}

/// Valid create-event body
pub fn event_body(tags: &[&str], auto_matching_enabled: bool) -> Value {
    let starts_at = Utc::now() + Duration::days(3);
    json!({
        "title": "Machine learning reading group",
        "description": "We go through one paper per week",
        "latitude": 45.07,
        "longitude": 7.69,
        "starts_at": starts_at,
        "ends_at": starts_at + Duration::hours(2),
        "event_type": "study",
        "max_participants": 10,
        "auto_matching_enabled": auto_matching_enabled,
        "interest_tags": tags,
    })
}

pub fn user_ids(matched: &Value) -> Vec<i64> {
    matched
        .as_array()
        .expect("expected an array of users")
        .iter()
        .map(|u| u["user_id"].as_i64().expect("user_id"))
        .collect()
}
