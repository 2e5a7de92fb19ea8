use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::ConnectOptions;
use tower::ServiceExt;

use crate::database::{Artist, Database, NewArtist, NewShow, NewVenue, Show, Venue};
use crate::http_server::{app, state::AppState};
use crate::ports::clock::MockClock;
use crate::repository;

/// In-memory store with migrations applied. A single pooled connection keeps
/// every query on the same in-memory database.
pub async fn test_db() -> Arc<Database> {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    Arc::new(Database::connect(opt).await.unwrap())
}

pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

pub fn genres(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

pub async fn insert_venue(db: &Database, name: &str, city: &str, state: &str) -> Venue {
    repository::insert_venue(
        &db.conn,
        NewVenue {
            name: name.into(),
            city: city.into(),
            state: state.into(),
            address: "1 Main Street".into(),
            genres: genres(&["Jazz"]),
            image_link: format!("https://images.example.com/{name}.png"),
            ..Default::default()
        },
    )
    .await
    .unwrap()
}

pub async fn insert_artist(db: &Database, name: &str) -> Artist {
    repository::insert_artist(
        &db.conn,
        NewArtist {
            name: name.into(),
            city: "San Francisco".into(),
            state: "CA".into(),
            genres: genres(&["Rock n Roll"]),
            image_link: format!("https://images.example.com/{name}.png"),
            ..Default::default()
        },
    )
    .await
    .unwrap()
}

pub async fn insert_show(
    db: &Database,
    venue: &Venue,
    artist: &Artist,
    start_time: NaiveDateTime,
) -> Show {
    repository::insert_show(
        &db.conn,
        NewShow {
            venue_id: venue.id,
            artist_id: artist.id,
            start_time,
        },
    )
    .await
    .unwrap()
}

/// The full router over `db`, with the clock frozen at `now`.
pub fn test_app(db: Arc<Database>, now: NaiveDateTime) -> Router {
    let mut clock = MockClock::new();
    clock.expect_now().return_const(now);

    app::router(Arc::new(AppState {
        db,
        clock: Arc::new(clock),
    }))
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// A url-encoded form POST; `body` is sent as is.
pub fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Send one request and read the body back as JSON (`Null` when it is not JSON).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}
