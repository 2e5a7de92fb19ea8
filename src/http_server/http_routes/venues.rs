use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_extra::extract::Form;

use crate::{
    database::Venue,
    error::{BookingResult, EntityKind},
    forms::{SearchForm, VenueForm},
    http_server::{
        flash::{Action, Notice},
        state::AppState,
    },
    services::{
        listing::{ListingService, LocationGroup, SearchResults},
        venue::{VenueDetail, VenueService},
    },
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/venues", get(list_venues))
        .route("/venues/search", post(search_venues))
        .route("/venues/create", post(create_venue))
        .route("/venues/{id}", get(venue_detail).delete(delete_venue))
        .route("/venues/{id}/edit", get(edit_venue_form).post(edit_venue))
}

async fn list_venues(
    State(app_state): State<Arc<AppState>>,
) -> BookingResult<Json<Vec<LocationGroup>>> {
    let groups = ListingService::new(app_state.db.clone())
        .group_venues_by_location(app_state.clock.now())
        .await?;
    Ok(Json(groups))
}

async fn search_venues(
    State(app_state): State<Arc<AppState>>,
    Form(form): Form<SearchForm>,
) -> BookingResult<Json<SearchResults>> {
    let results = ListingService::new(app_state.db.clone())
        .search_by_name(EntityKind::Venue, &form.search_term, app_state.clock.now())
        .await?;
    Ok(Json(results))
}

async fn venue_detail(
    State(app_state): State<Arc<AppState>>,
    Path(venue_id): Path<i64>,
) -> BookingResult<Json<VenueDetail>> {
    let detail = VenueService::new(app_state.db.clone())
        .detail(venue_id, app_state.clock.now())
        .await?;
    Ok(Json(detail))
}

async fn create_venue(
    State(app_state): State<Arc<AppState>>,
    Form(form): Form<VenueForm>,
) -> Notice {
    let subject = format!("Venue {}", form.name);
    match VenueService::new(app_state.db.clone()).create(form).await {
        Ok(_) => Notice::success(subject, Action::Listed),
        Err(err) => Notice::failure(subject, Action::Listed, &err),
    }
}

async fn edit_venue_form(
    State(app_state): State<Arc<AppState>>,
    Path(venue_id): Path<i64>,
) -> BookingResult<Json<Venue>> {
    let venue = VenueService::new(app_state.db.clone()).get(venue_id).await?;
    Ok(Json(venue))
}

async fn edit_venue(
    State(app_state): State<Arc<AppState>>,
    Path(venue_id): Path<i64>,
    Form(form): Form<VenueForm>,
) -> Notice {
    match VenueService::new(app_state.db.clone())
        .edit(venue_id, form)
        .await
    {
        Ok(venue) => Notice::success(format!("Venue {}", venue.name), Action::Updated),
        Err(err) => Notice::failure(format!("Venue {venue_id}"), Action::Updated, &err),
    }
}

async fn delete_venue(
    State(app_state): State<Arc<AppState>>,
    Path(venue_id): Path<i64>,
) -> Notice {
    let subject = format!("Venue {venue_id}");
    match VenueService::new(app_state.db.clone())
        .delete(venue_id)
        .await
    {
        Ok(_) => Notice::success(subject, Action::Deleted),
        Err(err) => Notice::failure(subject, Action::Deleted, &err),
    }
}
