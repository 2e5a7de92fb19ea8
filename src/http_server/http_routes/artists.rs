use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_extra::extract::Form;

use crate::{
    database::Artist,
    error::{BookingResult, EntityKind},
    forms::{ArtistForm, SearchForm},
    http_server::{
        flash::{Action, Notice},
        state::AppState,
    },
    services::{
        artist::{ArtistDetail, ArtistService},
        listing::{ArtistListItem, ListingService, SearchResults},
    },
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/artists", get(list_artists))
        .route("/artists/search", post(search_artists))
        .route("/artists/create", post(create_artist))
        .route("/artists/{id}", get(artist_detail).delete(delete_artist))
        .route("/artists/{id}/edit", get(edit_artist_form).post(edit_artist))
}

async fn list_artists(
    State(app_state): State<Arc<AppState>>,
) -> BookingResult<Json<Vec<ArtistListItem>>> {
    let artists = ListingService::new(app_state.db.clone())
        .list_artists()
        .await?;
    Ok(Json(artists))
}

async fn search_artists(
    State(app_state): State<Arc<AppState>>,
    Form(form): Form<SearchForm>,
) -> BookingResult<Json<SearchResults>> {
    let results = ListingService::new(app_state.db.clone())
        .search_by_name(EntityKind::Artist, &form.search_term, app_state.clock.now())
        .await?;
    Ok(Json(results))
}

async fn artist_detail(
    State(app_state): State<Arc<AppState>>,
    Path(artist_id): Path<i64>,
) -> BookingResult<Json<ArtistDetail>> {
    let detail = ArtistService::new(app_state.db.clone())
        .detail(artist_id, app_state.clock.now())
        .await?;
    Ok(Json(detail))
}

async fn create_artist(
    State(app_state): State<Arc<AppState>>,
    Form(form): Form<ArtistForm>,
) -> Notice {
    let subject = format!("Artist {}", form.name);
    match ArtistService::new(app_state.db.clone()).create(form).await {
        Ok(_) => Notice::success(subject, Action::Listed),
        Err(err) => Notice::failure(subject, Action::Listed, &err),
    }
}

async fn edit_artist_form(
    State(app_state): State<Arc<AppState>>,
    Path(artist_id): Path<i64>,
) -> BookingResult<Json<Artist>> {
    let artist = ArtistService::new(app_state.db.clone())
        .get(artist_id)
        .await?;
    Ok(Json(artist))
}

async fn edit_artist(
    State(app_state): State<Arc<AppState>>,
    Path(artist_id): Path<i64>,
    Form(form): Form<ArtistForm>,
) -> Notice {
    match ArtistService::new(app_state.db.clone())
        .edit(artist_id, form)
        .await
    {
        Ok(artist) => Notice::success(format!("Artist {}", artist.name), Action::Updated),
        Err(err) => Notice::failure(format!("Artist {artist_id}"), Action::Updated, &err),
    }
}

async fn delete_artist(
    State(app_state): State<Arc<AppState>>,
    Path(artist_id): Path<i64>,
) -> Notice {
    let subject = format!("Artist {artist_id}");
    match ArtistService::new(app_state.db.clone())
        .delete(artist_id)
        .await
    {
        Ok(_) => Notice::success(subject, Action::Deleted),
        Err(err) => Notice::failure(subject, Action::Deleted, &err),
    }
}
