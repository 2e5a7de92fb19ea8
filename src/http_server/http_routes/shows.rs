use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_extra::extract::Form;

use crate::{
    error::BookingResult,
    forms::ShowForm,
    http_server::{
        flash::{Action, Notice},
        state::AppState,
    },
    services::shows::{ShowListing, ShowService},
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/shows", get(list_shows))
        .route("/shows/create", post(create_show))
}

async fn list_shows(
    State(app_state): State<Arc<AppState>>,
) -> BookingResult<Json<Vec<ShowListing>>> {
    let shows = ShowService::new(app_state.db.clone()).list_shows().await?;
    Ok(Json(shows))
}

async fn create_show(State(app_state): State<Arc<AppState>>, Form(form): Form<ShowForm>) -> Notice {
    match ShowService::new(app_state.db.clone()).create(form).await {
        Ok(_) => Notice::success("Show", Action::Listed),
        Err(err) => Notice::failure("Show", Action::Listed, &err),
    }
}
