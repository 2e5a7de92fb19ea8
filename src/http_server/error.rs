use axum::{
    body::Body,
    http::{Response, StatusCode},
    response::IntoResponse,
};

use crate::error::BookingError;

// Tell axum how to convert a read-side `BookingError` into a response.
// Mutations never get here, they answer with a flash notice instead.
impl IntoResponse for BookingError {
    fn into_response(self) -> Response<Body> {
        match self {
            BookingError::NotFound { .. } => {
                log::debug!("{self}");
                (StatusCode::NOT_FOUND, self.to_string()).into_response()
            }
            err => {
                log::error!("{err:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong".to_string(),
                )
                    .into_response()
            }
        }
    }
}
