//! One-shot outcome messages for mutations.
//!
//! A mutation always answers 200 with a notice. The cause of a failure goes to
//! the log, never to the client.

use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::BookingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Listed,
    Updated,
    Deleted,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Listed => write!(f, "listed"),
            Action::Updated => write!(f, "updated"),
            Action::Deleted => write!(f, "deleted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub category: Category,
    pub message: String,
}

impl Notice {
    pub fn success(subject: impl fmt::Display, action: Action) -> Self {
        Notice {
            category: Category::Success,
            message: format!("{subject} was successfully {action}!"),
        }
    }

    pub fn failure(subject: impl fmt::Display, action: Action, cause: &BookingError) -> Self {
        log::error!("{subject} could not be {action}: {cause:?}");
        Notice {
            category: Category::Error,
            message: format!("An error occurred. {subject} could not be {action}."),
        }
    }
}

impl IntoResponse for Notice {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
