use axum::extract::rejection::FormRejection;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use lesson_lottery_config::ConfigError;
use lesson_lottery_store::StoreError;
use serde::Serialize;
use tracing::error;

use crate::phase::Phase;

#[derive(thiserror::Error, Debug)]
pub enum LotteryError {
    #[error("The email domain of {email} is not allowed.")]
    DisallowedDomain { email: String },
    #[error("{email} is already signed up.")]
    DuplicateEmail { email: String },
    #[error("{email} was not found in the signup list.")]
    NotFound { email: String },
    #[error("The cancellation deadline has passed.")]
    DeadlineExceeded,
    #[error("The selection cannot be rerun while the lottery is {0}.")]
    InvalidPhase(Phase),
    #[error("There are no participants to rerun the selection with.")]
    EmptyCandidates,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl LotteryError {
    /// Errors that are the caller's doing and are shown to them as a message.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Lottery(#[from] LotteryError),
    #[error("malformed form: {0}")]
    FormRejection(#[from] FormRejection),
    #[error("join error: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("no route for {method} {path}")]
    NotFound { method: String, path: String },
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl AppError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Lottery(err) => match err {
                LotteryError::DisallowedDomain { .. } | LotteryError::Config(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                LotteryError::NotFound { .. } => StatusCode::NOT_FOUND,
                LotteryError::DuplicateEmail { .. }
                | LotteryError::DeadlineExceeded
                | LotteryError::InvalidPhase(_)
                | LotteryError::EmptyCandidates => StatusCode::CONFLICT,
                LotteryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::FormRejection(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            Self::FormRejection(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the message may be sent back as is. Everything else is logged
    /// and answered with a generic message.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        match self {
            Self::Lottery(err) => err.is_user_facing(),
            Self::FormRejection(_) | Self::NotFound { .. } => true,
            Self::Join(_) => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = if self.is_user_facing() {
            self.to_string()
        } else {
            error!("request failed: {self}");
            "Internal Server Error".to_owned()
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}
