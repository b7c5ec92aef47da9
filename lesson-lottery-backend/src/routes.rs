//! Form posts in, JSON out.

mod admin;
mod cancel;
mod index;
mod signup;

use std::sync::Arc;

use axum::async_trait;
use axum::extract::{DefaultBodyLimit, FromRequest, Request};
use axum::routing::{get, post};
use axum::Router;
use http::{Method, Uri};
use lesson_lottery_store::Store;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tower_http::catch_panic::CatchPanicLayer;

use crate::clock::Clock;
use crate::error::{AppError, LotteryError};
use crate::lottery::Lottery;

/// Every form is a handful of short fields.
pub const BODY_LIMIT: usize = 16 * 1024;

pub fn router<S, C>(lottery: Arc<Lottery<S, C>>) -> Router
where
    S: Store + Send + 'static,
    C: Clock + 'static,
{
    Router::new()
        .route("/", get(index::index::<S, C>).post(signup::signup::<S, C>))
        .route("/cancel", post(cancel::cancel::<S, C>))
        .route("/admin", get(admin::show::<S, C>))
        .route("/admin/config", post(admin::update::<S, C>))
        .route("/admin/rerun", post(admin::rerun::<S, C>))
        .fallback(not_found)
        .with_state(lottery)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(CatchPanicLayer::new())
}

async fn not_found(method: Method, uri: Uri) -> AppError {
    AppError::NotFound {
        method: method.to_string(),
        path: uri.path().to_owned(),
    }
}

/// A url-encoded form whose rejection is answered like any other error.
struct LotteryForm<T>(T);

#[async_trait]
impl<T, St> FromRequest<St> for LotteryForm<T>
where
    T: DeserializeOwned + Send,
    St: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &St) -> Result<Self, Self::Rejection> {
        let axum::Form(value) = axum::Form::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// A response body with a message for the user next to it.
#[derive(Serialize)]
struct Flash<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(flatten)]
    body: T,
}

impl<T> Flash<T> {
    fn new(message: impl Into<String>, body: T) -> Self {
        Self {
            message: Some(message.into()),
            body,
        }
    }
}

/// Runs one operation on the blocking pool. Operations hold the lottery lock
/// while doing synchronous file IO.
async fn blocking<S, C, T>(
    lottery: Arc<Lottery<S, C>>,
    operation: impl FnOnce(&Lottery<S, C>) -> Result<T, LotteryError> + Send + 'static,
) -> Result<T, AppError>
where
    S: Store + Send + 'static,
    C: Clock + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(move || operation(&lottery)).await??)
}
