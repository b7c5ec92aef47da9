use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use lesson_lottery_store::Store;

use super::blocking;
use crate::clock::Clock;
use crate::error::AppError;
use crate::lottery::{Lottery, ViewResult};

pub async fn index<S, C>(
    State(lottery): State<Arc<Lottery<S, C>>>,
) -> Result<Json<ViewResult>, AppError>
where
    S: Store + Send + 'static,
    C: Clock + 'static,
{
    let view = blocking(lottery, |lottery| lottery.view_or_register(None)).await?;
    Ok(Json(view))
}
