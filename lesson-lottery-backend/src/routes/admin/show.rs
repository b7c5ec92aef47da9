use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use lesson_lottery_config::Config;
use lesson_lottery_store::Store;

use crate::clock::Clock;
use crate::error::AppError;
use crate::lottery::Lottery;
use crate::routes::blocking;

pub async fn show<S, C>(State(lottery): State<Arc<Lottery<S, C>>>) -> Result<Json<Config>, AppError>
where
    S: Store + Send + 'static,
    C: Clock + 'static,
{
    Ok(Json(blocking(lottery, Lottery::admin_config).await?))
}
