use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use lesson_lottery_config::{Config, ConfigUpdate};
use lesson_lottery_store::Store;

use crate::clock::Clock;
use crate::error::AppError;
use crate::lottery::Lottery;
use crate::routes::{blocking, Flash, LotteryForm};

/// Nothing is stored unless every field is valid.
pub async fn update<S, C>(
    State(lottery): State<Arc<Lottery<S, C>>>,
    LotteryForm(update): LotteryForm<ConfigUpdate>,
) -> Result<Json<Flash<Config>>, AppError>
where
    S: Store + Send + 'static,
    C: Clock + 'static,
{
    let config = blocking(lottery, move |lottery| lottery.admin_apply_update(update)).await?;
    Ok(Json(Flash::new("Configuration updated successfully.", config)))
}
