use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use lesson_lottery_store::Store;
use serde::Deserialize;

use super::{blocking, Flash, LotteryForm};
use crate::cancel::CancelOutcome;
use crate::clock::Clock;
use crate::error::AppError;
use crate::lottery::Lottery;

#[derive(Deserialize)]
pub struct CancelForm {
    email: String,
}

pub async fn cancel<S, C>(
    State(lottery): State<Arc<Lottery<S, C>>>,
    LotteryForm(form): LotteryForm<CancelForm>,
) -> Result<Json<Flash<CancelOutcome>>, AppError>
where
    S: Store + Send + 'static,
    C: Clock + 'static,
{
    let outcome = blocking(lottery, move |lottery| lottery.cancel(&form.email)).await?;
    Ok(Json(Flash::new(outcome.message(), outcome)))
}
