use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use lesson_lottery_store::models::Selection;
use lesson_lottery_store::Store;

use crate::clock::Clock;
use crate::error::AppError;
use crate::lottery::Lottery;
use crate::routes::{blocking, Flash};

pub async fn rerun<S, C>(
    State(lottery): State<Arc<Lottery<S, C>>>,
) -> Result<Json<Flash<Selection>>, AppError>
where
    S: Store + Send + 'static,
    C: Clock + 'static,
{
    let selection = blocking(lottery, Lottery::admin_rerun).await?;
    Ok(Json(Flash::new("Selection rerun successfully.", selection)))
}
