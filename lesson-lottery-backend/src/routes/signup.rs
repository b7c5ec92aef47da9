use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use lesson_lottery_store::models::Candidate;
use lesson_lottery_store::Store;
use serde::Deserialize;

use super::{blocking, Flash, LotteryForm};
use crate::clock::Clock;
use crate::error::AppError;
use crate::lottery::{Lottery, ViewResult};

#[derive(Deserialize)]
pub struct SignupForm {
    first_name: String,
    last_name: String,
    email: String,
}

impl From<SignupForm> for Candidate {
    fn from(form: SignupForm) -> Self {
        Self::new(form.first_name, form.last_name, form.email)
    }
}

/// Outside the signup window this only reports the current state.
pub async fn signup<S, C>(
    State(lottery): State<Arc<Lottery<S, C>>>,
    LotteryForm(form): LotteryForm<SignupForm>,
) -> Result<Json<Flash<ViewResult>>, AppError>
where
    S: Store + Send + 'static,
    C: Clock + 'static,
{
    let view = blocking(lottery, move |lottery| lottery.view_or_register(Some(form.into()))).await?;
    let message = view
        .registered
        .as_ref()
        .map(|_| "Successfully signed up.".to_owned());
    Ok(Json(Flash {
        message,
        body: view,
    }))
}
