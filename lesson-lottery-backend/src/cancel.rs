use lesson_lottery_selection::partition;
use lesson_lottery_store::models::{Candidate, Selection};
use lesson_lottery_store::Store;
use serde::Serialize;
use tracing::info;

use crate::error::LotteryError;
use crate::lottery::Transaction;
use crate::phase::{self, Phase};

/// The list a cancelled candidate was taken off.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Signups,
    Chosen,
    Waiting,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CancelOutcome {
    pub removed_from: Collection,
    pub cancelled: Candidate,
    /// The waiting candidate who got the freed seat.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promoted: Option<Candidate>,
}

impl CancelOutcome {
    /// What to tell the person who cancelled.
    #[must_use]
    pub fn message(&self) -> String {
        match (self.removed_from, &self.promoted) {
            (Collection::Signups, _) => "You have been removed from the signup list.".to_owned(),
            (Collection::Waiting, _) => "You have been removed from the waiting list.".to_owned(),
            (Collection::Chosen, Some(promoted)) => format!(
                "{} cancelled. {} promoted from waitlist. Please inform them of your cancellation.",
                self.cancelled.first_name, promoted.email
            ),
            (Collection::Chosen, None) => format!("{} cancelled.", self.cancelled.first_name),
        }
    }
}

pub fn cancel<S: Store>(
    transaction: &mut Transaction<'_, S>,
    email: &str,
) -> Result<CancelOutcome, LotteryError> {
    let resolved = phase::resolve(transaction)?;
    let not_found = || LotteryError::NotFound {
        email: email.trim().to_lowercase(),
    };

    let mut selection = match resolved.phase {
        Phase::SignupOpen => return cancel_signup(transaction, email),
        Phase::FrozenPostDeadline => return Err(LotteryError::DeadlineExceeded),
        Phase::AwaitingFreeze | Phase::FrozenPreDeadline => {
            resolved.selection.ok_or_else(not_found)?
        }
    };

    let outcome = if let Some(position) = position_of(&selection.chosen, email) {
        let cancelled = selection.chosen.remove(position);
        let promoted = promote(transaction, &mut selection)?;
        CancelOutcome {
            removed_from: Collection::Chosen,
            cancelled,
            promoted,
        }
    } else if let Some(position) = position_of(&selection.waiting, email) {
        CancelOutcome {
            removed_from: Collection::Waiting,
            cancelled: selection.waiting.remove(position),
            promoted: None,
        }
    } else {
        return Err(not_found());
    };

    transaction.save_selection(&selection)?;
    info!(
        "{} cancelled from {:?}, promoted {:?}",
        outcome.cancelled.email,
        outcome.removed_from,
        outcome.promoted.as_ref().map(|candidate| &candidate.email)
    );
    Ok(outcome)
}

fn cancel_signup<S: Store>(
    transaction: &mut Transaction<'_, S>,
    email: &str,
) -> Result<CancelOutcome, LotteryError> {
    let mut signups = transaction.signups()?;
    let cancelled = signups.remove(email).ok_or_else(|| LotteryError::NotFound {
        email: email.trim().to_lowercase(),
    })?;
    transaction.save_signups(&signups)?;
    info!("{} withdrew their signup", cancelled.email);
    Ok(CancelOutcome {
        removed_from: Collection::Signups,
        cancelled,
        promoted: None,
    })
}

fn position_of(candidates: &[Candidate], email: &str) -> Option<usize> {
    candidates.iter().position(|candidate| candidate.has_email(email))
}

/// Draws one waiting candidate into the chosen list.
fn promote<S: Store>(
    transaction: &mut Transaction<'_, S>,
    selection: &mut Selection,
) -> Result<Option<Candidate>, LotteryError> {
    if selection.waiting.is_empty() {
        return Ok(None);
    }
    let indices = transaction.draw(&selection.waiting, 1)?;
    let (mut promoted, waiting) = partition(std::mem::take(&mut selection.waiting), &indices);
    selection.waiting = waiting;
    let promoted = promoted.pop();
    selection.chosen.extend(promoted.clone());
    Ok(promoted)
}
