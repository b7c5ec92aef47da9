//! Where in the weekly cycle the lottery is.
//!
//! The phase is never stored. It follows from the clock and from what the
//! store holds, and is recomputed at the start of every operation. This keeps
//! a restart (or a crash between two writes) from leaving a stale phase
//! behind: the next operation simply finishes whatever transition is due.

use core::fmt;

use chrono::{DateTime, Utc};
use lesson_lottery_config::Config;
use lesson_lottery_selection::partition;
use lesson_lottery_store::models::{Selection, SignupSet};
use lesson_lottery_store::Store;
use serde::Serialize;
use tracing::info;

use crate::clock::Windows;
use crate::error::LotteryError;
use crate::lottery::Transaction;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    SignupOpen,
    /// The window has closed but nobody has been drawn yet.
    AwaitingFreeze,
    FrozenPreDeadline,
    FrozenPostDeadline,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SignupOpen => "open for signups",
            Self::AwaitingFreeze => "waiting for the selection",
            Self::FrozenPreDeadline => "frozen before the cancellation deadline",
            Self::FrozenPostDeadline => "past the cancellation deadline",
        })
    }
}

/// A committed history also counts as past the deadline. Otherwise the day
/// after the lesson, when the next deadline is a week away, would reopen
/// cancellations for a lesson that already happened.
#[must_use]
pub fn derive_phase(now: DateTime<Utc>, config: &Config, selection: Option<&Selection>) -> Phase {
    let windows = Windows::new(config, now);
    if windows.in_signup_window() {
        return Phase::SignupOpen;
    }
    match selection {
        // an empty draw is closed at the deadline like any other
        Some(selection) if selection.history_saved || windows.over_cancel_deadline() => {
            Phase::FrozenPostDeadline
        }
        Some(selection) if selection.is_frozen() => Phase::FrozenPreDeadline,
        _ => Phase::AwaitingFreeze,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolved {
    pub phase: Phase,
    /// `None` while signups are open.
    pub selection: Option<Selection>,
}

/// Performs whatever transition is due and returns the resulting state.
pub fn resolve<S: Store>(transaction: &mut Transaction<'_, S>) -> Result<Resolved, LotteryError> {
    let windows = transaction.windows();
    let in_signup_window = windows.in_signup_window();
    let over_cancel_deadline = windows.over_cancel_deadline();

    if in_signup_window {
        if transaction.has_selection_record()? {
            info!("signup window opened, discarding the previous selection");
            transaction.delete_selection()?;
            // already empty unless a crash hit between freezing and clearing
            transaction.save_signups(&SignupSet::default())?;
        }
        return Ok(Resolved {
            phase: Phase::SignupOpen,
            selection: None,
        });
    }

    let mut selection = match transaction.selection()? {
        Some(selection) if selection.is_frozen() => selection,
        previous => freeze(transaction, previous)?,
    };

    if over_cancel_deadline && !selection.history_saved {
        commit_history(transaction, &mut selection)?;
    }

    Ok(Resolved {
        phase: derive_phase(transaction.now(), transaction.config(), Some(&selection)),
        selection: Some(selection),
    })
}

fn freeze<S: Store>(
    transaction: &mut Transaction<'_, S>,
    previous: Option<Selection>,
) -> Result<Selection, LotteryError> {
    let signups = transaction.signups()?.signups;
    if signups.is_empty() {
        if let Some(previous) = previous {
            return Ok(previous);
        }
    }

    let capacity = transaction.config().lesson.capacity;
    let indices = transaction.draw(&signups, capacity)?;
    let (chosen, waiting) = partition(signups, &indices);
    let selection = Selection::new(chosen, waiting);
    transaction.save_selection(&selection)?;
    transaction.save_signups(&SignupSet::default())?;
    info!(
        "froze selection: {} chosen, {} waiting",
        selection.chosen.len(),
        selection.waiting.len()
    );
    Ok(selection)
}

fn commit_history<S: Store>(
    transaction: &mut Transaction<'_, S>,
    selection: &mut Selection,
) -> Result<(), LotteryError> {
    let mut history = transaction.history()?;
    for candidate in &selection.chosen {
        history.record_visit(&candidate.email);
    }
    transaction.save_history(&history)?;
    selection.history_saved = true;
    transaction.save_selection(selection)?;
    info!("recorded visits of {} participants", selection.chosen.len());
    Ok(())
}
