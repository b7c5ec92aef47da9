use lesson_lottery_selection::partition;
use lesson_lottery_store::models::Selection;
use lesson_lottery_store::Store;
use tracing::info;

use crate::error::LotteryError;
use crate::lottery::Transaction;
use crate::phase::{self, Phase};

/// Draws the frozen selection again from everyone in it, with the current
/// capacity and history. Only allowed between the freeze and the cancellation
/// deadline.
pub fn rerun<S: Store>(transaction: &mut Transaction<'_, S>) -> Result<Selection, LotteryError> {
    let resolved = phase::resolve(transaction)?;
    // after resolving, awaiting the freeze means the freeze found nobody
    let current = match (resolved.phase, resolved.selection) {
        (Phase::FrozenPreDeadline | Phase::AwaitingFreeze, Some(selection)) => selection,
        (phase, _) => return Err(LotteryError::InvalidPhase(phase)),
    };

    let history_saved = current.history_saved;
    let mut candidates = current.chosen;
    candidates.extend(current.waiting);
    if candidates.is_empty() {
        return Err(LotteryError::EmptyCandidates);
    }

    let capacity = transaction.config().lesson.capacity;
    let indices = transaction.draw(&candidates, capacity)?;
    let (chosen, waiting) = partition(candidates, &indices);
    let selection = Selection {
        chosen,
        waiting,
        history_saved,
    };
    transaction.save_selection(&selection)?;
    info!(
        "reran selection: {} chosen, {} waiting",
        selection.chosen.len(),
        selection.waiting.len()
    );
    Ok(selection)
}
