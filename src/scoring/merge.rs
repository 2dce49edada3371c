use crate::models::{MasterSheet, MasterUpdate};

/// Apply an admin edit on top of the current master sheet.
///
/// Each question takes the update's choice when it has one and otherwise keeps
/// the existing choice (or stays undecided when there is no master yet). The
/// tiebreaker follows the same rule. Re-applying the same update is a no-op.
pub fn merge_master(existing: Option<&MasterSheet>, update: &MasterUpdate) -> MasterSheet {
    let mut merged = existing.cloned().unwrap_or_default();
    for (key, choice) in update.answers.iter() {
        merged.answers.insert(key, choice);
    }
    if let Some(tiebreaker) = update.tiebreaker {
        merged.tiebreaker = Some(tiebreaker);
    }
    merged
}
