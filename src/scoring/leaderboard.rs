use super::scorer::score;
use crate::models::{Catalog, Entry};
use serde::Serialize;
use std::cmp::Ordering;

/// One row of the scoreboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing {
    pub entry_id: String,
    pub name: String,
    pub score: Option<u32>,
    /// Competition rank (1, 2, 2, 4); `None` until the master decides a question.
    pub rank: Option<usize>,
}

/// Order entries for the scoreboard.
///
/// Until the master decides a question every score is pending and entries keep
/// the order they were given in (submission order). After that, highest score
/// first, then name, then entry id so equal rows still have a fixed order.
pub fn build_leaderboard(catalog: &Catalog, entries: &[Entry], master: Option<&Entry>) -> Vec<Standing> {
    let mut scored: Vec<(&Entry, Option<u32>)> = entries
        .iter()
        .filter(|e| !e.is_master)
        .map(|e| (e, score(catalog, e, master)))
        .collect();

    let decided = master.is_some_and(|m| catalog.keys().any(|k| m.answers.get(k).is_some()));
    if !decided {
        return scored
            .into_iter()
            .map(|(entry, score)| standing(entry, score, None))
            .collect();
    }

    scored.sort_by(|(a, a_score), (b, b_score)| compare_rows(a, *a_score, b, *b_score));

    let mut standings = Vec::with_capacity(scored.len());
    let mut rank = 0;
    let mut previous: Option<Option<u32>> = None;
    for (position, (entry, score)) in scored.into_iter().enumerate() {
        if previous != Some(score) {
            rank = position + 1;
            previous = Some(score);
        }
        standings.push(standing(entry, score, Some(rank)));
    }
    standings
}

fn compare_rows(a: &Entry, a_score: Option<u32>, b: &Entry, b_score: Option<u32>) -> Ordering {
    // Option orders None below Some, so pending rows sink to the bottom.
    b_score
        .cmp(&a_score)
        .then_with(|| compare_names(&a.name, &b.name))
        .then_with(|| a.entry_id.cmp(&b.entry_id))
}

/// Letters compare ignoring case first; names that differ only in case put
/// lowercase first ("amy" < "Amy" < "bob").
fn compare_names(a: &str, b: &str) -> Ordering {
    let folded = |s: &str| s.to_lowercase();
    let flipped = |s: &str| {
        s.chars()
            .flat_map(|c| {
                if c.is_uppercase() {
                    c.to_lowercase().collect::<Vec<_>>()
                } else {
                    c.to_uppercase().collect::<Vec<_>>()
                }
            })
            .collect::<String>()
    };
    folded(a)
        .cmp(&folded(b))
        .then_with(|| flipped(a).cmp(&flipped(b)))
}

fn standing(entry: &Entry, score: Option<u32>, rank: Option<usize>) -> Standing {
    Standing {
        entry_id: entry.entry_id.clone(),
        name: entry.name.clone(),
        score,
        rank,
    }
}
