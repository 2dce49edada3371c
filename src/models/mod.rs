pub mod catalog;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

pub use catalog::Catalog;

/// Fixed id of the single master row; generated ids are UUIDs and never collide with it.
pub const MASTER_ENTRY_ID: &str = "MASTER_SHEET";
pub const MASTER_NAME: &str = "Master Sheet";

/// One of the two options of a question, stored and sent as 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Choice {
    First,
    Second,
}

impl Choice {
    pub fn index(self) -> usize {
        match self {
            Choice::First => 0,
            Choice::Second => 1,
        }
    }
}

impl From<Choice> for u8 {
    fn from(choice: Choice) -> u8 {
        choice.index() as u8
    }
}

impl TryFrom<u8> for Choice {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Choice::First),
            1 => Ok(Choice::Second),
            other => Err(format!("choice must be 0 or 1, got {}", other)),
        }
    }
}

/// Question key to chosen option. Keys that are absent are undecided.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(BTreeMap<String, Choice>);

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Choice> {
        self.0.get(key).copied()
    }

    pub fn insert(&mut self, key: impl Into<String>, choice: Choice) {
        self.0.insert(key.into(), choice);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Choice)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, Choice)> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = (K, Choice)>>(iter: I) -> Self {
        AnswerSet(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub entry_id: String,
    pub name: String,
    pub is_master: bool,
    pub answers: AnswerSet,
    pub tiebreaker: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Entry {
    /// A fresh submitter entry with a newly generated id.
    pub fn new(name: String, answers: AnswerSet, tiebreaker: f64) -> Self {
        Self {
            entry_id: Uuid::new_v4().to_string(),
            name,
            is_master: false,
            answers,
            tiebreaker: Some(tiebreaker),
            created_at: Utc::now(),
        }
    }

    /// The master row holding the given sheet.
    pub fn master(sheet: MasterSheet, created_at: DateTime<Utc>) -> Self {
        Self {
            entry_id: MASTER_ENTRY_ID.to_string(),
            name: MASTER_NAME.to_string(),
            is_master: true,
            answers: sheet.answers,
            tiebreaker: sheet.tiebreaker,
            created_at,
        }
    }

    pub fn sheet(&self) -> MasterSheet {
        MasterSheet {
            answers: self.answers.clone(),
            tiebreaker: self.tiebreaker,
        }
    }
}

/// The correct answers decided so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MasterSheet {
    pub answers: AnswerSet,
    pub tiebreaker: Option<f64>,
}

/// A validated admin edit. Only the fields present here change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MasterUpdate {
    pub answers: AnswerSet,
    pub tiebreaker: Option<f64>,
}

impl MasterUpdate {
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty() && self.tiebreaker.is_none()
    }
}
