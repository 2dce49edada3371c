//! Turn loosely-typed request values into answer sets and tiebreakers.

use crate::error::PoolError;
use crate::models::{AnswerSet, Catalog, Choice, MasterUpdate};
use serde_json::{Map, Value};

pub const TIEBREAKER_FIELD: &str = "tiebreaker";
pub const NAME_FIELD: &str = "name";

/// Every catalog question must be answered with 0 or 1. Keys outside the catalog are ignored.
pub fn validate_complete(catalog: &Catalog, raw: &Map<String, Value>) -> Result<AnswerSet, PoolError> {
    let mut answers = AnswerSet::new();
    for key in catalog.keys() {
        let value = match raw.get(key) {
            None | Some(Value::Null) => return Err(PoolError::MissingField(key.to_string())),
            Some(value) => value,
        };
        answers.insert(key, coerce_choice(key, value)?);
    }
    Ok(answers)
}

/// Any subset of catalog questions. An empty map yields an empty set.
pub fn validate_partial(catalog: &Catalog, raw: &Map<String, Value>) -> Result<AnswerSet, PoolError> {
    let mut answers = AnswerSet::new();
    for (key, value) in raw {
        if !catalog.contains(key) {
            return Err(PoolError::UnknownQuestionKey(key.clone()));
        }
        answers.insert(key.as_str(), coerce_choice(key, value)?);
    }
    Ok(answers)
}

/// Required tiebreaker for a full submission.
pub fn validate_tiebreaker(raw: Option<&Value>) -> Result<f64, PoolError> {
    validate_optional_tiebreaker(raw)?
        .ok_or_else(|| PoolError::MissingField(TIEBREAKER_FIELD.to_string()))
}

/// Tiebreaker for a master edit; `null`, `""` and absence all mean "leave as is".
pub fn validate_optional_tiebreaker(raw: Option<&Value>) -> Result<Option<f64>, PoolError> {
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => coerce_number(value)
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or_else(|| PoolError::InvalidValue(TIEBREAKER_FIELD.to_string())),
    }
}

/// Trimmed, non-empty display name.
pub fn validate_name(raw: Option<&str>) -> Result<String, PoolError> {
    match raw.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(PoolError::MissingField(NAME_FIELD.to_string())),
    }
}

/// Validate an admin edit and refuse one that changes nothing.
pub fn validate_master_update(
    catalog: &Catalog,
    answers: Option<&Map<String, Value>>,
    tiebreaker: Option<&Value>,
) -> Result<MasterUpdate, PoolError> {
    let answers = match answers {
        Some(raw) => validate_partial(catalog, raw)?,
        None => AnswerSet::new(),
    };
    let update = MasterUpdate {
        answers,
        tiebreaker: validate_optional_tiebreaker(tiebreaker)?,
    };
    if update.is_empty() {
        return Err(PoolError::NoUpdatesProvided);
    }
    Ok(update)
}

fn coerce_choice(key: &str, value: &Value) -> Result<Choice, PoolError> {
    match coerce_number(value) {
        Some(n) if n == 0.0 => Ok(Choice::First),
        Some(n) if n == 1.0 => Ok(Choice::Second),
        _ => Err(PoolError::InvalidValue(key.to_string())),
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                s.parse::<f64>().ok()
            }
        }
        _ => None,
    }
}
