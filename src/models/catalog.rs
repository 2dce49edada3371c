//! The fixed list of questions every entry answers.

use crate::error::ConfigError;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

lazy_static! {
    static ref QUESTION_KEY: Regex = Regex::new(r"^[a-z0-9_]+$").unwrap();
    static ref BUILTIN: Catalog = Catalog {
        questions: vec![
            question(1, "Time for National Anthem: 119.5 seconds", "Over", "Under"),
            question(2, "Outcome of the coin toss", "Heads", "Tails"),
            question(3, "Team to score 1st", "Seahawks", "Patriots"),
            question(4, "1st scoring play", "Touchdown", "FG / Safety"),
            question(5, "Either QB throws 300+ yards?", "Yes", "No"),
            question(6, "Touchdown of 1 or fewer yards?", "Yes", "No"),
            question(7, "Team to score last", "Seahawks", "Patriots"),
            question(8, "Either team scores 28 or more points?", "Yes", "No"),
            question(9, "# of times broadcast shows Cardi B: 3.5 times", "Over", "Under"),
            question(
                10,
                "Total number of AI Lab advertisements for an AI product: 4.5",
                "Over",
                "Under",
            ),
            question(
                11,
                "First TV advertisement (after kickoff)?",
                "Food / drink",
                "Not food / drink",
            ),
            question(12, "Kenneth Walker III rushing yards: 80.5", "Over", "Under"),
            question(13, "First letter of first bad Bunny song name?", "a-m", "n-z"),
            question(14, "Total half time show songs: 11.5", "Over", "Under"),
            question(
                15,
                "More total points in the first half or second half?",
                "First",
                "Second",
            ),
            question(16, "Cardi B joins the half time show?", "Yes", "No"),
            question(17, "Gatorade shower color?", "Orange / Lime", "Other"),
            question(18, "Super Bowl winner?", "Seahawks", "Patriots"),
            question(19, "Super Bowl MVP", "Quarterback", "Non-QB"),
        ],
        tiebreaker_label: "Tiebreaker (enter a number) - total rushing yards:".to_string(),
    };
}

fn question(number: usize, text: &str, first: &str, second: &str) -> Question {
    Question {
        key: format!("question_{}", number),
        text: text.to_string(),
        options: [first.to_string(), second.to_string()],
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub key: String,
    pub text: String,
    /// Label for choice 0, then choice 1.
    pub options: [String; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub questions: Vec<Question>,
    pub tiebreaker_label: String,
}

impl Catalog {
    /// The reference 19-question sheet.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Load and validate a catalog from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::CatalogIo {
            path: display.clone(),
            source,
        })?;
        let catalog: Catalog =
            serde_json::from_str(&raw).map_err(|source| ConfigError::CatalogParse {
                path: display,
                source,
            })?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.questions.is_empty() {
            return Err(ConfigError::InvalidCatalog(
                "at least one question is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for q in &self.questions {
            if !QUESTION_KEY.is_match(&q.key) {
                return Err(ConfigError::InvalidCatalog(format!(
                    "question key {:?} must match {}",
                    q.key,
                    QUESTION_KEY.as_str()
                )));
            }
            if !seen.insert(q.key.as_str()) {
                return Err(ConfigError::InvalidCatalog(format!(
                    "question key {} appears more than once",
                    q.key
                )));
            }
            if q.text.trim().is_empty() {
                return Err(ConfigError::InvalidCatalog(format!(
                    "question {} has no text",
                    q.key
                )));
            }
            if q.options.iter().any(|label| label.trim().is_empty()) {
                return Err(ConfigError::InvalidCatalog(format!(
                    "question {} has an empty option label",
                    q.key
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.question(key).is_some()
    }

    pub fn question(&self, key: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.questions.iter().map(|q| q.key.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 19);
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.keys().next(), Some("question_1"));
        assert_eq!(catalog.keys().last(), Some("question_19"));
        assert_eq!(
            catalog.question("question_2").map(|q| q.options[1].as_str()),
            Some("Tails")
        );
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let mut catalog = Catalog::builtin();
        catalog.questions[1].key = "question_1".to_string();
        let err = catalog.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn malformed_keys_are_rejected() {
        let mut catalog = Catalog::builtin();
        catalog.questions[0].key = "Question 1".to_string();
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn empty_catalog_is_rejected() {
        let catalog = Catalog {
            questions: Vec::new(),
            tiebreaker_label: "Total points".to_string(),
        };
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn options_must_be_a_pair() {
        let json = r#"{
            "questions": [{"key": "q", "text": "Pick", "options": ["A", "B", "C"]}],
            "tiebreaker_label": "Total"
        }"#;
        assert!(serde_json::from_str::<Catalog>(json).is_err());
    }

    #[test]
    fn loads_catalog_from_file() {
        let path = std::env::temp_dir().join(format!("catalog-{}.json", uuid::Uuid::new_v4()));
        let json = r#"{
            "questions": [
                {"key": "winner", "text": "Who wins?", "options": ["Home", "Away"]},
                {"key": "overtime", "text": "Overtime?", "options": ["Yes", "No"]}
            ],
            "tiebreaker_label": "Total points"
        }"#;
        fs::write(&path, json).unwrap();

        let catalog = Catalog::from_file(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("overtime"));
        assert!(!catalog.contains("question_1"));
    }

    #[test]
    fn missing_catalog_file_is_an_io_error() {
        let path = Path::new("/nonexistent/catalog.json");
        assert!(matches!(
            Catalog::from_file(path),
            Err(ConfigError::CatalogIo { .. })
        ));
    }
}
