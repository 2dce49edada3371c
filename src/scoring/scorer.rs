use crate::models::{Catalog, Choice, Entry};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Correct,
    Wrong,
    Pending,
}

impl Outcome {
    fn compare<T: PartialEq>(guess: Option<T>, actual: Option<T>) -> Self {
        match (guess, actual) {
            (Some(guess), Some(actual)) if guess == actual => Outcome::Correct,
            (_, Some(_)) => Outcome::Wrong,
            (_, None) => Outcome::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionResult {
    pub key: String,
    pub text: String,
    pub choice: Option<Choice>,
    pub choice_label: Option<String>,
    pub correct_choice: Option<Choice>,
    pub correct_label: Option<String>,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TiebreakerResult {
    pub guess: Option<f64>,
    pub actual: Option<f64>,
    pub difference: Option<f64>,
    pub outcome: Outcome,
}

/// Full breakdown of one entry against the master sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scorecard {
    pub score: Option<u32>,
    pub total: usize,
    pub decided: usize,
    pub questions: Vec<QuestionResult>,
    pub tiebreaker: TiebreakerResult,
}

/// Number of decided questions the entry got right.
///
/// `None` while there is no master or the master has not decided any question.
pub fn score(catalog: &Catalog, entry: &Entry, master: Option<&Entry>) -> Option<u32> {
    let master = master?;
    let mut decided = 0;
    let mut correct = 0;
    for key in catalog.keys() {
        let Some(actual) = master.answers.get(key) else {
            continue;
        };
        decided += 1;
        if entry.answers.get(key) == Some(actual) {
            correct += 1;
        }
    }
    (decided > 0).then_some(correct)
}

pub fn scorecard(catalog: &Catalog, entry: &Entry, master: Option<&Entry>) -> Scorecard {
    let label = |options: &[String; 2], choice: Option<Choice>| {
        choice.map(|c| options[c.index()].clone())
    };

    let questions: Vec<QuestionResult> = catalog
        .questions
        .iter()
        .map(|q| {
            let choice = entry.answers.get(&q.key);
            let correct_choice = master.and_then(|m| m.answers.get(&q.key));
            QuestionResult {
                key: q.key.clone(),
                text: q.text.clone(),
                choice,
                choice_label: label(&q.options, choice),
                correct_choice,
                correct_label: label(&q.options, correct_choice),
                outcome: Outcome::compare(choice, correct_choice),
            }
        })
        .collect();

    let guess = entry.tiebreaker;
    let actual = master.and_then(|m| m.tiebreaker);
    let tiebreaker = TiebreakerResult {
        guess,
        actual,
        difference: guess.zip(actual).map(|(g, a)| (g - a).abs()),
        outcome: Outcome::compare(guess, actual),
    };

    Scorecard {
        score: score(catalog, entry, master),
        total: catalog.len(),
        decided: questions
            .iter()
            .filter(|q| q.correct_choice.is_some())
            .count(),
        questions,
        tiebreaker,
    }
}
