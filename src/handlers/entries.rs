use super::Store;
use super::responses::{ApiResult, bad_request_error};
use crate::error::PoolError;
use crate::models::{Catalog, Entry};
use crate::scoring::validate::{validate_complete, validate_name, validate_tiebreaker};
use crate::scoring::{Scorecard, Standing, build_leaderboard, scorecard};
use log::info;
use rocket::State;
use rocket::serde::json::{self, Json};
use rocket::{get, post};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitRequest {
    name: Option<String>,
    answers: Option<Map<String, Value>>,
    tiebreaker: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub entry_id: String,
}

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub entry: Entry,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub entry: Entry,
    pub master: Option<Entry>,
    pub scorecard: Scorecard,
}

#[derive(Debug, Serialize)]
pub struct ScoreboardResponse {
    pub entries: Vec<Entry>,
    pub master: Option<Entry>,
    pub leaderboard: Vec<Standing>,
    pub total_questions: usize,
}

#[post("/submit", data = "<body>")]
pub async fn submit(
    store: &State<Store>,
    catalog: &State<Catalog>,
    body: Result<Json<SubmitRequest>, json::Error<'_>>,
) -> ApiResult<SubmitResponse> {
    let body = body
        .map_err(|e| bad_request_error(format!("Malformed request body: {}", e)))?
        .into_inner();

    let name = validate_name(body.name.as_deref())?;
    let raw_answers = body
        .answers
        .as_ref()
        .ok_or_else(|| PoolError::MissingField("answers".to_string()))?;
    let answers = validate_complete(catalog, raw_answers)?;
    let tiebreaker = validate_tiebreaker(body.tiebreaker.as_ref())?;

    let entry = Entry::new(name, answers, tiebreaker);
    store.insert_entry(&entry).await?;
    info!("Saved entry {} for {}", entry.entry_id, entry.name);

    Ok(Json(SubmitResponse {
        entry_id: entry.entry_id,
    }))
}

#[get("/entry/<entry_id>")]
pub async fn entry(store: &State<Store>, entry_id: &str) -> ApiResult<EntryResponse> {
    let entry = find_entry(store, entry_id).await?;
    Ok(Json(EntryResponse { entry }))
}

#[get("/score/<entry_id>")]
pub async fn score(
    store: &State<Store>,
    catalog: &State<Catalog>,
    entry_id: &str,
) -> ApiResult<ScoreResponse> {
    let entry = find_entry(store, entry_id).await?;
    let master = store.get_master().await?;
    let scorecard = scorecard(catalog, &entry, master.as_ref());
    Ok(Json(ScoreResponse {
        entry,
        master,
        scorecard,
    }))
}

#[get("/scores")]
pub async fn scores(store: &State<Store>, catalog: &State<Catalog>) -> ApiResult<ScoreboardResponse> {
    // Master first: an entry submitted in between still shows up, just unscored
    let master = store.get_master().await?;
    let entries = store.list_entries().await?;
    let leaderboard = build_leaderboard(catalog, &entries, master.as_ref());
    Ok(Json(ScoreboardResponse {
        entries,
        master,
        leaderboard,
        total_questions: catalog.len(),
    }))
}

#[get("/questions")]
pub fn questions(catalog: &State<Catalog>) -> Json<Catalog> {
    Json(catalog.inner().clone())
}

async fn find_entry(store: &Store, entry_id: &str) -> Result<Entry, PoolError> {
    store
        .get_entry(entry_id)
        .await?
        .ok_or_else(|| PoolError::NotFound(entry_id.to_string()))
}
