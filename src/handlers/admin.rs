use super::Store;
use super::responses::{ApiResult, bad_request_error};
use crate::config::Settings;
use crate::models::{Catalog, Entry};
use crate::scoring::validate::validate_master_update;
use log::{info, warn};
use rocket::State;
use rocket::fs::NamedFile;
use rocket::serde::json::{self, Json};
use rocket::{get, post};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ADMIN_PAGE: &str = "admin.html";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MasterRequest {
    answers: Option<Map<String, Value>>,
    tiebreaker: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct MasterResponse {
    pub master: Option<Entry>,
}

#[derive(Debug, Serialize)]
pub struct SaveMasterResponse {
    pub ok: bool,
    pub master: Entry,
}

#[get("/master")]
pub async fn get_master(store: &State<Store>) -> ApiResult<MasterResponse> {
    let master = store.get_master().await?;
    Ok(Json(MasterResponse { master }))
}

#[post("/master", data = "<body>")]
pub async fn save_master(
    store: &State<Store>,
    catalog: &State<Catalog>,
    body: Result<Json<MasterRequest>, json::Error<'_>>,
) -> ApiResult<SaveMasterResponse> {
    let body = body
        .map_err(|e| bad_request_error(format!("Malformed request body: {}", e)))?
        .into_inner();

    let update = validate_master_update(catalog, body.answers.as_ref(), body.tiebreaker.as_ref())?;
    let master = store.save_master(&update).await?;
    info!(
        "Master sheet saved: {} question(s) changed, tiebreaker {}, {} decided",
        update.answers.len(),
        if update.tiebreaker.is_some() { "changed" } else { "kept" },
        master.answers.len()
    );

    Ok(Json(SaveMasterResponse { ok: true, master }))
}

/// The admin form, mounted at the configured secret path.
#[get("/")]
pub async fn admin_page(settings: &State<Settings>) -> Option<NamedFile> {
    let path = settings.static_dir.join(ADMIN_PAGE);
    match NamedFile::open(&path).await {
        Ok(file) => Some(file),
        Err(e) => {
            warn!("Admin page {} unavailable: {}", path.display(), e);
            None
        }
    }
}
