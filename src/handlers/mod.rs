//! The HTTP surface: JSON API under `/api`, the admin page, and static assets.

mod admin;
mod entries;
pub mod responses;

use crate::config::Settings;
use crate::db::EntryStore;
use crate::models::Catalog;
use log::{info, warn};
use responses::{ApiError, ApiErrorKind, api_error, not_found_error};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::fs::FileServer;
use rocket::http::Status;
use rocket::request::Request;
use rocket::response::Response;
use rocket::{Build, Rocket, catch, catchers, routes};
use std::sync::Arc;
use std::time::Instant;

/// Shared handle to the entry store, managed by Rocket.
pub type Store = Arc<dyn EntryStore>;

/// Assemble the server. Nothing is bound until the returned instance is launched.
pub fn build(settings: &Settings, catalog: Catalog, store: Store) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("address", settings.address))
        .merge(("port", settings.port));

    let rocket = rocket::custom(figment)
        .manage(store)
        .manage(catalog)
        .manage(settings.clone())
        .attach(RequestLogger)
        .mount(
            "/api",
            routes![
                entries::submit,
                entries::entry,
                entries::score,
                entries::scores,
                entries::questions
            ],
        )
        .mount("/api/admin", routes![admin::get_master, admin::save_master])
        .mount(settings.admin_path.as_str(), routes![admin::admin_page])
        .register("/", catchers![not_found, default_catcher]);

    if settings.static_dir.is_dir() {
        info!("Serving static files from {}", settings.static_dir.display());
        rocket.mount("/", FileServer::from(&settings.static_dir))
    } else {
        warn!(
            "Static directory {} not found, serving the API only",
            settings.static_dir.display()
        );
        rocket
    }
}

#[derive(Clone, Copy)]
pub struct RequestLogger;

#[rocket::async_trait]
impl Fairing for RequestLogger {
    fn info(&self) -> Info {
        Info {
            name: "Request logger",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _data: &mut rocket::Data<'_>) {
        request.local_cache(Instant::now);
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let started_at = request.local_cache(Instant::now);
        info!(
            "{} {} -> {} in {}ms",
            request.method(),
            request.uri(),
            response.status().code,
            started_at.elapsed().as_millis()
        );
    }
}

#[catch(404)]
fn not_found(request: &Request) -> ApiError {
    not_found_error(format!("Nothing found at {}.", request.uri().path()))
}

#[catch(default)]
fn default_catcher(status: Status, _request: &Request) -> ApiError {
    let kind = if status.code >= 500 {
        ApiErrorKind::Internal
    } else {
        ApiErrorKind::BadRequest
    };
    api_error(status, kind, status.reason().unwrap_or("Request failed."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use rocket::http::ContentType;
    use rocket::local::asynchronous::{Client, LocalResponse};
    use serde_json::{Value, json};
    use std::path::PathBuf;

    async fn client_with(static_dir: PathBuf) -> Client {
        let settings = Settings {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            static_dir,
            ..Settings::default()
        };
        let db = Database::connect(&settings.database_url, settings.max_connections)
            .await
            .unwrap();
        Client::untracked(build(&settings, Catalog::builtin(), Arc::new(db)))
            .await
            .unwrap()
    }

    async fn client() -> Client {
        client_with(PathBuf::from("/nonexistent/static")).await
    }

    fn answers(value: u8) -> Value {
        let map: serde_json::Map<String, Value> = Catalog::builtin()
            .keys()
            .map(|k| (k.to_string(), json!(value)))
            .collect();
        Value::Object(map)
    }

    async fn post_json<'c>(client: &'c Client, uri: &'static str, body: &Value) -> LocalResponse<'c> {
        client
            .post(uri)
            .header(ContentType::JSON)
            .body(body.to_string())
            .dispatch()
            .await
    }

    async fn submit(client: &Client, name: &str, answers: Value, tiebreaker: Value) -> String {
        let response = post_json(
            client,
            "/api/submit",
            &json!({"name": name, "answers": answers, "tiebreaker": tiebreaker}),
        )
        .await;
        assert_eq!(response.status(), Status::Ok);
        let body: Value = response.into_json().await.unwrap();
        body["entry_id"].as_str().unwrap().to_string()
    }

    async fn error_message(response: LocalResponse<'_>) -> String {
        let body: Value = response.into_json().await.unwrap();
        body["message"].as_str().unwrap().to_string()
    }

    #[rocket::async_test]
    async fn submission_can_be_fetched_back() {
        let client = client().await;
        let entry_id = submit(&client, "  Amy  ", answers(1), json!("87.5")).await;

        let response = client.get(format!("/api/entry/{}", entry_id)).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["entry"]["name"], "Amy");
        assert_eq!(body["entry"]["is_master"], false);
        assert_eq!(body["entry"]["answers"]["question_19"], 1);
        assert_eq!(body["entry"]["tiebreaker"], 87.5);
    }

    #[rocket::async_test]
    async fn score_is_pending_without_master() {
        let client = client().await;
        let entry_id = submit(&client, "Amy", answers(0), json!(10)).await;

        let response = client.get(format!("/api/score/{}", entry_id)).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["master"], Value::Null);
        assert_eq!(body["scorecard"]["score"], Value::Null);
        assert_eq!(body["scorecard"]["total"], 19);
        assert_eq!(body["scorecard"]["questions"][0]["outcome"], "pending");
        assert_eq!(body["scorecard"]["tiebreaker"]["outcome"], "pending");
    }

    #[rocket::async_test]
    async fn submission_validation_errors() {
        let client = client().await;

        let response = post_json(
            &client,
            "/api/submit",
            &json!({"name": " ", "answers": answers(1), "tiebreaker": 1}),
        )
        .await;
        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(error_message(response).await, "name is required.");

        let mut partial = answers(1);
        partial.as_object_mut().unwrap().remove("question_5");
        let response = post_json(
            &client,
            "/api/submit",
            &json!({"name": "Amy", "answers": partial, "tiebreaker": 1}),
        )
        .await;
        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(error_message(response).await, "question_5 is required.");

        let mut bad = answers(1);
        bad["question_6"] = json!(4);
        let response = post_json(
            &client,
            "/api/submit",
            &json!({"name": "Amy", "answers": bad, "tiebreaker": 1}),
        )
        .await;
        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(error_message(response).await, "Invalid answer for question_6.");

        let response = post_json(&client, "/api/submit", &json!({"name": "Amy", "answers": answers(1)})).await;
        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(error_message(response).await, "tiebreaker is required.");

        // Nothing was persisted by any of the rejected requests
        let body: Value = client.get("/api/scores").dispatch().await.into_json().await.unwrap();
        assert_eq!(body["entries"], json!([]));
    }

    #[rocket::async_test]
    async fn malformed_bodies_are_rejected() {
        let client = client().await;

        let response = client
            .post("/api/submit")
            .header(ContentType::JSON)
            .body("{not json")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);

        let response = post_json(
            &client,
            "/api/submit",
            &json!({"name": "Amy", "answers": answers(1), "tiebreaker": 1, "admin": true}),
        )
        .await;
        assert_eq!(response.status(), Status::BadRequest);

        let response = post_json(
            &client,
            "/api/submit",
            &json!({"name": "Amy", "answers": [1, 0], "tiebreaker": 1}),
        )
        .await;
        assert_eq!(response.status(), Status::BadRequest);
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["error"], "bad_request");
    }

    #[rocket::async_test]
    async fn unknown_entry_is_not_found() {
        let client = client().await;
        for uri in ["/api/entry/missing", "/api/score/missing"] {
            let response = client.get(uri).dispatch().await;
            assert_eq!(response.status(), Status::NotFound);
            let body: Value = response.into_json().await.unwrap();
            assert_eq!(body["error"], "not_found");
        }
    }

    #[rocket::async_test]
    async fn empty_master_save_is_rejected() {
        let client = client().await;
        for body in [json!({}), json!({"answers": {}, "tiebreaker": ""}), json!({"answers": null})] {
            let response = post_json(&client, "/api/admin/master", &body).await;
            assert_eq!(response.status(), Status::BadRequest);
            assert_eq!(error_message(response).await, "No updates provided.");
        }

        let body: Value = client.get("/api/admin/master").dispatch().await.into_json().await.unwrap();
        assert_eq!(body["master"], Value::Null);
    }

    #[rocket::async_test]
    async fn master_saves_merge() {
        let client = client().await;

        let response = post_json(
            &client,
            "/api/admin/master",
            &json!({"answers": {"question_1": 0, "question_2": "1"}, "tiebreaker": 100}),
        )
        .await;
        assert_eq!(response.status(), Status::Ok);

        let response = post_json(&client, "/api/admin/master", &json!({"answers": {"question_1": 1}})).await;
        assert_eq!(response.status(), Status::Ok);
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["ok"], true);

        let body: Value = client.get("/api/admin/master").dispatch().await.into_json().await.unwrap();
        let master = &body["master"];
        assert_eq!(master["entry_id"], "MASTER_SHEET");
        assert_eq!(master["answers"], json!({"question_1": 1, "question_2": 1}));
        assert_eq!(master["tiebreaker"], 100.0);
    }

    #[rocket::async_test]
    async fn master_save_rejects_unknown_questions() {
        let client = client().await;
        let response = post_json(&client, "/api/admin/master", &json!({"answers": {"question_42": 1}})).await;
        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(error_message(response).await, "Unknown question question_42.");
    }

    #[rocket::async_test]
    async fn scoreboard_ranks_once_master_exists() {
        let client = client().await;

        // Bob and Cid get 3 right, Amy gets 5, against a master deciding question_1..5 as 1
        let mut bob = answers(0);
        let mut amy = answers(0);
        let mut cid = answers(0);
        for i in 1..=3 {
            bob[format!("question_{}", i)] = json!(1);
            cid[format!("question_{}", i)] = json!(1);
        }
        for i in 1..=5 {
            amy[format!("question_{}", i)] = json!(1);
        }
        submit(&client, "Bob", bob, json!(1)).await;
        submit(&client, "Amy", amy, json!(2)).await;
        submit(&client, "Cid", cid, json!(3)).await;

        let body: Value = client.get("/api/scores").dispatch().await.into_json().await.unwrap();
        let names: Vec<&str> = body["leaderboard"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Bob", "Amy", "Cid"]);
        assert_eq!(body["leaderboard"][0]["score"], Value::Null);

        let decided: serde_json::Map<String, Value> =
            (1..=5).map(|i| (format!("question_{}", i), json!(1))).collect();
        let response = post_json(&client, "/api/admin/master", &json!({"answers": decided})).await;
        assert_eq!(response.status(), Status::Ok);

        let body: Value = client.get("/api/scores").dispatch().await.into_json().await.unwrap();
        let board: Vec<(String, u64, u64)> = body["leaderboard"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| {
                (
                    s["name"].as_str().unwrap().to_string(),
                    s["score"].as_u64().unwrap(),
                    s["rank"].as_u64().unwrap(),
                )
            })
            .collect();
        assert_eq!(
            board,
            vec![
                ("Amy".to_string(), 5, 1),
                ("Bob".to_string(), 3, 2),
                ("Cid".to_string(), 3, 2)
            ]
        );
        assert_eq!(body["entries"].as_array().unwrap().len(), 3);
        assert_eq!(body["total_questions"], 19);
        assert_eq!(body["master"]["is_master"], true);
    }

    #[rocket::async_test]
    async fn catalog_is_served() {
        let client = client().await;
        let body: Value = client.get("/api/questions").dispatch().await.into_json().await.unwrap();
        assert_eq!(body["questions"].as_array().unwrap().len(), 19);
        assert_eq!(body["questions"][1]["options"], json!(["Heads", "Tails"]));
        assert!(body["tiebreaker_label"].as_str().unwrap().contains("rushing yards"));
    }

    #[rocket::async_test]
    async fn admin_page_comes_from_static_dir() {
        let dir = std::env::temp_dir().join(format!("pool-sheet-static-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(admin::ADMIN_PAGE), "<h1>Master sheet</h1>").unwrap();
        std::fs::write(dir.join("index.html"), "<h1>Entry form</h1>").unwrap();

        let client = client_with(dir.clone()).await;
        let response = client.get("/admin-7f3c2d").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.into_string().await.unwrap(), "<h1>Master sheet</h1>");

        let response = client.get("/").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.into_string().await.unwrap(), "<h1>Entry form</h1>");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[rocket::async_test]
    async fn unknown_routes_get_json_errors() {
        let client = client().await;
        let response = client.get("/admin-7f3c2d").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);

        let response = client.get("/api/nowhere").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
        assert_eq!(response.content_type(), Some(ContentType::JSON));
    }
}
