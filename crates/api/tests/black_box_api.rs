use std::sync::Arc;

use codecamp_api::app::{self, services::build_in_memory_services};
use codecamp_api::version::V1_1;
use codecamp_infra::{AppConfig, ConfigHandle};
use reqwest::StatusCode;
use serde_json::json;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over a seeded in-memory store, on an ephemeral port.
        let config = AppConfig::from_lookup(|_| None).expect("default config");
        let services = build_in_memory_services(true, Arc::new(ConfigHandle::fixed(config)));
        let app = app::build_app(Arc::new(services), V1_1);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn ala2024() -> serde_json::Value {
    json!({
        "name": "Alabama Code Camp",
        "moniker": "ALA2024",
        "eventDate": "2024-05-04T00:00:00",
        "length": 1,
        "venue": "Von Braun Center",
        "locationCityTown": "Huntsville",
        "locationStateProvince": "AL"
    })
}

fn new_talk(speaker_id: Option<i32>) -> serde_json::Value {
    let mut talk = json!({
        "title": "Async Rust in practice",
        "abstract": "Tasks, channels and cancellation without tears.",
        "level": 200
    });
    if let Some(id) = speaker_id {
        talk["speaker"] = json!({ "speakerId": id });
    }
    talk
}

#[tokio::test]
async fn health_is_ok() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn list_camps_returns_seeded_camp() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/api/camps")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["api-supported-versions"], "1.0, 1.1");

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body[0]["moniker"], "ATL2018");
    assert_eq!(body[0]["eventDate"], "2018-10-18T00:00:00");
    assert!(body[0]["talks"].as_array().unwrap().is_empty());

    let body: serde_json::Value = reqwest::get(srv.url("/api/camps?includeTalks=true"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body[0]["talks"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn get_camp_depends_on_api_version() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let v10: serde_json::Value = client
        .get(srv.url("/api/camps/ATL2018"))
        .header("X-Version", "1.0")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(v10["talks"].as_array().unwrap().is_empty());

    let v11: serde_json::Value = client
        .get(srv.url("/api/camps/ATL2018?ver=1.1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(v11["talks"].as_array().unwrap().len(), 2);
    assert_eq!(v11["talks"][0]["speaker"]["lastName"], "Wildermuth");

    let res = client
        .get(srv.url("/api/camps/ATL2018"))
        .header("X-Version", "3.0")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_by_date() {
    let srv = TestServer::spawn().await;

    let res = reqwest::get(srv.url("/api/camps/search?theDate=2018-10-18")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 1);

    let res = reqwest::get(srv.url("/api/camps/search?theDate=1999-01-01")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = reqwest::get(srv.url("/api/camps/search")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn camp_lifecycle() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // Create
    let res = client.post(srv.url("/api/camps")).json(&ala2024()).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.headers()["location"], "/api/camps/ALA2024");
    let created: serde_json::Value = res.json().await.unwrap();
    assert_eq!(created["name"], "Alabama Code Camp");

    // Same moniker again
    let res = client.post(srv.url("/api/camps")).json(&ala2024()).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Moniker in use");

    // Update keeps location lines the model leaves out
    let mut update = ala2024();
    update["length"] = json!(2);
    update.as_object_mut().unwrap().remove("venue");
    let res = client
        .put(srv.url("/api/camps/ALA2024"))
        .json(&update)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: serde_json::Value = res.json().await.unwrap();
    assert_eq!(updated["length"], 2);
    assert_eq!(updated["venue"], "Von Braun Center");

    // Delete, then it is gone
    let res = client.delete(srv.url("/api/camps/ALA2024")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(srv.url("/api/camps/ALA2024")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.delete(srv.url("/api/camps/ALA2024")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Could not find camp with moniker of ALA2024");
}

#[tokio::test]
async fn invalid_camp_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/camps"))
        .json(&json!({ "name": "", "moniker": "X", "length": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let mut spaced = ala2024();
    spaced["moniker"] = json!("ALA 2024");
    let res = client.post(srv.url("/api/camps")).json(&spaced).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Could not use current moniker");
}

#[tokio::test]
async fn talk_lifecycle() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/camps/ATL2018/talks"))
        .json(&new_talk(Some(1)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let location = res.headers()["location"].to_str().unwrap().to_string();
    let created: serde_json::Value = res.json().await.unwrap();
    let id = created["talkId"].as_i64().unwrap();
    assert_eq!(location, format!("/api/camps/ATL2018/talks/{id}"));

    let fetched: serde_json::Value = client
        .get(srv.url(&location))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["title"], "Async Rust in practice");
    assert_eq!(fetched["speaker"]["firstName"], "Shawn");

    // Reassign to a known speaker
    let res = client
        .put(srv.url(&location))
        .json(&new_talk(Some(2)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["speaker"]["firstName"], "Resa");

    // An unknown speaker leaves the current one in place
    let res = client
        .put(srv.url(&location))
        .json(&new_talk(Some(99)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["speaker"]["firstName"], "Resa");

    let res = client.delete(srv.url(&location)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(srv.url(&location)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn talk_create_gates() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let cases = [
        ("/api/camps/NOPE/talks", new_talk(Some(1)), "Camp does not exist"),
        ("/api/camps/ATL2018/talks", new_talk(None), "Speaker ID is required"),
        ("/api/camps/ATL2018/talks", new_talk(Some(99)), "Speaker could not be found"),
    ];
    for (path, talk, message) in cases {
        let res = client.post(srv.url(path)).json(&talk).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{message}");
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["message"], message);
    }

    let talks: serde_json::Value = reqwest::get(srv.url("/api/camps/ATL2018/talks"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(talks.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn talks_of_unknown_camp_are_empty() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/api/camps/NOPE/talks")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!([]));

    let res = reqwest::get(srv.url("/api/camps/ATL2018/talks/one")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_camp_removes_its_talks() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.delete(srv.url("/api/camps/ATL2018")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(srv.url("/api/camps/ATL2018/talks/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reload_config_over_options() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let res = client
        .request(reqwest::Method::OPTIONS, srv.url("/api/operations/reloadconfig"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "Configuration Reloaded");
}

#[tokio::test]
async fn created_camp_round_trips_through_its_location() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let mut submitted = ala2024();
    submitted["name"] = json!("Atlanta 2024");
    let res = client.post(srv.url("/api/camps")).json(&submitted).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let location = res.headers()["location"].to_str().unwrap().to_string();

    let res = client.get(srv.url(&location)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: serde_json::Value = res.json().await.unwrap();
    for (key, value) in submitted.as_object().unwrap() {
        assert_eq!(&fetched[key], value, "{key}");
    }
}

#[tokio::test]
async fn unknown_moniker_is_404_for_every_version() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    for version in ["1.0", "1.1"] {
        let res = client
            .get(srv.url("/api/camps/NOSUCHCAMP"))
            .header("X-Version", version)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{version}");
    }
}

#[tokio::test]
async fn unreadable_camp_body_is_a_json_400() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let mut bad_date = ala2024();
    bad_date["eventDate"] = json!("yesterday");
    let res = client.post(srv.url("/api/camps")).json(&bad_date).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.headers()["content-type"], "application/json");
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let res = client
        .post(srv.url("/api/camps"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "bad_request");

    let res = client.get(srv.url("/api/camps/ALA2024")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn encoded_version_query_is_honoured() {
    let srv = TestServer::spawn().await;
    let body: serde_json::Value = reqwest::get(srv.url("/api/camps/ATL2018?ver=1%2E0"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["talks"].as_array().unwrap().is_empty());
}
