//! End-to-end tests against the running server.

use chrono::{Duration, Utc};
use weathercast::config::AppConfig;
use weathercast::http::forecast::SUMMARIES;

mod common;

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn weatherforecast_returns_five_records_in_order() {
    let mut config = AppConfig::default();
    config.forecast.seed = Some(42);
    let (addr, log) = common::start_server(config).await;

    let response = client()
        .get(format!("http://{}/weatherforecast", addr))
        .send()
        .await
        .expect("server reachable");
    assert_eq!(response.status(), 200);
    assert!(response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .starts_with("application/json"));

    let records: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(records.len(), 5);

    let today = Utc::now().date_naive();
    for (i, record) in records.iter().enumerate() {
        let expected = (today + Duration::days(i as i64 + 1)).to_string();
        assert_eq!(record["date"], expected);

        let celsius = record["temperatureC"].as_i64().unwrap();
        assert!((-20..=54).contains(&celsius));
        assert!(record["temperatureF"].is_i64());
        assert!(SUMMARIES.contains(&record["summary"].as_str().unwrap()));
    }

    log.flush_and_close().await;
}

#[tokio::test]
async fn fixed_seed_yields_identical_first_response() {
    let mut config = AppConfig::default();
    config.forecast.seed = Some(42);
    let (addr_a, log_a) = common::start_server(config.clone()).await;
    let (addr_b, log_b) = common::start_server(config).await;

    let a: Vec<serde_json::Value> = client()
        .get(format!("http://{}/weatherforecast", addr_a))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let b: Vec<serde_json::Value> = client()
        .get(format!("http://{}/weatherforecast", addr_b))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x["temperatureC"], y["temperatureC"]);
        assert_eq!(x["summary"], y["summary"]);
    }

    log_a.flush_and_close().await;
    log_b.flush_and_close().await;
}

#[tokio::test]
async fn days_parameter_controls_record_count() {
    let (addr, log) = common::start_server(AppConfig::default()).await;

    let records: Vec<serde_json::Value> = client()
        .get(format!("http://{}/weatherforecast?days=2", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(records.len(), 2);

    log.flush_and_close().await;
}

#[tokio::test]
async fn invalid_days_parameter_is_translated_to_400() {
    // The fault raised inside the handler crosses the middleware and comes
    // back as the uniform JSON error shape, logged once at Error.
    let dir = common::temp_log_dir("endpoint-bad-days");
    let mut config = AppConfig::default();
    config.logging.sinks = vec![common::file_sink(&dir)];
    let (addr, log) = common::start_server(config).await;

    let response = client()
        .get(format!("http://{}/weatherforecast?days=zero", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "days must be an integer between 1 and 14");

    log.flush_and_close().await;
    let lines = common::read_log_lines(&dir);
    let errors: Vec<_> = lines
        .iter()
        .filter(|line| line["level"] == "error")
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["fault"]["kind"], "invalid_argument");

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let (addr, log) = common::start_server(AppConfig::default()).await;

    let response = client()
        .get(format!("http://{}/nope", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    log.flush_and_close().await;
}

#[tokio::test]
async fn health_probe_responds() {
    let (addr, log) = common::start_server(AppConfig::default()).await;

    let response = client()
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "ok");

    log.flush_and_close().await;
}

#[tokio::test]
async fn request_received_event_reaches_the_file_sink() {
    let dir = common::temp_log_dir("endpoint-log");
    let mut config = AppConfig::default();
    config.logging.sinks = vec![common::file_sink(&dir)];
    let (addr, log) = common::start_server(config).await;

    client()
        .get(format!("http://{}/weatherforecast", addr))
        .send()
        .await
        .unwrap();

    log.flush_and_close().await;
    let lines = common::read_log_lines(&dir);
    assert!(lines
        .iter()
        .any(|line| line["message"] == "request received"
            && line["properties"]["path"] == "/weatherforecast"));

    std::fs::remove_dir_all(&dir).ok();
}
