//! End-to-end tests for rule file creation, replacement and deletion.

use serde_json::{json, Value};

mod common;
use common::Harness;

const INITIAL: &str = "global:\n  scrape_interval: 15s\nrule_files:\n  - rules/*.yml\n";

fn alert_rule(threshold: f64) -> Value {
    json!({
        "groups": [{
            "name": "latency",
            "rules": [{
                "alert": "HighLatency",
                "expr": format!("job:request_latency_seconds:mean5m > {threshold}"),
                "for": "10m",
                "labels": {"severity": "page"}
            }]
        }]
    })
}

#[tokio::test]
async fn test_create_rule_commits_generated_file() {
    let harness = Harness::start(INITIAL).await;

    let res = harness
        .client
        .post(harness.url("/api/v1/rules"))
        .json(&alert_rule(0.5))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "The rule was created successfully");

    let file = body["file"].as_str().unwrap();
    assert!(file.ends_with(".yml"));
    assert_eq!(harness.rule_files(), vec![file.to_string()]);
    assert_eq!(harness.prometheus.reload_count(), 1);

    let written: serde_yaml::Value =
        serde_yaml::from_str(&std::fs::read_to_string(harness.rule_path(file)).unwrap()).unwrap();
    assert_eq!(written["groups"][0]["name"], serde_yaml::Value::from("latency"));
}

#[tokio::test]
async fn test_invalid_rule_is_rejected_without_writing() {
    let harness = Harness::start(INITIAL).await;

    let res = harness
        .client
        .post(harness.url("/api/v1/rules"))
        .json(&json!({"groups": [{"name": "broken", "rules": [{"alert": "NoExpr"}]}]}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "error");

    assert!(harness.rule_files().is_empty());
    assert_eq!(harness.prometheus.reload_count(), 0);
}

#[tokio::test]
async fn test_failed_reload_removes_new_rule_file() {
    let harness = Harness::start(INITIAL).await;
    harness
        .prometheus
        .fail_reloads(500, "failed to reload config: parse error in rule file");

    let res = harness
        .client
        .post(harness.url("/api/v1/rules"))
        .json(&alert_rule(0.5))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "failed to reload config: parse error in rule file");

    assert!(harness.rule_files().is_empty());
}

#[tokio::test]
async fn test_replace_existing_rule() {
    let harness = Harness::start(INITIAL).await;

    let res = harness
        .client
        .put(harness.url("/api/v1/rules/latency.yml"))
        .json(&alert_rule(0.5))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);

    let res = harness
        .client
        .put(harness.url("/api/v1/rules/latency.yml"))
        .json(&alert_rule(0.9))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["file"], "latency.yml");

    let shown: Value = harness
        .client
        .get(harness.url("/api/v1/rules/latency.yml"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(shown, alert_rule(0.9));
}

#[tokio::test]
async fn test_failed_reload_restores_replaced_rule() {
    let harness = Harness::start(INITIAL).await;

    let res = harness
        .client
        .put(harness.url("/api/v1/rules/latency.yml"))
        .json(&alert_rule(0.5))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    let committed = std::fs::read_to_string(harness.rule_path("latency.yml")).unwrap();

    harness.prometheus.fail_reloads(500, "failed to reload config");
    let res = harness
        .client
        .put(harness.url("/api/v1/rules/latency.yml"))
        .json(&alert_rule(0.9))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);

    assert_eq!(
        std::fs::read_to_string(harness.rule_path("latency.yml")).unwrap(),
        committed
    );
}

#[tokio::test]
async fn test_rule_names_must_be_single_component() {
    let harness = Harness::start(INITIAL).await;
    let res = harness
        .client
        .put(harness.url("/api/v1/rules/.hidden.yml"))
        .json(&alert_rule(0.5))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    assert!(harness.rule_files().is_empty());
}

#[tokio::test]
async fn test_delete_rule() {
    let harness = Harness::start(INITIAL).await;
    std::fs::write(harness.rule_path("old.yml"), "groups: []\n").unwrap();

    let res = harness
        .client
        .delete(harness.url("/api/v1/rules/old.yml"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 204);
    assert!(!harness.rule_path("old.yml").exists());
    assert_eq!(harness.prometheus.reload_count(), 1);

    let res = harness
        .client
        .delete(harness.url("/api/v1/rules/old.yml"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "File not found");
}

#[tokio::test]
async fn test_failed_reload_after_delete_does_not_restore() {
    let harness = Harness::start(INITIAL).await;
    std::fs::write(harness.rule_path("old.yml"), "groups: []\n").unwrap();
    harness.prometheus.fail_reloads(503, "reload unavailable");

    let res = harness
        .client
        .delete(harness.url("/api/v1/rules/old.yml"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 503);
    assert!(!harness.rule_path("old.yml").exists());
}

#[tokio::test]
async fn test_list_rules() {
    let harness = Harness::start(INITIAL).await;
    std::fs::write(harness.rule_path("b.yml"), "groups: []\n").unwrap();
    std::fs::write(harness.rule_path("a.yml"), "groups: []\n").unwrap();

    let listed: Value = harness
        .client
        .get(harness.url("/api/v1/rules"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        listed,
        json!([{"file": "a.yml", "size": 11}, {"file": "b.yml", "size": 11}])
    );
}

#[tokio::test]
async fn test_failed_reload_names_the_rolled_back_file() {
    let harness = Harness::start(INITIAL).await;
    harness.prometheus.fail_reloads(500, "failed to reload config");

    let res = harness
        .client
        .post(harness.url("/api/v1/rules"))
        .json(&alert_rule(0.5))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
    let body: Value = res.json().await.unwrap();
    let file = body["file"].as_str().unwrap();
    assert!(file.ends_with(".yml"));
    assert!(!harness.rule_path(file).exists());
}

#[tokio::test]
async fn test_timed_out_request_still_rolls_back() {
    // The request deadline expires during the settle delay.
    let harness = Harness::start_with(INITIAL, |config| {
        config.timeouts.request_secs = 1;
        config.rules.settle_delay_ms = 2000;
    })
    .await;
    harness.prometheus.fail_reloads(500, "failed to reload config");

    let res = harness
        .client
        .post(harness.url("/api/v1/rules"))
        .json(&alert_rule(0.5))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 408);

    for _ in 0..50 {
        if harness.prometheus.reload_count() > 0 && harness.rule_files().is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    assert_eq!(harness.prometheus.reload_count(), 1);
    assert!(harness.rule_files().is_empty(), "{:?}", harness.rule_files());
}

#[cfg(unix)]
#[tokio::test]
async fn test_new_rule_file_is_world_readable() {
    use std::os::unix::fs::PermissionsExt;

    let harness = Harness::start(INITIAL).await;
    let res = harness
        .client
        .put(harness.url("/api/v1/rules/x.yml"))
        .json(&alert_rule(0.5))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);

    let mode = std::fs::metadata(harness.rule_path("x.yml")).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o644);
}
