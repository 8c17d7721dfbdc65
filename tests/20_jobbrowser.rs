mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{Calls, MockJobs};
use hue_gateway::backend::ProfileOutput;
use hue_gateway::config::GatewayConfig;
use hue_gateway::Backends;

async fn server_with(config: GatewayConfig, jobs: MockJobs) -> (common::TestServer, Calls) {
    let selectors = Calls::default();
    let backends = common::with_jobs(Backends::new(), jobs, selectors.clone());
    (common::spawn(config, backends).await, selectors)
}

#[tokio::test]
async fn jobs_drop_empty_filters_before_dispatch() -> Result<()> {
    let jobs = MockJobs {
        apps: vec![json!({"id": "job_1"}), json!({"id": "job_2"})],
        total: Some(json!(2)),
        ..MockJobs::default()
    };
    let calls = jobs.calls.clone();
    let (server, selectors) = server_with(GatewayConfig::development(), jobs).await;

    let body = server
        .post_form_json(
            "/jobbrowser/api/jobs",
            &[
                ("interface", "\"jobs\""),
                ("cluster", r#"{"id": "c1"}"#),
                ("filters", r#"[{"text": ""}, {"states": ["running"]}, {"user": "alice"}, {"time": null}]"#),
            ],
        )
        .await;

    assert_eq!(body["status"], 0, "unexpected body: {}", body);
    assert!(body.get("message").is_none());
    assert_eq!(body["apps"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["total"], 2);

    let filters = calls.named("apps");
    assert_eq!(filters, vec![json!({"states": ["running"], "user": "alice"})]);

    let constructed = selectors.named("construct");
    assert_eq!(constructed[0]["user"], common::ALICE);
    assert_eq!(constructed[0]["interface"], "jobs");
    assert_eq!(constructed[0]["cluster"], json!({"id": "c1"}));
    Ok(())
}

#[tokio::test]
async fn hive_queries_take_raw_body_and_return_bare_apps() -> Result<()> {
    let jobs = MockJobs {
        apps: vec![json!({"queryId": "q1"})],
        ..MockJobs::default()
    };
    let calls = jobs.calls.clone();
    let (server, _) = server_with(GatewayConfig::development(), jobs).await;

    let res = server
        .client
        .post(server.url("/jobbrowser/api/jobs/queries-hive"))
        .json(&json!({"text": "select", "limit": 10}))
        .send()
        .await?;
    let body: Value = res.json().await?;

    assert_eq!(body, json!([{"queryId": "q1"}]));
    assert_eq!(calls.named("apps"), vec![json!({"text": "select", "limit": 10})]);
    Ok(())
}

#[tokio::test]
async fn schedules_forward_default_offset() -> Result<()> {
    let jobs = MockJobs {
        app: json!({"id": "sched_1", "status": "RUNNING"}),
        ..MockJobs::default()
    };
    let calls = jobs.calls.clone();
    let (server, _) = server_with(GatewayConfig::development(), jobs).await;

    let body = server
        .post_form_json("/jobbrowser/api/job/schedules", &[("app_id", "\"sched_1\"")])
        .await;
    assert_eq!(body["status"], 0);
    assert_eq!(body["app"]["id"], "sched_1");

    server
        .post_form_json(
            "/jobbrowser/api/job",
            &[("interface", "\"jobs\""), ("app_id", "\"job_1\""), ("pagination", r#"{"offset": 5}"#)],
        )
        .await;

    let lookups = calls.named("app");
    assert_eq!(lookups[0], json!({"app_id": "sched_1", "offset": 1}));
    assert_eq!(lookups[1], json!({"app_id": "job_1", "offset": null}));
    Ok(())
}

#[tokio::test]
async fn backend_failure_document_is_returned_as_is() -> Result<()> {
    let jobs = MockJobs {
        app: json!({"status": -1, "message": "Query q9 not found"}),
        ..MockJobs::default()
    };
    let (server, _) = server_with(GatewayConfig::development(), jobs).await;

    let body = server
        .post_form_json("/jobbrowser/api/job/jobs", &[("app_id", "\"q9\"")])
        .await;
    assert_eq!(body["status"], -1);
    assert_eq!(body["message"], "Query q9 not found");
    assert!(body.get("app").is_none());
    Ok(())
}

#[tokio::test]
async fn kill_is_forbidden_when_disabled() -> Result<()> {
    let jobs = MockJobs::default();
    let calls = jobs.calls.clone();
    let (server, selectors) = server_with(GatewayConfig::production(), jobs).await;

    let res = server
        .post_form(
            "/jobbrowser/api/job/action/jobs/kill",
            &[
                ("interface", "\"jobs\""),
                ("app_ids", r#"["job_1"]"#),
                ("operation", r#"{"action": "kill"}"#),
            ],
        )
        .await;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], true);
    assert!(calls.is_empty(), "backend was called: {:?}", calls.all());
    assert!(selectors.is_empty(), "backend was constructed: {:?}", selectors.all());
    Ok(())
}

#[tokio::test]
async fn action_status_comes_from_backend_result() -> Result<()> {
    let jobs = MockJobs {
        action_result: common::object(json!({"status": 0, "message": "", "killed": ["job_1"]})),
        ..MockJobs::default()
    };
    let calls = jobs.calls.clone();
    let (server, _) = server_with(GatewayConfig::development(), jobs).await;

    let body = server
        .post_form_json(
            "/jobbrowser/api/job/action",
            &[
                ("interface", "\"jobs\""),
                ("app_ids", r#"["job_1"]"#),
                ("operation", r#"{"action": "kill"}"#),
            ],
        )
        .await;

    assert_eq!(body["status"], 0, "unexpected body: {}", body);
    assert_eq!(body["operation"], json!({"action": "kill"}));
    assert_eq!(body["killed"], json!(["job_1"]));
    assert_eq!(calls.named("action")[0]["app_ids"], json!(["job_1"]));
    Ok(())
}

#[tokio::test]
async fn backend_errors_become_failure_envelopes() -> Result<()> {
    let jobs = MockJobs {
        fail: Some("ResourceManager unreachable".to_string()),
        ..MockJobs::default()
    };
    let (server, _) = server_with(GatewayConfig::development(), jobs).await;

    let res = server
        .post_form("/jobbrowser/api/jobs", &[("interface", "\"workflows\"")])
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], -1);
    assert_eq!(body["message"], "ResourceManager unreachable");
    Ok(())
}

#[tokio::test]
async fn unknown_interface_and_missing_fields_are_rejected() -> Result<()> {
    let (server, selectors) = server_with(GatewayConfig::development(), MockJobs::default()).await;

    let unknown = server
        .post_form_json("/jobbrowser/api/jobs", &[("interface", "\"yarn\"")])
        .await;
    assert_eq!(unknown["status"], -1);
    assert_eq!(unknown["message"], "Unknown interface: yarn");

    let missing = server.post_form_json("/jobbrowser/api/job/logs", &[("interface", "\"jobs\"")]).await;
    assert_eq!(missing["status"], -1);
    assert!(!missing["message"].as_str().unwrap_or_default().is_empty());

    assert!(selectors.is_empty());
    Ok(())
}

#[tokio::test]
async fn logs_read_embeddable_flag_from_query() -> Result<()> {
    let jobs = MockJobs::default();
    let calls = jobs.calls.clone();
    let (server, _) = server_with(GatewayConfig::development(), jobs).await;

    let body = server
        .post_form_json(
            "/jobbrowser/api/job/logs?is_embeddable=True",
            &[
                ("interface", "\"jobs\""),
                ("app_id", "\"job_1\""),
                ("type", "\"MAPREDUCE\""),
                ("name", "\"stdout\""),
            ],
        )
        .await;

    assert_eq!(body["status"], 0);
    assert_eq!(body["logs"], "stdout log of job_1");
    assert_eq!(calls.named("logs")[0]["is_embeddable"], true);
    Ok(())
}

#[tokio::test]
async fn profile_is_keyed_by_property_or_passed_through() -> Result<()> {
    let form = [
        ("interface", "\"queries-impala\""),
        ("app_id", "\"q1\""),
        ("app_type", "\"queries\""),
        ("app_property", "\"memory\""),
        ("app_filters", r#"[{"host": ""}, {"fragment": "F01"}]"#),
    ];

    let jobs = MockJobs::default();
    let calls = jobs.calls.clone();
    let (server, _) = server_with(GatewayConfig::development(), jobs).await;
    let body = server.post_form_json("/jobbrowser/api/job/profile", &form).await;
    assert_eq!(body["status"], 0);
    assert_eq!(body["memory"], json!({"tasks": []}));
    assert_eq!(calls.named("profile")[0]["app_filters"], json!({"fragment": "F01"}));

    let raw = MockJobs {
        profile: Some(ProfileOutput::Raw {
            content_type: "text/plain".to_string(),
            body: b"Query Timeline".to_vec(),
        }),
        ..MockJobs::default()
    };
    let (server, _) = server_with(GatewayConfig::development(), raw).await;
    let res = server.post_form("/jobbrowser/api/job/profile", &form).await;
    assert_eq!(res.headers()["content-type"], "text/plain");
    assert_eq!(res.text().await?, "Query Timeline");
    Ok(())
}

#[tokio::test]
async fn kill_is_forbidden_before_interface_is_resolved() -> Result<()> {
    let (server, selectors) = server_with(GatewayConfig::production(), MockJobs::default()).await;

    let res = server
        .post_form(
            "/jobbrowser/api/job/action/yarn/kill",
            &[("app_ids", r#"["job_1"]"#), ("operation", r#"{"action": "kill"}"#)],
        )
        .await;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "FORBIDDEN");
    assert!(selectors.is_empty());
    Ok(())
}
