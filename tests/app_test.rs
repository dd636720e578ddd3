mod common;

use std::sync::Arc;

use serde_json::json;

use common::*;
use qidian_job::clients::endpoints;
use qidian_job::infrastructure::{Pacer, RequestBody};
use qidian_job::models::loaders::{load_cookies, parse_config};
use qidian_job::models::{TaskKind, TaskOutcome};
use qidian_job::{App, Config};

#[tokio::test]
async fn test_app_runs_accounts_notifies_and_saves_cookies() {
    let dir = tempfile::tempdir().unwrap();
    let cookies_path = dir.path().join("reader.json");
    tokio::fs::write(
        &cookies_path,
        json!({"QDInfo": "raw-qdinfo", "qid": "qid-1"}).to_string(),
    )
    .await
    .unwrap();

    let content = format!(
        r#"
save_cookies = true

[[users]]
username = "reader"
cookies_file = "{cookies}"
user_agent = "{ua}"
ibex = "seed"

[users.tasks]
"签到任务" = true
"每日抽奖任务" = false

[[users.push_services]]
type = "serverchan"
sckey = "SCUkey"

[[users]]
username = "ghost"
cookies_file = "{missing}"
"#,
        cookies = cookies_path.display().to_string().replace('\\', "/"),
        ua = TEST_UA,
        missing = dir.path().join("missing.json").display().to_string().replace('\\', "/"),
    );
    let file_config = parse_config(&content, "config.toml").unwrap();
    let mut config = Config::resolve(&file_config.settings);
    config.retry_attempts = 3;

    let transport = ScriptedTransport::new();
    transport.route_json(
        endpoints::PROFILE,
        vec![json!({"Result": 0, "Data": {"Nickname": "书友"}})],
    );
    transport.route_json(endpoints::CHECKIN, vec![json!({"Result": -91002})]);
    transport.route_json("https://sc.ftqq.com/SCUkey.send", vec![json!({"errno": 0})]);

    let sleeper = Arc::new(RecordingSleeper::default());
    let app = App::with_components(
        config,
        file_config,
        transport.clone(),
        Arc::new(FakeSigner),
        ScriptedCaptchaOracle::new(vec![]),
        Pacer::new(sleeper),
    );

    let summary = app.run().await.unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.skipped, 1);
    let report = summary.report("reader").unwrap();
    assert_eq!(report.results, vec![(TaskKind::CheckIn, TaskOutcome::Success)]);

    let push = &transport.requests_to("https://sc.ftqq.com/SCUkey.send")[0];
    match &push.body {
        RequestBody::Form(pairs) => {
            assert!(pairs.contains(&("text".to_string(), "任务完成报告 - 1/1".to_string())));
        }
        other => panic!("unexpected body {:?}", other),
    }

    let saved = load_cookies(&cookies_path).await.unwrap();
    assert_eq!(saved.get("QDInfo").map(String::as_str), Some(FRESH_QDINFO));
}
