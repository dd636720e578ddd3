mod common;

use serde_json::json;

use common::*;
use qidian_job::clients::{
    CaptchaOracle, HttpCaptchaOracle, HttpSigningOracle, OracleReply, SignContext, SignKind,
    SigningOracle,
};
use qidian_job::error::AppError;
use qidian_job::infrastructure::{HttpResponse, RequestBody};
use qidian_job::models::account::PushConfig;
use qidian_job::services::build_channel;

fn sign_ctx() -> SignContext {
    SignContext {
        timestamp: "1700000000000".to_string(),
        body: vec![("taskId".to_string(), "t1".to_string())],
        version: "7.9.384".to_string(),
        version_code: "1466".to_string(),
        qid: "qid-1".to_string(),
        user_id: "10001".to_string(),
    }
}

#[tokio::test]
async fn test_http_signing_oracle_reads_value() {
    let transport = ScriptedTransport::new();
    transport.route_json("http://signer/sign", vec![json!({"value": "signature"})]);
    transport.route_json("http://signer/ibex", vec![json!({"unexpected": 1})]);
    let oracle = HttpSigningOracle::new("http://signer/", transport.clone());

    let sign = oracle.sign(SignKind::Sdk, &sign_ctx()).await.unwrap();
    assert_eq!(sign, "signature");
    let request = &transport.requests_to("http://signer/sign")[0];
    match &request.body {
        RequestBody::Json(body) => {
            assert_eq!(body["kind"], "sdk");
            assert_eq!(body["body"]["taskId"], "t1");
        }
        other => panic!("unexpected body {:?}", other),
    }

    let err = oracle.device_integrity("1", "seed").await.unwrap_err();
    assert!(matches!(err, AppError::Oracle { .. }));
}

#[tokio::test]
async fn test_http_captcha_oracle_tri_state() {
    let transport = ScriptedTransport::new();
    transport.route(
        "http://captcha/solve",
        vec![
            json_response(json!(false)),
            json_response(json!(null)),
            json_response(json!({"code": 0, "ticket": "t", "randstr": "r"})),
        ],
    );
    let oracle = HttpCaptchaOracle::new("http://captcha/solve", transport.clone());

    assert_eq!(
        oracle.solve("token", "198420051", TEST_UA).await.unwrap(),
        OracleReply::Unsupported
    );
    assert_eq!(
        oracle.solve("token", "198420051", TEST_UA).await.unwrap(),
        OracleReply::Absent
    );
    assert!(matches!(
        oracle.solve("token", "198420051", TEST_UA).await.unwrap(),
        OracleReply::Reply(reply) if reply.code == 0
    ));
}

#[tokio::test]
async fn test_feishu_channel_signed_send() {
    let transport = ScriptedTransport::new();
    let url = "https://open.feishu.cn/open-apis/bot/v2/hook/abc";
    transport.route_json(url, vec![json!({"code": 0, "msg": "success"})]);
    let channel = build_channel(
        &PushConfig::Feishu {
            webhook_url: url.to_string(),
            havesign: true,
            secret: "secret".to_string(),
        },
        transport.clone(),
    )
    .unwrap();

    let receipt = channel.send("标题", "内容").await.unwrap();
    assert!(receipt.success);

    match &transport.requests_to(url)[0].body {
        RequestBody::Json(body) => {
            assert_eq!(body["msg_type"], "interactive");
            assert!(body["sign"].is_string());
            assert!(body["timestamp"].is_i64());
        }
        other => panic!("unexpected body {:?}", other),
    }
}

#[tokio::test]
async fn test_push_channel_non_2xx_is_error() {
    let transport = ScriptedTransport::new();
    let url = "https://qyapi.weixin.qq.com/cgi-bin/webhook/send?key=k";
    transport.route(
        url,
        vec![HttpResponse {
            status: 500,
            body: "oops".to_string(),
            ..Default::default()
        }],
    );
    let channel = build_channel(
        &PushConfig::Qiwei {
            webhook_url: url.to_string(),
            user_id: String::new(),
        },
        transport.clone(),
    )
    .unwrap();

    let err = channel.send("标题", "内容").await.unwrap_err();
    assert!(matches!(err, AppError::BadStatus { status: 500, .. }));
}

#[tokio::test]
async fn test_serverchan_reports_failure_from_errno() {
    let transport = ScriptedTransport::new();
    transport.route_json(
        "https://sc.ftqq.com/SCUkey.send",
        vec![json!({"errno": 1024, "errmsg": "bad key"})],
    );
    let channel = build_channel(
        &PushConfig::Serverchan {
            sckey: "SCUkey".to_string(),
        },
        transport.clone(),
    )
    .unwrap();

    let receipt = channel.send("标题", "内容").await.unwrap();
    assert!(!receipt.success);
    assert_eq!(receipt.raw["errno"], 1024);
    let request = &transport.requests()[0];
    assert_eq!(form_value(request, "text"), Some("标题"));
    assert_eq!(form_value(request, "desp"), Some("内容"));
}

#[test]
fn test_feishu_sign_without_secret_is_rejected() {
    let result = build_channel(
        &PushConfig::Feishu {
            webhook_url: "https://open.feishu.cn/open-apis/bot/v2/hook/abc".to_string(),
            havesign: true,
            secret: String::new(),
        },
        ScriptedTransport::new(),
    );
    assert!(result.is_err());
}
