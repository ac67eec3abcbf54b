use gemini_describe::{runner, ClientError, Gemini, RunnerConfig, RunnerError};
use serde_json::json;
use tempfile::TempDir;
use url::Url;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

fn client_for(server: &MockServer) -> Gemini {
    let base_url = Url::parse(&format!("{}/v1beta/", server.uri())).unwrap();
    Gemini::with_base_url("test-key", base_url).unwrap()
}

fn media_config(dir: &TempDir) -> RunnerConfig {
    let media_path = dir.path().join("image.png");
    std::fs::write(&media_path, b"0123456789").unwrap();
    RunnerConfig {
        media_path,
        ..Default::default()
    }
}

#[tokio::test]
async fn runner_posts_image_then_empty_text_and_prints_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {"inlineData": {"mimeType": "image/png", "data": "MDEyMzQ1Njc4OQ=="}},
                    {"text": ""}
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "A cat sitting on a windowsill."}]
                },
                "finishReason": "STOP",
                "index": 0
            }],
            "usageMetadata": {
                "promptTokenCount": 259,
                "candidatesTokenCount": 7,
                "totalTokenCount": 266
            },
            "modelVersion": "gemini-2.5-flash"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&server);
    let mut out = Vec::new();

    runner::run(&media_config(&dir), || Ok(client), &mut out)
        .await
        .unwrap();

    assert_eq!(out, b"A cat sitting on a windowsill.\n");
}

#[tokio::test]
async fn api_error_is_surfaced_with_status_and_body() {
    let server = MockServer::start().await;
    let error_body = json!({
        "error": {
            "code": 400,
            "message": "API key not valid. Please pass a valid API key.",
            "status": "INVALID_ARGUMENT"
        }
    });
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(error_body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&server);
    let mut out = Vec::new();

    let err = runner::run(&media_config(&dir), || Ok(client), &mut out)
        .await
        .unwrap_err();

    match err {
        RunnerError::Generate {
            source: ClientError::BadResponse { code, description },
            ..
        } => {
            assert_eq!(code, 400);
            let description = description.unwrap();
            assert!(description.contains("API key not valid"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(out.is_empty());
}

#[tokio::test]
async fn malformed_response_body_is_a_deserialize_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate_content()
        .with_user_message("hello")
        .execute()
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Deserialize { .. }));
}

#[tokio::test]
async fn missing_file_never_reaches_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = RunnerConfig {
        media_path: dir.path().join("image.png"),
        ..Default::default()
    };
    let client = client_for(&server);

    let err = runner::run(&config, || Ok(client), &mut Vec::new())
        .await
        .unwrap_err();

    assert!(matches!(err, RunnerError::ReadMedia { .. }));
}
