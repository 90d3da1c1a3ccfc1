use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use themegen::catalog::AssetDescriptor;
use themegen::client::{GenerationRequest, GenerationSettings, Generator, Txt2ImgClient};
use themegen::error::ThemegenError;

mod common;
use common::{batch, dead_service, settings_for, spawn_service};

fn request(settings: &GenerationSettings) -> GenerationRequest {
    let asset = AssetDescriptor::new(
        "icons",
        "icon_terminal.png",
        128,
        128,
        "UI icon, glowing green runes",
    );
    GenerationRequest::new(&asset, settings)
}

async fn respond_with(body: Value) -> Result<(), ThemegenError> {
    let router = Router::new().route(
        "/sdapi/v1/txt2img",
        post(move || {
            let body = body.clone();
            async move { Json(body) }
        }),
    );
    let settings = settings_for(spawn_service(router).await);
    let client = Txt2ImgClient::new(&settings).expect("client");
    client.generate(&request(&settings)).await.map(|_| ())
}

#[tokio::test]
async fn four_candidates_come_back_in_order() {
    let (_, encoded) = batch();
    let seen: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let seen_in_handler = seen.clone();
    let images = encoded.clone();
    let router = Router::new().route(
        "/sdapi/v1/txt2img",
        post(move |Json(body): Json<Value>| {
            let seen = seen_in_handler.clone();
            let images = images.clone();
            async move {
                *seen.lock().expect("lock") = Some(body);
                Json(json!({"images": images, "parameters": {}, "info": "{\"seed\": 1234}"}))
            }
        }),
    );

    let settings = settings_for(spawn_service(router).await);
    let client = Txt2ImgClient::new(&settings).expect("client");
    let result = client
        .generate(&request(&settings))
        .await
        .expect("generate");

    assert_eq!(result.len(), 4);
    assert_eq!(result.images, encoded);

    let body = seen.lock().expect("lock").take().expect("request seen");
    assert_eq!(body["batch_size"], 4);
    assert_eq!(body["seed"], -1);
    assert_eq!(body["width"], 128);
    assert_eq!(body["override_settings_restore_afterwards"], true);
    assert!(
        body["prompt"]
            .as_str()
            .is_some_and(|prompt| prompt.contains("glowing green runes"))
    );
}

#[tokio::test]
async fn empty_or_missing_images_is_empty_result() {
    for body in [
        json!({"images": []}),
        json!({"images": null}),
        json!({"detail": "Not Found"}),
    ] {
        let err = respond_with(body.clone()).await.expect_err("no images");
        assert!(
            matches!(err, ThemegenError::EmptyResult),
            "{body} gave {err}"
        );
    }
}

#[tokio::test]
async fn server_error_is_service_unavailable() {
    let router = Router::new().route(
        "/sdapi/v1/txt2img",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "CUDA out of memory") }),
    );
    let settings = settings_for(spawn_service(router).await);
    let client = Txt2ImgClient::new(&settings).expect("client");
    let err = client
        .generate(&request(&settings))
        .await
        .expect_err("500");
    match err {
        ThemegenError::ServiceUnavailable(details) => {
            assert!(details.contains("500"));
            assert!(details.contains("CUDA out of memory"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn non_json_body_is_service_unavailable() {
    let router = Router::new().route("/sdapi/v1/txt2img", post(|| async { "hello" }));
    let settings = settings_for(spawn_service(router).await);
    let client = Txt2ImgClient::new(&settings).expect("client");
    let err = client
        .generate(&request(&settings))
        .await
        .expect_err("not json");
    assert!(matches!(err, ThemegenError::ServiceUnavailable(_)));
}

#[tokio::test]
async fn connection_refused_is_service_unavailable() {
    let settings = settings_for(dead_service().await);
    let client = Txt2ImgClient::new(&settings).expect("client");
    let err = client
        .generate(&request(&settings))
        .await
        .expect_err("refused");
    assert!(matches!(err, ThemegenError::ServiceUnavailable(_)));
}

#[tokio::test]
async fn slow_service_times_out() {
    let router = Router::new().route(
        "/sdapi/v1/txt2img",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"images": []}))
        }),
    );
    let settings = GenerationSettings {
        timeout: Duration::from_millis(200),
        ..settings_for(spawn_service(router).await)
    };
    let client = Txt2ImgClient::new(&settings).expect("client");
    let err = client
        .generate(&request(&settings))
        .await
        .expect_err("timeout");
    assert!(matches!(err, ThemegenError::ServiceUnavailable(_)));
}
