//! End-to-end tests against an in-process axum server over `HyperTransport`.

#![cfg(feature = "tls")]

use std::time::Duration;

use axios_fetch::transport::HyperTransport;
use axios_fetch::{
    Client, ErrorCode, FormData, InstanceConfig, Params, RequestConfig, ResponseData, ResponseType,
    UrlSearchParams,
};
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, RawQuery};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect};
use axum::routing::{any, get};
use chrono::{TimeZone, Utc};
use serde_json::{Value, json};

fn app() -> Router {
    Router::new()
        .route("/users/{id}", get(user))
        .route("/echo", any(echo))
        .route("/query", get(query))
        .route("/empty", get(|| async { StatusCode::NO_CONTENT }))
        .route("/text", get(|| async { "plain words" }))
        .route("/old", get(|| async { Redirect::temporary("/new") }))
        .route("/new", get(|| async { "arrived" }))
        .route("/moved-echo", any(|| async { Redirect::temporary("/echo") }))
        .route(
            "/missing",
            get(|| async { (StatusCode::NOT_FOUND, axum::Json(json!({"error": "not found"}))) }),
        )
        .route("/boom", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                "late"
            }),
        )
}

async fn user(Path(id): Path<u32>) -> impl IntoResponse {
    axum::Json(json!({"id": id, "name": format!("user-{id}")}))
}

async fn echo(headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    axum::Json(json!({
        "contentType": header("content-type"),
        "client": header("x-client"),
        "body": String::from_utf8_lossy(&body),
    }))
}

async fn query(RawQuery(query): RawQuery) -> String {
    query.unwrap_or_default()
}

async fn serve() -> anyhow::Result<String> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app()).await {
            eprintln!("server error: {e}");
        }
    });
    Ok(format!("http://{addr}"))
}

async fn client() -> anyhow::Result<Client> {
    let base = serve().await?;
    Ok(Client::builder().base_url(base).build()?)
}

#[tokio::test]
async fn get_json() -> anyhow::Result<()> {
    let client = client().await?;
    let response = client.get("/users/7").await?;

    assert_eq!(response.status, 200);
    assert_eq!(response.status_text, "OK");
    assert_eq!(response.data, ResponseData::Json(json!({"id": 7, "name": "user-7"})));
    assert!(response.request.response_url.ends_with("/users/7"));
    assert!(response.header("content-type").unwrap().starts_with("application/json"));
    Ok(())
}

#[tokio::test]
async fn post_json_sets_content_type() -> anyhow::Result<()> {
    let client = client().await?;
    let response = client.post("/echo", json!({"name": "ada"})).await?;

    let echoed: Value = response.json()?;
    assert_eq!(echoed["contentType"], "application/json;charset=UTF-8");
    assert_eq!(echoed["body"], r#"{"name":"ada"}"#);
    Ok(())
}

#[tokio::test]
async fn caller_content_type_is_kept() -> anyhow::Result<()> {
    let client = client().await?;
    let response = client
        .put_with_config(
            "/echo",
            "a,b\n1,2",
            RequestConfig::new().header("content-type", "text/csv"),
        )
        .await?;

    let echoed: Value = response.json()?;
    assert_eq!(echoed["contentType"], "text/csv");
    assert_eq!(echoed["body"], "a,b\n1,2");
    Ok(())
}

#[tokio::test]
async fn url_encoded_and_multipart_bodies() -> anyhow::Result<()> {
    let client = client().await?;
    let form = || UrlSearchParams::new().append("q", "a b").append("n", "1");

    // The post tier's content type is already present, so it wins.
    let echoed: Value = client.post("/echo", form()).await?.json()?;
    assert_eq!(echoed["contentType"], "application/json;charset=UTF-8");
    assert_eq!(echoed["body"], "q=a+b&n=1");

    let unset = || RequestConfig::new().unset_header(CONTENT_TYPE);

    let echoed: Value = client.post_with_config("/echo", form(), unset()).await?.json()?;
    assert_eq!(echoed["contentType"], "application/x-www-form-urlencoded;charset=UTF-8");

    let echoed: Value = client
        .post_with_config("/echo", FormData::new().text("field", "value"), unset())
        .await?
        .json()?;
    let content_type = echoed["contentType"].as_str().unwrap_or_default();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    assert!(echoed["body"].as_str().unwrap_or_default().contains("name=\"field\""));
    Ok(())
}

#[tokio::test]
async fn query_params_are_serialized() -> anyhow::Result<()> {
    let client = client().await?;
    let params = Params::new()
        .insert("a", vec![1, 2])
        .insert("b", Utc.timestamp_opt(0, 0).unwrap())
        .insert("c", json!({"x": 1}))
        .insert("skip", None::<&str>);

    let response = client
        .get_with_config("/query", RequestConfig::new().params(params))
        .await?;
    assert_eq!(
        response.data,
        ResponseData::Text("a=1&a=2&b=1970-01-01T00%3A00%3A00.000Z&c=%7B%22x%22%3A1%7D".into())
    );
    Ok(())
}

#[tokio::test]
async fn no_content_decodes_empty() -> anyhow::Result<()> {
    let client = client().await?;
    let response = client.get("/empty").await?;
    assert_eq!(response.status, 204);
    assert!(response.data.is_empty());
    Ok(())
}

#[tokio::test]
async fn response_types() -> anyhow::Result<()> {
    let client = client().await?;

    let text = client.get("/text").await?;
    assert_eq!(text.data, ResponseData::Text("plain words".into()));

    let raw = client
        .get_with_config("/text", RequestConfig::new().response_type(ResponseType::ArrayBuffer))
        .await?;
    assert_eq!(raw.data.as_bytes().map(|b| b.as_ref()), Some(&b"plain words"[..]));

    let blob = client
        .get_with_config("/text", RequestConfig::new().response_type(ResponseType::Blob))
        .await?;
    match blob.data {
        ResponseData::Blob(blob) => {
            assert!(blob.content_type().unwrap_or_default().starts_with("text/plain"));
        }
        other => panic!("expected blob, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn status_errors() -> anyhow::Result<()> {
    let client = client().await?;

    let err = client.get("/missing").await.unwrap_err();
    assert!(Client::is_axios_error(&err));
    assert_eq!(err.code(), Some(ErrorCode::BadRequest));
    let response = err.response().unwrap();
    assert_eq!(response.status, 404);
    assert_eq!(response.data, ResponseData::Json(json!({"error": "not found"})));

    let err = client.get("/boom").await.unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::BadResponse));
    assert_eq!(err.response().unwrap().data, ResponseData::Text("boom".into()));

    let response = client
        .get_with_config("/missing", RequestConfig::new().validate_status(|s| s < 500))
        .await?;
    assert_eq!(response.status, 404);
    Ok(())
}

#[tokio::test]
async fn timeout_aborts() -> anyhow::Result<()> {
    let client = client().await?;
    let err = client
        .get_with_config("/slow", RequestConfig::new().timeout(Duration::from_millis(50)))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::ConnAborted));
    assert_eq!(err.to_string(), "timeout of 50ms exceeded");
    Ok(())
}

#[tokio::test]
async fn connection_refused_is_network_error() -> anyhow::Result<()> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);

    let client = Client::new()?;
    let err = client.get(format!("http://{addr}/nothing")).await.unwrap_err();
    assert!(Client::is_axios_error(&err));
    assert_eq!(err.code(), Some(ErrorCode::Network));
    assert!(err.response().is_none());
    Ok(())
}

#[tokio::test]
async fn derived_instance_headers() -> anyhow::Result<()> {
    let parent = client().await?;
    let child = parent.create(InstanceConfig::new().header("common", "X-Client", "child")?);

    let echoed: Value = child.post("/echo", "hi").await?.json()?;
    assert_eq!(echoed["client"], "child");

    let echoed: Value = parent.post("/echo", "hi").await?.json()?;
    assert_eq!(echoed["client"], Value::Null);
    Ok(())
}

#[tokio::test]
async fn redirects_are_followed() -> anyhow::Result<()> {
    let client = client().await?;

    let response = client.get("/old").await?;
    assert_eq!(response.status, 200);
    assert_eq!(response.data, ResponseData::Text("arrived".into()));
    assert!(response.request.response_url.ends_with("/new"));

    // 307 keeps the method and replays the body.
    let response = client.post("/moved-echo", "kept").await?;
    assert!(response.request.response_url.ends_with("/echo"));
    let echoed: Value = response.json()?;
    assert_eq!(echoed["body"], "kept");
    Ok(())
}

#[tokio::test]
async fn redirects_can_be_disabled() -> anyhow::Result<()> {
    let base = serve().await?;
    let client = Client::builder()
        .transport(HyperTransport::builder().max_redirects(0).build()?)
        .base_url(base)
        .build()?;

    let err = client.get("/old").await.unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::BadResponse));
    let response = err.response().unwrap();
    assert_eq!(response.status, 307);
    assert_eq!(response.header("location"), Some("/new"));
    Ok(())
}
