//! Router tests for requests that are answered before any query runs, so
//! they need no database.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{call, get_request, offline_router};
use serde_json::json;

fn empty_collection() -> serde_json::Value {
    json!({
        "type": "FeatureCollection",
        "count": 0,
        "next": null,
        "previous": null,
        "features": []
    })
}

#[tokio::test]
async fn unparseable_coordinates_give_empty_collection() -> anyhow::Result<()> {
    let router = offline_router()?;

    for uri in [
        "/service-areas/?latitude=abc&longitude=44.7",
        "/service-areas?latitude=-107.2&longitude=",
        "/service-areas/?latitude=1e999&longitude=2",
    ] {
        let (status, body) = call(&router, get_request(uri)?).await?;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(body, empty_collection(), "{}", uri);
    }
    Ok(())
}

#[tokio::test]
async fn repeated_query_keys_use_the_last_value() -> anyhow::Result<()> {
    let router = offline_router()?;

    let (status, body) = call(
        &router,
        get_request("/service-areas/?latitude=1&latitude=abc&longitude=3&page=2&page=1")?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, empty_collection());
    Ok(())
}

#[tokio::test]
async fn page_past_an_empty_result_is_invalid() -> anyhow::Result<()> {
    let router = offline_router()?;

    let (status, body) = call(
        &router,
        get_request("/service-areas/?latitude=x&longitude=y&page=2")?,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "detail": "Invalid page." }));
    Ok(())
}

#[tokio::test]
async fn body_without_json_content_type_is_unsupported() -> anyhow::Result<()> {
    let router = offline_router()?;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/providers/")
        .header("content-type", "text/plain")
        .body(Body::from(r#"{"name": "x"}"#))?;
    let (status, body) = call(&router, request).await?;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(
        body["detail"],
        "Unsupported media type in request. Expected application/json."
    );

    let request = Request::builder()
        .method(Method::POST)
        .uri("/service-areas/")
        .body(Body::from("{}"))?;
    let (status, _) = call(&router, request).await?;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    Ok(())
}

#[tokio::test]
async fn malformed_body_is_bad_request() -> anyhow::Result<()> {
    let router = offline_router()?;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/providers/")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))?;
    let (status, body) = call(&router, request).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"]
        .as_str()
        .is_some_and(|detail| detail.starts_with("JSON parse error")));
    Ok(())
}

#[tokio::test]
async fn malformed_ids_are_not_found() -> anyhow::Result<()> {
    let router = offline_router()?;

    for uri in ["/providers/abc/", "/service-areas/0", "/service-areas/-3/"] {
        let (status, body) = call(&router, get_request(uri)?).await?;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body, json!({ "detail": "Not found." }));
    }
    Ok(())
}

#[tokio::test]
async fn api_root_links_collections() -> anyhow::Result<()> {
    let router = offline_router()?;

    let (status, body) = call(&router, get_request("/")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["providers"], "http://localhost:8000/providers/");
    assert_eq!(body["service-areas"], "http://localhost:8000/service-areas/");
    Ok(())
}
