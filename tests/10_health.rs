mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn ready_endpoint_responds() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = common::client().get(server.url("/_meta_/ready")).send().await?;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await?, "ok");
    Ok(())
}

#[tokio::test]
async fn homepage_renders_without_a_session() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = common::client().get(server.url("/")).send().await?;

    assert_eq!(res.status(), StatusCode::OK);
    let content_type = res
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/html"), "content type: {}", content_type);
    assert!(res.text().await?.contains("/components/login_prompt"));
    Ok(())
}

#[tokio::test]
async fn static_assets_are_served() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = common::client().get(server.url("/static/css/prixfixe.css")).send().await?;

    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn server_stops_when_dropped() -> Result<()> {
    let server = common::ensure_server().await?;
    let ready = server.url("/_meta_/ready");
    drop(server);

    let attempt = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(2))
        .build()?
        .get(&ready)
        .send()
        .await;
    assert!(attempt.is_err(), "server still answering on {}", ready);
    Ok(())
}
