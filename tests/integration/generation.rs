//! Integration tests for non-streaming generation

use crate::mock_server::MockServerFixture;
use futures::StreamExt;
use hf_inference_chat::{Error, GenerationParams};

#[tokio::test]
async fn generate_caches_and_shares_with_streaming() {
    let mut fx = MockServerFixture::new().await;
    let mock = fx
        .mock_json(200, r#"[{"generated_text":"Rust is a systems language."}]"#, 1)
        .await;
    let params = GenerationParams::default();

    let text = fx.client.generate("What is Rust?", &[], &params).await.unwrap();
    assert_eq!(text.as_deref(), Some("Rust is a systems language."));

    // Same request again, blocking and streaming: both served from cache.
    let again = fx.client.generate("What is Rust?", &[], &params).await.unwrap();
    assert_eq!(again, text);
    let replayed: Vec<String> = fx
        .client
        .generate_stream("What is Rust?", &[], &params)
        .collect()
        .await;
    assert_eq!(replayed.concat(), "Rust is a systems language.");

    mock.assert_async().await;
    assert_eq!(fx.usage.calls(), 3);
    assert_eq!(fx.usage.totals().received, 15);
}

#[tokio::test]
async fn generate_without_text_returns_none() {
    let mut fx = MockServerFixture::new().await;
    let mock = fx.mock_json(200, r#"{"warnings":["empty"]}"#, 2).await;
    let params = GenerationParams::default();

    assert_eq!(fx.client.generate("Hi", &[], &params).await.unwrap(), None);
    assert_eq!(fx.client.generate("Hi", &[], &params).await.unwrap(), None);
    mock.assert_async().await;
    assert_eq!(fx.cache.stats().sets, 0);
    assert_eq!(fx.usage.calls(), 0);
}

#[tokio::test]
async fn generate_surfaces_remote_errors() {
    let mut fx = MockServerFixture::new().await;
    let _mock = fx.mock_error(429, "rate limited", 1).await;

    let err = fx
        .client
        .generate("Hi", &[], &GenerationParams::default())
        .await
        .unwrap_err();
    match err {
        Error::Remote { status, message } => {
            assert_eq!(status, 429);
            assert_eq!(message, "rate limited");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fx.cache.stats().sets, 0);
}

#[tokio::test]
async fn clear_cache_forces_a_fresh_request() {
    let mut fx = MockServerFixture::new().await;
    let mock = fx.mock_json(200, r#"{"generated_text":"fresh"}"#, 2).await;
    let params = GenerationParams::default();

    fx.client.generate("Hi", &[], &params).await.unwrap();
    fx.client.generate("Hi", &[], &params).await.unwrap();
    fx.client.clear_cache().await;
    fx.client.generate("Hi", &[], &params).await.unwrap();

    mock.assert_async().await;
}
