//! Integration tests for streaming generation

use crate::mock_server::{text_chunk, token_chunk, MockServerFixture, MODEL_PATH};
use futures::StreamExt;
use hf_inference_chat::tokens::TokenUsage;
use hf_inference_chat::{GenerationParams, Message};
use mockito::Matcher;
use std::time::Duration;

async fn collect(stream: &mut hf_inference_chat::GenerationStream) -> Vec<String> {
    stream.collect().await
}

#[tokio::test]
async fn hello_miss_then_hit_replays_cached_text() {
    let mut fx = MockServerFixture::new().await;
    let first = text_chunk("Hi! ");
    let second = text_chunk("How can I help?");
    let mock = fx
        .mock_stream(&[&first, &second, "data: [DONE]"], 1)
        .await;
    let params = GenerationParams::default();

    let mut live = fx.client.generate_stream("Hello", &[], &params);
    let live_fragments = collect(&mut live).await;
    assert_eq!(live_fragments, vec!["Hi! ", "How can I help?"]);
    assert_eq!(live.usage().map(|u| u.received), Some(5));

    let mut replay = fx.client.generate_stream("Hello", &[], &params);
    let replay_fragments = collect(&mut replay).await;
    assert_eq!(replay_fragments.len(), "Hi! How can I help?".chars().count());
    assert_eq!(replay_fragments.concat(), live_fragments.concat());

    // The second call never reached the endpoint.
    mock.assert_async().await;
    let stats = fx.cache.stats();
    assert_eq!((stats.hits, stats.misses, stats.sets), (1, 1, 1));
    assert_eq!(fx.usage.calls(), 2);
}

#[tokio::test]
async fn malformed_chunk_between_text_chunks_is_skipped() {
    let mut fx = MockServerFixture::new().await;
    let a = text_chunk("fn main() ");
    let b = text_chunk("{}");
    let _mock = fx
        .mock_stream(&[&a, "", "data: {\"generated_text\": ", ": ping", &b, "data: [DONE]"], 1)
        .await;

    let mut stream = fx
        .client
        .generate_stream("Write main", &[], &GenerationParams::default());
    assert_eq!(collect(&mut stream).await.concat(), "fn main() {}");
    assert!(stream.usage().is_some());
}

#[tokio::test]
async fn token_chunks_count_one_each() {
    let mut fx = MockServerFixture::new().await;
    let t1 = token_chunk(1, "Hello");
    let t2 = token_chunk(2, " there");
    let t3 = token_chunk(3, ", friend");
    let _mock = fx.mock_stream(&[&t1, &t2, &t3], 1).await;

    let mut stream = fx
        .client
        .generate_stream("Greet me", &[], &GenerationParams::default());
    let fragments = collect(&mut stream).await;
    assert_eq!(fragments, vec!["Hello", " there", ", friend"]);

    let usage = stream.usage().unwrap();
    assert_eq!(usage.received, 3);
    assert!(usage.sent > 0);
    assert_eq!(fx.usage.totals(), usage);
}

#[tokio::test]
async fn remote_error_yields_one_fragment_and_no_cache_entry() {
    let mut fx = MockServerFixture::new().await;
    let mock = fx.mock_error(503, "model is loading", 2).await;
    let params = GenerationParams::default();

    for _ in 0..2 {
        let mut stream = fx.client.generate_stream("Hello", &[], &params);
        let fragments = collect(&mut stream).await;
        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].starts_with("Error: "));
        assert!(fragments[0].contains("503"));
        assert_eq!(stream.usage(), None);
    }

    mock.assert_async().await;
    assert_eq!(fx.cache.stats().sets, 0);
    assert_eq!(fx.usage.totals(), TokenUsage::default());
}

#[tokio::test]
async fn empty_stream_caches_nothing() {
    let mut fx = MockServerFixture::new().await;
    let mock = fx.mock_stream(&["data: [DONE]"], 2).await;
    let params = GenerationParams::default();

    for _ in 0..2 {
        let mut stream = fx.client.generate_stream("Hello", &[], &params);
        assert!(collect(&mut stream).await.is_empty());
        assert_eq!(stream.usage(), None);
    }
    mock.assert_async().await;
    assert_eq!(fx.cache.stats().sets, 0);
}

#[tokio::test]
async fn dropping_the_stream_early_caches_nothing() {
    let mut fx = MockServerFixture::new().await;
    // More fragments than the channel buffers, so the producer is still
    // mid-stream when the caller walks away.
    let lines: Vec<String> = (0..500).map(|i| token_chunk(i, "x")).collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let _mock = fx.mock_stream(&refs, 1).await;

    let mut stream = fx
        .client
        .generate_stream("Count", &[], &GenerationParams::default());
    assert_eq!(stream.next().await.as_deref(), Some("x"));
    drop(stream);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(fx.cache.stats().sets, 0);
    assert_eq!(fx.usage.calls(), 0);
}

#[tokio::test]
async fn request_carries_prompt_params_and_auth() {
    let mut fx = MockServerFixture::with_token(Some("hf_secret")).await;
    let chunk = text_chunk("ok");
    let mock = fx
        .server
        .mock("POST", MODEL_PATH)
        .match_header("authorization", "Bearer hf_secret")
        .match_header("x-request-id", Matcher::Any)
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(serde_json::json!({
                "stream": true,
                "parameters": {
                    "max_new_tokens": 256,
                    "do_sample": true,
                    "return_full_text": false
                }
            })),
            Matcher::Regex(r"<\|im_start\|>user\\nWhat about now\?".to_string()),
            Matcher::Regex(r"<\|im_start\|>assistant\\nEarlier answer".to_string()),
        ]))
        .with_status(200)
        .with_body(chunk)
        .create_async()
        .await;

    let history = vec![Message::user("Earlier question"), Message::assistant("Earlier answer")];
    let params = GenerationParams::default().with_max_new_tokens(256);
    let mut stream = fx.client.generate_stream("What about now?", &history, &params);
    assert_eq!(collect(&mut stream).await.concat(), "ok");
    mock.assert_async().await;
}

#[tokio::test]
async fn different_history_is_a_different_cache_entry() {
    let mut fx = MockServerFixture::new().await;
    let chunk = text_chunk("answer");
    let mock = fx.mock_stream(&[&chunk], 2).await;
    let params = GenerationParams::default();

    let with_history = vec![Message::user("context"), Message::assistant("noted")];
    collect(&mut fx.client.generate_stream("Q", &[], &params)).await;
    collect(&mut fx.client.generate_stream("Q", &with_history, &params)).await;
    collect(&mut fx.client.generate_stream("Q", &with_history, &params)).await;

    mock.assert_async().await;
    assert_eq!(fx.cache.stats().hits, 1);
}

#[tokio::test]
async fn active_stream_outlives_the_request_timeout() {
    let mut fx = MockServerFixture::with_timeout(Duration::from_millis(1500)).await;
    let lines: Vec<String> = (0..4).map(|i| token_chunk(i, &format!("t{i} "))).collect();
    let _mock = fx.mock_paced_stream(lines, Duration::from_millis(600)).await;

    let started = std::time::Instant::now();
    let mut stream = fx
        .client
        .generate_stream("Slow please", &[], &GenerationParams::default());
    let fragments = collect(&mut stream).await;

    assert!(started.elapsed() > Duration::from_millis(1500));
    assert_eq!(fragments.concat(), "t0 t1 t2 t3 ");
    assert_eq!(stream.usage().map(|u| u.received), Some(4));
    assert_eq!(fx.cache.stats().sets, 1);
}

#[tokio::test]
async fn stalled_stream_fails_after_the_idle_timeout() {
    let mut fx = MockServerFixture::with_timeout(Duration::from_millis(300)).await;
    let lines = vec![token_chunk(0, "partial"), token_chunk(1, " never seen")];
    let _mock = fx.mock_paced_stream(lines, Duration::from_millis(1200)).await;

    let mut stream = fx
        .client
        .generate_stream("Stall", &[], &GenerationParams::default());
    let fragments = collect(&mut stream).await;

    assert_eq!(fragments.len(), 2);
    assert_eq!(fragments[0], "partial");
    assert!(fragments[1].starts_with("Error: "));
    assert!(fragments[1].contains("no data received"));
    assert_eq!(stream.usage(), None);
    assert_eq!(fx.cache.stats().sets, 0);
}
