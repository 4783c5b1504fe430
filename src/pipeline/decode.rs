//! Streaming decoder (Bytes -> text chunks).
//!
//! The endpoint sends newline-delimited JSON, optionally framed as SSE
//! (`data: {...}`), terminated by `data: [DONE]`. Lines that are not valid JSON
//! or do not carry text are skipped; only transport errors are surfaced.

use crate::BoxStream;
use bytes::Bytes;
use futures::{stream, StreamExt};
use serde_json::Value;

const DONE_SIGNAL: &str = "[DONE]";
const DATA_PREFIX: &str = "data:";

/// One text-bearing unit of the endpoint's incremental response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// A `generated_text` payload: a complete block of text, emitted in full.
    GeneratedText(String),
    /// A `token.text` payload: one generated token.
    Token(String),
}

impl Chunk {
    /// Match a decoded JSON value against the accepted chunk shapes.
    ///
    /// A single-element array is unwrapped first. An object carrying a `token`
    /// object is a token chunk even when it also has a `generated_text` string:
    /// text-generation-inference sends the whole text again on its final frame,
    /// and reading it as a block would duplicate everything streamed so far.
    pub fn from_value(value: Value) -> Option<Chunk> {
        let obj = match value {
            Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            other => other,
        };
        let obj = obj.as_object()?;

        if let Some(token) = obj.get("token").and_then(Value::as_object) {
            if token.get("special").and_then(Value::as_bool) == Some(true) {
                return None;
            }
            let text = token.get("text").and_then(Value::as_str)?;
            return Some(Chunk::Token(text.to_string()));
        }

        obj.get("generated_text")
            .and_then(Value::as_str)
            .map(|t| Chunk::GeneratedText(t.to_string()))
    }

    pub fn text(&self) -> &str {
        match self {
            Chunk::GeneratedText(t) | Chunk::Token(t) => t,
        }
    }
}

/// Parse one transport line. Returns `None` for blank lines, the end-of-stream
/// sentinel, SSE comments, malformed JSON and JSON of an unknown shape.
pub fn parse_line(raw: &str) -> Option<Chunk> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with(':') {
        return None;
    }

    let payload = match trimmed.strip_prefix(DATA_PREFIX) {
        Some(rest) => rest.trim_start(),
        None => trimmed,
    };
    if payload == DONE_SIGNAL {
        return None;
    }

    match serde_json::from_str::<Value>(payload) {
        Ok(value) => {
            let chunk = Chunk::from_value(value);
            if chunk.is_none() {
                tracing::debug!(line = payload, "skipping chunk without text");
            }
            chunk
        }
        Err(e) => {
            tracing::debug!(line = payload, error = %e, "skipping non-JSON line");
            None
        }
    }
}

/// Split a byte stream into lines and decode each into a [`Chunk`].
///
/// Bytes are buffered until a full line is available, so multi-byte characters
/// split across network reads are reassembled before decoding.
pub fn decode_chunks(input: BoxStream<'static, Bytes>) -> BoxStream<'static, Chunk> {
    let stream = stream::unfold(
        (input, Vec::<u8>::new(), false),
        |(mut input, mut buf, mut eof)| async move {
            loop {
                if let Some(idx) = buf.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buf.drain(..=idx).collect();
                    if let Some(chunk) = parse_line(&String::from_utf8_lossy(&line)) {
                        return Some((Ok(chunk), (input, buf, eof)));
                    }
                    continue;
                }

                if eof {
                    // Trailing line without a newline terminator.
                    if buf.is_empty() {
                        return None;
                    }
                    let line = std::mem::take(&mut buf);
                    if let Some(chunk) = parse_line(&String::from_utf8_lossy(&line)) {
                        return Some((Ok(chunk), (input, buf, eof)));
                    }
                    return None;
                }

                match input.next().await {
                    Some(Ok(bytes)) => buf.extend_from_slice(&bytes),
                    Some(Err(e)) => return Some((Err(e), (input, buf, true))),
                    None => eof = true,
                }
            }
        },
    );
    Box::pin(stream)
}

/// Extract `generated_text` from a non-streaming response document.
pub fn generated_text(value: Value) -> Option<String> {
    match Chunk::from_value(value)? {
        Chunk::GeneratedText(text) | Chunk::Token(text) => Some(text),
    }
}
