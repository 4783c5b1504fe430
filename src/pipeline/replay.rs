use futures::{stream, Stream};
use std::time::Duration;

/// Re-emit already known text one character at a time with a fixed pause
/// before each character after the first.
///
/// Gives cache hits the same incremental shape as a live generation.
pub fn replay_chars(text: String, delay: Duration) -> impl Stream<Item = String> + Send + 'static {
    stream::unfold((text, 0usize), move |(text, pos)| async move {
        let ch = text[pos..].chars().next()?;
        if pos > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let next = pos + ch.len_utf8();
        Some((ch.to_string(), (text, next)))
    })
}
