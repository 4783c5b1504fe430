//! hf-chat: terminal chat over a Hugging Face text-generation endpoint
//!
//! Usage:
//!   hf-chat            Start an interactive session (settings from the environment)
//!
//! Commands inside the session:
//!   /clear                          Flush the response cache
//!   /reset                          Forget the conversation history
//!   /usage                          Show session token totals and cache stats
//!   /set <name> <value>             temperature | top_p | max_tokens | rep_penalty
//!   /attach <path>                  Attach a text file to the next prompt
//!   /quit                           Leave

use anyhow::{bail, Context, Result};
use futures::StreamExt;
use hf_inference_chat::attachment::Attachment;
use hf_inference_chat::tokens::SessionUsage;
use hf_inference_chat::{GenerationParams, InferenceClientBuilder, Message, Settings};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

const EMPTY_RESPONSE: &str = "I apologize, but I couldn't generate a response. Please try again.";

struct Session {
    history: Vec<Message>,
    params: GenerationParams,
    pending: Option<Attachment>,
    usage: Arc<SessionUsage>,
    max_file_size: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays the chat transcript.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();

    let settings = Settings::from_env();
    if settings.api_token.is_none() {
        tracing::warn!("HUGGING_FACE_API_TOKEN not set, sending unauthenticated requests");
    }

    let usage = Arc::new(SessionUsage::new());
    let max_file_size = settings.max_file_size;
    let client = InferenceClientBuilder::new(settings)
        .usage_sink(usage.clone())
        .build()
        .await
        .context("failed to start inference client")?;

    println!(
        "hf-chat {}: model {} (cache: {}). Type /quit to leave.",
        env!("CARGO_PKG_VERSION"),
        client.model(),
        client.backend_name()
    );

    let mut session = Session {
        history: Vec::new(),
        params: GenerationParams::default(),
        pending: None,
        usage,
        max_file_size,
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            let mut parts = command.split_whitespace();
            match parts.next().unwrap_or_default() {
                "quit" | "exit" => break,
                "clear" => {
                    client.clear_cache().await;
                    println!("Cache cleared.");
                }
                "reset" => {
                    session.history.clear();
                    session.pending = None;
                    println!("Conversation reset.");
                }
                "usage" => {
                    let totals = session.usage.totals();
                    let stats = client.cache_stats();
                    println!(
                        "calls: {}  sent: {}  received: {}  cache hits: {}  misses: {}  ({:.0}% hit rate)",
                        session.usage.calls(),
                        totals.sent,
                        totals.received,
                        stats.hits,
                        stats.misses,
                        stats.hit_ratio() * 100.0
                    );
                }
                "set" => {
                    let name = parts.next().unwrap_or_default();
                    let value = parts.next().unwrap_or_default();
                    match apply_setting(&session.params, name, value) {
                        Ok(params) => {
                            session.params = params;
                            println!("{name} = {value}");
                        }
                        Err(e) => println!("{e}"),
                    }
                }
                "attach" => {
                    let path = command["attach".len()..].trim();
                    match Attachment::from_path(path, session.max_file_size) {
                        Ok(att) => {
                            println!("{}", describe_attachment(&att));
                            session.pending = Some(att);
                        }
                        Err(e) => println!("Error: {e}"),
                    }
                }
                other => println!("Unknown command: /{other}"),
            }
            continue;
        }

        let prompt = match session.pending.take() {
            Some(att) => att.attach_to(line),
            None => line.to_string(),
        };

        let mut stream = client.generate_stream(&prompt, &session.history, &session.params);
        let mut reply = String::new();
        while let Some(fragment) = stream.next().await {
            print!("{fragment}");
            std::io::stdout().flush()?;
            reply.push_str(&fragment);
        }
        // Usage is only reported for generations that ran to completion.
        let completed = stream.usage().is_some();
        if reply.trim().is_empty() {
            print!("{EMPTY_RESPONSE}");
        }
        println!();

        record_exchange(&mut session.history, prompt, reply, completed);
    }

    Ok(())
}

fn apply_setting(params: &GenerationParams, name: &str, value: &str) -> Result<GenerationParams> {
    let updated = match name {
        "temperature" => params.clone().with_temperature(value.parse()?),
        "top_p" => params.clone().with_top_p(value.parse()?),
        "max_tokens" => params.clone().with_max_new_tokens(value.parse()?),
        "rep_penalty" => params.clone().with_repetition_penalty(value.parse()?),
        "" => bail!("usage: /set <temperature|top_p|max_tokens|rep_penalty> <value>"),
        other => bail!("unknown setting: {other}"),
    };
    updated.validate()?;
    Ok(updated)
}

fn describe_attachment(att: &Attachment) -> String {
    format!(
        "Attached {} ({} chars).",
        att.path.display(),
        att.content.chars().count()
    )
}

/// Append the user turn, and the assistant turn only when the generation
/// finished with real text. Error fragments and the empty-reply apology stay
/// out of the history that feeds later prompts and cache keys.
fn record_exchange(history: &mut Vec<Message>, prompt: String, reply: String, completed: bool) {
    history.push(Message::user(prompt));
    if completed && !reply.trim().is_empty() {
        history.push(Message::assistant(reply));
    }
}
