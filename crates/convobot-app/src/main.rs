//! ConvoBot application binary - composition root.
//!
//! Ties the workspace crates together into an interactive terminal client:
//! 1. Load configuration from TOML (CLI flags override)
//! 2. Initialize tracing
//! 3. Build the HTTP client (or in-memory mocks with `--mock`)
//! 4. Run the line-based chat loop
//!
//! Microphone capture goes through the `CaptureDevice` seam. No platform
//! backend ships in this workspace, so `/record` is denied unless running
//! with `--mock`; a desktop integration plugs in its own device here.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use convobot_capture::{CaptureDevice, DeniedCaptureDevice, MockCaptureDevice};
use convobot_chat::{
    AnswerService, ChatSession, ConversationBackend, MockAnswerService, MockConversationBackend,
    MockTranscriptionService, TranscriptionService,
};
use convobot_client::ApiClient;
use convobot_core::config::ConvoConfig;
use convobot_core::types::{Attachment, AttachmentKind, ViewContext};

#[derive(Parser, Debug)]
#[command(name = "convobot", about = "ConvoBot terminal chat client")]
struct Cli {
    /// Path to the config file.
    #[arg(long, env = "CONVOBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Backend base URL (overrides config).
    #[arg(long, env = "CONVOBOT_BASE_URL")]
    base_url: Option<String>,

    /// Bearer token for backend requests (overrides config).
    #[arg(long, env = "CONVOBOT_TOKEN")]
    token: Option<String>,

    /// Id of the call/file being viewed, scoping queries to it.
    #[arg(long, requires = "context_file")]
    context_id: Option<String>,

    /// Filename of the call/file being viewed.
    #[arg(long, requires = "context_id")]
    context_file: Option<String>,

    /// Run against in-memory mocks instead of a live backend.
    #[arg(long)]
    mock: bool,
}

fn config_path(cli: &Cli) -> PathBuf {
    if let Some(path) = &cli.config {
        return path.clone();
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".convobot").join("config.toml")
}

/// Collaborators the session is wired from, either live or mocked.
struct Services {
    backend: Arc<dyn ConversationBackend>,
    answers: Arc<dyn AnswerService>,
    transcriber: Arc<dyn TranscriptionService>,
    device: Arc<dyn CaptureDevice>,
}

fn build_services(cli: &Cli, config: &ConvoConfig) -> Result<Services, Box<dyn std::error::Error>> {
    if cli.mock {
        tracing::info!("Running against in-memory mocks");
        return Ok(Services {
            backend: Arc::new(MockConversationBackend::new()),
            answers: Arc::new(MockAnswerService::new(
                "This is a mock answer. Start the backend and drop --mock for real ones.",
            )),
            transcriber: Arc::new(MockTranscriptionService::new("mock transcript")),
            device: Arc::new(MockCaptureDevice::new(vec![vec![0u8; 1024]])),
        });
    }

    let mut backend_config = config.backend.clone();
    if let Some(base_url) = &cli.base_url {
        backend_config.base_url = base_url.clone();
    }
    if let Some(token) = &cli.token {
        backend_config.auth_token = Some(token.clone());
    }
    let client = Arc::new(ApiClient::from_config(&backend_config)?);
    tracing::info!(base_url = %client.base_url(), "Backend client ready");

    Ok(Services {
        backend: Arc::clone(&client) as _,
        answers: Arc::clone(&client) as _,
        transcriber: client as _,
        device: Arc::new(DeniedCaptureDevice),
    })
}

fn mime_for_extension(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("pdf") => "application/pdf",
        Some("txt") | Some("md") => "text/plain",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("webm") => "audio/webm",
        Some("m4a") => "audio/mp4",
        _ => "application/octet-stream",
    }
}

fn load_file_attachment(raw_path: &str) -> std::io::Result<Attachment> {
    let path = std::path::Path::new(raw_path.trim());
    let data = std::fs::read(path)?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("attachment")
        .to_string();
    Ok(Attachment {
        kind: AttachmentKind::File,
        mime_type: mime_for_extension(path).to_string(),
        data,
        name,
    })
}

fn print_help() {
    println!("Commands:");
    println!("  /new            start a new conversation");
    println!("  /list           list saved conversations");
    println!("  /load <id>      load a saved conversation");
    println!("  /delete <id>    delete a saved conversation");
    println!("  /record         start a voice recording");
    println!("  /stop           stop recording and stage it for the next send");
    println!("  /attach <path>  stage a file for the next send");
    println!("  /cancel         discard the staged attachment");
    println!("  /quit           exit");
    println!("Anything else is sent as a message; an empty line sends a staged attachment.");
}

fn print_transcript(session: &ChatSession) {
    for message in session.messages() {
        println!("[{}] {}", message.role, message.content);
    }
}

async fn handle_line(session: &mut ChatSession, line: &str) -> bool {
    let line = line.trim();
    let (command, rest) = match line.split_once(' ') {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };

    match command {
        "/quit" | "/exit" => return false,
        "/help" => print_help(),
        "/new" => {
            session.new_conversation();
            println!("[{}] {}", session.messages()[0].role, session.messages()[0].content);
        }
        "/list" => {
            session.refresh_summaries().await;
            if session.summaries().is_empty() {
                println!("(no saved conversations)");
            }
            for summary in session.summaries() {
                println!(
                    "{}  {} ({} messages)",
                    summary.id, summary.title, summary.message_count
                );
            }
        }
        "/load" if !rest.is_empty() => {
            session.load_conversation(rest).await;
            print_transcript(session);
        }
        "/delete" if !rest.is_empty() => {
            session.delete_conversation(rest).await;
        }
        "/record" => match session.start_recording().await {
            Ok(()) => println!("(recording... /stop to finish)"),
            Err(e) => println!("error: {}", e),
        },
        "/stop" => match session.stop_recording() {
            Ok(()) => {
                let name = session
                    .staged_attachment()
                    .map(|a| a.name)
                    .unwrap_or_default();
                println!("(staged {}; press enter to send it)", name);
            }
            Err(e) => println!("error: {}", e),
        },
        "/attach" if !rest.is_empty() => match load_file_attachment(rest) {
            Ok(attachment) => match session.attach_file(attachment) {
                Ok(()) => println!("(attachment staged)"),
                Err(e) => println!("error: {}", e),
            },
            Err(e) => println!("error: failed to read {}: {}", rest, e),
        },
        "/cancel" => {
            session.clear_attachment();
        }
        _ if command.starts_with('/') => {
            println!("unknown command: {} (try /help)", command);
        }
        _ => {
            if !session.can_send(line) {
                return true;
            }
            match session.send(line).await {
                Ok(()) => {
                    if let Some(reply) = session.messages().last() {
                        println!("[{}] {}", reply.role, reply.content);
                    }
                }
                Err(e) => println!("error: {}", e),
            }
        }
    }
    true
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_file = config_path(&cli);
    let config = ConvoConfig::load_or_default(&config_file);

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting ConvoBot v{}", env!("CARGO_PKG_VERSION"));

    let context = match (&cli.context_id, &cli.context_file) {
        (Some(id), Some(filename)) => Some(ViewContext {
            id: id.clone(),
            filename: filename.clone(),
        }),
        _ => None,
    };

    let services = build_services(&cli, &config)?;
    let mut session = ChatSession::new(
        services.backend,
        services.answers,
        services.transcriber,
        services.device,
        &config,
        context,
    );

    println!("[{}] {}", session.messages()[0].role, session.messages()[0].content);
    println!("(type /help for commands)");

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    loop {
        if session.is_recording() {
            print!("recording ({}s)> ", session.recording_elapsed_secs());
        } else {
            print!("you> ");
        }
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        if !handle_line(&mut session, &line).await {
            break;
        }
    }

    tracing::info!("ConvoBot exiting");
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
