//! `counsel` binary entry point.

use clap::Parser;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use counsel::chat::{ChatRequest, ChatService};
use counsel::cli::{ChatArgs, Cli, Commands};
use counsel::config::CounselConfig;
use counsel::stream::Frame;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => CounselConfig::load_file(path)?,
        None => CounselConfig::from_env(),
    };
    config.require_openai_key()?;
    let service = ChatService::from_config(&config)?;

    match cli.command {
        Commands::Serve(args) => {
            let addr = args.bind.unwrap_or_else(|| config.bind_addr.clone());
            counsel::server::serve(service, &addr).await?;
        }
        Commands::Chat(args) => handle_chat(&service, args).await,
    }
    Ok(())
}

async fn handle_chat(service: &ChatService, args: ChatArgs) {
    use std::io::Write;

    let request = ChatRequest {
        message: args.message,
        checkpoint_id: args.checkpoint_id,
        clerk_id: args.clerk_id,
        project_id: args.project_id,
        chat_type: args.chat_type,
    };
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let mut frames = service.generate_chat_responses(request, cancel);
    let mut stdout = std::io::stdout();
    while let Some(frame) = frames.next().await {
        if args.raw {
            print!("{}", frame.to_sse());
            continue;
        }
        match frame {
            Frame::Checkpoint { checkpoint_id } => eprintln!("checkpoint: {checkpoint_id}"),
            Frame::Content { content } => {
                print!("{content}");
                let _ = stdout.flush();
            }
            Frame::SearchStart { query } => eprintln!("\n[search] {query}"),
            Frame::SearchResults { urls } => {
                for url in urls {
                    eprintln!("  - {url}");
                }
            }
            Frame::Error { reason } => eprintln!("\nerror: {reason}"),
            Frame::End => println!(),
        }
    }
}
