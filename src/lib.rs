//! Counsel: a streaming business-advisory chat backend.
//!
//! A user turn enters through [`chat::ChatService::generate_chat_responses`]
//! and runs the conversation state machine ([`graph`]): model inference,
//! optionally a round of web-search tool calls, and back to the model until
//! it answers. Model tokens and tool activity are streamed as SSE frames
//! ([`stream::Frame`]). After each completed turn the session's rolling
//! memory ([`memory`]) is compacted into a one-line summary and pushed to the
//! remote summary store ([`bridge`]).
//!
//! # Quick Start
//!
//! ```no_run
//! use counsel::prelude::*;
//! use futures::StreamExt;
//!
//! # async fn example() -> counsel::error::Result<()> {
//! let service = ChatService::from_config(&CounselConfig::from_env())?;
//! let request = ChatRequest::builder()
//!     .message("I want to open a bakery")
//!     .clerk_id("clerk-1")
//!     .project_id("project-1")
//!     .chat_type("executive_summary")
//!     .build();
//! let mut frames = service.generate_chat_responses(request, CancellationToken::new());
//! while let Some(frame) = frames.next().await {
//!     print!("{}", frame.to_sse());
//! }
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod chat;
pub mod config;
pub mod error;
pub mod graph;
pub mod memory;
pub mod prelude;
pub mod prompts;
pub mod provider;
pub mod session;
pub mod stream;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "server")]
pub mod cli;

#[cfg(feature = "server")]
pub mod server;
