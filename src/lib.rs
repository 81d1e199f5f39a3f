//! Brook: a streaming response orchestrator for chat models.
//!
//! Consumes a provider's interleaved event stream and turns it into text
//! deltas for the client, reassembled and stored images, and a tool-calling
//! loop that resumes the model with tool results.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use brook::prelude::*;
//!
//! # async fn example() -> brook::error::Result<()> {
//! let config = BrookConfig::load()?;
//! let provider = brook::provider::create_provider(&config)?;
//! let store = Arc::new(FsBlobStore::new(config.image_dir(), config.image_base_url()));
//! let runner = StreamRunner::new(provider, Arc::new(ToolRegistry::new()), store);
//! let orchestrator = Orchestrator::from_config(runner, &config);
//!
//! let (emitter, mut events) = ChannelEmitter::channel(64);
//! tokio::spawn(async move {
//!     while let Some(event) = events.recv().await {
//!         print!("{}", event.to_sse_frame());
//!     }
//! });
//!
//! let request = ResponseRequest::builder()
//!     .model(config.model())
//!     .input(vec![InputItem::user("Hello!")])
//!     .build();
//! let outcome = orchestrator
//!     .run_turn(request, &ToolContext::new("session-1"), &emitter, &CancellationToken::new())
//!     .await?;
//! println!("{}", outcome.text);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod images;
pub mod orchestrator;
pub mod policy;
pub mod prelude;
pub mod provider;
pub mod stream;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
