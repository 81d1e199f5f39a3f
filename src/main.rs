//! Brook CLI binary entry point.

use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use serde_json::json;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use brook::cli::{ChatArgs, Cli, Commands};
use brook::config::BrookConfig;
use brook::images::FsBlobStore;
use brook::orchestrator::Orchestrator;
use brook::stream::{ChannelEmitter, StreamRunner};
use brook::tools::{FnTool, ToolContext, ToolRegistry};
use brook::types::{BuiltInTool, InputItem, ResponseRequest, ToolSpec};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Chat(args) => handle_chat(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn handle_chat(args: ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = BrookConfig::load()?;
    if let Some(model) = args.model {
        config = config.with_model(model);
    }
    if args.strict {
        config = config.with_strict_policy(true);
    }

    let registry = ToolRegistry::new().with_tool(Arc::new(current_time_tool()));
    let mut tools: Vec<ToolSpec> = registry.specs();
    if args.image {
        tools.push(BuiltInTool::ImageGeneration.into());
    }

    let provider = brook::provider::create_provider(&config)?;
    let store = Arc::new(FsBlobStore::new(
        config.image_dir(),
        config.image_base_url(),
    ));
    let runner = StreamRunner::new(provider, Arc::new(registry), store);
    let orchestrator = Orchestrator::from_config(runner, &config);

    let request = ResponseRequest::builder()
        .model(config.model())
        .maybe_instructions(args.instructions)
        .input(vec![InputItem::user(args.prompt)])
        .tools(tools)
        .maybe_reasoning_effort(args.effort)
        .build();

    let (emitter, events) = ChannelEmitter::channel(64);
    let printer = tokio::spawn(async move {
        let mut frames = ReceiverStream::new(events).map(|event| event.to_sse_frame());
        let mut stdout = std::io::stdout();
        while let Some(frame) = frames.next().await {
            let _ = stdout.write_all(frame.as_bytes());
            let _ = stdout.flush();
        }
    });

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let ctx = ToolContext::new(uuid::Uuid::new_v4().to_string());
    let outcome = orchestrator.run_turn(request, &ctx, &emitter, &cancel).await;
    drop(emitter);
    let _ = printer.await;

    let outcome = outcome?;
    eprintln!(
        "\n[{} round(s), {} image(s){}]",
        outcome.rounds,
        outcome.images.len(),
        if outcome.round_limit_reached {
            ", round limit reached"
        } else {
            ""
        }
    );
    Ok(())
}

fn current_time_tool() -> FnTool {
    FnTool::new(
        "current_time",
        "Get the current UTC date and time",
        json!({"type": "object", "properties": {}}),
        |_args, _ctx| async move { Ok(json!({ "utc": chrono::Utc::now().to_rfc3339() })) },
    )
}
