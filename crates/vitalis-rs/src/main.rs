use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use vitalis_rs::config::{LayeredConfigOptions, VitalisConfig};
use vitalis_rs::{Assistant, ChatRequest, ModelGateway, init_logging};

#[derive(Parser, Debug)]
#[command(name = "vitalis", author, version, about = "Memory-augmented health assistant")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API until Ctrl-C
    Serve {
        /// Extra config file applied on top of the discovered layers
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Listen address (overrides config)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Chat with the assistant from the terminal
    Chat {
        /// User whose memories are read and written
        #[arg(short, long)]
        user: String,
        /// Continue an existing thread
        #[arg(short, long)]
        thread: Option<String>,
        /// Extra config file applied on top of the discovered layers
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Seed a generated health profile before chatting
        #[arg(long)]
        seed: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    match Cli::parse().command {
        Command::Serve { config, bind } => serve(config, bind).await,
        Command::Chat {
            user,
            thread,
            config,
            seed,
        } => chat(config, user, thread, seed).await,
    }
}

fn load_config(path: Option<PathBuf>) -> Result<VitalisConfig> {
    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    let mut options = LayeredConfigOptions::new(&cwd);
    if let Some(path) = path {
        options = options.with_runtime_path(path);
    }
    let layered = VitalisConfig::load_layered_with_options(options)?;
    info!("config loaded (layers={})", layered.layers.len());
    Ok(layered.config)
}

fn build_assistant(config: VitalisConfig) -> Result<Assistant> {
    let gateway = ModelGateway::from_config(&config.model)?;
    Ok(Assistant::builder(config, gateway).build()?)
}

async fn serve(config: Option<PathBuf>, bind: Option<String>) -> Result<()> {
    let mut config = load_config(config)?;
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    let server = config.server.clone();
    let assistant = build_assistant(config)?;
    vitalis_rs::server::serve(assistant, &server, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {}", err);
        }
        info!("shutdown requested");
    })
    .await?;
    Ok(())
}

async fn chat(
    config: Option<PathBuf>,
    user: String,
    mut thread: Option<String>,
    seed: bool,
) -> Result<()> {
    let assistant = build_assistant(load_config(config)?)?;
    if seed {
        let profile = assistant.initialize_user(&user).await?;
        println!(
            "Seeded health profile for {user}: {} steps today, resting HR {} bpm.",
            profile.daily_stats.steps, profile.heart_rate.resting
        );
    }
    println!("Chatting as {user} with {}. Type /exit to quit.", assistant.model_id());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "/exit" | "/quit") {
            break;
        }
        let mut request = ChatRequest::new(user.clone(), line);
        if let Some(thread_id) = &thread {
            request = request.in_thread(thread_id.clone());
        }
        match assistant.chat(request).await {
            Ok(reply) => {
                println!("vitalis> {}", reply.response);
                thread = Some(reply.thread_id);
            }
            Err(err) => eprintln!("error: {err}"),
        }
    }
    if let Some(thread_id) = thread {
        println!("Thread: {thread_id}");
    }
    Ok(())
}
