mod config;
mod error;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use runtime::{AnthropicBackend, Backend, McpToolHost, OpenAiBackend, Session, ToolHost};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use config::{Config, Overrides, Provider, Settings};
use error::Result;

const SYSTEM_PROMPT: &str = "\
You are a helpful assistant, and you will try your best to help the user.
You won't give up on the first try, and you will be creative in solving the user's problem.
When the first thing you tried fails, come up with alternatives.
Before and after you do anything, think about it first.

<think>think about the situation</think>
Before doing anything, think about the situation.

<action>what you should do</action>
Once you have fully reasoned about the situation, act accordingly.

<reflect>reflect on what you did and the result of your action</reflect>
Every time you do something, reflect on the result. Is it what you expected? \
If not, think about what else you could have done.

Continue the cycle until completion.";

#[derive(Parser)]
#[command(name = "skiff")]
#[command(about = "Chat with an LLM that can call MCP tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the MCP server (.py runs under python, .js under node)
    server: PathBuf,

    /// Run a single query, print the answer and exit
    #[arg(short, long)]
    query: Option<String>,

    /// LLM provider
    #[arg(short, long, value_enum)]
    provider: Option<Provider>,

    /// Model name
    #[arg(short, long)]
    model: Option<String>,

    /// Config file (defaults to ./skiff.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Config::discover(cli.config.as_deref())?.resolve(
        Overrides {
            provider: cli.provider,
            model: cli.model,
        },
        |name| std::env::var(name).ok(),
    )?;
    debug!(?settings, "resolved settings");

    let tools = McpToolHost::spawn(&cli.server).await?;
    info!(server = %cli.server.display(), "connected to tool server");

    match settings.provider {
        Provider::Anthropic => {
            let mut builder = AnthropicBackend::builder(&settings.api_key, &settings.model);
            if let Some(max_tokens) = settings.max_tokens {
                builder = builder.max_tokens(max_tokens);
            }
            if let Some(url) = &settings.base_url {
                builder = builder.base_url(url);
            }
            drive(builder.build(), tools, &settings, cli.query).await
        }
        Provider::OpenAi => {
            let mut builder = OpenAiBackend::builder(&settings.api_key, &settings.model);
            if let Some(max_tokens) = settings.max_tokens {
                builder = builder.max_tokens(max_tokens);
            }
            if let Some(url) = &settings.base_url {
                builder = builder.base_url(url);
            }
            drive(builder.build(), tools, &settings, cli.query).await
        }
    }
}

async fn drive<B: Backend>(
    backend: B,
    tools: McpToolHost,
    settings: &Settings,
    query: Option<String>,
) -> Result<()> {
    let mut session = Session::new(backend, tools).with_system(system_prompt(settings));
    if let Some(rounds) = settings.max_tool_rounds {
        session = session.with_max_tool_rounds(rounds);
    }

    let outcome = match query {
        Some(query) => one_shot(&mut session, &query).await,
        None => chat_loop(&mut session, settings).await,
    };

    let usage = session.usage();
    debug!(
        input_tokens = usage.input_tokens,
        output_tokens = usage.output_tokens,
        "session finished"
    );
    session.into_tool_host().shutdown().await?;
    outcome
}

/// The configured system prompt, or the think/act/reflect default.
fn system_prompt(settings: &Settings) -> &str {
    settings.system_prompt.as_deref().unwrap_or(SYSTEM_PROMPT)
}

async fn one_shot<B: Backend>(session: &mut Session<B, McpToolHost>, query: &str) -> Result<()> {
    let response = session.respond(query).await?;
    println!("{response}");
    Ok(())
}

async fn chat_loop<B: Backend>(
    session: &mut Session<B, McpToolHost>,
    settings: &Settings,
) -> Result<()> {
    let names: Vec<String> = session
        .tool_host()
        .list_tools()
        .await?
        .into_iter()
        .map(|spec| spec.name)
        .collect();

    println!("skiff v{}", env!("CARGO_PKG_VERSION"));
    println!("Connected to server with tools: {}", names.join(", "));
    println!("Model: {} ({})", settings.model, settings.provider);
    println!("Type your queries or 'quit' to exit.");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("\nQuery: ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            break;
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("quit") {
            break;
        }

        match session.respond(input).await {
            Ok(response) => println!("\n{response}"),
            Err(e) => eprintln!("\nError: {e}"),
        }
    }

    Ok(())
}
