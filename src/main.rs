use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use intentbot_core::agent::{Conversation, ConversationLoop};
use intentbot_core::config::credentials::{self, CredentialStore, FileCredentialStore};
use intentbot_core::config::{self, Config, DispatcherKind};
use intentbot_core::platform;
use intentbot_core::provider;
use intentbot_core::tool::ToolRegistry;

#[derive(Parser)]
#[command(
    name = "intentbot",
    about = format!("{} intentbot - chat with a model that can drive your Android phone", intentbot_core::LOGO),
    version = intentbot_core::VERSION,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the model (omit the message for interactive mode)
    Chat {
        /// Message to send
        message: Vec<String>,
        /// Log intents instead of sending them to a device
        #[arg(long)]
        dry_run: bool,
        /// adb device serial
        #[arg(short, long)]
        serial: Option<String>,
        /// Completion requests allowed per message
        #[arg(long)]
        rounds: Option<u32>,
    },
    /// Manage the stored API key
    Key {
        #[command(subcommand)]
        command: KeyCommands,
    },
    /// Write a default config file
    Init,
    /// Show configuration status
    Status,
    /// Print the tool schema advertised to the model
    Tools,
}

#[derive(Subcommand)]
enum KeyCommands {
    /// Store an API key (read from stdin when omitted)
    Set { key: Option<String> },
    /// Show the stored key, masked
    Show,
    /// Remove the stored key
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("intentbot=info".parse()?)
                .add_directive("intentbot_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chat {
            message,
            dry_run,
            serial,
            rounds,
        } => cmd_chat(message, dry_run, serial, rounds).await?,
        Commands::Key { command } => match command {
            KeyCommands::Set { key } => cmd_key_set(key)?,
            KeyCommands::Show => cmd_key_show()?,
            KeyCommands::Clear => cmd_key_clear()?,
        },
        Commands::Init => cmd_init()?,
        Commands::Status => cmd_status()?,
        Commands::Tools => cmd_tools()?,
    }

    Ok(())
}

// ====== Commands ======

async fn cmd_chat(
    message: Vec<String>,
    dry_run: bool,
    serial: Option<String>,
    rounds: Option<u32>,
) -> Result<()> {
    let mut cfg = config::load_config_from_env();
    if dry_run {
        cfg.device.dispatcher = DispatcherKind::DryRun;
    }
    if serial.is_some() {
        cfg.device.serial = serial;
    }
    if let Some(rounds) = rounds {
        cfg.agent.max_tool_rounds = rounds;
    }

    let store = FileCredentialStore::default_location();
    let api_key = match credentials::resolve_api_key(&store) {
        Ok(key) => key,
        Err(_) => {
            eprintln!("Error: No API key configured.");
            eprintln!("Run `intentbot key set` or export {}", credentials::API_KEY_ENV);
            std::process::exit(1);
        }
    };

    let dispatcher = platform::create_dispatcher(&cfg.device)
        .context("cannot reach a device; pass --dry-run to only log intents")?;
    tracing::info!("Dispatching intents via {}", dispatcher.name());
    let llm_provider: Arc<dyn provider::LlmProvider> = Arc::from(provider::create_provider(
        cfg.provider.api_base.as_deref(),
        &cfg.agent.model,
    ));
    let tools = Arc::new(ToolRegistry::with_defaults(dispatcher));
    let agent = ConversationLoop::from_config(llm_provider, tools, &cfg.agent);
    let mut conversation = Conversation::new(cfg.agent.system_prompt.clone());

    if !message.is_empty() {
        let msg = message.join(" ");
        let response = agent.send_user_message(&mut conversation, &msg, &api_key).await?;
        print_reply(&response);
        return Ok(());
    }

    println!(
        "{} Interactive mode, model {} (/reset clears history, Ctrl+D exits)\n",
        intentbot_core::LOGO,
        agent.model()
    );

    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();
        match input {
            "" => continue,
            "/exit" | "/quit" => break,
            "/reset" => {
                conversation.reset();
                println!("History cleared.\n");
                continue;
            }
            _ => {}
        }

        match agent.send_user_message(&mut conversation, input, &api_key).await {
            Ok(response) => print_reply(&response),
            Err(e) => eprintln!("Error: {e}\n"),
        }
    }

    Ok(())
}

fn print_reply(response: &str) {
    if response.is_empty() {
        println!("\n{} (done)\n", intentbot_core::LOGO);
    } else {
        println!("\n{} {}\n", intentbot_core::LOGO, response);
    }
}

fn cmd_key_set(key: Option<String>) -> Result<()> {
    let key = match key {
        Some(k) => k,
        None => {
            print!("API key: ");
            std::io::stdout().flush()?;
            let mut input = String::new();
            std::io::stdin().read_line(&mut input)?;
            input
        }
    };
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    let store = FileCredentialStore::default_location();
    store.set(credentials::API_KEY, key)?;
    println!("✓ Saved API key to {}", store.path().display());
    Ok(())
}

fn cmd_key_show() -> Result<()> {
    let store = FileCredentialStore::default_location();
    match store.get(credentials::API_KEY) {
        Some(key) if !key.is_empty() => println!("{}", credentials::mask_secret(&key)),
        _ => println!("No API key stored."),
    }
    Ok(())
}

fn cmd_key_clear() -> Result<()> {
    let store = FileCredentialStore::default_location();
    if store.remove(credentials::API_KEY)? {
        println!("✓ Removed stored API key");
    } else {
        println!("No API key stored.");
    }
    Ok(())
}

fn cmd_init() -> Result<()> {
    let config_path = config::get_config_path();

    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
        println!("Delete it first to re-initialize.");
        return Ok(());
    }

    config::save_config(&Config::default(), None)?;
    println!("{} Created config at {}", intentbot_core::LOGO, config_path.display());
    println!("\nNext steps:");
    println!("  1. intentbot key set");
    println!("  2. intentbot chat \"Call mom\"");
    Ok(())
}

fn cmd_status() -> Result<()> {
    let config_path = config::get_config_path();
    let cfg = config::load_config_from_env();
    let store = FileCredentialStore::default_location();

    println!("{} intentbot Status\n", intentbot_core::LOGO);
    println!(
        "Config: {} {}",
        config_path.display(),
        if config_path.exists() { "✓" } else { "✗" }
    );
    println!("Model: {}", cfg.agent.model);
    println!(
        "API base: {}",
        cfg.provider
            .api_base
            .as_deref()
            .unwrap_or(provider::openai_compat::DEFAULT_API_BASE)
    );
    println!(
        "API key: {}",
        match credentials::resolve_api_key(&store) {
            Ok(key) => format!("✓ {}", credentials::mask_secret(&key)),
            Err(_) => "not set".to_string(),
        }
    );
    println!("Tool rounds: {}", cfg.agent.max_tool_rounds);

    let device = match platform::create_dispatcher(&cfg.device) {
        Ok(d) => format!("✓ {}", d.name()),
        Err(e) => format!("✗ {e}"),
    };
    println!("Dispatcher: {device}");
    if let Some(ref serial) = cfg.device.serial {
        println!("Device serial: {serial}");
    }

    Ok(())
}

fn cmd_tools() -> Result<()> {
    let tools = ToolRegistry::with_defaults(Arc::new(platform::dry_run::DryRunDispatcher::new()));
    let defs = tools.definitions();
    println!("{}", serde_json::to_string_pretty(&defs)?);
    Ok(())
}
