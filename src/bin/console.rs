//! Line-oriented terminal driver for the operator console

use std::collections::HashMap;
use std::path::PathBuf;

use a3s_console::{
    ChatEvent, Console, ConsoleConfig, MetricsEvent, NotificationEvent, NotificationKind,
    PromptEvent, Speaker, ToolEvent, ToolRow, TranscriptEntry,
};
use clap::Parser;
use colored::Colorize;
use parking_lot::Mutex;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(
    name = "a3s-console",
    about = "a3s-console — operator console for an A3S agent service"
)]
struct Cli {
    /// Agent service origin (overrides config and A3S_CONSOLE_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// User id to start the session with
    #[arg(long)]
    user_id: Option<String>,

    /// Path to a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Send(String),
    User(String),
    /// Show the prompt, or save a new one
    Prompt(Option<String>),
    Tools,
    Toggle(String),
    Apply,
    Metrics,
    Reload,
    Help,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(Command::Send(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    let command = match name {
        "user" => Command::User(arg.to_string()),
        "prompt" if arg.is_empty() => Command::Prompt(None),
        "prompt" => Command::Prompt(Some(arg.to_string())),
        "tools" => Command::Tools,
        "toggle" => Command::Toggle(arg.to_string()),
        "apply" => Command::Apply,
        "metrics" => Command::Metrics,
        "reload" => Command::Reload,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    };
    Some(command)
}

const HELP: &str = "\
  <text>           send a message
  /user <id>       switch user and reload the transcript
  /prompt [text]   show or replace the system prompt
  /tools           list tools
  /toggle <tool>   flip a tool's checkbox
  /apply           submit the tool selection
  /metrics         show the last metrics summary
  /reload          reload the transcript
  /quit            exit";

fn print_entry(entry: &TranscriptEntry) {
    match entry {
        TranscriptEntry::Message {
            speaker: Speaker::User,
            text,
        } => println!("{} {}", "you>".bold(), text),
        TranscriptEntry::Message {
            speaker: Speaker::Assistant,
            text,
        } => println!("{} {}", "agent>".cyan().bold(), text),
        TranscriptEntry::Welcome(text) => println!("{} {}", "agent>".cyan().bold(), text.italic()),
        TranscriptEntry::Placeholder(_) => println!("{}", "...".dimmed()),
    }
}

fn print_rows(rows: &[ToolRow]) {
    for row in rows {
        let mark = if row.checked { "[x]" } else { "[ ]" };
        println!("  {} {} {}", mark, row.name.bold(), row.description.dimmed());
    }
}

fn attach_printers(console: &Console) {
    // banners print once they become visible
    let entering = Mutex::new(HashMap::new());
    console.notifications().listeners().subscribe(move |event| match event {
        NotificationEvent::Added(banner) => {
            entering
                .lock()
                .insert(banner.id.clone(), (banner.kind, banner.message.clone()));
        }
        NotificationEvent::Shown { id } => {
            if let Some((kind, message)) = entering.lock().remove(id) {
                let tag = match kind {
                    NotificationKind::Error => "[error]".red().bold(),
                    NotificationKind::Success => "[ok]".green().bold(),
                    NotificationKind::Info => "[info]".blue().bold(),
                };
                println!("{} {}", tag, message);
            }
        }
        _ => {}
    });

    console.chat().listeners().subscribe(|event| match event {
        ChatEvent::Reset(entries) => entries.iter().for_each(print_entry),
        ChatEvent::Resolved { entry, .. } => print_entry(entry),
        ChatEvent::StatsUpdated { latency, tokens } => {
            println!("{}", format!("latency {}  tokens {}", latency, tokens).dimmed())
        }
        ChatEvent::UserChanged(user_id) => println!("{} {}", "user:".dimmed(), user_id),
        _ => {}
    });

    console.tools().listeners().subscribe(|event| match event {
        ToolEvent::Failed(message) => println!("{} {}", "[tools]".red(), message),
        ToolEvent::Toggled { name, checked } => {
            println!("  {} {}", if *checked { "[x]" } else { "[ ]" }, name)
        }
        _ => {}
    });

    console.prompt().listeners().subscribe(|event| {
        if let PromptEvent::Loaded(prompt) = event {
            println!("{} {}", "system prompt:".dimmed(), prompt);
        }
    });

    console.metrics().listeners().subscribe(|event| {
        if let MetricsEvent::Updated(sections) = event {
            sections.iter().for_each(|s| print!("{}", s));
        }
    });
}

fn load_config(cli: &Cli) -> a3s_console::Result<ConsoleConfig> {
    let config = match &cli.config {
        Some(path) => ConsoleConfig::from_file(path)?,
        None => ConsoleConfig::default(),
    };
    let mut config = config.from_env()?;
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    if let Some(user) = &cli.user_id {
        config.default_user_id = user.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Why the command loop stopped
#[derive(Debug, PartialEq, Eq)]
enum ReplExit {
    Quit,
    Eof,
    ReadError,
}

async fn repl<R: AsyncBufRead + Unpin>(console: &Console, input: R) -> ReplExit {
    let mut lines = input.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return ReplExit::Eof,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read command input");
                return ReplExit::ReadError;
            }
        };
        // Panel failures were already reported through banners
        let Some(command) = parse_command(&line) else {
            continue;
        };
        match command {
            Command::Send(text) => {
                let user_id = console.chat().user_id();
                let _ = console.chat().send_message(&text, &user_id).await;
            }
            Command::User(user_id) => {
                let _ = console.chat().set_user_id(&user_id).await;
            }
            Command::Prompt(None) => {
                let _ = console.prompt().load().await;
            }
            Command::Prompt(Some(text)) => {
                let _ = console.prompt().save(&text).await;
            }
            Command::Tools => print_rows(&console.tools().rows()),
            Command::Toggle(name) => {
                if console.tools().toggle(&name).is_none() {
                    println!("{} unknown tool {}", "[tools]".red(), name);
                }
            }
            Command::Apply => {
                if let Err(e) = console.tools().update().await {
                    tracing::debug!(error = %e, "Tool update failed");
                }
            }
            Command::Metrics => match console.metrics().view() {
                a3s_console::MetricsView::Summary(sections) => {
                    sections.iter().for_each(|s| print!("{}", s))
                }
                a3s_console::MetricsView::Loading => println!("{}", a3s_console::metrics::LOADING_TEXT),
                a3s_console::MetricsView::Empty => println!("{}", "no metrics yet".dimmed()),
            },
            Command::Reload => {
                let _ = console.chat().reload().await;
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => return ReplExit::Quit,
            Command::Unknown(name) => println!("unknown command /{} (try /help)", name),
        }
    }
}

async fn run(cli: Cli) -> a3s_console::Result<()> {
    let config = load_config(&cli)?;
    let console = Console::connect(config)?;
    attach_printers(&console);

    if !console.backend().health().await.unwrap_or(false) {
        println!(
            "{} {} is not reporting healthy",
            "[warn]".yellow().bold(),
            console.config().base_url
        );
    }
    console.start().await;
    println!("{}", "Type /help for commands.".dimmed());

    let exit = repl(&console, BufReader::new(tokio::io::stdin())).await;
    tracing::debug!(?exit, "Command loop finished");
    console.teardown();
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("{} {e}", "[a3s-console]".red().bold());
        std::process::exit(1);
    }
}
