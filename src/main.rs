//! SpendLens CLI
//!
//! Command-line front end for the expense assistant:
//! - Sign in / out and show the current user
//! - List expense charts and expenses, generate charts from a prompt
//! - Chat with the assistant

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spendlens::config::generate_default_config;
use spendlens::{
    validate_login, validate_register, BackendMode, ChatTurn, Config, ExpenseChart, ExpenseItem,
    FieldErrors, LoggingConfig, LoginCredentials, RegisterCredentials, Sender, SpendLens,
};

#[derive(Parser)]
#[command(name = "spendlens")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Expense tracking with an AI assistant")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Expense API URL (overrides config)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Backend mode: remote, mock or fallback (overrides config);
    /// mock sessions are not kept between runs
    #[arg(long, global = true)]
    pub mode: Option<BackendMode>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in
    Login {
        email: String,
        #[arg(short, long)]
        password: String,
    },

    /// Create an account and sign in
    Register {
        name: String,
        email: String,
        #[arg(short, long)]
        password: String,
        /// Password confirmation (default: same as --password)
        #[arg(long)]
        confirm: Option<String>,
    },

    /// Sign out and forget the saved session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// List expense charts
    Charts,

    /// List recorded expenses
    Expenses,

    /// Generate a chart from a natural-language prompt
    Generate {
        prompt: Vec<String>,
    },

    /// Send a message to the assistant
    Chat {
        message: Vec<String>,
    },

    /// Show the chat history
    History,

    /// Show suggested chat prompts
    Suggestions,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Config decides the real log settings, so loading it logs through a
    // provisional stderr subscriber.
    let provisional = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spendlens=info".into()),
        )
        .with_writer(std::io::stderr)
        .finish();
    let mut config = tracing::subscriber::with_default(provisional, Config::load_default)
        .context("Failed to load configuration")?;
    if let Some(url) = cli.api_url.clone() {
        config.api.base_url = url;
    }
    if let Some(mode) = cli.mode {
        config.backend.mode = mode;
    }

    init_tracing(&config.logging);

    let app = SpendLens::new(&config).context("Failed to start backend")?;
    if !matches!(cli.command, Commands::Config { .. } | Commands::Suggestions) {
        app.auth.initialize().await;
    }
    let json = cli.format == "json";

    match cli.command {
        Commands::Login { email, password } => {
            let credentials = LoginCredentials::new(email, password);
            validate_login(&credentials).map_err(invalid_form)?;

            let user = app.auth.login(&credentials).await?;
            println!("Signed in as {} <{}>", user.name, user.email);
        }

        Commands::Register {
            name,
            email,
            password,
            confirm,
        } => {
            let credentials = RegisterCredentials {
                name,
                email,
                confirm_password: confirm.unwrap_or_else(|| password.clone()),
                password,
            };
            validate_register(&credentials).map_err(invalid_form)?;

            let user = app.auth.register(&credentials).await?;
            println!("Welcome, {}! Signed in as {}", user.name, user.email);
        }

        Commands::Logout => {
            app.auth.logout().await;
            println!("Signed out");
        }

        Commands::Whoami => match app.auth.user() {
            Some(user) if json => println!("{}", serde_json::to_string_pretty(&user)?),
            Some(user) => {
                println!("{:<8} {}", "Name", user.name);
                println!("{:<8} {}", "Email", user.email);
                println!("{:<8} {}", "ID", user.id);
                println!("{:<8} {}", "Initials", user.initials());
            }
            None => println!("Not signed in"),
        },

        Commands::Charts => {
            if let Err(message) = app.expenses.refresh_charts().await {
                bail!(message);
            }
            let charts = app.expenses.charts().data;
            if json {
                println!("{}", serde_json::to_string_pretty(&charts)?);
            } else if charts.is_empty() {
                println!("No charts yet.");
            } else {
                for chart in &charts {
                    print_chart(chart);
                }
            }
        }

        Commands::Expenses => {
            if let Err(message) = app.expenses.refresh_expenses().await {
                bail!(message);
            }
            let expenses = app.expenses.expenses().data;
            if json {
                println!("{}", serde_json::to_string_pretty(&expenses)?);
            } else {
                print_expenses(&expenses);
            }
        }

        Commands::Generate { prompt } => {
            let prompt = prompt.join(" ");
            if prompt.trim().is_empty() {
                bail!("Prompt is required");
            }
            match app.expenses.generate_chart(&prompt).await {
                Some(chart) if json => println!("{}", serde_json::to_string_pretty(&chart)?),
                Some(chart) => print_chart(&chart),
                None => bail!(app
                    .expenses
                    .charts()
                    .error
                    .unwrap_or_else(|| "Failed to generate chart".to_string())),
            }
        }

        Commands::Chat { message } => {
            let message = message.join(" ");
            if message.trim().is_empty() {
                bail!("Message is required");
            }
            match app.chat.send_message(&message).await {
                Ok(Some(reply)) if json => println!("{}", serde_json::to_string_pretty(&reply)?),
                Ok(Some(reply)) => println!("{}", reply.content),
                Ok(None) => {}
                Err(message) => bail!(message),
            }
        }

        Commands::History => {
            if let Err(message) = app.chat.load_history().await {
                bail!(message);
            }
            let turns = app.chat.turns();
            if json {
                println!("{}", serde_json::to_string_pretty(&turns)?);
            } else if turns.is_empty() {
                println!("No messages yet. Try one of `spendlens suggestions`.");
            } else {
                for turn in &turns {
                    print_turn(turn);
                }
            }
        }

        Commands::Suggestions => {
            for suggestion in app.chat.suggestions() {
                println!("  {}", suggestion);
            }
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &content)?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

/// Initialize tracing from the logging config; logs go to stderr
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("spendlens={}", logging.level).into());

    if logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn invalid_form(errors: FieldErrors) -> anyhow::Error {
    for (field, message) in errors.iter() {
        eprintln!("  {:<18} {}", field, message);
    }
    anyhow::anyhow!("Invalid input")
}

fn print_chart(chart: &ExpenseChart) {
    println!();
    println!("{} [{}, {}]", chart.title, chart.kind, chart.period);
    println!("{}", "-".repeat(40));
    for datum in &chart.data {
        println!("{:<28} {:>11.2}", datum.name, datum.value);
    }
    println!("{}", "-".repeat(40));
    println!("{:<28} {:>11.2}", "Total", chart.total());
}

fn print_expenses(expenses: &[ExpenseItem]) {
    if expenses.is_empty() {
        println!("No expenses recorded.");
        return;
    }

    println!(
        "{:<12} {:<16} {:>10}  {}",
        "Date", "Category", "Amount", "Description"
    );
    println!("{}", "-".repeat(64));

    for item in expenses {
        println!(
            "{:<12} {:<16} {:>10.2}  {}",
            item.date, item.category, item.amount, item.description
        );
    }

    let total: f64 = expenses.iter().map(|e| e.amount).sum();
    println!("{}", "-".repeat(64));
    println!("{:<12} {:<16} {:>10.2}", "", "Total", total);
}

fn print_turn(turn: &ChatTurn) {
    let who = match turn.sender {
        Sender::User => "you",
        Sender::Assistant => "assistant",
    };
    println!(
        "[{}] {:>9}: {}",
        turn.timestamp.format("%Y-%m-%d %H:%M"),
        who,
        turn.content
    );
}
