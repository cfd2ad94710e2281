// Suluk - command-line client entry point

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use suluk_client::commands;
use suluk_client::utils::paths::suluk_dir;
use suluk_client::{AnalysisResult, AppResult, AppState, CommandResponse, SettingsUpdate, StateOptions};

#[derive(Parser)]
#[command(name = "suluk", version)]
#[command(about = "Command-line client for the Suluk records service", long_about = None)]
struct Cli {
    /// API base URL, overriding config.json and the host rule
    #[arg(long, env = "SULUK_API_URL", global = true)]
    api_url: Option<String>,

    /// Directory holding config.json and credentials.json
    #[arg(long, env = "SULUK_HOME", global = true)]
    config_dir: Option<PathBuf>,

    /// Password for the configured proxy (never written to config.json)
    #[arg(long, env = "SULUK_PROXY_PASSWORD", hide_env_values = true, global = true)]
    proxy_password: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Exchange username and password for a session
    Login {
        username: String,
        #[arg(long, env = "SULUK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account
    Register {
        username: String,
        #[arg(long, env = "SULUK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in identity
    Whoami,
    /// List client records
    Clients,
    /// List narrative models offered by the server
    Models,
    /// Analyze a client's purchase history
    Analyze {
        client_id: i64,
        /// Output language ("en" or "ar")
        #[arg(long)]
        lang: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
    /// Show or change config.json
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Show,
    Set {
        #[arg(long)]
        base_url: Option<String>,
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        lang: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// scheme://[user@]host:port; pass the password with --proxy-password
        #[arg(long)]
        proxy: Option<String>,
    },
    Reset,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_env("SULUK_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
}

/// Print `result` as a JSON envelope or through `render`.
fn emit<T: Serialize>(json: bool, result: AppResult<T>, render: impl FnOnce(&T)) -> Result<()> {
    if json {
        let failed = result.is_err();
        let response: CommandResponse<T> = result.into();
        println!("{}", serde_json::to_string_pretty(&response)?);
        if failed {
            std::process::exit(1);
        }
        return Ok(());
    }
    let data = result?;
    render(&data);
    Ok(())
}

fn read_password(given: Option<String>) -> Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }
    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn print_summary(result: &AnalysisResult) {
    println!("{}", result.client_name);
    println!("  Total spent:  {:.2}", result.total_spent);
    println!("  Purchases:    {}", result.purchase_count);
    if !result.top_items.is_empty() {
        println!("  Top items:");
        for item in &result.top_items {
            println!("    {:<24} {}", item.name, item.value);
        }
    }
    if !result.chart_series.is_empty() {
        println!("  Spending:");
        for point in &result.chart_series {
            println!("    {}  {:.2}", point.date, point.amount);
        }
    }
    println!();
}

async fn analyze(
    state: &AppState,
    json: bool,
    client_id: i64,
    lang: Option<String>,
    model: Option<String>,
) -> Result<()> {
    let started = commands::start_analysis(state, client_id, lang, model).await;
    if json {
        let run = match started {
            Ok(run) => run,
            Err(e) => return emit::<AnalysisResult>(true, Err(e), |_| {}),
        };
        let initial = run.result.clone();
        let outcome = run.finish().await;
        let result = state
            .orchestrator()
            .current()
            .map(|view| view.result)
            .unwrap_or(initial);
        let body = serde_json::json!({ "result": result, "outcome": outcome });
        return emit(true, Ok(body), |_| {});
    }

    let mut run = started?;
    print_summary(&run.result);

    let mut printed = 0;
    let mut stdout = std::io::stdout();
    loop {
        tokio::select! {
            update = run.next_update() => match update {
                Some(snapshot) => {
                    let narrative = snapshot.narrative.as_str();
                    if narrative.len() > printed {
                        write!(stdout, "{}", &narrative[printed..])?;
                        stdout.flush()?;
                        printed = narrative.len();
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                state.orchestrator().cancel();
                break;
            }
        }
    }
    println!();
    run.finish().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let json = cli.json;

    if let Commands::Config { action } = &cli.command {
        let dir = match &cli.config_dir {
            Some(dir) => dir.clone(),
            None => suluk_dir()?,
        };
        let result = match action {
            ConfigAction::Show => commands::get_settings(&dir),
            ConfigAction::Set {
                base_url,
                host,
                lang,
                model,
                timeout_secs,
                proxy,
            } => {
                let proxy = proxy.as_deref().map(commands::parse_proxy).transpose()?;
                commands::update_settings(
                    &dir,
                    SettingsUpdate {
                        api_base_url: base_url.clone(),
                        origin_host: host.clone(),
                        language: lang.clone(),
                        default_model: model.clone(),
                        request_timeout_secs: *timeout_secs,
                        proxy,
                    },
                )
            }
            ConfigAction::Reset => commands::reset_settings(&dir),
        };
        return emit(json, result, |config| {
            println!("API base URL: {}", config.resolve_base_url());
            println!("Language:     {}", config.language);
            println!(
                "Model:        {}",
                config.default_model.as_deref().unwrap_or("(first listed by server)")
            );
            println!("Timeout:      {}s", config.request_timeout_secs);
        });
    }

    let state = AppState::initialize(StateOptions {
        config_dir: cli.config_dir.clone(),
        api_url: cli.api_url.clone(),
        proxy_password: cli.proxy_password.clone(),
    })
    .await?;

    match cli.command {
        Commands::Login { username, password } => {
            let password = read_password(password)?;
            let result = commands::login(&state, &username, &password).await;
            emit(json, result, |identity| println!("Logged in as {}", identity.username))
        }
        Commands::Register { username, password } => {
            let password = read_password(password)?;
            let result = commands::register(&state, &username, &password).await;
            emit(json, result, |_| println!("Registered {}. You can now log in.", username))
        }
        Commands::Logout => emit(json, commands::logout(&state), |_| println!("Logged out")),
        Commands::Whoami => emit(json, commands::whoami(&state).await, |identity| {
            println!("{} (id {})", identity.username, identity.id);
            if let Some(created) = identity.created_at_utc() {
                println!("Member since {}", created.format("%Y-%m-%d"));
            }
        }),
        Commands::Clients => emit(json, commands::list_clients(&state).await, |clients| {
            for client in clients {
                println!(
                    "{:>5}  {:<28} {}",
                    client.id,
                    client.name,
                    client.email.as_deref().unwrap_or("")
                );
            }
        }),
        Commands::Models => emit(json, commands::list_models(&state).await, |models| {
            for model in models {
                println!("{}", model);
            }
        }),
        Commands::Analyze {
            client_id,
            lang,
            model,
        } => analyze(&state, json, client_id, lang, model).await,
        Commands::Config { .. } => Ok(()),
    }
}
