//! `folio`: command-line front end for the portfolio backend.
//!
//! Same session, guard and adapter the web views use: log in once, then
//! browse or manage experiences, skills, projects and articles.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use folio_client::ClientConfig;

use commands::resource::Kind;
use commands::Output;

/// Folio CLI tool.
#[derive(Parser, Debug)]
#[command(name = "folio", about = "Portfolio CLI client")]
struct Cli {
    /// Path to client config file (default: ~/.folio/config.toml).
    #[arg(long = "config", global = true)]
    config: Option<String>,

    /// Output format: table or json.
    #[arg(long = "output", short = 'o', global = true, default_value = "table")]
    output: Output,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show or change client settings.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Log in and store the session.
    Login {
        /// Account email.
        #[arg(long)]
        email: Option<String>,
        /// Password (not recommended; prompts when omitted).
        #[arg(long)]
        password: Option<String>,
    },

    /// End the session, locally and on the backend.
    Logout,

    /// Check the stored session the way a protected page does.
    Whoami,

    /// Navigation available to the current session.
    Menu,

    /// Create a user account (requires a session).
    Register {
        username: String,
        email: String,
        #[arg(long)]
        password: Option<String>,
    },

    /// List records (experience, skill, project, article).
    List {
        resource: Kind,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Page size (default from config).
        #[arg(long)]
        limit: Option<u32>,
        /// Search term; only articles support it.
        #[arg(long)]
        search: Option<String>,
    },

    /// Get one record.
    Get { resource: Kind, id: String },

    /// Create a record.
    Create {
        resource: Kind,
        /// JSON body.
        #[arg(long = "json")]
        json_body: Option<String>,
        /// Read JSON from file.
        #[arg(short = 'f', long = "file")]
        file: Option<String>,
        /// Attach an image (projects and articles only).
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Update a record.
    Update {
        resource: Kind,
        id: String,
        /// JSON body.
        #[arg(long = "json")]
        json_body: Option<String>,
        /// Read JSON from file.
        #[arg(short = 'f', long = "file")]
        file: Option<String>,
    },

    /// Delete a record.
    Delete {
        resource: Kind,
        id: String,
        /// Skip confirmation.
        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },

    /// Check configuration, session and backend reachability.
    Status,

    /// Show version.
    Version,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration.
    Show,
    /// Set properties and save.
    Set {
        #[arg(long)]
        server: Option<String>,
        #[arg(long)]
        page_size: Option<u32>,
        #[arg(long)]
        timeout_secs: Option<u64>,
        #[arg(long)]
        refresh_leeway_secs: Option<i64>,
        #[arg(long)]
        session_path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = cli.output;

    let config_path = cli
        .config
        .map(PathBuf::from)
        .unwrap_or_else(ClientConfig::default_path);

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&config_path, output)?,
            ConfigAction::Set {
                server,
                page_size,
                timeout_secs,
                refresh_leeway_secs,
                session_path,
            } => commands::config::set(
                &config_path,
                commands::config::Changes {
                    server,
                    page_size,
                    timeout_secs,
                    refresh_leeway_secs,
                    session_path,
                },
            )?,
        },

        Commands::Login { email, password } => {
            let email = match email {
                Some(email) => email,
                None => commands::prompt("Email: ")?,
            };
            let password = match password {
                Some(p) => p,
                None => rpassword::prompt_password("Password: ")?,
            };
            if email.is_empty() || password.is_empty() {
                anyhow::bail!("Email and password are required.");
            }
            commands::session::login(&config_path, &email, &password).await?;
        }

        Commands::Logout => commands::session::logout(&config_path).await?,

        Commands::Whoami => commands::session::whoami(&config_path, output).await?,

        Commands::Menu => commands::session::menu(&config_path, output)?,

        Commands::Register {
            username,
            email,
            password,
        } => {
            let password = match password {
                Some(p) => p,
                None => {
                    let pw = rpassword::prompt_password("Password for new user: ")?;
                    let confirm = rpassword::prompt_password("Confirm password: ")?;
                    if pw != confirm {
                        anyhow::bail!("Passwords do not match.");
                    }
                    pw
                }
            };
            if password.is_empty() {
                anyhow::bail!("Password cannot be empty.");
            }
            commands::session::register(&config_path, &username, &email, &password).await?;
        }

        Commands::List {
            resource,
            page,
            limit,
            search,
        } => {
            let query = commands::resource::ListQuery { page, limit, search };
            commands::resource::list(&config_path, resource, query, output).await?;
        }

        Commands::Get { resource, id } => {
            commands::resource::get(&config_path, resource, &id, output).await?;
        }

        Commands::Create {
            resource,
            json_body,
            file,
            image,
        } => {
            let body = commands::read_body(json_body, file)?;
            commands::resource::create(&config_path, resource, &body, image.as_deref(), output).await?;
        }

        Commands::Update {
            resource,
            id,
            json_body,
            file,
        } => {
            let body = commands::read_body(json_body, file)?;
            commands::resource::update(&config_path, resource, &id, &body, output).await?;
        }

        Commands::Delete { resource, id, yes } => {
            if !yes && !commands::confirm("Are you sure? [y/N]: ")? {
                println!("Cancelled.");
                return Ok(());
            }
            commands::resource::delete(&config_path, resource, &id).await?;
        }

        Commands::Status => commands::resource::status(&config_path).await?,

        Commands::Version => {
            println!("folio cli v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
