mod config;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use config::Config;
use redmine_client::redmine::http::format_redmine_error;
use redmine_client::resource::{FieldValue, IndexBy, Listing, Params, QueryParams};
use redmine_client::{Error, RawResponse, RedmineClient};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Command-line client for the Redmine REST API
#[derive(Parser, Debug)]
#[command(name = "redmine", version, about, long_about = None)]
struct Cli {
    /// Redmine server URL (overrides config and REDMINE_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// API key (overrides config and REDMINE_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Records requested per page when listing (1-100)
    #[arg(long, global = true)]
    page_size: Option<u64>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage projects
    Projects {
        #[command(subcommand)]
        action: ProjectCommand,
    },
    /// Manage custom fields
    CustomFields {
        #[command(subcommand)]
        action: CustomFieldCommand,
    },
    /// Store connection settings in the config file
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ProjectCommand {
    /// List project names and ids
    List(ListArgs),
    /// Print the id of the project with the given name
    Id {
        name: String,
        /// Extra query parameter, e.g. -q status=1
        #[arg(short, long = "query", value_parser = parse_key_val)]
        query: Vec<(String, String)>,
    },
    /// Show a project with its trackers, categories, attachments and relations
    Show { id: String },
    /// Create a project
    Create(ProjectFields),
    /// Update a project
    Update {
        id: String,
        #[command(flatten)]
        fields: ProjectFields,
    },
    /// Delete a project
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
enum CustomFieldCommand {
    /// List custom field names and ids
    List(ListArgs),
    /// Print the id of the custom field with the given name
    Id {
        name: String,
        /// Extra query parameter, e.g. -q customized_type=issue
        #[arg(short, long = "query", value_parser = parse_key_val)]
        query: Vec<(String, String)>,
    },
    /// Update a custom field
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        /// Allowed value; repeat for each entry
        #[arg(long = "possible-value")]
        possible_values: Vec<String>,
        /// Any other field, e.g. --set is_required=1
        #[arg(long = "set", value_parser = parse_key_val)]
        extra: Vec<(String, String)>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Remember the server URL
    SetUrl { address: String },
    /// Remember the API key
    SetApiKey { key: String },
    /// Print the config file location
    Path,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Print id -> name instead of name -> id
    #[arg(long)]
    by_id: bool,

    /// Query parameter, e.g. -q status=1 or -q limit=10
    #[arg(short, long = "query", value_parser = parse_key_val)]
    query: Vec<(String, String)>,
}

#[derive(Args, Debug)]
struct ProjectFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    identifier: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// Tracker id; repeat for each tracker
    #[arg(long = "tracker-id")]
    tracker_ids: Vec<u64>,
    /// Issue custom field id; repeat for each field
    #[arg(long = "issue-custom-field-id")]
    issue_custom_field_ids: Vec<u64>,
    /// Any other field, e.g. --set is_public=0
    #[arg(long = "set", value_parser = parse_key_val)]
    extra: Vec<(String, String)>,
}

impl ProjectFields {
    fn into_params(self) -> Params {
        let mut params = Params::new()
            .with("name", self.name)
            .with("identifier", self.identifier)
            .with("description", self.description)
            .with("tracker_ids", self.tracker_ids)
            .with("issue_custom_field_ids", self.issue_custom_field_ids);
        for (key, value) in self.extra {
            params.set(key, value);
        }
        params
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", s))?;
    Ok((key.to_string(), value.to_string()))
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("redmine started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("redmine-client").join("redmine-client.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".redmine-client").join("redmine-client.log");
    }
    PathBuf::from("redmine-client.log")
}

fn print_listing(listing: &Listing) {
    match listing {
        Listing::ByName(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            for (name, id) in entries {
                println!("{}\t{}", name, id);
            }
        }
        Listing::ById(map) => {
            for (id, name) in map {
                println!("{}\t{}", id, name);
            }
        }
    }
}

fn print_response(response: &RawResponse) {
    if !response.is_empty() {
        println!("{}", response.body.trim_end());
    }
}

fn index_by(by_id: bool) -> IndexBy {
    if by_id {
        IndexBy::IdToName
    } else {
        IndexBy::NameToId
    }
}

async fn run_projects(client: &RedmineClient, action: ProjectCommand) -> Result<()> {
    let mut projects = client.projects();

    match action {
        ProjectCommand::List(args) => {
            let query: QueryParams = args.query.into_iter().collect();
            let listing = projects.listing(true, &query, index_by(args.by_id)).await?;
            print_listing(&listing);
        }
        ProjectCommand::Id { name, query } => {
            let query: QueryParams = query.into_iter().collect();
            match projects.get_id_by_name(&name, &query).await? {
                Some(id) => println!("{}", id),
                None => anyhow::bail!("No project named {:?}", name),
            }
        }
        ProjectCommand::Show { id } => {
            let project = projects.show(&id).await?;
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
        ProjectCommand::Create(fields) => {
            print_response(&projects.create(fields.into_params()).await?);
        }
        ProjectCommand::Update { id, fields } => {
            print_response(&projects.update(&id, fields.into_params()).await?);
        }
        ProjectCommand::Delete { id } => {
            print_response(&projects.remove(&id).await?);
        }
    }

    Ok(())
}

async fn run_custom_fields(client: &RedmineClient, action: CustomFieldCommand) -> Result<()> {
    let mut custom_fields = client.custom_fields();

    match action {
        CustomFieldCommand::List(args) => {
            let query: QueryParams = args.query.into_iter().collect();
            let listing = custom_fields
                .listing(true, &query, index_by(args.by_id))
                .await?;
            print_listing(&listing);
        }
        CustomFieldCommand::Id { name, query } => {
            let query: QueryParams = query.into_iter().collect();
            match custom_fields.get_id_by_name(&name, &query).await? {
                Some(id) => println!("{}", id),
                None => anyhow::bail!("No custom field named {:?}", name),
            }
        }
        CustomFieldCommand::Update {
            id,
            name,
            possible_values,
            extra,
        } => {
            let mut params = Params::new()
                .with("name", name)
                .with("possible_values", FieldValue::List(possible_values));
            for (key, value) in extra {
                params.set(key, value);
            }
            print_response(&custom_fields.update(&id, params).await?);
        }
    }

    Ok(())
}

fn run_config(config: &mut Config, action: ConfigCommand) -> Result<()> {
    match action {
        ConfigCommand::SetUrl { address } => config.set_url(&address)?,
        ConfigCommand::SetApiKey { key } => config.set_api_key(&key)?,
        ConfigCommand::Path => match Config::config_path() {
            Some(path) => println!("{}", path.display()),
            None => anyhow::bail!("No config directory on this platform"),
        },
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load();

    let action = match cli.command {
        Command::Config { action } => return run_config(&mut config, action),
        other => other,
    };

    if let Some(url) = cli.url {
        config.url = Some(url);
    }
    if let Some(api_key) = cli.api_key {
        config.api_key = Some(api_key);
    }
    if let Some(page_size) = cli.page_size {
        config.page_size = Some(page_size);
    }

    let url = config.effective_url();
    tracing::info!("Using Redmine at {}", url);

    let client = RedmineClient::with_timeout(
        &url,
        config.effective_api_key().as_deref(),
        config.effective_timeout(),
    )
    .context("Failed to create Redmine client")?
    .with_page_size(config.effective_page_size());

    match action {
        Command::Projects { action } => run_projects(&client, action).await,
        Command::CustomFields { action } => run_custom_fields(&client, action).await,
        Command::Config { .. } => Ok(()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = setup_logging(cli.log_level)?;

    if let Err(err) = run(cli).await {
        tracing::error!("{:#}", err);
        match err.downcast_ref::<Error>() {
            Some(Error::Transport(transport)) => eprintln!("error: {}", format_redmine_error(transport)),
            _ => eprintln!("error: {:#}", err),
        }
        std::process::exit(1);
    }

    Ok(())
}
