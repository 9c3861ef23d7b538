//! Element Reconciler CLI
//!
//! Drives single reconciliation steps against an Element cluster, or issues
//! a raw API call. Results are printed to stdout as JSON; logs go to stderr.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use element_reconciler::{
    ClientConfig, ElementClient, EntityKind, Reconcilers, Resource, ResourceData,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Element Reconciler - manage SolidFire Element storage entities
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Cluster management address (https:// assumed when no scheme is given)
    #[arg(long, env = "SOLIDFIRE_SERVER")]
    server: String,

    /// Cluster admin user
    #[arg(long, env = "SOLIDFIRE_USERNAME")]
    username: String,

    /// Cluster admin password
    #[arg(long, env = "SOLIDFIRE_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    /// Element API version
    #[arg(long, env = "SOLIDFIRE_API_VERSION", default_value = "1.0")]
    api_version: String,

    /// Maximum concurrent API calls (default 6)
    #[arg(long, env = "SOLIDFIRE_MAX_CONCURRENCY")]
    max_concurrency: Option<usize>,

    /// Skip TLS certificate verification
    #[arg(long, env = "SOLIDFIRE_INSECURE")]
    insecure: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Call any API method and print its result
    Call {
        method: String,
        /// Params as a JSON object
        #[arg(long)]
        params: Option<String>,
    },
    /// Create an entity from a YAML or JSON fields file
    Create { kind: EntityKind, file: PathBuf },
    /// Print the current state of an entity
    Read { kind: EntityKind, id: String },
    /// Apply the fields set in a YAML or JSON file
    Update {
        kind: EntityKind,
        id: String,
        file: PathBuf,
    },
    /// Delete an entity
    Delete { kind: EntityKind, id: String },
    /// Report whether an entity still exists
    Exists { kind: EntityKind, id: String },
}

impl Args {
    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            host: self.server.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            api_version: self.api_version.clone(),
            max_concurrency: self.max_concurrency,
            accept_invalid_certs: self.insecure,
        }
    }
}

/// One lifecycle step for a reconciler
#[derive(Debug)]
enum Step {
    Create(PathBuf),
    Read(String),
    Update(String, PathBuf),
    Delete(String),
    Exists(String),
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let config = args.client_config();
    info!("Element Reconciler {}", element_reconciler::VERSION);
    info!("  Server: {}", config.base_url());
    info!("  API version: {}", config.api_version());

    let client = ElementClient::builder(config)
        .build()
        .context("Failed to configure Element client")?;

    let output = match args.command {
        Command::Call { method, params } => {
            let params: Option<Value> = params
                .as_deref()
                .map(serde_json::from_str)
                .transpose()
                .context("--params must be valid JSON")?;
            client
                .call_api_method(&method, params.as_ref())
                .await
                .with_context(|| format!("{} failed", method))?
        }
        Command::Create { kind, file } => run(&client, kind, Step::Create(file)).await?,
        Command::Read { kind, id } => run(&client, kind, Step::Read(id)).await?,
        Command::Update { kind, id, file } => run(&client, kind, Step::Update(id, file)).await?,
        Command::Delete { kind, id } => run(&client, kind, Step::Delete(id)).await?,
        Command::Exists { kind, id } => run(&client, kind, Step::Exists(id)).await?,
    };

    debug!("RPC metrics: {:?}", client.metrics());
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run(client: &ElementClient, kind: EntityKind, step: Step) -> anyhow::Result<Value> {
    let reconcilers = Reconcilers::new(client.clone());
    match kind {
        EntityKind::Account => apply(&reconcilers.accounts, step).await,
        EntityKind::Volume => apply(&reconcilers.volumes, step).await,
        EntityKind::Initiator => apply(&reconcilers.initiators, step).await,
        EntityKind::AccessGroup => apply(&reconcilers.access_groups, step).await,
    }
}

async fn apply<R>(resource: &R, step: Step) -> anyhow::Result<Value>
where
    R: Resource,
    R::Fields: Serialize + DeserializeOwned + Default,
{
    let kind = resource.kind();
    match step {
        Step::Create(file) => {
            let mut data = ResourceData::new(load_fields::<R::Fields>(&file)?);
            resource
                .create(&mut data)
                .await
                .with_context(|| format!("Failed to create {}", kind))?;
            Ok(serde_json::to_value(&data)?)
        }
        Step::Read(id) => {
            let mut data = ResourceData::with_id(id, R::Fields::default());
            resource
                .read(&mut data)
                .await
                .with_context(|| format!("Failed to read {}", kind))?;
            Ok(serde_json::to_value(&data)?)
        }
        Step::Update(id, file) => {
            let changes = load_fields::<R::Fields>(&file)?;
            let mut data = ResourceData::with_id(id, R::Fields::default());
            resource
                .read(&mut data)
                .await
                .with_context(|| format!("Failed to read {}", kind))?;
            resource
                .update(&mut data, &changes)
                .await
                .with_context(|| format!("Failed to update {}", kind))?;
            Ok(serde_json::to_value(&data)?)
        }
        Step::Delete(id) => {
            let mut data = ResourceData::with_id(id.clone(), R::Fields::default());
            resource
                .delete(&mut data)
                .await
                .with_context(|| format!("Failed to delete {}", kind))?;
            Ok(json!({ "id": id, "deleted": true }))
        }
        Step::Exists(id) => {
            let mut data = ResourceData::with_id(id.clone(), R::Fields::default());
            let exists = resource
                .exists(&mut data)
                .await
                .with_context(|| format!("Failed to check {}", kind))?;
            Ok(json!({ "id": id, "exists": exists }))
        }
    }
}

/// Load a fields file; YAML is a superset of JSON so both are accepted
fn load_fields<F: DeserializeOwned>(path: &Path) -> anyhow::Result<F> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_yaml::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "reqwest=info", "rustls=warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
