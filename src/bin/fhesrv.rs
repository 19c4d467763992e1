//! fhesrv: command-line client for the encrypted aggregation service
//!
//! Generates keys, uploads encrypted vectors, and decrypts range sums.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use eyre::{Context, Result};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use fhesrv::config::{ClientConfig, ParamsSource};
use fhesrv::keystore::KeyStore;
use fhesrv::params::{ParamsPreset, SchemeParameters};

#[derive(Parser)]
#[command(name = "fhesrv")]
#[command(about = "Encrypted aggregation client")]
#[command(version)]
struct Args {
    /// JSON configuration file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Aggregation service base URL
    #[arg(long)]
    server: Option<String>,

    /// Bearer credential sent with every request
    #[arg(long, env = "FHESRV_TOKEN")]
    token: Option<String>,

    /// Per-call deadline in seconds
    #[arg(long)]
    deadline_secs: Option<u64>,

    /// Directory holding enc.sk / enc.pk
    #[arg(long)]
    key_dir: Option<PathBuf>,

    /// Parameter preset (d2048 or d4096)
    #[arg(long, value_parser = parse_preset, conflicts_with = "params_file")]
    preset: Option<ParamsPreset>,

    /// Explicit scheme parameters (JSON)
    #[arg(long)]
    params_file: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a key pair, overwriting any existing key records
    Keygen,

    /// Encrypt and upload one vector
    Write {
        /// Vector values
        #[arg(required = true, value_delimiter = ',')]
        values: Vec<u64>,
    },

    /// Upload every row of a comma-separated file (stops at the first failure)
    WriteFile { path: PathBuf },

    /// Decrypt the sum of rows stored in [from, to)
    Eval {
        #[arg(long)]
        from: i64,

        #[arg(long)]
        to: i64,

        /// Print only the first N slots
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the resolved scheme parameters as JSON
    Params,
}

fn parse_preset(s: &str) -> std::result::Result<ParamsPreset, String> {
    serde_json::from_value(serde_json::Value::String(s.to_lowercase()))
        .map_err(|_| format!("unknown preset '{}', expected d2048 or d4096", s))
}

fn resolve_config(args: &Args) -> Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => ClientConfig::default(),
    };

    if let Some(server) = &args.server {
        config.server_url = server.clone();
    }
    if let Some(token) = &args.token {
        config.token = token.clone();
    }
    if let Some(secs) = args.deadline_secs {
        config.deadline_secs = secs;
    }
    if let Some(dir) = &args.key_dir {
        let store = KeyStore::in_dir(dir);
        config.secret_key_path = store.secret_path().to_path_buf();
        config.public_key_path = store.public_path().to_path_buf();
    }
    if let Some(preset) = args.preset {
        config.params = ParamsSource::Preset(preset);
    }
    if let Some(path) = &args.params_file {
        let params = SchemeParameters::load(path)
            .with_context(|| format!("Failed to load parameters: {}", path.display()))?;
        config.params = ParamsSource::Explicit(params);
    }
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = resolve_config(&args)?;
    let params = config
        .scheme_parameters()
        .map_err(|e| eyre::eyre!("Invalid parameters: {}", e))?;
    let client = config.client().wrap_err("Failed to build client")?;

    let start = Instant::now();
    match args.command {
        Command::Keygen => {
            let pair = client.generate_keys(&params)?;
            info!(
                "Key pair {} written to {} and {}",
                pair.id_hex(),
                config.secret_key_path.display(),
                config.public_key_path.display()
            );
        }
        Command::Write { values } => {
            client.write(&params, &values)?;
            info!("Wrote {} values in {:.2?}", values.len(), start.elapsed());
        }
        Command::WriteFile { path } => {
            let written = client
                .write_from_file(&params, &path)
                .with_context(|| format!("Bulk write from {} failed", path.display()))?;
            info!("Wrote {} rows in {:.2?}", written, start.elapsed());
        }
        Command::Eval { from, to, limit } => {
            let mut sums = client.evaluate(&params, from, to)?;
            if let Some(limit) = limit {
                sums.truncate(limit);
            }
            info!("Evaluated in {:.2?}", start.elapsed());
            println!("{}", serde_json::to_string(&sums)?);
        }
        Command::Params => {
            println!("{}", serde_json::to_string_pretty(&params)?);
            info!("Fingerprint: {:016x}", params.fingerprint());
        }
    }

    Ok(())
}
