//! pqseal - post-quantum envelope encryption from the command line

use anyhow::Context;
use clap::{Parser, Subcommand};
use pqseal_cli::{commands, AppConfig, AppState, EnvelopeFormat};
use pqseal_crypto::{AlgorithmId, KeyDerivation};
use pqseal_keystore::PublicKeyEncoding;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "pqseal")]
#[command(about = "Post-quantum hybrid envelope encryption with ML-KEM")]
#[command(version)]
struct Args {
    /// Key directory (default: ~/.pqc-keys)
    #[arg(long, global = true, env = "PQSEAL_KEY_DIR")]
    key_dir: Option<PathBuf>,

    /// Public key encoding written by keygen: raw, structured or both
    #[arg(long, global = true, default_value = "both", env = "PQSEAL_PUBLIC_ENCODING")]
    public_encoding: PublicKeyEncoding,

    /// Key derivation: hkdf-sha256 or truncate (legacy)
    #[arg(long, global = true, default_value = "hkdf-sha256", env = "PQSEAL_KDF")]
    kdf: KeyDerivation,

    /// Enable debug logging
    #[arg(short, long, global = true, env = "PQSEAL_DEBUG")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a key pair and store it under NAME
    Keygen {
        name: String,
        /// ML-KEM-768, ML-KEM-1024, ML-KEM-768-CHACHA20 or X25519-ML-KEM-768
        #[arg(short, long)]
        algorithm: Option<AlgorithmId>,
        /// Overwrite an existing key
        #[arg(short, long)]
        force: bool,
    },
    /// List stored key names
    List,
    /// Show metadata for a stored key
    Show { name: String },
    /// Encrypt INPUT to a stored public key
    Seal {
        #[arg(short, long)]
        key: String,
        #[arg(short, long)]
        algorithm: Option<AlgorithmId>,
        /// Associated data bound to the envelope
        #[arg(long)]
        aad: Option<String>,
        /// binary, base64 or json
        #[arg(long, default_value = "binary")]
        format: EnvelopeFormat,
        input: PathBuf,
        output: PathBuf,
    },
    /// Decrypt INPUT with a stored private key
    Open {
        #[arg(short, long)]
        key: String,
        /// Associated data given when sealing
        #[arg(long)]
        aad: Option<String>,
        input: PathBuf,
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Logs go to stderr; stdout carries command output
    let log_level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "pqseal={0},pqseal_cli={0},pqseal_crypto={0},pqseal_keystore={0}",
                    log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = AppConfig::default()
        .with_public_encoding(args.public_encoding)
        .with_kdf(args.kdf);
    if let Some(dir) = args.key_dir {
        config = config.with_key_dir(dir);
    }
    tracing::debug!(key_dir = %config.key_dir.display(), kdf = %config.kdf, "configuration loaded");

    let state = AppState::new(config).context("failed to prepare key directory")?;

    match args.command {
        Command::Keygen {
            name,
            algorithm,
            force,
        } => {
            let info = commands::keygen(&state, &name, algorithm, force)?;
            println!("{}", info);
        }
        Command::List => {
            for name in commands::list(&state)? {
                println!("{}", name);
            }
        }
        Command::Show { name } => {
            println!("{}", commands::show(&state, &name)?);
        }
        Command::Seal {
            key,
            algorithm,
            aad,
            format,
            input,
            output,
        } => {
            let written = commands::seal(
                &state,
                &key,
                algorithm,
                aad.as_deref(),
                &input,
                &output,
                format,
            )
            .await?;
            println!("wrote {} bytes to {}", written, output.display());
        }
        Command::Open {
            key,
            aad,
            input,
            output,
        } => match commands::open(&state, &key, aad.as_deref(), &input, &output).await {
            Ok(len) => println!("wrote {} bytes to {}", len, output.display()),
            Err(e) => {
                tracing::debug!(error = %e, "open failed");
                eprintln!("error: {}", e.public_message());
                return Ok(ExitCode::FAILURE);
            }
        },
    }

    Ok(ExitCode::SUCCESS)
}
