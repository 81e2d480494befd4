//! Command-line driver for the Pybox sandbox library.
//!
//! Runs a script (or a JSON submission produced by an upstream code
//! generator) inside a per-session sandbox, prints the captured output,
//! and optionally writes captured image artifacts to disk. Useful for
//! exercising the sandbox outside the host application.

use anyhow::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clap::Parser;
use log::LevelFilter;
use pybox_core::{CodeSubmission, SandboxConfig, SessionBinder};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "pybox",
    author,
    version,
    about = "Run untrusted Python code in an isolated per-session sandbox"
)]
struct Cli {
    /// Python source file, or a JSON submission with --json
    input: PathBuf,

    #[clap(
        long,
        help = "Treat the input as a JSON submission: {\"code\": ..., \"dependencies\": [...]}"
    )]
    json: bool,

    #[clap(
        long,
        default_value = "cli",
        help = "Session key; repeated runs with the same key reuse one sandbox"
    )]
    session: String,

    #[clap(long, help = "Directory to write captured image artifacts into")]
    artifacts_dir: Option<PathBuf>,

    #[clap(long, help = "Wipe the sandbox store before running")]
    fresh: bool,

    #[clap(long, help = "Keep the session's sandbox alive after the run")]
    keep: bool,

    #[clap(long, help = "Override the sandbox store base directory")]
    store: Option<PathBuf>,

    #[clap(long, help = "Wall-clock execution timeout in seconds")]
    timeout: Option<u64>,

    #[clap(long, short, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let log_level_filter = cli.log_level.parse().unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(log_level_filter)
        .init();

    let mut config = SandboxConfig::default();
    if let Some(store) = cli.store {
        config.store_base = store;
    }
    if let Some(timeout) = cli.timeout {
        config.execution_timeout_secs = timeout;
    }
    config.validate()?;

    let raw = std::fs::read_to_string(&cli.input)?;
    let submission = if cli.json {
        serde_json::from_str::<CodeSubmission>(&raw)?
    } else {
        CodeSubmission {
            code: raw,
            dependencies: Vec::new(),
        }
    };

    let binder = SessionBinder::new(config);
    if cli.fresh {
        binder.wipe_store();
    }

    let sandbox = binder.resolve(&cli.session).await?;
    if let Some(message) = sandbox.install(&submission.dependencies).await? {
        // A bad dependency list is not fatal; the script may still run.
        eprintln!("{}", message);
    }

    let result = sandbox.execute(&submission.code).await?;
    print!("{}", result.stdout);
    eprint!("{}", result.stderr);

    if let Some(dir) = &cli.artifacts_dir {
        std::fs::create_dir_all(dir)?;
        for (index, encoded) in result.images.iter().enumerate() {
            let bytes = STANDARD.decode(encoded)?;
            let path = dir.join(format!("artifact-{:02}.png", index));
            std::fs::write(&path, bytes)?;
            log::info!("Wrote artifact to {}", path.display());
        }
    }

    if !cli.keep {
        binder.release(&cli.session).await;
    }
    Ok(())
}
