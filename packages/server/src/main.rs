#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Envirolens API server binary.
//!
//! ```text
//! envirolens_server [--config envirolens.toml] [--no-ai]
//! ```

use std::path::PathBuf;

use clap::Parser;
use envirolens_server::{ServerOptions, run_server};

#[derive(Parser)]
#[command(
    name = "envirolens_server",
    about = "Environmental monitoring API server"
)]
struct Cli {
    /// TOML configuration file (overrides `ENVIROLENS_CONFIG`)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Always use static alert recommendations
    #[arg(long)]
    no_ai: bool,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    run_server(ServerOptions {
        config_path: cli.config,
        no_ai: cli.no_ai,
    })
    .await
}
