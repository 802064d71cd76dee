//! CLI entry point for imgfetch.

use std::process::ExitCode;

use clap::Parser;

mod app;
mod cli;

use cli::Args;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    app::run(args).await.into()
}
