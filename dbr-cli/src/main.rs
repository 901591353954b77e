//! dashboardr CLI - Generate Quarto dashboards from survey data.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "dashboardr",
    version,
    about = "Survey data dashboards as Quarto websites"
)]
struct Cli {
    #[command(subcommand)]
    command: dbr_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    log::debug!("dashboardr {}", env!("CARGO_PKG_VERSION"));
    dbr_cmd::run(cli.command)
}
