//! Command implementations for the dashboardr CLI.
//!
//! Each subcommand reads one or more dashboard config files and hands the
//! projects to `dbr-site`.

use clap::Subcommand;

pub mod generate;
pub mod quarto;

#[derive(Subcommand)]
pub enum Command {
    /// Generate a dashboard's Quarto sources from a config file
    Generate {
        /// Dashboard config (.toml, .json or .yaml)
        #[arg(short = 'c', long)]
        config: String,

        /// Write to this directory instead of the config's output_dir
        #[arg(short = 'o', long)]
        output_dir: Option<String>,

        /// Run `quarto render` afterwards
        #[arg(long)]
        render: bool,

        /// Only rewrite pages whose inputs changed since the last run
        #[arg(long)]
        incremental: bool,

        /// Quarto executable
        #[arg(long, default_value = "quarto")]
        quarto_bin: String,
    },

    /// Generate several dashboards in one run
    Batch {
        /// Dashboard config files, processed in order
        #[arg(short = 'c', long, num_args = 1.., required = true)]
        config: Vec<String>,

        /// Run `quarto render` for each dashboard
        #[arg(long)]
        render: bool,

        /// Only rewrite pages whose inputs changed since the last run
        #[arg(long)]
        incremental: bool,

        /// Keep going when a dashboard fails
        #[arg(long)]
        continue_on_error: bool,

        /// Quarto executable
        #[arg(long, default_value = "quarto")]
        quarto_bin: String,
    },

    /// Report whether a usable Quarto CLI is installed
    CheckQuarto {
        /// Quarto executable
        #[arg(long, default_value = "quarto")]
        quarto_bin: String,
    },
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Generate {
            config,
            output_dir,
            render,
            incremental,
            quarto_bin,
        } => generate::run_generate(
            &config,
            output_dir.as_deref(),
            &generate::options(render, incremental, quarto_bin),
        ),
        Command::Batch {
            config,
            render,
            incremental,
            continue_on_error,
            quarto_bin,
        } => generate::run_batch(
            &config,
            &generate::options(render, incremental, quarto_bin),
            continue_on_error,
        ),
        Command::CheckQuarto { quarto_bin } => quarto::run_check_quarto(&quarto_bin),
    }
}
