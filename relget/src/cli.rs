use anyhow::Result;
use clap::{Parser, Subcommand};
use relget_lib::config::Config;

use crate::commands::{
    download::DownloadCommand, list::ListCommand, show::ShowCommand,
};

#[derive(Parser)]
#[command(name = "relget")]
#[command(about = "Fetch GitHub releases and download their assets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global_args: GlobalArgs,
}

#[derive(clap::Args, Clone)]
pub struct GlobalArgs {
    /// Base URL of the releases API (e.g. a GitHub Enterprise instance)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Show debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    pub fn config(&self) -> Config {
        let config = Config::default();
        match &self.api_url {
            Some(api_url) => config.with_api_base(api_url),
            None => config,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List every release of a repository
    #[command(alias = "ls")]
    List(ListCommand),

    /// Show a release and its assets
    Show(ShowCommand),

    /// Download assets of a release
    #[command(alias = "get")]
    Download(DownloadCommand),
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::List(cmd) => cmd.run(self.global_args).await,
            Commands::Show(cmd) => cmd.run(self.global_args).await,
            Commands::Download(cmd) => cmd.run(self.global_args).await,
        }
    }
}
