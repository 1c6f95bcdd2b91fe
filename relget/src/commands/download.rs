use crate::cli::GlobalArgs;
use crate::commands::{find_release, release_label};
use crate::ui;
use anyhow::{Context, Result, bail};
use clap::Args;
use relget_lib::downloader::AssetDownloader;
use relget_lib::github::{GitHubClient, ReleaseAsset, Repository};
use relget_lib::logging::{progress_bar_style, spinner_style};
use relget_lib::progress::{DownloadInfo, DownloadState};
use relget_lib::transport::ReqwestTransport;
use std::path::PathBuf;
use tracing_indicatif::span_ext::IndicatifSpanExt;

#[derive(Args)]
pub struct DownloadCommand {
    /// Repository in `owner/repo` form
    pub repo: Repository,

    /// Release tag (defaults to the latest release)
    #[arg(long, short)]
    pub tag: Option<String>,

    /// Directory to save assets to (must exist; defaults to your downloads directory)
    #[arg(long, short)]
    pub dir: Option<PathBuf>,

    /// Only download assets whose name matches this regular expression
    #[arg(long, short)]
    pub asset: Option<String>,

    /// Save the single matching asset under this file name
    #[arg(long, short, requires = "asset")]
    pub output: Option<String>,
}

impl DownloadCommand {
    pub async fn run(self, global_args: GlobalArgs) -> Result<()> {
        let config = global_args.config();
        let transport = ReqwestTransport::new(&config)?;
        let github_client = GitHubClient::with_transport(&config, transport.clone());

        let Some(release) = find_release(&github_client, &self.repo, self.tag.as_deref()).await?
        else {
            ui::warning(&format!(
                "No {} found for {}, nothing to download.",
                release_label(self.tag.as_deref()),
                self.repo
            ));
            return Ok(());
        };

        let assets: Vec<&ReleaseAsset> = match &self.asset {
            Some(pattern) => release.matching_assets(pattern)?,
            None => release.assets.iter().collect(),
        };
        if assets.is_empty() {
            ui::warning(&format!(
                "No assets to download from {} {}.",
                self.repo, release.tag_name
            ));
            return Ok(());
        }

        let directory = self.dir.clone().unwrap_or(config.download_dir);
        ui::info(&format!(
            "Downloading {} asset(s) of {} {} to {}",
            assets.len(),
            self.repo,
            release.tag_name,
            directory.display()
        ));

        let downloader = AssetDownloader::with_transport(transport);
        let mut progress = show_progress;
        let results = match &self.output {
            Some(output) => {
                if assets.len() != 1 {
                    bail!(
                        "--output needs exactly one matching asset, but {} matched",
                        assets.len()
                    );
                }
                vec![
                    downloader
                        .download_asset(
                            assets[0],
                            &directory,
                            Some(output.as_str()),
                            Some(&mut progress),
                        )
                        .await
                        .context(format!("Failed to download {}", assets[0].name))?,
                ]
            }
            None => downloader
                .download_assets(assets, &directory, Some(&mut progress))
                .await
                .context("Failed to download assets")?,
        };

        for info in &results {
            ui::success(&format!(
                "{} ({})",
                info.path.display(),
                ui::human_size(info.downloaded_size)
            ));
        }
        Ok(())
    }
}

/// Drives the progress bar of the download span the update is reported from.
fn show_progress(info: &DownloadInfo) {
    let span = tracing::Span::current();
    if info.state() == DownloadState::NotStarted {
        let style = match info.total_size {
            Some(total) => {
                span.pb_set_length(total);
                progress_bar_style()
            }
            None => spinner_style("{msg} {bytes}"),
        };
        if let Ok(style) = style {
            span.pb_set_style(&style);
        }
        span.pb_set_message(&format!("Downloading {}...", info.name));
        span.pb_set_finish_message(&format!("Downloading {}... Complete!", info.name));
    }
    span.pb_set_position(info.downloaded_size);
}
