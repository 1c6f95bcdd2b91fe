use crate::cli::GlobalArgs;
use crate::ui;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use relget_lib::github::{GitHubClient, Release, Repository};

#[derive(Args)]
pub struct ListCommand {
    /// Repository in `owner/repo` form
    pub repo: Repository,

    /// Include draft releases
    #[arg(long)]
    pub drafts: bool,
}

impl ListCommand {
    pub async fn run(self, global_args: GlobalArgs) -> Result<()> {
        let config = global_args.config();
        let github_client = GitHubClient::new(&config)?;

        let releases = github_client
            .releases(&self.repo)
            .await
            .context(format!("Failed to list releases of {}", self.repo))?;
        let releases: Vec<&Release> = releases
            .iter()
            .filter(|release| self.drafts || !release.is_draft)
            .collect();

        if releases.is_empty() {
            ui::warning(&format!("No releases found for {}", self.repo));
            return Ok(());
        }

        ui::info(&format!(
            "{}",
            format!("Releases of {}:", self.repo).underline().green()
        ));
        Self::print_releases(&releases);

        tracing::info!("");
        ui::tip(&format!(
            "Use `relget show {} --tag <tag>` to see the assets of a release.",
            self.repo
        ));
        Ok(())
    }

    fn print_releases(releases: &[&Release]) {
        let width = releases
            .iter()
            .map(|release| release.tag_name.len())
            .max()
            .unwrap_or(0);
        for release in releases {
            let title = if release.display_name() == release.tag_name {
                "".to_string().normal()
            } else {
                format!("  {}", release.display_name()).normal()
            };
            let pre_release = if release.is_prerelease {
                " (pre-release)".yellow()
            } else {
                "".to_string().normal()
            };
            let draft = if release.is_draft {
                " (draft)".bright_blue()
            } else {
                "".to_string().normal()
            };
            let published = release
                .published_at
                .map(|date| format!("  {}", date.format("%Y-%m-%d")))
                .unwrap_or_default();
            ui::info(
                format!(
                    "{:width$}{}{}{}{}",
                    release.tag_name,
                    published.dimmed(),
                    title,
                    pre_release,
                    draft,
                    width = width,
                )
                .trim_end(),
            );
        }
    }
}
