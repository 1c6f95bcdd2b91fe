use crate::cli::GlobalArgs;
use crate::commands::{find_release, release_label};
use crate::ui;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use relget_lib::github::{GitHubClient, Release, Repository};

#[derive(Args)]
pub struct ShowCommand {
    /// Repository in `owner/repo` form
    pub repo: Repository,

    /// Release tag (defaults to the latest release)
    #[arg(long, short)]
    pub tag: Option<String>,

    /// Print the release notes as well
    #[arg(long)]
    pub notes: bool,
}

impl ShowCommand {
    pub async fn run(self, global_args: GlobalArgs) -> Result<()> {
        let config = global_args.config();
        let github_client = GitHubClient::new(&config)?;

        let Some(release) = find_release(&github_client, &self.repo, self.tag.as_deref()).await?
        else {
            ui::warning(&format!(
                "No {} found for {}",
                release_label(self.tag.as_deref()),
                self.repo
            ));
            return Ok(());
        };

        self.print_release(&release);
        Ok(())
    }

    fn print_release(&self, release: &Release) {
        ui::info(&format!(
            "{} {}",
            release.display_name().bold().green(),
            format!("({})", release.tag_name).dimmed()
        ));
        if !release.target_branch.is_empty() {
            ui::info(&format!("Target:    {}", release.target_branch));
        }
        if let Some(published_at) = release.published_at {
            ui::info(&format!(
                "Published: {}",
                published_at.format("%Y-%m-%d %H:%M UTC")
            ));
        }
        if release.is_prerelease {
            ui::warning("This is a pre-release.");
        }
        if release.is_draft {
            ui::warning("This is a draft release.");
        }
        if let Some(url) = &release.html_url {
            ui::info(&format!("URL:       {url}"));
        }

        tracing::info!("");
        if release.assets.is_empty() {
            ui::warning("This release has no assets.");
        } else {
            ui::info(&format!("{}", "Assets:".underline()));
            let width = release
                .assets
                .iter()
                .map(|asset| asset.name.len())
                .max()
                .unwrap_or(0);
            for asset in &release.assets {
                let size = asset.size.map(ui::human_size).unwrap_or_default();
                ui::info(
                    format!("  {:width$}  {}", asset.name, size.dimmed(), width = width)
                        .trim_end(),
                );
            }
        }

        if self.notes
            && let Some(body) = release.body.as_deref().filter(|body| !body.trim().is_empty())
        {
            tracing::info!("");
            ui::info(body);
        }

        tracing::info!("");
        ui::tip(&format!(
            "Use `relget download {}{}` to download these assets.",
            self.repo,
            self.tag
                .as_deref()
                .map(|tag| format!(" --tag {tag}"))
                .unwrap_or_default()
        ));
    }
}
