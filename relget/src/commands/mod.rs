pub mod download;
pub mod list;
pub mod show;

use anyhow::{Context, Result};
use relget_lib::github::{GitHubClient, Release, Repository};
use relget_lib::transport::Transport;

/// The release tagged `tag`, or the latest release when no tag is given.
pub async fn find_release<T: Transport>(
    client: &GitHubClient<T>,
    repo: &Repository,
    tag: Option<&str>,
) -> Result<Option<Release>> {
    match tag {
        Some(tag) => client
            .release_by_tag(repo, tag)
            .await
            .context(format!("Failed to fetch release {tag} of {repo}")),
        None => client
            .latest_release(repo)
            .await
            .context(format!("Failed to fetch the latest release of {repo}")),
    }
}

pub fn release_label(tag: Option<&str>) -> String {
    match tag {
        Some(tag) => format!("release '{tag}'"),
        None => "latest release".to_string(),
    }
}
