use crate::config::Config;
use crate::error::{Error, Result};
use crate::transport::{ReqwestTransport, Transport};
use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::instrument;

const GITHUB_JSON: &str = "application/vnd.github+json";

/// An `owner/repo` pair on the forge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }
}

impl FromStr for Repository {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidRepository(s.to_string());
        let (owner, name) = s.trim().split_once('/').ok_or_else(invalid)?;
        let is_segment = |part: &str| {
            !part.is_empty() && !part.contains('/') && !part.contains(char::is_whitespace)
        };
        if !is_segment(owner) || !is_segment(name) {
            return Err(invalid());
        }
        Ok(Self::new(owner, name))
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A published release, as returned by the releases API.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Release {
    pub id: u64,
    pub name: Option<String>,
    pub tag_name: String,
    #[serde(rename = "target_commitish", default)]
    pub target_branch: String,
    #[serde(rename = "draft", default)]
    pub is_draft: bool,
    #[serde(rename = "prerelease", default)]
    pub is_prerelease: bool,
    pub body: Option<String>,
    pub html_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// A downloadable file attached to a release.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ReleaseAsset {
    pub name: String,
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
    pub size: Option<u64>,
    pub content_type: Option<String>,
}

impl ReleaseAsset {
    pub fn new(name: &str, download_url: &str) -> Self {
        Self {
            name: name.to_string(),
            download_url: download_url.to_string(),
            size: None,
            content_type: None,
        }
    }
}

impl Release {
    /// The release title, falling back to the tag when the title is blank.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.tag_name)
    }

    pub fn find_asset(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|asset| asset.name == name)
    }

    /// Assets whose name matches `pattern`, in release order.
    pub fn matching_assets(&self, pattern: &str) -> Result<Vec<&ReleaseAsset>> {
        let re = Regex::new(pattern)?;
        Ok(self
            .assets
            .iter()
            .filter(|asset| re.is_match(&asset.name))
            .collect())
    }
}

/// Reads release metadata from the forge's REST API.
///
/// A release that does not exist (HTTP 404) is reported as `None` rather
/// than as an error; every other failure is returned to the caller.
pub struct GitHubClient<T: Transport = ReqwestTransport> {
    api_base: String,
    transport: T,
}

impl GitHubClient<ReqwestTransport> {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_transport(config, ReqwestTransport::new(config)?))
    }
}

impl<T: Transport> GitHubClient<T> {
    pub fn with_transport(config: &Config, transport: T) -> Self {
        Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            transport,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[instrument(skip(self, repo), fields(repo = %repo))]
    pub async fn latest_release(&self, repo: &Repository) -> Result<Option<Release>> {
        let url = self.endpoint(repo, &["releases", "latest"])?;
        Ok(self.get_json(url.as_str()).await?.map(|(release, _)| release))
    }

    #[instrument(skip(self, repo), fields(repo = %repo))]
    pub async fn release_by_tag(&self, repo: &Repository, tag: &str) -> Result<Option<Release>> {
        let url = self.endpoint(repo, &["releases", "tags", tag])?;
        Ok(self.get_json(url.as_str()).await?.map(|(release, _)| release))
    }

    /// Every release of the repository, newest first, following pagination.
    /// An unknown repository yields an empty list.
    #[instrument(skip(self, repo), fields(repo = %repo))]
    pub async fn releases(&self, repo: &Repository) -> Result<Vec<Release>> {
        let mut releases = Vec::new();
        let mut first = self.endpoint(repo, &["releases"])?;
        first.query_pairs_mut().append_pair("per_page", "100");
        let mut next_url = Some(first.to_string());

        while let Some(url) = next_url {
            let Some((page, next)) = self.get_json::<Vec<Release>>(&url).await? else {
                break;
            };
            tracing::debug!("Fetched {} releases from {}", page.len(), url);
            releases.extend(page);
            next_url = next;
        }

        Ok(releases)
    }

    /// `{api_base}/repos/{owner}/{name}/{segments...}`, each segment percent-encoded.
    fn endpoint(&self, repo: &Repository, segments: &[&str]) -> Result<Url> {
        let invalid = || Error::InvalidApiUrl(self.api_base.clone());
        let mut url = Url::parse(&self.api_base).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push("repos")
            .push(&repo.owner)
            .push(&repo.name)
            .extend(segments);
        Ok(url)
    }

    /// Returns the decoded body plus the `rel="next"` link, or `None` on 404.
    async fn get_json<D: DeserializeOwned>(&self, url: &str) -> Result<Option<(D, Option<String>)>> {
        let response = self.transport.get(url, GITHUB_JSON).await?;
        if response.status == StatusCode::NOT_FOUND {
            tracing::debug!("{} not found", url);
            return Ok(None);
        }

        let response = response.error_for_status()?;
        let next = response.header("link").and_then(parse_next_link);
        let body = response.bytes().await?;
        let value = serde_json::from_slice(&body).map_err(|source| Error::Deserialize {
            url: url.to_string(),
            source,
        })?;
        Ok(Some((value, next)))
    }
}

fn parse_next_link(link_header: &str) -> Option<String> {
    link_header
        .split(',')
        .find(|part| part.contains("rel=\"next\""))
        .and_then(|part| part.split(';').next())
        .map(|url| url.trim().trim_matches(|c| c == '<' || c == '>').to_string())
}
