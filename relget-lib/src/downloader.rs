use crate::config::Config;
use crate::error::{Error, Result};
use crate::github::{Release, ReleaseAsset};
use crate::progress::{DownloadInfo, ProgressFn};
use crate::transport::{BodyStream, ReqwestTransport, Transport, TransportResponse};
use futures_util::StreamExt;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::instrument;

const OCTET_STREAM: &str = "application/octet-stream";

/// Streams release assets to disk, reporting progress as bytes arrive.
///
/// Batches are processed one asset at a time, in input order, so progress
/// updates for different assets never interleave. The first failure ends
/// the batch; files already written are left in place, and a partially
/// written file is not removed.
pub struct AssetDownloader<T: Transport = ReqwestTransport> {
    transport: T,
}

impl AssetDownloader<ReqwestTransport> {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_transport(ReqwestTransport::new(config)?))
    }
}

impl<T: Transport> AssetDownloader<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Downloads `asset` into `directory`, named `file_name` or the asset name.
    ///
    /// The callback sees 0.0 once the response is accepted, one update per
    /// received chunk, and 1.0 once the file is complete. The directory must
    /// already exist.
    #[instrument(skip_all, fields(asset = %asset.name))]
    pub async fn download_asset(
        &self,
        asset: &ReleaseAsset,
        directory: &Path,
        file_name: Option<&str>,
        mut progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<DownloadInfo> {
        let path = destination(directory, file_name.unwrap_or(&asset.name))?;
        tracing::debug!("Downloading {} to {}", asset.download_url, path.display());

        let TransportResponse {
            url,
            content_length,
            mut body,
            ..
        } = self
            .transport
            .get(&asset.download_url, OCTET_STREAM)
            .await?
            .error_for_status()?;

        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| Error::io(&path, e))?;

        let mut info = DownloadInfo::new(&asset.name, &path, content_length);
        report(&mut progress, &info);

        // Flush before surfacing a stream error so the partial file is complete on disk
        let streamed = stream_to_file(&mut body, &mut file, &mut info, &mut progress).await;
        file.flush().await.map_err(|e| Error::io(&path, e))?;
        streamed?;

        if let Some(expected) = content_length
            && expected != info.downloaded_size
        {
            return Err(Error::LengthMismatch {
                url,
                expected,
                actual: info.downloaded_size,
            });
        }

        info.finish();
        report(&mut progress, &info);
        tracing::debug!("Saved {} bytes to {}", info.downloaded_size, path.display());

        Ok(info)
    }

    /// Downloads each asset in order into `directory`, stopping at the first failure.
    pub async fn download_assets<'a, I>(
        &self,
        assets: I,
        directory: &Path,
        mut progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<Vec<DownloadInfo>>
    where
        I: IntoIterator<Item = &'a ReleaseAsset>,
    {
        let mut results = Vec::new();
        for asset in assets {
            let info = self
                .download_asset(asset, directory, None, progress.as_deref_mut())
                .await?;
            results.push(info);
        }
        Ok(results)
    }

    /// Downloads every asset of `release`.
    pub async fn download_release(
        &self,
        release: &Release,
        directory: &Path,
        progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<Vec<DownloadInfo>> {
        self.download_assets(&release.assets, directory, progress)
            .await
    }
}

/// Joins `file_name` onto `directory`, refusing anything but a plain file name.
fn destination(directory: &Path, file_name: &str) -> Result<PathBuf> {
    let mut components = Path::new(file_name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) => Ok(directory.join(name)),
        _ => Err(Error::InvalidFileName(file_name.to_string())),
    }
}

async fn stream_to_file(
    body: &mut BodyStream,
    file: &mut tokio::fs::File,
    info: &mut DownloadInfo,
    progress: &mut Option<&mut ProgressFn<'_>>,
) -> Result<()> {
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)
            .await
            .map_err(|e| Error::io(&info.path, e))?;
        info.advance(chunk.len() as u64);
        report(progress, info);
    }
    Ok(())
}

fn report(progress: &mut Option<&mut ProgressFn<'_>>, info: &DownloadInfo) {
    if let Some(callback) = progress.as_deref_mut() {
        callback(info);
    }
}
