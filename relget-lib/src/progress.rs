use std::path::{Path, PathBuf};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

/// Largest fraction reported before a transfer is confirmed complete.
pub const IN_PROGRESS_CEILING: f64 = 1.0 - f64::EPSILON;

/// Observer invoked synchronously on every progress update.
pub type ProgressFn<'a> = dyn FnMut(&DownloadInfo) + Send + 'a;

/// Progress and result of a single asset transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadInfo {
    /// Name of the asset being transferred
    pub name: String,

    /// File the asset is written to
    pub path: PathBuf,

    /// Bytes received so far
    pub downloaded_size: u64,

    /// Length announced by the server, if any
    pub total_size: Option<u64>,

    /// Fraction complete, from 0.0 to 1.0
    pub download_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    NotStarted,
    InProgress,
    Complete,
}

impl DownloadInfo {
    pub(crate) fn new(name: &str, path: &Path, total_size: Option<u64>) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            downloaded_size: 0,
            total_size,
            download_percent: 0.0,
        }
    }

    /// Records `bytes` more received. The fraction never decreases and
    /// stays below 1.0 until [`Self::finish`].
    pub(crate) fn advance(&mut self, bytes: u64) {
        self.downloaded_size += bytes;
        if let Some(total) = self.total_size.filter(|total| *total > 0) {
            let fraction =
                (self.downloaded_size as f64 / total as f64).min(IN_PROGRESS_CEILING);
            self.download_percent = self.download_percent.max(fraction);
        }
    }

    pub(crate) fn finish(&mut self) {
        self.download_percent = 1.0;
    }

    pub fn state(&self) -> DownloadState {
        if self.download_percent >= 1.0 {
            DownloadState::Complete
        } else if self.downloaded_size == 0 && self.download_percent == 0.0 {
            DownloadState::NotStarted
        } else {
            DownloadState::InProgress
        }
    }
}

/// Adapts progress callbacks into a channel of snapshots.
///
/// The returned callback can be handed to any download operation; every
/// update it sees is cloned into the receiver, in order. Updates sent after
/// the receiver is dropped are discarded.
pub fn channel() -> (
    impl FnMut(&DownloadInfo) + Send + 'static,
    UnboundedReceiver<DownloadInfo>,
) {
    let (sender, receiver) = unbounded_channel();
    let callback = move |info: &DownloadInfo| {
        let _ = sender.send(info.clone());
    };
    (callback, receiver)
}
