pub mod config;
pub mod downloader;
pub mod error;
pub mod github;
pub mod logging;
pub mod progress;
pub mod transport;

#[cfg(test)]
pub mod test_helpers;
