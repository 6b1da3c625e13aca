//! File payload delivery.

pub mod download;

pub use download::{DownloadResult, DownloadService, download_filename};
