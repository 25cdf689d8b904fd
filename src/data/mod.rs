//! Card data management
//!
//! Downloads and caches the card list and keyword list the recognizer is
//! built from. Each file is fetched once, written through a temp file and
//! recorded with its SHA-256 in a manifest.

use anyhow::{Context, Result};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

/// Environment variable that disables all downloads
pub const OFFLINE_ENV: &str = "DECKSCAN_OFFLINE";

const MANIFEST_FILE: &str = "manifest.json";

/// Data files the recognizer needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFile {
    /// Every card name, with foreign-language names
    AllCards,
    /// Keyword abilities, keyword actions and ability words
    Keywords,
}

impl DataFile {
    pub const ALL: [DataFile; 2] = [DataFile::AllCards, DataFile::Keywords];

    pub fn filename(&self) -> &'static str {
        match self {
            DataFile::AllCards => "VintageAtomic.json",
            DataFile::Keywords => "Keywords.json",
        }
    }

    pub fn download_url(&self) -> &'static str {
        match self {
            DataFile::AllCards => "https://mtgjson.com/api/v5/VintageAtomic.json",
            DataFile::Keywords => "https://mtgjson.com/api/v5/Keywords.json",
        }
    }

    /// Smallest plausible size; anything below is a failed or partial download
    pub fn min_size(&self) -> u64 {
        match self {
            DataFile::AllCards => 1_000_000,
            DataFile::Keywords => 1_000,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DataFile::AllCards => "Card List",
            DataFile::Keywords => "Keyword List",
        }
    }
}

/// Downloaded files and their digests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataManifest {
    pub version: String,
    pub files: Vec<DataFileInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataFileInfo {
    pub filename: String,
    pub url: String,
    pub size_bytes: u64,
    pub sha256: String,
    /// Unix seconds
    pub downloaded_at: u64,
}

impl Default for DataManifest {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            files: Vec::new(),
        }
    }
}

/// Downloads and caches card data files
pub struct DataManager {
    data_dir: PathBuf,
}

impl DataManager {
    /// Manager over the platform data directory
    pub fn new() -> Result<Self> {
        let data_dir = crate::storage::get_data_dir()?.join("cards");
        Self::with_dir(data_dir)
    }

    pub fn with_dir(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn file_path(&self, file: DataFile) -> PathBuf {
        self.data_dir.join(file.filename())
    }

    /// Whether `file` is present and not truncated
    pub fn is_available(&self, file: DataFile) -> bool {
        std::fs::metadata(self.file_path(file)).is_ok_and(|m| m.len() >= file.min_size())
    }

    /// Path to `file`, downloading it first when missing or when it no
    /// longer matches the digest recorded at download time
    pub fn ensure_file(&self, file: DataFile) -> Result<PathBuf> {
        let path = self.file_path(file);
        if self.is_available(file) {
            match self.verify(file) {
                Ok(Some(false)) => {
                    warn!("{} at {:?} does not match its recorded digest", file.display_name(), path);
                }
                Ok(_) => {
                    debug!("{} already available at {:?}", file.display_name(), path);
                    return Ok(path);
                }
                Err(e) => {
                    warn!("Could not verify {}: {:#}", file.display_name(), e);
                    return Ok(path);
                }
            }
        }

        self.download(file)?;
        Ok(path)
    }

    pub fn ensure_all(&self) -> Result<()> {
        for file in DataFile::ALL {
            self.ensure_file(file)?;
        }
        Ok(())
    }

    /// Download `file` even when a copy exists
    pub fn download(&self, file: DataFile) -> Result<()> {
        let url = file.download_url();
        let path = self.file_path(file);

        if std::env::var_os(OFFLINE_ENV).is_some() {
            anyhow::bail!(
                "Offline mode: cannot download {}. Download it from {} and place it at {:?}",
                file.display_name(),
                url,
                path
            );
        }

        info!("Downloading {} from {}", file.display_name(), url);
        let rt = Runtime::new().context("Failed to create tokio runtime")?;
        let (size_bytes, sha256) = rt.block_on(download_to(url, &path))?;

        if size_bytes < file.min_size() {
            std::fs::remove_file(&path).ok();
            anyhow::bail!(
                "Downloaded {} is only {} bytes, expected at least {}",
                file.display_name(),
                size_bytes,
                file.min_size()
            );
        }

        self.record(file, size_bytes, sha256)?;
        info!("Downloaded {} ({} bytes)", file.display_name(), size_bytes);
        Ok(())
    }

    fn record(&self, file: DataFile, size_bytes: u64, sha256: String) -> Result<()> {
        let mut manifest = self.load_manifest().unwrap_or_default();
        let downloaded_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        let entry = DataFileInfo {
            filename: file.filename().to_string(),
            url: file.download_url().to_string(),
            size_bytes,
            sha256,
            downloaded_at,
        };

        match manifest.files.iter_mut().find(|f| f.filename == entry.filename) {
            Some(existing) => *existing = entry,
            None => manifest.files.push(entry),
        }
        self.save_manifest(&manifest)
    }

    /// Check a cached file against the digest recorded at download time.
    /// Returns `None` when the file was never recorded.
    pub fn verify(&self, file: DataFile) -> Result<Option<bool>> {
        let manifest = self.load_manifest()?;
        let Some(entry) = manifest.files.iter().find(|f| f.filename == file.filename()) else {
            return Ok(None);
        };

        let path = self.file_path(file);
        let data = std::fs::read(&path).with_context(|| format!("Failed to read {:?}", path))?;
        Ok(Some(sha256_hex(&data) == entry.sha256))
    }

    pub fn load_manifest(&self) -> Result<DataManifest> {
        let manifest_path = self.data_dir.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Ok(DataManifest::default());
        }
        let content = std::fs::read_to_string(&manifest_path)?;
        let manifest = serde_json::from_str(&content)
            .with_context(|| format!("Invalid manifest {:?}", manifest_path))?;
        Ok(manifest)
    }

    pub fn save_manifest(&self, manifest: &DataManifest) -> Result<()> {
        let content = serde_json::to_string_pretty(manifest)?;
        std::fs::write(self.data_dir.join(MANIFEST_FILE), content)?;
        Ok(())
    }
}

/// Stream `url` into `path` through a temp file; returns size and SHA-256
async fn download_to(url: &str, path: &Path) -> Result<(u64, String)> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()
        .context("Failed to create HTTP client")?;

    let response = client
        .get(url)
        .send()
        .await
        .context("Failed to send download request")?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}: {}", response.status(), url);
    }
    debug!("Download size: {:?} bytes", response.content_length());

    let temp_path = path.with_extension("tmp");
    let mut file = std::fs::File::create(&temp_path).context("Failed to create temp file")?;

    let mut hasher = Sha256::new();
    let mut downloaded: u64 = 0;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("Error reading download stream")?;
        file.write_all(&chunk).context("Failed to write to temp file")?;
        hasher.update(&chunk);
        downloaded += chunk.len() as u64;
    }

    file.flush().context("Failed to flush temp file")?;
    drop(file);

    std::fs::rename(&temp_path, path).context("Failed to move downloaded file to final location")?;
    Ok((downloaded, format!("{:x}", hasher.finalize())))
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_file_names() {
        assert_eq!(DataFile::AllCards.filename(), "VintageAtomic.json");
        assert_eq!(DataFile::Keywords.filename(), "Keywords.json");
        for file in DataFile::ALL {
            assert!(file.download_url().ends_with(file.filename()));
        }
    }

    #[test]
    fn test_availability_needs_plausible_size() {
        let dir = tempfile::tempdir().unwrap();
        let manager = DataManager::with_dir(dir.path().to_path_buf()).unwrap();
        assert!(!manager.is_available(DataFile::Keywords));

        std::fs::write(manager.file_path(DataFile::Keywords), "{}").unwrap();
        assert!(!manager.is_available(DataFile::Keywords));

        std::fs::write(manager.file_path(DataFile::Keywords), "x".repeat(2_000)).unwrap();
        assert!(manager.is_available(DataFile::Keywords));
        assert_eq!(
            manager.ensure_file(DataFile::Keywords).unwrap(),
            dir.path().join("Keywords.json")
        );
    }

    #[test]
    fn test_manifest_roundtrip_and_verify() {
        let dir = tempfile::tempdir().unwrap();
        let manager = DataManager::with_dir(dir.path().to_path_buf()).unwrap();
        assert!(manager.load_manifest().unwrap().files.is_empty());
        assert_eq!(manager.verify(DataFile::Keywords).unwrap(), None);

        let content = "x".repeat(2_000);
        std::fs::write(manager.file_path(DataFile::Keywords), &content).unwrap();
        manager
            .record(DataFile::Keywords, 2_000, sha256_hex(content.as_bytes()))
            .unwrap();

        let manifest = manager.load_manifest().unwrap();
        assert_eq!(manifest.files.len(), 1);
        assert_eq!(manifest.files[0].size_bytes, 2_000);
        assert_eq!(manager.verify(DataFile::Keywords).unwrap(), Some(true));

        std::fs::write(manager.file_path(DataFile::Keywords), "changed").unwrap();
        assert_eq!(manager.verify(DataFile::Keywords).unwrap(), Some(false));
    }

    #[test]
    fn test_ensure_file_redownloads_on_digest_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let manager = DataManager::with_dir(dir.path().to_path_buf()).unwrap();
        let content = "x".repeat(2_000);
        std::fs::write(manager.file_path(DataFile::Keywords), &content).unwrap();
        manager
            .record(DataFile::Keywords, 2_000, sha256_hex(content.as_bytes()))
            .unwrap();

        assert!(manager.ensure_file(DataFile::Keywords).is_ok());

        // Same size, different bytes: the cached copy is no longer trusted
        std::fs::write(manager.file_path(DataFile::Keywords), "y".repeat(2_000)).unwrap();
        std::env::set_var(OFFLINE_ENV, "1");
        let result = manager.ensure_file(DataFile::Keywords);
        assert!(result.unwrap_err().to_string().contains("Offline mode"));
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
