use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::CASCADE_BASE_URL;

#[derive(Error, Debug)]
pub enum CascadeResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write cascade to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
    #[error("{0} not found locally and downloads are disabled")]
    NotFound(String),
}

/// Locates Haar cascade XML files, fetching stock ones on first use.
///
/// Resolution order:
/// 1. Explicit cascade directory (if configured)
/// 2. User cache directory
/// 3. Download from `base_url` into the cache (unless offline)
pub struct CascadeResolver {
    cascade_dir: Option<PathBuf>,
    cache_dir: PathBuf,
    base_url: String,
    allow_download: bool,
}

impl CascadeResolver {
    pub fn new(cascade_dir: Option<PathBuf>, cache_dir: PathBuf) -> Self {
        Self {
            cascade_dir,
            cache_dir,
            base_url: CASCADE_BASE_URL.to_string(),
            allow_download: true,
        }
    }

    /// Resolver backed by the platform cache directory.
    pub fn with_default_cache(cascade_dir: Option<PathBuf>) -> Result<Self, CascadeResolveError> {
        Ok(Self::new(cascade_dir, cascade_cache_dir()?))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn offline(mut self) -> Self {
        self.allow_download = false;
        self
    }

    pub fn resolve(&self, name: &str) -> Result<PathBuf, CascadeResolveError> {
        if let Some(dir) = &self.cascade_dir {
            let local = dir.join(name);
            if local.exists() {
                return Ok(local);
            }
        }

        let cached = self.cache_dir.join(name);
        if cached.exists() {
            return Ok(cached);
        }

        if !self.allow_download {
            return Err(CascadeResolveError::NotFound(name.to_string()));
        }

        fs::create_dir_all(&self.cache_dir).map_err(CascadeResolveError::CacheDir)?;
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), name);
        log::info!("Downloading {name} from {url}");
        download(&url, &cached)?;
        Ok(cached)
    }
}

/// Platform-specific cascade cache directory, e.g. `~/.cache/Doorwatch/cascades/`.
pub fn cascade_cache_dir() -> Result<PathBuf, CascadeResolveError> {
    dirs::cache_dir()
        .map(|d| d.join("Doorwatch").join("cascades"))
        .ok_or(CascadeResolveError::NoCacheDir)
}

fn download(url: &str, dest: &Path) -> Result<(), CascadeResolveError> {
    let temp_path = dest.with_extension("part");

    let result = download_inner(url, dest, &temp_path);

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result
}

fn download_inner(url: &str, dest: &Path, temp_path: &Path) -> Result<(), CascadeResolveError> {
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| CascadeResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let write_err = |e: std::io::Error| CascadeResolveError::Write {
        path: temp_path.to_path_buf(),
        source: e,
    };

    let mut file = fs::File::create(temp_path).map_err(write_err)?;
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = response.read(&mut buf).map_err(write_err)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(write_err)?;
    }
    file.flush().map_err(write_err)?;
    drop(file);

    fs::rename(temp_path, dest).map_err(|e| CascadeResolveError::Write {
        path: dest.to_path_buf(),
        source: e,
    })?;

    Ok(())
}
