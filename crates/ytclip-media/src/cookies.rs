//! Session credentials handed to yt-dlp as Netscape cookie files.
//!
//! yt-dlp rewrites the cookie file it is given, so every attempt receives its
//! own writable copy. The copy is removed a fixed delay after its handle drops.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempPath;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Where the configured credentials come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CookieSource {
    #[default]
    None,
    /// Raw Netscape file content (e.g. from an environment variable)
    Content(String),
    /// Path to a Netscape cookie file
    File(PathBuf),
}

impl CookieSource {
    /// Build from optional inline content and file path. Inline content wins.
    pub fn from_parts(content: Option<String>, file: Option<PathBuf>) -> Self {
        match (content, file) {
            (Some(content), _) if !content.trim().is_empty() => CookieSource::Content(content),
            (_, Some(path)) => CookieSource::File(path),
            _ => CookieSource::None,
        }
    }

    pub fn is_configured(&self) -> bool {
        !matches!(self, CookieSource::None)
    }

    /// Load the credential content. `Ok(None)` when nothing is configured.
    pub async fn read_content(&self) -> MediaResult<Option<String>> {
        match self {
            CookieSource::None => Ok(None),
            CookieSource::Content(content) => Ok(Some(content.clone())),
            CookieSource::File(path) => {
                let content = tokio::fs::read_to_string(path).await?;
                Ok(Some(content))
            }
        }
    }

    /// Materialise a scoped cookie file for one attempt.
    pub async fn materialize(&self, cleanup_delay: Duration) -> MediaResult<Option<ScopedCookieFile>> {
        let Some(content) = self.read_content().await? else {
            return Ok(None);
        };

        if !is_valid_netscape_cookies(&content) {
            return Err(MediaError::InvalidCookies {
                path: self.display_path(),
                reason: "not in Netscape format".to_string(),
            });
        }

        ScopedCookieFile::create(&content, cleanup_delay).map(Some)
    }

    fn display_path(&self) -> PathBuf {
        match self {
            CookieSource::File(path) => path.clone(),
            _ => PathBuf::from("<inline>"),
        }
    }
}

/// Check that content looks like a Netscape cookie file.
///
/// Accepts the standard header or at least one tab-separated line with six or
/// more fields.
pub fn is_valid_netscape_cookies(content: &str) -> bool {
    if content.starts_with("# Netscape HTTP Cookie File") || content.starts_with("# HTTP Cookie File")
    {
        return true;
    }

    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .any(|line| line.split('\t').count() >= 6)
}

/// Temporary cookie file owned by a single invocation attempt.
#[derive(Debug)]
pub struct ScopedCookieFile {
    path: Option<TempPath>,
    cleanup_delay: Duration,
}

impl ScopedCookieFile {
    pub fn create(content: &str, cleanup_delay: Duration) -> MediaResult<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("ytclip-cookies-")
            .suffix(".txt")
            .tempfile()?;
        file.write_all(content.as_bytes())?;
        file.flush()?;

        let path = file.into_temp_path();
        debug!(path = %path.display(), "Created scoped cookies file");

        Ok(Self {
            path: Some(path),
            cleanup_delay,
        })
    }

    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or_else(|| Path::new(""))
    }
}

impl Drop for ScopedCookieFile {
    fn drop(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };

        let delay = self.cleanup_delay;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) if !delay.is_zero() => {
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    remove(path);
                });
            }
            _ => remove(path),
        }
    }
}

fn remove(path: TempPath) {
    let shown = path.display().to_string();
    match path.close() {
        Ok(()) => debug!(path = %shown, "Removed scoped cookies file"),
        Err(e) => warn!(path = %shown, "Failed to remove scoped cookies file: {}", e),
    }
}
