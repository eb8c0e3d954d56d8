//! Output directory policy

use crate::config::DownloadConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Where decrypted pages are written
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputPlacement {
    /// An absolute directory used as-is
    Absolute {
        /// Target directory
        path: PathBuf,
    },
    /// Segments joined onto the configured base directory
    Relative {
        /// Path segments
        paths: Vec<String>,
    },
    /// Segments under `<base>/<scratch>`; the default with no segments is `<base>/temp`
    Scratch {
        /// Path segments
        #[serde(default)]
        paths: Vec<String>,
    },
}

impl Default for OutputPlacement {
    fn default() -> Self {
        OutputPlacement::Scratch { paths: Vec::new() }
    }
}

impl OutputPlacement {
    /// Absolute directory placement
    pub fn absolute(path: impl Into<PathBuf>) -> Self {
        OutputPlacement::Absolute { path: path.into() }
    }

    /// Relative placement from string segments
    pub fn relative<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        OutputPlacement::Relative {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Resolve to a single absolute directory without touching the filesystem
    ///
    /// Segments may not be absolute or contain `..`; a relative `base_dir` is
    /// anchored at the current working directory.
    pub fn resolve(&self, config: &DownloadConfig) -> Result<PathBuf> {
        let dir = match self {
            OutputPlacement::Absolute { path } => {
                if !path.is_absolute() {
                    return Err(Error::config(
                        format!("{} is not an absolute path", path.display()),
                        "placement.path",
                    ));
                }
                path.clone()
            }
            OutputPlacement::Relative { paths } => join_segments(&config.base_dir, paths)?,
            OutputPlacement::Scratch { paths } => {
                let scratch = config.base_dir.join(&config.scratch_dir);
                join_segments(&scratch, paths)?
            }
        };
        absolutize(dir)
    }

    /// Resolve and create the directory, including missing parents
    ///
    /// Succeeds if the directory already exists.
    pub async fn prepare(&self, config: &DownloadConfig) -> Result<PathBuf> {
        let dir = self.resolve(config)?;
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::filesystem(&dir, e))?;
        tracing::debug!(path = %dir.display(), "output directory ready");
        Ok(dir)
    }
}

fn join_segments(base: &Path, segments: &[String]) -> Result<PathBuf> {
    let mut dir = base.to_path_buf();
    for segment in segments {
        let escapes = Path::new(segment).components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Err(Error::config(
                format!("path segment {segment:?} escapes the base directory"),
                "placement.paths",
            ));
        }
        dir.push(segment);
    }
    Ok(dir)
}

fn absolutize(dir: PathBuf) -> Result<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir);
    }
    let cwd = std::env::current_dir().map_err(|e| Error::filesystem(&dir, e))?;
    Ok(cwd.join(dir))
}
