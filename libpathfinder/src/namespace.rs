use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::error::{PathFinderError, Result};

/// A replica location relative to the storage root, starting at its
/// namespace segment, e.g. `/daac/a/b/f.fits`.
///
/// Both the resolver output and the relative form typed on the command line
/// (`daac/a/b/f.fits`) parse to the same value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NamespacePath {
    segments: Vec<String>,
}

impl NamespacePath {
    pub fn parse(raw: &str) -> Result<Self> {
        let mut segments = Vec::new();
        for component in Path::new(raw).components() {
            match component {
                Component::Normal(segment) => {
                    let segment = segment
                        .to_str()
                        .ok_or_else(|| PathFinderError::invalid_path(raw, "not valid UTF-8"))?;
                    segments.push(segment.to_string());
                }
                Component::RootDir | Component::CurDir => {}
                Component::ParentDir => {
                    return Err(PathFinderError::invalid_path(
                        raw,
                        "parent directory segments are not allowed",
                    ));
                }
                Component::Prefix(_) => {
                    return Err(PathFinderError::invalid_path(raw, "unsupported path prefix"));
                }
            }
        }

        if segments.is_empty() {
            return Err(PathFinderError::invalid_path(raw, "path is empty"));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// First segment: the namespace, which doubles as the authorization group.
    pub fn namespace(&self) -> &str {
        &self.segments[0]
    }

    pub fn file_name(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    /// Everything but the leaf, as a relative path (`daac/a/b`).
    pub fn directory(&self) -> PathBuf {
        self.segments[..self.segments.len() - 1].iter().collect()
    }

    pub fn to_relative_path(&self) -> PathBuf {
        self.segments.iter().collect()
    }
}

impl fmt::Display for NamespacePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for NamespacePath {
    type Err = PathFinderError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
