//! # Package-relative paths
//!
//! Every asset in a package is addressed by a `RelativePath`: a non-empty,
//! `/`-separated sequence of segments with no root, no `.` and no `..`.
//! The form is platform independent, so the same package hashes identically
//! whether it was loaded on Linux or Windows, and [`RelativePath::resolve`]
//! can never leave the directory it is resolved against.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PathError;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelativePath(String);

impl RelativePath {
    /// Validate a `/`-separated relative path.
    pub fn new(path: impl AsRef<str>) -> Result<Self, PathError> {
        let raw = path.as_ref();
        if raw.is_empty() {
            return Err(PathError::Empty);
        }
        if raw.starts_with('/') || raw.starts_with('\\') || has_drive_prefix(raw) {
            return Err(PathError::Absolute(raw.to_string()));
        }
        for segment in raw.split('/') {
            match segment {
                ".." => return Err(PathError::ParentTraversal(raw.to_string())),
                "" | "." => {
                    return Err(PathError::InvalidSegment {
                        path: raw.to_string(),
                        segment: segment.to_string(),
                    })
                }
                s if s.contains('\\') || s.contains('\0') => {
                    return Err(PathError::InvalidSegment {
                        path: raw.to_string(),
                        segment: s.to_string(),
                    })
                }
                _ => {}
            }
        }
        Ok(Self(raw.to_string()))
    }

    /// Wrap a compile-time constant. Only used for layout constants, which
    /// the layout tests check against [`RelativePath::new`].
    pub(crate) fn from_static(raw: &'static str) -> Self {
        Self(raw.to_string())
    }

    /// Convert a native relative path, e.g. the result of
    /// `Path::strip_prefix` during a directory walk.
    pub fn from_path(path: &Path) -> Result<Self, PathError> {
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(s) => match s.to_str() {
                    Some(s) => segments.push(s),
                    None => return Err(PathError::NotUtf8(path.display().to_string())),
                },
                Component::CurDir => {}
                Component::ParentDir => {
                    return Err(PathError::ParentTraversal(path.display().to_string()))
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(PathError::Absolute(path.display().to_string()))
                }
            }
        }
        Self::new(segments.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append one or more `/`-separated segments.
    pub fn join(&self, tail: &str) -> Result<Self, PathError> {
        Self::new(format!("{}/{}", self.0, tail))
    }

    /// Native path of this asset under `root`.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        let mut out = root.to_path_buf();
        for segment in self.segments() {
            out.push(segment);
        }
        out
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// The last segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Everything after the last `.` of the file name, including the dot.
    /// Matches how suffixes are compared when tagging mapping dialects.
    pub fn suffix(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(i) => Some(&name[i..]),
        }
    }

    pub fn parent(&self) -> Option<Self> {
        self.0
            .rsplit_once('/')
            .map(|(parent, _)| Self(parent.to_string()))
    }

    /// True when `self` is `prefix` or lies underneath it.
    pub fn starts_with(&self, prefix: &RelativePath) -> bool {
        self.0 == prefix.0
            || (self.0.starts_with(&prefix.0) && self.0.as_bytes().get(prefix.0.len()) == Some(&b'/'))
    }
}

fn has_drive_prefix(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RelativePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for RelativePath {
    type Error = PathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Serialize for RelativePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RelativePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}
