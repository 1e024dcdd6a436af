//! Object paths
//!
//! Objects are addressed as `/objects/<segment>/...`. The same object is
//! served over HTTP at `/api/objects/<segment>/...`; both spellings parse to
//! the same [`ObjectPath`].

use crate::error::ObjectError;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

/// Canonical prefix of object paths
pub const OBJECTS_PREFIX: &str = "/objects/";

/// Prefix under which objects are served
pub const PUBLIC_PREFIX: &str = "/api/objects/";

/// Validated path of a stored object
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectPath(Vec<String>);

fn check_segment(segment: &str) -> Result<(), ObjectError> {
    let invalid = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0']);
    if invalid {
        return Err(ObjectError::InvalidPath(segment.to_string()));
    }
    Ok(())
}

impl ObjectPath {
    /// Build from segments
    ///
    /// # Errors
    /// Fails on empty input or an empty, `.`, `..`, slash or backslash segment
    pub fn from_segments<I, S>(segments: I) -> Result<Self, ObjectError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(ObjectError::InvalidPath(String::new()));
        }
        for segment in &segments {
            check_segment(segment)?;
        }
        Ok(Self(segments))
    }

    /// Path of an uploaded object
    ///
    /// # Errors
    /// Fails when `id` is not a valid single segment
    pub fn upload(id: &str) -> Result<Self, ObjectError> {
        Self::from_segments(["uploads", id])
    }

    /// Path of a generated object
    ///
    /// # Errors
    /// Fails when `name` is not a valid single segment
    pub fn generated(name: &str) -> Result<Self, ObjectError> {
        Self::from_segments(["generated", name])
    }

    /// Parse a local URL, `None` for anything that is not an object URL
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        path.parse().ok()
    }

    /// Path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Key relative to the store root (`a/b/c`)
    #[inline]
    #[must_use]
    pub fn key(&self) -> String {
        self.0.join("/")
    }

    /// URL the object is served at
    #[inline]
    #[must_use]
    pub fn public_url(&self) -> String {
        format!("{PUBLIC_PREFIX}{}", self.key())
    }

    /// Filesystem location below `root`
    #[must_use]
    pub fn to_fs_path(&self, root: &std::path::Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(&self.0);
        path
    }
}

impl Display for ObjectPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{OBJECTS_PREFIX}{}", self.key())
    }
}

impl FromStr for ObjectPath {
    type Err = ObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix(PUBLIC_PREFIX)
            .or_else(|| s.strip_prefix(OBJECTS_PREFIX))
            .ok_or_else(|| ObjectError::InvalidPath(s.to_string()))?;
        Self::from_segments(rest.split('/'))
    }
}
