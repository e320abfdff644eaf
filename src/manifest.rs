//! Project manifest documents (`pyproject.toml`).
//!
//! A manifest is parsed with `toml_edit` so that re-serializing it keeps every
//! field, ordering, comment and nested table of the original. The only
//! operation the release flow needs is [`Manifest::with_version`], which
//! builds a *new* document; the parsed original is never modified.

use crate::domain::version::Version;
use crate::error::{ReleaseError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::{value, DocumentMut, Item};

/// Name of the table holding the project metadata
pub const PROJECT_SECTION: &str = "project";
/// Key of the version field inside [`PROJECT_SECTION`]
pub const VERSION_KEY: &str = "version";

/// An immutable, parsed manifest document
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    document: DocumentMut,
}

impl Manifest {
    /// Read and parse a manifest from disk
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| ReleaseError::ManifestRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &text)
    }

    /// Parse manifest text; `path` is only used for error reporting
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let document = text
            .parse::<DocumentMut>()
            .map_err(|e| ReleaseError::ManifestSyntax {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        Ok(Manifest {
            path: path.to_path_buf(),
            document,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The raw version string of the `[project]` section
    pub fn version_text(&self) -> Result<&str> {
        let project = self
            .document
            .get(PROJECT_SECTION)
            .filter(|item| item.is_table_like())
            .ok_or_else(|| ReleaseError::MissingSection(self.path.clone()))?;

        project
            .get(VERSION_KEY)
            .and_then(Item::as_str)
            .ok_or_else(|| ReleaseError::MissingVersion(self.path.clone()))
    }

    /// The parsed version of the `[project]` section
    pub fn version(&self) -> Result<Version> {
        let text = self.version_text()?;
        Version::parse(text)
    }

    /// A new document identical to this one except for the version field
    pub fn with_version(&self, version: &Version) -> Result<Manifest> {
        let mut document = self.document.clone();

        let project = document
            .get_mut(PROJECT_SECTION)
            .and_then(Item::as_table_like_mut)
            .ok_or_else(|| ReleaseError::MissingSection(self.path.clone()))?;

        let slot = project
            .get_mut(VERSION_KEY)
            .ok_or_else(|| ReleaseError::MissingVersion(self.path.clone()))?;

        // Keep the decoration (spacing, trailing comment) of the old value.
        let decor = slot.as_value().map(|v| v.decor().clone());
        *slot = value(version.to_string());
        if let (Some(decor), Some(new_value)) = (decor, slot.as_value_mut()) {
            *new_value.decor_mut() = decor;
        }

        Ok(Manifest {
            path: self.path.clone(),
            document,
        })
    }

    /// Serialized form of the document
    pub fn render(&self) -> String {
        self.document.to_string()
    }
}
