use crate::error::{ProvenanceError, ProvenanceResult};
use std::collections::BTreeMap;

/// A file in a node repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RepositoryFile {
    /// Content held in memory until the node is stored.
    Pending(Vec<u8>),
    /// Content lives in the backend object store under `key`.
    Stored { key: String },
}

/// Files owned by a node, keyed by relative path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Repository {
    files: BTreeMap<String, RepositoryFile>,
}

impl Repository {
    pub(crate) fn from_keys(keys: BTreeMap<String, String>) -> Self {
        Self {
            files: keys
                .into_iter()
                .map(|(path, key)| (path, RepositoryFile::Stored { key }))
                .collect(),
        }
    }

    pub(crate) fn put(&mut self, path: impl Into<String>, content: Vec<u8>) -> ProvenanceResult<()> {
        let path = path.into();
        validate_path(&path)?;
        self.files.insert(path, RepositoryFile::Pending(content));
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&RepositoryFile> {
        self.files.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RepositoryFile)> {
        self.files.iter().map(|(p, f)| (p.as_str(), f))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Repository paths are relative, non-empty and never climb out with `..`.
pub fn validate_path(path: &str) -> ProvenanceResult<()> {
    let invalid = |reason: &str| {
        Err(ProvenanceError::InvalidValue(format!(
            "invalid repository path `{}`: {}",
            path, reason
        )))
    };
    if path.is_empty() {
        return invalid("empty");
    }
    if path.starts_with('/') {
        return invalid("absolute");
    }
    for segment in path.split('/') {
        match segment {
            "" => return invalid("empty segment"),
            ".." => return invalid("parent segment"),
            _ => {}
        }
    }
    Ok(())
}
