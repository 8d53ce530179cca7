//! File-keyed resource sets.
//!
//! A [`Resources`] maps a repository-relative path to the document written at
//! that path. Two generators must never claim the same path, so every
//! insertion and merge rejects a key that is already present unless the
//! caller explicitly asks for [`MergePolicy::Override`].

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{Error, Result};

/// A serializable resource document.
pub type Document = serde_json::Value;

/// Convert any serializable resource into a [`Document`].
pub fn to_document<T: Serialize + ?Sized>(resource: &T) -> Result<Document> {
    Ok(serde_json::to_value(resource)?)
}

/// How [`merge_with`] treats a path present in more than one set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Fail with [`Error::DuplicateResourcePath`].
    #[default]
    Reject,
    /// Keep the document from the later set.
    Override,
}

/// An ordered mapping from relative file path to document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resources {
    files: BTreeMap<String, Document>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&Document> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Add a document, failing if the path is already taken.
    pub fn insert(&mut self, path: impl Into<String>, document: Document) -> Result<()> {
        let path = path.into();
        if self.files.contains_key(&path) {
            return Err(Error::DuplicateResourcePath(path));
        }
        self.files.insert(path, document);
        Ok(())
    }

    /// Serialize `resource` and add it at `path`.
    pub fn insert_resource<T: Serialize + ?Sized>(
        &mut self,
        path: impl Into<String>,
        resource: &T,
    ) -> Result<()> {
        self.insert(path, to_document(resource)?)
    }

    /// Add or replace a document, returning the one it replaced.
    pub fn upsert(&mut self, path: impl Into<String>, document: Document) -> Option<Document> {
        self.files.insert(path.into(), document)
    }

    /// All paths in lexicographic order.
    pub fn list_keys(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    /// The final path component of every key, sorted.
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .files
            .keys()
            .map(|path| base_name(path).to_string())
            .collect();
        names.sort();
        names
    }

    /// Keys that live directly in `dir`.
    pub fn entries_in<'a>(&'a self, dir: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.files
            .keys()
            .map(String::as_str)
            .filter(move |path| parent_dir(path) == dir)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Document)> {
        self.files.iter()
    }
}

impl IntoIterator for Resources {
    type Item = (String, Document);
    type IntoIter = std::collections::btree_map::IntoIter<String, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

/// Rewrite every key of `resources` to live under `prefix`.
///
/// Keys are normalized by [`join_path`], so two input keys that name the same
/// file (`x.yaml` and `./x.yaml`) fail with [`Error::DuplicateResourcePath`].
pub fn prefix_paths(prefix: &str, resources: &Resources) -> Result<Resources> {
    let mut prefixed = Resources::new();
    for (path, doc) in &resources.files {
        prefixed.insert(join_path(prefix, path), doc.clone())?;
    }
    Ok(prefixed)
}

/// Union of `sets`, failing on the first path claimed twice.
pub fn merge<I>(sets: I) -> Result<Resources>
where
    I: IntoIterator<Item = Resources>,
{
    merge_with(MergePolicy::Reject, sets)
}

/// Union of `sets` in order, resolving shared paths with `policy`.
pub fn merge_with<I>(policy: MergePolicy, sets: I) -> Result<Resources>
where
    I: IntoIterator<Item = Resources>,
{
    let mut merged = Resources::new();
    for set in sets {
        for (path, doc) in set {
            match policy {
                MergePolicy::Reject => merged.insert(path, doc)?,
                MergePolicy::Override => {
                    merged.upsert(path, doc);
                }
            }
        }
    }
    Ok(merged)
}

/// Join two slash-separated paths, dropping empty and `.` segments.
pub fn join_path(base: &str, path: &str) -> String {
    base.split('/')
        .chain(path.split('/'))
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// The last component of a slash-separated path.
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}
