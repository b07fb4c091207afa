use std::collections::{BTreeMap, HashSet};
use std::sync::RwLock;

use crate::errors::PipelineError;
use crate::transport::{PageSink, is_generated_page_path};
use crate::types::PathString;

/// Page sink that keeps rendered pages in a sorted map.
#[derive(Debug, Default)]
pub struct MemoryPageSink {
    pages: RwLock<BTreeMap<PathString, String>>,
    failing_paths: HashSet<PathString>,
}

impl MemoryPageSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make writes to `path` fail, to exercise per-page failure reporting.
    pub fn with_failing_path(mut self, path: impl Into<PathString>) -> Self {
        self.failing_paths.insert(path.into());
        self
    }

    /// Copy of every stored page keyed by relative path.
    pub fn pages(&self) -> BTreeMap<PathString, String> {
        self.pages
            .read()
            .map(|pages| pages.clone())
            .unwrap_or_default()
    }

    pub fn get(&self, path: &str) -> Option<String> {
        self.pages.read().ok()?.get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.pages.read().map(|pages| pages.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PageSink for MemoryPageSink {
    fn write_page(&self, relative_path: &str, contents: &str) -> Result<(), PipelineError> {
        if self.failing_paths.contains(relative_path) {
            return Err(PipelineError::Io(std::io::Error::other(format!(
                "write refused for '{relative_path}'"
            ))));
        }
        let mut guard = self
            .pages
            .write()
            .map_err(|_| PipelineError::Io(std::io::Error::other("page map lock poisoned")))?;
        guard.insert(relative_path.to_string(), contents.to_string());
        Ok(())
    }

    fn prune_except(&self, keep: &HashSet<PathString>) -> Result<usize, PipelineError> {
        let mut guard = self
            .pages
            .write()
            .map_err(|_| PipelineError::Io(std::io::Error::other("page map lock poisoned")))?;
        let before = guard.len();
        guard.retain(|path, _| keep.contains(path) || !is_generated_page_path(path));
        Ok(before - guard.len())
    }
}
