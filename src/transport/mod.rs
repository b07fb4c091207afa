use std::collections::HashSet;

use crate::category::CanonicalCategory;
use crate::constants::pages::INDEX_FILENAME;
use crate::errors::PipelineError;
use crate::types::PathString;

/// Filesystem input loading and page output.
pub mod fs;
/// In-memory page sink for tests and previews.
pub mod memory;

/// Destination for rendered pages.
///
/// Called concurrently from rendering workers; every call targets a distinct
/// path. Writing the same path again must overwrite it.
pub trait PageSink: Send + Sync {
    /// Store `contents` at `relative_path` (for example `suv/toyota/harrier/index.html`).
    fn write_page(&self, relative_path: &str, contents: &str) -> Result<(), PipelineError>;

    /// Remove pages from an earlier run that are not in `keep`.
    ///
    /// Returns how many pages were removed. Sinks without persistent state keep
    /// the default no-op.
    fn prune_except(&self, _keep: &HashSet<PathString>) -> Result<usize, PipelineError> {
        Ok(0)
    }
}

/// True for `index.html` paths inside a category subtree (`suv/index.html`,
/// `suv/toyota/harrier/index.html`).
///
/// Pruning only ever removes paths that pass this check; root-level files and
/// other subtrees (`index.html`, `about/index.html`) belong to the rest of the site.
pub fn is_generated_page_path(relative_path: &str) -> bool {
    let mut segments = relative_path.split('/');
    let Some(first) = segments.next() else {
        return false;
    };
    let in_category = CanonicalCategory::ALL
        .iter()
        .any(|category| category.slug() == first);
    in_category && relative_path.ends_with(INDEX_FILENAME) && segments.next().is_some()
}
