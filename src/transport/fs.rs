use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::cascade::{Cascade, CascadeArtifact};
use crate::config::RateConfig;
use crate::constants::pages::{INDEX_FILENAME, LOG_PREFIX};
use crate::data::RawVehicleRecord;
use crate::errors::PipelineError;
use crate::transport::{PageSink, is_generated_page_path};
use crate::types::PathString;

/// Read and decode a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PipelineError> {
    let raw = fs::read(path)?;
    serde_json::from_slice(&raw).map_err(|source| PipelineError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a vehicle or motorcycle record list produced by the sheet extraction step.
pub fn load_records(path: &Path) -> Result<Vec<RawVehicleRecord>, PipelineError> {
    let records: Vec<RawVehicleRecord> = read_json(path)?;
    debug!(path = %path.display(), count = records.len(), "loaded records");
    Ok(records)
}

/// Load and validate the rate configuration.
pub fn load_rate_config(path: &Path) -> Result<RateConfig, PipelineError> {
    if !path.is_file() {
        return Err(PipelineError::Configuration(format!(
            "rate configuration '{}' does not exist",
            path.display()
        )));
    }
    let config: RateConfig = read_json(path)?;
    config.validate()?;
    Ok(config)
}

/// Load a cascade artifact and check its invariants.
pub fn load_cascade(path: &Path) -> Result<Cascade, PipelineError> {
    let artifact: CascadeArtifact = read_json(path)?;
    Cascade::from_artifact(artifact)
}

/// Write the compact cascade artifact, replacing any previous file.
pub fn write_cascade(path: &Path, cascade: &Cascade) -> Result<(), PipelineError> {
    let json = cascade.to_json()?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)?;
    Ok(())
}

/// Writes pages under a root directory, creating parent directories as needed.
pub struct FsPageSink {
    root: PathBuf,
}

impl FsPageSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every `index.html` currently under the root, as `/`-joined relative paths.
    pub fn existing_pages(&self) -> Vec<PathString> {
        let mut pages: Vec<PathString> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file() && entry.file_name() == INDEX_FILENAME)
            .filter_map(|entry| relative_path_string(&self.root, entry.path()))
            .collect();
        pages.sort();
        pages
    }
}

impl PageSink for FsPageSink {
    fn write_page(&self, relative_path: &str, contents: &str) -> Result<(), PipelineError> {
        let target = self.root.join(relative_path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, contents)?;
        Ok(())
    }

    fn prune_except(&self, keep: &HashSet<PathString>) -> Result<usize, PipelineError> {
        let mut removed = 0usize;
        for relative in self.existing_pages() {
            if keep.contains(&relative) || !is_generated_page_path(&relative) {
                continue;
            }
            let path = self.root.join(&relative);
            fs::remove_file(&path)?;
            debug!(path = %path.display(), "{LOG_PREFIX} removed stale page");
            removed += 1;
            remove_empty_parents(&self.root, &path);
        }
        Ok(removed)
    }
}

fn relative_path_string(root: &Path, path: &Path) -> Option<PathString> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

fn remove_empty_parents(root: &Path, path: &Path) {
    let mut current = path.parent();
    while let Some(dir) = current {
        if dir == root || !dir.starts_with(root) {
            break;
        }
        let is_empty = fs::read_dir(dir)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if !is_empty {
            break;
        }
        if let Err(err) = fs::remove_dir(dir) {
            warn!(
                path = %dir.display(),
                error = %err,
                "{LOG_PREFIX} could not remove empty directory"
            );
            break;
        }
        current = dir.parent();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sink_overwrites_pages_and_lists_them() {
        let temp = tempdir().unwrap();
        let sink = FsPageSink::new(temp.path());
        sink.write_page("suv/toyota/harrier/index.html", "first").unwrap();
        sink.write_page("suv/toyota/harrier/index.html", "second").unwrap();
        sink.write_page("suv/index.html", "listing").unwrap();
        fs::write(temp.path().join("styles.css"), "body {}").unwrap();

        let written =
            fs::read_to_string(temp.path().join("suv/toyota/harrier/index.html")).unwrap();
        assert_eq!(written, "second");
        assert_eq!(
            sink.existing_pages(),
            vec![
                "suv/index.html".to_string(),
                "suv/toyota/harrier/index.html".to_string()
            ]
        );
    }

    #[test]
    fn prune_removes_only_stale_index_files() {
        let temp = tempdir().unwrap();
        let sink = FsPageSink::new(temp.path());
        sink.write_page("suv/index.html", "keep").unwrap();
        sink.write_page("suv/toyota/rav4/index.html", "stale").unwrap();
        fs::write(temp.path().join("styles.css"), "body {}").unwrap();

        let keep: HashSet<PathString> = ["suv/index.html".to_string()].into_iter().collect();
        assert_eq!(sink.prune_except(&keep).unwrap(), 1);
        assert!(temp.path().join("suv/index.html").exists());
        assert!(temp.path().join("styles.css").exists());
        assert!(!temp.path().join("suv/toyota").exists());
    }

    #[test]
    fn prune_leaves_site_shell_and_other_subtrees_alone() {
        let temp = tempdir().unwrap();
        let sink = FsPageSink::new(temp.path());
        sink.write_page("index.html", "calculator shell").unwrap();
        sink.write_page("about/index.html", "about").unwrap();
        sink.write_page("suv/toyota/harrier/index.html", "current").unwrap();
        sink.write_page("suv/toyota/rav4/index.html", "stale").unwrap();

        let keep: HashSet<PathString> = ["suv/toyota/harrier/index.html".to_string()]
            .into_iter()
            .collect();
        assert_eq!(sink.prune_except(&keep).unwrap(), 1);
        assert!(temp.path().join("index.html").exists());
        assert!(temp.path().join("about/index.html").exists());
        assert!(temp.path().join("suv/toyota/harrier/index.html").exists());
        assert!(!temp.path().join("suv/toyota/rav4").exists());
    }

    #[test]
    fn missing_rate_config_is_a_configuration_error() {
        let temp = tempdir().unwrap();
        let err = load_rate_config(&temp.path().join("rates.json")).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[test]
    fn malformed_json_reports_path() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("cascade.json");
        fs::write(&path, "{not json").unwrap();
        let err = load_cascade(&path).unwrap_err();
        match err {
            PipelineError::Json { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn records_and_cascade_round_trip_through_files() {
        let temp = tempdir().unwrap();
        let records_path = temp.path().join("vehicles.json");
        fs::write(
            &records_path,
            r#"[{"make":"TOYOTA","model":"HARRIER","body_type":"SUV","crsp_kes":5200000},
                {"make":"MAZDA","model":"CX-5","engine_cc":"2.5L","crsp_kes":4100000.4}]"#,
        )
        .unwrap();
        let records = load_records(&records_path).unwrap();
        assert_eq!(records.len(), 2);

        let mut builder = crate::cascade::CascadeBuilder::new();
        builder.extend_vehicles(&records);
        let (cascade, summary) = builder.finish();
        assert_eq!(summary.skipped_unmapped, 1);

        let cascade_path = temp.path().join("out/crsp_cascade.json");
        write_cascade(&cascade_path, &cascade).unwrap();
        assert_eq!(load_cascade(&cascade_path).unwrap(), cascade);
    }
}
