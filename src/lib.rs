#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Category → make → model cascade construction and the cascade artifact.
pub mod cascade;
/// Canonical vehicle categories and body-type normalization.
pub mod category;
/// `dutycheck` command-line runner.
pub mod cli;
/// Rate, depreciation, and page-generation configuration.
pub mod config;
/// Centralized constants for duty rates, cascade building, and pages.
pub mod constants;
/// Raw extracted records and normalized cascade entries.
pub mod data;
/// Import duty calculation.
pub mod duty;
/// Page planning and parallel generation.
pub mod pages;
/// Page metadata and the built-in HTML renderer.
pub mod render;
/// URL slug generation and per-parent collision resolution.
pub mod slug;
/// Input loading and page sinks (filesystem and in-memory).
pub mod transport;
/// Shared type aliases.
pub mod types;
/// Text normalization and formatting helpers.
pub mod utils;

mod errors;

pub use cascade::{BuildSummary, Cascade, CascadeArtifact, CascadeBuilder, RecordDisposition};
pub use category::{CanonicalCategory, normalize_body_type};
pub use config::{DepreciationBand, DepreciationSchedule, GeneratorConfig, RateConfig};
pub use data::{CascadeEntry, EngineSize, RawEngine, RawVehicleRecord};
pub use duty::{DutyBreakdown, DutyCalculator, DutyOutcome, DutyRow, Ineligibility};
pub use errors::PipelineError;
pub use pages::{GenerationReport, PageCounts, PageEnumerator, PageFailure, PagePlan};
pub use render::{HtmlRenderer, Page, PageIdentity, PageKind, PageRenderer, SiteContext};
pub use slug::{SlugAllocator, slugify};
pub use transport::PageSink;
pub use transport::fs::FsPageSink;
pub use transport::memory::MemoryPageSink;
pub use types::{Amount, BodyTypeLabel, MakeName, ModelName, PathString, Slug, Valuation, Year};
