//! Page enumeration and parallel rendering.
//!
//! [`PageEnumerator::plan`] resolves every page identity and duty table up
//! front, in cascade order, so rendering can fan out without any shared
//! mutable state. Slugs are claimed in that same order, which keeps the URL
//! space stable across runs over the same cascade.

use std::collections::HashSet;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::cascade::Cascade;
use crate::config::GeneratorConfig;
use crate::constants::pages::{LOG_PREFIX, MAKE_FALLBACK_PREFIX, MODEL_FALLBACK_PREFIX};
use crate::duty::DutyCalculator;
use crate::errors::PipelineError;
use crate::render::{
    CategoryPage, MakeLink, MakePage, ModelLink, ModelPage, Page, PageIdentity, PageKind,
    PageRenderer, SiteContext, YearPage,
};
use crate::slug::SlugAllocator;
use crate::transport::PageSink;
use crate::types::PathString;

/// Page counts broken down by kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageCounts {
    pub category_pages: usize,
    pub make_pages: usize,
    pub model_pages: usize,
    pub year_pages: usize,
}

impl PageCounts {
    fn record(&mut self, kind: PageKind) {
        match kind {
            PageKind::Category => self.category_pages += 1,
            PageKind::Make => self.make_pages += 1,
            PageKind::Model => self.model_pages += 1,
            PageKind::Year => self.year_pages += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.category_pages + self.make_pages + self.model_pages + self.year_pages
    }
}

/// Every page of one run, in category, make, model order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PagePlan {
    pages: Vec<Page>,
}

impl PagePlan {
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn counts(&self) -> PageCounts {
        let mut counts = PageCounts::default();
        for page in &self.pages {
            counts.record(page.kind());
        }
        counts
    }

    /// Output paths of every planned page, in plan order.
    pub fn output_paths(&self) -> Vec<PathString> {
        self.pages.iter().map(Page::output_path).collect()
    }

    /// Fails with [`PipelineError::PathCollision`] if two pages share an output path.
    pub fn ensure_unique_paths(&self) -> Result<HashSet<PathString>, PipelineError> {
        let mut seen = HashSet::with_capacity(self.pages.len());
        for path in self.output_paths() {
            if !seen.insert(path.clone()) {
                return Err(PipelineError::PathCollision(path));
            }
        }
        Ok(seen)
    }
}

/// A page that could not be rendered or written.
#[derive(Debug)]
pub struct PageFailure {
    pub path: PathString,
    pub error: PipelineError,
}

/// Outcome of [`PageEnumerator::generate`].
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub planned: PageCounts,
    pub written: PageCounts,
    pub failures: Vec<PageFailure>,
    /// Stale pages removed from an earlier run.
    pub pruned: usize,
}

impl GenerationReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Walks a cascade and produces the page set for one run.
pub struct PageEnumerator<'a> {
    cascade: &'a Cascade,
    calculator: &'a DutyCalculator,
    config: GeneratorConfig,
}

impl<'a> PageEnumerator<'a> {
    /// Enumerator with default settings (no year pages, no pruning).
    ///
    /// Duty tables use the calculator's reference year.
    pub fn new(cascade: &'a Cascade, calculator: &'a DutyCalculator) -> Self {
        Self {
            cascade,
            calculator,
            config: GeneratorConfig::default(),
        }
    }

    /// Replace the generator settings.
    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Run-wide values passed to every render call.
    pub fn site_context(&self) -> SiteContext {
        SiteContext {
            site_url: self.config.site_url.clone(),
            reference_year: self.calculator.reference_year(),
            oldest_eligible_year: self.calculator.oldest_eligible_year(),
            max_eligible_age: self.calculator.max_eligible_age(),
        }
    }

    /// Resolve every page identity and duty table.
    pub fn plan(&self) -> Result<PagePlan, PipelineError> {
        let mut pages = Vec::with_capacity(self.cascade.leaf_count() + self.cascade.make_count());
        for (category, makes) in self.cascade.iter() {
            let category_slug = category.slug();
            let mut make_slugs = SlugAllocator::new(MAKE_FALLBACK_PREFIX);
            let mut make_links = Vec::with_capacity(makes.len());
            let mut category_pages = Vec::new();

            for (make_ordinal, (make, entries)) in makes.iter().enumerate() {
                let make_slug = make_slugs.claim(make, make_ordinal);
                let mut model_slugs = SlugAllocator::new(MODEL_FALLBACK_PREFIX);
                let mut model_links = Vec::with_capacity(entries.len());
                let mut leaf_pages = Vec::with_capacity(entries.len());

                for (ordinal, entry) in entries.iter().enumerate() {
                    let model_slug = model_slugs.claim(&entry.model, ordinal);
                    let identity = PageIdentity {
                        category,
                        make: make.clone(),
                        model: entry.model.clone(),
                        category_slug: category_slug.clone(),
                        make_slug: make_slug.clone(),
                        model_slug: model_slug.clone(),
                    };
                    let rows = self.calculator.duty_table(entry.crsp)?;
                    let lowest_total = self.calculator.lowest_total(entry.crsp)?;
                    if !rows.iter().any(|row| row.outcome.is_eligible()) {
                        debug!(
                            make = %make,
                            model = %entry.model,
                            "{LOG_PREFIX} no eligible years; emitting empty table"
                        );
                    }

                    let year_pages: Vec<Page> = if self.config.year_pages {
                        rows.iter()
                            .filter_map(|row| row.outcome.breakdown())
                            .map(|breakdown| {
                                Page::Year(YearPage {
                                    identity: identity.clone(),
                                    entry: entry.clone(),
                                    breakdown: *breakdown,
                                })
                            })
                            .collect()
                    } else {
                        Vec::new()
                    };
                    model_links.push(ModelLink {
                        entry: entry.clone(),
                        slug: model_slug,
                        lowest_total,
                    });
                    leaf_pages.push(Page::Model(ModelPage {
                        identity,
                        entry: entry.clone(),
                        rows,
                        lowest_total,
                    }));
                    leaf_pages.extend(year_pages);
                }

                make_links.push(MakeLink {
                    make: make.clone(),
                    slug: make_slug.clone(),
                    model_count: entries.len(),
                });
                category_pages.push(Page::Make(MakePage {
                    category,
                    category_slug: category_slug.clone(),
                    make: make.clone(),
                    make_slug,
                    models: model_links,
                }));
                category_pages.extend(leaf_pages);
            }

            pages.push(Page::Category(CategoryPage {
                category,
                slug: category_slug,
                makes: make_links,
            }));
            pages.extend(category_pages);
        }
        Ok(PagePlan { pages })
    }

    /// Plan, render, and write every page.
    ///
    /// Rendering runs on the rayon pool. A page that fails is logged and
    /// reported; its siblings are still written. Planning errors and path
    /// collisions abort before anything is written.
    pub fn generate<R, S>(&self, renderer: &R, sink: &S) -> Result<GenerationReport, PipelineError>
    where
        R: PageRenderer + ?Sized,
        S: PageSink + ?Sized,
    {
        let plan = self.plan()?;
        let keep = plan.ensure_unique_paths()?;
        let site = self.site_context();

        let outcomes: Vec<(PageKind, PathString, Result<(), PipelineError>)> = plan
            .pages()
            .par_iter()
            .map(|page| {
                let path = page.output_path();
                let result = renderer
                    .render(page, &site)
                    .and_then(|html| sink.write_page(&path, &html));
                if let Err(err) = &result {
                    warn!(path = %path, error = %err, "{LOG_PREFIX} page failed");
                }
                (page.kind(), path, result)
            })
            .collect();

        let mut report = GenerationReport {
            planned: plan.counts(),
            ..GenerationReport::default()
        };
        for (kind, path, result) in outcomes {
            match result {
                Ok(()) => report.written.record(kind),
                Err(error) => report.failures.push(PageFailure { path, error }),
            }
        }

        if self.config.prune_stale {
            report.pruned = sink.prune_except(&keep)?;
        }

        info!(
            categories = report.written.category_pages,
            makes = report.written.make_pages,
            models = report.written.model_pages,
            years = report.written.year_pages,
            failures = report.failures.len(),
            pruned = report.pruned,
            "{LOG_PREFIX} pages generated"
        );
        Ok(report)
    }
}
