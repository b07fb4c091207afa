//! Page metadata handed to renderers, plus a minimal unstyled HTML renderer.
//!
//! Styling and site chrome live outside this crate; anything implementing
//! [`PageRenderer`] can replace [`HtmlRenderer`].

use std::fmt::Write as _;

use crate::category::CanonicalCategory;
use crate::constants::pages::INDEX_FILENAME;
use crate::data::CascadeEntry;
use crate::duty::{DutyBreakdown, DutyOutcome, DutyRow, Ineligibility};
use crate::errors::PipelineError;
use crate::types::{Amount, MakeName, ModelName, PathString, Slug, Year};
use crate::utils::format_kes;

/// A leaf's display names together with its resolved, run-unique path segments.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PageIdentity {
    pub category: CanonicalCategory,
    pub make: MakeName,
    pub model: ModelName,
    pub category_slug: Slug,
    pub make_slug: Slug,
    pub model_slug: Slug,
}

impl PageIdentity {
    /// `/<category>/<make>/<model>/`
    pub fn url_path(&self) -> String {
        format!(
            "/{}/{}/{}/",
            self.category_slug, self.make_slug, self.model_slug
        )
    }
}

/// Link from a category page to one of its makes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MakeLink {
    pub make: MakeName,
    pub slug: Slug,
    pub model_count: usize,
}

/// Link from a make page to one of its models.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelLink {
    pub entry: CascadeEntry,
    pub slug: Slug,
    /// Duty at the oldest eligible year, when that year is eligible.
    pub lowest_total: Option<Amount>,
}

/// `/<category>/` listing.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryPage {
    pub category: CanonicalCategory,
    pub slug: Slug,
    pub makes: Vec<MakeLink>,
}

/// `/<category>/<make>/` listing.
#[derive(Clone, Debug, PartialEq)]
pub struct MakePage {
    pub category: CanonicalCategory,
    pub category_slug: Slug,
    pub make: MakeName,
    pub make_slug: Slug,
    pub models: Vec<ModelLink>,
}

/// `/<category>/<make>/<model>/` with the descending-year duty table.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelPage {
    pub identity: PageIdentity,
    pub entry: CascadeEntry,
    /// Newest year first; ineligible rows are kept so renderers can say so.
    pub rows: Vec<DutyRow>,
    pub lowest_total: Option<Amount>,
}

/// `/<category>/<make>/<model>/<year>/` for one eligible year.
#[derive(Clone, Debug, PartialEq)]
pub struct YearPage {
    pub identity: PageIdentity,
    pub entry: CascadeEntry,
    pub breakdown: DutyBreakdown,
}

/// Page kinds, used for summary counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PageKind {
    Category,
    Make,
    Model,
    Year,
}

/// Everything a renderer needs to produce one output file.
#[derive(Clone, Debug, PartialEq)]
pub enum Page {
    Category(CategoryPage),
    Make(MakePage),
    Model(ModelPage),
    Year(YearPage),
}

impl Page {
    pub fn kind(&self) -> PageKind {
        match self {
            Page::Category(_) => PageKind::Category,
            Page::Make(_) => PageKind::Make,
            Page::Model(_) => PageKind::Model,
            Page::Year(_) => PageKind::Year,
        }
    }

    /// Site-relative URL path with leading and trailing slash.
    pub fn url_path(&self) -> String {
        match self {
            Page::Category(page) => format!("/{}/", page.slug),
            Page::Make(page) => format!("/{}/{}/", page.category_slug, page.make_slug),
            Page::Model(page) => page.identity.url_path(),
            Page::Year(page) => format!("{}{}/", page.identity.url_path(), page.breakdown.year),
        }
    }

    /// File path relative to the output root (`suv/toyota/harrier/index.html`).
    pub fn output_path(&self) -> PathString {
        let url = self.url_path();
        format!("{}{}", url.trim_start_matches('/'), INDEX_FILENAME)
    }
}

/// Run-wide values renderers may show.
#[derive(Clone, Debug, PartialEq)]
pub struct SiteContext {
    pub site_url: String,
    pub reference_year: Year,
    pub oldest_eligible_year: Year,
    pub max_eligible_age: u32,
}

/// Turns page metadata into file contents. Called from worker threads.
pub trait PageRenderer: Send + Sync {
    fn render(&self, page: &Page, site: &SiteContext) -> Result<String, PipelineError>;
}

/// Plain HTML: identity, valuation, and the duty table, no styling.
#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlRenderer;

impl PageRenderer for HtmlRenderer {
    fn render(&self, page: &Page, site: &SiteContext) -> Result<String, PipelineError> {
        let mut body = String::new();
        let (title, description, crumbs) = match page {
            Page::Category(category) => category_body(&mut body, category),
            Page::Make(make) => make_body(&mut body, make),
            Page::Model(model) => model_body(&mut body, model, site),
            Page::Year(year) => year_body(&mut body, year),
        }
        .map_err(|err| PipelineError::Render {
            path: page.output_path(),
            reason: err.to_string(),
        })?;
        Ok(layout(&title, &description, &page.url_path(), &crumbs, &body, site))
    }
}

type Crumbs = Vec<(String, Option<String>)>;
type Rendered = Result<(String, String, Crumbs), std::fmt::Error>;

fn category_body(out: &mut String, page: &CategoryPage) -> Rendered {
    let total: usize = page.makes.iter().map(|make| make.model_count).sum();
    let name = page.category.display_name();
    writeln!(out, "<h1>{}</h1>", escape_html(name))?;
    writeln!(out, "<p>{} makes, {} models</p>", page.makes.len(), total)?;
    writeln!(out, "<ul>")?;
    for make in &page.makes {
        writeln!(
            out,
            "<li><a href=\"/{}/{}/\">{}</a> ({} model{})</li>",
            page.slug,
            make.slug,
            escape_html(&make.make),
            make.model_count,
            plural(make.model_count)
        )?;
    }
    writeln!(out, "</ul>")?;
    Ok((
        format!("{name} Import Duty Kenya | Duty Check"),
        format!(
            "Browse all {name} vehicles in the KRA CRSP list. {} makes, {total} models.",
            page.makes.len()
        ),
        vec![("Home".into(), Some("/".into())), (name.into(), None)],
    ))
}

fn make_body(out: &mut String, page: &MakePage) -> Rendered {
    let category = page.category.display_name();
    writeln!(out, "<h1>{}</h1>", escape_html(&page.make))?;
    writeln!(
        out,
        "<p>{} {} model{}</p>",
        page.models.len(),
        escape_html(category),
        plural(page.models.len())
    )?;
    writeln!(out, "<ul>")?;
    for model in &page.models {
        let from = model
            .lowest_total
            .map(format_kes)
            .unwrap_or_else(|| "N/A".to_string());
        writeln!(
            out,
            "<li><a href=\"/{}/{}/{}/\">{}</a> {} CRSP {}, duty from {}</li>",
            page.category_slug,
            page.make_slug,
            model.slug,
            escape_html(&model.entry.model),
            escape_html(&model.entry.spec_line()),
            format_kes(model.entry.crsp),
            from
        )?;
    }
    writeln!(out, "</ul>")?;
    Ok((
        format!("{} {category} Import Duty Kenya | Duty Check", page.make),
        format!(
            "All {} {category} models in the KRA CRSP list. {} variants.",
            page.make,
            page.models.len()
        ),
        vec![
            ("Home".into(), Some("/".into())),
            (category.into(), Some(format!("/{}/", page.category_slug))),
            (page.make.clone(), None),
        ],
    ))
}

fn model_body(out: &mut String, page: &ModelPage, site: &SiteContext) -> Rendered {
    let identity = &page.identity;
    let name = format!("{} {}", identity.make, identity.model);
    writeln!(out, "<h1>{}</h1>", escape_html(&name))?;
    let spec = page.entry.spec_line();
    if !spec.is_empty() {
        writeln!(out, "<p>{}</p>", escape_html(&spec))?;
    }
    writeln!(out, "<p>CRSP value: {}</p>", format_kes(page.entry.crsp))?;
    writeln!(
        out,
        "<p>Vehicles built before {} cannot be imported.</p>",
        site.oldest_eligible_year
    )?;
    writeln!(out, "<table>")?;
    writeln!(
        out,
        "<tr><th>Year</th><th>Age</th><th>Depreciation</th><th>Customs Value</th><th>Import Duty</th><th>Excise</th><th>VAT</th><th>IDF</th><th>RDL</th><th>Total Duty</th></tr>"
    )?;
    for row in &page.rows {
        match &row.outcome {
            DutyOutcome::Eligible(breakdown) => writeln!(
                out,
                "<tr><td>{}</td><td>{}</td><td>{}%</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                row.year,
                age_label(breakdown.age),
                breakdown.depreciation_pct,
                format_kes(breakdown.customs_value),
                format_kes(breakdown.import_duty),
                format_kes(breakdown.excise_duty),
                format_kes(breakdown.vat),
                format_kes(breakdown.idf),
                format_kes(breakdown.rdl),
                format_kes(breakdown.total)
            )?,
            DutyOutcome::Ineligible(reason) => writeln!(
                out,
                "<tr><td>{}</td><td colspan=\"9\">{}</td></tr>",
                row.year,
                ineligible_label(reason)
            )?,
        }
    }
    writeln!(out, "</table>")?;
    let from = page
        .lowest_total
        .map(format_kes)
        .unwrap_or_else(|| "N/A".to_string());
    Ok((
        format!("{name} Import Duty Kenya | Duty Check"),
        format!(
            "KRA import duty for {name}. CRSP: {}. Duty from {from} depending on year.",
            format_kes(page.entry.crsp)
        ),
        vec![
            ("Home".into(), Some("/".into())),
            (
                identity.category.display_name().into(),
                Some(format!("/{}/", identity.category_slug)),
            ),
            (
                identity.make.clone(),
                Some(format!("/{}/{}/", identity.category_slug, identity.make_slug)),
            ),
            (identity.model.clone(), None),
        ],
    ))
}

fn year_body(out: &mut String, page: &YearPage) -> Rendered {
    let identity = &page.identity;
    let breakdown = &page.breakdown;
    let name = format!("{} {} {}", breakdown.year, identity.make, identity.model);
    writeln!(out, "<h1>{}</h1>", escape_html(&name))?;
    writeln!(out, "<p>Age: {}</p>", age_label(breakdown.age))?;
    writeln!(out, "<dl>")?;
    let lines = [
        ("CRSP", page.entry.crsp),
        ("Customs Value", breakdown.customs_value),
        ("Import Duty", breakdown.import_duty),
        ("Excise Duty", breakdown.excise_duty),
        ("VAT", breakdown.vat),
        ("IDF", breakdown.idf),
        ("RDL", breakdown.rdl),
        ("Total Duty", breakdown.total),
    ];
    for (label, amount) in lines {
        writeln!(out, "<dt>{label}</dt><dd>{}</dd>", format_kes(amount))?;
    }
    writeln!(
        out,
        "<dt>Depreciation</dt><dd>{}%</dd>",
        breakdown.depreciation_pct
    )?;
    writeln!(out, "</dl>")?;
    Ok((
        format!(
            "{name} Import Duty Kenya | {} | Duty Check",
            format_kes(breakdown.total)
        ),
        format!(
            "KRA import duty for a {name}: {} total. Customs Value {}, {}% depreciation.",
            format_kes(breakdown.total),
            format_kes(breakdown.customs_value),
            breakdown.depreciation_pct
        ),
        vec![
            ("Home".into(), Some("/".into())),
            (
                identity.category.display_name().into(),
                Some(format!("/{}/", identity.category_slug)),
            ),
            (
                identity.make.clone(),
                Some(format!("/{}/{}/", identity.category_slug, identity.make_slug)),
            ),
            (identity.model.clone(), Some(identity.url_path())),
            (breakdown.year.to_string(), None),
        ],
    ))
}

fn layout(
    title: &str,
    description: &str,
    url_path: &str,
    crumbs: &Crumbs,
    body: &str,
    site: &SiteContext,
) -> String {
    let canonical = format!("{}{}", site.site_url.trim_end_matches('/'), url_path);
    let nav = crumbs
        .iter()
        .map(|(label, href)| match href {
            Some(href) => format!("<a href=\"{href}\">{}</a>", escape_html(label)),
            None => format!("<span>{}</span>", escape_html(label)),
        })
        .collect::<Vec<_>>()
        .join(" &rsaquo; ");
    format!(
        "<!DOCTYPE html>\n<html lang=\"en-KE\">\n<head>\n<meta charset=\"UTF-8\" />\n<title>{title}</title>\n<meta name=\"description\" content=\"{description}\" />\n<link rel=\"canonical\" href=\"{canonical}\" />\n</head>\n<body>\n<nav>{nav}</nav>\n<main>\n{body}</main>\n</body>\n</html>\n",
        title = escape_html(title),
        description = escape_html(description),
        canonical = escape_html(&canonical),
    )
}

fn age_label(age: u32) -> String {
    match age {
        0 => "New".to_string(),
        1 => "1 yr".to_string(),
        n => format!("{n} yrs"),
    }
}

fn ineligible_label(reason: &Ineligibility) -> String {
    match reason {
        Ineligibility::TooOld { age, max_age } => {
            format!("Not importable at this age ({age} years; limit {max_age})")
        }
        Ineligibility::NotYetManufactured { .. } => "Not importable: future model year".to_string(),
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

/// Escape text for HTML element and attribute content.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
