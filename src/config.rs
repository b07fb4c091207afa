use serde::{Deserialize, Serialize};

use crate::constants::duty::{
    DEPRECIATION_BANDS, EXCISE_DUTY_RATE, IDF_MINIMUM, IDF_RATE, IMPORT_DUTY_RATE, MAX_BAND_AGE,
    RDL_RATE, TAX_STRIP_DIVISOR, VAT_RATE,
};
use crate::constants::pages::DEFAULT_SITE_URL;
use crate::errors::PipelineError;
use crate::types::Year;

/// One depreciation band: ages up to and including `max_age` use `rate`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepreciationBand {
    /// Inclusive upper age bound in whole years.
    #[serde(alias = "max_age")]
    pub max_age: u32,
    /// Fractional value reduction (`0.65` = 65%).
    pub rate: f64,
}

/// Ascending age bands; ages past the last band cannot be imported.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepreciationSchedule {
    bands: Vec<DepreciationBand>,
}

impl DepreciationSchedule {
    /// Build a schedule, rejecting empty, unordered, or out-of-range bands.
    pub fn new(bands: Vec<DepreciationBand>) -> Result<Self, PipelineError> {
        let schedule = Self { bands };
        schedule.validate()?;
        Ok(schedule)
    }

    /// Bands in ascending `max_age` order.
    pub fn bands(&self) -> &[DepreciationBand] {
        &self.bands
    }

    /// Rate of the first band with `age <= max_age`, or `None` past the cutoff.
    pub fn rate_for_age(&self, age: u32) -> Option<f64> {
        self.bands
            .iter()
            .find(|band| age <= band.max_age)
            .map(|band| band.rate)
    }

    /// Oldest age that still has a band.
    pub fn max_eligible_age(&self) -> u32 {
        self.bands.last().map(|band| band.max_age).unwrap_or(0)
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.bands.is_empty() {
            return Err(PipelineError::Configuration(
                "depreciation schedule must contain at least one band".to_string(),
            ));
        }
        for pair in self.bands.windows(2) {
            if pair[1].max_age <= pair[0].max_age {
                return Err(PipelineError::Configuration(format!(
                    "depreciation bands must have strictly ascending maxAge ({} then {})",
                    pair[0].max_age, pair[1].max_age
                )));
            }
        }
        for band in &self.bands {
            if band.max_age > MAX_BAND_AGE {
                return Err(PipelineError::Configuration(format!(
                    "depreciation maxAge {} exceeds the supported limit of {MAX_BAND_AGE} years",
                    band.max_age
                )));
            }
            if !band.rate.is_finite() || !(0.0..1.0).contains(&band.rate) {
                return Err(PipelineError::Configuration(format!(
                    "depreciation rate for maxAge {} must be in [0, 1), got {}",
                    band.max_age, band.rate
                )));
            }
        }
        Ok(())
    }
}

impl Default for DepreciationSchedule {
    fn default() -> Self {
        Self {
            bands: DEPRECIATION_BANDS
                .iter()
                .map(|&(max_age, rate)| DepreciationBand { max_age, rate })
                .collect(),
        }
    }
}

/// Duty rates and valuation constants, as supplied by the rate configuration file.
///
/// Accepts both the camelCase keys and the snake_case keys written by the
/// sheet extraction step. Unknown keys (such as a free-text `note`) are ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateConfig {
    /// Share of the customs value charged as import duty.
    #[serde(alias = "import_duty_rate")]
    pub import_duty_rate: f64,
    /// Share of (customs value + import duty) charged as excise.
    #[serde(alias = "excise_duty_rate")]
    pub excise_duty_rate: f64,
    /// Share of (customs value + import duty + excise) charged as VAT.
    #[serde(alias = "vat_rate")]
    pub vat_rate: f64,
    /// Share of the customs value charged as import declaration fee.
    #[serde(alias = "idf_rate")]
    pub idf_rate: f64,
    /// Share of the customs value charged as railway development levy.
    #[serde(alias = "rdl_rate")]
    pub rdl_rate: f64,
    /// Minimum import declaration fee.
    #[serde(rename = "idfMinimumKes", alias = "idf_minimum_kes")]
    pub idf_minimum: f64,
    /// Divisor that strips embedded taxes from the base valuation.
    #[serde(alias = "crsp_tax_strip_divisor", alias = "tax_strip_divisor")]
    pub tax_strip_divisor: f64,
    /// Optional schedule override; the Finance Act 2025 bands otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depreciation: Option<Vec<DepreciationBand>>,
    /// Optional reference-year override.
    #[serde(
        default,
        alias = "reference_year",
        skip_serializing_if = "Option::is_none"
    )]
    pub reference_year: Option<Year>,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            import_duty_rate: IMPORT_DUTY_RATE,
            excise_duty_rate: EXCISE_DUTY_RATE,
            vat_rate: VAT_RATE,
            idf_rate: IDF_RATE,
            rdl_rate: RDL_RATE,
            idf_minimum: IDF_MINIMUM,
            tax_strip_divisor: TAX_STRIP_DIVISOR,
            depreciation: None,
            reference_year: None,
        }
    }
}

impl RateConfig {
    /// Check every rate before any computation depends on it.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let rates = [
            ("importDutyRate", self.import_duty_rate),
            ("exciseDutyRate", self.excise_duty_rate),
            ("vatRate", self.vat_rate),
            ("idfRate", self.idf_rate),
            ("rdlRate", self.rdl_rate),
        ];
        for (name, rate) in rates {
            if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
                return Err(PipelineError::Configuration(format!(
                    "{name} must be a fraction in [0, 1], got {rate}"
                )));
            }
        }
        if !self.idf_minimum.is_finite() || self.idf_minimum < 0.0 {
            return Err(PipelineError::Configuration(format!(
                "idfMinimumKes must be non-negative, got {}",
                self.idf_minimum
            )));
        }
        if !self.tax_strip_divisor.is_finite() || self.tax_strip_divisor <= 0.0 {
            return Err(PipelineError::Configuration(format!(
                "taxStripDivisor must be positive, got {}",
                self.tax_strip_divisor
            )));
        }
        self.schedule().map(|_| ())
    }

    /// The configured depreciation schedule, or the default bands.
    pub fn schedule(&self) -> Result<DepreciationSchedule, PipelineError> {
        match &self.depreciation {
            Some(bands) => DepreciationSchedule::new(bands.clone()),
            None => Ok(DepreciationSchedule::default()),
        }
    }
}

/// Page generation settings.
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    /// Canonical origin prefixed to page paths in metadata.
    pub site_url: String,
    /// Also emit one page per eligible year under each model page.
    pub year_pages: bool,
    /// Remove category-subtree pages from earlier runs that this run did not produce.
    pub prune_stale: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            site_url: DEFAULT_SITE_URL.to_string(),
            year_pages: false,
            prune_stale: false,
        }
    }
}
