//! Import duty calculation against a CRSP base valuation.
//!
//! The calculation runs in full `f64` precision and rounds each reported
//! figure exactly once at the end, so the reported total is the rounded exact
//! sum rather than the sum of rounded components.

use serde::Serialize;

use crate::config::{DepreciationSchedule, RateConfig};
use crate::errors::PipelineError;
use crate::types::{Amount, Valuation, Year};

/// Full duty breakdown for one vehicle at one manufacture year.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DutyBreakdown {
    pub year: Year,
    pub age: u32,
    /// Depreciation fraction applied (`0.65` = 65%).
    pub depreciation_rate: f64,
    /// Depreciation as a whole percentage for display.
    pub depreciation_pct: u32,
    pub customs_value: Amount,
    pub import_duty: Amount,
    pub excise_duty: Amount,
    pub vat: Amount,
    pub idf: Amount,
    pub rdl: Amount,
    pub total: Amount,
}

/// Why a vehicle cannot be imported at a given manufacture year.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Ineligibility {
    /// Older than the last depreciation band allows.
    TooOld { age: u32, max_age: u32 },
    /// Manufacture year is after the reference year.
    NotYetManufactured { year: Year, reference_year: Year },
}

/// Result of a duty computation: a breakdown, or a normal ineligible outcome.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum DutyOutcome {
    Eligible(DutyBreakdown),
    Ineligible(Ineligibility),
}

impl DutyOutcome {
    /// The breakdown when eligible.
    pub fn breakdown(&self) -> Option<&DutyBreakdown> {
        match self {
            DutyOutcome::Eligible(breakdown) => Some(breakdown),
            DutyOutcome::Ineligible(_) => None,
        }
    }

    /// True for [`DutyOutcome::Eligible`].
    pub fn is_eligible(&self) -> bool {
        matches!(self, DutyOutcome::Eligible(_))
    }
}

/// One row of a per-vehicle duty table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DutyRow {
    pub year: Year,
    pub outcome: DutyOutcome,
}

/// Pure duty calculator bound to one rate configuration and reference year.
#[derive(Clone, Debug)]
pub struct DutyCalculator {
    rates: RateConfig,
    schedule: DepreciationSchedule,
    reference_year: Year,
    oldest_eligible_year: Year,
}

impl DutyCalculator {
    /// Validate `rates` and bind the calculator to `reference_year`.
    pub fn new(rates: RateConfig, reference_year: Year) -> Result<Self, PipelineError> {
        rates.validate()?;
        let schedule = rates.schedule()?;
        let oldest_eligible_year = Year::try_from(schedule.max_eligible_age())
            .ok()
            .and_then(|max_age| reference_year.checked_sub(max_age))
            .ok_or_else(|| {
                PipelineError::Configuration(format!(
                    "reference year {reference_year} minus maxAge {} is out of range",
                    schedule.max_eligible_age()
                ))
            })?;
        Ok(Self {
            rates,
            schedule,
            reference_year,
            oldest_eligible_year,
        })
    }

    pub fn rates(&self) -> &RateConfig {
        &self.rates
    }

    pub fn schedule(&self) -> &DepreciationSchedule {
        &self.schedule
    }

    pub fn reference_year(&self) -> Year {
        self.reference_year
    }

    /// Oldest age the schedule still accepts.
    pub fn max_eligible_age(&self) -> u32 {
        self.schedule.max_eligible_age()
    }

    /// Oldest manufacture year that is still importable.
    pub fn oldest_eligible_year(&self) -> Year {
        self.oldest_eligible_year
    }

    /// Compute the duty for a vehicle of `base_value` built in `manufacture_year`.
    pub fn compute(
        &self,
        base_value: Valuation,
        manufacture_year: Year,
    ) -> Result<DutyOutcome, PipelineError> {
        if base_value == 0 {
            return Err(PipelineError::InvalidValuation(base_value));
        }
        if manufacture_year > self.reference_year {
            return Ok(DutyOutcome::Ineligible(Ineligibility::NotYetManufactured {
                year: manufacture_year,
                reference_year: self.reference_year,
            }));
        }
        let age = u32::try_from(i64::from(self.reference_year) - i64::from(manufacture_year))
            .unwrap_or(u32::MAX);
        let Some(depreciation_rate) = self.schedule.rate_for_age(age) else {
            return Ok(DutyOutcome::Ineligible(Ineligibility::TooOld {
                age,
                max_age: self.max_eligible_age(),
            }));
        };

        let rates = &self.rates;
        let pre_depreciation = base_value as f64 / rates.tax_strip_divisor;
        let customs_value = pre_depreciation * (1.0 - depreciation_rate);
        let import_duty = customs_value * rates.import_duty_rate;
        let excise_duty = (customs_value + import_duty) * rates.excise_duty_rate;
        let vat = (customs_value + import_duty + excise_duty) * rates.vat_rate;
        let idf = (customs_value * rates.idf_rate).max(rates.idf_minimum);
        let rdl = customs_value * rates.rdl_rate;
        let total = import_duty + excise_duty + vat + idf + rdl;

        Ok(DutyOutcome::Eligible(DutyBreakdown {
            year: manufacture_year,
            age,
            depreciation_rate,
            depreciation_pct: (depreciation_rate * 100.0).round() as u32,
            customs_value: round_amount(customs_value),
            import_duty: round_amount(import_duty),
            excise_duty: round_amount(excise_duty),
            vat: round_amount(vat),
            idf: round_amount(idf),
            rdl: round_amount(rdl),
            total: round_amount(total),
        }))
    }

    /// Manufacture years covered by duty tables, newest first.
    pub fn target_years(&self) -> impl Iterator<Item = Year> + use<> {
        let newest = self.reference_year;
        let oldest = self.oldest_eligible_year();
        (oldest..=newest).rev()
    }

    /// One row per target year, newest first.
    pub fn duty_table(&self, base_value: Valuation) -> Result<Vec<DutyRow>, PipelineError> {
        self.target_years()
            .map(|year| {
                Ok(DutyRow {
                    year,
                    outcome: self.compute(base_value, year)?,
                })
            })
            .collect()
    }

    /// Duty at the oldest eligible year, i.e. the smallest total a buyer can face.
    ///
    /// Listings label this "duty from"; the label is a presentation choice.
    pub fn lowest_total(&self, base_value: Valuation) -> Result<Option<Amount>, PipelineError> {
        let outcome = self.compute(base_value, self.oldest_eligible_year())?;
        Ok(outcome.breakdown().map(|breakdown| breakdown.total))
    }
}

fn round_amount(value: f64) -> Amount {
    if value <= 0.0 { 0 } else { value.round() as Amount }
}
