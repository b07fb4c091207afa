//! Category → make → model cascade construction and its JSON artifact.

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::category::{CanonicalCategory, normalize_body_type};
use crate::constants::cascade::LOG_PREFIX;
use crate::data::{CascadeEntry, RawVehicleRecord};
use crate::errors::PipelineError;
use crate::types::{BodyTypeLabel, MakeName};
use crate::utils::{clean_field, title_case, word_title_case};

/// Makes of one category, each with its sorted entries.
pub type MakeMap = BTreeMap<MakeName, Vec<CascadeEntry>>;

/// What happened to a record pushed into the builder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordDisposition {
    Accepted(CanonicalCategory),
    /// Body type empty or not in the curated table.
    SkippedUnmapped,
    /// Make, model, or a positive valuation missing.
    SkippedIncomplete,
}

/// Counters gathered while building a cascade.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub vehicles_seen: usize,
    pub motorcycles_seen: usize,
    pub skipped_unmapped: usize,
    pub skipped_incomplete: usize,
    /// Entries identical in every field to another entry of the same make.
    pub duplicates_collapsed: usize,
    /// Distinct unmapped body-type labels with their occurrence counts.
    pub unmapped_labels: BTreeMap<BodyTypeLabel, usize>,
}

impl BuildSummary {
    /// All records excluded from the cascade.
    pub fn skipped(&self) -> usize {
        self.skipped_unmapped + self.skipped_incomplete
    }
}

/// Accumulates normalized records and produces an immutable [`Cascade`].
#[derive(Debug, Default)]
pub struct CascadeBuilder {
    buckets: BTreeMap<CanonicalCategory, MakeMap>,
    summary: BuildSummary,
}

impl CascadeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a motor-vehicle record, categorized by its body type.
    pub fn push_vehicle(&mut self, record: &RawVehicleRecord) -> RecordDisposition {
        self.summary.vehicles_seen += 1;
        let label = record.body_type.as_deref().unwrap_or("");
        let Some(category) = normalize_body_type(label) else {
            self.summary.skipped_unmapped += 1;
            *self
                .summary
                .unmapped_labels
                .entry(label.trim().to_string())
                .or_insert(0) += 1;
            return RecordDisposition::SkippedUnmapped;
        };
        self.insert(category, record)
    }

    /// Add a record from the motorcycle sheet; always [`CanonicalCategory::Motorcycle`].
    pub fn push_motorcycle(&mut self, record: &RawVehicleRecord) -> RecordDisposition {
        self.summary.motorcycles_seen += 1;
        self.insert(CanonicalCategory::Motorcycle, record)
    }

    pub fn extend_vehicles<'a, I>(&mut self, records: I)
    where
        I: IntoIterator<Item = &'a RawVehicleRecord>,
    {
        for record in records {
            self.push_vehicle(record);
        }
    }

    pub fn extend_motorcycles<'a, I>(&mut self, records: I)
    where
        I: IntoIterator<Item = &'a RawVehicleRecord>,
    {
        for record in records {
            self.push_motorcycle(record);
        }
    }

    /// Sort, deduplicate, and snapshot the accumulated records.
    pub fn finish(self) -> (Cascade, BuildSummary) {
        let Self {
            mut buckets,
            mut summary,
        } = self;
        for makes in buckets.values_mut() {
            for entries in makes.values_mut() {
                let before = entries.len();
                entries.sort();
                entries.dedup();
                summary.duplicates_collapsed += before - entries.len();
            }
        }
        let cascade = Cascade::from_sorted(buckets);

        for (label, count) in &summary.unmapped_labels {
            debug!(label = %label, count, "{LOG_PREFIX} unmapped body type skipped");
        }
        info!(
            categories = cascade.categories().len(),
            makes = cascade.make_count(),
            models = cascade.leaf_count(),
            skipped = summary.skipped(),
            duplicates = summary.duplicates_collapsed,
            "{LOG_PREFIX} cascade built"
        );
        (cascade, summary)
    }

    fn insert(
        &mut self,
        category: CanonicalCategory,
        record: &RawVehicleRecord,
    ) -> RecordDisposition {
        let Some((make, entry)) = normalize_entry(record) else {
            self.summary.skipped_incomplete += 1;
            return RecordDisposition::SkippedIncomplete;
        };
        self.buckets
            .entry(category)
            .or_default()
            .entry(make)
            .or_default()
            .push(entry);
        RecordDisposition::Accepted(category)
    }
}

fn normalize_entry(record: &RawVehicleRecord) -> Option<(MakeName, CascadeEntry)> {
    let make = title_case(&clean_field(record.make.as_deref())?);
    let model = title_case(&clean_field(record.model.as_deref())?);
    let crsp = record.valuation()?;
    let entry = CascadeEntry {
        model,
        crsp,
        cc: record.engine_cc.as_ref().and_then(|engine| engine.normalize()),
        fuel: clean_field(record.fuel.as_deref()).map(|fuel| word_title_case(&fuel)),
        tx: clean_field(record.transmission.as_deref()),
        mn: clean_field(record.model_number.as_deref()),
    };
    Some((make, entry))
}

/// A single (category, make, entry) triple; the unit of page generation.
#[derive(Clone, Copy, Debug)]
pub struct Leaf<'a> {
    pub category: CanonicalCategory,
    pub make: &'a str,
    /// Position of the entry within its make.
    pub ordinal: usize,
    pub entry: &'a CascadeEntry,
}

/// Make and model counts for one category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CategoryStats {
    pub category: CanonicalCategory,
    pub makes: usize,
    pub models: usize,
}

/// Immutable, fully sorted category → make → entries tree.
///
/// Every category holds at least one make and every make at least one entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cascade {
    categories: Vec<CanonicalCategory>,
    data: BTreeMap<CanonicalCategory, MakeMap>,
}

impl Cascade {
    fn from_sorted(data: BTreeMap<CanonicalCategory, MakeMap>) -> Self {
        let data: BTreeMap<CanonicalCategory, MakeMap> = data
            .into_iter()
            .map(|(category, makes)| {
                let makes: MakeMap = makes
                    .into_iter()
                    .filter(|(_, entries)| !entries.is_empty())
                    .collect();
                (category, makes)
            })
            .filter(|(_, makes)| !makes.is_empty())
            .collect();
        Self {
            categories: data.keys().copied().collect(),
            data,
        }
    }

    /// Categories present, in display-priority order.
    pub fn categories(&self) -> &[CanonicalCategory] {
        &self.categories
    }

    pub fn makes(&self, category: CanonicalCategory) -> Option<&MakeMap> {
        self.data.get(&category)
    }

    /// Categories with their makes, in display order.
    pub fn iter(&self) -> impl Iterator<Item = (CanonicalCategory, &MakeMap)> + '_ {
        self.data.iter().map(|(category, makes)| (*category, makes))
    }

    /// Every leaf in category, make, model order.
    pub fn leaves(&self) -> impl Iterator<Item = Leaf<'_>> + '_ {
        self.iter().flat_map(|(category, makes)| {
            makes.iter().flat_map(move |(make, entries)| {
                entries
                    .iter()
                    .enumerate()
                    .map(move |(ordinal, entry)| Leaf {
                        category,
                        make: make.as_str(),
                        ordinal,
                        entry,
                    })
            })
        })
    }

    pub fn make_count(&self) -> usize {
        self.data.values().map(BTreeMap::len).sum()
    }

    pub fn leaf_count(&self) -> usize {
        self.data
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Per-category make and model counts for run summaries.
    pub fn stats(&self) -> Vec<CategoryStats> {
        self.iter()
            .map(|(category, makes)| CategoryStats {
                category,
                makes: makes.len(),
                models: makes.values().map(Vec::len).sum(),
            })
            .collect()
    }

    /// Serializable form with maps ordered as the cascade is.
    pub fn to_artifact(&self) -> CascadeArtifact {
        CascadeArtifact {
            categories: self
                .categories
                .iter()
                .map(|category| category.display_name().to_string())
                .collect(),
            data: self
                .iter()
                .map(|(category, makes)| {
                    let makes: IndexMap<MakeName, Vec<CascadeEntry>> = makes
                        .iter()
                        .map(|(make, entries)| (make.clone(), entries.clone()))
                        .collect();
                    (category.display_name().to_string(), makes)
                })
                .collect(),
        }
    }

    /// Compact JSON encoding of [`Cascade::to_artifact`].
    pub fn to_json(&self) -> Result<String, PipelineError> {
        serde_json::to_string(&self.to_artifact())
            .map_err(|err| PipelineError::MalformedCascade(err.to_string()))
    }

    /// Validate a loaded artifact and restore the sort invariants.
    pub fn from_artifact(artifact: CascadeArtifact) -> Result<Self, PipelineError> {
        let mut listed = Vec::with_capacity(artifact.categories.len());
        for name in &artifact.categories {
            let category = CanonicalCategory::from_display_name(name).ok_or_else(|| {
                PipelineError::MalformedCascade(format!("unknown category '{name}'"))
            })?;
            if let Some(previous) = listed.last()
                && *previous >= category
            {
                return Err(PipelineError::MalformedCascade(format!(
                    "categories must be unique and in display order ('{previous}' before '{category}')"
                )));
            }
            listed.push(category);
        }

        let listed_set: BTreeSet<CanonicalCategory> = listed.iter().copied().collect();
        let mut data = BTreeMap::new();
        for (name, makes) in artifact.data {
            let category = CanonicalCategory::from_display_name(&name).ok_or_else(|| {
                PipelineError::MalformedCascade(format!("unknown category '{name}' in data"))
            })?;
            if !listed_set.contains(&category) {
                return Err(PipelineError::MalformedCascade(format!(
                    "category '{name}' has data but is not listed in categories"
                )));
            }
            if makes.is_empty() {
                return Err(PipelineError::MalformedCascade(format!(
                    "category '{name}' has no makes"
                )));
            }
            let mut sorted_makes = MakeMap::new();
            for (make, mut entries) in makes {
                if make.trim().is_empty() {
                    return Err(PipelineError::MalformedCascade(format!(
                        "category '{name}' has a make with an empty name"
                    )));
                }
                if entries.is_empty() {
                    return Err(PipelineError::MalformedCascade(format!(
                        "make '{make}' in '{name}' has no models"
                    )));
                }
                if let Some(bad) = entries
                    .iter()
                    .find(|entry| entry.crsp == 0 || entry.model.trim().is_empty())
                {
                    return Err(PipelineError::MalformedCascade(format!(
                        "make '{make}' in '{name}' has an invalid entry '{}' (crsp {})",
                        bad.model, bad.crsp
                    )));
                }
                entries.sort();
                sorted_makes.insert(make, entries);
            }
            data.insert(category, sorted_makes);
        }

        if let Some(missing) = listed.iter().find(|category| !data.contains_key(category)) {
            return Err(PipelineError::MalformedCascade(format!(
                "category '{missing}' is listed but has no data"
            )));
        }
        Ok(Self::from_sorted(data))
    }
}

/// JSON shape of the cascade file consumed by the calculator and page generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CascadeArtifact {
    pub categories: Vec<String>,
    pub data: IndexMap<String, IndexMap<MakeName, Vec<CascadeEntry>>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{EngineSize, RawEngine};

    fn vehicle(make: &str, model: &str, body: &str, crsp: f64) -> RawVehicleRecord {
        RawVehicleRecord {
            make: Some(make.to_string()),
            model: Some(model.to_string()),
            body_type: Some(body.to_string()),
            crsp_kes: Some(crsp),
            ..RawVehicleRecord::default()
        }
    }

    fn motorcycle(make: &str, model: &str, crsp: f64) -> RawVehicleRecord {
        RawVehicleRecord {
            make: Some(make.to_string()),
            model: Some(model.to_string()),
            crsp_kes: Some(crsp),
            ..RawVehicleRecord::default()
        }
    }

    fn models_of<'a>(
        cascade: &'a Cascade,
        category: CanonicalCategory,
        make: &str,
    ) -> Vec<&'a str> {
        cascade.makes(category).unwrap()[make]
            .iter()
            .map(|entry| entry.model.as_str())
            .collect()
    }

    #[test]
    fn dispositions_report_skips() {
        let mut builder = CascadeBuilder::new();
        assert_eq!(
            builder.push_vehicle(&vehicle("TOYOTA", "HARRIER", "SUV", 5.0e6)),
            RecordDisposition::Accepted(CanonicalCategory::Suv)
        );
        assert_eq!(
            builder.push_vehicle(&vehicle("TOYOTA", "DYNA", "LORRY", 3.0e6)),
            RecordDisposition::SkippedUnmapped
        );
        assert_eq!(
            builder.push_vehicle(&vehicle("TOYOTA", "", "SUV", 3.0e6)),
            RecordDisposition::SkippedIncomplete
        );
        assert_eq!(
            builder.push_vehicle(&vehicle("TOYOTA", "RAV4", "SUV", 0.0)),
            RecordDisposition::SkippedIncomplete
        );
        let mut no_body = vehicle("TOYOTA", "RAV4", "", 3.0e6);
        no_body.body_type = None;
        assert_eq!(builder.push_vehicle(&no_body), RecordDisposition::SkippedUnmapped);

        let (cascade, summary) = builder.finish();
        assert_eq!(summary.vehicles_seen, 5);
        assert_eq!(summary.skipped_unmapped, 2);
        assert_eq!(summary.skipped_incomplete, 2);
        assert_eq!(summary.skipped(), 4);
        assert_eq!(summary.unmapped_labels.get("LORRY"), Some(&1));
        assert_eq!(summary.unmapped_labels.get(""), Some(&1));
        assert_eq!(cascade.leaf_count(), 1);
    }

    #[test]
    fn motorcycles_always_land_in_motorcycle_category() {
        let mut builder = CascadeBuilder::new();
        let mut bike = motorcycle("HONDA", "CB400X", 971_615.0);
        bike.body_type = Some("SUV".to_string());
        builder.push_motorcycle(&bike);
        builder.push_vehicle(&vehicle("TOYOTA", "HARRIER", "SUV", 5.0e6));
        let (cascade, summary) = builder.finish();
        assert_eq!(summary.motorcycles_seen, 1);
        assert_eq!(
            cascade.categories(),
            &[CanonicalCategory::Motorcycle, CanonicalCategory::Suv]
        );
        assert_eq!(
            models_of(&cascade, CanonicalCategory::Motorcycle, "Honda"),
            vec!["Cb400x"]
        );
    }

    #[test]
    fn makes_and_models_are_sorted() {
        let mut builder = CascadeBuilder::new();
        builder.push_vehicle(&vehicle("TOYOTA", "PRADO", "SUV", 9.0e6));
        builder.push_vehicle(&vehicle("NISSAN", "X-TRAIL", "SUV", 4.0e6));
        builder.push_vehicle(&vehicle("TOYOTA", "HARRIER", "SUV", 5.0e6));
        builder.push_vehicle(&vehicle("AUDI", "Q5", "SUV", 7.0e6));
        let (cascade, _) = builder.finish();
        let makes: Vec<&str> = cascade
            .makes(CanonicalCategory::Suv)
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(makes, vec!["Audi", "Nissan", "Toyota"]);
        assert_eq!(
            models_of(&cascade, CanonicalCategory::Suv, "Toyota"),
            vec!["Harrier", "Prado"]
        );
    }

    #[test]
    fn enrichment_fields_are_normalized_or_omitted() {
        let mut builder = CascadeBuilder::new();
        let mut record = vehicle("TOYOTA", "HARRIER", "SUV", 5.0e6);
        record.engine_cc = Some(RawEngine::Number(1986.0));
        record.fuel = Some("PETROL/HYBRID".to_string());
        record.transmission = Some(" AT ".to_string());
        record.model_number = Some("None".to_string());
        builder.push_vehicle(&record);

        let mut bare = vehicle("TOYOTA", "PRADO", "SUV", 9.0e6);
        bare.engine_cc = Some(RawEngine::Number(0.0));
        bare.fuel = Some(String::new());
        builder.push_vehicle(&bare);

        let (cascade, _) = builder.finish();
        let entries = &cascade.makes(CanonicalCategory::Suv).unwrap()["Toyota"];
        assert_eq!(entries[0].cc, Some(EngineSize::Cc(1986)));
        assert_eq!(entries[0].fuel.as_deref(), Some("Petrol/Hybrid"));
        assert_eq!(entries[0].tx.as_deref(), Some("AT"));
        assert_eq!(entries[0].mn, None);
        assert_eq!(entries[1].cc, None);
        assert_eq!(entries[1].fuel, None);
        assert_eq!(
            serde_json::to_string(&entries[1]).unwrap(),
            r#"{"model":"Prado","crsp":9000000}"#
        );
    }

    #[test]
    fn exact_duplicates_are_collapsed() {
        let mut builder = CascadeBuilder::new();
        builder.push_vehicle(&vehicle("TOYOTA", "HARRIER", "SUV", 5.0e6));
        builder.push_vehicle(&vehicle("Toyota", "Harrier", "SUV", 5.0e6));
        builder.push_vehicle(&vehicle("TOYOTA", "HARRIER", "SUV", 5.5e6));
        let (cascade, summary) = builder.finish();
        assert_eq!(summary.duplicates_collapsed, 1);
        assert_eq!(cascade.leaf_count(), 2);
    }

    #[test]
    fn output_is_independent_of_input_order() {
        let records = vec![
            vehicle("TOYOTA", "PRADO", "SUV", 9.0e6),
            vehicle("TOYOTA", "PRADO", "SUV", 8.0e6),
            vehicle("MAZDA", "CX-5", "CROSSOVER", 4.0e6),
            vehicle("TOYOTA", "AXIO", "SEDAN", 2.0e6),
            vehicle("ISUZU", "D-MAX", "D/CAB", 4.5e6),
        ];
        let mut forward = CascadeBuilder::new();
        forward.extend_vehicles(&records);
        let mut backward = CascadeBuilder::new();
        backward.extend_vehicles(records.iter().rev());
        let (a, _) = forward.finish();
        let (b, _) = backward.finish();
        assert_eq!(a, b);
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
    }

    #[test]
    fn artifact_round_trips_and_keeps_order() {
        let mut builder = CascadeBuilder::new();
        builder.push_vehicle(&vehicle("TOYOTA", "AXIO", "SEDAN", 2.0e6));
        builder.push_vehicle(&vehicle("TOYOTA", "HARRIER", "SUV", 5.0e6));
        builder.push_motorcycle(&motorcycle("HONDA", "CB400X", 971_615.0));
        let (cascade, _) = builder.finish();

        let json = cascade.to_json().unwrap();
        assert!(json.starts_with(r#"{"categories":["Motorcycle","SUV","Sedan"],"data":{"Motorcycle":"#));

        let artifact: CascadeArtifact = serde_json::from_str(&json).unwrap();
        let restored = Cascade::from_artifact(artifact).unwrap();
        assert_eq!(restored, cascade);
    }

    #[test]
    fn malformed_artifacts_are_rejected() {
        let parse = |raw: &str| {
            let artifact: CascadeArtifact = serde_json::from_str(raw).unwrap();
            Cascade::from_artifact(artifact)
        };
        let cases = [
            r#"{"categories":["Lorry"],"data":{}}"#,
            r#"{"categories":["SUV","Motorcycle"],"data":{}}"#,
            r#"{"categories":["SUV"],"data":{}}"#,
            r#"{"categories":[],"data":{"SUV":{"Toyota":[{"model":"Rav4","crsp":1}]}}}"#,
            r#"{"categories":["SUV"],"data":{"SUV":{}}}"#,
            r#"{"categories":["SUV"],"data":{"SUV":{"Toyota":[]}}}"#,
            r#"{"categories":["SUV"],"data":{"SUV":{"Toyota":[{"model":"Rav4","crsp":0}]}}}"#,
        ];
        for raw in cases {
            assert!(
                matches!(parse(raw), Err(PipelineError::MalformedCascade(_))),
                "{raw}"
            );
        }
    }

    #[test]
    fn loaded_artifact_is_resorted() {
        let raw = r#"{"categories":["SUV"],"data":{"SUV":{
            "Toyota":[{"model":"Prado","crsp":2},{"model":"Harrier","crsp":1}],
            "Audi":[{"model":"Q5","crsp":3}]}}}"#;
        let artifact: CascadeArtifact = serde_json::from_str(raw).unwrap();
        let cascade = Cascade::from_artifact(artifact).unwrap();
        let leaves: Vec<(&str, &str, usize)> = cascade
            .leaves()
            .map(|leaf| (leaf.make, leaf.entry.model.as_str(), leaf.ordinal))
            .collect();
        assert_eq!(
            leaves,
            vec![("Audi", "Q5", 0), ("Toyota", "Harrier", 0), ("Toyota", "Prado", 1)]
        );
        assert_eq!(
            cascade.stats(),
            vec![CategoryStats {
                category: CanonicalCategory::Suv,
                makes: 2,
                models: 3
            }]
        );
    }
}
