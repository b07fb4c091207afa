//! Canonical vehicle categories and the curated body-type lookup table.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::slug::slugify;
use crate::types::Slug;

/// Closed set of display categories.
///
/// Declaration order is the display priority; `Ord` follows it, so sorted
/// collections of categories come out in the order pages and the cascade
/// artifact list them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CanonicalCategory {
    Motorcycle,
    Suv,
    Sedan,
    Hatchback,
    StationWagon,
    Van,
    PickupTruck,
    Coupe,
    Convertible,
    Bus,
    Commercial,
}

impl CanonicalCategory {
    /// Every category in display-priority order.
    pub const ALL: [CanonicalCategory; 11] = [
        CanonicalCategory::Motorcycle,
        CanonicalCategory::Suv,
        CanonicalCategory::Sedan,
        CanonicalCategory::Hatchback,
        CanonicalCategory::StationWagon,
        CanonicalCategory::Van,
        CanonicalCategory::PickupTruck,
        CanonicalCategory::Coupe,
        CanonicalCategory::Convertible,
        CanonicalCategory::Bus,
        CanonicalCategory::Commercial,
    ];

    /// Name used in the cascade artifact and on pages.
    pub const fn display_name(self) -> &'static str {
        match self {
            CanonicalCategory::Motorcycle => "Motorcycle",
            CanonicalCategory::Suv => "SUV",
            CanonicalCategory::Sedan => "Sedan",
            CanonicalCategory::Hatchback => "Hatchback",
            CanonicalCategory::StationWagon => "Station Wagon",
            CanonicalCategory::Van => "Van",
            CanonicalCategory::PickupTruck => "Pickup / Truck",
            CanonicalCategory::Coupe => "Coupe",
            CanonicalCategory::Convertible => "Convertible",
            CanonicalCategory::Bus => "Bus",
            CanonicalCategory::Commercial => "Commercial",
        }
    }

    /// Resolve a display name (as written in a cascade artifact) back to its category.
    pub fn from_display_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.display_name() == name)
    }

    /// URL segment for this category (`Pickup / Truck` -> `pickup-truck`).
    pub fn slug(self) -> Slug {
        slugify(self.display_name())
    }
}

impl fmt::Display for CanonicalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl Serialize for CanonicalCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.display_name())
    }
}

impl<'de> Deserialize<'de> for CanonicalCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Self::from_display_name(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown category '{name}'")))
    }
}

/// Known raw body-type spellings, including misspellings seen in the source sheet.
///
/// Matching is exact after trimming surrounding whitespace; inner spacing and
/// case are significant (`DOUBLE  CAB` with two spaces is its own entry).
pub const BODY_TYPE_TABLE: &[(&str, CanonicalCategory)] = &[
    ("SUV", CanonicalCategory::Suv),
    ("SUV-COUPE", CanonicalCategory::Suv),
    ("CROSSOVER", CanonicalCategory::Suv),
    ("suv", CanonicalCategory::Suv),
    ("SEDAN", CanonicalCategory::Sedan),
    ("SALOON", CanonicalCategory::Sedan),
    ("SAL", CanonicalCategory::Sedan),
    ("HATCHBACK", CanonicalCategory::Hatchback),
    ("HATCBACK", CanonicalCategory::Hatchback),
    ("WAGON", CanonicalCategory::StationWagon),
    ("S/WAGON", CanonicalCategory::StationWagon),
    ("S. WAGON", CanonicalCategory::StationWagon),
    ("STATION WAGON", CanonicalCategory::StationWagon),
    ("VAN", CanonicalCategory::Van),
    ("MINIVAN", CanonicalCategory::Van),
    ("MINVAN", CanonicalCategory::Van),
    ("COUPE", CanonicalCategory::Coupe),
    ("CONVERTIBLE", CanonicalCategory::Convertible),
    ("CONVRTIBLE", CanonicalCategory::Convertible),
    ("ROADSTER", CanonicalCategory::Convertible),
    ("TRUCK", CanonicalCategory::PickupTruck),
    ("TRK", CanonicalCategory::PickupTruck),
    ("SINGLE CAB", CanonicalCategory::PickupTruck),
    ("SINGLE CABIN", CanonicalCategory::PickupTruck),
    ("S/CAB", CanonicalCategory::PickupTruck),
    ("S/CABIN", CanonicalCategory::PickupTruck),
    ("DUAL CAB", CanonicalCategory::PickupTruck),
    ("D/CAB", CanonicalCategory::PickupTruck),
    ("DOUBLE CABIN", CanonicalCategory::PickupTruck),
    ("DOUBLE CAB", CanonicalCategory::PickupTruck),
    ("DOUBLE  CAB", CanonicalCategory::PickupTruck),
    ("CREW CAB", CanonicalCategory::PickupTruck),
    ("PICK UP", CanonicalCategory::PickupTruck),
    ("PICKUP", CanonicalCategory::PickupTruck),
    ("BUS", CanonicalCategory::Bus),
    ("MINI BUS", CanonicalCategory::Bus),
    ("PEOPLE MOVER", CanonicalCategory::Bus),
    ("TIPPER", CanonicalCategory::Commercial),
    ("MIXER", CanonicalCategory::Commercial),
    ("TRANSIT  MIXER", CanonicalCategory::Commercial),
    ("TRACTOR", CanonicalCategory::Commercial),
    ("AMBULANCE", CanonicalCategory::Commercial),
    ("PRIM£ MOVER", CanonicalCategory::Commercial),
    ("PM", CanonicalCategory::Commercial),
    ("3", CanonicalCategory::Commercial),
    ("OTHER", CanonicalCategory::Commercial),
];

/// Map a raw body-type label to its canonical category.
///
/// Returns `None` for empty labels and for any spelling not in [`BODY_TYPE_TABLE`].
pub fn normalize_body_type(label: &str) -> Option<CanonicalCategory> {
    let label = label.trim();
    if label.is_empty() {
        return None;
    }
    BODY_TYPE_TABLE
        .iter()
        .find(|(raw, _)| *raw == label)
        .map(|(_, category)| *category)
}
