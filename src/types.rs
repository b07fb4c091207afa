/// Make name after title-casing.
/// Examples: `Toyota`, `Mercedes-Benz`, `Land Rover`
pub type MakeName = String;
/// Model name after title-casing.
/// Examples: `Harrier 2.0`, `CB400X`, `Hilux D/Cab 2.4`
pub type ModelName = String;
/// Raw body-type label exactly as it appears in the source sheet.
/// Examples: `SUV`, `S/WAGON`, `DOUBLE  CAB`
pub type BodyTypeLabel = String;
/// URL-safe path segment.
/// Examples: `suv`, `pickup-truck`, `harrier-20`, `model-3`
pub type Slug = String;
/// Base valuation in whole Kenyan shillings (no minor unit).
/// Example: `971615`
pub type Valuation = u64;
/// Whole-shilling monetary amount produced by the duty calculation.
/// Example: `308730`
pub type Amount = u64;
/// Calendar year (manufacture or reference).
/// Example: `2026`
pub type Year = i32;
/// Relative page path used for sinks and collision reporting.
/// Example: `suv/toyota/harrier/index.html`
pub type PathString = String;
