/// Constants used by duty calculation defaults.
pub mod duty {
    /// Reference year the valuation list and duty tables are computed against.
    pub const DEFAULT_REFERENCE_YEAR: i32 = 2026;
    /// Import duty rate applied to the customs value.
    pub const IMPORT_DUTY_RATE: f64 = 0.25;
    /// Excise rate applied to customs value plus import duty.
    pub const EXCISE_DUTY_RATE: f64 = 0.20;
    /// VAT rate applied to customs value plus import duty plus excise.
    pub const VAT_RATE: f64 = 0.16;
    /// Import declaration fee rate applied to the customs value.
    pub const IDF_RATE: f64 = 0.0225;
    /// Floor applied to the import declaration fee.
    pub const IDF_MINIMUM: f64 = 5000.0;
    /// Railway development levy rate applied to the customs value.
    pub const RDL_RATE: f64 = 0.015;
    /// Divisor that strips the taxes embedded in a CRSP valuation.
    pub const TAX_STRIP_DIVISOR: f64 = 2.4469;
    /// Default `(max_age, rate)` depreciation bands for direct imports.
    pub const DEPRECIATION_BANDS: [(u32, f64); 8] = [
        (1, 0.00),
        (2, 0.20),
        (3, 0.30),
        (4, 0.40),
        (5, 0.50),
        (6, 0.55),
        (7, 0.60),
        (8, 0.65),
    ];
    /// Largest `maxAge` a configured depreciation band may declare.
    pub const MAX_BAND_AGE: u32 = 100;
}

/// Constants used by cascade construction.
pub mod cascade {
    /// Raw field values treated as absent (compared case-insensitively after trimming).
    pub const PLACEHOLDER_VALUES: [&str; 3] = ["none", "n/a", "-"];
    /// Log prefix for cascade construction messages.
    pub const LOG_PREFIX: &str = "[dutycheck:cascade]";
}

/// Constants used by page enumeration and output layout.
pub mod pages {
    /// File written inside every page directory.
    pub const INDEX_FILENAME: &str = "index.html";
    /// Fallback slug prefix for models whose name has no slug characters.
    pub const MODEL_FALLBACK_PREFIX: &str = "model";
    /// Fallback slug prefix for makes whose name has no slug characters.
    pub const MAKE_FALLBACK_PREFIX: &str = "make";
    /// Default output directory for generated pages.
    pub const DEFAULT_OUTPUT_DIR: &str = "public";
    /// Default canonical site origin used in page metadata.
    pub const DEFAULT_SITE_URL: &str = "https://dutycheck.co.ke";
    /// Log prefix for page generation messages.
    pub const LOG_PREFIX: &str = "[dutycheck:pages]";
}
