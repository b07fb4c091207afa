use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use dutycheck::transport::fs::{load_cascade, load_records, write_cascade};
use dutycheck::{
    CanonicalCategory, Cascade, CascadeBuilder, DutyCalculator, FsPageSink, GeneratorConfig,
    HtmlRenderer, MemoryPageSink, PageEnumerator, PageKind, RateConfig,
};
use tempfile::tempdir;
use walkdir::WalkDir;

const VEHICLES: &str = r#"[
    {"make":"TOYOTA","model":"HARRIER","body_type":"SUV","engine_cc":1986,"fuel":"PETROL","crsp_kes":5200000},
    {"make":"TOYOTA","model":"RAV4","body_type":"Suv","crsp_kes":4100000},
    {"make":"TOYOTA","model":"AXIO","body_type":"SEDAN","transmission":"AT","crsp_kes":2300000},
    {"make":"MAZDA","model":"CX-5","body_type":"CROSSOVER","model_number":"None","crsp_kes":4100000},
    {"make":"ISUZU","model":"D-MAX","body_type":"D/CAB","engine_cc":"2999","crsp_kes":4500000},
    {"make":"NISSAN","model":"CARAVAN","body_type":"LORRY","crsp_kes":3000000},
    {"make":"TOYOTA","model":"PRADO 2.8","body_type":"SUV","crsp_kes":9800000},
    {"make":"TOYOTA","model":"PRADO-2.8","body_type":"SUV","crsp_kes":9900000},
    {"make":"SUBARU","model":"","body_type":"SUV","crsp_kes":3000000}
]"#;

const MOTORCYCLES: &str = r#"[
    {"make":"HONDA","model":"CB400X","crsp_kes":971615},
    {"make":"BAJAJ","model":"BOXER 150","engine_cc":150,"crsp_kes":180000}
]"#;

fn build(dir: &Path) -> Cascade {
    let vehicles_path = dir.join("vehicles.json");
    let motorcycles_path = dir.join("motorcycles.json");
    fs::write(&vehicles_path, VEHICLES).expect("write vehicles");
    fs::write(&motorcycles_path, MOTORCYCLES).expect("write motorcycles");

    let mut builder = CascadeBuilder::new();
    builder.extend_vehicles(&load_records(&vehicles_path).expect("vehicles"));
    builder.extend_motorcycles(&load_records(&motorcycles_path).expect("motorcycles"));
    builder.finish().0
}

fn read_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry
                .path()
                .strip_prefix(root)
                .expect("under root")
                .to_string_lossy()
                .into_owned();
            (relative, fs::read(entry.path()).expect("read page"))
        })
        .collect()
}

#[test]
fn suv_label_maps_but_mixed_case_variant_is_skipped() {
    let temp = tempdir().expect("tempdir");
    let vehicles_path = temp.path().join("vehicles.json");
    fs::write(&vehicles_path, VEHICLES).expect("write vehicles");

    let mut builder = CascadeBuilder::new();
    builder.extend_vehicles(&load_records(&vehicles_path).expect("vehicles"));
    let (cascade, summary) = builder.finish();

    let suv = cascade.makes(CanonicalCategory::Suv).expect("suv makes");
    let toyota: Vec<&str> = suv["Toyota"].iter().map(|entry| entry.model.as_str()).collect();
    assert_eq!(toyota, vec!["Harrier", "Prado 2.8", "Prado-2.8"]);
    assert!(suv.contains_key("Mazda"));
    assert_eq!(summary.unmapped_labels.get("Suv"), Some(&1));
    assert_eq!(summary.unmapped_labels.get("LORRY"), Some(&1));
    assert_eq!(summary.skipped_incomplete, 1);
    assert_eq!(
        cascade.categories(),
        &[
            CanonicalCategory::Suv,
            CanonicalCategory::Sedan,
            CanonicalCategory::PickupTruck
        ]
    );
}

#[test]
fn upper_and_lower_case_suv_share_one_make_bucket() {
    let temp = tempdir().expect("tempdir");
    let vehicles_path = temp.path().join("vehicles.json");
    fs::write(
        &vehicles_path,
        r#"[{"make":"TOYOTA","model":"RAV4","body_type":"suv","crsp_kes":4100000},
            {"make":"TOYOTA","model":"HARRIER","body_type":"SUV","crsp_kes":5200000}]"#,
    )
    .expect("write vehicles");

    let mut builder = CascadeBuilder::new();
    builder.extend_vehicles(&load_records(&vehicles_path).expect("vehicles"));
    let (cascade, summary) = builder.finish();

    assert_eq!(summary.skipped(), 0);
    assert_eq!(cascade.categories(), &[CanonicalCategory::Suv]);
    let makes = cascade.makes(CanonicalCategory::Suv).expect("suv makes");
    assert_eq!(makes.len(), 1);
    let models: Vec<&str> = makes["Toyota"]
        .iter()
        .map(|entry| entry.model.as_str())
        .collect();
    assert_eq!(models, vec!["Harrier", "Rav4"]);
}

#[test]
fn pipeline_runs_are_byte_identical() {
    let calculator = DutyCalculator::new(RateConfig::default(), 2026).expect("calculator");
    let config = GeneratorConfig {
        year_pages: true,
        ..GeneratorConfig::default()
    };

    let mut artifacts = Vec::new();
    let mut trees = Vec::new();
    for _ in 0..2 {
        let temp = tempdir().expect("tempdir");
        let cascade = build(temp.path());
        let cascade_path = temp.path().join("data/crsp_cascade.json");
        write_cascade(&cascade_path, &cascade).expect("write cascade");
        artifacts.push(fs::read(&cascade_path).expect("read cascade"));

        let loaded = load_cascade(&cascade_path).expect("load cascade");
        assert_eq!(loaded, cascade);
        let sink = FsPageSink::new(temp.path().join("public"));
        let report = PageEnumerator::new(&loaded, &calculator)
            .with_config(config.clone())
            .generate(&HtmlRenderer, &sink)
            .expect("generate");
        assert!(report.is_complete());
        assert_eq!(report.written.model_pages, loaded.leaf_count());
        trees.push(read_tree(sink.root()));
    }

    assert_eq!(artifacts[0], artifacts[1]);
    assert_eq!(trees[0], trees[1]);
    assert!(trees[0].contains_key("suv/toyota/prado-28/index.html"));
    assert!(trees[0].contains_key("suv/toyota/prado-28-2/index.html"));
    assert!(trees[0].contains_key("motorcycle/honda/cb400x/2018/index.html"));
}

#[test]
fn every_leaf_gets_a_unique_page_path() {
    let temp = tempdir().expect("tempdir");
    let cascade = build(temp.path());
    let calculator = DutyCalculator::new(RateConfig::default(), 2026).expect("calculator");
    let plan = PageEnumerator::new(&cascade, &calculator)
        .plan()
        .expect("plan");

    let paths = plan.output_paths();
    let unique: HashSet<&String> = paths.iter().collect();
    assert_eq!(unique.len(), paths.len());
    assert_eq!(
        plan.pages()
            .iter()
            .filter(|page| page.kind() == PageKind::Model)
            .count(),
        cascade.leaf_count()
    );
}

#[test]
fn model_page_carries_reference_duty_figures() {
    let temp = tempdir().expect("tempdir");
    let cascade = build(temp.path());
    let calculator = DutyCalculator::new(RateConfig::default(), 2026).expect("calculator");
    let sink = MemoryPageSink::new();
    PageEnumerator::new(&cascade, &calculator)
        .generate(&HtmlRenderer, &sink)
        .expect("generate");

    let page = sink
        .get("motorcycle/honda/cb400x/index.html")
        .expect("cb400x page");
    assert!(page.contains("KES 971,615"));
    assert!(page.contains("KES 397,080"));
    assert!(page.contains("KES 308,730"));
    assert!(page.contains("KES 109,928"));

    let listing = sink.get("motorcycle/index.html").expect("listing");
    assert!(listing.contains("href=\"/motorcycle/bajaj/\""));
    assert!(listing.find("Bajaj") < listing.find("Honda"));
}

#[test]
fn pruning_removes_pages_of_dropped_models() {
    let temp = tempdir().expect("tempdir");
    let cascade = build(temp.path());
    let calculator = DutyCalculator::new(RateConfig::default(), 2026).expect("calculator");
    let out = temp.path().join("public");
    let stale = out.join("suv/toyota/land-cruiser/index.html");
    fs::create_dir_all(stale.parent().expect("parent")).expect("mkdir");
    fs::write(&stale, "old").expect("write stale");
    fs::write(out.join("robots.txt"), "User-agent: *").expect("write robots");
    fs::write(out.join("index.html"), "calculator").expect("write shell");
    fs::create_dir_all(out.join("about")).expect("mkdir about");
    fs::write(out.join("about/index.html"), "about").expect("write about");

    let sink = FsPageSink::new(&out);
    let config = GeneratorConfig {
        prune_stale: true,
        ..GeneratorConfig::default()
    };
    let report = PageEnumerator::new(&cascade, &calculator)
        .with_config(config)
        .generate(&HtmlRenderer, &sink)
        .expect("generate");

    assert_eq!(report.pruned, 1);
    assert!(!stale.exists());
    assert!(!out.join("suv/toyota/land-cruiser").exists());
    assert!(out.join("robots.txt").exists());
    assert!(out.join("index.html").exists());
    assert!(out.join("about/index.html").exists());
    assert!(out.join("suv/toyota/harrier/index.html").exists());
}
