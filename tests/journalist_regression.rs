mod common;

use approx::assert_relative_eq;
use riskgen::application::SearchSettings;
use riskgen::{
    Anonymizer, Configuration, DataSubset, Dataset, FinancialConfiguration, Hierarchy, Metric,
    PrivacyCriterion,
};

/// (adversary cost, adversary gain, publisher loss, publisher benefit)
const FINANCIAL_SETUPS: [(f64, f64, f64, f64); 4] = [
    (2.0, 1200.0, 300.0, 1200.0),
    (20.0, 120.0, 3000.0, 1200.0),
    (20.0, 120.0, 3000.0, 120.0),
    (20.0, 1000.0, 3000.0, 120.0),
];

fn financial((cost, gain, loss, benefit): (f64, f64, f64, f64)) -> FinancialConfiguration {
    FinancialConfiguration::new(cost, gain, loss, benefit).expect("Financial parameters should be valid")
}

/// (age, zip, population records, of which released)
const CELLS: [(&str, &str, usize, usize); 7] = [
    ("21", "1001", 4, 3),
    ("22", "1001", 4, 3),
    ("24", "1001", 30, 30),
    ("23", "2002", 6, 5),
    ("31", "1002", 2, 1),
    ("33", "2001", 5, 4),
    ("34", "2001", 5, 4),
];

/// Population built from `CELLS`, and its released subset.
fn fixed_population() -> (Dataset, DataSubset) {
    let age = Hierarchy::new(
        ["21", "22", "23", "24", "31", "32", "33", "34"]
            .iter()
            .map(|age| {
                let decade = if age.starts_with('2') { "20-29" } else { "30-39" };
                vec![(*age).to_string(), decade.to_string(), "*".to_string()]
            })
            .collect(),
    )
    .expect("Age hierarchy should be valid");
    let zip = Hierarchy::new(
        ["1001", "1002", "2001", "2002"]
            .iter()
            .map(|zip| vec![(*zip).to_string(), format!("{}*", &zip[..3]), "*".to_string()])
            .collect(),
    )
    .expect("Zip hierarchy should be valid");

    let mut rows = Vec::new();
    let mut released = Vec::new();
    for (age, zip, population, sample) in CELLS {
        for record in 0..population {
            if record < sample {
                released.push(rows.len());
            }
            rows.push(vec![age.to_string(), zip.to_string(), "flu".to_string()]);
        }
    }
    let dataset = Dataset::new(
        vec!["age".to_string(), "zip".to_string(), "disease".to_string()],
        rows,
    )
    .and_then(|d| d.with_hierarchy("age", age))
    .and_then(|d| d.with_hierarchy("zip", zip))
    .expect("Population should be valid");
    (dataset, DataSubset::from_indices(released))
}

#[test]
fn journalist_scenario_reproduces_known_optimum() {
    let (dataset, subset) = fixed_population();
    assert_eq!(dataset.len(), 56);
    assert_eq!(subset.len(), 50);
    let config = Configuration::builder()
        .suppression_limit(0.04)
        .metric(Metric::Loss)
        .criterion(PrivacyCriterion::Journalist(subset))
        .financial(financial(FINANCIAL_SETUPS[1]))
        .build()
        .expect("Configuration should be valid");

    for workers in [1, 3] {
        let result = Anonymizer::with_settings(SearchSettings::default().with_workers(workers))
            .expect("Worker pool should start")
            .anonymize(&dataset, &config)
            .expect("Should anonymize");

        // Attacks pay off below six population records per class. Decades
        // with raw zips leave only the lone 30-39/1002 record to suppress:
        // 49 records lose 3/7 on age, the suppressed one loses both cells.
        assert!(!result.used_fallback);
        assert_eq!(result.transformation.levels(), &[1, 0]);
        assert_eq!(result.suppressed_record_count, 1);
        assert_relative_eq!(result.achieved_score, (49.0 * 3.0 / 7.0 + 2.0) / 100.0, epsilon = 1e-12);
    }
}

#[test]
fn journalist_with_research_subset_is_stable() {
    let dataset = common::population(400, 42);
    let subset = common::research_subset(&dataset, 0.3, 43);
    let config = Configuration::builder()
        .suppression_limit(0.04)
        .metric(Metric::Loss)
        .criterion(PrivacyCriterion::Journalist(subset.clone()))
        .financial(financial(FINANCIAL_SETUPS[1]))
        .build()
        .expect("Configuration should be valid");

    let first = Anonymizer::with_settings(SearchSettings::default().with_workers(1))
        .expect("Worker pool should start")
        .anonymize(&dataset, &config)
        .expect("Should anonymize");
    let second = Anonymizer::with_settings(SearchSettings::default().with_workers(3))
        .expect("Worker pool should start")
        .anonymize(&dataset, &config)
        .expect("Should anonymize");

    assert_eq!(first.transformation, second.transformation);
    assert_eq!(first.achieved_score, second.achieved_score);
    assert_eq!(first.suppressed_record_count, second.suppressed_record_count);

    // Population classes are never smaller than released ones, so the fully
    // generalized node is always safe and the search cannot fall back.
    assert!(!first.used_fallback);
    let budget = (0.04 * subset.len() as f64 + 1e-9).floor() as usize;
    assert!(first.suppressed_record_count <= budget);
    assert!((0.0..=1.0).contains(&first.achieved_score));
}

#[test]
fn every_criterion_respects_the_limit_for_every_setup() {
    let dataset = common::population(300, 99);
    let subset = common::research_subset(&dataset, 0.5, 100);
    let anonymizer = Anonymizer::with_settings(SearchSettings::default().with_workers(2))
        .expect("Worker pool should start");

    for setup in FINANCIAL_SETUPS {
        let criteria = [
            PrivacyCriterion::Prosecutor,
            PrivacyCriterion::ProsecutorNoAttack,
            PrivacyCriterion::Journalist(subset.clone()),
            PrivacyCriterion::JournalistNoAttack(subset.clone()),
        ];
        for criterion in criteria {
            let released = criterion.subset().map_or(dataset.len(), |s| s.len());
            let config = Configuration::builder()
                .suppression_limit(0.04)
                .metric(Metric::Loss)
                .criterion(criterion.clone())
                .financial(financial(setup))
                .build()
                .expect("Configuration should be valid");

            let result = anonymizer.anonymize(&dataset, &config).expect("Should anonymize");
            let budget = (0.04 * released as f64 + 1e-9).floor() as usize;
            assert!(
                result.suppressed_record_count <= budget,
                "{criterion:?} with {setup:?}"
            );

            let assessment = anonymizer
                .assess(&dataset, &config, result.transformation.levels())
                .expect("Should assess");
            assert_eq!(assessment.score, result.achieved_score, "{criterion:?} with {setup:?}");
            assert_eq!(assessment.feasible, !result.used_fallback, "{criterion:?} with {setup:?}");
        }
    }
}

#[test]
fn released_output_matches_transformation() {
    let dataset = common::population(200, 7);
    let subset = common::research_subset(&dataset, 0.5, 8);
    let config = Configuration::builder()
        .suppression_limit(0.04)
        .metric(Metric::Discernibility {
            penalize_suppression: false,
        })
        .criterion(PrivacyCriterion::JournalistNoAttack(subset.clone()))
        .financial(financial(FINANCIAL_SETUPS[1]))
        .build()
        .expect("Configuration should be valid");
    let anonymizer = Anonymizer::with_settings(SearchSettings::default().with_workers(2))
        .expect("Worker pool should start");

    let result = anonymizer.anonymize(&dataset, &config).expect("Should anonymize");
    let released = anonymizer
        .apply(&dataset, &config, &result.transformation)
        .expect("Should apply");

    assert_eq!(released.len(), subset.len());
    assert_eq!(released.header(), dataset.header());
    let suppressed = released
        .rows()
        .iter()
        .filter(|row| row[..3].iter().all(|v| v == riskgen::application::SUPPRESSED_VALUE))
        .count();
    // Rows generalized to the root also read "*", so this is a lower bound.
    assert!(suppressed >= result.suppressed_record_count);
    // Diagnoses are never touched.
    let original: Vec<&str> = subset.iter().map(|i| dataset.rows()[i][3].as_str()).collect();
    let published: Vec<&str> = released.rows().iter().map(|r| r[3].as_str()).collect();
    assert_eq!(original, published);
}
