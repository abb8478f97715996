//! Seeded synthetic population shared by the integration tests.

#![allow(dead_code)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use riskgen::{DataSubset, Dataset, Hierarchy};

pub const ZIPS: [&str; 8] = [
    "81667", "81668", "81669", "81675", "81677", "81925", "81931", "81935",
];

fn age_hierarchy() -> Hierarchy {
    let rows = (0..80u32)
        .map(|age| {
            let band = age / 5 * 5;
            let generation = age / 20 * 20;
            vec![
                age.to_string(),
                format!("{}-{}", band, band + 4),
                format!("{}-{}", generation, generation + 19),
                "*".to_string(),
            ]
        })
        .collect();
    Hierarchy::new(rows).expect("Age hierarchy should be valid")
}

fn zip_hierarchy() -> Hierarchy {
    let rows = ZIPS
        .iter()
        .map(|zip| {
            vec![
                (*zip).to_string(),
                format!("{}*", &zip[..4]),
                format!("{}**", &zip[..3]),
                "*".to_string(),
            ]
        })
        .collect();
    Hierarchy::new(rows).expect("Zip hierarchy should be valid")
}

/// `records` people with age, sex, zip (all quasi-identifying) and a
/// diagnosis, drawn from a fixed seed.
pub fn population(records: usize, seed: u64) -> Dataset {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let rows = (0..records)
        .map(|_| {
            vec![
                rng.gen_range(0..80u32).to_string(),
                if rng.gen_bool(0.5) { "m" } else { "f" }.to_string(),
                ZIPS[rng.gen_range(0..ZIPS.len())].to_string(),
                if rng.gen_bool(0.2) { "positive" } else { "negative" }.to_string(),
            ]
        })
        .collect();

    Dataset::new(
        vec![
            "age".to_string(),
            "sex".to_string(),
            "zip".to_string(),
            "diagnosis".to_string(),
        ],
        rows,
    )
    .and_then(|d| d.with_hierarchy("age", age_hierarchy()))
    .and_then(|d| d.with_hierarchy("sex", Hierarchy::redaction(["m", "f"]).expect("Valid")))
    .and_then(|d| d.with_hierarchy("zip", zip_hierarchy()))
    .expect("Population should be valid")
}

/// Roughly `fraction` of the records, drawn from a fixed seed.
pub fn research_subset(dataset: &Dataset, fraction: f64, seed: u64) -> DataSubset {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let indices: Vec<usize> = (0..dataset.len()).filter(|_| rng.gen_bool(fraction)).collect();
    assert!(!indices.is_empty(), "Subset should not be empty");
    DataSubset::from_indices(indices)
}
