use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use log::debug;

use super::category::Category;
use super::error::CategorizerError;

/// Row indices of a train/evaluation partition, each side in ascending order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

fn test_count(total: usize, test_fraction: f64) -> usize {
    let count = (total as f64 * test_fraction).round() as usize;
    count.max(1).min(total.saturating_sub(1))
}

/// Partitions rows into training and evaluation indices with a seeded shuffle.
///
/// With `stratify`, every category is shuffled and cut on its own so each
/// one lands on both sides; a category with fewer than two rows cannot be
/// split that way. Without it, all rows are shuffled together and cut once,
/// and rare categories may end up on one side only.
///
/// # Errors
/// - `InsufficientData` if there are fewer than two rows, or (stratified) a category has a single row
pub fn train_test_split(
    labels: &[Category],
    test_fraction: f64,
    seed: u64,
    stratify: bool,
) -> Result<Split, CategorizerError> {
    if labels.len() < 2 {
        return Err(CategorizerError::InsufficientData(format!(
            "Need at least 2 records to split, found {}", labels.len()
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    if stratify {
        let mut groups: BTreeMap<&Category, Vec<usize>> = BTreeMap::new();
        for (i, label) in labels.iter().enumerate() {
            groups.entry(label).or_default().push(i);
        }

        let sparse: Vec<String> = groups.iter()
            .filter(|(_, rows)| rows.len() < 2)
            .map(|(label, _)| label.to_string())
            .collect();
        if !sparse.is_empty() {
            return Err(CategorizerError::InsufficientData(format!(
                "Categories need at least 2 examples for a stratified split: {}",
                sparse.join(", ")
            )));
        }

        for (label, mut rows) in groups {
            rows.shuffle(&mut rng);
            let held_out = test_count(rows.len(), test_fraction);
            debug!("Category '{}': {} train, {} test", label, rows.len() - held_out, held_out);
            test.extend_from_slice(&rows[..held_out]);
            train.extend_from_slice(&rows[held_out..]);
        }
    } else {
        let mut rows: Vec<usize> = (0..labels.len()).collect();
        rows.shuffle(&mut rng);
        let held_out = test_count(rows.len(), test_fraction);
        test.extend_from_slice(&rows[..held_out]);
        train.extend_from_slice(&rows[held_out..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    debug!("Dataset split: {} training, {} evaluation", train.len(), test.len());
    Ok(Split { train, test })
}
