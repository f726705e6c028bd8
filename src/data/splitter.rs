// ============================================================
// Layer 4 - Train/Holdout Splitter
// ============================================================
// Shuffles row indices with a seeded generator and splits them
// into a training set and a holdout set:
//   - Training set: fitted on
//   - Holdout set:  withheld, kept for a later evaluation stage
//
// Membership is a pure function of (dataset, fraction, seed).
// The generator is ChaCha8, whose stream is fixed by the algorithm:
// the same seed gives the same permutation on every platform and
// rand release.
//
// Holdout size: round(fraction * rows), clamped to [1, rows - 1]
// so neither side is ever empty.
//
// Reference: rand crate documentation (SliceRandom, SeedableRng)

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::data::dataset::Dataset;
use crate::domain::error::{ModelError, ModelResult};

/// Output of `train_test_split`. Mirrors the classic
/// `X_train, X_test, y_train, y_test` quadruple, plus the original
/// row indices of each side.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Dataset,
    pub x_test:  Dataset,
    pub y_train: Vec<f64>,
    pub y_test:  Vec<f64>,
    pub train_indices: Vec<usize>,
    pub test_indices:  Vec<usize>,
}

/// Number of holdout rows for `total` rows at `fraction`.
pub fn holdout_count(total: usize, fraction: f64) -> ModelResult<usize> {
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(ModelError::InvalidConfiguration(format!(
            "holdout fraction must lie in (0, 1), got {fraction}"
        )));
    }
    if total < 2 {
        return Err(ModelError::InvalidConfiguration(format!(
            "need at least 2 rows to form a train and a holdout set, got {total}"
        )));
    }

    let n_test = ((total as f64) * fraction).round() as usize;
    Ok(n_test.clamp(1, total - 1))
}

/// Seeded permutation of `0..total`.
fn permutation(total: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut indices: Vec<usize> = (0..total).collect();
    indices.shuffle(&mut rng);
    indices
}

/// Partition `dataset` into train and holdout subsets.
///
/// # Arguments
/// * `features`         - Columns kept in `x_train` / `x_test`, in this order
/// * `target`           - Column read into `y_train` / `y_test`
/// * `holdout_fraction` - Share of rows withheld, strictly between 0 and 1
/// * `seed`             - Fixes the permutation
///
/// # Errors
/// `InvalidConfiguration` for a fraction outside (0, 1) or fewer than
/// 2 rows, `SchemaMismatch` if a column is absent, and
/// `InvalidTargetValue` if a target cell is missing or not numeric.
pub fn train_test_split<S: AsRef<str>>(
    dataset:          &Dataset,
    features:         &[S],
    target:           &str,
    holdout_fraction: f64,
    seed:             u64,
) -> ModelResult<TrainTestSplit> {
    let n_test = holdout_count(dataset.len(), holdout_fraction)?;

    let x = dataset.select(features)?;
    let y = dataset.target_values(target)?;

    let mut order   = permutation(dataset.len(), seed);
    let train_indices = order.split_off(n_test);
    let test_indices  = order;

    let pick = |idx: &[usize]| idx.iter().map(|&i| y[i]).collect::<Vec<f64>>();

    tracing::debug!(
        "Dataset split: {} train, {} holdout (fraction={}, seed={})",
        train_indices.len(),
        test_indices.len(),
        holdout_fraction,
        seed,
    );

    Ok(TrainTestSplit {
        x_train: x.take_rows(&train_indices),
        x_test:  x.take_rows(&test_indices),
        y_train: pick(&train_indices),
        y_test:  pick(&test_indices),
        train_indices,
        test_indices,
    })
}
