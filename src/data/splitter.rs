// ============================================================
// Layer 4 — Corpus Splitter
// ============================================================
// Shuffles records with a seeded RNG and partitions them into
// train / validation / test.
//
// The RNG is seeded from the run configuration, so the same
// seed always produces the same three partitions. That keeps
// validation and test scores comparable between runs.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.
//
// Reference: rand crate documentation

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `items` and split them into (train, validation, test).
///
/// `val_fraction` and `test_fraction` are proportions of the
/// full input; the remainder goes to training. Fractions are
/// clamped so the held-out parts never exceed the input.
pub fn split_three_way<T>(
    mut items:     Vec<T>,
    val_fraction:  f64,
    test_fraction: f64,
    seed:          u64,
) -> (Vec<T>, Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);

    let total      = items.len();
    let n_test     = ((total as f64) * test_fraction.clamp(0.0, 1.0)).round() as usize;
    let n_test     = n_test.min(total);
    let n_val      = ((total as f64) * val_fraction.clamp(0.0, 1.0)).round() as usize;
    let n_val      = n_val.min(total - n_test);

    // split_off(n) removes elements [n..] and returns them
    let test = items.split_off(total - n_test);
    let val  = items.split_off(items.len() - n_val);

    tracing::debug!(
        "Corpus split: {} train, {} validation, {} test",
        items.len(),
        val.len(),
        test.len()
    );

    (items, val, test)
}
