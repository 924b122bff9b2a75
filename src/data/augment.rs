// ============================================================
// Layer 4 — Token Dropout Augmentation
// ============================================================
// Randomly blanks encoder tokens during training so the model
// cannot lean on any single word of the source document.
//
// Each position is replaced by the <pad> id independently with
// probability p. Only the encoder input is touched; labels and
// the padding mask are left as they are, and evaluation never
// calls this.
//
// The coin flips come from the caller's RNG (seeded from the
// run config), so a run is reproducible end to end.
//
// Reference: Rust Book §13 (Iterators)
//            rand crate documentation (Rng::gen_bool)

use anyhow::{ensure, Result};
use burn::{prelude::*, tensor::TensorData};
use rand::Rng;

/// Replace each token of `input_ids` with `pad_id` with probability `p`.
///
/// p = 0 returns the input untouched; p = 1 returns an all-pad tensor
/// of the same shape. p outside [0, 1] is an error.
pub fn random_token_dropout<B: Backend, R: Rng + ?Sized>(
    input_ids: Tensor<B, 2, Int>,
    p:         f64,
    pad_id:    u32,
    rng:       &mut R,
) -> Result<Tensor<B, 2, Int>> {
    ensure!(
        (0.0..=1.0).contains(&p),
        "token dropout probability must be in [0, 1], got {p}"
    );
    if p == 0.0 {
        return Ok(input_ids);
    }

    let [batch_size, seq_len] = input_ids.dims();
    let flags: Vec<bool> = (0..batch_size * seq_len)
        .map(|_| rng.gen_bool(p))
        .collect();

    let mask = Tensor::<B, 2, Bool>::from_data(
        TensorData::new(flags, [batch_size, seq_len]),
        &input_ids.device(),
    );
    Ok(input_ids.mask_fill(mask, pad_id as i32))
}
