use burn::{
    nn::{
        attention::generate_autoregressive_mask,
        transformer::{
            TransformerDecoder, TransformerDecoderConfig, TransformerDecoderInput,
            TransformerEncoder, TransformerEncoderConfig, TransformerEncoderInput,
        },
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::{activation::log_softmax, Distribution},
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct Seq2SeqConfig {
    pub vocab_size:         usize,
    pub d_model:            usize,
    pub num_heads:          usize,
    pub num_encoder_layers: usize,
    pub num_decoder_layers: usize,
    pub d_ff:               usize,
    pub dropout:            f64,
    pub pad_token_id:       usize,
    /// Longest sequence either side of the model can see
    #[config(default = 512)]
    pub max_positions:      usize,
}

impl Seq2SeqConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Seq2SeqModel<B> {
        let token_embedding    = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_positions, self.d_model).init(device);
        let encoder = TransformerEncoderConfig::new(
            self.d_model, self.d_ff, self.num_heads, self.num_encoder_layers,
        )
        .with_dropout(self.dropout)
        .with_norm_first(true)
        .init(device);
        let decoder = TransformerDecoderConfig::new(
            self.d_model, self.d_ff, self.num_heads, self.num_decoder_layers,
        )
        .with_dropout(self.dropout)
        .with_norm_first(true)
        .init(device);
        let output  = LinearConfig::new(self.d_model, self.vocab_size).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();

        Seq2SeqModel {
            token_embedding, position_embedding, encoder, decoder, output, dropout,
            pad_token_id:  self.pad_token_id,
            max_positions: self.max_positions,
        }
    }
}

/// Encoder-decoder transformer. Token and position embeddings
/// are shared between the encoder and decoder sides.
#[derive(Module, Debug)]
pub struct Seq2SeqModel<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub encoder:            TransformerEncoder<B>,
    pub decoder:            TransformerDecoder<B>,
    pub output:             Linear<B>,
    pub dropout:            Dropout,
    pub pad_token_id:       usize,
    pub max_positions:      usize,
}

impl<B: Backend> Seq2SeqModel<B> {
    /// ids: [batch, len] → [batch, len, d_model]
    fn embed(&self, ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch_size, seq_len] = ids.dims();
        let tok_emb = self.token_embedding.forward(ids);

        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &tok_emb.device())
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);

        self.dropout.forward(tok_emb + pos_emb)
    }

    /// src: [batch, src_len] → memory: [batch, src_len, d_model]
    pub fn encode(&self, src: Tensor<B, 2, Int>, src_padding_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let x = self.embed(src);
        self.encoder.forward(TransformerEncoderInput::new(x).mask_pad(src_padding_mask))
    }

    /// Causal decoder pass. tgt: [batch, len] → logits: [batch, len, vocab]
    pub fn decode(
        &self,
        tgt:                 Tensor<B, 2, Int>,
        memory:              Tensor<B, 3>,
        memory_padding_mask: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 3> {
        let [batch_size, seq_len] = tgt.dims();
        let device     = tgt.device();
        let target_pad = tgt.clone().equal_elem(self.pad_token_id as i32);
        let causal     = generate_autoregressive_mask::<B>(batch_size, seq_len, &device);

        let x = self.embed(tgt);
        let input = TransformerDecoderInput::new(x, memory)
            .target_mask_pad(target_pad)
            .target_mask_attn(causal)
            .memory_mask_pad(memory_padding_mask);

        self.output.forward(self.decoder.forward(input))
    }

    /// Full forward pass.
    ///
    /// The decoder reads `tgt[:, ..len-1]`, so the returned logits
    /// `[batch, tgt_len - 1, vocab]` line up with `tgt[:, 1..]`.
    ///
    /// With a teacher-forcing ratio below 1 the decoder input is
    /// mixed: a first pass predicts every position, then each
    /// input token after the start token keeps the ground truth
    /// with probability `ratio` and otherwise takes the model's
    /// own prediction for that slot. Pad slots always keep the
    /// ground truth. `None` means pure ground-truth feeding.
    pub fn forward(
        &self,
        src:                   Tensor<B, 2, Int>,
        tgt:                   Tensor<B, 2, Int>,
        src_padding_mask:      Tensor<B, 2, Bool>,
        teacher_forcing_ratio: Option<f64>,
    ) -> Tensor<B, 3> {
        let [batch_size, tgt_len] = tgt.dims();
        let dec_len       = tgt_len - 1;
        let decoder_input = tgt.slice([0..batch_size, 0..dec_len]);

        let memory = self.encode(src, src_padding_mask.clone());
        let logits = self.decode(decoder_input.clone(), memory.clone(), src_padding_mask.clone());

        let ratio = teacher_forcing_ratio.unwrap_or(1.0).clamp(0.0, 1.0);
        if ratio >= 1.0 || dec_len < 2 {
            return logits;
        }

        let predicted = logits.detach().argmax(2).squeeze::<2>(2);
        let mixed     = scheduled_decoder_input(decoder_input, predicted, ratio, self.pad_token_id);
        self.decode(mixed, memory, src_padding_mask)
    }

    /// Greedy autoregressive generation.
    ///
    /// Returns ids `[batch, n]` starting with `bos_id`, where `n - 1`
    /// is at most `max_len`. Stops early once every row has emitted
    /// `eos_id`; tokens after a row's first `eos_id` are meaningless.
    pub fn greedy_decode(
        &self,
        src:              Tensor<B, 2, Int>,
        src_padding_mask: Tensor<B, 2, Bool>,
        bos_id:           u32,
        eos_id:           u32,
        max_len:          usize,
    ) -> Tensor<B, 2, Int> {
        let [batch_size, _] = src.dims();
        let device = src.device();
        let memory = self.encode(src, src_padding_mask.clone());

        let mut generated = Tensor::<B, 2, Int>::full([batch_size, 1], bos_id as i32, &device);
        let mut finished  = vec![false; batch_size];
        let steps = max_len.min(self.max_positions.saturating_sub(1));

        for _ in 0..steps {
            let len    = generated.dims()[1];
            let logits = self.decode(generated.clone(), memory.clone(), src_padding_mask.clone());
            let [_, _, vocab] = logits.dims();
            let next = logits
                .slice([0..batch_size, len - 1..len, 0..vocab])
                .argmax(2)
                .reshape([batch_size, 1]);

            let next_ids: Vec<i64> = next.to_data().iter::<i64>().collect();
            for (done, id) in finished.iter_mut().zip(next_ids) {
                *done |= id == eos_id as i64;
            }

            generated = Tensor::cat(vec![generated, next], 1);
            if finished.iter().all(|&d| d) {
                break;
            }
        }
        generated
    }
}

/// Decoder input for the second scheduled-sampling pass.
///
/// `predicted` is the first pass's argmax `[batch, dec_len]`; the
/// prediction made at position t-1 is the candidate for slot t.
/// Each slot keeps the ground truth with probability `ratio`.
/// Slot 0 and pad slots always keep it.
pub fn scheduled_decoder_input<B: Backend>(
    decoder_input: Tensor<B, 2, Int>,
    predicted:     Tensor<B, 2, Int>,
    ratio:         f64,
    pad_id:        usize,
) -> Tensor<B, 2, Int> {
    let [batch_size, dec_len] = decoder_input.dims();
    if dec_len < 2 {
        return decoder_input;
    }
    let candidates = Tensor::cat(
        vec![
            decoder_input.clone().slice([0..batch_size, 0..1]),
            predicted.slice([0..batch_size, 0..dec_len - 1]),
        ],
        1,
    );

    let device = decoder_input.device();
    let is_pad = decoder_input.clone().equal_elem(pad_id as i32).float();
    let keep_truth = Tensor::<B, 2>::random(
        [batch_size, dec_len], Distribution::Bernoulli(ratio.clamp(0.0, 1.0)), &device,
    )
    .add(is_pad)
    .greater_elem(0.5);

    candidates.mask_where(keep_truth, decoder_input)
}

/// Mean token cross-entropy of `logits` [batch, tgt_len-1, vocab]
/// against `labels[:, 1..]`. Pad targets are left out of both the
/// sum and the count; a batch with no real target yields 0.
pub fn sequence_cross_entropy<B: Backend>(
    logits: Tensor<B, 3>,
    labels: Tensor<B, 2, Int>,
    pad_id: usize,
) -> Tensor<B, 1> {
    let [batch_size, steps, _] = logits.dims();
    let [_, tgt_len] = labels.dims();
    let targets = labels.slice([0..batch_size, 1..tgt_len]);

    let nll = log_softmax(logits, 2)
        .gather(2, targets.clone().reshape([batch_size, steps, 1]))
        .reshape([batch_size, steps])
        .neg();
    let real = targets.equal_elem(pad_id as i32).bool_not().float();

    let count = real.clone().sum().clamp_min(1.0);
    (nll * real).sum() / count
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    pub(crate) type TestBackend = NdArray;
    pub(crate) type TestAutodiffBackend = Autodiff<NdArray>;

    pub(crate) fn tiny_config(vocab_size: usize) -> Seq2SeqConfig {
        Seq2SeqConfig::new(vocab_size, 16, 2, 1, 1, 32, 0.0, 1).with_max_positions(64)
    }

    fn ids(rows: &[[i32; 4]]) -> Tensor<TestBackend, 2, Int> {
        let flat: Vec<i32> = rows.iter().flatten().copied().collect();
        Tensor::<TestBackend, 1, Int>::from_ints(flat.as_slice(), &Default::default())
            .reshape([rows.len(), 4])
    }

    fn no_padding(batch: usize, len: usize) -> Tensor<TestBackend, 2, Bool> {
        Tensor::<TestBackend, 2, Int>::zeros([batch, len], &Default::default()).equal_elem(1)
    }

    #[test]
    fn test_forward_shape_matches_shifted_labels() {
        let model: Seq2SeqModel<TestBackend> = tiny_config(20).init(&Default::default());
        let src = ids(&[[5, 6, 7, 2], [8, 9, 2, 1]]);
        let tgt = ids(&[[0, 5, 6, 2], [0, 8, 2, 1]]);

        for ratio in [None, Some(1.0), Some(0.5), Some(0.0)] {
            let logits = model.forward(src.clone(), tgt.clone(), no_padding(2, 4), ratio);
            assert_eq!(logits.dims(), [2, 3, 20]);
        }
    }

    #[test]
    fn test_loss_is_finite_and_positive() {
        let model: Seq2SeqModel<TestBackend> = tiny_config(20).init(&Default::default());
        let src = ids(&[[5, 6, 7, 2]]);
        let tgt = ids(&[[0, 5, 2, 1]]);

        let logits = model.forward(src, tgt.clone(), no_padding(1, 4), None);
        let loss: f64 = sequence_cross_entropy(logits, tgt, 1).into_scalar().elem();
        assert!(loss.is_finite() && loss > 0.0);
    }

    #[test]
    fn test_padding_does_not_change_loss() {
        // Uniform logits: every real target costs ln(vocab)
        let device = Default::default();
        let short  = Tensor::<TestBackend, 3>::zeros([1, 1, 10], &device);
        let padded = Tensor::<TestBackend, 3>::zeros([1, 3, 10], &device);
        let labels_short  = Tensor::<TestBackend, 1, Int>::from_ints([0, 5], &device).reshape([1, 2]);
        let labels_padded = Tensor::<TestBackend, 1, Int>::from_ints([0, 5, 1, 1], &device).reshape([1, 4]);

        let a: f64 = sequence_cross_entropy(short, labels_short, 1).into_scalar().elem();
        let b: f64 = sequence_cross_entropy(padded, labels_padded, 1).into_scalar().elem();
        assert!((a - 10f64.ln()).abs() < 1e-5, "{a}");
        assert!((a - b).abs() < 1e-5, "{a} vs {b}");
    }

    #[test]
    fn test_all_pad_targets_give_zero_loss() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 3>::zeros([1, 2, 10], &device);
        let labels = Tensor::<TestBackend, 1, Int>::from_ints([0, 1, 1], &device).reshape([1, 3]);
        let loss: f64 = sequence_cross_entropy(logits, labels, 1).into_scalar().elem();
        assert_eq!(loss, 0.0);
    }

    fn int_vec(t: Tensor<TestBackend, 2, Int>) -> Vec<i64> {
        t.into_data().iter::<i64>().collect()
    }

    #[test]
    fn test_scheduled_input_zero_ratio_uses_shifted_predictions() {
        let truth     = ids(&[[0, 5, 6, 1], [0, 8, 9, 7]]);
        let predicted = ids(&[[7, 8, 9, 4], [3, 4, 5, 6]]);

        let mixed = scheduled_decoder_input(truth, predicted, 0.0, 1);
        // slot 0 keeps <s>, pad slot keeps <pad>, the rest take prediction t-1
        assert_eq!(int_vec(mixed), vec![0, 7, 8, 1, 0, 3, 4, 5]);
    }

    #[test]
    fn test_scheduled_input_full_ratio_is_ground_truth() {
        let truth     = ids(&[[0, 5, 6, 1]]);
        let predicted = ids(&[[7, 8, 9, 4]]);
        let mixed = scheduled_decoder_input(truth.clone(), predicted, 1.0, 1);
        assert_eq!(int_vec(mixed), int_vec(truth));
    }

    #[test]
    fn test_greedy_decode_respects_max_len() {
        let model: Seq2SeqModel<TestBackend> = tiny_config(20).init(&Default::default());
        let out = model.greedy_decode(ids(&[[5, 6, 7, 2]]), no_padding(1, 4), 0, 2, 6);

        let [batch, len] = out.dims();
        assert_eq!(batch, 1);
        assert!(len >= 2 && len <= 7);
        let first: Vec<i64> = out.into_data().iter::<i64>().take(1).collect();
        assert_eq!(first, vec![0]);
    }
}
