use burn::{
    nn::{Embedding, EmbeddingConfig, Linear, LinearConfig, Lstm, LstmConfig, LstmState},
    prelude::*,
    tensor::activation,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct CaptionModelConfig {
    pub vocab_size: usize,
    pub pad_idx: usize,
    pub img_embed_size: usize,
    pub img_bottleneck: usize,
    pub word_embed_size: usize,
    pub lstm_units: usize,
    pub logit_bottleneck: usize,
}

impl CaptionModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> CaptionModel<B> {
        CaptionModel {
            // image embedding -> bottleneck, keeps the parameter count down
            img_to_bottleneck: LinearConfig::new(self.img_embed_size, self.img_bottleneck)
                .init(device),
            // bottleneck -> initial LSTM state
            bottleneck_to_state: LinearConfig::new(self.img_bottleneck, self.lstm_units)
                .init(device),
            word_embed: EmbeddingConfig::new(self.vocab_size, self.word_embed_size).init(device),
            lstm: LstmConfig::new(self.word_embed_size, self.lstm_units, true).init(device),
            // LSTM output -> logits bottleneck -> next-token logits
            logits_bottleneck: LinearConfig::new(self.lstm_units, self.logit_bottleneck)
                .init(device),
            token_logits: LinearConfig::new(self.logit_bottleneck, self.vocab_size).init(device),
            pad_idx: self.pad_idx,
        }
    }
}

/// Encoder-to-decoder captioning model: a learned projection of
/// the image embedding conditions the initial LSTM state, and
/// the LSTM predicts the next token at every position.
#[derive(Module, Debug)]
pub struct CaptionModel<B: Backend> {
    pub img_to_bottleneck: Linear<B>,
    pub bottleneck_to_state: Linear<B>,
    pub word_embed: Embedding<B>,
    pub lstm: Lstm<B>,
    pub logits_bottleneck: Linear<B>,
    pub token_logits: Linear<B>,
    pub pad_idx: usize,
}

impl<B: Backend> CaptionModel<B> {
    /// Condition the decoder on an image: the projected embedding
    /// becomes both the initial cell and hidden state.
    pub fn init_state(&self, img_embeds: Tensor<B, 2>) -> LstmState<B, 2> {
        let bottleneck = activation::gelu(self.img_to_bottleneck.forward(img_embeds));
        let h0 = activation::gelu(self.bottleneck_to_state.forward(bottleneck));
        LstmState::new(h0.clone(), h0)
    }

    /// Teacher-forced training pass over a whole batch.
    ///
    /// `tokens` is [batch, seq_len] with start/end markers and pad
    /// filler. Inputs are tokens[:, :-1], targets tokens[:, 1:].
    ///
    /// Loss = sum(cross_entropy * mask) / sum(mask), where
    /// mask = (target != pad). The mean runs over non-pad tokens
    /// only — normalising by the raw token count would dilute the
    /// loss with padding. A batch with nothing but padding has no
    /// defined mean; that case yields an exact zero loss.
    pub fn forward_training(
        &self,
        img_embeds: Tensor<B, 2>,
        tokens: Tensor<B, 2, Int>,
    ) -> Tensor<B, 1> {
        let [batch_size, seq_len] = tokens.dims();
        let device = tokens.device();

        // Need at least one (input, target) position
        if seq_len < 2 {
            return Tensor::zeros([1], &device);
        }

        let inputs = tokens.clone().slice([0..batch_size, 0..seq_len - 1]);
        let targets = tokens.slice([0..batch_size, 1..seq_len]);

        // Ground-truth tokens as context for next-token prediction:
        // all hidden states come out of one LSTM pass.
        let state = self.init_state(img_embeds);
        let word_embeds = self.word_embed.forward(inputs);
        let (hidden, _) = self.lstm.forward(word_embeds, Some(state));

        let [n, t, units] = hidden.dims();
        let flat_hidden = hidden.reshape([n * t, units]);
        let flat_logits = self.token_logits.forward(activation::gelu(
            self.logits_bottleneck.forward(flat_hidden),
        ));
        let flat_targets = targets.reshape([n * t]);

        // 1.0 for real tokens, 0.0 for padding — padding exists
        // for batching only and must not contribute to the loss
        let mask = flat_targets
            .clone()
            .not_equal_elem(self.pad_idx as i32)
            .float();

        let mask_sum: f32 = mask.clone().sum().into_scalar().elem();
        if mask_sum == 0.0 {
            // Degenerate all-pad batch: the masked mean is undefined,
            // so the loss is defined to be exactly zero.
            return Tensor::zeros([1], &device);
        }

        let log_probs = activation::log_softmax(flat_logits, 1);
        let xent = log_probs
            .gather(1, flat_targets.unsqueeze_dim::<2>(1))
            .reshape([n * t])
            .neg();

        (xent * mask.clone()).sum() / mask.sum()
    }

    /// One autoregressive decoding step.
    ///
    /// `tokens` is [batch] — the token chosen at the previous
    /// step (or the start token). Returns next-token logits
    /// [batch, vocab] and the advanced LSTM state.
    pub fn decode_step(
        &self,
        state: LstmState<B, 2>,
        tokens: Tensor<B, 1, Int>,
    ) -> (Tensor<B, 2>, LstmState<B, 2>) {
        let word_embeds = self.word_embed.forward(tokens.unsqueeze_dim::<2>(1));
        let (hidden, state) = self.lstm.forward(word_embeds, Some(state));

        let [n, _, units] = hidden.dims();
        let logits = self.token_logits.forward(activation::gelu(
            self.logits_bottleneck.forward(hidden.reshape([n, units])),
        ));
        (logits, state)
    }
}
