use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{gelu, softmax},
};

use crate::domain::error::TrainError;
use crate::domain::feature::BASE_VOCAB;
use crate::domain::traits::Mode;

/// Per-base statistics fed to the sequence branch: mean, std, signal length.
const BASE_STATS: usize = 3;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct EncoderClassifierConfig {
    pub seq_len:      usize,
    pub signal_len:   usize,
    pub d_model:      usize,
    pub n_head:       usize,
    pub d_ff:         usize,
    pub layer_num:    usize,
    pub class_num:    usize,
    pub dropout_rate: f64,
    pub use_seq:      bool,
    pub use_signal:   bool,
}

impl EncoderClassifierConfig {
    pub fn validate(&self) -> Result<(), TrainError> {
        let fail = |msg: String| Err(TrainError::Configuration(msg));
        if !self.use_seq && !self.use_signal {
            return fail("at least one of is_seq / is_signal must be enabled".into());
        }
        if self.seq_len == 0 || self.signal_len == 0 {
            return fail("seq_len and signal_len must be positive".into());
        }
        if self.n_head == 0 || self.d_model % self.n_head != 0 {
            return fail(format!("d_model ({}) must be divisible by n_head ({})", self.d_model, self.n_head));
        }
        if self.class_num < 2 {
            return fail(format!("class_num must be at least 2, got {}", self.class_num));
        }
        if !(0.0..1.0).contains(&self.dropout_rate) {
            return fail(format!("dropout_rate must be in [0, 1), got {}", self.dropout_rate));
        }
        Ok(())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> EncoderClassifier<B> {
        let seq_module = self.use_seq.then(|| SeqModule {
            kmer_embedding: EmbeddingConfig::new(BASE_VOCAB, self.d_model).init(device),
            stats_proj:     LinearConfig::new(BASE_STATS, self.d_model).init(device),
            position:       EmbeddingConfig::new(self.seq_len, self.d_model).init(device),
            layers:         self.build_encoder_blocks(device),
            dropout:        DropoutConfig::new(self.dropout_rate).init(),
        });
        let signal_module = self.use_signal.then(|| SignalModule {
            signal_proj: LinearConfig::new(self.signal_len, self.d_model).init(device),
            position:    EmbeddingConfig::new(self.seq_len, self.d_model).init(device),
            layers:      self.build_encoder_blocks(device),
            dropout:     DropoutConfig::new(self.dropout_rate).init(),
        });
        let branches = usize::from(self.use_seq) + usize::from(self.use_signal);

        EncoderClassifier {
            seq_module,
            signal_module,
            dropout: DropoutConfig::new(self.dropout_rate).init(),
            head:    LinearConfig::new(self.d_model * branches, self.class_num).init(device),
        }
    }

    fn build_encoder_blocks<B: Backend>(&self, device: &B::Device) -> Vec<EncoderBlock<B>> {
        (0..self.layer_num)
            .map(|_| EncoderBlock {
                // attention dropout stays off; the block applies its own,
                // gated by Mode, to the attention output
                self_attn: MultiHeadAttentionConfig::new(self.d_model, self.n_head)
                    .with_dropout(0.0)
                    .init(device),
                ffn_linear1: LinearConfig::new(self.d_model, self.d_ff).init(device),
                ffn_linear2: LinearConfig::new(self.d_ff, self.d_model).init(device),
                norm1:   LayerNormConfig::new(self.d_model).init(device),
                norm2:   LayerNormConfig::new(self.d_model).init(device),
                dropout: DropoutConfig::new(self.dropout_rate).init(),
            })
            .collect()
    }
}

fn regularize<B: Backend, const D: usize>(dropout: &Dropout, x: Tensor<B, D>, mode: Mode) -> Tensor<B, D> {
    match mode {
        Mode::Train => dropout.forward(x),
        Mode::Eval => x,
    }
}

fn positions<B: Backend>(batch_size: usize, seq_len: usize, device: &B::Device) -> Tensor<B, 2, Int> {
    Tensor::<B, 1, Int>::arange(0..seq_len as i64, device)
        .unsqueeze::<2>()
        .expand([batch_size, seq_len])
}

/// Dropout, encoder stack, then mean over the sequence: [b, s, d] → [b, d].
fn encode<B: Backend>(layers: &[EncoderBlock<B>], dropout: &Dropout, x: Tensor<B, 3>, mode: Mode) -> Tensor<B, 2> {
    let mut x = regularize(dropout, x, mode);
    for layer in layers {
        x = layer.forward(x, mode);
    }
    let [batch_size, _, d_model] = x.dims();
    x.mean_dim(1).reshape([batch_size, d_model])
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    pub fn forward(&self, x: Tensor<B, 3>, mode: Mode) -> Tensor<B, 3> {
        let attn_output = self.self_attn.forward(MhaInput::self_attn(x.clone())).context;
        let x = self.norm1.forward(x + regularize(&self.dropout, attn_output, mode));
        let ffn_out = self.ffn_linear2.forward(gelu(self.ffn_linear1.forward(x.clone())));
        self.norm2.forward(x + regularize(&self.dropout, ffn_out, mode))
    }
}

/// k-mer identity and per-base statistics.
#[derive(Module, Debug)]
pub struct SeqModule<B: Backend> {
    pub kmer_embedding: Embedding<B>,
    pub stats_proj:     Linear<B>,
    pub position:       Embedding<B>,
    pub layers:         Vec<EncoderBlock<B>>,
    pub dropout:        Dropout,
}

impl<B: Backend> SeqModule<B> {
    pub fn forward(
        &self,
        kmer:             Tensor<B, 2, Int>,
        base_means:       Tensor<B, 2>,
        base_stds:        Tensor<B, 2>,
        base_signal_lens: Tensor<B, 2>,
        mode:             Mode,
    ) -> Tensor<B, 2> {
        let [batch_size, seq_len] = kmer.dims();
        let device = kmer.device();

        // [b, s, 3]
        let stats = Tensor::cat(
            vec![
                base_means.unsqueeze_dim::<3>(2),
                base_stds.unsqueeze_dim::<3>(2),
                base_signal_lens.unsqueeze_dim::<3>(2),
            ],
            2,
        );
        let x = self.kmer_embedding.forward(kmer)
            + self.stats_proj.forward(stats)
            + self.position.forward(positions::<B>(batch_size, seq_len, &device));
        encode(&self.layers, &self.dropout, x, mode)
    }
}

/// Raw current windows, one token per base.
#[derive(Module, Debug)]
pub struct SignalModule<B: Backend> {
    pub signal_proj: Linear<B>,
    pub position:    Embedding<B>,
    pub layers:      Vec<EncoderBlock<B>>,
    pub dropout:     Dropout,
}

impl<B: Backend> SignalModule<B> {
    /// signals: [b, s, signal_len]
    pub fn forward(&self, signals: Tensor<B, 3>, mode: Mode) -> Tensor<B, 2> {
        let [batch_size, seq_len, _] = signals.dims();
        let device = signals.device();
        let x = self.signal_proj.forward(signals)
            + self.position.forward(positions::<B>(batch_size, seq_len, &device));
        encode(&self.layers, &self.dropout, x, mode)
    }
}

#[derive(Module, Debug)]
pub struct EncoderClassifier<B: Backend> {
    pub seq_module:    Option<SeqModule<B>>,
    pub signal_module: Option<SignalModule<B>>,
    pub dropout:       Dropout,
    pub head:          Linear<B>,
}

pub struct ClassifierOutput<B: Backend> {
    /// Raw class scores fed to cross-entropy, [batch, class_num]
    pub logits: Tensor<B, 2>,
    /// Softmax over classes, [batch, class_num]
    pub probs:  Tensor<B, 2>,
}

impl<B: Backend> EncoderClassifier<B> {
    pub fn forward(
        &self,
        kmer:             Tensor<B, 2, Int>,
        base_means:       Tensor<B, 2>,
        base_stds:        Tensor<B, 2>,
        base_signal_lens: Tensor<B, 2>,
        signals:          Tensor<B, 3>,
        mode:             Mode,
    ) -> ClassifierOutput<B> {
        let mut pooled = Vec::with_capacity(2);
        if let Some(seq) = &self.seq_module {
            pooled.push(seq.forward(kmer, base_means, base_stds, base_signal_lens, mode));
        }
        if let Some(signal) = &self.signal_module {
            pooled.push(signal.forward(signals, mode));
        }

        let x = regularize(&self.dropout, Tensor::cat(pooled, 1), mode);
        let logits = self.head.forward(x);
        let probs = softmax(logits.clone(), 1);
        ClassifierOutput { logits, probs }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::batcher::tests::{sample, TestBackend};
    use crate::data::batcher::FeatureBatcher;
    use burn::backend::ndarray::NdArrayDevice;
    use burn::data::dataloader::batcher::Batcher;

    pub(crate) fn tiny_config(use_seq: bool, use_signal: bool) -> EncoderClassifierConfig {
        EncoderClassifierConfig::new(3, 2, 8, 2, 16, 1, 2, 0.1, use_seq, use_signal)
    }

    #[test]
    fn forward_shapes_and_probabilities() {
        for (use_seq, use_signal) in [(true, true), (true, false), (false, true)] {
            let device = NdArrayDevice::Cpu;
            let model = tiny_config(use_seq, use_signal).init::<TestBackend>(&device);
            let batch = FeatureBatcher::<TestBackend>::new(device)
                .batch(vec![sample(0), sample(1), sample(1)], &device);

            let out = model.forward(
                batch.kmer,
                batch.base_means,
                batch.base_stds,
                batch.base_signal_lens,
                batch.signals,
                Mode::Eval,
            );

            assert_eq!(out.logits.dims(), [3, 2]);
            let row_sums = out.probs.sum_dim(1).into_data().to_vec::<f32>().unwrap();
            for s in row_sums {
                assert!((s - 1.0).abs() < 1e-5, "{s}");
            }
        }
    }

    #[test]
    fn eval_mode_is_deterministic_on_the_autodiff_backend() {
        type TrainBackend = burn::backend::Autodiff<TestBackend>;
        let device = NdArrayDevice::Cpu;
        let mut cfg = tiny_config(true, true);
        cfg.dropout_rate = 0.9;
        let model = cfg.init::<TrainBackend>(&device);

        let logits = || {
            let batch = FeatureBatcher::<TrainBackend>::new(device.clone())
                .batch(vec![sample(0), sample(1)], &device);
            model
                .forward(
                    batch.kmer,
                    batch.base_means,
                    batch.base_stds,
                    batch.base_signal_lens,
                    batch.signals,
                    Mode::Eval,
                )
                .logits
                .into_data()
                .to_vec::<f32>()
                .unwrap()
        };

        let first = logits();
        for _ in 0..5 {
            assert_eq!(logits(), first);
        }
    }

    #[test]
    fn validate_rejects_bad_shapes() {
        assert!(tiny_config(true, true).validate().is_ok());
        assert!(tiny_config(false, false).validate().is_err());

        let mut cfg = tiny_config(true, true);
        cfg.n_head = 3;
        assert!(cfg.validate().is_err());

        let mut cfg = tiny_config(true, true);
        cfg.class_num = 1;
        assert!(cfg.validate().is_err());

        let mut cfg = tiny_config(true, true);
        cfg.dropout_rate = 1.0;
        assert!(cfg.validate().is_err());
    }
}
