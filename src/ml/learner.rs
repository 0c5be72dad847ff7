// ============================================================
// Layer 5 — Burn Classifier Adapter
// ============================================================
// Binds EncoderClassifier, a Burn optimizer, the weighted
// cross-entropy loss and the StepDecay schedule behind the
// TrainableClassifier trait.
//
//   train_step  — forward (Mode::Train) on the autodiff backend,
//                 loss, backward, optimizer step at the current lr
//   evaluator   — model.valid(): a copy on the inner backend, no
//                 autodiff graph, forward runs in Mode::Eval
//   state_bytes — BinBytesRecorder, full precision
//
// Loss weights are [1, pos_weight] (any further classes get 1).
//
// Reference: Burn Book §5 (Training), Kingma & Ba (2015) Adam

use burn::{
    module::AutodiffModule,
    nn::loss::{CrossEntropyLoss, CrossEntropyLossConfig},
    optim::{GradientsParams, Optimizer},
    prelude::*,
    record::{BinBytesRecorder, FullPrecisionSettings, Recorder},
    tensor::{backend::AutodiffBackend, ElementConversion},
};

use crate::data::batcher::FeatureBatch;
use crate::domain::error::TrainError;
use crate::domain::state::BatchScore;
use crate::domain::traits::{Evaluator, Mode, TrainableClassifier};
use crate::ml::model::EncoderClassifier;
use crate::ml::scheduler::StepDecay;

/// `[1, pos_weight, 1, ...]`, one entry per class.
pub fn class_weights(class_num: usize, pos_weight: f64) -> Vec<f32> {
    let mut weights = vec![1.0f32; class_num];
    if let Some(w) = weights.get_mut(1) {
        *w = pos_weight as f32;
    }
    weights
}

fn weighted_cross_entropy<B: Backend>(weights: &[f32], device: &B::Device) -> CrossEntropyLoss<B> {
    CrossEntropyLossConfig::new()
        .with_weights(Some(weights.to_vec()))
        .init(device)
}

fn int_values<B: Backend>(tensor: Tensor<B, 1, Int>) -> Result<Vec<i64>, TrainError> {
    tensor
        .into_data()
        .convert::<i64>()
        .to_vec::<i64>()
        .map_err(|e| TrainError::Computation(format!("cannot read back tensor: {e:?}")))
}

pub struct BurnClassifier<B: AutodiffBackend, O> {
    model:         EncoderClassifier<B>,
    optim:         O,
    class_weights: Vec<f32>,
    schedule:      StepDecay,
}

impl<B, O> BurnClassifier<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<EncoderClassifier<B>, B>,
{
    pub fn new(model: EncoderClassifier<B>, optim: O, class_weights: Vec<f32>, schedule: StepDecay) -> Self {
        Self { model, optim, class_weights, schedule }
    }
}

impl<B, O> TrainableClassifier for BurnClassifier<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<EncoderClassifier<B>, B>,
{
    type Batch = FeatureBatch<B>;
    type Evaluator = BurnEvaluator<B::InnerBackend>;

    fn train_step(&mut self, batch: FeatureBatch<B>) -> Result<f64, TrainError> {
        let output = self.model.forward(
            batch.kmer,
            batch.base_means,
            batch.base_stds,
            batch.base_signal_lens,
            batch.signals,
            Mode::Train,
        );
        let loss = weighted_cross_entropy::<B>(&self.class_weights, &output.logits.device())
            .forward(output.logits, batch.labels);

        let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
        if !loss_val.is_finite() {
            return Err(TrainError::Computation(format!("training loss is {loss_val}")));
        }

        let grads = GradientsParams::from_grads(loss.backward(), &self.model);
        self.model = self.optim.step(self.schedule.lr(), self.model.clone(), grads);
        Ok(loss_val)
    }

    fn evaluator(&self) -> BurnEvaluator<B::InnerBackend> {
        BurnEvaluator {
            model:         self.model.valid(),
            class_weights: self.class_weights.clone(),
        }
    }

    fn decay_learning_rate(&mut self) {
        self.schedule.step();
    }

    fn learning_rate(&self) -> f64 {
        self.schedule.lr()
    }

    fn state_bytes(&self) -> Result<Vec<u8>, TrainError> {
        BinBytesRecorder::<FullPrecisionSettings>::new()
            .record(self.model.clone().into_record(), ())
            .map_err(|e| TrainError::Record(format!("{e:?}")))
    }
}

/// Frozen eval-mode copy of the model on the non-autodiff backend.
pub struct BurnEvaluator<B: Backend> {
    model:         EncoderClassifier<B>,
    class_weights: Vec<f32>,
}

impl<B: Backend> Evaluator for BurnEvaluator<B> {
    type Batch = FeatureBatch<B>;

    fn score(&self, batch: FeatureBatch<B>) -> Result<BatchScore, TrainError> {
        let output = self.model.forward(
            batch.kmer,
            batch.base_means,
            batch.base_stds,
            batch.base_signal_lens,
            batch.signals,
            Mode::Eval,
        );
        let loss: f64 = weighted_cross_entropy::<B>(&self.class_weights, &output.logits.device())
            .forward(output.logits, batch.labels.clone())
            .into_scalar()
            .elem::<f64>();

        // argmax(1) returns [batch, 1]; flatten to [batch] to line up with labels
        let predicted = int_values(output.probs.argmax(1).flatten::<1>(0, 1))?;
        let labels = int_values(batch.labels)?;

        Ok(BatchScore::from_predictions(loss, &labels, &predicted))
    }
}
