// ============================================================
// Layer 4 — Feature Batcher
// ============================================================
// Implements Burn's Batcher trait to stack SignalFeatures into
// device tensors.
//
//   Input:  Vec of N SignalFeatures (seq_len S, signal_len L)
//   Output: FeatureBatch with
//             kmer              [N, S]     Int
//             base_means        [N, S]
//             base_stds         [N, S]
//             base_signal_lens  [N, S]
//             signals           [N, S, L]
//             labels            [N]        Int
//
// Every sample in a file has the same S and L (the loader
// rejects anything else), so batching is flatten + reshape.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::feature::SignalFeature;

#[derive(Debug, Clone)]
pub struct FeatureBatch<B: Backend> {
    /// Tab-joined sample info, one per row
    pub sample_ids: Vec<String>,
    pub kmer: Tensor<B, 2, Int>,
    pub base_means: Tensor<B, 2>,
    pub base_stds: Tensor<B, 2>,
    pub base_signal_lens: Tensor<B, 2>,
    pub signals: Tensor<B, 3>,
    pub labels: Tensor<B, 1, Int>,
}

impl<B: Backend> FeatureBatch<B> {
    pub fn len(&self) -> usize {
        self.sample_ids.len()
    }
}

/// Holds the target device so tensors land on the selected backend.
#[derive(Clone, Debug)]
pub struct FeatureBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> FeatureBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<B, SignalFeature, FeatureBatch<B>> for FeatureBatcher<B> {
    fn batch(&self, items: Vec<SignalFeature>, _device: &B::Device) -> FeatureBatch<B> {
        let batch_size = items.len();
        let seq_len = items[0].seq_len();
        let signal_len = items[0].signals.len() / seq_len.max(1);

        let kmer: Vec<i32> = items
            .iter()
            .flat_map(|s| s.kmer.iter().map(|&b| b as i32))
            .collect();
        let means: Vec<f32> = items.iter().flat_map(|s| s.base_means.iter().copied()).collect();
        let stds: Vec<f32> = items.iter().flat_map(|s| s.base_stds.iter().copied()).collect();
        let lens: Vec<f32> = items
            .iter()
            .flat_map(|s| s.base_signal_lens.iter().map(|&l| l as f32))
            .collect();
        let signals: Vec<f32> = items.iter().flat_map(|s| s.signals.iter().copied()).collect();
        let labels: Vec<i32> = items.iter().map(|s| s.label as i32).collect();

        let kmer = Tensor::<B, 1, Int>::from_ints(kmer.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);
        let base_means = Tensor::<B, 1>::from_floats(means.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);
        let base_stds = Tensor::<B, 1>::from_floats(stds.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);
        let base_signal_lens = Tensor::<B, 1>::from_floats(lens.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);
        let signals = Tensor::<B, 1>::from_floats(signals.as_slice(), &self.device)
            .reshape([batch_size, seq_len, signal_len]);
        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        FeatureBatch {
            sample_ids: items.into_iter().map(|s| s.sample_id).collect(),
            kmer,
            base_means,
            base_stds,
            base_signal_lens,
            signals,
            labels,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) type TestBackend = burn::backend::NdArray;

    /// A seq_len=3, signal_len=2 sample.
    pub(crate) fn sample(label: u8) -> SignalFeature {
        SignalFeature {
            sample_id: format!("read-{label}"),
            kmer: vec![0, 1, 4],
            base_means: vec![0.5, -0.2, 0.1],
            base_stds: vec![0.1, 0.2, 0.3],
            base_signal_lens: vec![4, 8, 6],
            signals: vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
            label,
        }
    }

    #[test]
    fn stacks_samples_into_batch_shapes() {
        let batcher = FeatureBatcher::<TestBackend>::new(Default::default());
        let batch = batcher.batch(vec![sample(0), sample(1)], &batcher.device);

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.kmer.dims(), [2, 3]);
        assert_eq!(batch.base_means.dims(), [2, 3]);
        assert_eq!(batch.base_signal_lens.dims(), [2, 3]);
        assert_eq!(batch.signals.dims(), [2, 3, 2]);
        assert_eq!(batch.labels.dims(), [2]);

        let labels = batch.labels.into_data().convert::<i64>().to_vec::<i64>().unwrap();
        assert_eq!(labels, vec![0, 1]);
    }
}
