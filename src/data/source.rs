// ============================================================
// Layer 4 — Loader-backed Batch Source
// ============================================================
// Wraps a Burn DataLoader so the training loop sees only the
// BatchSource trait. Each `iter()` is a fresh pass; with
// shuffling enabled Burn draws a new permutation per pass.

use std::sync::Arc;

use burn::data::{
    dataloader::{DataLoader, DataLoaderBuilder},
    dataset::Dataset,
};
use burn::prelude::*;

use crate::data::batcher::{FeatureBatch, FeatureBatcher};
use crate::data::dataset::SignalFeatureDataset;
use crate::domain::traits::BatchSource;

pub struct LoaderSource<B: Backend> {
    loader: Arc<dyn DataLoader<B, FeatureBatch<B>>>,
    batches: usize,
}

impl<B: Backend> LoaderSource<B> {
    /// Shuffled, single-worker loader over `dataset`.
    pub fn shuffled(
        dataset: SignalFeatureDataset,
        batch_size: usize,
        seed: u64,
        device: B::Device,
    ) -> Self {
        let batches = dataset.len().div_ceil(batch_size);
        let loader = DataLoaderBuilder::new(FeatureBatcher::<B>::new(device))
            .batch_size(batch_size)
            .shuffle(seed)
            .num_workers(1)
            .build(dataset);
        Self { loader, batches }
    }
}

impl<B: Backend> BatchSource for LoaderSource<B> {
    type Batch = FeatureBatch<B>;

    fn num_batches(&self) -> usize {
        self.batches
    }

    fn iter(&self) -> Box<dyn Iterator<Item = FeatureBatch<B>> + '_> {
        Box::new(self.loader.iter())
    }
}
