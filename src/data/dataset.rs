use burn::data::dataset::Dataset;

use crate::data::loader::FeatureFileLoader;
use crate::domain::error::TrainError;
use crate::domain::feature::SignalFeature;

pub struct SignalFeatureDataset {
    samples: Vec<SignalFeature>,
}

impl SignalFeatureDataset {
    pub fn new(samples: Vec<SignalFeature>) -> Self { Self { samples } }

    /// Load and parse a feature file into memory.
    pub fn from_file(loader: &FeatureFileLoader) -> Result<Self, TrainError> {
        loader.load().map(Self::new)
    }

    pub fn positive_count(&self) -> usize {
        self.samples.iter().filter(|s| s.is_positive()).count()
    }
}

impl Dataset<SignalFeature> for SignalFeatureDataset {
    fn get(&self, index: usize) -> Option<SignalFeature> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
