// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Wires one training run together, in order:
//
//   Step 1: Validate the configuration       (before any I/O)
//           and resolve the compute device once (Layer 5 - ml)
//   Step 2: Read train + valid feature files (Layer 4 - data)
//   Step 3: Prepare the model dir            (Layer 6 - infra)
//           purge stale checkpoints, save config, open CSV log
//   Step 4: Dispatch on the resolved device
//   Step 5: Build model, optimizer, loaders  (Layer 5 - ml)
//   Step 6: Run the training loop            (Layer 5 - ml)
//
// Nothing below Step 4 branches on the device: train_on is
// generic over the AutodiffBackend picked there.
//
// Reference: Burn Book §5 (Training)

use std::time::Instant;

use anyhow::{Context, Result};
use burn::{data::dataset::Dataset, optim::AdamConfig, tensor::backend::AutodiffBackend};
use serde::{Deserialize, Serialize};

use crate::data::{dataset::SignalFeatureDataset, loader::FeatureFileLoader, source::LoaderSource};
use crate::domain::error::TrainError;
use crate::domain::state::RunOutcome;
use crate::infra::{checkpoint::CheckpointManager, metrics::ValidationLogger};
use crate::ml::{
    device::{
        resolve_device, wgpu_adapter_available, AcceleratorBackend, ComputeDevice, CpuBackend,
        DeviceChoice,
    },
    learner::{class_weights, BurnClassifier},
    model::EncoderClassifierConfig,
    scheduler::StepDecay,
    trainer::{LoopConfig, TrainingOrchestrator},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Every option of a run. Serialised to train_config.json next to
// the checkpoints so a checkpoint can be matched with the
// hyper-parameters that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub train_file:     String,
    pub valid_file:     String,
    pub model_dir:      String,

    pub seq_len:        usize,
    pub signal_len:     usize,
    pub d_model:        usize,
    pub n_head:         usize,
    pub d_ff:           usize,
    pub layer_num:      usize,
    pub class_num:      usize,
    pub dropout_rate:   f64,
    pub is_seq:         bool,
    pub is_signal:      bool,

    pub batch_size:     usize,
    pub lr:             f64,
    pub max_epoch_num:  usize,
    pub min_epoch_num:  usize,
    pub step_interval:  usize,
    pub pos_weight:     f64,
    pub seed:           u64,
    pub lr_decay_step:  usize,
    pub lr_decay_gamma: f64,
    pub device:         DeviceChoice,

    /// Recorded with the run; nothing writes there.
    pub tmpdir:         String,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            train_file:     String::new(),
            valid_file:     String::new(),
            model_dir:      String::new(),
            seq_len:        11,
            signal_len:     128,
            d_model:        256,
            n_head:         4,
            d_ff:           512,
            layer_num:      3,
            class_num:      2,
            dropout_rate:   0.5,
            is_seq:         true,
            is_signal:      true,
            batch_size:     512,
            lr:             0.001,
            max_epoch_num:  10,
            min_epoch_num:  5,
            step_interval:  100,
            pos_weight:     1.0,
            seed:           1234,
            lr_decay_step:  2,
            lr_decay_gamma: 0.1,
            device:         DeviceChoice::Auto,
            tmpdir:         "/tmp".to_string(),
        }
    }
}

impl TrainConfig {
    pub fn model_config(&self) -> EncoderClassifierConfig {
        EncoderClassifierConfig::new(
            self.seq_len,
            self.signal_len,
            self.d_model,
            self.n_head,
            self.d_ff,
            self.layer_num,
            self.class_num,
            self.dropout_rate,
            self.is_seq,
            self.is_signal,
        )
    }

    pub fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            max_epoch_num: self.max_epoch_num,
            min_epoch_num: self.min_epoch_num,
            step_interval: self.step_interval,
        }
    }

    /// Reject option combinations that would fail mid-run.
    /// `min_epoch_num > max_epoch_num` is allowed: early stopping simply
    /// never fires.
    pub fn validate(&self) -> Result<(), TrainError> {
        let fail = |msg: &str| Err(TrainError::Configuration(msg.to_string()));
        if self.batch_size == 0 {
            return fail("batch_size must be at least 1");
        }
        if self.step_interval == 0 {
            return fail("step_interval must be at least 1");
        }
        if self.lr_decay_step == 0 {
            return fail("lr_decay_step must be at least 1");
        }
        if !(self.lr > 0.0 && self.lr.is_finite()) {
            return fail("lr must be a positive number");
        }
        if !(self.pos_weight > 0.0 && self.pos_weight.is_finite()) {
            return fail("pos_weight must be a positive number");
        }
        self.model_config().validate()
    }

    /// One `name: value` entry per option, sorted by name.
    pub fn display(&self) -> String {
        let mut out = String::from("# ===============================================\n## parameters:\n");
        if let Ok(serde_json::Value::Object(fields)) = serde_json::to_value(self) {
            for (name, value) in fields {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                out.push_str(&format!("{name}:\n\t{value}\n"));
            }
        }
        out.push_str("# ===============================================");
        out
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<RunOutcome> {
        let cfg = &self.config;
        let total_start = Instant::now();

        // ── Step 1: Validate ──────────────────────────────────────────────────
        cfg.validate().context("Invalid training configuration")?;

        println!("[train]start..");
        let device = resolve_device(cfg.device, || {
            let available = wgpu_adapter_available();
            println!("{}", if available { "GPU is available!" } else { "GPU is not available!" });
            available
        })?;
        println!("{}", device.describe());

        // ── Step 2: Read feature files ────────────────────────────────────────
        println!("reading data..");
        let train_dataset = read_dataset(&cfg.train_file, cfg)?;
        let valid_dataset = read_dataset(&cfg.valid_file, cfg)?;
        tracing::info!(
            "Loaded {} train samples ({} positive), {} valid samples ({} positive)",
            train_dataset.len(),
            train_dataset.positive_count(),
            valid_dataset.len(),
            valid_dataset.positive_count(),
        );

        // ── Step 3: Model dir ─────────────────────────────────────────────────
        let checkpoints = CheckpointManager::prepare(&cfg.model_dir)
            .with_context(|| format!("Cannot prepare model dir '{}'", cfg.model_dir))?;
        checkpoints.save_config(cfg)?;
        let logger = ValidationLogger::create(checkpoints.dir())?;
        tracing::info!("Checkpoints go to '{}'", checkpoints.dir().display());

        // ── Steps 4-6: Device dispatch, then train ────────────────────────────
        let outcome = match device {
            ComputeDevice::Accelerator => train_on::<AcceleratorBackend>(
                cfg,
                train_dataset,
                valid_dataset,
                &checkpoints,
                &logger,
                Default::default(),
            )?,
            ComputeDevice::Cpu => train_on::<CpuBackend>(
                cfg,
                train_dataset,
                valid_dataset,
                &checkpoints,
                &logger,
                Default::default(),
            )?,
        };

        println!(
            "[train]training cost {} seconds",
            total_start.elapsed().as_secs_f64()
        );
        Ok(outcome)
    }
}

fn read_dataset(path: &str, cfg: &TrainConfig) -> Result<SignalFeatureDataset> {
    let loader = FeatureFileLoader::new(path, cfg.seq_len, cfg.signal_len);
    SignalFeatureDataset::from_file(&loader)
        .with_context(|| format!("Failed to read feature file '{path}'"))
}

/// Build model, optimizer and loaders on backend `B` and run the loop.
/// Validation batches live on `B::InnerBackend`, matching the
/// autodiff-free copy returned by `model.valid()`.
fn train_on<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    train_dataset: SignalFeatureDataset,
    valid_dataset: SignalFeatureDataset,
    checkpoints:   &CheckpointManager,
    logger:        &ValidationLogger,
    device:        B::Device,
) -> Result<RunOutcome> {
    B::seed(&device, cfg.seed);

    let model = cfg.model_config().init::<B>(&device);
    tracing::info!(
        "Model ready: {} layer(s), d_model={}, seq module {}, signal module {}",
        cfg.layer_num,
        cfg.d_model,
        if cfg.is_seq { "on" } else { "off" },
        if cfg.is_signal { "on" } else { "off" },
    );

    let mut classifier = BurnClassifier::new(
        model,
        AdamConfig::new().init(),
        class_weights(cfg.class_num, cfg.pos_weight),
        StepDecay::new(cfg.lr, cfg.lr_decay_step, cfg.lr_decay_gamma),
    );

    let train = LoaderSource::<B>::shuffled(train_dataset, cfg.batch_size, cfg.seed, device.clone());
    let valid = LoaderSource::<B::InnerBackend>::shuffled(valid_dataset, cfg.batch_size, cfg.seed, device);

    let outcome = TrainingOrchestrator::new(cfg.loop_config(), checkpoints)
        .with_logger(logger)
        .run(&mut classifier, &train, &valid)?;

    tracing::info!(
        "Run finished: {:?} after {} epoch(s), best accuracy {:.4}",
        outcome.terminal,
        outcome.epochs_run,
        outcome.best_accuracy
    );
    Ok(outcome)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::tests::feature_line;
    use crate::domain::state::Terminal;
    use std::fs;

    fn tiny_config(dir: &std::path::Path) -> TrainConfig {
        TrainConfig {
            train_file:    dir.join("train.tsv").to_string_lossy().into_owned(),
            valid_file:    dir.join("valid.tsv").to_string_lossy().into_owned(),
            model_dir:     dir.join("model").to_string_lossy().into_owned(),
            seq_len:       3,
            signal_len:    2,
            d_model:       8,
            n_head:        2,
            d_ff:          16,
            layer_num:     1,
            dropout_rate:  0.1,
            batch_size:    2,
            max_epoch_num: 2,
            min_epoch_num: 1,
            step_interval: 1,
            device:        DeviceChoice::Cpu,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = TrainConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.seq_len, 11);
        assert_eq!(cfg.signal_len, 128);
        assert_eq!(cfg.batch_size, 512);
        assert_eq!(cfg.min_epoch_num, 5);
    }

    #[test]
    fn validate_rejects_zero_sizes() {
        let mut cfg = TrainConfig::default();
        cfg.step_interval = 0;
        assert!(matches!(cfg.validate(), Err(TrainError::Configuration(_))));

        let mut cfg = TrainConfig::default();
        cfg.batch_size = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = TrainConfig::default();
        cfg.is_seq = false;
        cfg.is_signal = false;
        assert!(cfg.validate().is_err());

        let mut cfg = TrainConfig::default();
        cfg.min_epoch_num = 50;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn display_lists_every_option() {
        let text = TrainConfig::default().display();
        assert!(text.contains("seq_len:\n\t11"));
        assert!(text.contains("device:\n\tauto"));
        assert!(text.contains("tmpdir:\n\t/tmp"));
    }

    #[test]
    fn end_to_end_run_on_cpu() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path());

        let lines: Vec<String> = ["ACG", "CGT", "TTA", "GNA"]
            .iter()
            .enumerate()
            .map(|(i, k)| feature_line(k, if i % 2 == 0 { "0" } else { "1" }))
            .collect();
        fs::write(&cfg.train_file, lines.join("\n")).unwrap();
        fs::write(&cfg.valid_file, lines[..2].join("\n")).unwrap();

        let outcome = TrainUseCase::new(cfg.clone()).execute().unwrap();

        assert!(outcome.epochs_run >= 1 && outcome.epochs_run <= 2);
        if outcome.terminal == Terminal::Completed {
            assert_eq!(outcome.epochs_run, 2);
        }
        let model_dir = std::path::Path::new(&cfg.model_dir);
        assert!(model_dir.join("train_config.json").is_file());
        let csv = fs::read_to_string(model_dir.join("validation.csv")).unwrap();
        // header plus one row per step: 2 train batches per epoch, interval 1
        assert_eq!(csv.lines().count(), 1 + 2 * outcome.epochs_run);
    }

    #[test]
    fn missing_train_file_fails_before_model_dir_is_touched() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path());

        let err = TrainUseCase::new(cfg.clone()).execute().unwrap_err();

        assert!(format!("{err:#}").contains("train.tsv"));
        assert!(!std::path::Path::new(&cfg.model_dir).exists());
    }
}
