// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the `train` subcommand and all its flags. Defaults
// mirror a standard deepsignal2 run: 11-mer windows, 128 signal
// points per base, 3 encoder layers of width 256.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{ArgAction, Args, Subcommand, ValueEnum};

use crate::application::train_use_case::TrainConfig;
use crate::ml::device::DeviceChoice;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the classifier on a feature file, validating every --step-interval steps
    Train(TrainArgs),
}

/// Which Burn backend runs the tensors.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendArg {
    /// wgpu when a GPU adapter is found, ndarray otherwise
    Auto,
    /// GPU through wgpu (Vulkan / Metal / DX12); fails without an adapter
    Wgpu,
    /// CPU through ndarray
    Ndarray,
}

impl From<BackendArg> for DeviceChoice {
    fn from(b: BackendArg) -> Self {
        match b {
            BackendArg::Auto => DeviceChoice::Auto,
            BackendArg::Wgpu => DeviceChoice::Accelerator,
            BackendArg::Ndarray => DeviceChoice::Cpu,
        }
    }
}

/// Accepts yes/no, true/false, y/n, t/f, 1/0 in any case.
fn parse_yes_no(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "t" | "1" => Ok(true),
        "no" | "n" | "false" | "f" | "0" => Ok(false),
        _ => Err(format!("expected yes or no, got '{s}'")),
    }
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Feature file used for training (tab-separated, one sample per line)
    #[arg(long)]
    pub train_file: String,

    /// Feature file scored at every validation round
    #[arg(long)]
    pub valid_file: String,

    /// Directory for epochN.ckpt files, train_config.json and validation.csv
    #[arg(long)]
    pub model_dir: String,

    // ── model ────────────────────────────────────────────────────────────────
    /// Bases per sample (k-mer length)
    #[arg(long, default_value_t = 11)]
    pub seq_len: usize,

    /// Raw signal points kept per base
    #[arg(long, default_value_t = 128)]
    pub signal_len: usize,

    /// Encoder width; must be divisible by --n-head
    #[arg(long, default_value_t = 256)]
    pub d_model: usize,

    #[arg(long, default_value_t = 4)]
    pub n_head: usize,

    /// Inner size of each encoder feed-forward block
    #[arg(long, default_value_t = 512)]
    pub d_ff: usize,

    /// Encoder layers per module
    #[arg(long, default_value_t = 3)]
    pub layer_num: usize,

    #[arg(long, default_value_t = 2)]
    pub class_num: usize,

    #[arg(long, default_value_t = 0.5)]
    pub dropout_rate: f64,

    /// Use the sequence module (yes/no)
    #[arg(long, default_value = "yes", action = ArgAction::Set, value_parser = parse_yes_no)]
    pub is_seq: bool,

    /// Use the signal module (yes/no)
    #[arg(long, default_value = "yes", action = ArgAction::Set, value_parser = parse_yes_no)]
    pub is_signal: bool,

    // ── training ─────────────────────────────────────────────────────────────
    #[arg(long, default_value_t = 512)]
    pub batch_size: usize,

    /// Initial Adam learning rate
    #[arg(long, default_value_t = 0.001)]
    pub lr: f64,

    #[arg(long, default_value_t = 10)]
    pub max_epoch_num: usize,

    /// Early stopping is not considered before this many epochs
    #[arg(long, default_value_t = 5)]
    pub min_epoch_num: usize,

    /// Validate every this many training steps
    #[arg(long, default_value_t = 100)]
    pub step_interval: usize,

    /// Loss weight of the positive class (the negative class weighs 1)
    #[arg(long, default_value_t = 1.0)]
    pub pos_weight: f64,

    #[arg(long, default_value_t = 1234)]
    pub seed: u64,

    /// Epochs between learning-rate decays
    #[arg(long, default_value_t = 2)]
    pub lr_decay_step: usize,

    /// Multiplier applied at each decay
    #[arg(long, default_value_t = 0.1)]
    pub lr_decay_gamma: f64,

    #[arg(long, value_enum, default_value_t = BackendArg::Auto)]
    pub backend: BackendArg,

    // ── else ─────────────────────────────────────────────────────────────────
    #[arg(long, default_value = "/tmp")]
    pub tmpdir: String,
}

/// Boundary between Layer 1 and Layer 2: the application layer
/// never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            train_file:     a.train_file,
            valid_file:     a.valid_file,
            model_dir:      a.model_dir,
            seq_len:        a.seq_len,
            signal_len:     a.signal_len,
            d_model:        a.d_model,
            n_head:         a.n_head,
            d_ff:           a.d_ff,
            layer_num:      a.layer_num,
            class_num:      a.class_num,
            dropout_rate:   a.dropout_rate,
            is_seq:         a.is_seq,
            is_signal:      a.is_signal,
            batch_size:     a.batch_size,
            lr:             a.lr,
            max_epoch_num:  a.max_epoch_num,
            min_epoch_num:  a.min_epoch_num,
            step_interval:  a.step_interval,
            pos_weight:     a.pos_weight,
            seed:           a.seed,
            lr_decay_step:  a.lr_decay_step,
            lr_decay_gamma: a.lr_decay_gamma,
            device:         a.backend.into(),
            tmpdir:         a.tmpdir,
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn parse(extra: &[&str]) -> Result<TrainConfig, clap::Error> {
        let mut argv = vec![
            "deepsignal-trainer", "train",
            "--train-file", "train.tsv",
            "--valid-file", "valid.tsv",
            "--model-dir", "model",
        ];
        argv.extend_from_slice(extra);
        let Commands::Train(args) = Cli::try_parse_from(argv)?.command;
        Ok(args.into())
    }

    #[test]
    fn defaults_match_the_config_defaults() {
        let cfg = parse(&[]).unwrap();
        let def = TrainConfig::default();

        assert_eq!(cfg.train_file, "train.tsv");
        assert_eq!(cfg.model_dir, "model");
        assert_eq!(cfg.seq_len, def.seq_len);
        assert_eq!(cfg.signal_len, def.signal_len);
        assert_eq!(cfg.batch_size, def.batch_size);
        assert_eq!(cfg.step_interval, def.step_interval);
        assert_eq!(cfg.min_epoch_num, def.min_epoch_num);
        assert_eq!(cfg.seed, def.seed);
        assert_eq!(cfg.device, DeviceChoice::Auto);
        assert_eq!(cfg.device, def.device);
        assert!(cfg.is_seq && cfg.is_signal);
    }

    #[test]
    fn yes_no_flags_accept_common_spellings() {
        let cfg = parse(&["--is-seq", "No", "--is-signal", "TRUE"]).unwrap();
        assert!(!cfg.is_seq);
        assert!(cfg.is_signal);

        let cfg = parse(&["--is-seq", "0", "--is-signal", "y"]).unwrap();
        assert!(!cfg.is_seq);
        assert!(cfg.is_signal);

        assert!(parse(&["--is-seq", "maybe"]).is_err());
    }

    #[test]
    fn backend_and_overrides() {
        let cfg = parse(&[
            "--backend", "ndarray",
            "--step-interval", "7",
            "--lr-decay-gamma", "0.5",
            "--pos-weight", "2.5",
        ])
        .unwrap();

        assert_eq!(cfg.device, DeviceChoice::Cpu);
        assert_eq!(parse(&["--backend", "wgpu"]).unwrap().device, DeviceChoice::Accelerator);
        assert_eq!(cfg.step_interval, 7);
        assert_eq!(cfg.lr_decay_gamma, 0.5);
        assert_eq!(cfg.pos_weight, 2.5);
    }

    #[test]
    fn required_paths_are_enforced() {
        assert!(Cli::try_parse_from(["deepsignal-trainer", "train", "--train-file", "t"]).is_err());
    }
}
