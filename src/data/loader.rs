// ============================================================
// Layer 4 — Feature File Loader
// ============================================================
// Reads a tab-separated feature file, one sample per line:
//
//   col 0-5  chrom, pos, strand, pos_in_strand, read, read strand
//   col 6    k-mer string (ACGTN), length seq_len
//   col 7    base means            "m1,m2,...,m_seq_len"
//   col 8    base stds             "s1,s2,...,s_seq_len"
//   col 9    base signal lengths   "l1,l2,...,l_seq_len"
//   col 10   signal windows        "a1,..,a_L;b1,..,b_L;..."
//   col 11   label                 0 or 1
//
// Blank lines are skipped. Any other malformed line aborts the
// load with the file name and 1-based line number; a partially
// parsed training set is never handed to the trainer.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::domain::error::TrainError;
use crate::domain::feature::{encode_base, SignalFeature};

const COLUMNS: usize = 12;
const SAMPLE_INFO_COLUMNS: usize = 6;

pub struct FeatureFileLoader {
    path: PathBuf,
    seq_len: usize,
    signal_len: usize,
}

impl FeatureFileLoader {
    pub fn new(path: impl AsRef<Path>, seq_len: usize, signal_len: usize) -> Self {
        Self { path: path.as_ref().to_path_buf(), seq_len, signal_len }
    }

    /// Parse every sample in the file. An empty file is an error.
    pub fn load(&self) -> Result<Vec<SignalFeature>, TrainError> {
        let file = File::open(&self.path).map_err(|e| {
            TrainError::Data(format!("cannot open '{}': {e}", self.path.display()))
        })?;

        let mut samples = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| {
                TrainError::Data(format!("cannot read '{}': {e}", self.path.display()))
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let sample = self.parse_line(&line).map_err(|msg| {
                TrainError::Data(format!("{}:{}: {msg}", self.path.display(), idx + 1))
            })?;
            samples.push(sample);
        }

        if samples.is_empty() {
            return Err(TrainError::Data(format!(
                "'{}' contains no samples",
                self.path.display()
            )));
        }

        tracing::debug!("Parsed {} samples from '{}'", samples.len(), self.path.display());
        Ok(samples)
    }

    fn parse_line(&self, line: &str) -> Result<SignalFeature, String> {
        let words: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
        if words.len() != COLUMNS {
            return Err(format!("expected {COLUMNS} columns, found {}", words.len()));
        }

        let kmer = words[6]
            .chars()
            .map(|b| encode_base(b).ok_or_else(|| format!("unknown base '{b}' in k-mer")))
            .collect::<Result<Vec<u8>, _>>()?;
        self.check_len("k-mer", kmer.len(), self.seq_len)?;

        let base_means: Vec<f32> = parse_list(words[7], ',', "base means")?;
        self.check_len("base means", base_means.len(), self.seq_len)?;

        let base_stds: Vec<f32> = parse_list(words[8], ',', "base stds")?;
        self.check_len("base stds", base_stds.len(), self.seq_len)?;

        let base_signal_lens: Vec<u32> = parse_list(words[9], ',', "base signal lengths")?;
        self.check_len("base signal lengths", base_signal_lens.len(), self.seq_len)?;

        let windows: Vec<&str> = words[10].split(';').collect();
        self.check_len("signal windows", windows.len(), self.seq_len)?;
        let mut signals = Vec::with_capacity(self.seq_len * self.signal_len);
        for window in windows {
            let values: Vec<f32> = parse_list(window, ',', "signal window")?;
            self.check_len("signal window", values.len(), self.signal_len)?;
            signals.extend(values);
        }

        let label = match words[11].trim() {
            "0" => 0,
            "1" => 1,
            other => return Err(format!("label must be 0 or 1, found '{other}'")),
        };

        Ok(SignalFeature {
            sample_id: words[..SAMPLE_INFO_COLUMNS].join("\t"),
            kmer,
            base_means,
            base_stds,
            base_signal_lens,
            signals,
            label,
        })
    }

    fn check_len(&self, what: &str, found: usize, expected: usize) -> Result<(), String> {
        if found == expected {
            Ok(())
        } else {
            Err(format!("{what}: expected {expected} values, found {found}"))
        }
    }
}

fn parse_list<T: FromStr>(field: &str, sep: char, what: &str) -> Result<Vec<T>, String> {
    field
        .split(sep)
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| format!("{what}: cannot parse '{v}'"))
        })
        .collect()
}
