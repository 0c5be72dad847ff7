// ============================================================
// Layer 3 — SignalFeature Domain Type
// ============================================================
// One labelled sample: a k-mer centred on a candidate CpG site,
// the per-base statistics of the nanopore current aligned to it,
// and a fixed-width window of raw signal per base.
//
// Shapes (seq_len = k-mer length, signal_len = samples per base):
//   kmer             [seq_len]               base codes 0..=4
//   base_means       [seq_len]
//   base_stds        [seq_len]
//   base_signal_lens [seq_len]
//   signals          [seq_len * signal_len]  row-major per base

/// Number of distinct base codes (A, C, G, T, N).
pub const BASE_VOCAB: usize = 5;

/// Map a nucleotide to its embedding index.
pub fn encode_base(base: char) -> Option<u8> {
    match base {
        'A' => Some(0),
        'C' => Some(1),
        'G' => Some(2),
        'T' => Some(3),
        'N' => Some(4),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalFeature {
    /// Tab-joined chrom, pos, strand, pos_in_strand, read name, read strand
    pub sample_id: String,
    pub kmer: Vec<u8>,
    pub base_means: Vec<f32>,
    pub base_stds: Vec<f32>,
    pub base_signal_lens: Vec<u32>,
    pub signals: Vec<f32>,
    /// 1 = methylated, 0 = unmethylated
    pub label: u8,
}

impl SignalFeature {
    pub fn seq_len(&self) -> usize {
        self.kmer.len()
    }

    pub fn is_positive(&self) -> bool {
        self.label == 1
    }
}
