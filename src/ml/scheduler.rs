// ============================================================
// Layer 5 — Step-decay Learning Rate Schedule
// ============================================================
//   lr(epoch) = base_lr * gamma ^ floor(epoch / step_size)
//
// Stepped once at the end of every epoch. With the defaults
// (step_size = 2, gamma = 0.1) and lr = 1e-3:
//   epochs 0-1 → 1e-3, epochs 2-3 → 1e-4, epochs 4-5 → 1e-5 ...

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepDecay {
    base_lr: f64,
    step_size: usize,
    gamma: f64,
    epoch: usize,
}

impl StepDecay {
    /// `step_size` must be non-zero; `TrainConfig::validate` enforces it.
    pub fn new(base_lr: f64, step_size: usize, gamma: f64) -> Self {
        Self { base_lr, step_size, gamma, epoch: 0 }
    }

    pub fn lr(&self) -> f64 {
        let decays = (self.epoch / self.step_size.max(1)) as i32;
        self.base_lr * self.gamma.powi(decays)
    }

    pub fn step(&mut self) {
        self.epoch += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decays_every_step_size_epochs() {
        let mut sched = StepDecay::new(1e-3, 2, 0.1);
        let mut lrs = Vec::new();
        for _ in 0..5 {
            lrs.push(sched.lr());
            sched.step();
        }
        let expected = [1e-3, 1e-3, 1e-4, 1e-4, 1e-5];
        for (got, want) in lrs.iter().zip(expected) {
            assert!((got - want).abs() < 1e-15, "{got} vs {want}");
        }
    }

    #[test]
    fn gamma_one_keeps_rate_constant() {
        let mut sched = StepDecay::new(0.01, 1, 1.0);
        for _ in 0..10 {
            sched.step();
        }
        assert_eq!(sched.lr(), 0.01);
    }
}
