// ============================================================
// Layer 5 — Epoch Schedulers
// ============================================================
// Two per-epoch controllers that the training loop consults:
//
//   TeacherForcingScheduler
//     Linear decay of the teacher-forcing ratio from `start`
//     to `end`. One step() per epoch, whatever the batch count.
//
//   PlateauScheduler
//     Reduce-on-plateau learning rate. Fed the validation loss
//     once per epoch; after `patience` epochs without an
//     improvement larger than `min_delta` the rate is multiplied
//     by `factor` (never below `min_lr`). The rate never rises.

/// Linearly decaying teacher-forcing ratio.
#[derive(Debug, Clone)]
pub struct TeacherForcingScheduler {
    start:       f64,
    end:         f64,
    total_steps: usize,
    step_count:  usize,
}

impl TeacherForcingScheduler {
    /// `start` and `end` are clamped into [0, 1], and `end` is
    /// clamped to at most `start` so the sequence cannot rise.
    /// The ratio reaches `end` on call index `total_steps`.
    pub fn new(start: f64, end: f64, total_steps: usize) -> Self {
        let start = start.clamp(0.0, 1.0);
        let end   = end.clamp(0.0, start);
        Self { start, end, total_steps, step_count: 0 }
    }

    /// Ratio for the current epoch, then advance.
    pub fn step(&mut self) -> f64 {
        let progress = if self.total_steps == 0 {
            1.0
        } else {
            (self.step_count as f64 / self.total_steps as f64).min(1.0)
        };
        self.step_count += 1;
        (self.start - (self.start - self.end) * progress).max(self.end)
    }
}

/// Reduce-on-plateau learning rate control.
#[derive(Debug, Clone)]
pub struct PlateauScheduler {
    lr:        f64,
    factor:    f64,
    patience:  usize,
    min_delta: f64,
    min_lr:    f64,
    best:      f64,
    wait:      usize,
}

impl PlateauScheduler {
    pub fn new(initial_lr: f64, factor: f64, patience: usize, min_delta: f64, min_lr: f64) -> Self {
        Self {
            lr: initial_lr,
            factor: factor.clamp(0.0, 1.0),
            patience: patience.max(1),
            min_delta,
            min_lr: min_lr.min(initial_lr),
            best: f64::INFINITY,
            wait: 0,
        }
    }

    pub fn lr(&self) -> f64 {
        self.lr
    }

    /// Feed one validation metric (lower is better) and return
    /// the learning rate to use from now on.
    /// Non-finite metrics are ignored.
    pub fn step(&mut self, metric: f64) -> f64 {
        if !metric.is_finite() {
            tracing::warn!("Non-finite validation loss; plateau scheduler skipped");
            return self.lr;
        }

        if metric + self.min_delta < self.best {
            self.best = metric;
            self.wait = 0;
            return self.lr;
        }

        self.wait += 1;
        if self.wait >= self.patience {
            self.wait = 0;
            let reduced = (self.lr * self.factor).max(self.min_lr);
            if reduced < self.lr {
                tracing::info!(
                    "Validation loss plateaued at {:.4} (best {:.4}): lr {:.2e} → {:.2e}",
                    metric, self.best, self.lr, reduced
                );
                self.lr = reduced;
            }
        }
        self.lr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teacher_forcing_linear_decay() {
        let mut s = TeacherForcingScheduler::new(1.0, 0.5, 4);
        let ratios: Vec<f64> = (0..6).map(|_| s.step()).collect();
        let expected = [1.0, 0.875, 0.75, 0.625, 0.5, 0.5];
        for (r, e) in ratios.iter().zip(expected) {
            assert!((r - e).abs() < 1e-12, "{ratios:?}");
        }
    }

    #[test]
    fn test_teacher_forcing_non_increasing_and_bounded() {
        for (start, end, steps) in [(1.0, 0.0, 7), (0.9, 0.3, 1), (1.5, -0.2, 3), (0.2, 0.8, 5), (1.0, 0.5, 0)] {
            let mut s    = TeacherForcingScheduler::new(start, end, steps);
            let mut prev = f64::INFINITY;
            for _ in 0..20 {
                let r = s.step();
                assert!((0.0..=1.0).contains(&r), "ratio {r} out of range");
                assert!(r <= prev, "ratio rose from {prev} to {r}");
                prev = r;
            }
        }
    }

    #[test]
    fn test_plateau_reduces_only_after_patience() {
        let mut p = PlateauScheduler::new(1e-3, 0.5, 2, 1e-4, 1e-6);
        assert_eq!(p.step(1.0), 1e-3); // sets best
        assert_eq!(p.step(1.0), 1e-3); // wait = 1
        assert!((p.step(1.0) - 5e-4).abs() < 1e-15); // wait hits patience
        assert!((p.step(0.8) - 5e-4).abs() < 1e-15); // improvement, no change
        assert!((p.lr() - 5e-4).abs() < 1e-15);
    }

    #[test]
    fn test_plateau_min_delta() {
        let mut p = PlateauScheduler::new(1e-3, 0.5, 1, 1e-4, 0.0);
        p.step(1.0);
        // smaller than min_delta does not count as improvement
        assert!(p.step(0.99995) < 1e-3);
    }

    #[test]
    fn test_plateau_never_increases_and_respects_floor() {
        let mut p    = PlateauScheduler::new(1e-3, 0.1, 1, 0.0, 1e-5);
        let mut prev = p.lr();
        for metric in [3.0, 2.0, 2.5, 2.5, 1.0, 4.0, 4.0, f64::NAN, 4.0, 4.0] {
            let lr = p.step(metric);
            assert!(lr <= prev);
            assert!(lr >= 1e-5);
            prev = lr;
        }
        assert!((p.lr() - 1e-5).abs() < 1e-18);
    }

    #[test]
    fn test_plateau_ignores_non_finite() {
        let mut p = PlateauScheduler::new(1e-3, 0.5, 1, 0.0, 0.0);
        p.step(1.0);
        assert_eq!(p.step(f64::NAN), 1e-3);
        assert_eq!(p.step(f64::INFINITY), 1e-3);
    }
}
