/// Minimum gain over the best metric that counts as an improvement.
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// Tracks the best metric seen so far and how many evaluations in a row
/// failed to beat it.
#[derive(Debug, Clone)]
pub struct PlateauDetector {
    best_metric: f64,
    epochs_without_improvement: u64,
    patience: u64,
    tolerance: f64,
}

impl PlateauDetector {
    pub fn new(patience: u64, tolerance: f64) -> Self {
        Self {
            best_metric: f64::NEG_INFINITY,
            epochs_without_improvement: 0,
            patience,
            tolerance,
        }
    }

    // Returns if the metric beat the best by more than the tolerance (higher is better)
    pub fn observe(&mut self, metric: f64) -> bool {
        if metric > self.best_metric + self.tolerance {
            self.best_metric = metric;
            self.epochs_without_improvement = 0;
            true
        } else {
            self.epochs_without_improvement += 1;
            false
        }
    }

    pub fn exhausted(&self) -> bool {
        self.epochs_without_improvement > self.patience
    }

    pub fn best_metric(&self) -> f64 {
        self.best_metric
    }

    pub fn epochs_without_improvement(&self) -> u64 {
        self.epochs_without_improvement
    }

    pub fn patience(&self) -> u64 {
        self.patience
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_observation_always_improves() {
        let mut detector = PlateauDetector::new(0, DEFAULT_TOLERANCE);
        assert!(detector.observe(-1.0));
        assert_eq!(detector.best_metric(), -1.0);
        assert_eq!(detector.epochs_without_improvement(), 0);
    }

    #[test]
    fn test_tolerance_boundary_is_strict() {
        let mut detector = PlateauDetector::new(1, 0.5);
        assert!(detector.observe(1.0));

        // Exactly best + tolerance is not an improvement
        assert!(!detector.observe(1.5));
        assert_eq!(detector.epochs_without_improvement(), 1);
        assert_eq!(detector.best_metric(), 1.0);

        assert!(detector.observe(1.75));
        assert_eq!(detector.epochs_without_improvement(), 0);
    }

    #[test]
    fn test_gain_of_exactly_tolerance_is_a_plateau() {
        // 0.5 + 1e-4 == 0.5001 in f64, so the second value sits on the boundary
        let mut detector = PlateauDetector::new(1, DEFAULT_TOLERANCE);
        let results: Vec<bool> = [0.5, 0.5001, 0.5, 0.5]
            .into_iter()
            .map(|metric| {
                detector.observe(metric);
                detector.exhausted()
            })
            .collect();

        assert_eq!(results, vec![false, false, true, true]);
        assert_eq!(detector.best_metric(), 0.5);
    }

    #[test]
    fn test_exhausted_after_patience_plus_one_misses() {
        let patience = 3;
        let mut detector = PlateauDetector::new(patience, DEFAULT_TOLERANCE);
        detector.observe(0.8);

        for _ in 0..patience {
            detector.observe(0.8);
            assert!(!detector.exhausted());
        }

        detector.observe(0.8);
        assert!(detector.exhausted());
    }

    #[test]
    fn test_improvement_resets_counter() {
        let mut detector = PlateauDetector::new(2, DEFAULT_TOLERANCE);
        detector.observe(0.1);
        detector.observe(0.1);
        detector.observe(0.1);
        assert_eq!(detector.epochs_without_improvement(), 2);

        assert!(detector.observe(0.2));
        assert_eq!(detector.epochs_without_improvement(), 0);
        assert!(!detector.exhausted());
    }

    #[test]
    fn test_best_metric_never_decreases() {
        let mut detector = PlateauDetector::new(100, DEFAULT_TOLERANCE);
        let mut previous = detector.best_metric();
        for metric in [0.3, 0.1, 0.5, 0.4, 0.9, -0.2, 0.90005] {
            detector.observe(metric);
            assert!(detector.best_metric() >= previous);
            previous = detector.best_metric();
        }
        assert_eq!(detector.best_metric(), 0.9);
    }
}
