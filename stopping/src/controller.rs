// Decides, once per training step, whether fitting should stop.
//
// Most steps return early through one of the gates (disabled, off-cadence,
// warm-up, grace window) without touching any state. Only a step that passes
// every gate renders the evaluation views, scores them with SSIM and feeds the
// mean into the plateau detector.

use candle_core::{Device, Tensor};
use utils::{clamp_unit, ssim};

use crate::config::EarlyStoppingConfig;
use crate::detector::PlateauDetector;
use crate::error::{Error, Result};
use crate::grace::is_in_grace;
use crate::sink::{LogSink, MetricsSink};
use crate::view::EvaluationView;

pub const SSIM_METRIC_KEY: &str = "early_stopping_test/ssim";

pub struct StopController {
    config: EarlyStoppingConfig,
    detector: PlateauDetector,
    sink: Box<dyn MetricsSink>,
    device: Device,
}

impl StopController {
    pub fn new(config: EarlyStoppingConfig, device: Device) -> Result<Self> {
        Self::with_sink(config, device, Box::new(LogSink))
    }

    pub fn with_sink(
        config: EarlyStoppingConfig,
        device: Device,
        sink: Box<dyn MetricsSink>,
    ) -> Result<Self> {
        config.validate()?;
        let detector = PlateauDetector::new(config.patience, config.tolerance);

        Ok(Self {
            config,
            detector,
            sink,
            device,
        })
    }

    pub fn config(&self) -> &EarlyStoppingConfig {
        &self.config
    }

    pub fn best_metric(&self) -> f64 {
        self.detector.best_metric()
    }

    pub fn epochs_without_improvement(&self) -> u64 {
        self.detector.epochs_without_improvement()
    }

    /// True if `step` would render and score the evaluation views.
    pub fn is_check_step(&self, step: u64) -> bool {
        self.config.enabled
            && step % self.config.check_interval == 0
            && step >= self.config.start_step
            && !is_in_grace(step, self.config.grace_periods.periods())
    }

    /// Returns true once the held-out SSIM has not improved for more than
    /// `patience` consecutive evaluations.
    ///
    /// Render failures are returned to the caller. After this returns true
    /// the caller is expected to stop calling it.
    pub fn should_stop<V, F, E>(&mut self, step: u64, views: &[V], mut render: F) -> Result<bool>
    where
        V: EvaluationView,
        F: FnMut(&V) -> std::result::Result<Tensor, E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        if !self.is_check_step(step) {
            return Ok(false);
        }

        if views.is_empty() {
            log::warn!("No evaluation views at step {}, skipping early stopping check", step);
            return Ok(false);
        }

        let mut scores = Vec::with_capacity(views.len());
        for view in views {
            let rendered = render(view).map_err(|e| Error::Render(e.into()))?;
            let rendered = clamp_unit(&rendered.to_device(&self.device)?)?;
            let reference = clamp_unit(&view.reference().to_device(&self.device)?)?;

            scores.push(ssim(&rendered, &reference)?);
        }

        let metric = scores.iter().sum::<f64>() / scores.len() as f64;
        if !metric.is_finite() {
            log::warn!(
                "Non-finite SSIM {} at step {}, skipping early stopping check",
                metric,
                step
            );
            return Ok(false);
        }

        if let Err(e) = self.sink.report(SSIM_METRIC_KEY, metric, step) {
            log::warn!("Failed to report {}: {}", SSIM_METRIC_KEY, e);
        }

        let improved = self.detector.observe(metric);
        log::debug!(
            "Step {}: SSIM {:.6} (best {:.6}, tolerance {}, improved: {}, stale evaluations: {})",
            step,
            metric,
            self.detector.best_metric(),
            self.detector.tolerance(),
            improved,
            self.detector.epochs_without_improvement()
        );

        if self.detector.exhausted() {
            log::info!(
                "No improvement in SSIM for {} evaluations (patience {}), stopping training at step {}",
                self.detector.epochs_without_improvement(),
                self.detector.patience(),
                step
            );
            return Ok(true);
        }

        Ok(false)
    }
}
