use clap::Args;

use crate::detector::DEFAULT_TOLERANCE;
use crate::error::{Error, Result};
use crate::grace::GraceSchedule;

/// Validated early stopping settings.
#[derive(Debug, Clone)]
pub struct EarlyStoppingConfig {
    pub enabled: bool,
    /// No evaluation happens before this step.
    pub start_step: u64,
    /// Evaluate only on steps divisible by this.
    pub check_interval: u64,
    /// Consecutive non-improving evaluations tolerated before stopping.
    pub patience: u64,
    pub tolerance: f64,
    pub grace_periods: GraceSchedule,
}

impl Default for EarlyStoppingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            start_step: 0,
            check_interval: 1,
            patience: 3,
            tolerance: DEFAULT_TOLERANCE,
            grace_periods: GraceSchedule::default(),
        }
    }
}

impl EarlyStoppingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.check_interval == 0 {
            return Err(Error::InvalidConfig(
                "check interval must be positive".to_string(),
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Command line options for hosts that embed early stopping.
#[derive(Args, Debug, Clone)]
pub struct EarlyStoppingArgs {
    /// Stop training once the held-out SSIM plateaus.
    #[arg(long, default_value_t = false)]
    pub use_early_stopping: bool,

    /// Step before which early stopping is never evaluated.
    #[arg(long, default_value_t = 0)]
    pub start_early_stopping_iteration: u64,

    /// Recurring windows without early stopping, as `frequency:length` pairs (e.g. "10:19,20:29").
    #[arg(long)]
    pub early_stopping_grace_periods: Option<GraceSchedule>,

    /// Steps between evaluations. Defaults to the number of steps per epoch.
    #[arg(long)]
    pub early_stopping_check_interval: Option<u64>,

    /// Evaluations without improvement before stopping.
    #[arg(long, default_value_t = 3)]
    pub n_patience_epochs: u64,

    /// Minimum SSIM gain that counts as an improvement.
    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    pub early_stopping_tolerance: f64,
}

impl EarlyStoppingArgs {
    /// Builds a config, using `steps_per_epoch` when no check interval was given.
    pub fn into_config(self, steps_per_epoch: u64) -> Result<EarlyStoppingConfig> {
        let config = EarlyStoppingConfig {
            enabled: self.use_early_stopping,
            start_step: self.start_early_stopping_iteration,
            check_interval: self
                .early_stopping_check_interval
                .unwrap_or(steps_per_epoch),
            patience: self.n_patience_epochs,
            tolerance: self.early_stopping_tolerance,
            grace_periods: self.early_stopping_grace_periods.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }
}
