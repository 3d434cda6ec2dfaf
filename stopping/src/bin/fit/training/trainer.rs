use std::error::Error;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use candle_core::Device;
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarMap};
use rand::seq::SliceRandom;
use rand::thread_rng;
use stopping::{EvaluationView, StopController};

use crate::scene::{Model, Scene};
use crate::training::progress::TrainingProgressBar;
use crate::utils::loss::smooth_l1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed { steps: u64 },
    StoppedEarly { step: u64 },
    Interrupted { step: u64 },
}

pub struct Trainer {
    model: Model,
    optimizer: AdamW,
    varmap: VarMap,
    controller: StopController,
    steps: u64,
}

impl Trainer {
    pub fn new(
        channels: usize,
        size: usize,
        learning_rate: f64,
        steps: u64,
        controller: StopController,
        device: &Device,
    ) -> Result<Self, Box<dyn Error>> {
        let varmap = VarMap::new();
        let model = Model::new(&varmap, channels, size, device)?;
        let optimizer = AdamW::new(
            varmap.all_vars(),
            ParamsAdamW {
                lr: learning_rate,
                weight_decay: 0.0,
                ..Default::default()
            },
        )?;

        Ok(Self {
            model,
            optimizer,
            varmap,
            controller,
            steps,
        })
    }

    /// Runs one view per step, reshuffling the views every epoch, until the
    /// step budget runs out, early stopping fires or `interrupted` is set.
    pub fn train(
        &mut self,
        scene: &Scene,
        interrupted: Arc<AtomicBool>,
    ) -> Result<Outcome, Box<dyn Error>> {
        if scene.train_views.is_empty() {
            return Err("no training views".into());
        }

        let progress = TrainingProgressBar::new(self.steps)?;
        let mut order: Vec<usize> = (0..scene.train_views.len()).collect();
        let mut loss_value = 0.0;

        for step in 1..=self.steps {
            if interrupted.load(Ordering::Relaxed) {
                progress.finish(loss_value, false);
                return Ok(Outcome::Interrupted { step });
            }

            let cursor = ((step - 1) % order.len() as u64) as usize;
            if cursor == 0 {
                order.shuffle(&mut thread_rng());
            }

            let view = &scene.train_views[order[cursor]];
            let rendered = self.model.render(view)?;
            let loss = smooth_l1(&rendered, view.reference())?;
            self.optimizer.backward_step(&loss)?;

            loss_value = loss.to_vec0::<f32>()?;
            progress.update(loss_value);

            let model = &self.model;
            let stop = self
                .controller
                .should_stop(step, &scene.test_views, |view| model.render(view))?;

            if self.controller.is_check_step(step) {
                progress.checked(self.controller.best_metric());
            }

            if stop {
                progress.finish(loss_value, true);
                return Ok(Outcome::StoppedEarly { step });
            }
        }

        progress.finish(loss_value, false);
        Ok(Outcome::Completed { steps: self.steps })
    }

    pub fn save(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        self.varmap.save(path)?;
        log::info!("Saved fitted image to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Args;
    use clap::Parser;
    use stopping::{EarlyStoppingConfig, NoopSink};

    fn scene(args: &Args) -> Scene {
        Scene::generate(args, &Device::Cpu).unwrap()
    }

    fn controller(enabled: bool, check_interval: u64) -> StopController {
        let config = EarlyStoppingConfig {
            enabled,
            check_interval,
            patience: 0,
            ..EarlyStoppingConfig::default()
        };
        StopController::with_sink(config, Device::Cpu, Box::new(NoopSink)).unwrap()
    }

    #[test]
    fn test_runs_full_budget_without_early_stopping() {
        let args = Args::parse_from(["fit", "--views", "2", "--test-views", "1", "--size", "8"]);
        let scene = scene(&args);
        let mut trainer =
            Trainer::new(3, 8, 0.05, 6, controller(false, 2), &Device::Cpu).unwrap();

        let outcome = trainer.train(&scene, Arc::default()).unwrap();
        assert_eq!(outcome, Outcome::Completed { steps: 6 });
    }

    #[test]
    fn test_zero_learning_rate_plateaus_immediately() {
        // Nothing changes, so the second check is the first miss
        let args = Args::parse_from(["fit", "--views", "2", "--test-views", "2", "--size", "8"]);
        let scene = scene(&args);
        let mut trainer = Trainer::new(3, 8, 0.0, 100, controller(true, 2), &Device::Cpu).unwrap();

        let outcome = trainer.train(&scene, Arc::default()).unwrap();
        assert_eq!(outcome, Outcome::StoppedEarly { step: 4 });
    }

    #[test]
    fn test_interrupt_stops_before_first_step() {
        let args = Args::parse_from(["fit", "--views", "2", "--test-views", "1", "--size", "8"]);
        let scene = scene(&args);
        let mut trainer = Trainer::new(3, 8, 0.05, 10, controller(true, 2), &Device::Cpu).unwrap();

        let interrupted = Arc::new(AtomicBool::new(true));
        let outcome = trainer.train(&scene, interrupted).unwrap();
        assert_eq!(outcome, Outcome::Interrupted { step: 1 });
    }
}
