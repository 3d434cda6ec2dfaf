mod args;
mod scene;
mod training;
mod utils;

use args::Args;
use clap::Parser;
use log::LevelFilter;
use scene::Scene;
use simplelog::{Config, SimpleLogger, WriteLogger};
use std::error::Error;
use std::fs::File;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use stopping::{CsvSink, LogSink, MetricsSink, StopController};
use training::{Outcome, Trainer};
use crate::utils::device::get_device;

fn main() -> Result<(), Box<dyn Error>> {
    let args = init()?;

    // Steps per epoch: one training view per step
    let steps_per_epoch = args.views as u64;
    let config = args.early_stopping.clone().into_config(steps_per_epoch)?;

    let device = get_device()?;

    log::info!("Generating scene with {} training and {} test views", args.views, args.test_views);
    let scene = Scene::generate(&args, &device)?;

    let sink: Box<dyn MetricsSink> = match &args.metrics_file {
        Some(path) => {
            log::info!("Writing metrics to {}", path.display());
            Box::new(CsvSink::create(path)?)
        }
        None => Box::new(LogSink),
    };
    let controller = StopController::with_sink(config, device.clone(), sink)?;

    let config = controller.config();
    if config.enabled {
        log::info!(
            "Early stopping every {} steps from step {} with patience {} and tolerance {} (grace: [{}])",
            config.check_interval,
            config.start_step,
            config.patience,
            config.tolerance,
            config.grace_periods
        );
    }

    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_handler = Arc::clone(&interrupted);

    ctrlc::set_handler(move || {
        log::info!("Received SIGINT, stopping training...");
        interrupted_handler.store(true, Ordering::Relaxed);
    })?;

    let mut trainer = Trainer::new(
        args.channels,
        args.size,
        args.learning_rate,
        args.steps,
        controller,
        &device,
    )?;

    match trainer.train(&scene, interrupted)? {
        Outcome::Completed { steps } => log::info!("Finished all {} steps", steps),
        Outcome::StoppedEarly { step } => log::info!("Stopped early at step {}", step),
        Outcome::Interrupted { step } => log::info!("Interrupted at step {}", step),
    }

    if let Some(path) = &args.output {
        trainer.save(path)?;
    }

    log::info!("Done!");
    Ok(())
}

fn init() -> Result<Args, Box<dyn Error>> {
    let args = Args::parse();

    match &args.log_file {
        Some(log_file) => WriteLogger::init(
            LevelFilter::Debug,
            Config::default(),
            File::create(log_file)?,
        )?,
        None => SimpleLogger::init(LevelFilter::Info, Config::default())?,
    }

    Ok(args)
}
