use std::path::PathBuf;

use clap::Parser;
use stopping::EarlyStoppingArgs;

#[derive(Parser, Debug, Clone)]
#[command(name = "Fit")]
#[command(author = "Jørgen Hanssen <jorgen@hanssen.io>")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Number of training views (one step each, so also steps per epoch).
    #[arg(long, default_value_t = 16)]
    pub views: usize,

    /// Number of held-out views scored by early stopping.
    #[arg(long, default_value_t = 4)]
    pub test_views: usize,

    /// Image width and height in pixels.
    #[arg(long, default_value_t = 32)]
    pub size: usize,

    /// Channels per image.
    #[arg(long, default_value_t = 3)]
    pub channels: usize,

    /// Maximum number of training steps.
    #[arg(long, default_value_t = 30_000)]
    pub steps: u64,

    /// Learning rate for the optimizer.
    #[arg(long, default_value_t = 0.01)]
    pub learning_rate: f64,

    /// Amplitude of the per-view noise added to references.
    #[arg(long, default_value_t = 0.05)]
    pub noise: f32,

    /// Seed for the synthetic scene.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Append metric observations to this CSV file instead of the log.
    #[arg(long)]
    pub metrics_file: Option<PathBuf>,

    /// Write the log to a file instead of the terminal.
    #[arg(short, long)]
    pub log_file: Option<PathBuf>,

    /// Save the fitted image as safetensors.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub early_stopping: EarlyStoppingArgs,
}
