mod progress;
mod trainer;

pub use trainer::{Outcome, Trainer};
