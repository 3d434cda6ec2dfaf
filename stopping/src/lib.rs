pub mod config;
pub mod controller;
pub mod detector;
pub mod error;
pub mod grace;
pub mod sink;
pub mod view;

pub use config::{EarlyStoppingArgs, EarlyStoppingConfig};
pub use controller::{StopController, SSIM_METRIC_KEY};
pub use detector::{PlateauDetector, DEFAULT_TOLERANCE};
pub use error::{Error, Result};
pub use grace::{is_in_grace, parse_grace_periods, GracePeriod, GraceSchedule};
pub use sink::{CsvSink, LogSink, MetricsSink, NoopSink, SinkError};
pub use view::EvaluationView;
