// Destinations for metric observations.
//
// Reporting is best effort: the controller logs sink failures and carries on,
// so a sink never influences the stop decision.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("metrics sink I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("metrics sink unavailable: {0}")]
    Unavailable(String),
}

pub trait MetricsSink: Send {
    fn report(&mut self, key: &str, value: f64, step: u64) -> Result<(), SinkError>;
}

impl<S: MetricsSink + ?Sized> MetricsSink for Box<S> {
    fn report(&mut self, key: &str, value: f64, step: u64) -> Result<(), SinkError> {
        (**self).report(key, value, step)
    }
}

/// Drops every observation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn report(&mut self, _key: &str, _value: f64, _step: u64) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Writes observations to the `log` facade at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl MetricsSink for LogSink {
    fn report(&mut self, key: &str, value: f64, step: u64) -> Result<(), SinkError> {
        log::info!("[step {}] {} = {:.6}", step, key, value);
        Ok(())
    }
}

/// Appends `step,key,value` rows to a CSV file.
pub struct CsvSink {
    writer: BufWriter<File>,
}

impl CsvSink {
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "step,key,value")?;
        writer.flush()?;
        Ok(Self { writer })
    }
}

impl MetricsSink for CsvSink {
    fn report(&mut self, key: &str, value: f64, step: u64) -> Result<(), SinkError> {
        writeln!(self.writer, "{},{},{}", step, key, value)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_csv_sink_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");

        let mut sink = CsvSink::create(&path).unwrap();
        sink.report("early_stopping_test/ssim", 0.5, 10).unwrap();
        sink.report("early_stopping_test/ssim", 0.75, 20).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines,
            vec![
                "step,key,value",
                "10,early_stopping_test/ssim,0.5",
                "20,early_stopping_test/ssim,0.75",
            ]
        );
    }

    #[test]
    fn test_csv_sink_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("metrics.csv");
        assert!(CsvSink::create(path).is_err());
    }

    #[test]
    fn test_boxed_sinks_forward() {
        let mut sinks: Vec<Box<dyn MetricsSink>> = vec![Box::new(NoopSink), Box::new(LogSink)];
        for sink in sinks.iter_mut() {
            assert!(sink.report("key", 1.0, 0).is_ok());
        }
    }
}
