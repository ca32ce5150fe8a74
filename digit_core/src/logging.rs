//! JSON-lines run journals.
//!
//! Each call appends one record per line to `training.jsonl` or
//! `evaluation.jsonl` inside the given directory, creating it on demand.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::driver::EvaluationReport;
use crate::learner::{TrainingMode, TrainingResult};

pub const TRAINING_LOG: &str = "training.jsonl";
pub const EVALUATION_LOG: &str = "evaluation.jsonl";

fn append_json_line<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    serde_json::to_writer(&mut file, value)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    file.write_all(b"\n")
}

fn timestamp_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// One minimization within a training run
#[derive(Debug, Serialize)]
pub struct TrainingLogEntry {
    pub mode: TrainingMode,
    /// `digit <k>` for one-vs-rest, `multinomial` otherwise
    pub head: String,
    pub initial_loss: f64,
    pub final_loss: f64,
    pub iterations: u64,
    pub evaluations: u64,
    pub termination: String,
    pub timestamp_ms: u128,
}

pub fn log_training_run(dir: &Path, result: &TrainingResult) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let mode = result.mode();
    let timestamp_ms = timestamp_ms();

    for (index, report) in result.reports.iter().enumerate() {
        let head = match mode {
            TrainingMode::OneVsRest => format!("digit {index}"),
            TrainingMode::Multinomial => "multinomial".to_string(),
        };
        let entry = TrainingLogEntry {
            mode,
            head,
            initial_loss: report.initial_loss,
            final_loss: report.final_loss,
            iterations: report.iterations,
            evaluations: report.evaluations,
            termination: report.termination.clone(),
            timestamp_ms,
        };
        append_json_line(dir.join(TRAINING_LOG), &entry)?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct EvaluationLogEntry<'a> {
    #[serde(flatten)]
    pub report: &'a EvaluationReport,
    pub timestamp_ms: u128,
}

pub fn log_evaluation(dir: &Path, report: &EvaluationReport) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let entry = EvaluationLogEntry {
        report,
        timestamp_ms: timestamp_ms(),
    };
    append_json_line(dir.join(EVALUATION_LOG), &entry)
}
