use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("no samples to analyze")]
    EmptyInput,
    #[error("sample {index} has {found} queue columns, expected {expected}")]
    InconsistentColumns {
        index: usize,
        expected: usize,
        found: usize,
    },
    #[error("sample {index} has non-finite time_sec {value}")]
    NonFiniteTime { index: usize, value: f64 },
    #[error("worker_count is present on some samples but not others")]
    MixedWorkerCounts,
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing column: {0}")]
    MissingColumn(String),
    #[error("line {line}, column {column}: cannot parse {value:?}")]
    Parse {
        line: u64,
        column: String,
        value: String,
    },
}
