use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::analysis::analysis_error::AnalysisError;
use crate::analysis::domain::occupancy_sample::{OccupancySample, OccupancySeries};

pub const WORKER_COLUMN: &str = "worker_count";

/// Reads `frame, time_sec, <queue columns...>[, worker_count]` with a header.
///
/// The first two columns are positional; `worker_count` is found by name
/// anywhere; every other column is a queue, labelled by its header.
pub fn read_series(path: &Path) -> Result<OccupancySeries, AnalysisError> {
    let file = File::open(path).map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_series_from(file)
}

pub fn read_series_from<R: Read>(input: R) -> Result<OccupancySeries, AnalysisError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input);

    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if header.len() < 2 {
        let missing = if header.is_empty() { "frame" } else { "time_sec" };
        return Err(AnalysisError::MissingColumn(missing.to_string()));
    }
    let worker_col = header.iter().position(|h| h == WORKER_COLUMN);
    let queue_cols: Vec<usize> = (2..header.len()).filter(|&i| Some(i) != worker_col).collect();
    let labels = queue_cols.iter().map(|&i| header[i].clone()).collect();

    let mut samples = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = record.position().map_or(0, |p| p.line());
        let field = |col: usize| -> Result<&str, AnalysisError> {
            record
                .get(col)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AnalysisError::Parse {
                    line,
                    column: header[col].clone(),
                    value: String::new(),
                })
        };
        let parse = |col: usize| -> Result<u32, AnalysisError> { parse_field(field(col)?, line, &header[col]) };

        let frame_index: u64 = parse_field(field(0)?, line, &header[0])?;
        let time_sec: f64 = parse_field(field(1)?, line, &header[1])?;
        let counts = queue_cols.iter().map(|&c| parse(c)).collect::<Result<_, _>>()?;
        let worker_count = worker_col.map(parse).transpose()?;

        samples.push(OccupancySample {
            frame_index,
            time_sec,
            counts,
            worker_count,
        });
    }

    log::debug!("Read {} samples with {} queue columns", samples.len(), queue_cols.len());
    Ok(OccupancySeries { labels, samples })
}

fn parse_field<T: FromStr>(value: &str, line: u64, column: &str) -> Result<T, AnalysisError> {
    value.parse().map_err(|_| AnalysisError::Parse {
        line,
        column: column.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_reads_queue_and_worker_columns() {
        let csv = "frame,time_sec,queue_1,worker_count,queue_2\n\
                   0,0.0,3,2,1\n\
                   1,0.5,2,2,0\n";
        let series = read_series_from(csv.as_bytes()).unwrap();

        assert_eq!(series.labels, vec!["queue_1", "queue_2"]);
        assert_eq!(series.samples.len(), 2);
        assert_eq!(
            series.samples[1],
            OccupancySample::new(1, 0.5, vec![2, 0]).with_workers(2)
        );
    }

    #[test]
    fn test_without_worker_column() {
        let csv = "frame,time_sec,left,right\n0,0,1,2\n";
        let series = read_series_from(csv.as_bytes()).unwrap();
        assert_eq!(series.labels, vec!["left", "right"]);
        assert_eq!(series.samples[0].worker_count, None);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let csv = "frame,time_sec,queue_1\n0,0,1\n\n1,1,0\n";
        let series = read_series_from(csv.as_bytes()).unwrap();
        assert_eq!(series.samples.len(), 2);
    }

    #[test]
    fn test_parse_error_reports_line_and_column() {
        let csv = "frame,time_sec,queue_1\n0,0,1\n1,1,-2\n";
        let err = read_series_from(csv.as_bytes()).unwrap_err();
        match err {
            AnalysisError::Parse { line, column, value } => {
                assert_eq!(line, 3);
                assert_eq!(column, "queue_1");
                assert_eq!(value, "-2");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_short_row_is_parse_error() {
        let csv = "frame,time_sec,queue_1,queue_2\n0,0,1\n";
        assert!(matches!(
            read_series_from(csv.as_bytes()),
            Err(AnalysisError::Parse { column, .. }) if column == "queue_2"
        ));
    }

    #[test]
    fn test_nan_time_is_rejected_by_analysis() {
        use crate::analysis::domain::throughput_estimator::analyze_series;

        let csv = "frame,time_sec,queue_1\n0,0,4\n1,NaN,2\n";
        let series = read_series_from(csv.as_bytes()).unwrap();
        assert!(matches!(
            analyze_series(&series),
            Err(AnalysisError::NonFiniteTime { index: 1, .. })
        ));
    }

    #[test]
    fn test_missing_time_column() {
        let csv = "frame\n0\n";
        assert!(matches!(
            read_series_from(csv.as_bytes()),
            Err(AnalysisError::MissingColumn(c)) if c == "time_sec"
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            read_series(Path::new("/nonexistent/counts.csv")),
            Err(AnalysisError::Io { .. })
        ));
    }

    #[test]
    fn test_reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "frame,time_sec,queue_1").unwrap();
        writeln!(file, "0,0.0,4").unwrap();
        writeln!(file, "1,2.0,0").unwrap();

        let series = read_series(file.path()).unwrap();
        assert_eq!(series.samples.len(), 2);
        assert_eq!(series.samples[0].counts, vec![4]);
    }
}
