//! Offline queue throughput and wait estimation.
//!
//! Applies Little's Law (`L = λW`) per queue column of a recorded occupancy
//! series. Departures are inferred from drops in occupancy between
//! consecutive samples, so arrivals and departures that cancel out within one
//! sampling interval go unseen.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::analysis::analysis_error::AnalysisError;

use super::occupancy_sample::{OccupancySample, OccupancySeries};

/// Estimated time in queue.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ExpectedWait {
    Seconds(f64),
    /// No departures were observed.
    Unbounded,
}

impl ExpectedWait {
    pub fn seconds(self) -> Option<f64> {
        match self {
            Self::Seconds(s) => Some(s),
            Self::Unbounded => None,
        }
    }
}

impl fmt::Display for ExpectedWait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seconds(s) => write!(f, "{s:.2}s"),
            Self::Unbounded => f.write_str("inf"),
        }
    }
}

/// Seconds as a number, unbounded as the string `"inf"`.
impl Serialize for ExpectedWait {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Seconds(s) => serializer.serialize_f64(*s),
            Self::Unbounded => serializer.serialize_str("inf"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueueReport {
    pub label: String,
    pub avg_occupancy: f64,
    pub departures: u64,
    pub throughput_per_sec: f64,
    pub expected_wait: ExpectedWait,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct WorkerSummary {
    pub mean: f64,
    pub min: u32,
    pub max: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ThroughputReport {
    pub total_time: f64,
    pub samples: usize,
    pub queues: Vec<QueueReport>,
    pub workers: Option<WorkerSummary>,
}

/// Analyzes samples whose queue columns are named `queue_1..queue_k`.
pub fn analyze(samples: &[OccupancySample]) -> Result<ThroughputReport, AnalysisError> {
    let columns = samples.first().map_or(0, |s| s.counts.len());
    let labels: Vec<String> = (1..=columns).map(|i| format!("queue_{i}")).collect();
    analyze_labeled(samples, &labels)
}

pub fn analyze_series(series: &OccupancySeries) -> Result<ThroughputReport, AnalysisError> {
    analyze_labeled(&series.samples, &series.labels)
}

/// Per-queue Little's Law estimates. Fails without a partial report if the
/// input is empty or ragged.
pub fn analyze_labeled(
    samples: &[OccupancySample],
    labels: &[String],
) -> Result<ThroughputReport, AnalysisError> {
    let (first, last) = match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(AnalysisError::EmptyInput),
    };
    validate(samples, labels.len())?;

    let mut total_time = last.time_sec - first.time_sec;
    if total_time <= 0.0 {
        total_time = last.time_sec.max(1.0);
    }

    let queues = labels
        .iter()
        .enumerate()
        .map(|(q, label)| {
            let column: Vec<u32> = samples.iter().map(|s| s.counts[q]).collect();
            queue_report(label, &column, total_time)
        })
        .collect();

    Ok(ThroughputReport {
        total_time,
        samples: samples.len(),
        queues,
        workers: worker_summary(samples),
    })
}

fn validate(samples: &[OccupancySample], columns: usize) -> Result<(), AnalysisError> {
    let with_workers = samples[0].worker_count.is_some();
    for (index, sample) in samples.iter().enumerate() {
        if sample.counts.len() != columns {
            return Err(AnalysisError::InconsistentColumns {
                index,
                expected: columns,
                found: sample.counts.len(),
            });
        }
        if !sample.time_sec.is_finite() {
            return Err(AnalysisError::NonFiniteTime {
                index,
                value: sample.time_sec,
            });
        }
        if sample.worker_count.is_some() != with_workers {
            return Err(AnalysisError::MixedWorkerCounts);
        }
    }
    Ok(())
}

fn queue_report(label: &str, column: &[u32], total_time: f64) -> QueueReport {
    let avg_occupancy = column.iter().map(|&c| c as f64).sum::<f64>() / column.len() as f64;
    let departures: u64 = column
        .windows(2)
        .map(|pair| pair[0].saturating_sub(pair[1]) as u64)
        .sum();
    let throughput_per_sec = if total_time > 0.0 {
        departures as f64 / total_time
    } else {
        0.0
    };
    let expected_wait = if throughput_per_sec > 0.0 {
        ExpectedWait::Seconds(avg_occupancy / throughput_per_sec)
    } else {
        ExpectedWait::Unbounded
    };

    QueueReport {
        label: label.to_string(),
        avg_occupancy,
        departures,
        throughput_per_sec,
        expected_wait,
    }
}

fn worker_summary(samples: &[OccupancySample]) -> Option<WorkerSummary> {
    let counts: Vec<u32> = samples.iter().filter_map(|s| s.worker_count).collect();
    let min = *counts.iter().min()?;
    let max = *counts.iter().max()?;
    let mean = counts.iter().map(|&c| c as f64).sum::<f64>() / counts.len() as f64;
    Some(WorkerSummary { mean, min, max })
}

impl fmt::Display for ThroughputReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Total time (s): {:.2}, frames: {}",
            self.total_time, self.samples
        )?;
        if let Some(w) = &self.workers {
            writeln!(f)?;
            writeln!(f, "Worker statistics:")?;
            writeln!(f, "  Average workers detected: {:.2}", w.mean)?;
            writeln!(f, "  Min workers: {}, Max workers: {}", w.min, w.max)?;
        }
        writeln!(f)?;
        writeln!(f, "Queue statistics:")?;
        for q in &self.queues {
            writeln!(
                f,
                "  {}: avg occupancy={:.2}, departures={}, throughput={:.3}/s, est avg wait={}",
                q.label, q.avg_occupancy, q.departures, q.throughput_per_sec, q.expected_wait
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn series(times: &[f64], counts: &[u32]) -> Vec<OccupancySample> {
        times
            .iter()
            .zip(counts)
            .enumerate()
            .map(|(i, (&t, &c))| OccupancySample::new(i as u64, t, vec![c]))
            .collect()
    }

    #[test]
    fn test_littles_law_on_alternating_series() {
        let times: Vec<f64> = (0..10).map(|i| i as f64 * 10.0 / 9.0).collect();
        let counts: Vec<u32> = (0..10).map(|i| if i % 2 == 0 { 6 } else { 2 }).collect();
        let report = analyze(&series(&times, &counts)).unwrap();

        assert_relative_eq!(report.total_time, 10.0, epsilon = 1e-9);
        let q = &report.queues[0];
        assert_eq!(q.label, "queue_1");
        assert_relative_eq!(q.avg_occupancy, 4.0);
        assert_eq!(q.departures, 20);
        assert_relative_eq!(q.throughput_per_sec, 2.0, epsilon = 1e-9);
        assert_relative_eq!(q.expected_wait.seconds().unwrap(), 2.0, epsilon = 1e-9);
        assert!(report.workers.is_none());
    }

    #[test]
    fn test_constant_occupancy_is_unbounded() {
        let report = analyze(&series(&[0.0, 1.0, 2.0], &[3, 3, 3])).unwrap();
        let q = &report.queues[0];
        assert_eq!(q.departures, 0);
        assert_eq!(q.throughput_per_sec, 0.0);
        assert_eq!(q.expected_wait, ExpectedWait::Unbounded);
    }

    #[test]
    fn test_increases_are_not_departures() {
        let report = analyze(&series(&[0.0, 1.0, 2.0, 3.0], &[1, 4, 2, 5])).unwrap();
        assert_eq!(report.queues[0].departures, 2);
    }

    #[rstest]
    #[case(&[5.0], 5.0)]
    #[case(&[0.0], 1.0)]
    #[case(&[0.4], 1.0)]
    #[case(&[3.0, 3.0], 3.0)]
    #[case(&[4.0, 2.0], 2.0)]
    fn test_total_time_clamped(#[case] times: &[f64], #[case] expected: f64) {
        let counts = vec![1; times.len()];
        let report = analyze(&series(times, &counts)).unwrap();
        assert_relative_eq!(report.total_time, expected);
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(matches!(analyze(&[]), Err(AnalysisError::EmptyInput)));
    }

    #[test]
    fn test_ragged_columns_fail() {
        let samples = vec![
            OccupancySample::new(0, 0.0, vec![1, 2]),
            OccupancySample::new(1, 1.0, vec![1]),
        ];
        assert!(matches!(
            analyze(&samples),
            Err(AnalysisError::InconsistentColumns {
                index: 1,
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn test_mixed_worker_counts_fail() {
        let samples = vec![
            OccupancySample::new(0, 0.0, vec![1]).with_workers(2),
            OccupancySample::new(1, 1.0, vec![1]),
        ];
        assert!(matches!(
            analyze(&samples),
            Err(AnalysisError::MixedWorkerCounts)
        ));
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    #[case(f64::NEG_INFINITY)]
    fn test_non_finite_time_fails(#[case] bad: f64) {
        let samples = series(&[0.0, bad, 2.0], &[4, 2, 1]);
        assert!(matches!(
            analyze(&samples),
            Err(AnalysisError::NonFiniteTime { index: 1, .. })
        ));
    }

    #[test]
    fn test_worker_summary() {
        let samples = vec![
            OccupancySample::new(0, 0.0, vec![1]).with_workers(2),
            OccupancySample::new(1, 1.0, vec![0]).with_workers(3),
            OccupancySample::new(2, 2.0, vec![0]).with_workers(4),
        ];
        let workers = analyze(&samples).unwrap().workers.unwrap();
        assert_relative_eq!(workers.mean, 3.0);
        assert_eq!((workers.min, workers.max), (2, 4));
    }

    #[test]
    fn test_labels_follow_series() {
        let series = OccupancySeries {
            labels: vec!["left".into(), "right".into()],
            samples: vec![
                OccupancySample::new(0, 0.0, vec![2, 0]),
                OccupancySample::new(1, 1.0, vec![1, 0]),
            ],
        };
        let report = analyze_series(&series).unwrap();
        assert_eq!(report.queues[0].label, "left");
        assert_eq!(report.queues[1].label, "right");
        assert_eq!(report.queues[0].departures, 1);
    }

    #[test]
    fn test_json_renders_unbounded_as_inf() {
        let report = analyze(&series(&[0.0, 1.0], &[2, 2])).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["queues"][0]["expected_wait"], "inf");

        let report = analyze(&series(&[0.0, 1.0], &[2, 0])).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["queues"][0]["expected_wait"], 0.5);
    }

    #[test]
    fn test_text_report() {
        let samples = vec![
            OccupancySample::new(0, 0.0, vec![2]).with_workers(1),
            OccupancySample::new(1, 2.0, vec![2]).with_workers(1),
        ];
        let text = analyze(&samples).unwrap().to_string();
        assert!(text.contains("Total time (s): 2.00, frames: 2"));
        assert!(text.contains("Min workers: 1, Max workers: 1"));
        assert!(text.contains("queue_1: avg occupancy=2.00, departures=0"));
        assert!(text.contains("est avg wait=inf"));
    }
}
