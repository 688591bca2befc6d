use std::io::Write;

use crossbeam_channel::Receiver;

use crate::pipeline::pipeline_event::PipelineEvent;

/// Drains events from a channel and writes each as one JSON line.
///
/// Returns when every sender is gone, or with the first write error.
pub fn write_json_lines<W: Write>(events: Receiver<PipelineEvent>, mut out: W) -> std::io::Result<u64> {
    let mut written = 0;
    for event in events {
        serde_json::to_writer(&mut out, &event)?;
        out.write_all(b"\n")?;
        out.flush()?;
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_event_per_line() {
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(PipelineEvent::CameraStarted).unwrap();
        tx.send(PipelineEvent::error("bad")).unwrap();
        drop(tx);

        let mut out = Vec::new();
        assert_eq!(write_json_lines(rx, &mut out).unwrap(), 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                r#"{"event":"camera_started"}"#,
                r#"{"event":"error","data":{"message":"bad"}}"#,
            ]
        );
    }

    #[test]
    fn test_write_error_is_returned() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(PipelineEvent::CameraStopped).unwrap();
        drop(tx);
        assert!(write_json_lines(rx, Broken).is_err());
    }
}
