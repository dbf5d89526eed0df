//! Sink workers and output formatting.
//!
//! # Responsibilities
//! - Own each sink's writer inside a dedicated worker task
//! - Format events (text template for console/debug, JSON lines for file)
//! - Roll the file sink over to a new file when the UTC date changes
//! - Contain write failures: drop the event, self-log once per burst
//!
//! # Design Decisions
//! - One worker per sink serializes physical writes; no locks on the
//!   emission path
//! - Events arrive as `Arc<LogEvent>` so fan-out to several sinks does not
//!   clone the event
//! - Rollover is keyed by calendar date, never by size; file names follow
//!   `<prefix><YYYY-MM-DD>.<ext>`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{NaiveDate, SecondsFormat, Utc};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, Stderr, Stdout};
use tokio::sync::{mpsc, oneshot};

use crate::logging::event::LogEvent;

/// Default template for the console sink.
pub const CONSOLE_TEMPLATE: &str = "{timestamp} [{level}] {source}: {message}";

/// Default template for the debug sink (compact, no timestamp).
pub const DEBUG_TEMPLATE: &str = "[{level}] {source}: {message}";

/// Messages accepted by a sink worker.
pub(crate) enum SinkMessage {
    Event(Arc<LogEvent>),
    /// Flush barrier: everything sent before it is on the sink when the
    /// acknowledgement fires.
    Flush(oneshot::Sender<()>),
}

/// The writer side of one configured sink.
pub(crate) enum SinkTarget {
    Console(Stdout),
    Debug(Stderr),
    File(RollingFile),
    #[cfg(test)]
    Test(TestWriter),
}

/// In-memory writer with a switchable failure mode, for exercising the
/// worker's failure handling.
#[cfg(test)]
pub(crate) struct TestWriter {
    pub(crate) fail: std::sync::Arc<std::sync::atomic::AtomicBool>,
    pub(crate) lines: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
}

#[cfg(test)]
impl TestWriter {
    fn write_line(&self, line: &str) -> std::io::Result<()> {
        if self.fail.load(std::sync::atomic::Ordering::Acquire) {
            return Err(std::io::Error::other("injected write failure"));
        }
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(line.to_string());
        Ok(())
    }
}

impl SinkTarget {
    pub(crate) fn console() -> Self {
        SinkTarget::Console(tokio::io::stdout())
    }

    pub(crate) fn debug() -> Self {
        SinkTarget::Debug(tokio::io::stderr())
    }

    pub(crate) async fn file(
        directory: &Path,
        prefix: &str,
        extension: &str,
    ) -> std::io::Result<Self> {
        Ok(SinkTarget::File(
            RollingFile::open(directory, prefix, extension).await?,
        ))
    }

    fn format(&self, event: &LogEvent, template: Option<&str>) -> String {
        match self {
            SinkTarget::Console(_) => render(template.unwrap_or(CONSOLE_TEMPLATE), event),
            SinkTarget::Debug(_) => render(template.unwrap_or(DEBUG_TEMPLATE), event),
            // Structured output: properties stay queryable.
            SinkTarget::File(_) => {
                serde_json::to_string(event).unwrap_or_else(|_| event.message.clone())
            }
            #[cfg(test)]
            SinkTarget::Test(_) => render(template.unwrap_or(DEBUG_TEMPLATE), event),
        }
    }

    async fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        match self {
            SinkTarget::Console(out) => {
                out.write_all(line.as_bytes()).await?;
                out.write_all(b"\n").await
            }
            SinkTarget::Debug(err) => {
                err.write_all(line.as_bytes()).await?;
                err.write_all(b"\n").await
            }
            SinkTarget::File(file) => file.write_line(line).await,
            #[cfg(test)]
            SinkTarget::Test(writer) => writer.write_line(line),
        }
    }

    async fn flush(&mut self) -> std::io::Result<()> {
        match self {
            SinkTarget::Console(out) => out.flush().await,
            SinkTarget::Debug(err) => err.flush().await,
            SinkTarget::File(file) => file.flush().await,
            #[cfg(test)]
            SinkTarget::Test(_) => Ok(()),
        }
    }
}

/// Append-only log file reopened on every UTC date change.
pub(crate) struct RollingFile {
    directory: PathBuf,
    prefix: String,
    extension: String,
    current_date: NaiveDate,
    file: File,
}

impl RollingFile {
    pub(crate) async fn open(
        directory: &Path,
        prefix: &str,
        extension: &str,
    ) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(directory).await?;
        let today = Utc::now().date_naive();
        let file = open_append(&file_path(directory, prefix, extension, today)).await?;
        Ok(Self {
            directory: directory.to_path_buf(),
            prefix: prefix.to_string(),
            extension: extension.to_string(),
            current_date: today,
            file,
        })
    }

    async fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        let today = Utc::now().date_naive();
        if today != self.current_date {
            self.file.flush().await?;
            self.file =
                open_append(&file_path(&self.directory, &self.prefix, &self.extension, today))
                    .await?;
            self.current_date = today;
        }
        self.file.write_all(line.as_bytes()).await?;
        self.file.write_all(b"\n").await
    }

    async fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush().await
    }
}

/// `<prefix><YYYY-MM-DD>.<ext>` inside the sink directory.
pub(crate) fn file_path(
    directory: &Path,
    prefix: &str,
    extension: &str,
    date: NaiveDate,
) -> PathBuf {
    directory.join(format!("{}{}.{}", prefix, date.format("%Y-%m-%d"), extension))
}

async fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path).await
}

fn render(template: &str, event: &LogEvent) -> String {
    let mut line = template
        .replace(
            "{timestamp}",
            &event.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        )
        .replace("{level}", event.level.label())
        .replace("{source}", &event.source)
        .replace("{message}", &event.message);
    if let Some(fault) = &event.fault {
        line.push_str(&format!(" ({}: {})", fault.kind, fault.message));
    }
    line
}

/// Tracks a sink's failure burst. Only the first failure after a success
/// is reported; a burst ends on the next successful write.
#[derive(Debug, Default)]
struct FailureBurst {
    in_burst: bool,
}

impl FailureBurst {
    /// Returns true when this failure opens a new burst and should be
    /// self-logged.
    fn record_failure(&mut self) -> bool {
        !std::mem::replace(&mut self.in_burst, true)
    }

    fn record_success(&mut self) {
        self.in_burst = false;
    }
}

/// Worker loop for one sink. Owns the writer; exits when the channel closes.
///
/// Write failures never reach producers: the event is dropped and the
/// failure is reported to stderr once per burst. A burst ends on the first
/// successful write.
pub(crate) async fn run_sink(
    name: String,
    mut target: SinkTarget,
    template: Option<String>,
    mut rx: mpsc::UnboundedReceiver<SinkMessage>,
) {
    let mut burst = FailureBurst::default();
    while let Some(message) = rx.recv().await {
        match message {
            SinkMessage::Event(event) => {
                let line = target.format(&event, template.as_deref());
                match target.write_line(&line).await {
                    Ok(()) => burst.record_success(),
                    Err(e) => {
                        if burst.record_failure() {
                            eprintln!(
                                "weathercast: sink '{}' write failed, dropping events: {}",
                                name, e
                            );
                        }
                    }
                }
            }
            SinkMessage::Flush(ack) => {
                let _ = target.flush().await;
                let _ = ack.send(());
            }
        }
    }
    let _ = target.flush().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::event::{Level, LogEvent};

    #[test]
    fn file_path_follows_naming_pattern() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();
        let path = file_path(Path::new("/var/log/weathercast"), "weathercast-", "log", date);
        assert_eq!(
            path,
            PathBuf::from("/var/log/weathercast/weathercast-2026-08-23.log")
        );
    }

    #[test]
    fn render_fills_placeholders() {
        let event = LogEvent::new(Level::Warning, "weathercast.http", "slow request");
        let line = render(DEBUG_TEMPLATE, &event);
        assert_eq!(line, "[WARN] weathercast.http: slow request");
    }

    #[test]
    fn burst_reports_only_its_first_failure() {
        let mut burst = FailureBurst::default();
        assert!(burst.record_failure(), "first failure opens the burst");
        assert!(!burst.record_failure(), "later failures stay silent");
        assert!(!burst.record_failure());
        burst.record_success();
        assert!(burst.record_failure(), "a success ends the burst");
    }

    #[tokio::test]
    async fn worker_drops_events_while_failing_and_recovers() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::{Arc, Mutex};

        let fail = Arc::new(AtomicBool::new(false));
        let lines = Arc::new(Mutex::new(Vec::new()));
        let target = SinkTarget::Test(TestWriter {
            fail: fail.clone(),
            lines: lines.clone(),
        });
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_sink("test".to_string(), target, None, rx));

        let emit = |message: &str| {
            tx.send(SinkMessage::Event(Arc::new(LogEvent::new(
                Level::Information,
                "app",
                message,
            ))))
            .unwrap();
        };
        // Flush barrier synchronizes with the worker so the failure switch
        // lands between events.
        let barrier = |tx: &mpsc::UnboundedSender<SinkMessage>| {
            let (ack_tx, ack_rx) = oneshot::channel();
            tx.send(SinkMessage::Flush(ack_tx)).unwrap();
            ack_rx
        };

        emit("before");
        barrier(&tx).await.unwrap();

        fail.store(true, Ordering::Release);
        emit("dropped-1");
        emit("dropped-2");
        barrier(&tx).await.unwrap();

        fail.store(false, Ordering::Release);
        emit("after");
        barrier(&tx).await.unwrap();

        let written = lines.lock().unwrap();
        assert_eq!(written.len(), 2, "failed writes are dropped, not retried");
        assert!(written[0].contains("before"));
        assert!(written[1].contains("after"));
    }
}

