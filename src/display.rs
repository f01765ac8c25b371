use std::io::Write;

use crate::metrics::MetricsSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// One-off message for the user, e.g. the answer to a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Where metrics end up. The tracker never formats for a specific surface.
pub trait DisplaySink {
    fn render(&mut self, snapshot: &MetricsSnapshot);
    fn notify(&mut self, notice: Notice);
}

/// Keeps everything it is given. Backs the one-shot CLI commands and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub snapshots: Vec<MetricsSnapshot>,
    pub notices: Vec<Notice>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_snapshot(&self) -> Option<&MetricsSnapshot> {
        self.snapshots.last()
    }

    pub fn last_notice(&self) -> Option<&Notice> {
        self.notices.last()
    }
}

impl DisplaySink for MemorySink {
    fn render(&mut self, snapshot: &MetricsSnapshot) {
        self.snapshots.push(snapshot.clone());
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

/// Writes one status line per refresh, for piping into other tools.
pub struct LineSink<W: Write> {
    out: W,
    last_line: Option<String>,
}

impl<W: Write> LineSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_line: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DisplaySink for LineSink<W> {
    fn render(&mut self, snapshot: &MetricsSnapshot) {
        let line = snapshot.status_text();
        // Idle refreshes repeat the same line
        if self.last_line.as_deref() == Some(line.as_str()) {
            return;
        }
        if writeln!(self.out, "{line}").and_then(|_| self.out.flush()).is_err() {
            tracing::warn!("status output closed");
        }
        self.last_line = Some(line);
    }

    fn notify(&mut self, notice: Notice) {
        let prefix = match notice.level {
            NoticeLevel::Info => "",
            NoticeLevel::Error => "error: ",
        };
        if writeln!(self.out, "{prefix}{}", notice.text)
            .and_then(|_| self.out.flush())
            .is_err()
        {
            tracing::warn!("status output closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_sink_skips_repeated_lines() {
        let mut sink = LineSink::new(Vec::new());
        let snap = MetricsSnapshot::compute(11, 2, 60_000, 0, 50);

        sink.render(&snap);
        sink.render(&snap);
        sink.notify(Notice::error("disk full"));

        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            out,
            "| * 0 Pts | 1m | 2 Words | 11 CPM / 0 WPM\nerror: disk full\n"
        );
    }

    #[test]
    fn memory_sink_records() {
        let mut sink = MemorySink::new();
        sink.notify(Notice::info("hi"));
        assert_eq!(sink.last_notice(), Some(&Notice::info("hi")));
        assert!(sink.last_snapshot().is_none());
    }
}
