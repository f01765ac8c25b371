use codetime::display::{DisplaySink, Notice, NoticeLevel};
use codetime::metrics::{Band, MetricsSnapshot};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 1;

/// Display sink for the terminal: keeps the latest snapshot and notice for
/// the next draw.
#[derive(Debug, Default)]
pub struct StatusBar {
    pub snapshot: Option<MetricsSnapshot>,
    pub notice: Option<Notice>,
}

impl DisplaySink for StatusBar {
    fn render(&mut self, snapshot: &MetricsSnapshot) {
        self.snapshot = Some(snapshot.clone());
    }

    fn notify(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }
}

pub fn band_style(band: Band) -> Style {
    match band {
        Band::Over => Style::default().bg(Color::Red).fg(Color::White),
        Band::OnTarget => Style::default().bg(Color::Yellow).fg(Color::Black),
        Band::Under => Style::default(),
    }
}

/// Only the tail of the buffer that fits in `height` wrapped rows of `width`.
fn visible_tail(text: &str, width: u16, height: u16) -> String {
    let width = usize::from(width.max(1));
    let mut rows = 0usize;
    let mut lines = Vec::new();

    for line in text.rsplit('\n') {
        rows += line.chars().count().max(1).div_ceil(width);
        if rows > usize::from(height) && !lines.is_empty() {
            break;
        }
        lines.push(line);
    }

    lines.reverse();
    lines.join("\n")
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);

        let notice_lines = self
            .tracker
            .sink()
            .notice
            .as_ref()
            .map(|n| n.text.lines().count() as u16 + 2)
            .unwrap_or(0);

        let details = self
            .show_details
            .then(|| self.tracker.sink().snapshot.as_ref())
            .flatten()
            .map(|snapshot| snapshot.tooltip());
        let details_lines = details
            .as_ref()
            .map(|d| d.lines().count() as u16 + 2)
            .unwrap_or(0);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(notice_lines),
                Constraint::Length(details_lines),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        let editor_block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", self.language));
        let inner = editor_block.inner(chunks[0]);
        Paragraph::new(visible_tail(&self.buffer, inner.width, inner.height))
            .block(editor_block)
            .wrap(Wrap { trim: false })
            .render(chunks[0], buf);

        if let Some(notice) = &self.tracker.sink().notice {
            let (title, color) = match notice.level {
                NoticeLevel::Info => (" info ", Color::Cyan),
                NoticeLevel::Error => (" error ", Color::Red),
            };
            Paragraph::new(notice.text.as_str())
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(title)
                        .border_style(Style::default().fg(color)),
                )
                .render(chunks[1], buf);
        }

        if let Some(details) = details {
            Paragraph::new(details)
                .block(Block::default().borders(Borders::ALL).title(" details "))
                .render(chunks[2], buf);
        }

        if let Some(snapshot) = &self.tracker.sink().snapshot {
            let state = if self.tracker.is_active() {
                Span::styled(" typing ", bold_style.fg(Color::Green))
            } else {
                Span::styled(" idle ", dim_style)
            };
            Paragraph::new(Line::from(vec![
                Span::styled(snapshot.status_text(), band_style(snapshot.band)),
                state,
            ]))
            .render(chunks[3], buf);
        }

        Paragraph::new(Span::styled(
            "ctrl-t time  ctrl-l languages  ctrl-d details  ctrl-r reset  esc quit",
            dim_style.add_modifier(Modifier::ITALIC),
        ))
        .render(chunks[4], buf);
    }
}
