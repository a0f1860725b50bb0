use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;
use ratatui::widgets::WidgetRef;

/// One dispatched message and its delivery status.
#[derive(Debug)]
pub(crate) struct TranscriptEntry {
    pub(crate) text: String,
    pub(crate) delivered: bool,
}

/// Minimal history view above the composer. The composer itself knows
/// nothing about this widget; it only exists so the binary shows where
/// submissions end up.
pub(crate) struct TranscriptWidget<'a> {
    pub(crate) entries: &'a [TranscriptEntry],
}

impl WidgetRef for TranscriptWidget<'_> {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).title("messages");
        let visible = area.height.saturating_sub(2) as usize;
        let skip = self.entries.len().saturating_sub(visible);
        let lines: Vec<Line> = self.entries[skip..]
            .iter()
            .map(|entry| {
                if entry.delivered {
                    Line::from(format!("you: {}", entry.text))
                } else {
                    Line::from(format!("you: {} (sending...)", entry.text)).dim()
                }
            })
            .collect();
        Paragraph::new(lines).block(block).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect()
    }

    #[test]
    fn shows_most_recent_entries_with_delivery_status() {
        let entries = vec![
            TranscriptEntry {
                text: "older".to_string(),
                delivered: true,
            },
            TranscriptEntry {
                text: "hello".to_string(),
                delivered: true,
            },
            TranscriptEntry {
                text: "pending".to_string(),
                delivered: false,
            },
        ];
        let mut terminal = match Terminal::new(TestBackend::new(30, 4)) {
            Ok(terminal) => terminal,
            Err(e) => panic!("failed to create terminal: {e}"),
        };
        if let Err(e) = terminal.draw(|frame| {
            frame.render_widget_ref(TranscriptWidget { entries: &entries }, frame.area());
        }) {
            panic!("failed to draw transcript: {e}");
        }

        // Two visible rows; the oldest entry is scrolled out.
        let buf = terminal.backend().buffer();
        assert!(row_text(buf, 1).contains("you: hello"));
        assert!(row_text(buf, 2).contains("you: pending (sending...)"));
    }
}
