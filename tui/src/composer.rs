use std::cell::Cell;
use std::rc::Rc;

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyModifiers;
use ratatui::buffer::Buffer;
use ratatui::layout::Alignment;
use ratatui::layout::Constraint;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::widgets::Block;
use ratatui::widgets::BorderType;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;
use ratatui::widgets::WidgetRef;
use unicode_width::UnicodeWidthStr;

use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::focus::FocusHandle;

const PLACEHOLDER_TEXT: &str = "send a message";
/// Columns reserved for the send button, borders included.
pub(crate) const SEND_BUTTON_WIDTH: u16 = 10;
/// Rows the composer occupies: one text row plus the border.
pub(crate) const COMPOSER_HEIGHT: u16 = 3;

/// External composition state. The parent owns the draft and the gate; the
/// composer reads them and requests mutations through the setter. It never
/// keeps a copy of the draft, so the rendered field cannot diverge from it.
pub(crate) trait ComposerHost {
    fn draft(&self) -> &str;
    fn set_draft(&mut self, next: String);
    fn is_enabled(&self) -> bool;
}

/// Single-line message input plus a send button.
///
/// Submissions (plain Enter or a click on the button) are normalized by
/// trimming, the draft is cleared through the host, and non-empty results
/// are forwarded as [`AppEvent::SubmitMessage`].
pub(crate) struct Composer {
    app_event_tx: AppEventSender,
    /// Char index into the draft. The host may replace the draft underneath
    /// us, so this is clamped against the current text on every use.
    cursor: usize,
    focus: Rc<Cell<bool>>,
}

impl Composer {
    pub(crate) fn new(has_input_focus: bool, app_event_tx: AppEventSender) -> Self {
        Self {
            app_event_tx,
            cursor: 0,
            focus: Rc::new(Cell::new(has_input_focus)),
        }
    }

    /// Flag a parent attaches its [`FocusHandle`] to.
    pub(crate) fn focus_flag(&self) -> &Rc<Cell<bool>> {
        &self.focus
    }

    pub(crate) fn has_focus(&self) -> bool {
        self.focus.get()
    }

    /// Handle a key event coming from the main loop. Returns true when the
    /// UI needs to be redrawn.
    pub(crate) fn handle_key_event(
        &mut self,
        host: &mut dyn ComposerHost,
        key_event: KeyEvent,
    ) -> bool {
        match key_event.code {
            KeyCode::Enter if key_event.modifiers == KeyModifiers::NONE => {
                self.attempt_submit(host);
                true
            }
            KeyCode::Char(ch)
                if !key_event
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                let mut buf = [0u8; 4];
                self.insert_str(host, ch.encode_utf8(&mut buf));
                true
            }
            KeyCode::Backspace => {
                self.delete_before_cursor(host);
                true
            }
            KeyCode::Delete => {
                self.delete_at_cursor(host);
                true
            }
            KeyCode::Left => {
                self.cursor = self.clamped(host.draft()).saturating_sub(1);
                true
            }
            KeyCode::Right => {
                let count = host.draft().chars().count();
                self.cursor = (self.clamped(host.draft()) + 1).min(count);
                true
            }
            KeyCode::Home => {
                self.cursor = 0;
                true
            }
            KeyCode::End => {
                self.cursor = host.draft().chars().count();
                true
            }
            _ => false,
        }
    }

    /// Insert pasted text at the cursor. The field is single-line, so line
    /// breaks are flattened to spaces.
    pub(crate) fn handle_paste(&mut self, host: &mut dyn ComposerHost, pasted: String) -> bool {
        let flat = pasted.replace("\r\n", "\n").replace(['\r', '\n'], " ");
        self.insert_str(host, &flat);
        true
    }

    /// Run one submission attempt. Always safe to call.
    ///
    /// When the gate is closed this is a no-op and the draft is untouched.
    /// Otherwise the draft is cleared on every attempt, even when the
    /// trimmed text turns out empty, and a non-empty result is forwarded to
    /// the app exactly once.
    pub(crate) fn attempt_submit(&mut self, host: &mut dyn ComposerHost) {
        if !host.is_enabled() {
            return;
        }
        let normalized = host.draft().trim().to_string();
        host.set_draft(String::new());
        self.cursor = 0;
        if normalized.is_empty() {
            return;
        }
        self.app_event_tx.send(AppEvent::SubmitMessage(normalized));
    }

    /// Click path for the send button. The button is inert while the gate is
    /// closed; [`Self::attempt_submit`] re-checks the gate on its own, so a
    /// synthetic click cannot bypass it either. On an accepted click the
    /// field regains input focus through the handle. Returns true when the
    /// click was consumed.
    pub(crate) fn click_submit(
        &mut self,
        host: &mut dyn ComposerHost,
        input_focus: &FocusHandle,
    ) -> bool {
        if !host.is_enabled() {
            return false;
        }
        self.attempt_submit(host);
        input_focus.focus();
        true
    }

    /// Where the terminal cursor should sit, if the field has focus.
    pub(crate) fn cursor_pos(&self, host: &dyn ComposerHost, area: Rect) -> Option<(u16, u16)> {
        if !self.has_focus() {
            return None;
        }
        let field = layout(area).field;
        if field.width <= 2 || field.height <= 2 {
            return None;
        }
        let draft = host.draft();
        let at = byte_offset(draft, self.clamped(draft));
        let col = draft[..at].width() as u16;
        Some((field.x + 1 + col.min(field.width - 3), field.y + 1))
    }

    fn clamped(&self, draft: &str) -> usize {
        self.cursor.min(draft.chars().count())
    }

    fn insert_str(&mut self, host: &mut dyn ComposerHost, text: &str) {
        if text.is_empty() {
            return;
        }
        let (next, cursor) = {
            let draft = host.draft();
            let cur = self.clamped(draft);
            let at = byte_offset(draft, cur);
            let mut next = String::with_capacity(draft.len() + text.len());
            next.push_str(&draft[..at]);
            next.push_str(text);
            next.push_str(&draft[at..]);
            (next, cur + text.chars().count())
        };
        self.cursor = cursor;
        host.set_draft(next);
    }

    fn delete_before_cursor(&mut self, host: &mut dyn ComposerHost) {
        let (next, cursor) = {
            let draft = host.draft();
            let cur = self.clamped(draft);
            if cur == 0 {
                return;
            }
            let start = byte_offset(draft, cur - 1);
            let end = byte_offset(draft, cur);
            let mut next = String::with_capacity(draft.len());
            next.push_str(&draft[..start]);
            next.push_str(&draft[end..]);
            (next, cur - 1)
        };
        self.cursor = cursor;
        host.set_draft(next);
    }

    fn delete_at_cursor(&mut self, host: &mut dyn ComposerHost) {
        let next = {
            let draft = host.draft();
            let cur = self.clamped(draft);
            if cur == draft.chars().count() {
                return;
            }
            let start = byte_offset(draft, cur);
            let end = byte_offset(draft, cur + 1);
            let mut next = String::with_capacity(draft.len());
            next.push_str(&draft[..start]);
            next.push_str(&draft[end..]);
            next
        };
        host.set_draft(next);
    }
}

fn byte_offset(draft: &str, cursor: usize) -> usize {
    draft
        .char_indices()
        .nth(cursor)
        .map(|(idx, _)| idx)
        .unwrap_or(draft.len())
}

pub(crate) struct ComposerLayout {
    pub(crate) field: Rect,
    pub(crate) button: Rect,
}

/// Split the composer area into the text field and the send button. The app
/// uses the same split to register click regions after each draw.
pub(crate) fn layout(area: Rect) -> ComposerLayout {
    let [field, button] =
        Layout::horizontal([Constraint::Min(1), Constraint::Length(SEND_BUTTON_WIDTH)]).areas(area);
    ComposerLayout { field, button }
}

/// Render-time view pairing the composer with the host state it reflects.
pub(crate) struct ComposerView<'a> {
    pub(crate) composer: &'a Composer,
    pub(crate) host: &'a dyn ComposerHost,
}

impl WidgetRef for ComposerView<'_> {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let ComposerLayout { field, button } = layout(area);

        let (border_style, hint) = if self.composer.has_focus() {
            (
                Style::default(),
                Line::from("Enter to send").alignment(Alignment::Right),
            )
        } else {
            (Style::default().dim(), Line::from(""))
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_bottom(hint);

        let draft = self.host.draft();
        let content = if draft.is_empty() {
            Line::from(PLACEHOLDER_TEXT.dim())
        } else {
            Line::from(draft)
        };
        Paragraph::new(content).block(block).render(field, buf);

        let button_style = if self.host.is_enabled() {
            Style::default()
        } else {
            Style::default().dim()
        };
        Paragraph::new(Line::from("Send").alignment(Alignment::Center))
            .style(button_style)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded),
            )
            .render(button, buf);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::Receiver;
    use std::sync::mpsc::channel;

    use crossterm::event::KeyCode;
    use crossterm::event::KeyEvent;
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use ratatui::style::Modifier;

    use super::*;

    struct RecordingHost {
        draft: String,
        enabled: bool,
        set_calls: usize,
    }

    impl RecordingHost {
        fn new(draft: &str, enabled: bool) -> Self {
            Self {
                draft: draft.to_string(),
                enabled,
                set_calls: 0,
            }
        }
    }

    impl ComposerHost for RecordingHost {
        fn draft(&self) -> &str {
            &self.draft
        }

        fn set_draft(&mut self, next: String) {
            self.draft = next;
            self.set_calls += 1;
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }
    }

    fn composer() -> (Composer, Receiver<AppEvent>) {
        let (tx, rx) = channel();
        (Composer::new(true, AppEventSender::new(tx)), rx)
    }

    fn sent_messages(rx: &Receiver<AppEvent>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let AppEvent::SubmitMessage(text) = event {
                out.push(text);
            }
        }
        out
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn submit_trims_clears_and_sends_once() {
        let (mut composer, rx) = composer();
        let mut host = RecordingHost::new("  hello  ", true);

        composer.attempt_submit(&mut host);

        assert_eq!(host.draft, "");
        assert_eq!(host.set_calls, 1);
        assert_eq!(sent_messages(&rx), vec!["hello".to_string()]);
    }

    #[test]
    fn whitespace_only_submit_clears_but_sends_nothing() {
        for draft in ["", " ", "\t\n", "   "] {
            let (mut composer, rx) = composer();
            let mut host = RecordingHost::new(draft, true);

            composer.attempt_submit(&mut host);

            assert_eq!(host.draft, "", "draft: {draft:?}");
            assert_eq!(host.set_calls, 1, "draft: {draft:?}");
            assert_eq!(sent_messages(&rx), Vec::<String>::new(), "draft: {draft:?}");
        }
    }

    #[test]
    fn gated_submit_leaves_draft_untouched() {
        let (mut composer, rx) = composer();
        let mut host = RecordingHost::new("hi", false);

        composer.attempt_submit(&mut host);

        assert_eq!(host.draft, "hi");
        assert_eq!(host.set_calls, 0);
        assert_eq!(sent_messages(&rx), Vec::<String>::new());
    }

    #[test]
    fn gated_click_does_not_submit() {
        let (mut composer, rx) = composer();
        let mut host = RecordingHost::new("hi", false);

        let consumed = composer.click_submit(&mut host, &FocusHandle::default());

        assert!(!consumed);
        assert_eq!(host.draft, "hi");
        assert_eq!(host.set_calls, 0);
        assert_eq!(sent_messages(&rx), Vec::<String>::new());
    }

    #[test]
    fn enter_and_click_have_the_same_outcome() {
        let (mut by_key, key_rx) = composer();
        let mut key_host = RecordingHost::new("  hola  ", true);
        by_key.handle_key_event(&mut key_host, key(KeyCode::Enter));

        let (mut by_click, click_rx) = composer();
        let mut click_host = RecordingHost::new("  hola  ", true);
        by_click.click_submit(&mut click_host, &FocusHandle::default());

        assert_eq!(key_host.draft, click_host.draft);
        assert_eq!(key_host.set_calls, click_host.set_calls);
        assert_eq!(sent_messages(&key_rx), sent_messages(&click_rx));
    }

    #[test]
    fn accepted_click_refocuses_the_field() {
        let (mut composer, _rx) = composer();
        composer.focus_flag().set(false);
        let mut handle = FocusHandle::default();
        handle.attach(composer.focus_flag());
        let mut host = RecordingHost::new("hi", true);

        assert!(composer.click_submit(&mut host, &handle));
        assert!(composer.has_focus());
    }

    #[test]
    fn typing_updates_draft_via_one_setter_call() {
        let (mut composer, rx) = composer();
        let mut host = RecordingHost::new("", true);

        assert!(composer.handle_key_event(&mut host, key(KeyCode::Char('x'))));

        assert_eq!(host.draft, "x");
        assert_eq!(host.set_calls, 1);
        assert_eq!(sent_messages(&rx), Vec::<String>::new());
    }

    #[test]
    fn typing_while_gated_still_updates_draft() {
        let (mut composer, rx) = composer();
        let mut host = RecordingHost::new("h", false);

        composer.handle_key_event(&mut host, key(KeyCode::Char('i')));

        assert_eq!(host.draft, "hi");
        assert_eq!(sent_messages(&rx), Vec::<String>::new());
    }

    #[test]
    fn cursor_editing_keys() {
        let (mut composer, _rx) = composer();
        let mut host = RecordingHost::new("", true);

        for ch in ['a', 'b'] {
            composer.handle_key_event(&mut host, key(KeyCode::Char(ch)));
        }
        composer.handle_key_event(&mut host, key(KeyCode::Left));
        composer.handle_key_event(&mut host, key(KeyCode::Char('x')));
        assert_eq!(host.draft, "axb");

        composer.handle_key_event(&mut host, key(KeyCode::Backspace));
        assert_eq!(host.draft, "ab");

        composer.handle_key_event(&mut host, key(KeyCode::Home));
        composer.handle_key_event(&mut host, key(KeyCode::Delete));
        assert_eq!(host.draft, "b");

        composer.handle_key_event(&mut host, key(KeyCode::End));
        composer.handle_key_event(&mut host, key(KeyCode::Char('!')));
        assert_eq!(host.draft, "b!");
    }

    #[test]
    fn backspace_on_empty_draft_is_a_no_op() {
        let (mut composer, _rx) = composer();
        let mut host = RecordingHost::new("", true);

        composer.handle_key_event(&mut host, key(KeyCode::Backspace));

        assert_eq!(host.set_calls, 0);
    }

    #[test]
    fn shifted_characters_are_inserted() {
        let (mut composer, _rx) = composer();
        let mut host = RecordingHost::new("", true);

        composer.handle_key_event(
            &mut host,
            KeyEvent::new(KeyCode::Char('X'), KeyModifiers::SHIFT),
        );

        assert_eq!(host.draft, "X");
    }

    #[test]
    fn paste_flattens_line_breaks() {
        let (mut composer, _rx) = composer();
        let mut host = RecordingHost::new("", true);

        composer.handle_paste(&mut host, "one\r\ntwo\rthree\nfour".to_string());

        assert_eq!(host.draft, "one two three four");
        assert_eq!(host.set_calls, 1);
    }

    #[test]
    fn unicode_editing_respects_char_boundaries() {
        let (mut composer, _rx) = composer();
        let mut host = RecordingHost::new("", true);

        for ch in "诶👍".chars() {
            composer.handle_key_event(&mut host, key(KeyCode::Char(ch)));
        }
        assert_eq!(host.draft, "诶👍");

        composer.handle_key_event(&mut host, key(KeyCode::Backspace));
        assert_eq!(host.draft, "诶");
    }

    #[test]
    fn cursor_tracks_draft_width() {
        let (mut composer, _rx) = composer();
        let mut host = RecordingHost::new("", true);
        for ch in "ab诶".chars() {
            composer.handle_key_event(&mut host, key(KeyCode::Char(ch)));
        }

        let area = Rect::new(0, 0, 40, 3);
        // "ab诶" spans four columns; the cursor sits one column past it,
        // inside the field border.
        assert_eq!(composer.cursor_pos(&host, area), Some((5, 1)));
    }

    #[test]
    fn blurred_field_hides_the_cursor() {
        let (composer, _rx) = composer();
        composer.focus_flag().set(false);
        let host = RecordingHost::new("hi", true);

        assert_eq!(composer.cursor_pos(&host, Rect::new(0, 0, 40, 3)), None);
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect()
    }

    fn draw(view: ComposerView) -> Terminal<TestBackend> {
        let mut terminal = match Terminal::new(TestBackend::new(40, 3)) {
            Ok(terminal) => terminal,
            Err(e) => panic!("failed to create terminal: {e}"),
        };
        if let Err(e) = terminal.draw(|frame| frame.render_widget_ref(view, frame.area())) {
            panic!("failed to draw composer: {e}");
        }
        terminal
    }

    #[test]
    fn renders_placeholder_when_draft_is_empty() {
        let (composer, _rx) = composer();
        let host = RecordingHost::new("", true);

        let terminal = draw(ComposerView {
            composer: &composer,
            host: &host,
        });

        let row = row_text(terminal.backend().buffer(), 1);
        assert!(row.contains(PLACEHOLDER_TEXT), "row: {row:?}");
        assert!(row.contains("Send"), "row: {row:?}");
    }

    #[test]
    fn renders_the_draft_verbatim() {
        let (composer, _rx) = composer();
        let host = RecordingHost::new("  hi there ", true);

        let terminal = draw(ComposerView {
            composer: &composer,
            host: &host,
        });

        let row = row_text(terminal.backend().buffer(), 1);
        assert!(row.contains("  hi there "), "row: {row:?}");
        assert!(!row.contains(PLACEHOLDER_TEXT), "row: {row:?}");
    }

    #[test]
    fn button_is_dimmed_while_gated() {
        let (composer, _rx) = composer();
        let host = RecordingHost::new("hi", false);

        let terminal = draw(ComposerView {
            composer: &composer,
            host: &host,
        });

        // Inside the button block (columns 30..40 on a 40-wide area).
        let cell = &terminal.backend().buffer()[(35, 1)];
        assert!(cell.modifier.contains(Modifier::DIM));
    }
}
