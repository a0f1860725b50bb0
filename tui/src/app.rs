use std::sync::mpsc::Receiver;
use std::sync::mpsc::channel;
use std::thread;
use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::event::Event;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use crossterm::event::MouseButton;
use crossterm::event::MouseEvent;
use crossterm::event::MouseEventKind;
use ratatui::layout::Constraint;
use ratatui::layout::Layout;
use ratatui::layout::Rect;

use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::cli::Cli;
use crate::composer;
use crate::composer::COMPOSER_HEIGHT;
use crate::composer::Composer;
use crate::composer::ComposerHost;
use crate::composer::ComposerView;
use crate::focus::FocusHandle;
use crate::hit_test::ClickTarget;
use crate::hit_test::HitTestRegistry;
use crate::transcript::TranscriptEntry;
use crate::transcript::TranscriptWidget;
use crate::tui::Tui;

/// Parent-owned composition state: the draft and the gate. The gate is
/// closed while a delivery is in flight. The composer reaches this state
/// only through [`ComposerHost`].
pub(crate) struct ChatState {
    draft: String,
    in_flight: bool,
}

impl ChatState {
    pub(crate) fn new(initial_draft: Option<String>) -> Self {
        Self {
            draft: initial_draft.unwrap_or_default(),
            in_flight: false,
        }
    }
}

impl ComposerHost for ChatState {
    fn draft(&self) -> &str {
        &self.draft
    }

    fn set_draft(&mut self, next: String) {
        self.draft = next;
    }

    fn is_enabled(&self) -> bool {
        !self.in_flight
    }
}

pub(crate) struct App {
    app_event_tx: AppEventSender,
    app_event_rx: Receiver<AppEvent>,
    state: ChatState,
    composer: Composer,
    input_focus: FocusHandle,
    transcript: Vec<TranscriptEntry>,
    hit_regions: HitTestRegistry,
    delivery_delay: Duration,
}

impl App {
    pub(crate) fn new(cli: Cli) -> Self {
        let (tx, rx) = channel();
        let app_event_tx = AppEventSender::new(tx);

        let composer = Composer::new(true, app_event_tx.clone());
        let mut input_focus = FocusHandle::default();
        input_focus.attach(composer.focus_flag());

        spawn_input_thread(app_event_tx.clone());

        Self {
            app_event_tx,
            app_event_rx: rx,
            state: ChatState::new(cli.prompt),
            composer,
            input_focus,
            transcript: Vec::new(),
            hit_regions: HitTestRegistry::default(),
            delivery_delay: Duration::from_millis(cli.delivery_delay_ms),
        }
    }

    pub(crate) fn run(&mut self, terminal: &mut Tui) -> Result<()> {
        self.request_redraw();
        loop {
            let event = match self.app_event_rx.recv() {
                Ok(event) => event,
                // All senders gone; nothing left to drive the UI.
                Err(_) => break,
            };
            match event {
                AppEvent::Key(key_event) => self.handle_key_event(key_event),
                AppEvent::Mouse(mouse_event) => self.handle_mouse_event(mouse_event),
                AppEvent::Paste(pasted) => {
                    if self.composer.handle_paste(&mut self.state, pasted) {
                        self.request_redraw();
                    }
                }
                AppEvent::SubmitMessage(text) => self.dispatch_message(text),
                AppEvent::MessageDelivered => self.on_message_delivered(),
                AppEvent::Redraw => self.draw(terminal)?,
                AppEvent::ExitRequest => break,
            }
        }
        Ok(())
    }

    fn handle_key_event(&mut self, key_event: KeyEvent) {
        match key_event {
            KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                kind: KeyEventKind::Press,
                ..
            } => {
                self.app_event_tx.send(AppEvent::ExitRequest);
            }
            KeyEvent {
                code: KeyCode::Char('d'),
                modifiers: KeyModifiers::CONTROL,
                kind: KeyEventKind::Press,
                ..
            } if self.state.draft().is_empty() => {
                self.app_event_tx.send(AppEvent::ExitRequest);
            }
            KeyEvent {
                kind: KeyEventKind::Press | KeyEventKind::Repeat,
                ..
            } if self.composer.has_focus() => {
                if self.composer.handle_key_event(&mut self.state, key_event) {
                    self.request_redraw();
                }
            }
            _ => {
                // Ignore release events and keys while the field is blurred.
            }
        }
    }

    fn handle_mouse_event(&mut self, mouse_event: MouseEvent) {
        if mouse_event.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        match self
            .hit_regions
            .hit_test(mouse_event.column, mouse_event.row)
        {
            Some(ClickTarget::SendButton) => {
                if self
                    .composer
                    .click_submit(&mut self.state, &self.input_focus)
                {
                    self.request_redraw();
                }
            }
            Some(ClickTarget::ComposerField) => {
                self.input_focus.focus();
                self.request_redraw();
            }
            None => {
                self.input_focus.blur();
                self.request_redraw();
            }
        }
    }

    /// The app's side of the send operation: record the message in the
    /// transcript and hand it to the loopback transport. The gate stays
    /// closed until the transport acknowledges delivery.
    fn dispatch_message(&mut self, text: String) {
        tracing::info!("dispatching message ({} chars)", text.chars().count());
        self.transcript.push(TranscriptEntry {
            text,
            delivered: false,
        });
        self.state.in_flight = true;

        let tx = self.app_event_tx.clone();
        let delay = self.delivery_delay;
        thread::spawn(move || {
            thread::sleep(delay);
            tx.send(AppEvent::MessageDelivered);
        });
        self.request_redraw();
    }

    fn on_message_delivered(&mut self) {
        if let Some(entry) = self.transcript.iter_mut().rev().find(|e| !e.delivered) {
            entry.delivered = true;
        }
        self.state.in_flight = false;
        tracing::debug!("delivery acknowledged; composer re-enabled");
        self.request_redraw();
    }

    fn request_redraw(&self) {
        self.app_event_tx.send(AppEvent::Redraw);
    }

    fn draw(&mut self, terminal: &mut Tui) -> Result<()> {
        let mut composer_area = Rect::default();
        terminal.draw(|frame| {
            let [transcript_area, area] =
                Layout::vertical([Constraint::Min(1), Constraint::Length(COMPOSER_HEIGHT)])
                    .areas(frame.area());
            frame.render_widget_ref(
                TranscriptWidget {
                    entries: &self.transcript,
                },
                transcript_area,
            );
            frame.render_widget_ref(
                ComposerView {
                    composer: &self.composer,
                    host: &self.state,
                },
                area,
            );
            if let Some((x, y)) = self.composer.cursor_pos(&self.state, area) {
                frame.set_cursor_position((x, y));
            }
            composer_area = area;
        })?;

        // Click regions follow whatever was just rendered.
        self.hit_regions.clear();
        let layout = composer::layout(composer_area);
        self.hit_regions
            .register(layout.field, ClickTarget::ComposerField);
        self.hit_regions
            .register(layout.button, ClickTarget::SendButton);
        Ok(())
    }
}

fn spawn_input_thread(tx: AppEventSender) {
    thread::spawn(move || {
        loop {
            match crossterm::event::read() {
                Ok(Event::Key(key_event)) => tx.send(AppEvent::Key(key_event)),
                Ok(Event::Mouse(mouse_event)) => tx.send(AppEvent::Mouse(mouse_event)),
                Ok(Event::Paste(pasted)) => tx.send(AppEvent::Paste(pasted)),
                Ok(Event::Resize(_, _)) => tx.send(AppEvent::Redraw),
                Ok(_) => {}
                Err(err) => {
                    tracing::error!("input thread stopped: {err}");
                    break;
                }
            }
        }
    });
}
