use std::io::Result;
use std::io::Stdout;
use std::io::stdout;

use crossterm::event::DisableBracketedPaste;
use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableBracketedPaste;
use crossterm::event::EnableMouseCapture;
use crossterm::execute;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

/// Terminal type used by the application.
pub(crate) type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Put the terminal into the state the TUI needs: raw mode, alternate
/// screen, bracketed paste and mouse reporting.
pub(crate) fn init() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(
        stdout(),
        EnterAlternateScreen,
        EnableBracketedPaste,
        EnableMouseCapture
    )?;
    set_panic_hook();
    Terminal::new(CrosstermBackend::new(stdout()))
}

/// Restore the terminal to its original state. Inverse of [`init`].
pub(crate) fn restore() -> Result<()> {
    execute!(
        stdout(),
        DisableMouseCapture,
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    disable_raw_mode()
}

fn set_panic_hook() {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore(); // already failing, ignore restore errors
        hook(panic_info);
    }));
}
