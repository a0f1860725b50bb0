use crossterm::event::KeyEvent;
use crossterm::event::MouseEvent;

#[derive(Debug, PartialEq)]
pub(crate) enum AppEvent {
    Key(KeyEvent),

    Mouse(MouseEvent),

    /// Text pasted from the terminal clipboard.
    Paste(String),

    /// Draw the next frame.
    Redraw,

    /// The composer dispatched a normalized, non-empty message. This is the
    /// composer's send operation; everything past this point is the app's
    /// concern.
    SubmitMessage(String),

    /// The loopback transport finished delivering the in-flight message.
    MessageDelivered,

    /// Request to exit the application gracefully.
    ExitRequest,
}
