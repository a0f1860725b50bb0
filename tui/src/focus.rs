use std::cell::Cell;
use std::rc::Rc;
use std::rc::Weak;

/// Externally owned handle to the composer's focus flag.
///
/// The handle can exist before any field is attached to it, and the field
/// may be dropped while the handle lives on; focus requests without a live
/// target do nothing.
#[derive(Default)]
pub(crate) struct FocusHandle {
    target: Option<Weak<Cell<bool>>>,
}

impl FocusHandle {
    pub(crate) fn attach(&mut self, flag: &Rc<Cell<bool>>) {
        self.target = Some(Rc::downgrade(flag));
    }

    /// Request keyboard focus for the attached field.
    pub(crate) fn focus(&self) {
        if let Some(flag) = self.target.as_ref().and_then(Weak::upgrade) {
            flag.set(true);
        }
    }

    /// Drop keyboard focus from the attached field.
    pub(crate) fn blur(&self) {
        if let Some(flag) = self.target.as_ref().and_then(Weak::upgrade) {
            flag.set(false);
        }
    }
}
