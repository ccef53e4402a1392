use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use x11rb::protocol::xproto::Window;

use crate::error::GrabError;
use crate::state::grabs::PointerGrabber;
use crate::state::replay::AllowMode;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum Request {
    Grab(Window, u16, u8, bool),
    Ungrab(Window, u16, u8),
    Allow(AllowMode),
}

/// Records every request, grabs on denied combinations fail like another client holds them.
/// Ungrabs and allows can be switched to fail like a broken connection, they are recorded either way.
#[derive(Debug, Default)]
pub(crate) struct RecordingGrabber {
    requests: RefCell<Vec<Request>>,
    denied: RefCell<HashSet<(Window, u16, u8)>>,
    ungrab_fails: Cell<bool>,
    allow_fails: Cell<bool>,
}

impl RecordingGrabber {
    pub(crate) fn deny(&self, window: Window, mods: u16, button: u8) {
        self.denied.borrow_mut().insert((window, mods, button));
    }

    pub(crate) fn fail_ungrabs(&self) {
        self.ungrab_fails.set(true);
    }

    pub(crate) fn fail_allows(&self) {
        self.allow_fails.set(true);
    }

    pub(crate) fn take(&self) -> Vec<Request> {
        core::mem::take(&mut *self.requests.borrow_mut())
    }
}

impl PointerGrabber for RecordingGrabber {
    fn grab_button(
        &self,
        window: Window,
        mods: u16,
        button: u8,
        sync: bool,
    ) -> Result<(), GrabError> {
        self.requests
            .borrow_mut()
            .push(Request::Grab(window, mods, button, sync));
        if self.denied.borrow().contains(&(window, mods, button)) {
            return Err(GrabError::AlreadyGrabbed {
                window,
                mods,
                button,
            });
        }
        Ok(())
    }

    fn ungrab_button(&self, window: Window, mods: u16, button: u8) -> Result<(), GrabError> {
        self.requests
            .borrow_mut()
            .push(Request::Ungrab(window, mods, button));
        if self.ungrab_fails.get() {
            return Err(GrabError::Transport("ungrab failed".to_owned()));
        }
        Ok(())
    }

    fn allow_events(&self, mode: AllowMode) -> Result<(), GrabError> {
        self.requests.borrow_mut().push(Request::Allow(mode));
        if self.allow_fails.get() {
            return Err(GrabError::Transport("allow failed".to_owned()));
        }
        Ok(())
    }
}
