use x11rb::connection::Connection;
use x11rb::protocol::xproto::{Allow, ButtonIndex, ConnectionExt, EventMask, GrabMode, Window};
use x11rb::protocol::ErrorKind;
use x11rb::errors::ReplyError;
use x11rb::rust_connection::RustConnection;
use x11rb::CURRENT_TIME;

use mousebind_core::error::GrabError;
use mousebind_core::state::grabs::PointerGrabber;
use mousebind_core::state::replay::AllowMode;

pub(crate) struct CallWrapper {
    connection: RustConnection,
}

impl CallWrapper {
    pub(crate) fn new(connection: RustConnection) -> Self {
        Self { connection }
    }

    pub(crate) fn connection(&self) -> &RustConnection {
        &self.connection
    }
}

fn transport<E: core::fmt::Display>(e: E) -> GrabError {
    GrabError::Transport(e.to_string())
}

impl PointerGrabber for CallWrapper {
    fn grab_button(
        &self,
        window: Window,
        mods: u16,
        button: u8,
        sync: bool,
    ) -> Result<(), GrabError> {
        let pointer_mode = if sync {
            GrabMode::SYNC
        } else {
            GrabMode::ASYNC
        };
        // Checked so that a grab held by another client surfaces here and not as a stray error event
        let res = self
            .connection
            .grab_button(
                true,
                window,
                u32::from(EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE) as u16,
                pointer_mode,
                GrabMode::ASYNC,
                0u16,
                0u16,
                ButtonIndex::from(button),
                mods,
            )
            .map_err(transport)?
            .check();
        match res {
            Ok(()) => Ok(()),
            Err(ReplyError::X11Error(ref error)) if error.error_kind == ErrorKind::Access => {
                mousebind_utils::debug!(
                    "Button {button} with mods {mods:#06x} on {window} is grabbed by another client"
                );
                Err(GrabError::AlreadyGrabbed {
                    window,
                    mods,
                    button,
                })
            }
            Err(e) => Err(transport(e)),
        }
    }

    fn ungrab_button(&self, window: Window, mods: u16, button: u8) -> Result<(), GrabError> {
        self.connection
            .ungrab_button(ButtonIndex::from(button), window, mods)
            .map_err(transport)?;
        Ok(())
    }

    fn allow_events(&self, mode: AllowMode) -> Result<(), GrabError> {
        let mode = match mode {
            AllowMode::ReplayPointer => Allow::REPLAY_POINTER,
            AllowMode::AsyncPointer => Allow::ASYNC_POINTER,
        };
        self.connection
            .allow_events(mode, CURRENT_TIME)
            .map_err(transport)?;
        // Nothing else is coming from the server until this is sent
        self.connection.flush().map_err(transport)
    }
}
