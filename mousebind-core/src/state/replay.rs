use crate::error::{Error, Result};
use crate::state::grabs::{GrabKey, PointerGrabber};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AllowMode {
    /// Release the grab and send the frozen event on to the windows below the grab window
    ReplayPointer,
    /// Keep the grab but continue processing pointer events asynchronously
    AsyncPointer,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum ReplayState {
    #[default]
    Idle,
    /// The server has frozen pointer events after activating a synchronous grab
    AwaitingReplay,
}

#[derive(Debug, Default)]
pub struct ReplayCoordinator {
    state: ReplayState,
    frozen_by: Option<GrabKey>,
}

impl ReplayCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> ReplayState {
        self.state
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.state == ReplayState::AwaitingReplay
    }

    /// The synchronous grab that froze the pointer, `None` while idle.
    #[must_use]
    pub fn frozen_by(&self) -> Option<GrabKey> {
        self.frozen_by
    }

    pub(crate) fn freeze(&mut self, key: GrabKey) {
        mousebind_utils::debug!("Pointer frozen by synchronous grab {key:?}");
        self.state = ReplayState::AwaitingReplay;
        self.frozen_by = Some(key);
    }

    /// Allowing events while idle is a misuse and sends nothing.
    /// If the request can't be sent the coordinator stays frozen.
    pub fn resume<G: PointerGrabber>(&mut self, grabber: &G, mode: AllowMode) -> Result<()> {
        if self.state == ReplayState::Idle {
            return Err(Error::ReplayMisuse);
        }
        grabber.allow_events(mode)?;
        mousebind_utils::debug!("Allowed events with {mode:?}");
        self.state = ReplayState::Idle;
        self.frozen_by = None;
        Ok(())
    }
}
