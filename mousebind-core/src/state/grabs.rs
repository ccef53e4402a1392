use std::collections::HashMap;

use x11rb::protocol::xproto::{ModMask, Window};

use crate::config::ignore_mods::IgnoreMods;
use crate::error::GrabError;
use crate::state::replay::AllowMode;

/// The requests this crate needs from an X11 connection.
pub trait PointerGrabber {
    /// Issue a single passive button grab for exactly `mods`.
    /// Sync grabs freeze the pointer when activated until events are allowed.
    fn grab_button(
        &self,
        window: Window,
        mods: u16,
        button: u8,
        sync: bool,
    ) -> Result<(), GrabError>;

    fn ungrab_button(&self, window: Window, mods: u16, button: u8) -> Result<(), GrabError>;

    fn allow_events(&self, mode: AllowMode) -> Result<(), GrabError>;
}

/// Identity of a logical grab, `mods` has the ignored modifiers folded out.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct GrabKey {
    pub window: Window,
    pub mods: u16,
    pub button: u8,
}

impl GrabKey {
    #[must_use]
    pub fn new(window: Window, mods: u16, button: u8) -> Self {
        Self {
            window,
            mods,
            button,
        }
    }
}

#[derive(Debug)]
struct GrabEntry {
    refcount: usize,
    sync: bool,
    // Masks actually grabbed on the server
    physical: Vec<u16>,
}

/// Reference counted passive grabs, a grab is issued when the first binding needs it
/// and released when the last one is gone.
#[derive(Debug, Default)]
pub struct GrabTable {
    entries: HashMap<GrabKey, GrabEntry>,
}

impl GrabTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire<G: PointerGrabber>(
        &mut self,
        grabber: &G,
        ignore_mods: &IgnoreMods,
        key: GrabKey,
        sync: bool,
    ) -> Result<(), GrabError> {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.refcount += 1;
            mousebind_utils::debug!("Grab {key:?} shared, refcount {}", entry.refcount);
            return Ok(());
        }
        // AnyModifier already covers every lock state
        let masks = if key.mods == u16::from(ModMask::ANY) {
            vec![key.mods]
        } else {
            ignore_mods.expand(key.mods).collect()
        };
        let mut physical = Vec::with_capacity(masks.len());
        for mask in masks {
            if let Err(e) = grabber.grab_button(key.window, mask, key.button, sync) {
                mousebind_utils::debug!(
                    "Failed to grab {key:?} with mask {mask:#06x}, rolling back {} grabs: {e}",
                    physical.len()
                );
                for issued in physical {
                    let _ = grabber.ungrab_button(key.window, issued, key.button);
                }
                return Err(e);
            }
            physical.push(mask);
        }
        mousebind_utils::debug!("Grabbed {key:?} with masks {physical:?}, sync = {sync}");
        self.entries.insert(
            key,
            GrabEntry {
                refcount: 1,
                sync,
                physical,
            },
        );
        Ok(())
    }

    /// Unknown keys are reported as `NotGrabbed` and leave the table untouched.
    /// Once the last reference is gone the entry is removed even if an ungrab request fails.
    pub fn release<G: PointerGrabber>(&mut self, grabber: &G, key: GrabKey) -> Result<(), GrabError> {
        let Some(entry) = self.entries.get_mut(&key) else {
            return Err(GrabError::NotGrabbed(key));
        };
        entry.refcount -= 1;
        if entry.refcount > 0 {
            mousebind_utils::debug!("Released {key:?}, refcount {}", entry.refcount);
            return Ok(());
        }
        let Some(entry) = self.entries.remove(&key) else {
            return Ok(());
        };
        let mut res = Ok(());
        for mask in entry.physical {
            if let Err(e) = grabber.ungrab_button(key.window, mask, key.button) {
                mousebind_utils::debug!("Failed to ungrab {key:?} with mask {mask:#06x}: {e}");
                if res.is_ok() {
                    res = Err(e);
                }
            }
        }
        mousebind_utils::debug!("Ungrabbed {key:?}");
        res
    }

    #[must_use]
    pub fn refcount(&self, key: &GrabKey) -> usize {
        self.entries.get(key).map_or(0, |e| e.refcount)
    }

    #[must_use]
    pub fn is_grabbed(&self, key: &GrabKey) -> bool {
        self.entries.contains_key(key)
    }

    /// The synchronous grab a press on `window` with the stripped `mods` activates, if any.
    #[must_use]
    pub fn sync_grab(&self, window: Window, mods: u16, button: u8) -> Option<GrabKey> {
        [mods, u16::from(ModMask::ANY)]
            .into_iter()
            .map(|m| GrabKey::new(window, m, button))
            .find(|key| self.entries.get(key).map_or(false, |e| e.sync))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
