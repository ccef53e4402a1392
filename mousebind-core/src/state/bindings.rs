use std::collections::HashMap;

use x11rb::protocol::xproto::{Window, BUTTON_PRESS_EVENT, BUTTON_RELEASE_EVENT};

use crate::state::grabs::GrabKey;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct BindingHandle(u64);

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "config-file", derive(serde::Deserialize))]
pub enum Direction {
    #[default]
    Press,
    Release,
}

impl Direction {
    /// Strips the sent-event bit, anything but button press and release is `None`.
    #[must_use]
    pub fn from_response_type(response_type: u8) -> Option<Self> {
        match response_type & 0x7f {
            BUTTON_PRESS_EVENT => Some(Direction::Press),
            BUTTON_RELEASE_EVENT => Some(Direction::Release),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct MatchKey {
    pub window: Window,
    pub mods: u16,
    pub button: u8,
    pub direction: Direction,
}

#[derive(Debug, Clone)]
pub struct Binding<C> {
    pub window: Window,
    pub button: u8,
    pub direction: Direction,
    /// Exact stripped modifier states this binding answers to
    pub masks: Vec<u16>,
    pub grab: Option<GrabKey>,
    pub callback: C,
}

impl<C> Binding<C> {
    fn match_keys(&self) -> impl Iterator<Item = MatchKey> + '_ {
        self.masks.iter().map(|&mods| MatchKey {
            window: self.window,
            mods,
            button: self.button,
            direction: self.direction,
        })
    }
}

/// Bindings keyed by exact match criteria, handles are issued in increasing order so
/// every lookup list is kept in registration order.
#[derive(Debug)]
pub struct BindingRegistry<C> {
    next_handle: u64,
    bindings: HashMap<BindingHandle, Binding<C>>,
    by_key: HashMap<MatchKey, Vec<BindingHandle>>,
}

impl<C> Default for BindingRegistry<C> {
    fn default() -> Self {
        Self {
            next_handle: 0,
            bindings: HashMap::new(),
            by_key: HashMap::new(),
        }
    }
}

impl<C> BindingRegistry<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, binding: Binding<C>) -> BindingHandle {
        let handle = BindingHandle(self.next_handle);
        self.next_handle += 1;
        for key in binding.match_keys() {
            let handles = self.by_key.entry(key).or_default();
            // An 'any' binding can't produce the same key twice, but a caller supplied list could
            if handles.last() != Some(&handle) {
                handles.push(handle);
            }
        }
        mousebind_utils::debug!(
            "Added binding {handle:?} for button {} on window {}",
            binding.button,
            binding.window
        );
        self.bindings.insert(handle, binding);
        handle
    }

    pub fn remove(&mut self, handle: BindingHandle) -> Option<Binding<C>> {
        let binding = self.bindings.remove(&handle)?;
        for key in binding.match_keys() {
            if let Some(handles) = self.by_key.get_mut(&key) {
                handles.retain(|h| *h != handle);
                if handles.is_empty() {
                    self.by_key.remove(&key);
                }
            }
        }
        mousebind_utils::debug!("Removed binding {handle:?}");
        Some(binding)
    }

    /// Snapshot of the handles matching an already stripped event state, in registration order.
    #[must_use]
    pub fn matching(
        &self,
        window: Window,
        mods: u16,
        button: u8,
        direction: Direction,
    ) -> Vec<BindingHandle> {
        self.by_key
            .get(&MatchKey {
                window,
                mods,
                button,
                direction,
            })
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn get(&self, handle: BindingHandle) -> Option<&Binding<C>> {
        self.bindings.get(&handle)
    }

    #[must_use]
    pub fn handles_on_window(&self, window: Window) -> Vec<BindingHandle> {
        let mut handles = self
            .bindings
            .iter()
            .filter_map(|(handle, binding)| (binding.window == window).then_some(*handle))
            .collect::<Vec<_>>();
        handles.sort_unstable();
        handles
    }

    /// Whether any binding holding a reference to `key` fires in `direction`.
    #[must_use]
    pub fn uses_grab(&self, key: &GrabKey, direction: Direction) -> bool {
        self.bindings
            .values()
            .any(|b| b.direction == direction && b.grab.as_ref() == Some(key))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
