use x11rb::protocol::xproto::ModMask;

use crate::error::{Error, Result};

/// How many distinct lock modifiers can be ignored, each one doubles the number of
/// physical grabs issued per binding.
pub const IGNORE_MODS_LIMIT: usize = 8;

/// The eight key modifier bits, shift through mod5.
pub const KEY_MODIFIERS_MASK: u16 = 0x00ff;

/**
Modifiers whose state is irrelevant when matching bindings, typically caps lock and num lock.
Passive grabs are issued once for every combination of these, and they are stripped from
event state before lookup.
Must be settled before the first binding is connected, bindings created earlier
keep whatever grabs they were issued with.
 **/
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct IgnoreMods {
    mods: heapless::Vec<u16, IGNORE_MODS_LIMIT>,
}

impl Default for IgnoreMods {
    fn default() -> Self {
        let mut mods = heapless::Vec::new();
        // Caps lock and num lock, capacity is well above 2
        let _ = mods.push(u16::from(ModMask::LOCK));
        let _ = mods.push(u16::from(ModMask::M2));
        Self { mods }
    }
}

impl IgnoreMods {
    #[must_use]
    pub fn none() -> Self {
        Self {
            mods: heapless::Vec::new(),
        }
    }

    pub fn new(mods: &[u16]) -> Result<Self> {
        let mut ignore = Self::none();
        ignore.set(mods)?;
        Ok(ignore)
    }

    /// Replaces the list, zero masks and duplicates are dropped.
    pub fn set(&mut self, mods: &[u16]) -> Result<()> {
        let mut next = heapless::Vec::new();
        for &mask in mods {
            if mask == 0 || next.contains(&mask) {
                continue;
            }
            next.push(mask)
                .map_err(|_| Error::IgnoreModsLimit(IGNORE_MODS_LIMIT))?;
        }
        self.mods = next;
        Ok(())
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u16] {
        &self.mods
    }

    #[must_use]
    pub fn combined(&self) -> u16 {
        self.mods.iter().fold(0, |acc, m| acc | m)
    }

    #[must_use]
    pub fn strip(&self, state: u16) -> u16 {
        state & !self.combined()
    }

    /// `mask` combined with every subset of the ignored modifiers, starting with `mask` itself.
    pub fn expand(&self, mask: u16) -> impl Iterator<Item = u16> + '_ {
        (0..1usize << self.mods.len()).map(move |subset| {
            self.mods
                .iter()
                .enumerate()
                .filter(|(bit, _)| subset & (1 << bit) != 0)
                .fold(mask, |acc, (_, m)| acc | m)
        })
    }

    /// Every concrete key modifier state that is not affected by an ignored modifier,
    /// this is what the `any` modifier stands for when matching.
    pub fn any_modifier_states(&self) -> impl Iterator<Item = u16> {
        let ignored = self.combined();
        (0..=KEY_MODIFIERS_MASK).filter(move |state| state & ignored == 0)
    }
}
