//! Human readable button sequences, `[Mod[-Mod[...]]-]BUTTONNUMBER`.
//!
//! Every segment but the last names a modifier, the last one is the button number.
//! `button1` through `button5` are only ever read as modifiers, so `button1-1` means
//! "button 1 pressed while button 1 is held".
use core::fmt::{Display, Formatter};
use core::str::FromStr;

use x11rb::protocol::xproto::{ButtonMask, ModMask};

use crate::error::ParseError;

pub const MODIFIER_SEPARATOR: char = '-';

/// Button details are a single byte on the wire and 0 means any button.
pub const MIN_BUTTON: u8 = 1;
pub const MAX_BUTTON: u8 = u8::MAX;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Modifier {
    Shift,
    Lock,
    Control,
    Mod1,
    Mod2,
    Mod3,
    Mod4,
    Mod5,
    Button1,
    Button2,
    Button3,
    Button4,
    Button5,
    Any,
}

impl Modifier {
    /// Canonical order, used when serializing.
    pub const ALL: [Modifier; 14] = [
        Modifier::Shift,
        Modifier::Lock,
        Modifier::Control,
        Modifier::Mod1,
        Modifier::Mod2,
        Modifier::Mod3,
        Modifier::Mod4,
        Modifier::Mod5,
        Modifier::Button1,
        Modifier::Button2,
        Modifier::Button3,
        Modifier::Button4,
        Modifier::Button5,
        Modifier::Any,
    ];

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Modifier::Shift => "shift",
            Modifier::Lock => "lock",
            Modifier::Control => "control",
            Modifier::Mod1 => "mod1",
            Modifier::Mod2 => "mod2",
            Modifier::Mod3 => "mod3",
            Modifier::Mod4 => "mod4",
            Modifier::Mod5 => "mod5",
            Modifier::Button1 => "button1",
            Modifier::Button2 => "button2",
            Modifier::Button3 => "button3",
            Modifier::Button4 => "button4",
            Modifier::Button5 => "button5",
            Modifier::Any => "any",
        }
    }

    #[must_use]
    pub fn mask(self) -> u16 {
        match self {
            Modifier::Shift => u16::from(ModMask::SHIFT),
            Modifier::Lock => u16::from(ModMask::LOCK),
            Modifier::Control => u16::from(ModMask::CONTROL),
            Modifier::Mod1 => u16::from(ModMask::M1),
            Modifier::Mod2 => u16::from(ModMask::M2),
            Modifier::Mod3 => u16::from(ModMask::M3),
            Modifier::Mod4 => u16::from(ModMask::M4),
            Modifier::Mod5 => u16::from(ModMask::M5),
            Modifier::Button1 => u16::from(ButtonMask::M1),
            Modifier::Button2 => u16::from(ButtonMask::M2),
            Modifier::Button3 => u16::from(ButtonMask::M3),
            Modifier::Button4 => u16::from(ButtonMask::M4),
            Modifier::Button5 => u16::from(ButtonMask::M5),
            Modifier::Any => u16::from(ModMask::ANY),
        }
    }

    /// The `buttonN` modifier that is reported while `button` is held, if there is one.
    #[must_use]
    pub fn held_button(button: u8) -> Option<Self> {
        match button {
            1 => Some(Modifier::Button1),
            2 => Some(Modifier::Button2),
            3 => Some(Modifier::Button3),
            4 => Some(Modifier::Button4),
            5 => Some(Modifier::Button5),
            _ => None,
        }
    }
}

/// A set of modifiers, stored as the mask the X server uses for them.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct ModifierSet {
    mask: u16,
}

impl ModifierSet {
    #[must_use]
    pub const fn empty() -> Self {
        Self { mask: 0 }
    }

    pub fn insert(&mut self, modifier: Modifier) {
        self.mask |= modifier.mask();
    }

    #[must_use]
    pub fn contains(&self, modifier: Modifier) -> bool {
        let mask = modifier.mask();
        self.mask & mask == mask
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mask == 0
    }

    #[must_use]
    pub fn is_any(&self) -> bool {
        self.contains(Modifier::Any)
    }

    #[must_use]
    pub const fn mask(&self) -> u16 {
        self.mask
    }

    pub fn iter(&self) -> impl Iterator<Item = Modifier> + '_ {
        Modifier::ALL.into_iter().filter(|m| self.contains(*m))
    }
}

impl FromIterator<Modifier> for ModifierSet {
    fn from_iter<T: IntoIterator<Item = Modifier>>(iter: T) -> Self {
        let mut set = ModifierSet::empty();
        for modifier in iter {
            set.insert(modifier);
        }
        set
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ButtonSequence {
    modifiers: ModifierSet,
    button: u8,
}

impl ButtonSequence {
    pub fn parse(sequence: &str) -> Result<Self, ParseError> {
        if sequence.is_empty() {
            return Err(ParseError::EmptySequence);
        }
        let mut segments = sequence.split(MODIFIER_SEPARATOR);
        // split always yields at least one segment
        let last = segments.next_back().unwrap_or_default();
        let mut modifiers = ModifierSet::empty();
        let mut has_other = false;
        for segment in segments {
            let modifier = Modifier::from_name(segment)
                .ok_or_else(|| ParseError::UnknownModifier(segment.to_owned()))?;
            if modifier != Modifier::Any {
                has_other = true;
            }
            modifiers.insert(modifier);
        }
        if modifiers.is_any() && has_other {
            return Err(ParseError::AnyNotExclusive(sequence.to_owned()));
        }
        let button = parse_button(sequence, last)?;
        Ok(Self { modifiers, button })
    }

    #[must_use]
    pub const fn modifiers(&self) -> ModifierSet {
        self.modifiers
    }

    #[must_use]
    pub const fn button(&self) -> u8 {
        self.button
    }
}

fn parse_button(sequence: &str, segment: &str) -> Result<u8, ParseError> {
    if segment.is_empty() || Modifier::from_name(segment).is_some() {
        return Err(ParseError::MissingButton(sequence.to_owned()));
    }
    // u8::from_str also accepts a leading '+'
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidButtonNumber(segment.to_owned()));
    }
    match segment.parse::<u16>().map(u8::try_from) {
        Ok(Ok(button)) if (MIN_BUTTON..=MAX_BUTTON).contains(&button) => Ok(button),
        _ => Err(ParseError::InvalidButtonNumber(segment.to_owned())),
    }
}

impl FromStr for ButtonSequence {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for ButtonSequence {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        for modifier in self.modifiers.iter() {
            f.write_str(modifier.name())?;
            f.write_fmt(format_args!("{MODIFIER_SEPARATOR}"))?;
        }
        f.write_fmt(format_args!("{}", self.button))
    }
}
