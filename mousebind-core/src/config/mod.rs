use x11rb::protocol::xproto::ModMask;

use crate::config::ignore_mods::IgnoreMods;
use crate::error::Result;
use crate::state::bindings::Direction;

pub mod ignore_mods;

/**
The name that the binary will report itself as. Will also affect where
configuration is placed/read from.
 **/
pub const APPLICATION_NAME: &str = "mousebind";

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config-file", derive(serde::Deserialize))]
pub struct Cfg {
    #[cfg_attr(feature = "config-file", serde(default = "default_ignore_mods"))]
    pub ignore_mods: Vec<ModMaskEnum>,
    #[cfg_attr(feature = "config-file", serde(default))]
    pub mouse_mappings: Vec<SimpleMouseMapping>,
}

impl Cfg {
    /// Reads the user config, a missing config file is not an error and gives the defaults.
    #[cfg(feature = "config-file")]
    pub fn new() -> Result<Self> {
        match crate::util::load_cfg::load_cfg() {
            Ok(cfg) => Ok(cfg),
            Err(crate::error::Error::ConfigDirFind | crate::error::Error::ConfigFileFind) => {
                mousebind_utils::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    #[cfg(not(feature = "config-file"))]
    pub fn new() -> Result<Self> {
        Ok(Self::default())
    }

    pub fn ignore_mods(&self) -> Result<IgnoreMods> {
        let mods = self
            .ignore_mods
            .iter()
            .map(|m| u16::from(m.to_mod_mask()))
            .collect::<Vec<_>>();
        IgnoreMods::new(&mods)
    }
}

impl Default for Cfg {
    fn default() -> Self {
        Self {
            ignore_mods: default_ignore_mods(),
            mouse_mappings: vec![
                SimpleMouseMapping::new("mod4-1", Direction::Press, true, false, Action::Print),
                SimpleMouseMapping::new(
                    "mod4-shift-3",
                    Direction::Press,
                    true,
                    false,
                    Action::Spawn {
                        program: "xterm".to_owned(),
                        args: vec![],
                    },
                ),
                SimpleMouseMapping::new("mod4-2", Direction::Release, true, true, Action::Print),
            ],
        }
    }
}

fn default_ignore_mods() -> Vec<ModMaskEnum> {
    vec![ModMaskEnum::Lock, ModMaskEnum::M2]
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "config-file", derive(serde::Deserialize))]
pub enum ModMaskEnum {
    Shift,
    Lock,
    Control,
    M1,
    M2,
    M3,
    M4,
    M5,
}

impl ModMaskEnum {
    #[must_use]
    pub fn to_mod_mask(self) -> ModMask {
        match self {
            ModMaskEnum::Shift => ModMask::SHIFT,
            ModMaskEnum::Lock => ModMask::LOCK,
            ModMaskEnum::Control => ModMask::CONTROL,
            ModMaskEnum::M1 => ModMask::M1,
            ModMaskEnum::M2 => ModMask::M2,
            ModMaskEnum::M3 => ModMask::M3,
            ModMaskEnum::M4 => ModMask::M4,
            ModMaskEnum::M5 => ModMask::M5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config-file", derive(serde::Deserialize))]
pub struct SimpleMouseMapping {
    pub sequence: String,
    #[cfg_attr(feature = "config-file", serde(default))]
    pub direction: Direction,
    #[cfg_attr(feature = "config-file", serde(default = "default_grab"))]
    pub grab: bool,
    #[cfg_attr(feature = "config-file", serde(default))]
    pub sync: bool,
    pub action: Action,
}

impl SimpleMouseMapping {
    #[must_use]
    pub fn new(
        sequence: &str,
        direction: Direction,
        grab: bool,
        sync: bool,
        action: Action,
    ) -> Self {
        Self {
            sequence: sequence.to_owned(),
            direction,
            grab,
            sync,
            action,
        }
    }
}

#[cfg(feature = "config-file")]
fn default_grab() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config-file", derive(serde::Deserialize))]
pub enum Action {
    /// Write the triggering event to stdout
    Print,
    Spawn {
        program: String,
        #[cfg_attr(feature = "config-file", serde(default))]
        args: Vec<String>,
    },
}
