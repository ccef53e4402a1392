use x11rb::protocol::xproto::Window;

use crate::state::bindings::BindingHandle;
use crate::state::grabs::GrabKey;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Grab(#[from] GrabError),
    #[error("Tried to allow events while no synchronous grab was awaiting replay")]
    ReplayMisuse,
    #[error("No live binding for handle {0:?}")]
    UnknownBinding(BindingHandle),
    #[error("Too many ignore modifiers, limit is {0}")]
    IgnoreModsLimit(usize),
    #[cfg(feature = "config-file")]
    #[error("Could not find a config directory, neither XDG_CONFIG_HOME nor HOME is set")]
    ConfigDirFind,
    #[cfg(feature = "config-file")]
    #[error("Could not find a config file")]
    ConfigFileFind,
    #[cfg(feature = "config-file")]
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[cfg(feature = "config-file")]
    #[error(transparent)]
    ConfigParse(#[from] toml::de::Error),
}

#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum ParseError {
    #[error("Empty button sequence")]
    EmptySequence,
    #[error("Unknown modifier {0:?}")]
    UnknownModifier(String),
    #[error("Button sequence {0:?} does not end with a button number")]
    MissingButton(String),
    #[error("Invalid button number {0:?}, expected a number between 1 and 255")]
    InvalidButtonNumber(String),
    #[error("Modifier 'any' can not be combined with other modifiers, got {0:?}")]
    AnyNotExclusive(String),
}

#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum GrabError {
    #[error("Button {button} with modifiers {mods:#06x} on window {window} is already grabbed by another client")]
    AlreadyGrabbed {
        window: Window,
        mods: u16,
        button: u8,
    },
    #[error("No grab is held for {0:?}")]
    NotGrabbed(GrabKey),
    #[error("Grab request failed: {0}")]
    Transport(String),
}
