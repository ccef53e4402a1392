use std::io::ErrorKind;
use std::path::PathBuf;

use crate::config::{Cfg, APPLICATION_NAME};
use crate::error::{Error, Result};

/// `$XDG_CONFIG_HOME/mousebind/mousebind.toml`, or under `$HOME/.config` when unset.
fn cfg_path() -> Option<PathBuf> {
    let base = match std::env::var_os("XDG_CONFIG_HOME") {
        Some(xdg) => PathBuf::from(xdg),
        None => PathBuf::from(std::env::var_os("HOME")?).join(".config"),
    };
    Some(
        base.join(APPLICATION_NAME)
            .join(APPLICATION_NAME)
            .with_extension("toml"),
    )
}

pub(crate) fn load_cfg() -> Result<Cfg> {
    let path = cfg_path().ok_or(Error::ConfigDirFind)?;
    mousebind_utils::debug!("Reading config from {path:?}");
    let raw = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::ConfigFileFind,
        _ => Error::Io(e),
    })?;
    Ok(toml::from_str(&raw)?)
}
