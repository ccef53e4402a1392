#[cfg(feature = "config-file")]
pub(crate) mod load_cfg;
#[cfg(test)]
pub(crate) mod test_grabber;
