#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::needless_pass_by_value)]
// X11 uses inconsistent integer types fairly interchangeably
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
// Debug log complaints
#![allow(clippy::used_underscore_binding)]

pub mod config;
pub mod error;
pub mod sequence;
pub mod state;
pub mod util;
