#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::needless_pass_by_value)]
// X11 uses inconsistent integer types fairly interchangeably
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
// Debug log complaints
#![allow(clippy::used_underscore_binding)]

use mousebind_utils::debug;

use crate::binder::run_binder;

mod action;
mod binder;
pub(crate) mod error;
mod x11;

fn main() {
    debug!("Starting mousebind");
    let code = match run_binder() {
        Ok(()) => {
            println!("Exiting mousebind");
            0
        }
        Err(e) => {
            eprintln!("Fatal error {e}");
            1
        }
    };
    std::process::exit(code);
}
