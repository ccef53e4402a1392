use mousebind_core::config::{Cfg, SimpleMouseMapping};
use mousebind_core::state::grabs::PointerGrabber;
use mousebind_core::state::{MouseBind, Registration};
use mousebind_utils::debug;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::Window;
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;

use crate::action::run_action;
use crate::error::Result;
use crate::x11::call_wrapper::CallWrapper;

pub(crate) fn run_binder() -> Result<()> {
    let cfg = Cfg::new()?;
    let ignore_mods = cfg.ignore_mods()?;
    let (connection, screen_num) = RustConnection::connect(None)?;
    let root = connection.setup().roots[screen_num].root;
    let mut binder = MouseBind::new(CallWrapper::new(connection), ignore_mods);
    for mapping in cfg.mouse_mappings {
        let sequence = mapping.sequence.clone();
        match binder.connect(registration(root, mapping)) {
            Ok(_handle) => debug!("Bound {sequence:?} as {_handle:?}"),
            // One bad mapping shouldn't take down the others
            Err(e) => eprintln!("Failed to bind {sequence:?}: {e}"),
        }
    }
    binder.grabber().connection().flush()?;
    loop {
        let event = binder.grabber().connection().wait_for_event()?;
        handle_event(&mut binder, event)?;
    }
}

fn registration<G: 'static>(root: Window, mapping: SimpleMouseMapping) -> Registration<G> {
    let SimpleMouseMapping {
        sequence,
        direction,
        grab,
        sync,
        action,
    } = mapping;
    Registration::new(direction, root, sequence, move |_: &mut MouseBind<G>, event| {
        if let Err(e) = run_action(&action, event) {
            eprintln!("Failed to run {action:?}: {e}");
        }
    })
    .with_grab(grab, sync)
}

fn handle_event<G: PointerGrabber>(binder: &mut MouseBind<G>, event: Event) -> Result<()> {
    match event {
        Event::ButtonPress(event) | Event::ButtonRelease(event) => {
            binder.dispatch(event);
            // Actions have already run, nothing is left waiting on the frozen pointer
            if let Some(mode) = binder.thaw_mode() {
                binder.allow_events(mode)?;
            }
        }
        Event::Error(_e) => {
            debug!("Got error event {_e:?}");
        }
        _ => {}
    }
    Ok(())
}
