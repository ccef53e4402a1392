use std::process::Stdio;

use mousebind_core::config::Action;
use x11rb::protocol::xproto::ButtonPressEvent;

use crate::error::Result;

pub(crate) fn run_action(action: &Action, event: &ButtonPressEvent) -> Result<()> {
    match action {
        Action::Print => {
            println!(
                "button {} state {:#06x} on window {} at ({}, {})",
                event.detail, event.state, event.event, event.root_x, event.root_y
            );
            Ok(())
        }
        Action::Spawn { program, args } => spawn(program, args),
    }
}

fn spawn(bin: &str, args: &[String]) -> Result<()> {
    let mut child = std::process::Command::new(bin)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .args(args)
        .spawn()?;
    mousebind_utils::debug!("Spawned {} with args {:?}", bin, args);
    // Reaped off the event loop so a long running child can't hold it up
    std::thread::spawn(move || match child.wait() {
        Ok(_status) => mousebind_utils::debug!("Child exited with {_status}"),
        Err(e) => eprintln!("Failed to wait for child: {e}"),
    });
    Ok(())
}
