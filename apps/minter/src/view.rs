use client_core::{ControllerEvent, ControllerSnapshot};

pub fn status_lines(snapshot: &ControllerSnapshot) -> Vec<String> {
    let mut lines = Vec::with_capacity(3);
    if let Some(address) = snapshot.address {
        lines.push(format!("wallet: {address}"));
    }
    lines.push(format!("[{}]", snapshot.affordance().label()));
    lines.push(format!(
        "{}/{} have been minted",
        snapshot.minted, snapshot.max_supply
    ));
    lines
}

/// Text shown to the user for an event, if any. Failures other than blocking
/// alerts stay in the log.
pub fn alert_text(event: &ControllerEvent) -> Option<&str> {
    match event {
        ControllerEvent::Alert(message) => Some(message),
        _ => None,
    }
}
