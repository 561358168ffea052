//! Field sanitization applied before anything is persisted: trims
//! whitespace, strips control characters, clamps lengths. Deltas pass
//! through otherwise unmodified.

use shared::{
    domain::{Location, UserSnapshot},
    protocol::{DeliveryReport, MissionDraft},
};

const MAX_NAME_CHARS: usize = 120;
const MAX_PHONE_CHARS: usize = 32;
const MAX_LABEL_CHARS: usize = 200;
const MAX_NOTES_CHARS: usize = 2000;

pub fn text(input: &str, max_chars: usize) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(max_chars)
        .collect()
}

pub fn actor(snapshot: UserSnapshot) -> UserSnapshot {
    UserSnapshot {
        uid: snapshot.uid,
        display_name: text(&snapshot.display_name, MAX_NAME_CHARS),
        phone_number: text(&snapshot.phone_number, MAX_PHONE_CHARS),
    }
}

pub fn location(location: Location) -> Location {
    Location {
        address: text(&location.address, MAX_LABEL_CHARS),
        latitude: location.latitude,
        longitude: location.longitude,
        label: text(&location.label, MAX_LABEL_CHARS),
    }
}

pub fn draft(draft: MissionDraft) -> MissionDraft {
    MissionDraft {
        kind: draft.kind,
        organization_uid: draft.organization_uid,
        recipient: actor(draft.recipient),
        funded_status: draft.funded_status,
        group_uid: draft.group_uid,
        group_display_name: text(&draft.group_display_name, MAX_LABEL_CHARS),
        pick_up_window: draft.pick_up_window,
        delivery_window: draft.delivery_window,
        pick_up_location: location(draft.pick_up_location),
        delivery_location: draft.delivery_location.map(location),
        recipient_location: draft.recipient_location.map(location),
    }
}

pub fn report(report: DeliveryReport) -> DeliveryReport {
    DeliveryReport {
        confirmation_image: report
            .confirmation_image
            .map(|raw| text(&raw, MAX_LABEL_CHARS)),
        delivery_notes: report.delivery_notes.map(|raw| text(&raw, MAX_NOTES_CHARS)),
        feedback_notes: report.feedback_notes.map(|raw| text(&raw, MAX_NOTES_CHARS)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_control_characters_and_trims() {
        assert_eq!(text("  Alice\u{7}\n Smith  ", 120), "Alice Smith");
    }

    #[test]
    fn clamps_to_the_character_budget() {
        let long = "x".repeat(500);
        assert_eq!(text(&long, 32).chars().count(), 32);
    }
}
