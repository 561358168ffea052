use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// An empty id means "unset"; the document model has no
            /// distinction between an absent field and an empty string.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(MissionId);
id_newtype!(OrganizationId);
id_newtype!(UserId);
id_newtype!(GroupId);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionKind {
    #[default]
    Errand,
    FoodBox,
}

/// The lifecycle axis. `Succeeded` and `Failed` are terminal; everything
/// else can still move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    #[default]
    Unassigned,
    Tentative,
    Assigned,
    Started,
    Delivered,
    Succeeded,
    Failed,
}

impl MissionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, MissionStatus::Succeeded | MissionStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MissionStatus::Unassigned => "unassigned",
            MissionStatus::Tentative => "tentative",
            MissionStatus::Assigned => "assigned",
            MissionStatus::Started => "started",
            MissionStatus::Delivered => "delivered",
            MissionStatus::Succeeded => "succeeded",
            MissionStatus::Failed => "failed",
        }
    }
}

/// Whether the mission's costs are covered. Independent of [`MissionStatus`];
/// only the proposed view reads both axes together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundedStatus {
    #[default]
    NotFunded,
    Funded,
}

impl FundedStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FundedStatus::NotFunded => "notfunded",
            FundedStatus::Funded => "funded",
        }
    }
}

/// Contact profile stamped into an actor slot (tentative volunteer,
/// volunteer, recipient). A slot with an empty uid is unoccupied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub uid: UserId,
    pub display_name: String,
    pub phone_number: String,
}

impl UserSnapshot {
    pub fn new(
        uid: impl Into<String>,
        display_name: impl Into<String>,
        phone_number: impl Into<String>,
    ) -> Self {
        Self {
            uid: UserId::new(uid),
            display_name: display_name.into(),
            phone_number: phone_number.into(),
        }
    }

    /// The cleared slot: every field an empty string, so a client applying
    /// a delta overwrites stale contact details instead of keeping them.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.uid.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "at", rename_all = "snake_case")]
pub enum TimeWindow {
    /// Open-ended "whenever works" marker.
    #[default]
    Whenever,
    At(DateTime<Utc>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub label: String,
}

impl Location {
    pub fn is_unset(&self) -> bool {
        self.address.is_empty() && self.latitude == 0.0 && self.longitude == 0.0
    }
}

/// The central record: one delivery/errand task tracked through the fixed
/// lifecycle. Constructed by [`Mission::proposed`] and thereafter mutated
/// only through transition deltas and post-delivery annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub uid: MissionId,
    pub kind: MissionKind,
    pub organization_uid: OrganizationId,
    pub status: MissionStatus,
    pub funded_status: FundedStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ready_to_start: bool,
    #[serde(default)]
    pub group_uid: GroupId,
    #[serde(default)]
    pub group_display_name: String,
    pub tentative_volunteer: UserSnapshot,
    pub volunteer: UserSnapshot,
    pub recipient: UserSnapshot,
    #[serde(default)]
    pub pick_up_window: TimeWindow,
    #[serde(default)]
    pub delivery_window: TimeWindow,
    #[serde(default)]
    pub pick_up_location: Location,
    #[serde(default)]
    pub delivery_location: Location,
    #[serde(default)]
    pub delivery_confirmation_image: String,
    #[serde(default)]
    pub delivery_notes: String,
    #[serde(default)]
    pub feedback_notes: String,
}

impl Mission {
    /// Default/empty form of a new mission: unassigned, not funded, both
    /// volunteer slots vacant, open-ended windows. The store assigns the
    /// uid and the creation timestamp on insert.
    pub fn proposed(
        kind: MissionKind,
        organization_uid: OrganizationId,
        recipient: UserSnapshot,
    ) -> Self {
        Self {
            uid: MissionId::default(),
            kind,
            organization_uid,
            status: MissionStatus::Unassigned,
            funded_status: FundedStatus::NotFunded,
            created_at: Utc::now(),
            funded_at: None,
            ready_to_start: false,
            group_uid: GroupId::default(),
            group_display_name: String::new(),
            tentative_volunteer: UserSnapshot::empty(),
            volunteer: UserSnapshot::empty(),
            recipient,
            pick_up_window: TimeWindow::Whenever,
            delivery_window: TimeWindow::Whenever,
            pick_up_location: Location::default(),
            delivery_location: Location::default(),
            delivery_confirmation_image: String::new(),
            delivery_notes: String::new(),
            feedback_notes: String::new(),
        }
    }

    /// A mission with an empty group uid is standalone regardless of any
    /// leftover display name.
    pub fn is_standalone(&self) -> bool {
        self.group_uid.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposed_mission_starts_with_both_slots_vacant() {
        let mission = Mission::proposed(
            MissionKind::Errand,
            OrganizationId::new("org-1"),
            UserSnapshot::new("r1", "Pat", "555-0100"),
        );
        assert_eq!(mission.status, MissionStatus::Unassigned);
        assert_eq!(mission.funded_status, FundedStatus::NotFunded);
        assert!(mission.tentative_volunteer.is_empty());
        assert!(mission.volunteer.is_empty());
        assert!(mission.is_standalone());
    }

    #[test]
    fn mission_document_round_trips_through_json() {
        let mut mission = Mission::proposed(
            MissionKind::FoodBox,
            OrganizationId::new("org-1"),
            UserSnapshot::new("r1", "Pat", "555-0100"),
        );
        mission.uid = MissionId::new("m-42");
        mission.group_uid = GroupId::new("g-7");
        mission.group_display_name = "Saturday run".into();

        let encoded = serde_json::to_string(&mission).expect("encode");
        let decoded: Mission = serde_json::from_str(&encoded).expect("decode");
        assert_eq!(decoded, mission);
    }

    #[test]
    fn empty_group_uid_means_standalone_even_with_display_name() {
        let mut mission = Mission::proposed(
            MissionKind::Errand,
            OrganizationId::new("org-1"),
            UserSnapshot::empty(),
        );
        mission.group_display_name = "stale label".into();
        assert!(mission.is_standalone());
    }
}
