use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        FundedStatus, GroupId, Location, Mission, MissionKind, OrganizationId, TimeWindow,
        UserSnapshot,
    },
    error::ApiError,
    lifecycle::MissionAction,
};

/// Caller-supplied fields for a new mission, merged over the default
/// record by the creation operation. The store issues the uid and the
/// creation timestamp; the caller never supplies either.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionDraft {
    pub kind: MissionKind,
    pub organization_uid: OrganizationId,
    pub recipient: UserSnapshot,
    #[serde(default)]
    pub funded_status: FundedStatus,
    #[serde(default)]
    pub group_uid: GroupId,
    #[serde(default)]
    pub group_display_name: String,
    #[serde(default)]
    pub pick_up_window: TimeWindow,
    #[serde(default)]
    pub delivery_window: TimeWindow,
    #[serde(default)]
    pub pick_up_location: Location,
    /// Falls back to the recipient's location when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_location: Option<Location>,
}

/// Actor identity attached to every transition request. Supplied by the
/// identity collaborator; the core treats it as opaque input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorRequest {
    pub user_uid: String,
    pub display_name: String,
    pub phone_number: String,
}

impl ActorRequest {
    pub fn snapshot(&self) -> UserSnapshot {
        UserSnapshot::new(
            self.user_uid.clone(),
            self.display_name.clone(),
            self.phone_number.clone(),
        )
    }
}

/// Optional post-delivery annotation folded into a deliver request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_notes: Option<String>,
}

impl DeliveryReport {
    pub fn is_empty(&self) -> bool {
        self.confirmation_image.is_none()
            && self.delivery_notes.is_none()
            && self.feedback_notes.is_none()
    }
}

/// Events broadcast to live-view subscribers whenever the backing set of
/// a view may have changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    MissionCreated {
        mission: Mission,
    },
    MissionUpdated {
        action: MissionAction,
        mission: Mission,
    },
    Error(ApiError),
}

impl ServerEvent {
    pub fn mission(&self) -> Option<&Mission> {
        match self {
            ServerEvent::MissionCreated { mission } => Some(mission),
            ServerEvent::MissionUpdated { mission, .. } => Some(mission),
            ServerEvent::Error(_) => None,
        }
    }
}
