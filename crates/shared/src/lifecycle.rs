//! Mission lifecycle state machine.
//!
//! `unassigned → tentative → assigned → started → delivered → {succeeded |
//! failed}`. Release is an organizer action that returns a mission to
//! `tentative` with both volunteer slots cleared: the mission goes back to
//! the available pool, not to the proposal stage.
//!
//! Every transition emits a complete slot reset rather than a partial
//! update. A client applying the delta can never end up with both slots
//! populated, or with stale contact details from a previous actor, even
//! when updates arrive out of order.

use serde::{Deserialize, Serialize};

use crate::{
    domain::{Mission, MissionId, MissionStatus, UserId, UserSnapshot},
    error::MissionError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionAction {
    /// Volunteer proposes themselves for an available mission.
    Assign,
    /// Volunteer confirms a tentative assignment.
    Accept,
    /// Confirmed volunteer begins the mission.
    Start,
    /// Volunteer marks the mission delivered.
    Deliver,
    /// Organizer releases the volunteer back to the pool.
    Release,
}

/// The full field delta a transition applies: the new status plus both
/// volunteer slots, always resent wholesale. Carries the mission uid so a
/// document-store client can address the write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionDelta {
    pub mission_uid: MissionId,
    pub status: MissionStatus,
    pub tentative_volunteer: UserSnapshot,
    pub volunteer: UserSnapshot,
}

/// Builds the delta for `action` performed by `actor`. Total and
/// unchecked: legality is [`check_transition`]'s concern, kept separate so
/// stricter policies can be layered without touching this table.
pub fn transition_delta(
    action: MissionAction,
    mission_uid: MissionId,
    actor: &UserSnapshot,
) -> TransitionDelta {
    let (status, tentative_volunteer, volunteer) = match action {
        MissionAction::Assign => (MissionStatus::Tentative, actor.clone(), UserSnapshot::empty()),
        MissionAction::Accept => (MissionStatus::Assigned, UserSnapshot::empty(), actor.clone()),
        MissionAction::Start => (MissionStatus::Started, UserSnapshot::empty(), actor.clone()),
        MissionAction::Deliver => (
            MissionStatus::Delivered,
            UserSnapshot::empty(),
            actor.clone(),
        ),
        MissionAction::Release => (
            MissionStatus::Tentative,
            UserSnapshot::empty(),
            UserSnapshot::empty(),
        ),
    };

    TransitionDelta {
        mission_uid,
        status,
        tentative_volunteer,
        volunteer,
    }
}

/// Pure precondition gate, invoked by the service layer before delta
/// construction.
///
/// Rules:
/// - `Assign` needs an unassigned mission, or a released tentative one
///   (both slots vacant).
/// - `Accept` needs a tentative mission with a proposed volunteer.
/// - `Start` and `Deliver` need the acting user to be the confirmed
///   volunteer, in `Assigned` and `Started` respectively.
/// - `Release` works from any non-terminal status.
pub fn check_transition(
    mission: &Mission,
    action: MissionAction,
    actor_uid: &UserId,
) -> Result<(), MissionError> {
    let legal = match action {
        MissionAction::Assign => {
            mission.status == MissionStatus::Unassigned
                || (mission.status == MissionStatus::Tentative
                    && mission.tentative_volunteer.is_empty()
                    && mission.volunteer.is_empty())
        }
        MissionAction::Accept => {
            mission.status == MissionStatus::Tentative && !mission.tentative_volunteer.is_empty()
        }
        MissionAction::Start => {
            mission.status == MissionStatus::Assigned && mission.volunteer.uid == *actor_uid
        }
        MissionAction::Deliver => {
            mission.status == MissionStatus::Started && mission.volunteer.uid == *actor_uid
        }
        MissionAction::Release => !mission.status.is_terminal(),
    };

    if legal {
        Ok(())
    } else {
        Err(MissionError::Precondition {
            action,
            status: mission.status,
        })
    }
}

/// Applies a delta to a record: status and both slots are replaced
/// wholesale, nothing else is touched.
pub fn apply_delta(mission: &mut Mission, delta: &TransitionDelta) {
    mission.status = delta.status;
    mission.tentative_volunteer = delta.tentative_volunteer.clone();
    mission.volunteer = delta.volunteer.clone();
}
