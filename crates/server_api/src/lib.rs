//! Application service layer: creation, lifecycle transitions, reads and
//! view queries over the storage collaborator.
//!
//! Every transition runs the same pipeline: fetch the current record,
//! check the precondition gate, build the complete field delta, sanitize,
//! persist, emit the event. Actor identity is trusted input; the gate
//! checks lifecycle consistency, not permission.

use chrono::Utc;
use shared::{
    domain::{FundedStatus, Mission, MissionId, OrganizationId},
    error::{ApiError, ErrorCode},
    grouping::{partition_groups, GroupedMissions},
    lifecycle::{check_transition, transition_delta, MissionAction},
    protocol::{ActorRequest, DeliveryReport, MissionDraft, ServerEvent},
    views::MissionView,
};
use storage::Storage;
use tracing::info;

pub mod sanitize;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

/// Merges the caller's draft over the default record and persists it. The
/// store issues the uid and creation timestamp; the delivery location
/// falls back to the recipient's location when unset.
pub async fn create_mission(ctx: &ApiContext, draft: MissionDraft) -> Result<ServerEvent, ApiError> {
    if draft.organization_uid.is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "organization_uid is required",
        ));
    }

    let draft = sanitize::draft(draft);
    let mut mission = Mission::proposed(draft.kind, draft.organization_uid, draft.recipient);
    if mission.recipient.display_name.is_empty() {
        mission.recipient.display_name = "Recipient".into();
    }

    mission.funded_status = draft.funded_status;
    if mission.funded_status == FundedStatus::Funded {
        mission.funded_at = Some(Utc::now());
    }
    mission.group_uid = draft.group_uid;
    mission.group_display_name = if mission.group_uid.is_empty() {
        String::new()
    } else {
        draft.group_display_name
    };
    mission.pick_up_window = draft.pick_up_window;
    mission.delivery_window = draft.delivery_window;
    mission.pick_up_location = draft.pick_up_location;
    mission.delivery_location = match draft.delivery_location {
        Some(location) if !location.is_unset() => location,
        _ => draft.recipient_location.unwrap_or_default(),
    };

    let mission = ctx.storage.create_mission(mission).await?;
    info!(mission_uid = %mission.uid, organization_uid = %mission.organization_uid, "mission created");
    Ok(ServerEvent::MissionCreated { mission })
}

/// Runs one lifecycle action against a mission. Preconditions are checked
/// here, at the transition boundary, so stricter policies can be layered
/// without touching the delta table.
pub async fn transition(
    ctx: &ApiContext,
    action: MissionAction,
    mission_uid: MissionId,
    actor: &ActorRequest,
) -> Result<ServerEvent, ApiError> {
    let actor = sanitize::actor(actor.snapshot());
    let mission = ctx.storage.get_mission(&mission_uid).await?;
    check_transition(&mission, action, &actor.uid)?;

    let delta = transition_delta(action, mission_uid, &actor);
    let mission = ctx.storage.apply_transition(&delta).await?;
    info!(
        mission_uid = %mission.uid,
        ?action,
        status = mission.status.as_str(),
        "mission transitioned"
    );
    Ok(ServerEvent::MissionUpdated { action, mission })
}

/// Deliver plus the optional post-delivery annotation (confirmation
/// image, notes) in one request.
pub async fn deliver(
    ctx: &ApiContext,
    mission_uid: MissionId,
    actor: &ActorRequest,
    report: DeliveryReport,
) -> Result<ServerEvent, ApiError> {
    let event = transition(ctx, MissionAction::Deliver, mission_uid.clone(), actor).await?;
    if report.is_empty() {
        return Ok(event);
    }

    let report = sanitize::report(report);
    let mission = ctx.storage.annotate_delivery(&mission_uid, &report).await?;
    Ok(ServerEvent::MissionUpdated {
        action: MissionAction::Deliver,
        mission,
    })
}

pub async fn get_mission(ctx: &ApiContext, mission_uid: &MissionId) -> Result<Mission, ApiError> {
    Ok(ctx.storage.get_mission(mission_uid).await?)
}

/// The tentative pool `accept` is driven from.
pub async fn list_available(
    ctx: &ApiContext,
    organization_uid: &OrganizationId,
) -> Result<Vec<Mission>, ApiError> {
    Ok(ctx.storage.list_available(organization_uid).await?)
}

pub async fn list_view(
    ctx: &ApiContext,
    organization_uid: &OrganizationId,
    view: MissionView,
) -> Result<Vec<Mission>, ApiError> {
    Ok(ctx.storage.list_view(organization_uid, view).await?)
}

/// The organization's missions partitioned into batches and standalone
/// entries, in creation order.
pub async fn list_grouped(
    ctx: &ApiContext,
    organization_uid: &OrganizationId,
) -> Result<GroupedMissions, ApiError> {
    let missions = ctx.storage.list_for_organization(organization_uid).await?;
    Ok(partition_groups(missions))
}
