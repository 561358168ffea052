use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    domain::{MissionId, MissionStatus},
    lifecycle::MissionAction,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    NoData,
    Precondition,
    Validation,
    Internal,
}

/// Wire-facing error shape mirrored across the HTTP boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Failures surfaced by the mission core and its persistence collaborator.
///
/// Collaborator failures propagate unchanged (no retries, no local
/// recovery); the view and grouping functions are total and never fail.
#[derive(Debug, Error)]
pub enum MissionError {
    #[error("mission {0} not found")]
    NotFound(MissionId),
    #[error("mission {0} resolved to an empty document")]
    NoData(MissionId),
    #[error("{action:?} is not legal from status {status:?}")]
    Precondition {
        action: MissionAction,
        status: MissionStatus,
    },
    #[error("persistence failure: {0}")]
    Persistence(#[from] anyhow::Error),
}

impl From<MissionError> for ApiError {
    fn from(value: MissionError) -> Self {
        let code = match &value {
            MissionError::NotFound(_) => ErrorCode::NotFound,
            MissionError::NoData(_) => ErrorCode::NoData,
            MissionError::Precondition { .. } => ErrorCode::Precondition,
            MissionError::Persistence(_) => ErrorCode::Internal,
        };
        ApiError::new(code, value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_maps_to_its_own_code() {
        let err = MissionError::Precondition {
            action: MissionAction::Accept,
            status: MissionStatus::Unassigned,
        };
        let api: ApiError = err.into();
        assert_eq!(api.code, ErrorCode::Precondition);
        assert!(api.message.contains("Accept"));
    }

    #[test]
    fn not_found_carries_the_mission_uid() {
        let err = MissionError::NotFound(MissionId::new("m-9"));
        assert!(err.to_string().contains("m-9"));
    }
}
