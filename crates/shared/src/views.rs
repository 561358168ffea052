//! Named operational views over an organization's missions.
//!
//! Each view is a status/funded-status predicate. Views are derived,
//! non-owning projections: they filter a collection, never copy or mutate
//! it. The same predicate doubles as the query descriptor handed to the
//! persistence collaborator.

use crate::domain::{FundedStatus, Mission, MissionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissionView {
    Proposed,
    Planning,
    InProgress,
    Done,
    Incomplete,
}

impl MissionView {
    pub const ALL: [MissionView; 5] = [
        MissionView::Proposed,
        MissionView::Planning,
        MissionView::InProgress,
        MissionView::Done,
        MissionView::Incomplete,
    ];

    /// The status list backing the view's query descriptor.
    pub fn statuses(self) -> &'static [MissionStatus] {
        match self {
            MissionView::Proposed => &[MissionStatus::Unassigned],
            MissionView::Planning => &[MissionStatus::Tentative, MissionStatus::Assigned],
            MissionView::InProgress => &[MissionStatus::Started, MissionStatus::Delivered],
            MissionView::Done => &[MissionStatus::Succeeded, MissionStatus::Failed],
            MissionView::Incomplete => &[
                MissionStatus::Tentative,
                MissionStatus::Assigned,
                MissionStatus::Started,
                MissionStatus::Delivered,
            ],
        }
    }

    /// Only the proposed view reads the funded axis: an unassigned mission
    /// that is already funded belongs to none of the five views.
    pub fn funded_constraint(self) -> Option<FundedStatus> {
        match self {
            MissionView::Proposed => Some(FundedStatus::NotFunded),
            _ => None,
        }
    }

    /// Predicate against a single record's classification pair.
    pub fn contains(self, status: MissionStatus, funded: FundedStatus) -> bool {
        self.statuses().contains(&status)
            && self
                .funded_constraint()
                .map(|required| required == funded)
                .unwrap_or(true)
    }

    pub fn matches(self, mission: &Mission) -> bool {
        self.contains(mission.status, mission.funded_status)
    }

    pub fn filter<'a>(self, missions: &'a [Mission]) -> Vec<&'a Mission> {
        missions.iter().filter(|m| self.matches(m)).collect()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MissionView::Proposed => "proposed",
            MissionView::Planning => "planning",
            MissionView::InProgress => "in_progress",
            MissionView::Done => "done",
            MissionView::Incomplete => "incomplete",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|view| view.as_str() == raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MissionKind, OrganizationId, UserSnapshot};

    fn mission(status: MissionStatus, funded: FundedStatus) -> Mission {
        let mut mission = Mission::proposed(
            MissionKind::Errand,
            OrganizationId::new("org-1"),
            UserSnapshot::empty(),
        );
        mission.status = status;
        mission.funded_status = funded;
        mission
    }

    #[test]
    fn planning_and_in_progress_partition_the_incomplete_statuses() {
        for status in MissionView::Incomplete.statuses() {
            let in_planning = MissionView::Planning.statuses().contains(status);
            let in_progress = MissionView::InProgress.statuses().contains(status);
            assert!(
                in_planning != in_progress,
                "{status:?} must be in exactly one of planning/in-progress"
            );
        }
    }

    #[test]
    fn unassigned_and_funded_belongs_to_no_view() {
        let orphan = mission(MissionStatus::Unassigned, FundedStatus::Funded);
        for view in MissionView::ALL {
            assert!(!view.matches(&orphan), "{view:?}");
        }
    }

    #[test]
    fn proposed_requires_both_unassigned_and_not_funded() {
        assert!(MissionView::Proposed.contains(MissionStatus::Unassigned, FundedStatus::NotFunded));
        assert!(!MissionView::Proposed.contains(MissionStatus::Unassigned, FundedStatus::Funded));
        assert!(!MissionView::Proposed.contains(MissionStatus::Tentative, FundedStatus::NotFunded));
    }

    #[test]
    fn filter_borrows_without_copying() {
        let missions = vec![
            mission(MissionStatus::Tentative, FundedStatus::NotFunded),
            mission(MissionStatus::Started, FundedStatus::Funded),
            mission(MissionStatus::Succeeded, FundedStatus::Funded),
        ];
        let planning = MissionView::Planning.filter(&missions);
        assert_eq!(planning.len(), 1);
        assert!(std::ptr::eq(planning[0], &missions[0]));
    }

    #[test]
    fn incomplete_is_the_union_of_planning_and_in_progress() {
        let missions: Vec<Mission> = [
            MissionStatus::Tentative,
            MissionStatus::Assigned,
            MissionStatus::Started,
            MissionStatus::Delivered,
        ]
        .into_iter()
        .map(|status| mission(status, FundedStatus::NotFunded))
        .collect();

        let incomplete = MissionView::Incomplete.filter(&missions).len();
        let planning = MissionView::Planning.filter(&missions).len();
        let in_progress = MissionView::InProgress.filter(&missions).len();
        assert_eq!(incomplete, planning + in_progress);
        assert_eq!(incomplete, missions.len());
    }

    #[test]
    fn view_names_round_trip() {
        for view in MissionView::ALL {
            assert_eq!(MissionView::parse(view.as_str()), Some(view));
        }
        assert_eq!(MissionView::parse("archived"), None);
    }
}
