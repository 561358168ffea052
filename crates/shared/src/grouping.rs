//! Partitions a mission collection into batches sharing a group uid plus
//! the standalone remainder. Single pass with a hash index, so it stays
//! linear; groups keep first-seen order and mission lists keep input order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{GroupId, Mission, MissionStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionGroup {
    pub group_uid: GroupId,
    /// Fixed from the first mission seen for this group uid.
    pub display_name: String,
    pub missions: Vec<Mission>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupedMissions {
    pub groups: Vec<MissionGroup>,
    pub standalone: Vec<Mission>,
}

pub fn partition_groups(missions: Vec<Mission>) -> GroupedMissions {
    let mut groups: Vec<MissionGroup> = Vec::new();
    let mut index: HashMap<GroupId, usize> = HashMap::new();
    let mut standalone = Vec::new();

    for mission in missions {
        if mission.is_standalone() {
            standalone.push(mission);
            continue;
        }
        match index.get(&mission.group_uid) {
            Some(&slot) => groups[slot].missions.push(mission),
            None => {
                index.insert(mission.group_uid.clone(), groups.len());
                groups.push(MissionGroup {
                    group_uid: mission.group_uid.clone(),
                    display_name: mission.group_display_name.clone(),
                    missions: vec![mission],
                });
            }
        }
    }

    GroupedMissions { groups, standalone }
}

/// Exact-status filter primitive the views and listings compose from.
pub fn filter_by_status(missions: &[Mission], status: MissionStatus) -> Vec<&Mission> {
    missions.iter().filter(|m| m.status == status).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MissionId, MissionKind, OrganizationId, UserSnapshot};

    fn mission(uid: &str, group_uid: &str) -> Mission {
        let mut mission = Mission::proposed(
            MissionKind::Errand,
            OrganizationId::new("org-1"),
            UserSnapshot::empty(),
        );
        mission.uid = MissionId::new(uid);
        mission.group_uid = GroupId::new(group_uid);
        if !group_uid.is_empty() {
            mission.group_display_name = format!("batch {group_uid}");
        }
        mission
    }

    #[test]
    fn partitions_groups_and_standalone_preserving_order() {
        let input = vec![
            mission("m0", "g1"),
            mission("m1", ""),
            mission("m2", "g1"),
            mission("m3", "g2"),
        ];
        let grouped = partition_groups(input);

        assert_eq!(grouped.groups.len(), 2);
        assert_eq!(grouped.groups[0].group_uid, GroupId::new("g1"));
        assert_eq!(
            grouped.groups[0]
                .missions
                .iter()
                .map(|m| m.uid.as_str())
                .collect::<Vec<_>>(),
            ["m0", "m2"]
        );
        assert_eq!(grouped.groups[1].group_uid, GroupId::new("g2"));
        assert_eq!(grouped.groups[1].missions.len(), 1);
        assert_eq!(grouped.standalone.len(), 1);
        assert_eq!(grouped.standalone[0].uid, MissionId::new("m1"));
    }

    #[test]
    fn group_display_name_comes_from_the_first_member() {
        let mut first = mission("m0", "g1");
        first.group_display_name = "Morning run".into();
        let mut second = mission("m1", "g1");
        second.group_display_name = "renamed later".into();

        let grouped = partition_groups(vec![first, second]);
        assert_eq!(grouped.groups[0].display_name, "Morning run");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let grouped = partition_groups(Vec::new());
        assert!(grouped.groups.is_empty());
        assert!(grouped.standalone.is_empty());
    }

    #[test]
    fn status_filter_is_idempotent() {
        let mut started = mission("m0", "");
        started.status = MissionStatus::Started;
        let mut tentative = mission("m1", "");
        tentative.status = MissionStatus::Tentative;
        let missions = vec![started, tentative];

        let once: Vec<Mission> = filter_by_status(&missions, MissionStatus::Started)
            .into_iter()
            .cloned()
            .collect();
        let twice: Vec<Mission> = filter_by_status(&once, MissionStatus::Started)
            .into_iter()
            .cloned()
            .collect();
        assert_eq!(once, twice);
        assert_eq!(once.len(), 1);
    }
}
