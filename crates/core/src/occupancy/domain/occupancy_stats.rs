use serde::{Deserialize, Serialize};

/// Frame-level counters published with every snapshot.
///
/// Serialized with the camelCase keys subscribers expect.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyStats {
    pub total_people: usize,
    pub in_queue: u32,
    pub at_cashdesk: u32,
    /// Never incremented: completions need identity tracking.
    pub completed: u32,
    pub avg_wait_time: f64,
    pub max_wait_time: f64,
    pub alerts: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityState {
    Waiting,
    Serving,
    Alert,
}

/// One row per detection, in detection order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityStatus {
    /// 1-based position in the frame's detection list; not stable across frames.
    pub id: usize,
    pub zone: String,
    pub wait_time: f64,
    pub status: EntityState,
    pub has_alert: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_use_camel_case_keys() {
        let stats = OccupancyStats {
            total_people: 3,
            in_queue: 2,
            at_cashdesk: 1,
            completed: 0,
            avg_wait_time: 30.0,
            max_wait_time: 45.0,
            alerts: 0,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalPeople"], 3);
        assert_eq!(json["inQueue"], 2);
        assert_eq!(json["atCashdesk"], 1);
        assert_eq!(json["maxWaitTime"], 45.0);
    }

    #[test]
    fn test_entity_status_serialization() {
        let entity = EntityStatus {
            id: 1,
            zone: "Queue A".into(),
            wait_time: 95.0,
            status: EntityState::Alert,
            has_alert: true,
        };
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["status"], "alert");
        assert_eq!(json["hasAlert"], true);
        assert_eq!(json["waitTime"], 95.0);
    }
}
