use serde::{Deserialize, Serialize};

use crate::shared::geometry::Point;

/// A named polygonal region of the camera frame.
///
/// The polygon is implicitly closed: the last vertex connects back to the
/// first. Categories are derived from the name, see [`is_queue_zone`] and
/// [`is_service_zone`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    pub polygon: Vec<Point>,
}

impl Zone {
    pub const MIN_VERTICES: usize = 3;

    pub fn new(name: impl Into<String>, polygon: Vec<Point>) -> Self {
        Self {
            name: name.into(),
            polygon,
        }
    }

    pub fn is_queue(&self) -> bool {
        is_queue_zone(&self.name)
    }

    pub fn is_service(&self) -> bool {
        is_service_zone(&self.name)
    }
}

/// True when the zone name case-insensitively contains "queue".
pub fn is_queue_zone(name: &str) -> bool {
    name.to_lowercase().contains("queue")
}

/// True when the zone name case-insensitively contains "cashdesk" or "caisse".
pub fn is_service_zone(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("cashdesk") || lower.contains("caisse")
}

/// The persisted zone document: `{"zones": [...]}` in precedence order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    #[serde(default)]
    pub zones: Vec<Zone>,
}

impl ZoneConfig {
    pub fn new(zones: Vec<Zone>) -> Self {
        Self { zones }
    }

    /// Checks every zone has a non-empty name and at least three vertices.
    pub fn validate(&self) -> Result<(), String> {
        for (i, zone) in self.zones.iter().enumerate() {
            if zone.name.trim().is_empty() {
                return Err(format!("zone #{} has an empty name", i + 1));
            }
            if zone.polygon.len() < Zone::MIN_VERTICES {
                return Err(format!(
                    "zone '{}' needs at least {} vertices, got {}",
                    zone.name,
                    Zone::MIN_VERTICES,
                    zone.polygon.len()
                ));
            }
            if zone
                .polygon
                .iter()
                .any(|p| !p.x.is_finite() || !p.y.is_finite())
            {
                return Err(format!("zone '{}' has a non-finite vertex", zone.name));
            }
        }
        Ok(())
    }
}
