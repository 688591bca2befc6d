use crate::shared::constants::UNKNOWN_ZONE;
use crate::shared::geometry::Point;

use super::zone::Zone;

/// Assigns points to the first zone (in configuration order) containing them.
///
/// There is no area or specificity tie-break: overlapping zones resolve
/// purely by their position in the list.
#[derive(Clone, Debug, Default)]
pub struct ZoneClassifier {
    zones: Vec<Zone>,
}

impl ZoneClassifier {
    pub fn new(zones: Vec<Zone>) -> Self {
        Self { zones }
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Name of the first zone containing `point`, or `"Unknown"`.
    pub fn classify(&self, point: Point) -> &str {
        classify(point, &self.zones)
    }
}

/// Free-function form of [`ZoneClassifier::classify`].
pub fn classify(point: Point, zones: &[Zone]) -> &str {
    zones
        .iter()
        .find(|zone| point_in_polygon(point, &zone.polygon))
        .map(|zone| zone.name.as_str())
        .unwrap_or(UNKNOWN_ZONE)
}

/// Ray-casting containment test over the implicitly closed polygon.
///
/// An edge toggles the result when the point's y lies in `(min_y, max_y]`
/// of the edge and the point is left of (or on) the edge's crossing. Horizontal
/// edges never cross the horizontal ray and are skipped before any intercept
/// is computed.
pub fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    let n = polygon.len();
    if n < Zone::MIN_VERTICES {
        return false;
    }

    let mut inside = false;
    let mut p1 = polygon[n - 1];
    for &p2 in polygon {
        let (edge_start, edge_end) = (p1, p2);
        p1 = p2;

        if edge_start.y == edge_end.y {
            continue;
        }
        let in_band = point.y > edge_start.y.min(edge_end.y)
            && point.y <= edge_start.y.max(edge_end.y);
        if !in_band || point.x > edge_start.x.max(edge_end.x) {
            continue;
        }

        if edge_start.x == edge_end.x {
            inside = !inside;
            continue;
        }
        let x_intercept = (point.y - edge_start.y) * (edge_end.x - edge_start.x)
            / (edge_end.y - edge_start.y)
            + edge_start.x;
        if point.x <= x_intercept {
            inside = !inside;
        }
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    fn square(name: &str, x0: f64, y0: f64, size: f64) -> Zone {
        Zone::new(
            name,
            pts(&[(x0, y0), (x0 + size, y0), (x0 + size, y0 + size), (x0, y0 + size)]),
        )
    }

    #[rstest]
    #[case(5.0, 5.0, true)]
    #[case(0.5, 9.5, true)]
    #[case(9.9, 0.1, true)]
    #[case(15.0, 5.0, false)]
    #[case(-1.0, 5.0, false)]
    #[case(5.0, -0.1, false)]
    #[case(5.0, 10.5, false)]
    fn test_square_containment(#[case] x: f64, #[case] y: f64, #[case] expected: bool) {
        let zone = square("Q", 0.0, 0.0, 10.0);
        assert_eq!(point_in_polygon(Point::new(x, y), &zone.polygon), expected);
    }

    #[test]
    fn test_concave_polygon_notch_is_outside() {
        // U shape: the notch between the arms is outside.
        let u = pts(&[
            (0.0, 0.0),
            (30.0, 0.0),
            (30.0, 30.0),
            (20.0, 30.0),
            (20.0, 10.0),
            (10.0, 10.0),
            (10.0, 30.0),
            (0.0, 30.0),
        ]);
        assert!(point_in_polygon(Point::new(5.0, 20.0), &u));
        assert!(point_in_polygon(Point::new(25.0, 20.0), &u));
        assert!(point_in_polygon(Point::new(15.0, 5.0), &u));
        assert!(!point_in_polygon(Point::new(15.0, 20.0), &u));
    }

    #[test]
    fn test_triangle() {
        let tri = pts(&[(0.0, 0.0), (10.0, 0.0), (5.0, 10.0)]);
        assert!(point_in_polygon(Point::new(5.0, 3.0), &tri));
        assert!(!point_in_polygon(Point::new(1.0, 8.0), &tri));
    }

    #[test]
    fn test_point_level_with_horizontal_edge() {
        // y equals the top edge; the horizontal edge is skipped and the two
        // vertical edges decide the result.
        let zone = square("Q", 0.0, 0.0, 10.0);
        assert!(point_in_polygon(Point::new(5.0, 10.0), &zone.polygon));
        assert!(!point_in_polygon(Point::new(5.0, 0.0), &zone.polygon));
    }

    #[test]
    fn test_degenerate_polygon_contains_nothing() {
        let line = pts(&[(0.0, 0.0), (10.0, 10.0)]);
        assert!(!point_in_polygon(Point::new(5.0, 5.0), &line));
        assert!(!point_in_polygon(Point::new(5.0, 5.0), &[]));
    }

    #[test]
    fn test_empty_zone_list_is_unknown() {
        assert_eq!(classify(Point::new(1.0, 1.0), &[]), UNKNOWN_ZONE);
    }

    #[test]
    fn test_outside_every_zone_is_unknown() {
        let zones = vec![square("Queue A", 0.0, 0.0, 10.0), square("Caisse", 20.0, 0.0, 10.0)];
        assert_eq!(classify(Point::new(15.0, 5.0), &zones), UNKNOWN_ZONE);
        assert_eq!(classify(Point::new(25.0, 5.0), &zones), "Caisse");
    }

    #[test]
    fn test_first_listed_zone_wins_on_overlap() {
        let a = square("A", 0.0, 0.0, 10.0);
        let b = square("B", 5.0, 5.0, 10.0);
        let point = Point::new(7.0, 7.0);

        let classifier = ZoneClassifier::new(vec![a.clone(), b.clone()]);
        assert_eq!(classifier.classify(point), "A");

        let reversed = ZoneClassifier::new(vec![b, a]);
        assert_eq!(reversed.classify(point), "B");
    }
}
