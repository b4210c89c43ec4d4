//! SVG rendering of map snapshots.

use crate::atlas::{Feature, FeatureCollection, Geometry, feature_matches};
use crate::lookup::Highlight;
use crate::markup::escape;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;

pub const MAP_WIDTH: f64 = 900.0;
pub const MAP_HEIGHT: f64 = 500.0;
const BASE_FILL: &str = "#2a2a2a";
const STROKE: &str = "#444";

/// Equirectangular projection onto the map canvas, rounded to whole units.
pub fn project(lon: f64, lat: f64) -> (i64, i64) {
    let x = (lon + 180.0) * (MAP_WIDTH / 360.0);
    let y = (90.0 - lat) * (MAP_HEIGHT / 180.0);
    (x.round() as i64, y.round() as i64)
}

/// `M x,y L x,y … Z` for one linear ring; empty for an empty ring.
pub fn ring_to_path(ring: &Value) -> String {
    let Some(points) = ring.as_array() else {
        return String::new();
    };
    let mut path = String::new();
    for point in points {
        let Some((lon, lat)) = position(point) else {
            continue;
        };
        let (x, y) = project(lon, lat);
        path.push(if path.is_empty() { 'M' } else { 'L' });
        path.push_str(&format!("{x},{y}"));
    }
    if !path.is_empty() {
        path.push('Z');
    }
    path
}

fn position(point: &Value) -> Option<(f64, f64)> {
    let coords = point.as_array()?;
    Some((coords.first()?.as_f64()?, coords.get(1)?.as_f64()?))
}

fn polygon_to_path(polygon: &Value) -> String {
    polygon
        .as_array()
        .map(|rings| {
            rings
                .iter()
                .map(ring_to_path)
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

/// Path data for Polygon and MultiPolygon geometries; other types draw
/// nothing.
pub fn geometry_to_path(geometry: &Geometry) -> String {
    match geometry.kind.as_str() {
        "Polygon" => polygon_to_path(&geometry.coordinates),
        "MultiPolygon" => geometry
            .coordinates
            .as_array()
            .map(|polygons| {
                polygons
                    .iter()
                    .map(polygon_to_path)
                    .filter(|p| !p.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default(),
        _ => String::new(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderedMap {
    pub svg: String,
    /// Names of the highlighted features, in drawing order.
    pub highlighted: Vec<String>,
}

struct RenderedFeature {
    element: String,
    highlighted: Option<String>,
}

fn render_feature(feature: &Feature, highlight: &Highlight) -> Option<RenderedFeature> {
    let path = feature.geometry.as_ref().map(geometry_to_path)?;
    if path.is_empty() {
        return None;
    }
    let name = feature.name();
    let is_highlighted = feature_matches(feature, &highlight.names);
    let (fill, opacity) = if is_highlighted {
        (highlight.color.as_str(), "0.9")
    } else {
        (BASE_FILL, "0.3")
    };
    let title = if name.is_empty() {
        String::new()
    } else {
        format!("<title>{}</title>", escape(name))
    };
    Some(RenderedFeature {
        element: format!(
            r#"<path d="{path}" fill="{fill}" stroke="{STROKE}" stroke-width="0.5" opacity="{opacity}">{title}</path>"#,
            fill = escape(fill),
        ),
        highlighted: is_highlighted.then(|| name.to_string()),
    })
}

/// Draws every feature, filling those that match the highlight.
pub fn render_map(collection: &FeatureCollection, highlight: &Highlight) -> RenderedMap {
    let rendered: Vec<RenderedFeature> = collection
        .features
        .par_iter()
        .filter_map(|feature| render_feature(feature, highlight))
        .collect();
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {MAP_WIDTH} {MAP_HEIGHT}" role="img" aria-label="World map">"#
    );
    let mut highlighted = Vec::new();
    for feature in rendered {
        svg.push_str(&feature.element);
        if let Some(name) = feature.highlighted {
            highlighted.push(name);
        }
    }
    svg.push_str("</svg>");
    RenderedMap { svg, highlighted }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::tests::sample_collection;
    use serde_json::json;

    fn highlight(names: &[&str]) -> Highlight {
        Highlight {
            color: "#4169e1".to_string(),
            names: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    #[test]
    fn projection_corners() {
        assert_eq!(project(-180.0, 90.0), (0, 0));
        assert_eq!(project(180.0, -90.0), (900, 500));
        assert_eq!(project(0.0, 0.0), (450, 250));
    }

    #[test]
    fn ring_path_is_closed() {
        let ring = json!([[-180.0, 90.0], [0.0, 0.0], [180.0, -90.0]]);
        assert_eq!(ring_to_path(&ring), "M0,0L450,250L900,500Z");
        assert_eq!(ring_to_path(&json!([])), "");
    }

    #[test]
    fn unsupported_geometry_draws_nothing() {
        let point = Geometry {
            kind: "Point".to_string(),
            coordinates: json!([0.0, 0.0]),
        };
        assert_eq!(geometry_to_path(&point), "");
    }

    #[test]
    fn multipolygon_joins_parts() {
        let geometry = Geometry {
            kind: "MultiPolygon".to_string(),
            coordinates: json!([
                [[[-180.0, 90.0], [0.0, 0.0]]],
                [[[0.0, 0.0], [180.0, -90.0]]]
            ]),
        };
        assert_eq!(geometry_to_path(&geometry), "M0,0L450,250Z M450,250L900,500Z");
    }

    #[test]
    fn highlighted_features_use_selection_color() {
        let rendered = render_map(&sample_collection(), &highlight(&["Germany"]));
        assert_eq!(rendered.highlighted, vec!["Germany".to_string()]);
        assert!(rendered.svg.starts_with("<svg"));
        assert!(rendered.svg.contains(r##"fill="#4169e1""##));
        assert!(rendered.svg.contains("<title>United Kingdom</title>"));
        assert_eq!(rendered.svg.matches("<path").count(), 2);
    }

    #[test]
    fn nothing_highlighted_without_matches() {
        let rendered = render_map(&sample_collection(), &highlight(&["Atlantis"]));
        assert!(rendered.highlighted.is_empty());
        assert!(!rendered.svg.contains("opacity=\"0.9\""));
    }
}
