//! Geometric store filters.
//!
//! Shapes are independent of FIQL: a caller builds a [`Shape`] (usually from a
//! GeoJSON geometry) and combines the resulting fragment with a compiled
//! filter through [`StoreQuery::and_geo`](crate::store::StoreQuery::and_geo).

use serde_json::{Value as Json, json};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    /// Geometry types other than Point and Polygon
    #[error("unsupported shape type '{kind}'")]
    UnsupportedShape { kind: String },

    #[error("invalid coordinates: {reason}")]
    InvalidCoordinates { reason: String },

    /// `$geoWithin` needs an area
    #[error("a {kind} cannot bound a $geoWithin query")]
    NotWithinCapable { kind: &'static str },
}

/// A point or a single closed ring, coordinates as `[lng, lat]`.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Point { lng: f64, lat: f64 },
    Polygon { ring: Vec<[f64; 2]> },
}

fn position(lng: f64, lat: f64) -> Result<[f64; 2], GeoError> {
    if !(-180.0..=180.0).contains(&lng) || !(-90.0..=90.0).contains(&lat) {
        return Err(GeoError::InvalidCoordinates {
            reason: format!("[{lng}, {lat}] is outside [-180..180, -90..90]"),
        });
    }
    Ok([lng, lat])
}

fn parse_position(value: &Json) -> Result<[f64; 2], GeoError> {
    match value.as_array().map(Vec::as_slice) {
        Some([lng, lat, ..]) => match (lng.as_f64(), lat.as_f64()) {
            (Some(lng), Some(lat)) => position(lng, lat),
            _ => Err(GeoError::InvalidCoordinates {
                reason: format!("non-numeric position {value}"),
            }),
        },
        _ => Err(GeoError::InvalidCoordinates {
            reason: format!("expected [lng, lat], found {value}"),
        }),
    }
}

impl Shape {
    pub fn point(lng: f64, lat: f64) -> Result<Shape, GeoError> {
        let [lng, lat] = position(lng, lat)?;
        Ok(Shape::Point { lng, lat })
    }

    /// Build a polygon from its outer ring. An open ring is closed.
    pub fn polygon(ring: impl IntoIterator<Item = [f64; 2]>) -> Result<Shape, GeoError> {
        let mut ring = ring
            .into_iter()
            .map(|[lng, lat]| position(lng, lat))
            .collect::<Result<Vec<_>, _>>()?;

        if ring.first() != ring.last()
            && let Some(&first) = ring.first()
        {
            ring.push(first);
        }
        if ring.len() < 4 {
            return Err(GeoError::InvalidCoordinates {
                reason: "a polygon ring needs at least 3 distinct positions".to_string(),
            });
        }
        Ok(Shape::Polygon { ring })
    }

    /// Read a GeoJSON geometry object.
    ///
    /// Polygon coordinates may be given as a list of rings (only the outer
    /// ring is used) or as a bare ring.
    pub fn from_geojson(geometry: &Json) -> Result<Shape, GeoError> {
        let kind = geometry.get("type").and_then(Json::as_str).unwrap_or_default();
        let coordinates = geometry
            .get("coordinates")
            .ok_or_else(|| GeoError::InvalidCoordinates {
                reason: "missing 'coordinates'".to_string(),
            })?;

        match kind {
            "Point" => {
                let [lng, lat] = parse_position(coordinates)?;
                Ok(Shape::Point { lng, lat })
            }
            "Polygon" => {
                let rings = coordinates.as_array().ok_or_else(|| GeoError::InvalidCoordinates {
                    reason: format!("expected a list of positions, found {coordinates}"),
                })?;
                let outer = match rings.first() {
                    Some(Json::Array(first)) if first.first().is_some_and(Json::is_array) => first,
                    _ => rings,
                };
                let ring = outer.iter().map(parse_position).collect::<Result<Vec<_>, _>>()?;
                Shape::polygon(ring)
            }
            other => Err(GeoError::UnsupportedShape {
                kind: other.to_string(),
            }),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Point { .. } => "Point",
            Shape::Polygon { .. } => "Polygon",
        }
    }

    /// Coordinate array: `[lng, lat]` for a point, `[[[lng, lat], ...]]`
    /// for a polygon.
    pub fn coordinates(&self) -> Json {
        match self {
            Shape::Point { lng, lat } => json!([lng, lat]),
            Shape::Polygon { ring } => json!([ring]),
        }
    }

    /// GeoJSON geometry for this shape.
    pub fn to_geometry(&self) -> Json {
        json!({ "type": self.kind(), "coordinates": self.coordinates() })
    }
}

/// `$near` fragment over `path`, optionally bounded in meters.
pub fn near(path: &str, shape: &Shape, max_distance: Option<f64>) -> Json {
    let mut near = json!({ "$geometry": shape.to_geometry() });
    if let Some(meters) = max_distance {
        near["$maxDistance"] = json!(meters);
    }
    json!({ path: { "$near": near } })
}

/// `$geoWithin` fragment over `path`. Only polygons bound an area.
pub fn within(path: &str, shape: &Shape) -> Result<Json, GeoError> {
    match shape {
        Shape::Polygon { .. } => Ok(json!({
            path: { "$geoWithin": { "$geometry": shape.to_geometry() } }
        })),
        Shape::Point { .. } => Err(GeoError::NotWithinCapable { kind: "Point" }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_ring_is_closed() {
        let shape = Shape::polygon([[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]).unwrap();
        let Shape::Polygon { ring } = shape else {
            panic!("expected polygon");
        };
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn degenerate_ring_is_rejected() {
        let err = Shape::polygon([[0.0, 0.0], [1.0, 0.0]]).unwrap_err();
        assert!(matches!(err, GeoError::InvalidCoordinates { .. }));
    }

    #[test]
    fn point_uses_point_type() {
        let shape = Shape::point(-96.5, 40.1).unwrap();
        assert_eq!(
            shape.to_geometry(),
            json!({ "type": "Point", "coordinates": [-96.5, 40.1] })
        );
    }

    #[test]
    fn out_of_range_point() {
        assert!(Shape::point(200.0, 0.0).is_err());
        assert!(Shape::point(0.0, -91.0).is_err());
    }
}
