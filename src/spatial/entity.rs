//! Located entities: demand points and facility sites with their geometry.

use super::crs::{Crs, ProjectionError, Projector};
use crate::domain::errors::{PlannerError, PlannerResult};
use geo::{Area, Centroid, Coord, MapCoords, MultiPolygon, Point, Polygon, Validation};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Geometry kinds the cost matrix understands
#[derive(Debug, Clone, PartialEq)]
pub enum EntityGeometry {
    Point(Point<f64>),
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
    /// Any other kind; kept so it can be reported, never measured
    Unsupported(&'static str),
}

impl From<geo::Geometry<f64>> for EntityGeometry {
    fn from(geometry: geo::Geometry<f64>) -> Self {
        match geometry {
            geo::Geometry::Point(p) => EntityGeometry::Point(p),
            geo::Geometry::Polygon(p) => EntityGeometry::Polygon(p),
            geo::Geometry::MultiPolygon(mp) => EntityGeometry::MultiPolygon(mp),
            geo::Geometry::Line(_) => EntityGeometry::Unsupported("Line"),
            geo::Geometry::LineString(_) => EntityGeometry::Unsupported("LineString"),
            geo::Geometry::MultiPoint(_) => EntityGeometry::Unsupported("MultiPoint"),
            geo::Geometry::MultiLineString(_) => EntityGeometry::Unsupported("MultiLineString"),
            geo::Geometry::GeometryCollection(_) => {
                EntityGeometry::Unsupported("GeometryCollection")
            }
            geo::Geometry::Rect(_) => EntityGeometry::Unsupported("Rect"),
            geo::Geometry::Triangle(_) => EntityGeometry::Unsupported("Triangle"),
        }
    }
}

impl From<Point<f64>> for EntityGeometry {
    fn from(point: Point<f64>) -> Self {
        EntityGeometry::Point(point)
    }
}

impl From<Polygon<f64>> for EntityGeometry {
    fn from(polygon: Polygon<f64>) -> Self {
        EntityGeometry::Polygon(polygon)
    }
}

impl From<MultiPolygon<f64>> for EntityGeometry {
    fn from(multi: MultiPolygon<f64>) -> Self {
        EntityGeometry::MultiPolygon(multi)
    }
}

impl EntityGeometry {
    pub fn kind(&self) -> &'static str {
        match self {
            EntityGeometry::Point(_) => "Point",
            EntityGeometry::Polygon(_) => "Polygon",
            EntityGeometry::MultiPolygon(_) => "MultiPolygon",
            EntityGeometry::Unsupported(kind) => *kind,
        }
    }

    /// The planar coordinate standing in for this geometry: the point itself,
    /// or the centroid of a valid, non-empty (multi-)polygon.
    pub fn representative_coord(&self) -> Option<Coord<f64>> {
        match self {
            EntityGeometry::Point(p) => {
                let c = p.0;
                (c.x.is_finite() && c.y.is_finite()).then_some(c)
            }
            EntityGeometry::Polygon(p) if polygon_is_valid(p) => p.centroid().map(|c| c.0),
            EntityGeometry::MultiPolygon(mp) if multi_polygon_is_valid(mp) => {
                mp.centroid().map(|c| c.0)
            }
            EntityGeometry::Polygon(_) | EntityGeometry::MultiPolygon(_) => None,
            EntityGeometry::Unsupported(_) => None,
        }
    }

    /// Reprojects every vertex. Unsupported geometries pass through untouched.
    pub fn reproject(&self, projector: &Projector) -> Result<Self, ProjectionError> {
        let project = |c: Coord<f64>| projector.project(c);
        Ok(match self {
            EntityGeometry::Point(p) => EntityGeometry::Point(p.try_map_coords(project)?),
            EntityGeometry::Polygon(p) => EntityGeometry::Polygon(p.try_map_coords(project)?),
            EntityGeometry::MultiPolygon(mp) => {
                EntityGeometry::MultiPolygon(mp.try_map_coords(project)?)
            }
            EntityGeometry::Unsupported(kind) => EntityGeometry::Unsupported(*kind),
        })
    }
}

/// OGC validity (closed, simple rings, finite coordinates) plus a non-empty interior
fn polygon_is_valid(polygon: &Polygon<f64>) -> bool {
    polygon.exterior().0.len() >= 4 && polygon.is_valid() && polygon.unsigned_area() > 0.0
}

fn multi_polygon_is_valid(multi: &MultiPolygon<f64>) -> bool {
    !multi.0.is_empty() && multi.0.iter().all(polygon_is_valid) && multi.is_valid()
}

/// One record of an input layer: attribute properties plus geometry
#[derive(Debug, Clone)]
pub struct Feature {
    pub properties: Map<String, Value>,
    pub geometry: EntityGeometry,
}

impl Feature {
    pub fn new(geometry: impl Into<EntityGeometry>) -> Self {
        Self {
            properties: Map::new(),
            geometry: geometry.into(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Identifier in `field`, coerced to its string form.
    pub fn identifier(&self, field: &str) -> Option<String> {
        match self.properties.get(field)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

/// A layer of features sharing one coordinate reference system
#[derive(Debug, Clone, Default)]
pub struct EntityCollection {
    pub crs: Option<Crs>,
    pub features: Vec<Feature>,
}

impl EntityCollection {
    pub fn new(crs: Crs) -> Self {
        Self {
            crs: Some(crs),
            features: Vec::new(),
        }
    }

    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.push(feature);
        self
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Pairs each feature with its identifier.
    ///
    /// Fails when any feature lacks the identifier or an identifier repeats.
    pub fn located_entities(&self, collection: &str, id_field: &str) -> PlannerResult<Vec<LocatedEntity>> {
        let mut seen = BTreeSet::new();
        let mut entities = Vec::with_capacity(self.features.len());
        for feature in &self.features {
            let id = feature
                .identifier(id_field)
                .ok_or_else(|| PlannerError::MissingIdentifier {
                    collection: collection.to_string(),
                    field: id_field.to_string(),
                })?;
            if !seen.insert(id.clone()) {
                return Err(PlannerError::DuplicateIdentifier {
                    collection: collection.to_string(),
                    id,
                });
            }
            entities.push(LocatedEntity {
                id,
                geometry: feature.geometry.clone(),
            });
        }
        Ok(entities)
    }
}

/// An identified geometry
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedEntity {
    pub id: String,
    pub geometry: EntityGeometry,
}

/// Planar coordinate of a located entity, in the units of its reference system
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedCoordinate {
    pub id: String,
    pub coord: Coord<f64>,
}

/// Reprojects all entities or none: any failure is returned and the caller keeps the originals.
pub fn reproject_all(
    entities: &[LocatedEntity],
    projector: &Projector,
) -> Result<Vec<LocatedEntity>, ProjectionError> {
    entities
        .iter()
        .map(|e| {
            Ok(LocatedEntity {
                id: e.id.clone(),
                geometry: e.geometry.reproject(projector)?,
            })
        })
        .collect()
}

/// Extracts one coordinate per entity, dropping (with a warning) those without one.
pub fn extract_coordinates(collection: &str, entities: &[LocatedEntity]) -> Vec<ProjectedCoordinate> {
    entities
        .iter()
        .filter_map(|entity| match entity.representative_coord() {
            Some(coord) => {
                debug!(collection, id = %entity.id, x = coord.x, y = coord.y, "extracted coordinate");
                Some(ProjectedCoordinate {
                    id: entity.id.clone(),
                    coord,
                })
            }
            None => {
                match &entity.geometry {
                    EntityGeometry::Unsupported(kind) => warn!(
                        collection,
                        id = %entity.id,
                        kind = *kind,
                        "unexpected geometry type, entity skipped"
                    ),
                    other => warn!(
                        collection,
                        id = %entity.id,
                        kind = other.kind(),
                        "invalid or empty geometry, entity skipped"
                    ),
                }
                None
            }
        })
        .collect()
}

impl LocatedEntity {
    pub fn representative_coord(&self) -> Option<Coord<f64>> {
        self.geometry.representative_coord()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, point, polygon, Geometry};

    fn square(x0: f64, y0: f64, side: f64) -> Polygon<f64> {
        polygon![
            (x: x0, y: y0),
            (x: x0 + side, y: y0),
            (x: x0 + side, y: y0 + side),
            (x: x0, y: y0 + side),
            (x: x0, y: y0),
        ]
    }

    #[test]
    fn point_yields_its_own_coordinate() {
        let g = EntityGeometry::from(point!(x: 3.0, y: 4.0));
        assert_eq!(g.representative_coord(), Some(Coord { x: 3.0, y: 4.0 }));
    }

    #[test]
    fn polygon_yields_centroid() {
        let g = EntityGeometry::from(square(0.0, 0.0, 2.0));
        let c = g.representative_coord().unwrap();
        assert!((c.x - 1.0).abs() < 1e-12 && (c.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn multi_polygon_yields_area_weighted_centroid() {
        let mp = MultiPolygon::new(vec![square(0.0, 0.0, 2.0), square(10.0, 0.0, 2.0)]);
        let c = EntityGeometry::from(mp).representative_coord().unwrap();
        assert!((c.x - 6.0).abs() < 1e-9);
        assert!((c.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_and_degenerate_polygons_yield_nothing() {
        let empty = Polygon::new(geo::LineString::new(vec![]), vec![]);
        assert_eq!(EntityGeometry::from(empty).representative_coord(), None);

        let flat = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 2.0, y: 0.0), (x: 0.0, y: 0.0)];
        assert_eq!(EntityGeometry::from(flat).representative_coord(), None);

        assert_eq!(
            EntityGeometry::from(MultiPolygon::<f64>::new(vec![])).representative_coord(),
            None
        );
    }

    #[test]
    fn self_intersecting_polygons_yield_nothing() {
        let bowtie = polygon![(x: 0.0, y: 0.0), (x: 4.0, y: 4.0), (x: 4.0, y: 0.0), (x: 0.0, y: 3.0), (x: 0.0, y: 0.0)];
        assert_eq!(EntityGeometry::from(bowtie.clone()).representative_coord(), None);

        let mixed = MultiPolygon::new(vec![square(10.0, 10.0, 2.0), bowtie]);
        assert_eq!(EntityGeometry::from(mixed).representative_coord(), None);
    }

    #[test]
    fn unsupported_kinds_are_tagged() {
        let line = Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)]);
        let g = EntityGeometry::from(line);
        assert_eq!(g, EntityGeometry::Unsupported("LineString"));
        assert_eq!(g.representative_coord(), None);
    }

    #[test]
    fn identifiers_are_coerced_to_strings() {
        let f = Feature::new(point!(x: 0.0, y: 0.0))
            .with_property("string_id", 42)
            .with_property("flag", true)
            .with_property("none", Value::Null);
        assert_eq!(f.identifier("string_id").as_deref(), Some("42"));
        assert_eq!(f.identifier("flag").as_deref(), Some("true"));
        assert_eq!(f.identifier("none"), None);
        assert_eq!(f.identifier("absent"), None);
    }

    #[test]
    fn located_entities_reject_missing_and_duplicate_ids() {
        let missing = EntityCollection::new(Crs::utm_33n())
            .with_feature(Feature::new(point!(x: 0.0, y: 0.0)).with_property("string_id", "A"))
            .with_feature(Feature::new(point!(x: 1.0, y: 0.0)));
        assert!(matches!(
            missing.located_entities("demand", "string_id"),
            Err(PlannerError::MissingIdentifier { .. })
        ));

        let duplicate = EntityCollection::new(Crs::utm_33n())
            .with_feature(Feature::new(point!(x: 0.0, y: 0.0)).with_property("string_id", "A"))
            .with_feature(Feature::new(point!(x: 1.0, y: 0.0)).with_property("string_id", "A"));
        match duplicate.located_entities("facility", "string_id") {
            Err(PlannerError::DuplicateIdentifier { collection, id }) => {
                assert_eq!(collection, "facility");
                assert_eq!(id, "A");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn extraction_drops_entities_without_coordinates() {
        let entities = vec![
            LocatedEntity {
                id: "ok".into(),
                geometry: EntityGeometry::from(point!(x: 1.0, y: 2.0)),
            },
            LocatedEntity {
                id: "line".into(),
                geometry: EntityGeometry::Unsupported("LineString"),
            },
        ];
        let coords = extract_coordinates("demand", &entities);
        assert_eq!(coords.len(), 1);
        assert_eq!(coords[0].id, "ok");
    }

    #[test]
    fn reprojection_maps_every_vertex() {
        let projector = Projector::new(Some(&Crs::Wgs84), &Crs::utm_33n()).unwrap();
        let g = EntityGeometry::from(square(14.9, 52.0, 0.2)).reproject(&projector).unwrap();
        match g {
            EntityGeometry::Polygon(p) => assert!(p.exterior().coords().all(|c| c.x > 100_000.0)),
            other => panic!("unexpected {:?}", other),
        }
    }
}
