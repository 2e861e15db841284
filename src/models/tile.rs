use geo::{BoundingRect, MultiPolygon};

/// A single catalog tile: its grid name and footprint.
#[derive(Debug, Clone)]
pub struct Tile {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

impl Tile {
    pub fn new(name: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        Self {
            name: name.into(),
            geometry,
        }
    }

    /// Get the bounding box of this tile
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        self.geometry
            .bounding_rect()
            .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }

    /// GeoJSON feature carrying the tile name under `name_property`
    pub fn to_feature(&self, name_property: &str) -> geojson::Feature {
        let polygons: Vec<Vec<Vec<Vec<f64>>>> = self
            .geometry
            .iter()
            .map(|polygon| {
                std::iter::once(polygon.exterior())
                    .chain(polygon.interiors())
                    .map(|ring| ring.coords().map(|c| vec![c.x, c.y]).collect())
                    .collect()
            })
            .collect();

        let mut properties = geojson::JsonObject::new();
        properties.insert(name_property.to_string(), self.name.clone().into());

        geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::MultiPolygon(
                polygons,
            ))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}
