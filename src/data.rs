use crate::error::{Error, Result};
use geo::MultiPolygon;
use shapefile::Reader;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A district name and its geometry, before zone/color annotation.
#[derive(Debug, Clone)]
pub struct Boundary {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

fn load_err(e: impl std::fmt::Display) -> Error {
    Error::DataLoad(e.to_string())
}

/// Loads district boundaries from a shapefile or GeoJSON file.
///
/// `name_column` is the attribute holding the district name (`NAME_1` in the
/// GADM Portugal layer). Records with a null name or a non-polygon shape are skipped.
pub fn load_boundaries(path: &Path, name_column: &str) -> Result<Vec<Boundary>> {
    tracing::info!(path = %path.display(), "loading district boundaries");

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s: &str| s.to_lowercase())
        .ok_or_else(|| load_err(format!("{} has no extension", path.display())))?;

    let boundaries = match extension.as_str() {
        "shp" => load_shapefile(path, name_column)?,
        "json" | "geojson" => {
            let file = File::open(path)
                .map_err(|e| load_err(format!("cannot open {}: {e}", path.display())))?;
            parse_geojson(BufReader::new(file), name_column)?
        }
        _ => return Err(load_err(format!("unsupported geometry format: {extension}"))),
    };

    if boundaries.is_empty() {
        return Err(load_err(format!(
            "no district polygons with a '{name_column}' attribute in {}",
            path.display()
        )));
    }

    tracing::info!(districts = boundaries.len(), "loaded district boundaries");
    Ok(boundaries)
}

fn load_shapefile(path: &Path, name_column: &str) -> Result<Vec<Boundary>> {
    let mut reader = Reader::from_path(path)
        .map_err(|e| load_err(format!("cannot open shapefile {}: {e}", path.display())))?;

    let mut boundaries = Vec::new();

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.map_err(load_err)?;

        let name_value = record
            .get(name_column)
            .ok_or_else(|| load_err(format!("column '{name_column}' not found in shapefile")))?;

        let name = match name_value {
            shapefile::dbase::FieldValue::Character(Some(s)) => s.trim().to_string(),
            shapefile::dbase::FieldValue::Character(None) => continue,
            _ => return Err(load_err(format!("shapefile column '{name_column}' must be a string"))),
        };

        let geometry: MultiPolygon<f64> = match shape {
            shapefile::Shape::Polygon(polygon) => polygon
                .try_into()
                .map_err(|e| load_err(format!("cannot convert polygon of {name}: {e:?}")))?,
            shapefile::Shape::PolygonM(polygon) => polygon
                .try_into()
                .map_err(|e| load_err(format!("cannot convert polygonM of {name}: {e:?}")))?,
            shapefile::Shape::PolygonZ(polygon) => polygon
                .try_into()
                .map_err(|e| load_err(format!("cannot convert polygonZ of {name}: {e:?}")))?,
            other => {
                tracing::debug!(district = %name, shape = ?other.shapetype(), "skipping non-polygon shape");
                continue;
            }
        };

        boundaries.push(Boundary { name, geometry });
    }

    Ok(boundaries)
}

/// Reads a GeoJSON FeatureCollection of Polygon/MultiPolygon features.
pub fn parse_geojson<R: std::io::Read>(reader: R, name_column: &str) -> Result<Vec<Boundary>> {
    use geojson::GeoJson;

    let geojson = GeoJson::from_reader(reader).map_err(|e| load_err(format!("invalid GeoJSON: {e}")))?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(load_err("GeoJSON must be a FeatureCollection")),
    };

    let mut boundaries = Vec::new();

    for feature in collection.features {
        let name = match feature.property(name_column) {
            Some(serde_json::Value::String(s)) => s.trim().to_string(),
            _ => continue,
        };

        let geometry = match feature.geometry {
            Some(geom) => {
                let geo_geom: geo::Geometry<f64> = geom
                    .value
                    .try_into()
                    .map_err(|e| load_err(format!("cannot convert geometry of {name}: {e}")))?;

                match geo_geom {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    _ => {
                        tracing::debug!(district = %name, "skipping non-polygon feature");
                        continue;
                    }
                }
            }
            None => continue,
        };

        boundaries.push(Boundary { name, geometry });
    }

    Ok(boundaries)
}
