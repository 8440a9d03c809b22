//! In-memory XLSX and KMZ writers for the filtered site list.

use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use rust_xlsxwriter::{Format, Workbook};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::types::Site;

pub const XLSX_FILE_NAME: &str = "sites_filtrados.xlsx";
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const KMZ_FILE_NAME: &str = "sites_filtrados.kmz";
pub const KMZ_MIME: &str = "application/vnd.google-earth.kmz";

/// Header row of the spreadsheet export. The first three match the upload
/// columns so an export can be uploaded again.
pub const XLSX_HEADERS: [&str; 5] = ["Cod Site", "Latitudine", "Longitudine", "District", "Zone"];

const KML_NS: &str = "http://www.opengis.net/kml/2.2";
const KML_ENTRY: &str = "doc.kml";

fn export_err(context: &str) -> impl Fn(String) -> Error + '_ {
    move |e| Error::Export(format!("{context}: {e}"))
}

/// Writes one row per site, in input order, under [`XLSX_HEADERS`].
pub fn write_xlsx(sites: &[Site]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    let to_err = export_err("xlsx");

    for (col, header) in (0u16..).zip(XLSX_HEADERS) {
        sheet
            .write_string_with_format(0, col, header, &header_format)
            .map_err(|e| to_err(e.to_string()))?;
    }

    for (row, site) in (1u32..).zip(sites) {
        sheet
            .write_string(row, 0, &site.site_code)
            .and_then(|s| s.write_number(row, 1, site.latitude))
            .and_then(|s| s.write_number(row, 2, site.longitude))
            .map_err(|e| to_err(e.to_string()))?;
        if let Some(district) = &site.district_name {
            sheet
                .write_string(row, 3, district)
                .map_err(|e| to_err(e.to_string()))?;
        }
        if let Some(zone) = &site.zone {
            sheet
                .write_string(row, 4, zone)
                .map_err(|e| to_err(e.to_string()))?;
        }
    }

    let bytes = workbook
        .save_to_buffer()
        .map_err(|e| to_err(e.to_string()))?;
    tracing::info!(rows = sites.len(), bytes = bytes.len(), "wrote xlsx export");
    Ok(bytes)
}

fn emit_kml(xml: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    xml.write_event(event)
        .map_err(|e| Error::Export(format!("kml: {e}")))
}

/// Renders the KML document: one `Placemark` per site, coordinates `lon,lat,0`.
pub fn write_kml(sites: &[Site]) -> Result<Vec<u8>> {
    let mut xml = Writer::new_with_indent(Vec::new(), b' ', 2);

    emit_kml(&mut xml, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    emit_kml(
        &mut xml,
        Event::Start(BytesStart::new("kml").with_attributes([("xmlns", KML_NS)])),
    )?;
    emit_kml(&mut xml, Event::Start(BytesStart::new("Document")))?;

    for site in sites {
        let coordinates = format!("{},{},0", site.longitude, site.latitude);
        emit_kml(&mut xml, Event::Start(BytesStart::new("Placemark")))?;
        emit_kml(&mut xml, Event::Start(BytesStart::new("name")))?;
        emit_kml(&mut xml, Event::Text(BytesText::new(&site.site_code)))?;
        emit_kml(&mut xml, Event::End(BytesEnd::new("name")))?;
        emit_kml(&mut xml, Event::Start(BytesStart::new("Point")))?;
        emit_kml(&mut xml, Event::Start(BytesStart::new("coordinates")))?;
        emit_kml(&mut xml, Event::Text(BytesText::new(&coordinates)))?;
        emit_kml(&mut xml, Event::End(BytesEnd::new("coordinates")))?;
        emit_kml(&mut xml, Event::End(BytesEnd::new("Point")))?;
        emit_kml(&mut xml, Event::End(BytesEnd::new("Placemark")))?;
    }

    emit_kml(&mut xml, Event::End(BytesEnd::new("Document")))?;
    emit_kml(&mut xml, Event::End(BytesEnd::new("kml")))?;

    Ok(xml.into_inner())
}

/// Packs the KML document into a KMZ (zip with a single `doc.kml` entry).
pub fn write_kmz(sites: &[Site]) -> Result<Vec<u8>> {
    let kml = write_kml(sites)?;
    let to_err = export_err("kmz");

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(KML_ENTRY, options)
        .map_err(|e| to_err(e.to_string()))?;
    zip.write_all(&kml)?;
    let bytes = zip
        .finish()
        .map_err(|e| to_err(e.to_string()))?
        .into_inner();

    tracing::info!(placemarks = sites.len(), bytes = bytes.len(), "wrote kmz export");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
    use std::io::Read;

    fn joined(code: &str, lat: f64, lon: f64, district: Option<&str>) -> Site {
        Site {
            district_name: district.map(String::from),
            zone: district.map(String::from),
            ..Site::new(code, lat, lon)
        }
    }

    fn read_kml(kmz: Vec<u8>) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(kmz)).unwrap();
        assert_eq!(archive.len(), 1);
        let mut entry = archive.by_name("doc.kml").unwrap();
        let mut kml = String::new();
        entry.read_to_string(&mut kml).unwrap();
        kml
    }

    #[test]
    fn xlsx_rows_follow_input_order() {
        let sites = vec![
            joined("B2", 38.7, -9.1, Some("Lisboa")),
            joined("A1", 41.0, -8.0, None),
        ];
        let bytes = write_xlsx(&sites).unwrap();

        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range_at(0).unwrap().unwrap();
        let rows: Vec<_> = range.rows().collect();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], Data::String("Cod Site".into()));
        assert_eq!(rows[0][4], Data::String("Zone".into()));
        assert_eq!(rows[1][0], Data::String("B2".into()));
        assert_eq!(rows[1][1], Data::Float(38.7));
        assert_eq!(rows[1][3], Data::String("Lisboa".into()));
        assert_eq!(rows[2][0], Data::String("A1".into()));
        assert_eq!(rows[2][3], Data::Empty);
    }

    #[test]
    fn empty_xlsx_has_only_headers() {
        let bytes = write_xlsx(&[]).unwrap();
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range_at(0).unwrap().unwrap();
        assert_eq!(range.rows().count(), 1);
    }

    #[test]
    fn kmz_places_longitude_first() {
        let kml = read_kml(write_kmz(&[joined("COD1", 41.5, -8.25, None)]).unwrap());
        assert!(kml.contains("<name>COD1</name>"));
        assert!(kml.contains("<coordinates>-8.25,41.5,0</coordinates>"));
    }

    #[test]
    fn kmz_keeps_order_and_escapes_names() {
        let sites = vec![joined("Z&1", 1.0, 2.0, None), joined("A<2", 3.0, 4.0, None)];
        let kml = read_kml(write_kmz(&sites).unwrap());
        let first = kml.find("Z&amp;1").unwrap();
        let second = kml.find("A&lt;2").unwrap();
        assert!(first < second);
    }

    #[test]
    fn empty_kmz_is_a_valid_document() {
        let kml = read_kml(write_kmz(&[]).unwrap());
        assert!(kml.contains("<Document"));
        assert!(kml.contains("</kml>"));
        assert!(!kml.contains("Placemark"));
    }
}
