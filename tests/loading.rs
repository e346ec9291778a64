use pretty_assertions::assert_eq;

use demex::load::{self, LoadError};
use demex::{CellValue, SourceFormat};
use std::io::Write;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

const PANEL_CSV: &str = "\
country_name,year,v2x_libdem,v2x_libdem_sd,e_regiongeo
Brazil,2000,0.62,0.03,South America
Brazil,2001,NA,0.03,South America
Chile,2000,0.71,,South America
,2000,0.10,0.01,Nowhere
";

#[test]
fn csv_panel_loads_typed_cells() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("vdem.csv");
    std::fs::write(&path, PANEL_CSV)?;

    let loaded = load::load_panel(&path)?;
    assert_eq!(loaded.format, SourceFormat::Csv);
    assert_eq!(loaded.skipped_rows, 1);

    let panel = &loaded.panel;
    assert_eq!(panel.row_count(), 3);
    assert_eq!(panel.available_countries(), vec!["Brazil", "Chile"]);
    assert_eq!(panel.year_bounds(), Some((2000, 2001)));
    assert!(panel.is_numeric("v2x_libdem"));
    assert!(!panel.is_numeric("e_regiongeo"));
    assert_eq!(panel.numeric_candidates(&["_sd"]), vec!["v2x_libdem"]);

    let points = panel.series("v2x_libdem", &["Brazil".to_string()], (2000, 2001));
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].value, 0.62);
    Ok(())
}

#[test]
fn gzip_panel_is_detected_by_extension_or_magic() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let gz = {
        use flate2::{Compression, GzBuilder};
        let mut encoder = GzBuilder::new()
            .mtime(0)
            .write(Vec::new(), Compression::default());
        encoder.write_all(PANEL_CSV.as_bytes())?;
        encoder.finish()?
    };

    let named = dir.path().join("vdem.csv.gz");
    std::fs::write(&named, &gz)?;
    let loaded = load::load_panel(&named)?;
    assert_eq!(loaded.format, SourceFormat::GzipCsv);
    assert_eq!(loaded.panel.row_count(), 3);

    // Compressed content behind a plain name still decodes.
    let disguised = dir.path().join("vdem.csv");
    std::fs::write(&disguised, &gz)?;
    let loaded = load::load_panel(&disguised)?;
    assert_eq!(loaded.format, SourceFormat::GzipCsv);
    assert_eq!(loaded.panel.available_countries(), vec!["Brazil", "Chile"]);
    Ok(())
}

#[test]
fn json5_panel_rows() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("panel.json5");
    std::fs::write(
        &path,
        r#"[
  // trailing commas and comments are fine
  { country_name: 'Uruguay', year: 1985, v2x_polyarchy: 0.7, note: 'transition', },
  { country_name: 'Uruguay', year: 1986, v2x_polyarchy: null },
  { year: 1986, v2x_polyarchy: 0.1 },
]"#,
    )?;

    let loaded = load::load_panel(&path)?;
    assert_eq!(loaded.format, SourceFormat::Json5);
    assert_eq!(loaded.skipped_rows, 1);
    assert_eq!(loaded.panel.row_count(), 2);
    assert!(loaded.panel.is_numeric("v2x_polyarchy"));
    assert!(!loaded.panel.is_numeric("note"));
    Ok(())
}

#[test]
fn metadata_from_csv_and_json5() -> Result<()> {
    let dir = tempfile::tempdir()?;

    let csv_path = dir.path().join("indicadores.csv");
    std::fs::write(
        &csv_path,
        "id,variavel,titulo,Grupo,Elemento\n\
         2,,Indices,,\n\
         2.1,,High-Level,,\n\
         2.1.1,v2x_libdem,Liberal Democracy Index,,x\n\
         3.1.4,,Sub-group heading,x,\n",
    )?;
    let csv = load::load_metadata(&csv_path)?;
    assert_eq!(csv.format, SourceFormat::Csv);
    assert_eq!(csv.rows.len(), 4);
    assert_eq!(csv.rows[0].variavel, None);
    assert_eq!(csv.rows[2].variavel.as_deref(), Some("v2x_libdem"));
    assert!(csv.rows[3].hint().group);
    assert!(csv.rows[2].hint().element);

    let json_path = dir.path().join("indicadores.json5");
    std::fs::write(
        &json_path,
        r#"[
  { id: '2.1.1', variavel: 'v2x_libdem', titulo: 'Liberal Democracy Index' },
  { id: '2.1', titulo: 'High-Level' },
]"#,
    )?;
    let json = load::load_metadata(&json_path)?;
    assert_eq!(json.format, SourceFormat::Json5);
    assert_eq!(json.rows.len(), 2);
    assert_eq!(json.rows[1].variavel, None);
    Ok(())
}

#[test]
fn strategy_list_falls_through_to_a_working_source() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("vdem_all.parquet.csv");
    let broken = dir.path().join("broken.csv");
    std::fs::write(&broken, "country,yr\nBrazil,2000\n")?;
    let good = dir.path().join("vdem.csv");
    std::fs::write(&good, PANEL_CSV)?;

    let loaded = load::load_panel_first(&[missing.clone(), broken.clone(), good.clone()])?;
    assert_eq!(loaded.path, good);

    let err = load::load_panel_first(&[missing, broken]).unwrap_err();
    match err {
        LoadError::Exhausted { kind, attempts } => {
            assert_eq!(kind, "panel");
            assert_eq!(attempts.len(), 2);
            assert!(attempts[1].error.contains("country_name"));
        }
        other => return Err(format!("unexpected error: {other}").into()),
    }
    Ok(())
}

#[test]
fn na_markers_are_null() {
    for raw in ["", "NA", "nan", "NaN", "null", " None "] {
        assert_eq!(CellValue::parse(raw), CellValue::Null, "{raw:?}");
    }
}
