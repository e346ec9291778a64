use crate::catalog::MetadataRow;
use crate::panel::{Panel, PanelRow};
use crate::statics;
use crate::value::CellValue;
use anyhow::{Context, anyhow, bail};
use flate2::read::GzDecoder;
use indexmap::IndexMap;
use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    GzipCsv,
    Json5,
    GzipJson5,
}

impl SourceFormat {
    pub fn is_compressed(self) -> bool {
        matches!(self, SourceFormat::GzipCsv | SourceFormat::GzipJson5)
    }

    pub fn is_json5(self) -> bool {
        matches!(self, SourceFormat::Json5 | SourceFormat::GzipJson5)
    }
}

/// One failed candidate in a strategy list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no {kind} sources configured")]
    NoSources { kind: &'static str },
    #[error("no {kind} source could be loaded: {}", describe_attempts(.attempts))]
    Exhausted {
        kind: &'static str,
        attempts: Vec<Attempt>,
    },
}

fn describe_attempts(attempts: &[Attempt]) -> String {
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.path.display(), a.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// A panel file and what it took to read it.
#[derive(Debug, Clone)]
pub struct LoadedPanel {
    pub path: PathBuf,
    pub format: SourceFormat,
    pub panel: Panel,
    /// Rows dropped for a missing country, a non-integer year or a malformed record.
    pub skipped_rows: usize,
}

#[derive(Debug, Clone)]
pub struct LoadedMetadata {
    pub path: PathBuf,
    pub format: SourceFormat,
    pub rows: Vec<MetadataRow>,
}

/// Try each source in order and return the first that loads.
///
/// Every failure is logged; the error lists all attempts only once the list is exhausted.
pub fn load_first<T, F>(
    kind: &'static str,
    sources: &[PathBuf],
    mut load: F,
) -> Result<T, LoadError>
where
    F: FnMut(&Path) -> anyhow::Result<T>,
{
    if sources.is_empty() {
        return Err(LoadError::NoSources { kind });
    }
    let mut attempts = Vec::new();
    for path in sources {
        match load(path) {
            Ok(value) => {
                if !attempts.is_empty() {
                    info!(
                        "loaded {kind} from {} after {} failed source(s)",
                        path.display(),
                        attempts.len()
                    );
                }
                return Ok(value);
            }
            Err(e) => {
                warn!("{kind} source {} failed: {e:#}", path.display());
                attempts.push(Attempt {
                    path: path.clone(),
                    error: format!("{e:#}"),
                });
            }
        }
    }
    Err(LoadError::Exhausted { kind, attempts })
}

pub fn load_panel_first(sources: &[PathBuf]) -> Result<LoadedPanel, LoadError> {
    load_first("panel", sources, load_panel)
}

pub fn load_metadata_first(sources: &[PathBuf]) -> Result<LoadedMetadata, LoadError> {
    load_first("metadata", sources, load_metadata)
}

pub fn load_panel(path: &Path) -> anyhow::Result<LoadedPanel> {
    let (format, bytes) = read_source(path)?;
    let (rows, skipped_rows) = if format.is_json5() {
        panel_rows_from_json5(&bytes)?
    } else {
        panel_rows_from_csv(&bytes)?
    };
    if skipped_rows > 0 {
        warn!("{}: skipped {skipped_rows} panel row(s)", path.display());
    }
    let panel = Panel::from_rows(rows);
    info!(
        "loaded panel {} ({} rows, {} columns, {format:?})",
        path.display(),
        panel.row_count(),
        panel.column_names().len()
    );
    Ok(LoadedPanel {
        path: path.to_path_buf(),
        format,
        panel,
        skipped_rows,
    })
}

pub fn load_metadata(path: &Path) -> anyhow::Result<LoadedMetadata> {
    let (format, bytes) = read_source(path)?;
    let rows = if format.is_json5() {
        let text = std::str::from_utf8(&bytes).context("metadata file is not valid UTF-8")?;
        json5::from_str::<Vec<MetadataRow>>(text).context("parsing JSON5 metadata")?
    } else {
        metadata_rows_from_csv(&bytes)?
    };
    info!("loaded {} metadata rows from {}", rows.len(), path.display());
    Ok(LoadedMetadata {
        path: path.to_path_buf(),
        format,
        rows,
    })
}

fn read_source(path: &Path) -> anyhow::Result<(SourceFormat, Vec<u8>)> {
    let bytes = fs::read(path).with_context(|| format!("reading {path:?}"))?;
    let format = detect_format(path, &bytes);
    debug!("{} detected as {format:?}", path.display());
    if !format.is_compressed() {
        return Ok((format, bytes));
    }
    let mut decoder = GzDecoder::new(&bytes[..]);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).context("gzip decompress")?;
    Ok((format, out))
}

pub fn detect_format(path: &Path, bytes: &[u8]) -> SourceFormat {
    let extension = |p: &Path| {
        p.extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    };
    // Gzip magic: 1F 8B
    let gz_ext = extension(path).as_deref() == Some("gz");
    let compressed = gz_ext || (bytes.len() >= 2 && bytes[0] == 0x1F && bytes[1] == 0x8B);
    let inner = if gz_ext {
        path.file_stem().map(Path::new).and_then(extension)
    } else {
        extension(path)
    };
    let json5 = matches!(inner.as_deref(), Some("json" | "json5"));
    match (compressed, json5) {
        (false, false) => SourceFormat::Csv,
        (true, false) => SourceFormat::GzipCsv,
        (false, true) => SourceFormat::Json5,
        (true, true) => SourceFormat::GzipJson5,
    }
}

fn csv_reader(bytes: &[u8]) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(bytes)
}

fn panel_rows_from_csv(bytes: &[u8]) -> anyhow::Result<(Vec<PanelRow>, usize)> {
    let mut rdr = csv_reader(bytes);
    let headers = rdr.headers().context("reading panel header")?.clone();
    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}') == name)
    };
    let country_at = position(statics::COL_COUNTRY)
        .ok_or_else(|| anyhow!("panel has no `{}` column", statics::COL_COUNTRY))?;
    let year_at = position(statics::COL_YEAR)
        .ok_or_else(|| anyhow!("panel has no `{}` column", statics::COL_YEAR))?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for (line, record) in rdr.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                debug!("panel record {}: {e}", line + 2);
                skipped += 1;
                continue;
            }
        };
        let country = record.get(country_at).unwrap_or_default().trim();
        let year = record
            .get(year_at)
            .and_then(parse_year)
            .filter(|_| !country.is_empty());
        let Some(year) = year else {
            skipped += 1;
            continue;
        };

        let values: IndexMap<String, CellValue> = headers
            .iter()
            .zip(record.iter())
            .enumerate()
            .filter(|(i, _)| *i != country_at && *i != year_at)
            .map(|(_, (name, raw))| (name.to_string(), CellValue::parse(raw)))
            .collect();
        rows.push(PanelRow {
            country: country.to_string(),
            year,
            values,
        });
    }
    Ok((rows, skipped))
}

fn panel_rows_from_json5(bytes: &[u8]) -> anyhow::Result<(Vec<PanelRow>, usize)> {
    let text = std::str::from_utf8(bytes).context("panel file is not valid UTF-8")?;
    let objects: Vec<IndexMap<String, CellValue>> =
        json5::from_str(text).context("parsing JSON5 panel")?;

    let mut rows = Vec::with_capacity(objects.len());
    let mut skipped = 0usize;
    for mut values in objects {
        let country = values
            .shift_remove(statics::COL_COUNTRY)
            .and_then(|c| c.as_str().map(|s| s.trim().to_string()))
            .filter(|s| !s.is_empty());
        let year = values
            .shift_remove(statics::COL_YEAR)
            .and_then(|y| y.as_f64())
            .and_then(year_from_f64);
        let (Some(country), Some(year)) = (country, year) else {
            skipped += 1;
            continue;
        };
        rows.push(PanelRow {
            country,
            year,
            values,
        });
    }
    Ok((rows, skipped))
}

fn metadata_rows_from_csv(bytes: &[u8]) -> anyhow::Result<Vec<MetadataRow>> {
    let mut rdr = csv_reader(bytes);
    let headers = rdr.headers().context("reading metadata header")?;
    if !headers.iter().any(|h| h.trim_start_matches('\u{feff}') == "id") {
        bail!("metadata has no `id` column");
    }

    let mut rows = Vec::new();
    for (line, row) in rdr.deserialize::<MetadataRow>().enumerate() {
        match row {
            Ok(row) => rows.push(row),
            Err(e) => warn!("metadata record {}: {e}", line + 2),
        }
    }
    Ok(rows)
}

fn parse_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    raw.parse::<i32>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().and_then(year_from_f64))
}

fn year_from_f64(v: f64) -> Option<i32> {
    (v.is_finite() && v.fract() == 0.0 && v.abs() <= f64::from(i32::MAX)).then_some(v as i32)
}
