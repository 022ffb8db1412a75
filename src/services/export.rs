//! Writing a digitized result to a directory.

use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::ExportError;
use crate::models::{AnalysisSummary, ColorInfo, FileMime, PatternData, TileProperties};
use crate::rendering::tile_png;
use crate::services::encoder;

/// Name of the metadata file written next to the outputs
pub const METADATA_FILE: &str = "pattern.json";

/// Paths written by [`write_outputs`]
#[derive(Debug, Default)]
pub struct ExportReport {
    pub files: Vec<PathBuf>,
    pub metadata: PathBuf,
    pub tiled: Option<PathBuf>,
}

/// `pattern.json`: the result without file payloads
#[derive(Debug, Serialize)]
struct Metadata<'a> {
    analysis_summary: &'a AnalysisSummary,
    tile_properties: &'a TileProperties,
    color_palette: &'a [ColorInfo],
    files: Vec<FileEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct FileEntry<'a> {
    filename: String,
    mime_type: &'a str,
    bytes: usize,
}

/// Decode every file into `dir` and write the metadata next to them.
///
/// Filenames are sanitized and de-duplicated. With `tiled`, an `n x n`
/// preview of the first PNG is written as well.
pub async fn write_outputs(
    data: &PatternData,
    dir: &Path,
    tiled: Option<u32>,
) -> Result<ExportReport, ExportError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| write_error(dir, e))?;

    let mut report = ExportReport::default();
    let mut used = HashSet::new();
    let mut entries = Vec::with_capacity(data.files.len());

    for (i, file) in data.files.iter().enumerate() {
        let bytes = encoder::decode(&file.data).map_err(|source| ExportError::Decode {
            filename: file.filename.clone(),
            source,
        })?;

        let name = unique_name(
            &mut used,
            safe_filename(&file.filename, &format!("file-{i}"), file.mime_type),
        );
        let path = dir.join(&name);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| write_error(&path, e))?;
        tracing::debug!(path = %path.display(), size = bytes.len(), "Wrote output file");

        entries.push(FileEntry {
            filename: name,
            mime_type: file.mime_type.as_str(),
            bytes: bytes.len(),
        });
        report.files.push(path);
    }

    if let Some(n) = tiled {
        if let Some(png) = data.png_file() {
            let bytes = encoder::decode(&png.data).map_err(|source| ExportError::Decode {
                filename: png.filename.clone(),
                source,
            })?;
            let grid = tile_png(&bytes, n)?;
            let path = dir.join(unique_name(&mut used, format!("tiled-{n}x{n}.png")));
            tokio::fs::write(&path, grid)
                .await
                .map_err(|e| write_error(&path, e))?;
            report.tiled = Some(path);
        } else {
            tracing::warn!("No PNG in result, skipping tiled preview");
        }
    }

    let metadata = Metadata {
        analysis_summary: &data.analysis_summary,
        tile_properties: &data.tile_properties,
        color_palette: &data.color_palette,
        files: entries,
    };
    let path = dir.join(METADATA_FILE);
    tokio::fs::write(&path, serde_json::to_vec_pretty(&metadata)?)
        .await
        .map_err(|e| write_error(&path, e))?;
    report.metadata = path;

    tracing::info!(dir = %dir.display(), files = report.files.len(), "Exported pattern");
    Ok(report)
}

/// Reduce a producer-supplied filename to a safe single path component.
///
/// Directory parts are dropped, anything outside `[A-Za-z0-9._-]` becomes
/// `_`, and the extension for `mime` is added when missing.
pub fn safe_filename(name: &str, fallback: &str, mime: FileMime) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    let stem = if cleaned.is_empty() { fallback } else { cleaned };
    let ext = mime.extension();
    if stem
        .to_ascii_lowercase()
        .ends_with(&format!(".{ext}"))
    {
        stem.to_string()
    } else {
        format!("{stem}.{ext}")
    }
}

fn unique_name(used: &mut HashSet<String>, name: String) -> String {
    if used.insert(name.clone()) {
        return name;
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem.to_string(), format!(".{ext}")),
        None => (name.clone(), String::new()),
    };
    let mut n = 1;
    loop {
        let candidate = format!("{stem}-{n}{ext}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

fn write_error(path: &Path, source: std::io::Error) -> ExportError {
    ExportError::Write {
        path: path.display().to_string(),
        source,
    }
}
