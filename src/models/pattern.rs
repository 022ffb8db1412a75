//! Structured result returned by the digitizing model.
//!
//! The shape mirrors the response schema sent with every request
//! (see [`crate::services::prompt::response_schema`]). Deserialization
//! enforces field presence and enum membership; [`PatternData::validate`]
//! covers the checks serde cannot express.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use utoipa::ToSchema;

use crate::error::EncodeError;
use crate::services::encoder;

/// Root of a digitized pattern result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PatternData {
    pub analysis_summary: AnalysisSummary,
    pub tile_properties: TileProperties,
    /// Primary colors, in the order the model listed them
    pub color_palette: Vec<ColorInfo>,
    /// Output files (PNG tile, optional SVG)
    pub files: Vec<FileOutput>,
}

/// Producer-supplied description of the pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalysisSummary {
    pub pattern_name: String,
    pub description: String,
    pub repeat_type: RepeatType,
    pub fidelity_notes: String,
}

/// How copies of the tile line up when repeated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RepeatType {
    Straight,
    HalfDrop,
    HalfBrick,
    Mirror,
    Other,
}

impl RepeatType {
    pub const ALL: [RepeatType; 5] = [
        RepeatType::Straight,
        RepeatType::HalfDrop,
        RepeatType::HalfBrick,
        RepeatType::Mirror,
        RepeatType::Other,
    ];

    /// Wire name, as used in the response schema enum
    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatType::Straight => "straight",
            RepeatType::HalfDrop => "half-drop",
            RepeatType::HalfBrick => "half-brick",
            RepeatType::Mirror => "mirror",
            RepeatType::Other => "other",
        }
    }
}

impl fmt::Display for RepeatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared tile geometry. Not independently verified against the files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TileProperties {
    pub dpi: f64,
    pub width_px: f64,
    pub height_px: f64,
    pub width_cm: f64,
    pub height_cm: f64,
}

impl TileProperties {
    fn fields(&self) -> [(&'static str, f64); 5] {
        [
            ("dpi", self.dpi),
            ("width_px", self.width_px),
            ("height_px", self.height_px),
            ("width_cm", self.width_cm),
            ("height_cm", self.height_cm),
        ]
    }
}

/// One palette entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ColorInfo {
    /// Display label
    pub name: String,
    /// `#RRGGBB`
    pub hex: String,
    /// Free-form CMYK approximation for print, e.g. `C91 M79 Y0 K0`
    pub cmyk_approx: String,
}

impl ColorInfo {
    /// Whether `hex` is a well-formed `#RRGGBB` code
    pub fn has_valid_hex(&self) -> bool {
        static HEX: OnceLock<Regex> = OnceLock::new();
        HEX.get_or_init(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("static regex"))
            .is_match(&self.hex)
    }
}

/// MIME types the model may return files in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum FileMime {
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/svg+xml")]
    Svg,
}

impl FileMime {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileMime::Png => "image/png",
            FileMime::Svg => "image/svg+xml",
        }
    }

    /// File extension used when a filename has to be synthesized
    pub fn extension(&self) -> &'static str {
        match self {
            FileMime::Png => "png",
            FileMime::Svg => "svg",
        }
    }
}

impl fmt::Display for FileMime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One downloadable output file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FileOutput {
    pub filename: String,
    pub mime_type: FileMime,
    /// Base64-encoded file content
    pub data: String,
}

impl FileOutput {
    /// `data:` URL carrying the embedded payload
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Decode the embedded payload
    pub fn decode(&self) -> Result<Vec<u8>, EncodeError> {
        encoder::decode(&self.data)
    }
}

/// Issues found while validating a parsed response
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationError {
    pub issues: Vec<String>,
}

impl ValidationError {
    pub fn single(issue: impl Into<String>) -> Self {
        Self {
            issues: vec![issue.into()],
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.issues.join("; "))
    }
}

impl std::error::Error for ValidationError {}

impl PatternData {
    /// First PNG file, if any
    pub fn png_file(&self) -> Option<&FileOutput> {
        self.find_file(FileMime::Png)
    }

    /// First SVG file, if any
    pub fn svg_file(&self) -> Option<&FileOutput> {
        self.find_file(FileMime::Svg)
    }

    /// First file with the given MIME type
    pub fn find_file(&self, mime: FileMime) -> Option<&FileOutput> {
        self.files.iter().find(|f| f.mime_type == mime)
    }

    /// Rewrite every file payload as padded standard base64.
    ///
    /// Payloads that do not decode are left untouched; [`Self::validate`]
    /// reports them.
    pub fn normalize_payloads(&mut self) {
        for file in &mut self.files {
            if let Ok(data) = encoder::canonicalize(&file.data) {
                file.data = data;
            }
        }
    }

    /// Check numeric ranges and file payloads.
    ///
    /// Empty `files` is not reported here; callers treat it as its own
    /// failure kind before calling this.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        for (name, value) in self.tile_properties.fields() {
            if !value.is_finite() || value <= 0.0 {
                issues.push(format!("tile_properties.{name} must be positive, got {value}"));
            }
        }

        for (i, file) in self.files.iter().enumerate() {
            if file.filename.trim().is_empty() {
                issues.push(format!("files[{i}].filename is empty"));
            }
            if file.data.trim().is_empty() {
                issues.push(format!("files[{i}].data is empty"));
            } else if file.decode().is_err() {
                issues.push(format!("files[{i}].data is not valid base64"));
            }
        }

        for color in &self.color_palette {
            if !color.has_valid_hex() {
                tracing::warn!(name = %color.name, hex = %color.hex, "Palette entry has malformed hex code");
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}
