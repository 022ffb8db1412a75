//! Presentation model for a digitized pattern.
//!
//! Built from a borrowed [`PatternData`]; switching between single and
//! tiled preview only changes how the tile is shown.

use serde::Serialize;

use crate::models::{FileMime, FileOutput, PatternData};
use crate::services::session::ViewMode;
use crate::ui_text;

/// Scale of one tile within the tiled preview (three tiles per row)
pub const TILED_BACKGROUND_SIZE: &str = "33.3333%";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TilePreview {
    Single { src: String },
    Tiled { src: String, background_size: &'static str },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadAction {
    /// Position in the result's file list
    pub index: usize,
    pub filename: String,
    pub mime_type: &'static str,
    pub label: &'static str,
    /// `data:` URL of the payload
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwatchView {
    pub name: String,
    pub hex: String,
    pub cmyk: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub pattern_name: String,
    pub description: String,
    pub fidelity_notes: String,
    pub repeat_type: String,
    pub tile_size: String,
    pub print_size: String,
    pub resolution: String,
    pub view: ViewMode,
    /// Absent when the result carries no PNG
    pub preview: Option<TilePreview>,
    pub png_download: Option<DownloadAction>,
    pub svg_download: Option<DownloadAction>,
    pub palette: Vec<SwatchView>,
}

impl ResultView {
    pub fn build(data: &PatternData, view: ViewMode) -> Self {
        let summary = &data.analysis_summary;
        let tile = &data.tile_properties;

        let png = find_indexed(data, FileMime::Png);
        let svg = find_indexed(data, FileMime::Svg);

        Self {
            pattern_name: summary.pattern_name.clone(),
            description: summary.description.clone(),
            fidelity_notes: summary.fidelity_notes.clone(),
            repeat_type: summary.repeat_type.to_string(),
            tile_size: format!("{} x {} px", tile.width_px, tile.height_px),
            print_size: format!("{:.1} x {:.1} cm", tile.width_cm, tile.height_cm),
            resolution: format!("{} DPI", tile.dpi),
            view,
            preview: png.map(|(_, file)| tile_preview(file, view)),
            png_download: png.map(|(i, file)| download(i, file, ui_text::DOWNLOAD_PNG)),
            svg_download: svg.map(|(i, file)| download(i, file, ui_text::DOWNLOAD_SVG)),
            palette: data
                .color_palette
                .iter()
                .map(|c| SwatchView {
                    name: c.name.clone(),
                    hex: c.hex.clone(),
                    cmyk: c.cmyk_approx.clone(),
                })
                .collect(),
        }
    }
}

fn find_indexed(data: &PatternData, mime: FileMime) -> Option<(usize, &FileOutput)> {
    data.files.iter().enumerate().find(|(_, f)| f.mime_type == mime)
}

fn tile_preview(file: &FileOutput, view: ViewMode) -> TilePreview {
    let src = file.data_url();
    match view {
        ViewMode::Single => TilePreview::Single { src },
        ViewMode::Tiled => TilePreview::Tiled {
            src,
            background_size: TILED_BACKGROUND_SIZE,
        },
    }
}

fn download(index: usize, file: &FileOutput, label: &'static str) -> DownloadAction {
    DownloadAction {
        index,
        filename: file.filename.clone(),
        mime_type: file.mime_type.as_str(),
        label,
        href: file.data_url(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pattern::tests::sample_pattern;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_png_only_offers_png_download() {
        let view = ResultView::build(&sample_pattern(), ViewMode::Single);

        let png = view.png_download.unwrap();
        assert_eq!(png.filename, "tile.png");
        assert_eq!(png.label, "Tải Xuống PNG");
        assert_eq!(png.href, "data:image/png;base64,iVBORw0KGgo=");
        assert!(view.svg_download.is_none());
    }

    #[test]
    fn test_svg_download_uses_its_own_index() {
        let mut data = sample_pattern();
        data.files.insert(
            0,
            FileOutput {
                filename: "tile.svg".to_string(),
                mime_type: FileMime::Svg,
                data: "PHN2Zy8+".to_string(),
            },
        );

        let view = ResultView::build(&data, ViewMode::Single);
        assert_eq!(view.svg_download.unwrap().index, 0);
        assert_eq!(view.png_download.unwrap().index, 1);
    }

    #[test]
    fn test_metadata_lines() {
        let mut data = sample_pattern();
        data.tile_properties.width_cm = 10.2;
        data.tile_properties.height_cm = 10.2;

        let view = ResultView::build(&data, ViewMode::Single);
        assert_eq!(view.tile_size, "1200 x 1200 px");
        assert_eq!(view.print_size, "10.2 x 10.2 cm");
        assert_eq!(view.resolution, "300 DPI");
        assert_eq!(view.repeat_type, "straight");
    }

    #[test]
    fn test_fractional_pixels_are_shown_as_given() {
        let mut data = sample_pattern();
        data.tile_properties.width_px = 1200.5;
        let view = ResultView::build(&data, ViewMode::Single);
        assert_eq!(view.tile_size, "1200.5 x 1200 px");
    }

    #[test]
    fn test_palette() {
        let view = ResultView::build(&sample_pattern(), ViewMode::Single);
        assert_eq!(
            view.palette,
            vec![SwatchView {
                name: "Navy".to_string(),
                hex: "#1B2A4A".to_string(),
                cmyk: "C91 M79 Y0 K0".to_string(),
            }]
        );
    }

    #[test]
    fn test_tiled_toggle_round_trip() {
        let data = sample_pattern();
        let original = data.clone();

        let single = ResultView::build(&data, ViewMode::Single);
        let tiled = ResultView::build(&data, ViewMode::Tiled);
        let back = ResultView::build(&data, ViewMode::Single);

        assert_eq!(
            tiled.preview,
            Some(TilePreview::Tiled {
                src: "data:image/png;base64,iVBORw0KGgo=".to_string(),
                background_size: TILED_BACKGROUND_SIZE,
            })
        );
        assert_eq!(single, back);
        assert_eq!(data, original);
    }

    #[test]
    fn test_no_png_no_preview() {
        let mut data = sample_pattern();
        data.files[0].mime_type = FileMime::Svg;

        let view = ResultView::build(&data, ViewMode::Tiled);
        assert!(view.preview.is_none());
        assert!(view.png_download.is_none());
        assert!(view.svg_download.is_some());
    }
}
