use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::assets::AssetLoader;
use crate::services::encoder::ImageMime;
use crate::services::result_view::ResultView;
use crate::services::session::{Session, SessionState};
use crate::ui_text;

/// Seconds between page reloads while a request is in flight
pub const PROCESSING_REFRESH_SECS: u32 = 3;

/// Main page template
pub const PAGE_TEMPLATE: &str = "index.html";

/// Error type for template rendering
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Template error: {0}")]
    Tera(#[from] tera::Error),

    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Failed to read template: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything the page template needs for one render
#[derive(Debug, Serialize)]
pub struct PageContext {
    pub session_id: String,
    pub state: SessionState,
    pub preview_url: Option<String>,
    pub image_name: Option<String>,
    pub image_size: Option<usize>,
    pub processing: bool,
    pub can_digitize: bool,
    pub error: Option<String>,
    pub loading_message: Option<&'static str>,
    pub refresh_secs: Option<u32>,
    pub result: Option<ResultView>,
    pub single_url: String,
    pub tiled_url: String,
    pub accept: &'static str,
}

impl PageContext {
    /// Build the page for a session as of `now`
    pub fn from_session(session: &Session, now: DateTime<Utc>) -> Self {
        let id = session.id().as_str();
        let processing = session.is_processing();
        let selection = session.selection();

        let loading_message = session
            .processing_since()
            .filter(|_| processing)
            .map(|since| ui_text::loading_message((now - since).num_seconds()));

        Self {
            session_id: id.to_string(),
            state: session.state(),
            // The preview id busts caches when the selection changes
            preview_url: selection.map(|s| format!("/s/{id}/preview?v={}", s.preview.id())),
            image_name: selection.and_then(|s| s.image.filename.clone()),
            image_size: selection.map(|s| s.image.bytes.len()),
            processing,
            can_digitize: selection.is_some() && !processing,
            error: session.error().map(str::to_string),
            loading_message,
            refresh_secs: processing.then_some(PROCESSING_REFRESH_SECS),
            result: session
                .result()
                .map(|data| ResultView::build(data, session.view())),
            single_url: format!("/s/{id}?view=single"),
            tiled_url: format!("/s/{id}?view=tiled"),
            accept: ImageMime::ACCEPT,
        }
    }
}

/// Service for rendering HTML pages with Tera
pub struct TemplateService {
    loader: AssetLoader,
}

impl TemplateService {
    /// Create a new template service, compiling every template once to fail early
    pub fn new(loader: AssetLoader) -> Result<Self, TemplateError> {
        let service = Self { loader };
        let tera = service.build()?;
        tracing::info!(
            templates = tera.get_template_names().count(),
            "Template service initialized"
        );
        Ok(service)
    }

    /// Register custom Tera filters
    fn register_filters(tera: &mut Tera) {
        // Human-readable byte count
        tera.register_filter(
            "filesize",
            |value: &tera::Value, _args: &HashMap<String, tera::Value>| {
                let bytes = tera::try_get_value!("filesize", "value", u64, value);
                Ok(tera::Value::String(format_size(bytes)))
            },
        );
    }

    /// Templates are loaded fresh on every render so edits in
    /// `TEMPLATES_DIR` show up without a restart
    fn build(&self) -> Result<Tera, TemplateError> {
        let mut sources = Vec::new();
        for name in self.loader.list_templates() {
            let content = self.loader.read_template(&name)?;
            sources.push((name, content));
        }
        if !sources.iter().any(|(name, _)| name == PAGE_TEMPLATE) {
            return Err(TemplateError::NotFound(PAGE_TEMPLATE.to_string()));
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(sources)?;
        Self::register_filters(&mut tera);
        Ok(tera)
    }

    /// Render a template with the given data
    pub fn render<T: Serialize>(&self, template: &str, data: &T) -> Result<String, TemplateError> {
        let tera = self.build()?;
        if !tera.get_template_names().any(|n| n == template) {
            return Err(TemplateError::NotFound(template.to_string()));
        }

        let mut context = Context::from_serialize(data)?;
        context.insert("t", &ui_strings());
        Ok(tera.render(template, &context)?)
    }

    /// Render the main page
    pub fn render_page(&self, page: &PageContext) -> Result<String, TemplateError> {
        self.render(PAGE_TEMPLATE, page)
    }
}

fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}

/// Interface strings exposed to templates as `t`
fn ui_strings() -> serde_json::Value {
    json!({
        "app_title": ui_text::APP_TITLE,
        "app_tagline": ui_text::APP_TAGLINE,
        "footer": ui_text::FOOTER,
        "upload_prompt": ui_text::UPLOAD_PROMPT,
        "upload_prompt_suffix": ui_text::UPLOAD_PROMPT_SUFFIX,
        "upload_formats": ui_text::UPLOAD_FORMATS,
        "upload_button": ui_text::UPLOAD_BUTTON,
        "preview_alt": ui_text::PREVIEW_ALT,
        "processing": ui_text::PROCESSING,
        "digitize_button": ui_text::DIGITIZE_BUTTON,
        "error_marker": ui_text::ERROR_MARKER,
        "loading_title": ui_text::LOADING_TITLE,
        "preview_heading": ui_text::PREVIEW_HEADING,
        "view_single": ui_text::VIEW_SINGLE,
        "view_tiled": ui_text::VIEW_TILED,
        "tiled_aria": ui_text::TILED_ARIA,
        "tile_alt": ui_text::TILE_ALT,
        "summary_heading": ui_text::SUMMARY_HEADING,
        "fidelity_notes": ui_text::FIDELITY_NOTES,
        "repeat_type": ui_text::REPEAT_TYPE,
        "tile_size": ui_text::TILE_SIZE,
        "print_size": ui_text::PRINT_SIZE,
        "resolution": ui_text::RESOLUTION,
        "palette_heading": ui_text::PALETTE_HEADING,
    })
}
