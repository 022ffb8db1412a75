pub mod digitizer;
pub mod encoder;
pub mod export;
pub mod preview_store;
pub mod prompt;
pub mod result_view;
pub mod session;
pub mod session_manager;
pub mod template_service;

pub use digitizer::{GeminiClient, PatternDigitizer};
pub use encoder::{EncodedImage, ImageMime, SourceImage};
pub use export::{write_outputs, ExportReport};
pub use preview_store::{PreviewEntry, PreviewHandle, PreviewStore};
pub use result_view::ResultView;
pub use session::{Session, SessionId, SessionSnapshot, SessionState, ViewMode};
pub use session_manager::SessionManager;
pub use template_service::{PageContext, TemplateError, TemplateService};
