pub mod config;
pub mod pattern;

pub use config::{AppConfig, GeminiConfig, SessionConfig, UploadConfig};
pub use pattern::{
    AnalysisSummary, ColorInfo, FileMime, FileOutput, PatternData, RepeatType, TileProperties,
    ValidationError,
};
