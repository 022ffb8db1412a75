//! User-facing strings. The interface is Vietnamese throughout.

pub const APP_TITLE: &str = "In Vải Hoàng Linh AI";
pub const APP_TAGLINE: &str = "Tải lên ảnh chụp quần áo và xem AI trích xuất, làm phẳng và tái tạo một mẫu hoạ tiết lặp liền mạch, sẵn sàng để in.";
pub const FOOTER: &str = "Phát triển bằng Gemini API. Dành cho chuyên gia dệt may và người yêu thích sáng tạo.";

pub const UPLOAD_PROMPT: &str = "Nhấn để tải lên";
pub const UPLOAD_PROMPT_SUFFIX: &str = "hoặc kéo và thả";
pub const UPLOAD_FORMATS: &str = "PNG, JPG, hoặc WEBP";
pub const UPLOAD_BUTTON: &str = "Chọn Ảnh";
pub const PREVIEW_ALT: &str = "Xem trước ảnh đã chọn";
pub const PROCESSING: &str = "Đang xử lý...";
pub const DIGITIZE_BUTTON: &str = "Số Hóa Họa Tiết";

/// Banner marker shown before every error message
pub const ERROR_MARKER: &str = "Lỗi:";
pub const NO_IMAGE_SELECTED: &str = "Vui lòng chọn một ảnh trước.";
pub const UNSUPPORTED_IMAGE: &str = "Định dạng ảnh không được hỗ trợ. Vui lòng chọn PNG, JPG hoặc WEBP.";
pub const INVALID_UPLOAD: &str = "Không thể đọc tệp đã tải lên.";
pub const UNKNOWN_ERROR: &str = "Đã xảy ra một lỗi không xác định.";

pub const LOADING_TITLE: &str = "Đang Số Hóa Họa Tiết Của Bạn";
pub const LOADING_MESSAGES: [&str; 7] = [
    "Đang phân tích vải và phối cảnh...",
    "Đang điều chỉnh nếp nhăn và độ rủ...",
    "Đang truy vết các họa tiết...",
    "Đang xác định kiểu lặp lại...",
    "Đang tạo mẫu lặp liền mạch...",
    "Đang trích xuất bảng màu...",
    "Đang hoàn tất các tệp đầu ra...",
];

pub const PREVIEW_HEADING: &str = "Xem Trước";
pub const VIEW_SINGLE: &str = "Một Mẫu";
pub const VIEW_TILED: &str = "Lặp Lại";
pub const TILED_ARIA: &str = "Xem trước họa tiết lặp lại";
pub const TILE_ALT: &str = "Họa tiết liền mạch đã tạo";
pub const DOWNLOAD_PNG: &str = "Tải Xuống PNG";
pub const DOWNLOAD_SVG: &str = "Tải Xuống SVG";

pub const SUMMARY_HEADING: &str = "Tóm Tắt Phân Tích";
pub const FIDELITY_NOTES: &str = "Ghi Chú Độ Chính Xác:";
pub const REPEAT_TYPE: &str = "Kiểu Lặp Lại";
pub const TILE_SIZE: &str = "Kích Thước Mẫu";
pub const PRINT_SIZE: &str = "Kích Thước In (Ước tính)";
pub const RESOLUTION: &str = "Độ Phân Giải";
pub const PALETTE_HEADING: &str = "Bảng Màu";

/// Inline error text for a failed attempt
pub fn error_message(detail: &str) -> String {
    format!("Đã xảy ra lỗi: {detail}")
}

/// Loading message for the given number of seconds spent processing.
/// Messages advance every 2.5 seconds and wrap around.
pub fn loading_message(elapsed_secs: i64) -> &'static str {
    let step = (elapsed_secs.max(0) * 2 / 5) as usize;
    LOADING_MESSAGES[step % LOADING_MESSAGES.len()]
}
