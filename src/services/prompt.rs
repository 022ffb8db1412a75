//! Fixed instruction and output schema sent with every digitize request.
//!
//! The schema uses the Gemini OpenAPI subset (upper-case type names).
//! Field descriptions are Vietnamese so the model answers with Vietnamese
//! display labels.

use serde_json::{json, Value};

use crate::models::{FileMime, RepeatType};

/// System instruction describing the digitizing procedure
pub const SYSTEM_INSTRUCTION: &str = r#"You are an expert pattern digitizer for the fashion and textile industry. You receive a photo of a garment or fabric and must produce a seamless, print-ready pattern tile.

Follow these steps in order:
1. Isolate the pattern: find the main region of patterned fabric in the photo.
2. Correct distortion: remove perspective (keystone) distortion, wrinkles and fabric drape to obtain a flat 2D pattern. Lines that form a grid must end up exactly horizontal or vertical.
3. Enhance quality: remove noise and compression artifacts from the flattened image and sharpen motif edges before tracing.
4. Trace and reconstruct: trace and vectorize the core motifs, preserving motif shapes, layout, scale, repeat distances and colors.
5. Identify the repeat type: straight, half-drop, half-brick, mirror, or other.
6. Generate the tile: produce one repeat unit that shows no seams when placed edge to edge with copies of itself.
7. Remove logos: logos, brand names and wordmarks must be removed entirely and never reproduced.
8. Package the outputs:
   - a high-resolution PNG of the tile (about 30x30 cm at 300 DPI, i.e. 3543x3543 px; smaller is fine for simple patterns) with a transparent background;
   - an SVG of the tile only when the pattern is made of clear shapes with distinct edges. If it is too complex, noisy or painterly to vectorize, say so in fidelity_notes and omit the SVG;
   - the primary colors as a palette;
   - everything in one JSON object matching the provided schema.

Quality constraints:
- Fidelity: the tile must be an exact digital twin of the original pattern. Do not add, simplify or embellish elements.
- Precision: stripes, checks and dots must have exact alignment and spacing.
- Color: HEX values must be accurate; give an estimated CMYK conversion for print.
- Clarity: if the photo is too blurry, wrinkled or small for a faithful result, state the limitations and assumptions in fidelity_notes."#;

/// User turn accompanying the image
pub const USER_PROMPT: &str = "Analyze the provided image of clothing and perform the pattern digitization process as per your instructions. Generate the seamless pattern tile files and all associated metadata.";

/// Structured output schema matching [`crate::models::PatternData`]
pub fn response_schema() -> Value {
    let repeat_types: Vec<&str> = RepeatType::ALL.iter().map(RepeatType::as_str).collect();
    let mime_types = [FileMime::Png.as_str(), FileMime::Svg.as_str()];

    json!({
        "type": "OBJECT",
        "properties": {
            "analysis_summary": {
                "type": "OBJECT",
                "properties": {
                    "pattern_name": {
                        "type": "STRING",
                        "description": "Tên mô tả cho họa tiết, ví dụ: 'Kẻ Sọc Caro Xanh' hoặc 'Họa Tiết Hoa Cổ Điển'."
                    },
                    "description": {
                        "type": "STRING",
                        "description": "Mô tả ngắn gọn về phong cách và các yếu tố của họa tiết."
                    },
                    "repeat_type": {
                        "type": "STRING",
                        "enum": repeat_types,
                        "description": "Kiểu lặp lại đã xác định của họa tiết."
                    },
                    "fidelity_notes": {
                        "type": "STRING",
                        "description": "Ghi chú về chất lượng số hóa, bao gồm mọi giả định do chất lượng ảnh hoặc nếu không thể vector hóa."
                    }
                },
                "required": ["pattern_name", "description", "repeat_type", "fidelity_notes"]
            },
            "tile_properties": {
                "type": "OBJECT",
                "properties": {
                    "dpi": { "type": "NUMBER", "description": "Dots Per Inch của các tệp đầu ra, nên là 300." },
                    "width_px": { "type": "NUMBER", "description": "Chiều rộng của mẫu lặp liền mạch tính bằng pixel." },
                    "height_px": { "type": "NUMBER", "description": "Chiều cao của mẫu lặp liền mạch tính bằng pixel." },
                    "width_cm": { "type": "NUMBER", "description": "Chiều rộng thực tế ước tính của mẫu lặp tính bằng centimet." },
                    "height_cm": { "type": "NUMBER", "description": "Chiều cao thực tế ước tính của mẫu lặp tính bằng centimet." }
                },
                "required": ["dpi", "width_px", "height_px", "width_cm", "height_cm"]
            },
            "color_palette": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING", "description": "Tên mô tả cho màu sắc, ví dụ: 'Xanh Navy' hoặc 'Trắng Kem'." },
                        "hex": { "type": "STRING", "description": "Mã màu ở định dạng HEX, ví dụ: '#FFFFFF'." },
                        "cmyk_approx": { "type": "STRING", "description": "Giá trị chuyển đổi CMYK ước tính để in, ví dụ: 'C91 M79 Y0 K0'." }
                    },
                    "required": ["name", "hex", "cmyk_approx"]
                }
            },
            "files": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "filename": { "type": "STRING", "description": "Tên tệp được đề xuất, ví dụ: 'hoa-tiet-caro.png'." },
                        "mime_type": {
                            "type": "STRING",
                            "enum": mime_types,
                            "description": "Loại MIME của tệp."
                        },
                        "data": { "type": "STRING", "description": "Chuỗi nội dung tệp được mã hóa base64." }
                    },
                    "required": ["filename", "mime_type", "data"]
                }
            }
        },
        "required": ["analysis_summary", "tile_properties", "color_palette", "files"]
    })
}
