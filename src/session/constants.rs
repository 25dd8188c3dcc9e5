/// Limits for reader controls.
pub const MIN_FONT_SIZE: u32 = 12;
pub const MAX_FONT_SIZE: u32 = 36;
pub const FONT_SIZE_STEP: i32 = 2;
/// Font size rendered at 100% zoom in the viewer.
pub const BASE_FONT_SIZE: u32 = 16;

/// Viewer zoom factor matching a reading font size.
pub fn scale_for_font_size(font_size: u32) -> f32 {
    font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE) as f32 / BASE_FONT_SIZE as f32
}
