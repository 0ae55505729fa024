use eframe::egui::Color32;

// Color palette
pub const PRIMARY_BUTTON_BG: Color32 = Color32::from_rgb(76, 154, 255); // Fetch action
pub const SECONDARY_BUTTON_BG: Color32 = Color32::from_rgb(46, 160, 67); // Download action

// Text colors
pub const BUTTON_MAIN_TEXT: Color32 = Color32::from_rgb(255, 255, 255);
pub const SECONDARY_TEXT: Color32 = Color32::from_rgb(96, 96, 100);
pub const TEXT_ERROR: Color32 = Color32::from_rgb(200, 30, 30);
pub const TEXT_SUCCESS: Color32 = Color32::from_rgb(22, 140, 60);

// Input colors
pub const INPUT_BG: Color32 = Color32::from_rgb(250, 250, 250);

// UI elements
pub const BORDER_COLOR: Color32 = Color32::from_rgba_premultiplied(60, 60, 67, 15);

// Sizing and spacing
pub const ROUNDING_FRAME: f32 = 4.0;
pub const ROUNDING_BUTTON: f32 = 6.0;
pub const MIN_SIZE_BUTTON: egui::Vec2 = egui::Vec2::new(140.0, 40.0);

pub const BUTTON_FONT_SIZE: f32 = 16.0;
