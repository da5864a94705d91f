//! Color constants for the viewport and sidebar.

use eframe::egui::Color32;

// Pane background behind the rendered fragment
pub const PANE_BACKGROUND: Color32 = Color32::WHITE;
pub const PANE_BORDER: Color32 = Color32::from_rgb(200, 200, 200);

// Scrollbars
pub const TRACK_FILL: Color32 = Color32::from_rgb(225, 225, 225);
pub const THUMB_FILL: Color32 = Color32::from_rgb(150, 150, 150);
pub const THUMB_DRAGGED: Color32 = Color32::from_rgb(100, 100, 100);

// Sample names drawn over each pane
pub const PANE_LABEL: Color32 = Color32::from_rgba_premultiplied(40, 40, 40, 220);
pub const PANE_LABEL_BACKGROUND: Color32 = Color32::from_rgba_premultiplied(230, 230, 230, 200);

// Allele categories, matching the backend's read colors
pub const ALT_ALLELE: Color32 = Color32::from_rgb(128, 0, 128);
pub const REF_ALLELE: Color32 = Color32::from_rgb(220, 20, 60);
pub const AMB_ALLELE: Color32 = Color32::from_rgb(128, 128, 128);
