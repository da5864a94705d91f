/// Width of the sidebar panel in pixels.
pub const SIDEBAR_WIDTH: f32 = 220.0;

/// Thickness of every scrollbar track in pixels.
pub const SCROLLBAR_THICKNESS: f32 = 8.0;

/// Points of `raw_scroll_delta` that make up one wheel unit (one notch).
pub const POINTS_PER_WHEEL_UNIT: f32 = 40.0;

/// Zoom multiplier for the keyboard shortcuts.
pub const KEY_ZOOM_STEP: f64 = 1.25;

/// How long error toasts stay on screen.
pub const ERROR_TOAST_SECONDS: f64 = 8.0;

/// How long informational toasts stay on screen.
pub const INFO_TOAST_SECONDS: f64 = 4.0;
