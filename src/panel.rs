//! Multi-pane scroll panel: one horizontal scrollbar shared by every pane, one vertical
//! scrollbar per pane, and the view box each pane should show.
//!
//! Every state change ends in [`ScrollPanel::scroll`], which recomputes the view boxes.
//! A full [`ScrollPanel::update`] runs resize, then zoom, then scroll.

use crate::scrollbar::{Fade, Orientation, Scrollbar, TrackPress};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Zoom multiplier per wheel unit when zooming in.
pub const ZOOM_IN_STEP: f64 = 1.25;

/// Zoom multiplier per wheel unit when zooming out.
pub const ZOOM_OUT_STEP: f64 = 0.8;

/// Wheel units beyond this are ignored for a single zoom event.
pub const MAX_ZOOM_UNITS: f64 = 3.0;

/// Fraction of a page scrolled per wheel unit.
pub const WHEEL_PAGE_FRACTION: f64 = 0.05;

/// Size of the container in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned box in content coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ContentBounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Visible window into content coordinates, as written to an SVG `viewBox`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    /// Uniform scale and offset that fit this view box into a `width`×`height` pixel area
    /// the way SVG's default `xMidYMid meet` does: `pixel = content * scale + offset`.
    pub fn meet_transform(&self, width: f64, height: f64) -> (f64, [f64; 2]) {
        if self.width <= 0.0 || self.height <= 0.0 {
            return (0.0, [0.0, 0.0]);
        }

        let scale = (width / self.width).min(height / self.height);
        let offset_x = (width - self.width * scale) / 2.0 - self.x * scale;
        let offset_y = (height - self.height * scale) / 2.0 - self.y * scale;
        (scale, [offset_x, offset_y])
    }

    /// Maps a pixel inside a `width`×`height` pane back to content coordinates.
    pub fn map_to_content(&self, pixel: [f64; 2], width: f64, height: f64) -> Option<[f64; 2]> {
        let (scale, [offset_x, offset_y]) = self.meet_transform(width, height);
        if scale <= 0.0 {
            return None;
        }
        Some([(pixel[0] - offset_x) / scale, (pixel[1] - offset_y) / scale])
    }
}

impl fmt::Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.x, self.y, self.width, self.height)
    }
}

/// Layout knobs for a [`ScrollPanel`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    /// Extra content units scrollable past each horizontal edge.
    pub horizontal_margin: f64,
    /// Pixels reserved below each pane for the shared horizontal scrollbar.
    pub pane_gutter: f64,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            horizontal_margin: 0.0,
            pane_gutter: 12.0,
        }
    }
}

/// Identifies one scrollbar of a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarId {
    Horizontal,
    Vertical(usize),
}

/// Pointer gesture currently captured by the panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragSession {
    /// Dragging the thumb of a scrollbar.
    Thumb(BarId),
    /// Panning the content; holds the last pointer position.
    Pan { last: [f64; 2] },
}

/// A wheel event in wheel units (one notch is roughly one unit).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WheelInput {
    pub delta_x: f64,
    pub delta_y: f64,
    /// Zoom instead of scroll (alt held).
    pub zoom: bool,
}

#[derive(Debug, Clone)]
struct Pane {
    bounds: ContentBounds,
    scrollbar: Scrollbar,
    zoom: f64,
    viewable: f64,
    view_box: ViewBox,
}

#[derive(Debug, Clone)]
pub struct ScrollPanel {
    settings: ViewportSettings,
    container: Size,
    x_min: f64,
    x_max: f64,
    x_zoom: f64,
    x_viewable: f64,
    x_scrollbar: Scrollbar,
    panes: Vec<Pane>,
    drag: Option<DragSession>,
}

impl ScrollPanel {
    /// Builds a panel for panes with the given content bounds.
    ///
    /// The initial zoom fits the content width to the container and every pane starts
    /// scrolled to the bottom.
    pub fn new(container: Size, bounds: &[ContentBounds], settings: ViewportSettings) -> Self {
        let (x_min, x_max) = if bounds.is_empty() {
            (0.0, 0.0)
        } else {
            bounds.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), b| {
                (min.min(b.x), max.max(b.right()))
            })
        };

        let range = x_max - x_min;
        let x_zoom = if range > 0.0 && container.width > 0.0 {
            container.width / range
        } else {
            1.0
        };

        let panes = bounds
            .iter()
            .map(|&bounds| Pane {
                bounds,
                scrollbar: Scrollbar::new(Orientation::Vertical),
                zoom: x_zoom,
                viewable: 0.0,
                view_box: ViewBox::default(),
            })
            .collect();

        let mut panel = Self {
            settings,
            container,
            x_min,
            x_max,
            x_zoom,
            x_viewable: 0.0,
            x_scrollbar: Scrollbar::new(Orientation::Horizontal),
            panes,
            drag: None,
        };

        panel.update();
        panel.scroll_to_bottom();
        panel
    }

    pub fn pane_count(&self) -> usize {
        self.panes.len()
    }

    pub fn container(&self) -> Size {
        self.container
    }

    pub fn settings(&self) -> ViewportSettings {
        self.settings
    }

    /// Horizontal zoom in pixels per content unit.
    pub fn x_zoom(&self) -> f64 {
        self.x_zoom
    }

    /// Vertical zoom of one pane in pixels per content unit.
    pub fn y_zoom(&self, pane: usize) -> Option<f64> {
        self.panes.get(pane).map(|p| p.zoom)
    }

    pub fn x_viewable(&self) -> f64 {
        self.x_viewable
    }

    pub fn y_viewable(&self, pane: usize) -> Option<f64> {
        self.panes.get(pane).map(|p| p.viewable)
    }

    pub fn view_box(&self, pane: usize) -> Option<ViewBox> {
        self.panes.get(pane).map(|p| p.view_box)
    }

    pub fn view_boxes(&self) -> impl Iterator<Item = ViewBox> + '_ {
        self.panes.iter().map(|p| p.view_box)
    }

    pub fn scrollbar(&self, bar: BarId) -> Option<&Scrollbar> {
        match bar {
            BarId::Horizontal => Some(&self.x_scrollbar),
            BarId::Vertical(i) => self.panes.get(i).map(|p| &p.scrollbar),
        }
    }

    fn scrollbar_mut(&mut self, bar: BarId) -> Option<&mut Scrollbar> {
        match bar {
            BarId::Horizontal => Some(&mut self.x_scrollbar),
            BarId::Vertical(i) => self.panes.get_mut(i).map(|p| &mut p.scrollbar),
        }
    }

    /// Every scrollbar with its fade target, horizontal first.
    pub fn fades(&self) -> impl Iterator<Item = (BarId, Fade)> + '_ {
        std::iter::once((BarId::Horizontal, self.x_scrollbar.fade())).chain(
            self.panes
                .iter()
                .enumerate()
                .map(|(i, p)| (BarId::Vertical(i), p.scrollbar.fade())),
        )
    }

    /// Pixel height of one pane.
    pub fn pane_height(&self) -> f64 {
        if self.panes.is_empty() {
            return 0.0;
        }
        (self.container.height / self.panes.len() as f64 - self.settings.pane_gutter).max(0.0)
    }

    /// Content width including the margins on both sides.
    fn x_total(&self) -> f64 {
        (self.x_max - self.x_min) + 2.0 * self.settings.horizontal_margin
    }

    /// Records a new container size and updates if it changed.
    pub fn set_container_size(&mut self, container: Size) -> bool {
        if container == self.container {
            return false;
        }
        self.container = container;
        self.update();
        true
    }

    /// Resets every zoom factor to `zoom` pixels per content unit.
    pub fn set_zoom(&mut self, zoom: f64) {
        if !(zoom.is_finite() && zoom > 0.0) {
            return;
        }
        self.x_zoom = zoom;
        for pane in &mut self.panes {
            pane.zoom = zoom;
        }
        self.update();
    }

    /// Zoom factor that fits the full content width into the container.
    pub fn fit_zoom(&self) -> f64 {
        let range = self.x_max - self.x_min;
        if range > 0.0 && self.container.width > 0.0 {
            self.container.width / range
        } else {
            1.0
        }
    }

    /// Recomputes viewable extents, scrollbars and view boxes.
    pub fn update(&mut self) {
        self.zoom();
        self.resize_scrollbars();
        self.scroll();
    }

    /// Recomputes the viewable content extents from the zoom factors.
    pub fn zoom(&mut self) {
        self.x_viewable = self.container.width / self.x_zoom;

        let count = self.panes.len() as f64;
        for pane in &mut self.panes {
            pane.viewable = self.container.height / pane.zoom / count;
        }
    }

    fn resize_scrollbars(&mut self) {
        let x_total = self.x_total();
        self.x_scrollbar
            .resize(self.container.width, self.x_viewable, x_total);

        let pane_height = self.pane_height();
        for pane in &mut self.panes {
            pane.scrollbar
                .resize(pane_height, pane.viewable, pane.bounds.height);
        }
    }

    /// Recomputes every pane's view box from the scroll proportions.
    pub fn scroll(&mut self) {
        let margin = self.settings.horizontal_margin;
        let x = (self.x_total() - self.x_viewable) * self.x_scrollbar.proportion() + self.x_min
            - margin;

        for pane in &mut self.panes {
            let y = (pane.bounds.height - pane.viewable) * pane.scrollbar.proportion()
                + pane.bounds.y;
            pane.view_box = ViewBox {
                x,
                y,
                width: self.x_viewable,
                height: pane.viewable,
            };
        }
    }

    /// Anchors every pane at its bottom-most position.
    pub fn scroll_to_bottom(&mut self) {
        for pane in &mut self.panes {
            pane.scrollbar.anchor_end();
        }
        self.scroll();
    }

    /// Scrolls one scrollbar to `proportion`.
    pub fn scroll_to(&mut self, bar: BarId, proportion: f64) -> bool {
        let moved = self
            .scrollbar_mut(bar)
            .is_some_and(|scrollbar| scrollbar.scroll_to(proportion));
        self.scroll();
        moved
    }

    /// Pans every axis by a pixel delta through each scrollbar's own mapping.
    pub fn move_view(&mut self, delta_x: f64, delta_y: f64) {
        self.x_scrollbar.scroll_by(delta_x);
        for pane in &mut self.panes {
            pane.scrollbar.scroll_by(delta_y);
        }
        self.update();
    }

    /// Multiplies every zoom factor by `factor`.
    pub fn zoom_by(&mut self, factor: f64) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }

        let x_zoom = self.x_zoom * factor;
        if x_zoom.is_finite() && x_zoom > 0.0 {
            self.x_zoom = x_zoom;
        }
        for pane in &mut self.panes {
            let zoom = pane.zoom * factor;
            if zoom.is_finite() && zoom > 0.0 {
                pane.zoom = zoom;
            }
        }
        self.update();
    }

    /// Handles a wheel event: zooms with the modifier, pages otherwise.
    pub fn wheel(&mut self, input: WheelInput) {
        if input.zoom {
            if let Some(factor) = zoom_factor(input.delta_y) {
                self.zoom_by(factor);
            }
            return;
        }

        if input.delta_x != 0.0 {
            self.x_scrollbar.page(input.delta_x * WHEEL_PAGE_FRACTION);
        }
        if input.delta_y != 0.0 {
            for pane in &mut self.panes {
                pane.scrollbar.page(-input.delta_y * WHEEL_PAGE_FRACTION);
            }
        }
        self.scroll();
    }

    pub fn drag_session(&self) -> Option<DragSession> {
        self.drag
    }

    /// Press on a scrollbar track at `pointer` pixels from the track start.
    pub fn press_track(&mut self, bar: BarId, pointer: f64, jump: bool) -> TrackPress {
        let Some(scrollbar) = self.scrollbar_mut(bar) else {
            return TrackPress::Ignored;
        };

        let press = scrollbar.press_track(pointer, jump);
        if press == TrackPress::Grabbed {
            self.drag = Some(DragSession::Thumb(bar));
        }
        if press != TrackPress::Ignored {
            self.scroll();
        }
        press
    }

    /// Follows the pointer during a thumb drag.
    pub fn drag_thumb(&mut self, pointer: f64) {
        let Some(DragSession::Thumb(bar)) = self.drag else {
            return;
        };

        if let Some(scrollbar) = self.scrollbar_mut(bar) {
            scrollbar.drag_to(pointer);
        }
        self.scroll();
    }

    /// Press on the content area; starts panning.
    pub fn press_body(&mut self, pointer: [f64; 2]) {
        self.drag = Some(DragSession::Pan { last: pointer });
    }

    /// Follows the pointer while panning. The content moves with the pointer.
    pub fn drag_body(&mut self, pointer: [f64; 2]) {
        let Some(DragSession::Pan { last }) = self.drag else {
            return;
        };

        self.drag = Some(DragSession::Pan { last: pointer });
        self.move_view(last[0] - pointer[0], last[1] - pointer[1]);
    }

    /// Ends any drag in progress. Safe to call when nothing is captured.
    pub fn release(&mut self) {
        self.drag = None;
        self.x_scrollbar.end_drag();
        for pane in &mut self.panes {
            pane.scrollbar.end_drag();
        }
    }
}

/// Zoom multiplier for a wheel delta: `1.25` per unit in, `0.8` per unit out, at most
/// [`MAX_ZOOM_UNITS`] units per event.
pub fn zoom_factor(delta_y: f64) -> Option<f64> {
    if delta_y > 0.0 {
        Some(ZOOM_IN_STEP.powf(delta_y.min(MAX_ZOOM_UNITS)))
    } else if delta_y < 0.0 {
        Some(ZOOM_OUT_STEP.powf((-delta_y).min(MAX_ZOOM_UNITS)))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrollbar::ScrollbarState;

    fn square_panel() -> ScrollPanel {
        let mut panel = ScrollPanel::new(
            Size::new(500.0, 500.0),
            &[ContentBounds::new(0.0, 0.0, 1000.0, 1000.0)],
            ViewportSettings::default(),
        );
        panel.set_zoom(1.0);
        panel
    }

    #[test]
    fn view_box_follows_scroll_proportions() {
        let mut panel = square_panel();
        assert_eq!(panel.x_viewable(), 500.0);
        assert_eq!(panel.y_viewable(0), Some(500.0));

        panel.scroll_to(BarId::Horizontal, 0.5);
        panel.scroll_to(BarId::Vertical(0), 0.5);

        let view_box = panel.view_box(0).unwrap();
        assert_eq!(view_box, ViewBox { x: 250.0, y: 250.0, width: 500.0, height: 500.0 });
        assert_eq!(view_box.to_string(), "250 250 500 500");
    }

    #[test]
    fn new_panel_fits_width_and_starts_at_bottom() {
        let panel = ScrollPanel::new(
            Size::new(400.0, 300.0),
            &[
                ContentBounds::new(0.0, 0.0, 800.0, 2000.0),
                ContentBounds::new(100.0, 0.0, 1500.0, 100.0),
            ],
            ViewportSettings::default(),
        );

        // Union of x extents is 0..1600.
        assert_eq!(panel.x_zoom(), 0.25);
        assert_eq!(panel.x_viewable(), 1600.0);
        assert_eq!(panel.scrollbar(BarId::Horizontal).unwrap().state(), ScrollbarState::Inactive);

        // 300px / zoom 0.25 / 2 panes -> 600 units of each pane visible.
        assert_eq!(panel.y_viewable(0), Some(600.0));
        assert_eq!(panel.scrollbar(BarId::Vertical(0)).unwrap().proportion(), 1.0);
        assert_eq!(panel.view_box(0).unwrap().y, 1400.0);

        // The short pane fits but stays bottom-anchored.
        assert_eq!(panel.scrollbar(BarId::Vertical(1)).unwrap().state(), ScrollbarState::Inactive);
        assert_eq!(panel.view_box(1).unwrap().y, -500.0);
    }

    #[test]
    fn horizontal_margin_extends_scroll_range() {
        let mut panel = ScrollPanel::new(
            Size::new(500.0, 500.0),
            &[ContentBounds::new(0.0, 0.0, 1000.0, 1000.0)],
            ViewportSettings {
                horizontal_margin: 150.0,
                ..ViewportSettings::default()
            },
        );
        panel.set_zoom(1.0);

        panel.scroll_to(BarId::Horizontal, 0.0);
        assert_eq!(panel.view_box(0).unwrap().x, -150.0);

        panel.scroll_to(BarId::Horizontal, 1.0);
        assert_eq!(panel.view_box(0).unwrap().x, 650.0);
    }

    #[test]
    fn zoom_wheel_is_strictly_monotonic() {
        let mut panel = square_panel();

        let mut previous = panel.x_zoom();
        for _ in 0..20 {
            panel.wheel(WheelInput { delta_y: 1.0, zoom: true, ..Default::default() });
            assert!(panel.x_zoom() > previous);
            previous = panel.x_zoom();
        }

        for _ in 0..60 {
            panel.wheel(WheelInput { delta_y: -5.0, zoom: true, ..Default::default() });
            assert!(panel.x_zoom() < previous);
            assert!(panel.x_zoom() > 0.0);
            assert!(panel.y_zoom(0).unwrap() > 0.0);
            previous = panel.x_zoom();
        }
    }

    #[test]
    fn zoom_steps_are_capped() {
        assert_eq!(zoom_factor(1.0), Some(1.25));
        assert_eq!(zoom_factor(10.0), zoom_factor(3.0));
        assert_eq!(zoom_factor(-1.0), Some(0.8));
        assert_eq!(zoom_factor(-10.0), zoom_factor(-3.0));
        assert_eq!(zoom_factor(0.0), None);
    }

    #[test]
    fn zooming_in_shrinks_the_view_box() {
        let mut panel = square_panel();
        panel.wheel(WheelInput { delta_y: 1.0, zoom: true, ..Default::default() });

        assert_eq!(panel.x_zoom(), 1.25);
        assert_eq!(panel.view_box(0).unwrap().width, 400.0);
        assert_eq!(panel.view_box(0).unwrap().height, 400.0);
    }

    #[test]
    fn plain_wheel_scrolls_vertically_against_delta() {
        let mut panel = square_panel();
        panel.scroll_to(BarId::Vertical(0), 0.5);

        panel.wheel(WheelInput { delta_y: 2.0, ..Default::default() });
        assert!(panel.scrollbar(BarId::Vertical(0)).unwrap().proportion() < 0.5);
        assert_eq!(panel.x_zoom(), 1.0);
    }

    #[test]
    fn wheel_pages_by_content_even_with_a_floored_thumb() {
        let mut panel = ScrollPanel::new(
            Size::new(500.0, 500.0),
            &[ContentBounds::new(0.0, 0.0, 1000.0, 100_000.0)],
            ViewportSettings::default(),
        );
        panel.set_zoom(1.0);
        let viewable = panel.y_viewable(0).unwrap();
        assert_eq!(
            panel.scrollbar(BarId::Vertical(0)).unwrap().thumb_size(),
            crate::scrollbar::MIN_THUMB_SIZE
        );

        panel.scroll_to(BarId::Vertical(0), 0.5);
        let before = panel.view_box(0).unwrap().y;

        // 20 wheel units toward the user is one screen down.
        panel.wheel(WheelInput { delta_y: -20.0, ..Default::default() });
        let moved = panel.view_box(0).unwrap().y - before;
        assert!((moved - viewable).abs() < 1e-6, "moved {moved} of {viewable}");
    }

    #[test]
    fn body_drag_moves_content_with_pointer() {
        let mut panel = square_panel();
        panel.scroll_to(BarId::Horizontal, 0.5);
        panel.scroll_to(BarId::Vertical(0), 0.5);
        let before = panel.view_box(0).unwrap();

        panel.press_body([200.0, 200.0]);
        panel.drag_body([150.0, 260.0]);
        panel.release();

        let after = panel.view_box(0).unwrap();
        assert!(after.x > before.x);
        assert!(after.y < before.y);
        assert_eq!(panel.drag_session(), None);
    }

    #[test]
    fn thumb_drag_is_released_even_without_moves() {
        let mut panel = square_panel();
        let thumb = panel.scrollbar(BarId::Horizontal).unwrap().thumb_offset() + 1.0;

        assert_eq!(panel.press_track(BarId::Horizontal, thumb, false), TrackPress::Grabbed);
        assert_eq!(panel.drag_session(), Some(DragSession::Thumb(BarId::Horizontal)));

        panel.release();
        assert_eq!(panel.drag_session(), None);
        assert!(!panel.scrollbar(BarId::Horizontal).unwrap().is_dragging());

        let proportion = panel.scrollbar(BarId::Horizontal).unwrap().proportion();
        panel.drag_thumb(400.0);
        assert_eq!(panel.scrollbar(BarId::Horizontal).unwrap().proportion(), proportion);
    }

    #[test]
    fn container_resize_updates_extents() {
        let mut panel = square_panel();
        assert!(panel.set_container_size(Size::new(250.0, 500.0)));
        assert!(!panel.set_container_size(Size::new(250.0, 500.0)));

        assert_eq!(panel.x_viewable(), 250.0);
        assert_eq!(panel.view_box(0).unwrap().width, 250.0);
    }

    #[test]
    fn empty_and_zero_sized_panels_do_not_panic() {
        let mut empty = ScrollPanel::new(Size::new(0.0, 0.0), &[], ViewportSettings::default());
        empty.wheel(WheelInput { delta_x: 3.0, delta_y: -2.0, zoom: false });
        empty.move_view(10.0, 10.0);
        assert_eq!(empty.view_boxes().count(), 0);

        let collapsed = ScrollPanel::new(
            Size::new(0.0, 0.0),
            &[ContentBounds::new(0.0, 0.0, 100.0, 100.0)],
            ViewportSettings::default(),
        );
        let view_box = collapsed.view_box(0).unwrap();
        assert!(!view_box.x.is_nan());
        assert!(!view_box.y.is_nan());
    }

    #[test]
    fn meet_transform_round_trips_pixels() {
        let view_box = ViewBox { x: 100.0, y: 50.0, width: 200.0, height: 100.0 };
        let (scale, offset) = view_box.meet_transform(400.0, 400.0);

        assert_eq!(scale, 2.0);
        assert_eq!(offset, [-200.0, 0.0]);
        assert_eq!(view_box.map_to_content([200.0, 200.0], 400.0, 400.0), Some([200.0, 100.0]));
    }
}
