//! egui binding for a category's scroll panel: pane layout, painting and input routing.

use crate::colors;
use crate::constants::{POINTS_PER_WHEEL_UNIT, SCROLLBAR_THICKNESS};
use eframe::egui::{self, ColorImage, TextureHandle, TextureOptions};
use svviz_view::Fragment;
use svviz_view::panel::{
    BarId, DragSession, ScrollPanel, Size, ViewBox, ViewportSettings, WheelInput,
};
use svviz_view::render::{SvgDocument, SvgRenderer};
use svviz_view::scrollbar::{FADE_SECONDS, Orientation, Scrollbar};

/// One sample's fragment, parsed and ready to paint.
pub struct PaneView {
    pub name: String,
    pub svg: String,
    pub document: SvgDocument,
    texture: Option<(TextureKey, TextureHandle)>,
}

/// Identifies the raster currently uploaded for a pane.
#[derive(Debug, Clone, PartialEq)]
struct TextureKey {
    view_box: String,
    width: u32,
    height: u32,
}

/// Everything shown for one category: its panes and the panel that scrolls them.
pub struct CategoryView {
    panes: Vec<PaneView>,
    /// Built on first show, once the container size is known.
    panel: Option<ScrollPanel>,
}

impl CategoryView {
    /// Parses every fragment. Fragments that fail to parse are skipped and returned as
    /// `(sample name, error)` pairs.
    pub fn from_fragments(
        renderer: &SvgRenderer,
        fragments: Vec<Fragment>,
    ) -> (Self, Vec<(String, String)>) {
        let mut panes = Vec::with_capacity(fragments.len());
        let mut failures = Vec::new();

        for fragment in fragments {
            match renderer.parse(&fragment.svg) {
                Ok(document) => panes.push(PaneView {
                    name: fragment.name,
                    svg: fragment.svg,
                    document,
                    texture: None,
                }),
                Err(err) => {
                    log::warn!("Failed to parse fragment for {}: {err}", fragment.name);
                    failures.push((fragment.name, err.to_string()));
                }
            }
        }

        (Self { panes, panel: None }, failures)
    }

    pub fn panes(&self) -> &[PaneView] {
        &self.panes
    }

    pub fn is_empty(&self) -> bool {
        self.panes.is_empty()
    }

    pub fn panel_mut(&mut self) -> Option<&mut ScrollPanel> {
        self.panel.as_mut()
    }

    /// Zoom back to fit the content width and anchor every pane at the bottom.
    pub fn reset_view(&mut self) {
        if let Some(panel) = &mut self.panel {
            panel.set_zoom(panel.fit_zoom());
            panel.scroll_to(BarId::Horizontal, 0.0);
            panel.scroll_to_bottom();
        }
    }

    /// Lays out, paints and handles input for the panes. Returns the read under the
    /// pointer, if any.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        id: egui::Id,
        settings: ViewportSettings,
    ) -> Option<String> {
        let (rect, response) =
            ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
        let container = Size::new(
            f64::from((rect.width() - SCROLLBAR_THICKNESS).max(0.0)),
            f64::from(rect.height()),
        );

        let panes = &self.panes;
        let panel = self.panel.get_or_insert_with(|| {
            let bounds: Vec<_> = panes.iter().map(|p| p.document.bounds()).collect();
            ScrollPanel::new(container, &bounds, settings)
        });
        panel.set_container_size(container);

        let layout = Layout::new(rect, panel);
        handle_input(ui, &response, &layout, panel);

        let ctx = ui.ctx().clone();
        let pixels_per_point = ctx.pixels_per_point();
        let painter = ui.painter_at(rect);

        for (index, pane) in self.panes.iter_mut().enumerate() {
            let pane_rect = layout.pane_rect(index);
            let Some(view_box) = panel.view_box(index) else {
                continue;
            };

            painter.rect_filled(pane_rect, 0.0, colors::PANE_BACKGROUND);
            if let Some(texture) =
                pane.texture_for(&ctx, id.with(index), view_box, pane_rect, pixels_per_point)
            {
                painter.image(
                    texture.id(),
                    pane_rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }
            painter.rect_stroke(
                pane_rect,
                0.0,
                egui::Stroke::new(1.0, colors::PANE_BORDER),
                egui::StrokeKind::Inside,
            );
            draw_pane_label(&painter, pane_rect, &pane.name);
        }

        draw_scrollbars(&ctx, &painter, id, &layout, panel);

        if panel.drag_session().is_some() {
            return None;
        }

        let hover = response.hover_pos()?;
        let index = layout.pane_at(hover)?;
        let pane_rect = layout.pane_rect(index);
        let view_box = panel.view_box(index)?;
        let local = hover - pane_rect.min;
        let [x, y] = view_box.map_to_content(
            [f64::from(local.x), f64::from(local.y)],
            f64::from(pane_rect.width()),
            f64::from(pane_rect.height()),
        )?;

        self.panes[index].document.read_at(x, y).map(str::to_owned)
    }
}

impl PaneView {
    /// Returns a texture for the current view box, rasterizing when it changed.
    fn texture_for(
        &mut self,
        ctx: &egui::Context,
        id: egui::Id,
        view_box: ViewBox,
        rect: egui::Rect,
        pixels_per_point: f32,
    ) -> Option<&TextureHandle> {
        let width = (rect.width() * pixels_per_point).round() as u32;
        let height = (rect.height() * pixels_per_point).round() as u32;
        if width == 0 || height == 0 {
            return None;
        }

        let key = TextureKey {
            view_box: view_box.to_string(),
            width,
            height,
        };

        let stale = self.texture.as_ref().is_none_or(|(cached, _)| *cached != key);
        if stale {
            match self.document.rasterize(view_box, width, height) {
                Ok(raster) => {
                    let image = ColorImage::from_rgba_premultiplied(
                        [raster.width as usize, raster.height as usize],
                        &raster.pixels,
                    );
                    let name = format!("{:?}-{}", id, self.name);
                    match &mut self.texture {
                        Some((cached, handle)) => {
                            handle.set(image, TextureOptions::LINEAR);
                            *cached = key;
                        }
                        None => {
                            let handle = ctx.load_texture(name, image, TextureOptions::LINEAR);
                            self.texture = Some((key, handle));
                        }
                    }
                }
                Err(err) => {
                    log::warn!("Failed to rasterize {}: {err}", self.name);
                    return None;
                }
            }
        }

        self.texture.as_ref().map(|(_, handle)| handle)
    }
}

/// Screen geometry of the panes and scrollbar tracks.
struct Layout {
    rect: egui::Rect,
    content_width: f32,
    pane_pitch: f32,
    pane_height: f32,
    gutter: f32,
    x_track: f32,
}

impl Layout {
    fn new(rect: egui::Rect, panel: &ScrollPanel) -> Self {
        let count = panel.pane_count().max(1) as f32;
        let x_track = panel
            .scrollbar(BarId::Horizontal)
            .map_or(0.0, |bar| bar.track_size() as f32);

        Self {
            rect,
            content_width: (rect.width() - SCROLLBAR_THICKNESS).max(0.0),
            pane_pitch: rect.height() / count,
            pane_height: panel.pane_height() as f32,
            gutter: panel.settings().pane_gutter as f32,
            x_track,
        }
    }

    fn pane_rect(&self, index: usize) -> egui::Rect {
        egui::Rect::from_min_size(
            egui::pos2(self.rect.left(), self.rect.top() + index as f32 * self.pane_pitch),
            egui::vec2(self.content_width, self.pane_height),
        )
    }

    fn pane_at(&self, pos: egui::Pos2) -> Option<usize> {
        if self.pane_pitch <= 0.0 {
            return None;
        }
        let index = ((pos.y - self.rect.top()) / self.pane_pitch).floor();
        if index < 0.0 {
            return None;
        }
        let index = index as usize;
        self.pane_rect(index).contains(pos).then_some(index)
    }

    /// Track rectangle of a scrollbar, full thickness.
    fn track_rect(&self, bar: BarId, scrollbar: &Scrollbar) -> egui::Rect {
        match bar {
            BarId::Horizontal => {
                let top = self.rect.bottom() - self.gutter
                    + (self.gutter - SCROLLBAR_THICKNESS).max(0.0) / 2.0;
                egui::Rect::from_min_size(
                    egui::pos2(self.rect.left(), top),
                    egui::vec2(self.x_track, SCROLLBAR_THICKNESS),
                )
            }
            BarId::Vertical(index) => {
                let pane = self.pane_rect(index);
                egui::Rect::from_min_size(
                    egui::pos2(pane.right(), pane.top()),
                    egui::vec2(SCROLLBAR_THICKNESS, scrollbar.track_size() as f32),
                )
            }
        }
    }

    /// Pointer position along a bar's track, in track pixels.
    fn along(&self, bar: BarId, scrollbar: &Scrollbar, pos: egui::Pos2) -> f64 {
        let track = self.track_rect(bar, scrollbar);
        match scrollbar.orientation() {
            Orientation::Horizontal => f64::from(pos.x - track.left()),
            Orientation::Vertical => f64::from(pos.y - track.top()),
        }
    }

    /// Scrollbar track under the pointer, with the position along it.
    fn track_at(&self, panel: &ScrollPanel, pos: egui::Pos2) -> Option<(BarId, f64)> {
        let bars = std::iter::once(BarId::Horizontal)
            .chain((0..panel.pane_count()).map(BarId::Vertical));

        for bar in bars {
            let Some(scrollbar) = panel.scrollbar(bar) else {
                continue;
            };
            if self.track_rect(bar, scrollbar).contains(pos) {
                return Some((bar, self.along(bar, scrollbar, pos)));
            }
        }
        None
    }
}

fn handle_input(
    ui: &egui::Ui,
    response: &egui::Response,
    layout: &Layout,
    panel: &mut ScrollPanel,
) {
    let (pressed, down, pointer, alt, scroll) = ui.input(|i| {
        (
            i.pointer.primary_pressed(),
            i.pointer.primary_down(),
            i.pointer.interact_pos(),
            i.modifiers.alt,
            i.raw_scroll_delta,
        )
    });

    if pressed
        && let Some(pos) = pointer
        && layout.rect.contains(pos)
    {
        if let Some((bar, along)) = layout.track_at(panel, pos) {
            panel.press_track(bar, along, alt);
        } else if layout.pane_at(pos).is_some() {
            panel.press_body([f64::from(pos.x), f64::from(pos.y)]);
        }
    }

    if down && let Some(pos) = pointer {
        match panel.drag_session() {
            Some(DragSession::Thumb(bar)) => {
                if let Some(scrollbar) = panel.scrollbar(bar) {
                    let along = layout.along(bar, scrollbar, pos);
                    panel.drag_thumb(along);
                }
            }
            Some(DragSession::Pan { .. }) => {
                panel.drag_body([f64::from(pos.x), f64::from(pos.y)]);
            }
            None => {}
        }
    }

    // Any release ends the drag, wherever the pointer went.
    if !down {
        panel.release();
    }

    if response.hovered() && scroll != egui::Vec2::ZERO {
        panel.wheel(WheelInput {
            delta_x: f64::from(-scroll.x / POINTS_PER_WHEEL_UNIT),
            delta_y: f64::from(scroll.y / POINTS_PER_WHEEL_UNIT),
            zoom: alt,
        });
    }
}

fn draw_pane_label(painter: &egui::Painter, pane_rect: egui::Rect, name: &str) {
    let galley = painter.layout_no_wrap(
        name.to_string(),
        egui::FontId::proportional(12.0),
        colors::PANE_LABEL,
    );
    let pos = pane_rect.min + egui::vec2(6.0, 4.0);
    let background = egui::Rect::from_min_size(pos, galley.size()).expand(2.0);
    painter.rect_filled(background, 2.0, colors::PANE_LABEL_BACKGROUND);
    painter.galley(pos, galley, colors::PANE_LABEL);
}

fn draw_scrollbars(
    ctx: &egui::Context,
    painter: &egui::Painter,
    id: egui::Id,
    layout: &Layout,
    panel: &ScrollPanel,
) {
    for (bar, fade) in panel.fades() {
        let Some(scrollbar) = panel.scrollbar(bar) else {
            continue;
        };

        let track_alpha =
            ctx.animate_value_with_time(id.with((bar, "track")), fade.track, FADE_SECONDS);
        let thumb_alpha =
            ctx.animate_value_with_time(id.with((bar, "thumb")), fade.thumb, FADE_SECONDS);

        let track = layout.track_rect(bar, scrollbar);
        painter.rect_filled(track, 3.0, colors::TRACK_FILL.gamma_multiply(track_alpha));

        let thumb = thumb_rect(track, scrollbar);

        let fill = if scrollbar.is_dragging() {
            colors::THUMB_DRAGGED
        } else {
            colors::THUMB_FILL
        };
        painter.rect_filled(thumb, 3.0, fill.gamma_multiply(thumb_alpha));
    }
}

/// Thumb rectangle inside `track`, clipped so short tracks never paint past their ends.
fn thumb_rect(track: egui::Rect, scrollbar: &Scrollbar) -> egui::Rect {
    let offset = scrollbar.thumb_offset() as f32;
    let size = scrollbar.thumb_size() as f32;
    let thumb = match scrollbar.orientation() {
        Orientation::Horizontal => egui::Rect::from_min_size(
            track.min + egui::vec2(offset, 0.0),
            egui::vec2(size, track.height()),
        ),
        Orientation::Vertical => egui::Rect::from_min_size(
            track.min + egui::vec2(0.0, offset),
            egui::vec2(track.width(), size),
        ),
    };
    thumb.intersect(track)
}

#[cfg(test)]
mod tests {
    use super::*;
    use svviz_view::panel::ContentBounds;

    fn layout_for(panel: &ScrollPanel) -> Layout {
        let rect = egui::Rect::from_min_size(
            egui::pos2(0.0, 0.0),
            egui::vec2(500.0 + SCROLLBAR_THICKNESS, 400.0),
        );
        Layout::new(rect, panel)
    }

    fn two_pane_panel() -> ScrollPanel {
        ScrollPanel::new(
            Size::new(500.0, 400.0),
            &[
                ContentBounds::new(0.0, 0.0, 1000.0, 2000.0),
                ContentBounds::new(0.0, 0.0, 1000.0, 2000.0),
            ],
            ViewportSettings::default(),
        )
    }

    #[test]
    fn panes_stack_with_gutters() {
        let panel = two_pane_panel();
        let layout = layout_for(&panel);

        assert_eq!(layout.pane_rect(0).height(), 188.0);
        assert_eq!(layout.pane_rect(1).top(), 200.0);
        assert_eq!(layout.pane_at(egui::pos2(10.0, 250.0)), Some(1));
        // Gutter below the first pane belongs to no pane.
        assert_eq!(layout.pane_at(egui::pos2(10.0, 195.0)), None);
    }

    #[test]
    fn tracks_resolve_to_their_bars() {
        let panel = two_pane_panel();
        let layout = layout_for(&panel);

        let (bar, along) = layout.track_at(&panel, egui::pos2(504.0, 250.0)).unwrap();
        assert_eq!(bar, BarId::Vertical(1));
        assert_eq!(along, 50.0);

        let (bar, along) = layout.track_at(&panel, egui::pos2(40.0, 394.0)).unwrap();
        assert_eq!(bar, BarId::Horizontal);
        assert_eq!(along, 40.0);
    }

    #[test]
    fn thumb_stays_inside_a_short_track() {
        let mut scrollbar = Scrollbar::new(Orientation::Vertical);
        scrollbar.resize(6.0, 1.0, 1000.0);
        scrollbar.scroll_to(1.0);

        let track = egui::Rect::from_min_size(egui::pos2(500.0, 20.0), egui::vec2(8.0, 6.0));
        let thumb = thumb_rect(track, &scrollbar);
        assert!(track.contains_rect(thumb));
        assert_eq!(thumb.height(), 6.0);
    }
}
