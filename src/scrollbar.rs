//! Scrollbar model: maps between thumb pixels on a track and a scroll proportion.
//!
//! The scrollbar owns no content. It only knows how large its track is, how much of the
//! content is viewable, and where the thumb sits. Painting and pointer capture belong to
//! the UI layer, which reads [`Scrollbar::thumb_offset`], [`Scrollbar::thumb_size`] and
//! [`Scrollbar::fade`] and feeds pointer positions back in track-local pixels.

/// The thumb never shrinks below this many pixels, however large the content is.
pub const MIN_THUMB_SIZE: f64 = 10.0;

/// Duration of the opacity transition when a scrollbar changes state.
pub const FADE_SECONDS: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Whether the scrollbar accepts input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollbarState {
    /// Content fits; drags and clicks are ignored.
    Inactive,
    /// Content overflows the view.
    Active,
}

/// Opacity targets for the track and thumb, animated by the UI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    pub track: f32,
    pub thumb: f32,
}

/// Outcome of a pointer press on the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackPress {
    /// Scrollbar is inactive.
    Ignored,
    /// Press landed on the thumb; a drag is in progress.
    Grabbed,
    /// Thumb was centred on the press point.
    Jumped,
    /// Scrolled one page toward the press point.
    Paged,
}

#[derive(Debug, Clone)]
pub struct Scrollbar {
    orientation: Orientation,
    /// Pixels at the end of the host that the track leaves free.
    end_space: f64,
    proportion: f64,
    track_size: f64,
    thumb_size: f64,
    /// Proportion covered by one screen of content.
    page_fraction: f64,
    state: ScrollbarState,
    /// Pointer offset inside the thumb while dragging.
    grab: Option<f64>,
}

impl Scrollbar {
    pub fn new(orientation: Orientation) -> Self {
        let end_space = match orientation {
            Orientation::Horizontal => 10.0,
            Orientation::Vertical => 0.0,
        };

        Self {
            orientation,
            end_space,
            proportion: 0.0,
            track_size: 0.0,
            thumb_size: MIN_THUMB_SIZE,
            page_fraction: 0.0,
            state: ScrollbarState::Active,
            grab: None,
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn state(&self) -> ScrollbarState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ScrollbarState::Active
    }

    /// Current scroll position in `[0, 1]`.
    pub fn proportion(&self) -> f64 {
        self.proportion
    }

    pub fn track_size(&self) -> f64 {
        self.track_size
    }

    pub fn thumb_size(&self) -> f64 {
        self.thumb_size
    }

    /// Distance of the thumb from the start of the track, in pixels.
    pub fn thumb_offset(&self) -> f64 {
        self.travel().max(0.0) * self.proportion
    }

    pub fn is_dragging(&self) -> bool {
        self.grab.is_some()
    }

    /// Recomputes track and thumb sizes for a host of `host_size` pixels showing `viewable`
    /// units out of `total`.
    ///
    /// The thumb is floored at [`MIN_THUMB_SIZE`] but never outgrows the track.
    pub fn resize(&mut self, host_size: f64, viewable: f64, total: f64) {
        self.track_size = (host_size - self.end_space).max(0.0);

        let page = if total > 0.0 {
            viewable / total
        } else {
            f64::INFINITY
        };

        // NaN pages (zero-sized views) fall through to inactive as well.
        if page < 1.0 {
            self.state = ScrollbarState::Active;
            self.thumb_size = (self.track_size * page)
                .max(MIN_THUMB_SIZE)
                .min(self.track_size);
            self.page_fraction = viewable / (total - viewable);
        } else {
            self.state = ScrollbarState::Inactive;
            self.thumb_size = self.track_size;
            self.page_fraction = 0.0;
            self.grab = None;
        }
    }

    /// Moves to `proportion`, clamped to `[0, 1]`. Returns `false` if the scrollbar is
    /// inactive and nothing changed.
    pub fn scroll_to(&mut self, proportion: f64) -> bool {
        if !self.is_active() || proportion.is_nan() {
            return false;
        }

        self.proportion = proportion.clamp(0.0, 1.0);
        true
    }

    /// Scrolls by a distance given in track pixels.
    pub fn scroll_by(&mut self, pixels: f64) -> bool {
        self.scroll_to(self.proportion + self.coord_to_proportion(pixels))
    }

    /// Scrolls by `pages` screens of content, independent of how large the thumb is drawn.
    pub fn page(&mut self, pages: f64) -> bool {
        self.scroll_to(self.proportion + pages * self.page_fraction)
    }

    /// Converts a track pixel distance into a proportion of the scrollable range.
    pub fn coord_to_proportion(&self, coord: f64) -> f64 {
        let travel = self.travel();
        if travel <= 0.0 {
            return 0.0;
        }
        coord / travel
    }

    /// Places the scrollbar at the end of its range regardless of state.
    ///
    /// Used once when content is first shown so that panes start bottom-anchored.
    pub fn anchor_end(&mut self) {
        self.proportion = 1.0;
    }

    /// Starts a thumb drag with the pointer at `pointer` pixels along the track.
    pub fn begin_drag(&mut self, pointer: f64) -> bool {
        if !self.is_active() {
            return false;
        }

        self.grab = Some(pointer - self.thumb_offset());
        true
    }

    /// Follows the pointer during a thumb drag.
    pub fn drag_to(&mut self, pointer: f64) -> bool {
        let Some(grab) = self.grab else {
            return false;
        };

        self.scroll_to(self.coord_to_proportion(pointer - grab))
    }

    pub fn end_drag(&mut self) {
        self.grab = None;
    }

    /// Handles a press at `pointer` pixels along the track.
    ///
    /// With `jump` the thumb is centred on the pointer, otherwise the view pages toward it.
    pub fn press_track(&mut self, pointer: f64, jump: bool) -> TrackPress {
        if !self.is_active() {
            return TrackPress::Ignored;
        }

        let offset = self.thumb_offset();
        if pointer >= offset && pointer <= offset + self.thumb_size {
            self.begin_drag(pointer);
            return TrackPress::Grabbed;
        }

        if jump {
            self.scroll_to(self.coord_to_proportion(pointer - self.thumb_size / 2.0));
            TrackPress::Jumped
        } else {
            let direction = if pointer < offset { -1.0 } else { 1.0 };
            self.page(direction);
            TrackPress::Paged
        }
    }

    /// Opacity targets for the current state.
    pub fn fade(&self) -> Fade {
        match self.state {
            ScrollbarState::Active => Fade {
                track: 1.0,
                thumb: 1.0,
            },
            ScrollbarState::Inactive => Fade {
                track: 0.8,
                thumb: 0.0,
            },
        }
    }

    fn travel(&self) -> f64 {
        self.track_size - self.thumb_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertical(track: f64, viewable: f64, total: f64) -> Scrollbar {
        let mut bar = Scrollbar::new(Orientation::Vertical);
        bar.resize(track, viewable, total);
        bar
    }

    #[test]
    fn scroll_to_reads_back_clamped_proportion() {
        let mut bar = vertical(500.0, 100.0, 1000.0);

        for p in [0.0, 0.125, 0.5, 0.75, 1.0] {
            assert!(bar.scroll_to(p));
            assert_eq!(bar.proportion(), p);
        }

        bar.scroll_to(1.7);
        assert_eq!(bar.proportion(), 1.0);
        bar.scroll_to(-0.3);
        assert_eq!(bar.proportion(), 0.0);
    }

    #[test]
    fn resize_is_idempotent() {
        let mut bar = vertical(480.0, 250.0, 1000.0);
        let first = (bar.thumb_size(), bar.state());

        bar.resize(480.0, 250.0, 1000.0);
        assert_eq!((bar.thumb_size(), bar.state()), first);
        assert_eq!(bar.thumb_size(), 120.0);
    }

    #[test]
    fn thumb_has_a_floor() {
        let bar = vertical(500.0, 1.0, 1000.0);
        assert_eq!(bar.thumb_size(), MIN_THUMB_SIZE);
        assert!(bar.is_active());
    }

    #[test]
    fn horizontal_track_leaves_end_space() {
        let mut bar = Scrollbar::new(Orientation::Horizontal);
        bar.resize(510.0, 250.0, 1000.0);

        assert_eq!(bar.track_size(), 500.0);
        assert_eq!(bar.thumb_size(), 125.0);
    }

    #[test]
    fn fitting_content_makes_scroll_to_a_no_op() {
        let mut bar = vertical(500.0, 200.0, 1000.0);
        bar.scroll_to(0.4);

        bar.resize(500.0, 1000.0, 1000.0);
        assert_eq!(bar.state(), ScrollbarState::Inactive);

        assert!(!bar.scroll_to(0.9));
        assert!(!bar.page(1.0));
        assert_eq!(bar.proportion(), 0.4);
        assert_eq!(bar.press_track(10.0, false), TrackPress::Ignored);
        assert_eq!(bar.fade(), Fade { track: 0.8, thumb: 0.0 });
    }

    #[test]
    fn pixel_mapping_is_affine() {
        // track 500, thumb 100 -> 400 pixels of travel
        let mut bar = vertical(500.0, 200.0, 1000.0);
        assert_eq!(bar.coord_to_proportion(100.0), 0.25);

        bar.scroll_to(0.5);
        assert_eq!(bar.thumb_offset(), 200.0);
    }

    #[test]
    fn drag_keeps_the_grab_point_under_the_pointer() {
        let mut bar = vertical(500.0, 200.0, 1000.0);
        bar.scroll_to(0.25); // thumb at 100..200

        assert_eq!(bar.press_track(130.0, false), TrackPress::Grabbed);
        assert!(bar.is_dragging());

        bar.drag_to(330.0);
        assert_eq!(bar.thumb_offset(), 300.0);
        assert_eq!(bar.proportion(), 0.75);

        bar.drag_to(10_000.0);
        assert_eq!(bar.proportion(), 1.0);

        bar.end_drag();
        assert!(!bar.is_dragging());
        assert!(!bar.drag_to(0.0));
        assert_eq!(bar.proportion(), 1.0);
    }

    #[test]
    fn track_press_pages_toward_pointer() {
        let mut bar = vertical(500.0, 200.0, 1000.0);
        bar.scroll_to(0.5); // thumb at 200..300

        assert_eq!(bar.press_track(450.0, false), TrackPress::Paged);
        assert_eq!(bar.proportion(), 0.75);

        assert_eq!(bar.press_track(20.0, false), TrackPress::Paged);
        assert_eq!(bar.proportion(), 0.5);
    }

    #[test]
    fn paging_a_floored_thumb_moves_one_screen() {
        let (viewable, total) = (300.0, 100_000.0);
        let mut bar = vertical(300.0, viewable, total);
        assert_eq!(bar.thumb_size(), MIN_THUMB_SIZE);

        bar.scroll_to(0.5);
        assert!(bar.page(1.0));

        let moved = (bar.proportion() - 0.5) * (total - viewable);
        assert!((moved - viewable).abs() < 1e-6, "moved {moved} units");

        bar.page(-2.0);
        let moved = (0.5 - bar.proportion()) * (total - viewable);
        assert!((moved - viewable).abs() < 1e-6, "moved {moved} units");
    }

    #[test]
    fn thumb_never_outgrows_a_short_track() {
        let mut bar = vertical(6.0, 1.0, 1000.0);
        assert!(bar.is_active());
        assert_eq!(bar.thumb_size(), 6.0);

        bar.scroll_to(1.0);
        assert!(bar.thumb_offset() + bar.thumb_size() <= bar.track_size());

        bar.resize(6.0, 1000.0, 1000.0);
        assert_eq!(bar.thumb_size(), bar.track_size());
    }

    #[test]
    fn alt_press_centres_thumb_on_pointer() {
        let mut bar = vertical(500.0, 200.0, 1000.0);

        assert_eq!(bar.press_track(350.0, true), TrackPress::Jumped);
        assert_eq!(bar.thumb_offset() + bar.thumb_size() / 2.0, 350.0);
    }

    #[test]
    fn degenerate_track_never_produces_nan() {
        let mut bar = vertical(0.0, 0.0, 1000.0);
        assert!(bar.is_active());
        assert_eq!(bar.coord_to_proportion(50.0), 0.0);

        bar.scroll_by(50.0);
        assert_eq!(bar.proportion(), 0.0);

        let mut empty = vertical(300.0, 0.0, 0.0);
        assert!(!empty.is_active());
        assert!(!empty.scroll_to(f64::NAN));
    }
}
