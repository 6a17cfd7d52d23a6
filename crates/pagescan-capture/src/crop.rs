// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Manual crop editor — corner dragging with bounds clamping, pinch-zoom of the
// view, and reset to the auto-detected boundary.
//
// Pointer and touch positions arrive in logical view pixels. The crop
// rectangle lives in source-image pixels. `ViewTransform` maps between them;
// zoom only ever changes the view, never the rectangle.

use pagescan_core::config::ScanConfig;
use pagescan_core::types::{CropArea, Point, ProcessedImage, Quad};
use tracing::{debug, info};

use crate::input::Key;

/// One of the four draggable crop handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// Where this handle sits on `crop`, in source pixels.
    pub fn position(&self, crop: &CropArea) -> Point {
        match self {
            Corner::TopLeft => Point::new(crop.x, crop.y),
            Corner::TopRight => Point::new(crop.right(), crop.y),
            Corner::BottomLeft => Point::new(crop.x, crop.bottom()),
            Corner::BottomRight => Point::new(crop.right(), crop.bottom()),
        }
    }
}

/// What the user's fingers are currently doing. The single source of truth
/// for gesture continuity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interaction {
    Idle,
    Dragging { corner: Corner },
    /// `baseline_distance` is the finger spread at the previous reading.
    Pinching { baseline_distance: f32 },
}

/// Display mapping from source pixels to logical view pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// Scale that fits the source image into the view at zoom 1.
    pub fit_scale: f32,
    pub zoom: f32,
    pub offset: Point,
}

impl ViewTransform {
    pub fn new(fit_scale: f32) -> Self {
        Self {
            fit_scale: if fit_scale > 0.0 { fit_scale } else { 1.0 },
            zoom: 1.0,
            offset: Point::default(),
        }
    }

    pub fn scale(&self) -> f32 {
        self.fit_scale * self.zoom
    }

    pub fn to_view(&self, source: Point) -> Point {
        Point::new(
            source.x * self.scale() + self.offset.x,
            source.y * self.scale() + self.offset.y,
        )
    }

    pub fn to_source(&self, view: Point) -> Point {
        Point::new(
            (view.x - self.offset.x) / self.scale(),
            (view.y - self.offset.y) / self.scale(),
        )
    }
}

/// How an editing session ends. These are the editor's only outward reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CropOutcome {
    /// Use this rectangle.
    Apply(CropArea),
    /// Go back to the automatically detected crop.
    Reset,
    /// Leave the page's crop as it was.
    Skip,
}

/// Interactive crop rectangle over one source image.
#[derive(Debug, Clone)]
pub struct CropEditor {
    image_width: u32,
    image_height: u32,
    crop: CropArea,
    detected_edges: Option<Quad>,
    interaction: Interaction,
    view: ViewTransform,
    min_size: f32,
    hit_radius: f32,
    pinch_divisor: f32,
    min_zoom: f32,
    max_zoom: f32,
}

impl CropEditor {
    pub fn new(
        image_width: u32,
        image_height: u32,
        initial: CropArea,
        detected_edges: Option<Quad>,
        fit_scale: f32,
        config: &ScanConfig,
    ) -> Self {
        Self {
            image_width,
            image_height,
            crop: initial.fit_within(image_width, image_height, config.min_crop_size),
            detected_edges,
            interaction: Interaction::Idle,
            view: ViewTransform::new(fit_scale),
            min_size: config.min_crop_size,
            hit_radius: config.corner_hit_radius,
            pinch_divisor: config.pinch_divisor,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
        }
    }

    /// Open the editor on a page's current crop.
    pub fn for_page(page: &ProcessedImage, fit_scale: f32, config: &ScanConfig) -> Self {
        Self::new(
            page.width,
            page.height,
            page.crop_area,
            page.detected_edges,
            fit_scale,
            config,
        )
    }

    // -- Accessors ------------------------------------------------------------

    pub fn crop_area(&self) -> CropArea {
        self.crop
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn view(&self) -> ViewTransform {
        self.view
    }

    pub fn image_size(&self) -> (u32, u32) {
        (self.image_width, self.image_height)
    }

    // -- Hit testing ----------------------------------------------------------

    /// The nearest corner whose handle lies within the hit radius of `point`
    /// (view coordinates).
    pub fn hit_test(&self, point: Point) -> Option<Corner> {
        Corner::ALL
            .iter()
            .map(|corner| {
                let centre = self.view.to_view(corner.position(&self.crop));
                (*corner, centre.distance(point))
            })
            .filter(|(_, distance)| *distance <= self.hit_radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(corner, _)| corner)
    }

    // -- Geometry -------------------------------------------------------------

    /// Move `corner` to `target` (source pixels) and resize accordingly.
    ///
    /// The target is clamped into the image first. The moving corner stops
    /// `min_size` short of the opposite edges. Finally the rectangle is
    /// trimmed to the image without moving its origin.
    pub fn move_corner(&mut self, corner: Corner, target: Point) {
        let (w, h) = (self.image_width as f32, self.image_height as f32);
        let min_w = self.min_size.min(w);
        let min_h = self.min_size.min(h);
        let p = Point::new(target.x.clamp(0.0, w), target.y.clamp(0.0, h));

        let mut crop = self.crop;
        let right = crop.right();
        let bottom = crop.bottom();

        match corner {
            Corner::TopLeft => {
                crop.x = p.x.min(right - min_w);
                crop.y = p.y.min(bottom - min_h);
                crop.width = right - crop.x;
                crop.height = bottom - crop.y;
            }
            Corner::TopRight => {
                crop.y = p.y.min(bottom - min_h);
                crop.height = bottom - crop.y;
                crop.width = (p.x - crop.x).max(min_w);
            }
            Corner::BottomLeft => {
                crop.x = p.x.min(right - min_w);
                crop.width = right - crop.x;
                crop.height = (p.y - crop.y).max(min_h);
            }
            Corner::BottomRight => {
                crop.width = (p.x - crop.x).max(min_w);
                crop.height = (p.y - crop.y).max(min_h);
            }
        }

        crop.width = crop.width.min(w - crop.x);
        crop.height = crop.height.min(h - crop.y);
        self.crop = crop;
    }

    /// Recompute the crop from the detected quad (its bounding box), or the
    /// full image when detection failed. Does not report outward.
    pub fn reset(&mut self) {
        self.crop = match self.detected_edges {
            Some(ref quad) => CropArea::bounding_box(quad).fit_within(
                self.image_width,
                self.image_height,
                self.min_size,
            ),
            None => CropArea::full(self.image_width, self.image_height),
        };
        self.interaction = Interaction::Idle;
        debug!(crop = ?self.crop, "crop reset");
    }

    // -- Pointer / touch ------------------------------------------------------

    /// Pointer down at `point`. Starts a drag when it lands on a handle.
    pub fn begin_drag(&mut self, point: Point) -> bool {
        match self.hit_test(point) {
            Some(corner) => {
                self.interaction = Interaction::Dragging { corner };
                true
            }
            None => {
                self.interaction = Interaction::Idle;
                false
            }
        }
    }

    /// Pointer moved while down.
    pub fn drag_to(&mut self, point: Point) {
        if let Interaction::Dragging { corner } = self.interaction {
            let source = self.view.to_source(point);
            self.move_corner(corner, source);
        }
    }

    pub fn begin_pinch(&mut self, a: Point, b: Point) {
        self.interaction = Interaction::Pinching {
            baseline_distance: a.distance(b),
        };
    }

    /// Scale the view by `1 + delta / divisor`, where `delta` is the change in
    /// finger spread since the previous reading. Zoom stays within bounds.
    pub fn pinch_to(&mut self, a: Point, b: Point) {
        if let Interaction::Pinching { baseline_distance } = self.interaction {
            let distance = a.distance(b);
            let delta = distance - baseline_distance;
            let factor = 1.0 + delta / self.pinch_divisor;
            self.view.zoom = (self.view.zoom * factor).clamp(self.min_zoom, self.max_zoom);
            self.interaction = Interaction::Pinching {
                baseline_distance: distance,
            };
        }
    }

    /// Release all gestures.
    pub fn end_gesture(&mut self) {
        self.interaction = Interaction::Idle;
    }

    /// Touch start with every active touch point.
    pub fn touch_start(&mut self, touches: &[Point]) {
        match touches {
            [single] => {
                self.begin_drag(*single);
            }
            [a, b, ..] => self.begin_pinch(*a, *b),
            [] => self.end_gesture(),
        }
    }

    /// Touch move with every active touch point.
    pub fn touch_move(&mut self, touches: &[Point]) {
        match (self.interaction, touches) {
            (Interaction::Dragging { .. }, [single]) => self.drag_to(*single),
            (Interaction::Pinching { .. }, [a, b, ..]) => self.pinch_to(*a, *b),
            // A second finger landing mid-drag turns it into a pinch.
            (Interaction::Dragging { .. }, [a, b, ..]) => self.begin_pinch(*a, *b),
            _ => {}
        }
    }

    /// Touch end with the touches that remain down. Lifting one finger of a
    /// pinch does not start a drag.
    pub fn touch_end(&mut self, _remaining: &[Point]) {
        self.end_gesture();
    }

    // -- Outcomes -------------------------------------------------------------

    pub fn apply(&self) -> CropOutcome {
        info!(crop = ?self.crop, "crop applied");
        CropOutcome::Apply(self.crop)
    }

    pub fn skip(&self) -> CropOutcome {
        CropOutcome::Skip
    }

    /// The Reset action: hand the decision back to the caller.
    pub fn request_reset(&mut self) -> CropOutcome {
        self.reset();
        CropOutcome::Reset
    }

    /// Enter applies, Escape skips, `r` resets locally.
    pub fn handle_key(&mut self, key: Key) -> Option<CropOutcome> {
        match key {
            Key::Enter => Some(self.apply()),
            Key::Escape => Some(self.skip()),
            k if k.is_char('r') => {
                self.reset();
                None
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: u32 = 800;
    const H: u32 = 600;

    fn editor(crop: CropArea) -> CropEditor {
        CropEditor::new(W, H, crop, None, 1.0, &ScanConfig::default())
    }

    fn assert_invariants(crop: CropArea) {
        assert!(crop.x >= 0.0 && crop.y >= 0.0, "origin out of bounds: {crop:?}");
        assert!(crop.right() <= W as f32 + 1e-3, "right edge out of bounds: {crop:?}");
        assert!(crop.bottom() <= H as f32 + 1e-3, "bottom edge out of bounds: {crop:?}");
        assert!(crop.width >= 50.0 - 1e-3, "too narrow: {crop:?}");
        assert!(crop.height >= 50.0 - 1e-3, "too short: {crop:?}");
    }

    #[test]
    fn top_left_moves_origin_and_shrinks() {
        let mut ed = editor(CropArea::new(100.0, 100.0, 400.0, 300.0));
        ed.move_corner(Corner::TopLeft, Point::new(150.0, 130.0));
        assert_eq!(ed.crop_area(), CropArea::new(150.0, 130.0, 350.0, 270.0));
    }

    #[test]
    fn top_right_adjusts_y_and_width_only() {
        let mut ed = editor(CropArea::new(100.0, 100.0, 400.0, 300.0));
        ed.move_corner(Corner::TopRight, Point::new(600.0, 80.0));
        assert_eq!(ed.crop_area(), CropArea::new(100.0, 80.0, 500.0, 320.0));
    }

    #[test]
    fn bottom_left_adjusts_x_and_height_only() {
        let mut ed = editor(CropArea::new(100.0, 100.0, 400.0, 300.0));
        ed.move_corner(Corner::BottomLeft, Point::new(50.0, 450.0));
        assert_eq!(ed.crop_area(), CropArea::new(50.0, 100.0, 450.0, 350.0));
    }

    #[test]
    fn bottom_right_adjusts_size_only() {
        let mut ed = editor(CropArea::new(100.0, 100.0, 400.0, 300.0));
        ed.move_corner(Corner::BottomRight, Point::new(300.0, 250.0));
        assert_eq!(ed.crop_area(), CropArea::new(100.0, 100.0, 200.0, 150.0));
    }

    #[test]
    fn drag_past_opposite_corner_is_capped_at_minimum() {
        let mut ed = editor(CropArea::new(100.0, 100.0, 400.0, 300.0));
        ed.move_corner(Corner::TopLeft, Point::new(700.0, 590.0));
        assert_eq!(ed.crop_area(), CropArea::new(450.0, 350.0, 50.0, 50.0));

        ed.move_corner(Corner::BottomRight, Point::new(0.0, 0.0));
        assert_eq!(ed.crop_area(), CropArea::new(450.0, 350.0, 50.0, 50.0));
    }

    #[test]
    fn targets_outside_image_are_clamped() {
        let mut ed = editor(CropArea::new(100.0, 100.0, 400.0, 300.0));
        ed.move_corner(Corner::BottomRight, Point::new(5000.0, -40.0));
        assert_eq!(ed.crop_area(), CropArea::new(100.0, 100.0, 700.0, 50.0));
        ed.move_corner(Corner::TopLeft, Point::new(-300.0, -300.0));
        assert_eq!(ed.crop_area(), CropArea::new(0.0, 0.0, 800.0, 150.0));
    }

    #[test]
    fn arbitrary_drag_sequences_keep_invariants() {
        let mut ed = editor(CropArea::full(W, H));
        // Deterministic LCG so failures reproduce.
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = |range: f32| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 33) as f32 / (1u64 << 31) as f32) * range
        };
        for _ in 0..2000 {
            let corner = Corner::ALL[(next(4.0) as usize).min(3)];
            let target = Point::new(next(1200.0) - 200.0, next(1000.0) - 200.0);
            ed.move_corner(corner, target);
            assert_invariants(ed.crop_area());
        }
    }

    #[test]
    fn hit_test_picks_nearest_handle_within_radius() {
        let ed = editor(CropArea::new(100.0, 100.0, 400.0, 300.0));
        assert_eq!(ed.hit_test(Point::new(110.0, 95.0)), Some(Corner::TopLeft));
        assert_eq!(ed.hit_test(Point::new(480.0, 420.0)), Some(Corner::BottomRight));
        assert_eq!(ed.hit_test(Point::new(300.0, 250.0)), None);
        // 44px radius is inclusive, 45 is out.
        assert_eq!(ed.hit_test(Point::new(100.0, 144.0)), Some(Corner::TopLeft));
        assert_eq!(ed.hit_test(Point::new(100.0, 145.0)), None);
    }

    #[test]
    fn hit_test_uses_view_coordinates() {
        let mut ed = CropEditor::new(
            W,
            H,
            CropArea::new(100.0, 100.0, 400.0, 300.0),
            None,
            0.5,
            &ScanConfig::default(),
        );
        // Top-left handle is drawn at (50, 50) when the image is shown at half size.
        assert_eq!(ed.hit_test(Point::new(52.0, 48.0)), Some(Corner::TopLeft));
        assert!(ed.begin_drag(Point::new(50.0, 50.0)));
        ed.drag_to(Point::new(60.0, 70.0));
        assert_eq!(ed.crop_area().x, 120.0);
        assert_eq!(ed.crop_area().y, 140.0);
    }

    #[test]
    fn pinch_changes_zoom_not_crop() {
        let mut ed = editor(CropArea::new(100.0, 100.0, 400.0, 300.0));
        let before = ed.crop_area();
        ed.touch_start(&[Point::new(100.0, 300.0), Point::new(300.0, 300.0)]);
        assert_eq!(ed.interaction(), Interaction::Pinching { baseline_distance: 200.0 });

        // Spread by 250px: 1 + 250/500 = 1.5
        ed.touch_move(&[Point::new(0.0, 300.0), Point::new(450.0, 300.0)]);
        assert!((ed.view().zoom - 1.5).abs() < 1e-5);
        assert_eq!(ed.crop_area(), before);

        // Next delta is measured from the previous reading (450), not the start.
        ed.touch_move(&[Point::new(0.0, 300.0), Point::new(700.0, 300.0)]);
        assert!((ed.view().zoom - 2.25).abs() < 1e-5);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut ed = editor(CropArea::full(W, H));
        ed.begin_pinch(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        ed.pinch_to(Point::new(0.0, 0.0), Point::new(5000.0, 0.0));
        assert_eq!(ed.view().zoom, 3.0);
        ed.pinch_to(Point::new(0.0, 0.0), Point::new(1.0, 0.0));
        assert_eq!(ed.view().zoom, 1.0);
    }

    #[test]
    fn lifting_a_finger_ends_the_pinch() {
        let mut ed = editor(CropArea::full(W, H));
        ed.touch_start(&[Point::new(0.0, 0.0), Point::new(100.0, 0.0)]);
        ed.touch_end(&[Point::new(0.0, 0.0)]);
        assert_eq!(ed.interaction(), Interaction::Idle);
        // A stray move after release changes nothing.
        ed.touch_move(&[Point::new(10.0, 10.0)]);
        assert_eq!(ed.crop_area(), CropArea::full(W, H));
    }

    #[test]
    fn reset_uses_quad_bounding_box() {
        let quad = Quad {
            top_left: Point::new(40.0, 60.0),
            top_right: Point::new(700.0, 30.0),
            bottom_left: Point::new(55.0, 560.0),
            bottom_right: Point::new(720.0, 540.0),
        };
        let mut ed = CropEditor::new(
            W,
            H,
            CropArea::new(200.0, 200.0, 100.0, 100.0),
            Some(quad),
            1.0,
            &ScanConfig::default(),
        );
        ed.reset();
        assert_eq!(ed.crop_area(), CropArea::new(40.0, 30.0, 680.0, 530.0));
    }

    #[test]
    fn reset_without_quad_is_full_image() {
        let mut ed = editor(CropArea::new(200.0, 200.0, 100.0, 100.0));
        assert_eq!(ed.handle_key(Key::Char('R')), None);
        assert_eq!(ed.crop_area(), CropArea::full(W, H));
    }

    #[test]
    fn keyboard_outcomes() {
        let crop = CropArea::new(10.0, 20.0, 300.0, 200.0);
        let mut ed = editor(crop);
        assert_eq!(ed.handle_key(Key::Enter), Some(CropOutcome::Apply(crop)));
        assert_eq!(ed.handle_key(Key::Escape), Some(CropOutcome::Skip));
        assert_eq!(ed.handle_key(Key::Char('x')), None);
    }

    #[test]
    fn reset_action_reports_outward() {
        let mut ed = editor(CropArea::new(200.0, 200.0, 100.0, 100.0));
        assert_eq!(ed.request_reset(), CropOutcome::Reset);
        assert_eq!(ed.crop_area(), CropArea::full(W, H));
    }
}
