use crate::config::PathProfile;
use crate::constants::{PATH_LINE_WIDTH, PATH_STROKE, POINT_JITTER_MAX, POINT_JITTER_MIN};
use crate::random::rand_range;
use crate::surface::{DrawingSurface, StrokeStyle};
use glam::Vec2;
use rand::Rng;

const PATH_STYLE: StrokeStyle = StrokeStyle {
    color: PATH_STROKE,
    line_width: PATH_LINE_WIDTH,
    line_join: None,
};

/// One horizontal band: a jittered polyline scrolling to the left.
///
/// The point sequence is a sliding window. Points that have scrolled off the
/// left edge are dropped from the front and fresh points are appended just
/// beyond the right edge, so its length stays near the initial point count.
#[derive(Clone, Debug)]
pub struct Path {
    canvas_width: f32,
    canvas_height: f32,
    y_center: f32,
    y_range: f32,
    scroll_speed: f32,
    step_width: f32,
    points: Vec<Vec2>,
}

impl Path {
    pub fn new<R: Rng + ?Sized>(
        canvas_width: f32,
        canvas_height: f32,
        profile: PathProfile,
        rng: &mut R,
    ) -> Self {
        let count = initial_point_count(canvas_width, profile.density);
        let step_width = (canvas_width / count as f32).floor();
        let mut path = Self {
            canvas_width,
            canvas_height,
            y_center: profile.y_center,
            y_range: profile.y_range,
            scroll_speed: profile.scroll_speed.max(0.0),
            step_width,
            points: Vec::with_capacity(count + 2),
        };

        let y = path.create_y(rng);
        path.points.push(Vec2::new(0.0, y));
        for i in 1..count {
            let x = (i as f32 + rand_range(rng, POINT_JITTER_MIN, POINT_JITTER_MAX)) * step_width;
            let y = path.create_y(rng);
            path.points.push(Vec2::new(x, y));
        }
        path.add_point(rng);
        path
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn scroll_speed(&self) -> f32 {
        self.scroll_speed
    }

    pub fn step_width(&self) -> f32 {
        self.step_width
    }

    pub fn canvas_width(&self) -> f32 {
        self.canvas_width
    }

    /// One fixed-step frame: scroll, recycle, then stroke.
    pub fn advance_and_render<R, S>(&mut self, surface: &mut S, rng: &mut R)
    where
        R: Rng + ?Sized,
        S: DrawingSurface + ?Sized,
    {
        self.advance(1.0, rng);
        self.render(surface);
    }

    /// Scroll by `scroll_speed * scale`, drop points whose successor has
    /// left the canvas and append points until the tail is past the right
    /// edge.
    pub fn advance<R: Rng + ?Sized>(&mut self, scale: f32, rng: &mut R) {
        let dx = self.scroll_speed * scale;
        for p in &mut self.points {
            p.x -= dx;
        }

        while self.points.len() > 2 && self.points[1].x < 0.0 {
            self.points.remove(0);
        }

        while self
            .points
            .last()
            .map_or(true, |p| p.x < self.canvas_width)
        {
            self.add_point(rng);
        }
    }

    pub fn render<S: DrawingSurface + ?Sized>(&self, surface: &mut S) {
        surface.stroke_polyline(&self.points, &PATH_STYLE);
    }

    fn add_point<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let x = self.canvas_width
            + rand_range(rng, POINT_JITTER_MIN, POINT_JITTER_MAX) * self.step_width;
        let y = self.create_y(rng);
        self.points.push(Vec2::new(x, y));
    }

    fn create_y<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        self.canvas_height * self.y_center * (1.0 + self.y_range * rand_range(rng, -1.0, 1.0))
    }
}

/// `floor(width * density) + 1`.
#[inline]
pub fn initial_point_count(canvas_width: f32, density: f32) -> usize {
    (canvas_width * density).floor().max(0.0) as usize + 1
}
