use rand::prelude::*;
use serde::Deserialize;

use crate::easing::{tween, Easing};

const TWO_PI: f32 = 2.0 * std::f32::consts::PI;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

/// Center plus semi-axis radii (`w`/`h` are radii, not a bounding size).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Ellipse {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// One animated ring of the tunnel. Only `p` is authoritative; the ellipse
/// fields are re-derived from it by `Engine::tween_disc` every frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Disc {
    pub p: f32,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// Segment from the outer boundary (`p0`) to the inner boundary (`p1`) at a
/// shared angle, with `l = p1 - p0` precomputed for particle placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadialLine {
    pub p0: Vec2,
    pub p1: Vec2,
    pub l: Vec2,
}

/// A trail sliding along one radial line. `line_index` is an index into the
/// current frame's line list (lines are regenerated each frame, so the index
/// is the only stable handle). `v`, `l` and `a` are fixed at spawn time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub line_index: usize,
    pub p: f32,
    pub v: f32,
    pub l: f32,
    pub a: f32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Parameters {
    pub disc_count: usize,
    pub line_count: usize,
    pub particle_count: usize,
    pub disc_step: f32,
    pub angle_drift: f32,
    pub focal_width: f32,
    pub focal_height: f32,
    pub ease_x: Easing,
    pub ease_y: Easing,
    pub ease_w: Easing,
    pub ease_h: Easing,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            disc_count: 20,
            line_count: 100,
            particle_count: 500,
            disc_step: 0.001,
            angle_drift: 0.0001,
            focal_width: 150.0,
            focal_height: 150.0,
            ease_x: Easing::Linear,
            ease_y: Easing::InExpo,
            ease_w: Easing::OutCubic,
            ease_h: Easing::OutCubic,
        }
    }
}

/// The whole animation state: boundary geometry plus the disc, line and
/// particle collections. All mutation goes through `resize` and `step`;
/// drawing only reads.
pub struct Engine {
    pub parameters: Parameters,
    pub width: f32,
    pub height: f32,
    pub start_disc: Ellipse,
    pub end_disc: Ellipse,
    pub discs: Vec<Disc>,
    pub lines: Vec<RadialLine>,
    pub particles: Vec<Particle>,
}

impl Engine {
    pub fn new(parameters: Parameters, width: f32, height: f32) -> Self {
        let mut engine = Engine {
            parameters,
            width: 0.0,
            height: 0.0,
            start_disc: Ellipse::default(),
            end_disc: Ellipse::default(),
            discs: Vec::new(),
            lines: Vec::new(),
            particles: Vec::new(),
        };
        engine.resize(width, height, 0.0);
        engine
    }

    /// A zero-size surface or focal rect produces no drawable geometry;
    /// frames are skipped until a usable resize arrives.
    pub fn is_ready(&self) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.parameters.focal_width > 0.0
            && self.parameters.focal_height > 0.0
    }

    /// Rebuilds everything from scratch for a new surface size: boundary
    /// discs, the disc ring, the line list and the full particle pool.
    /// Recreating particles (rather than patching them) keeps every
    /// `line_index` valid against the regenerated line list.
    pub fn resize(&mut self, width: f32, height: f32, time_ms: f32) {
        self.width = width;
        self.height = height;

        self.set_boundary_discs();
        self.set_discs();
        self.set_lines(time_ms);
        self.set_particles();
    }

    /// One animation frame: advance discs and particles, then regenerate the
    /// lines for the current wall-clock time.
    pub fn step(&mut self, time_ms: f32) {
        if !self.is_ready() {
            return;
        }

        self.move_discs();
        self.move_particles();
        self.set_lines(time_ms);
    }

    fn set_boundary_discs(&mut self) {
        let center = Vec2 {
            x: self.width * 0.5,
            y: self.height * 0.5,
        };
        let diag = self.width.hypot(self.height);

        self.start_disc = Ellipse {
            x: center.x,
            y: center.y,
            w: diag * 0.5,
            h: diag * 0.5,
        };

        self.end_disc = Ellipse {
            x: center.x,
            y: center.y,
            w: self.parameters.focal_width * 0.5,
            h: self.parameters.focal_height * 0.5,
        };
    }

    fn set_discs(&mut self) {
        let total = self.parameters.disc_count;

        self.discs.clear();
        for i in 0..total {
            let mut disc = Disc {
                p: i as f32 / total as f32,
                ..Disc::default()
            };
            self.tween_disc(&mut disc);
            self.discs.push(disc);
        }
    }

    /// Regenerates the full line list. Pure in (boundary discs, `time_ms`):
    /// the same inputs always yield the same geometry.
    pub fn set_lines(&mut self, time_ms: f32) {
        let total = self.parameters.line_count;
        let line_angle = TWO_PI / total as f32;
        let center = Vec2 {
            x: self.start_disc.x,
            y: self.start_disc.y,
        };

        self.lines.clear();
        for i in 0..total {
            let angle = (i as f32 * line_angle + time_ms * self.parameters.angle_drift) % TWO_PI;

            let p0 = Vec2 {
                x: center.x + angle.cos() * self.start_disc.w,
                y: center.y + angle.sin() * self.start_disc.h,
            };
            let p1 = Vec2 {
                x: center.x + angle.cos() * self.end_disc.w,
                y: center.y + angle.sin() * self.end_disc.h,
            };
            let l = Vec2 {
                x: p1.x - p0.x,
                y: p1.y - p0.y,
            };

            self.lines.push(RadialLine { p0, p1, l });
        }
    }

    fn set_particles(&mut self) {
        self.particles.clear();
        for _ in 0..self.parameters.particle_count {
            let particle = self.spawn_particle();
            self.particles.push(particle);
        }
    }

    /// New particle on a random line, already mid-flight. Speed, trail
    /// length and opacity are fixed for the particle's lifetime.
    pub fn spawn_particle(&self) -> Particle {
        let line_index = (random::<f32>() * self.parameters.line_count as f32) as usize;

        Particle {
            line_index,
            p: random::<f32>(),
            v: 0.005 + random::<f32>() * 0.005,
            l: 0.01 + random::<f32>() * 0.1,
            a: 0.05 + random::<f32>() * 0.15,
        }
    }

    pub fn move_discs(&mut self) {
        let step = self.parameters.disc_step;

        for i in 0..self.discs.len() {
            let mut disc = self.discs[i];
            disc.p = (disc.p + step) % 1.0;
            self.tween_disc(&mut disc);
            self.discs[i] = disc;
        }
    }

    pub fn move_particles(&mut self) {
        for particle in self.particles.iter_mut() {
            if particle.p < 1.0 {
                particle.p += particle.v;
            } else {
                particle.p = 0.0;
            }
        }
    }

    /// Derives a disc's ellipse from its progress. Each axis is eased
    /// independently (y accelerates, radii decelerate) which produces the
    /// pull-toward-a-point look.
    pub fn tween_disc(&self, disc: &mut Disc) {
        let start = &self.start_disc;
        let end = &self.end_disc;
        let e = &self.parameters;

        disc.x = tween(start.x, end.x, disc.p, e.ease_x);
        disc.y = tween(start.y, end.y, disc.p, e.ease_y);
        disc.w = tween(start.w, end.w, disc.p, e.ease_w);
        disc.h = tween(start.h, end.h, disc.p, e.ease_h);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_engine() -> Engine {
        let parameters = Parameters {
            focal_width: 100.0,
            focal_height: 60.0,
            ..Parameters::default()
        };
        Engine::new(parameters, 800.0, 600.0)
    }

    #[test]
    fn boundary_discs_from_surface_and_focal_rect() {
        let engine = test_engine();

        // hypot(800, 600) / 2
        assert_eq!(engine.start_disc.w, 500.0);
        assert_eq!(engine.start_disc.h, 500.0);
        assert_eq!(engine.start_disc.x, 400.0);
        assert_eq!(engine.start_disc.y, 300.0);

        assert_eq!(engine.end_disc.w, 50.0);
        assert_eq!(engine.end_disc.h, 30.0);
    }

    #[test]
    fn collection_counts_are_fixed() {
        let engine = test_engine();
        assert_eq!(engine.discs.len(), 20);
        assert_eq!(engine.lines.len(), 100);
        assert_eq!(engine.particles.len(), 500);

        let mut engine = engine;
        for frame in 0..50 {
            engine.step(frame as f32 * 16.0);
        }
        assert_eq!(engine.discs.len(), 20);
        assert_eq!(engine.lines.len(), 100);
        assert_eq!(engine.particles.len(), 500);
    }

    #[test]
    fn disc_progress_wraps_modulo_one() {
        let mut engine = test_engine();
        engine.discs[0].p = 0.9995;
        let before: Vec<f32> = engine.discs.iter().map(|d| d.p).collect();

        engine.move_discs();

        for (disc, p) in engine.discs.iter().zip(before) {
            let expected = (p + 0.001) % 1.0;
            assert!((disc.p - expected).abs() < 1e-6);
            assert!(disc.p < 1.0);
        }
    }

    #[test]
    fn tween_endpoints_match_boundary_discs() {
        let engine = test_engine();

        let mut disc = Disc {
            p: 0.0,
            ..Disc::default()
        };
        engine.tween_disc(&mut disc);
        assert_eq!(disc.x, engine.start_disc.x);
        assert_eq!(disc.y, engine.start_disc.y);
        assert_eq!(disc.w, 500.0);
        assert_eq!(disc.h, 500.0);

        disc.p = 1.0;
        engine.tween_disc(&mut disc);
        assert_eq!(disc.x, engine.end_disc.x);
        assert_eq!(disc.y, engine.end_disc.y);
        assert_eq!(disc.w, 50.0);
        assert_eq!(disc.h, 30.0);
    }

    #[test]
    fn line_zero_at_time_zero_lies_on_x_axis() {
        let mut engine = test_engine();
        engine.set_lines(0.0);

        let line = &engine.lines[0];
        assert!((line.p0.x - (400.0 + 500.0)).abs() < 1e-3);
        assert!((line.p0.y - 300.0).abs() < 1e-3);
        assert!((line.p1.x - (400.0 + 50.0)).abs() < 1e-3);
        assert!((line.p1.y - 300.0).abs() < 1e-3);
        assert!((line.l.x - (line.p1.x - line.p0.x)).abs() < 1e-6);
    }

    #[test]
    fn line_generation_is_pure_in_time() {
        let mut engine = test_engine();

        engine.set_lines(1234.5);
        let first = engine.lines.clone();
        engine.set_lines(1234.5);
        assert_eq!(engine.lines, first);

        engine.set_lines(1250.5);
        assert_ne!(engine.lines, first);
    }

    #[test]
    fn lines_rotate_with_wall_clock_time() {
        let mut engine = test_engine();

        engine.set_lines(1000.0);
        let angle = (engine.lines[0].p0.y - 300.0).atan2(engine.lines[0].p0.x - 400.0);
        // angle_drift is 0.0001 rad/ms
        assert!((angle - 0.1).abs() < 1e-4);
    }

    #[test]
    fn particle_advances_then_resets_in_place() {
        let mut engine = test_engine();
        engine.particles[0] = Particle {
            line_index: 42,
            p: 0.5,
            v: 0.01,
            l: 0.05,
            a: 0.1,
        };

        engine.move_particles();
        assert!((engine.particles[0].p - 0.51).abs() < 1e-6);

        // Run it past the end of its line; the step after p >= 1 snaps the
        // position back to 0 and leaves every other field alone.
        while engine.particles[0].p < 1.0 {
            engine.move_particles();
        }
        engine.move_particles();

        let particle = engine.particles[0];
        assert_eq!(particle.p, 0.0);
        assert_eq!(particle.line_index, 42);
        assert_eq!(particle.v, 0.01);
        assert_eq!(particle.l, 0.05);
        assert_eq!(particle.a, 0.1);
    }

    #[test]
    fn spawned_particles_are_in_range() {
        let engine = test_engine();
        for particle in engine.particles.iter() {
            assert!(particle.line_index < engine.parameters.line_count);
            assert!(particle.p >= 0.0 && particle.p < 1.0);
            assert!(particle.v >= 0.005 && particle.v < 0.01);
            assert!(particle.l >= 0.01 && particle.l < 0.11);
            assert!(particle.a >= 0.05 && particle.a < 0.2);
        }
    }

    #[test]
    fn zero_size_surface_is_not_ready() {
        let engine = Engine::new(Parameters::default(), 0.0, 0.0);
        assert!(!engine.is_ready());

        let mut engine = engine;
        engine.step(16.0);
        // A not-ready engine must not produce NaN geometry.
        assert!(engine.discs.iter().all(|d| d.w.is_finite()));
    }

    #[test]
    fn resize_rebuilds_all_collections() {
        let mut engine = test_engine();
        for frame in 0..10 {
            engine.step(frame as f32 * 16.0);
        }

        engine.resize(400.0, 300.0, 160.0);

        assert_eq!(engine.start_disc.w, 250.0);
        assert_eq!(engine.discs.len(), 20);
        assert_eq!(engine.lines.len(), 100);
        assert_eq!(engine.particles.len(), 500);
        // Discs are reseeded evenly over [0, 1).
        assert_eq!(engine.discs[0].p, 0.0);
        assert_eq!(engine.discs[10].p, 0.5);
    }

    #[test]
    fn disc_seed_progress_is_evenly_spaced() {
        let engine = test_engine();
        for (i, disc) in engine.discs.iter().enumerate() {
            assert_eq!(disc.p, i as f32 / 20.0);
        }
    }
}
