use log::info;

use crate::camera::OrbitCamera;
use crate::clock::{AnimationClock, ClockSample};
use crate::model::{demo_library, DemoModels, ModelLibrary};
use crate::scene::{demo_scene, traverse, DrawCall, SceneNode};

/// The whole demo behind the window: model library, scene tree, clock and
/// camera.  Owns every piece of per-frame mutable state, all of it touched
/// only from the rendering thread.
pub struct Demo {
    library: ModelLibrary,
    models: DemoModels,
    scene: SceneNode,
    clock: AnimationClock,
    pub camera: OrbitCamera,
    animating: bool,
}

impl Default for Demo {
    fn default() -> Self {
        Self::new()
    }
}

impl Demo {
    /// Builds the model library and scene.  Starts paused; a redraw while
    /// paused always shows frame zero.
    pub fn new() -> Self {
        let (library, models) = demo_library();
        let scene = demo_scene(&models);
        Self {
            library,
            models,
            scene,
            clock: AnimationClock::new(),
            camera: OrbitCamera::new(),
            animating: false,
        }
    }

    pub fn library(&self) -> &ModelLibrary {
        &self.library
    }

    pub fn models(&self) -> DemoModels {
        self.models
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    /// Starts or stops the animation.  Stopping leaves the clock where it
    /// is, so resuming continues from the paused value.
    pub fn set_animating(&mut self, run: bool) {
        if run != self.animating {
            self.animating = run;
            info!(
                "animation {} at frame {}",
                if run { "started" } else { "stopped" },
                self.clock.frame()
            );
        }
    }

    /// One scheduled frame: advances the clock and traverses the scene.
    /// Returns `None` while paused — a paused demo issues no draw calls.
    pub fn tick(&mut self, now_seconds: f64) -> Option<Vec<DrawCall>> {
        if !self.animating {
            return None;
        }
        self.clock.advance(now_seconds);
        Some(self.redraw())
    }

    /// Traverses at the current clock value without advancing, for manual
    /// redraws while paused (camera interaction, resize).
    pub fn redraw(&self) -> Vec<DrawCall> {
        traverse(&self.scene, &self.library, &self.clock.sample())
    }

    /// Restores the default view and zeroes the clock and both drift
    /// accumulators in one step, then pauses.  Partial resets would make
    /// the scene visibly jump.
    pub fn reset(&mut self) {
        self.camera.reset();
        self.clock.reset();
        self.animating = false;
        info!("demo reset to defaults");
    }

    pub fn sample(&self) -> ClockSample {
        self.clock.sample()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(demo: &mut Demo, ticks: u32) -> usize {
        let mut draws = 0;
        for k in 0..ticks {
            if demo.tick(k as f64 / 60.0).is_some() {
                draws += 1;
            }
        }
        draws
    }

    #[test]
    fn paused_demo_issues_no_draw_calls() {
        let mut demo = Demo::new();
        assert_eq!(run(&mut demo, 10), 0);
        assert_eq!(demo.sample().frame, 0.0);
    }

    #[test]
    fn stopping_freezes_the_clock_and_resuming_continues_from_it() {
        let mut demo = Demo::new();
        demo.set_animating(true);
        run(&mut demo, 30);
        assert_eq!(demo.sample().frame, 30.0);

        demo.set_animating(false);
        assert_eq!(run(&mut demo, 60), 0);
        assert_eq!(demo.sample().frame, 30.0);

        demo.set_animating(true);
        run(&mut demo, 1);
        assert_eq!(demo.sample().frame, 31.0);
    }

    #[test]
    fn reset_restores_camera_clock_and_accumulators_together() {
        let mut demo = Demo::new();
        demo.set_animating(true);
        run(&mut demo, 120);
        demo.camera.drag(80.0, -30.0);
        demo.camera.zoom(4.0);

        let sample = demo.sample();
        assert!(sample.frame > 0.0);
        assert!(sample.drift != 0.0);

        demo.reset();
        assert_eq!(demo.camera, OrbitCamera::default());
        assert_eq!(demo.sample(), ClockSample::default());
        assert!(!demo.is_animating());
    }

    #[test]
    fn manual_redraw_does_not_advance_the_clock() {
        let mut demo = Demo::new();
        demo.set_animating(true);
        run(&mut demo, 5);
        demo.set_animating(false);

        let before = demo.sample();
        let a = demo.redraw();
        let b = demo.redraw();
        assert_eq!(demo.sample(), before);
        assert_eq!(a, b);
        assert_eq!(a.len(), 13);
    }
}
