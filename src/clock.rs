/// Animation clock advanced once per rendered frame.
///
/// `frame` increases by a fixed step per tick so the pure motion functions
/// pace identically regardless of frame rate.  `sway` and `drift` integrate
/// a wall-clock-derived delta every tick for the secondary out-of-phase
/// motions; their paths depend on frame-rate history by design, and only
/// the outer-ring node consumes them.
#[derive(Debug, Clone, Default)]
pub struct AnimationClock {
    frame: f32,
    sway: f32,
    drift: f32,
}

/// Immutable snapshot of the clock handed to motion functions.  Every
/// animated transform is a pure function of a sample plus per-node
/// constants.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClockSample {
    pub frame: f32,
    pub sway: f32,
    pub drift: f32,
}

impl AnimationClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the clock by one frame.  `now_seconds` is the wall-clock
    /// time used by the integrated accumulators; feeding a fixed sequence
    /// (e.g. `k / 60.0`) makes the clock fully deterministic.
    pub fn advance(&mut self, now_seconds: f64) {
        self.frame += 1.0;
        let now = now_seconds as f32;
        self.sway += now.sin() / 10.0;
        self.drift -= now.cos() / 10.0;
    }

    /// Returns the current sample without advancing.
    pub fn sample(&self) -> ClockSample {
        ClockSample {
            frame: self.frame,
            sway: self.sway,
            drift: self.drift,
        }
    }

    pub fn frame(&self) -> f32 {
        self.frame
    }

    /// Zeroes the frame counter and both accumulators.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn run(clock: &mut AnimationClock, ticks: u32) {
        for k in 0..ticks {
            clock.advance(k as f64 / 60.0);
        }
    }

    #[test]
    fn frame_counter_uses_fixed_steps() {
        let mut clock = AnimationClock::new();
        run(&mut clock, 90);
        assert_eq!(clock.frame(), 90.0);
    }

    #[test]
    fn same_input_sequence_reproduces_the_same_state() {
        let mut a = AnimationClock::new();
        let mut b = AnimationClock::new();
        run(&mut a, 240);
        run(&mut b, 240);
        assert_eq!(a.sample(), b.sample());
    }

    #[test]
    fn accumulators_integrate_the_supplied_time() {
        let mut clock = AnimationClock::new();
        clock.advance(0.0);
        // sin(0)/10 = 0, -cos(0)/10 = -0.1
        assert_abs_diff_eq!(clock.sample().sway, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(clock.sample().drift, -0.1, epsilon = 1e-6);

        clock.advance(std::f64::consts::FRAC_PI_2);
        assert_abs_diff_eq!(clock.sample().sway, 0.1, epsilon = 1e-6);
        assert_abs_diff_eq!(clock.sample().drift, -0.1, epsilon = 1e-6);
    }

    #[test]
    fn reset_zeroes_everything() {
        let mut clock = AnimationClock::new();
        run(&mut clock, 30);
        assert_ne!(clock.sample(), ClockSample::default());
        clock.reset();
        assert_eq!(clock.sample(), ClockSample::default());
    }
}
