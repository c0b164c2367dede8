/// Accumulator that turns variable frame deltas into a fixed number of
/// steps. Used for the physics step, the sync cadence and reconnect backoff.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    dt: f32,
    max_frame: f32,
    accumulator: f32,
}

impl FixedTimestep {
    /// `tick_rate` steps per second. A single frame may contribute at most
    /// a quarter second, so a stalled frame does not cause a step storm.
    pub fn new(tick_rate: u32) -> Self {
        let dt = 1.0 / tick_rate.max(1) as f32;
        Self {
            dt,
            max_frame: 0.25_f32.max(dt),
            accumulator: 0.0,
        }
    }

    /// One step every `interval` seconds.
    pub fn with_interval(interval: f32) -> Self {
        Self {
            dt: interval,
            max_frame: interval,
            accumulator: 0.0,
        }
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn accumulate(&mut self, delta: f32) {
        self.accumulator += delta.clamp(0.0, self.max_frame);
    }

    pub fn should_tick(&self) -> bool {
        self.accumulator >= self.dt
    }

    pub fn consume_tick(&mut self) -> bool {
        if self.accumulator >= self.dt {
            self.accumulator -= self.dt;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_timestep_accumulation() {
        let mut ts = FixedTimestep::new(60);

        ts.accumulate(1.0 / 30.0);
        assert!(ts.should_tick());
        assert!(ts.consume_tick());
        assert!(ts.consume_tick());
        assert!(!ts.consume_tick());
    }

    #[test]
    fn long_frames_are_clamped() {
        let mut ts = FixedTimestep::new(8);
        ts.accumulate(10.0);

        let mut steps = 0;
        while ts.consume_tick() {
            steps += 1;
        }
        assert_eq!(steps, 2);
    }

    #[test]
    fn interval_fires_once_per_period() {
        let mut ts = FixedTimestep::with_interval(2.0);
        ts.accumulate(1.5);
        assert!(!ts.consume_tick());
        ts.accumulate(0.5);
        assert!(ts.consume_tick());
        assert!(!ts.consume_tick());
    }
}
