use glam::Vec3;

/// Quadratic ease-in/ease-out over `t` in `[0, 1]`.
pub fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}

/// Moves a point back and forth between two endpoints with eased timing.
///
/// Each window of `duration` seconds runs one leg; odd windows run the leg
/// in reverse, so the point ping-pongs for as long as the driver is active.
#[derive(Debug, Clone)]
pub struct AnimationDriver {
    from: Vec3,
    to: Vec3,
    duration: f32,
    start_time: Option<f32>,
}

impl AnimationDriver {
    pub fn new(from: Vec3, to: Vec3, duration: f32) -> Self {
        Self {
            from,
            to,
            duration,
            start_time: None,
        }
    }

    pub fn from(&self) -> Vec3 {
        self.from
    }

    pub fn to(&self) -> Vec3 {
        self.to
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn is_active(&self) -> bool {
        self.start_time.is_some()
    }

    /// Starts the animation at `now`. Does nothing if it is already running.
    pub fn trigger(&mut self, now: f32) {
        if self.start_time.is_none() {
            log::debug!("target animation started at {:.3}s", now);
            self.start_time = Some(now);
        }
    }

    pub fn stop(&mut self) {
        self.start_time = None;
    }

    /// Whether the leg running at `elapsed` goes from `from` to `to`.
    pub fn is_forward_at(&self, elapsed: f32) -> bool {
        if self.duration <= 0.0 {
            return true;
        }
        ((elapsed.max(0.0) / self.duration).floor() as u64) % 2 == 0
    }

    /// Position `elapsed` seconds after the animation started.
    pub fn position_at(&self, elapsed: f32) -> Vec3 {
        if self.duration <= 0.0 {
            return self.to;
        }

        let elapsed = elapsed.max(0.0);
        let t = (elapsed % self.duration) / self.duration;
        let eased = ease_in_out(t);

        if self.is_forward_at(elapsed) {
            self.from.lerp(self.to, eased)
        } else {
            self.to.lerp(self.from, eased)
        }
    }

    /// Target position for the frame at `now`, or `None` while inactive.
    pub fn update(&self, now: f32) -> Option<Vec3> {
        self.start_time
            .map(|start| self.position_at(now - start))
    }
}
