use glam::Vec3;
use std::f32::consts::PI;

/// Frequency (Hz), damping ratio and initial response of a spring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringParams {
    pub frequency: f32,
    pub damping: f32,
    pub response: f32,
}

impl SpringParams {
    pub const fn new(frequency: f32, damping: f32, response: f32) -> Self {
        Self {
            frequency,
            damping,
            response,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpringPreset {
    Snappy,
    #[default]
    Smooth,
    Bouncy,
    Sluggish,
}

impl SpringPreset {
    pub const ALL: [SpringPreset; 4] = [
        SpringPreset::Snappy,
        SpringPreset::Smooth,
        SpringPreset::Bouncy,
        SpringPreset::Sluggish,
    ];

    pub fn params(self) -> SpringParams {
        match self {
            SpringPreset::Snappy => SpringParams::new(4.0, 0.5, 2.0),
            SpringPreset::Smooth => SpringParams::new(2.0, 1.0, 0.0),
            SpringPreset::Bouncy => SpringParams::new(3.0, 0.3, 1.0),
            SpringPreset::Sluggish => SpringParams::new(1.0, 1.5, 0.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SpringPreset::Snappy => "Snappy",
            SpringPreset::Smooth => "Smooth",
            SpringPreset::Bouncy => "Bouncy",
            SpringPreset::Sluggish => "Sluggish",
        }
    }
}

/// Second-order system `y + k1 y' + k2 y'' = x + k3 x'`, integrated with
/// semi-implicit Euler and a `k2` clamped for stability at large steps.
#[derive(Debug, Clone, Copy)]
pub struct SecondOrderDynamics {
    position: Vec3,
    velocity: Vec3,
    previous_input: Vec3,
    k1: f32,
    k2: f32,
    k3: f32,
}

impl SecondOrderDynamics {
    pub fn new(params: SpringParams, initial: Vec3) -> Self {
        let (k1, k2, k3) = constants(params);
        Self {
            position: initial,
            velocity: Vec3::ZERO,
            previous_input: initial,
            k1,
            k2,
            k3,
        }
    }

    pub fn from_preset(preset: SpringPreset, initial: Vec3) -> Self {
        Self::new(preset.params(), initial)
    }

    pub fn set_params(&mut self, params: SpringParams) {
        (self.k1, self.k2, self.k3) = constants(params);
    }

    /// Puts the system at rest at `position`, with `input` as the last input seen.
    pub fn reset(&mut self, position: Vec3, input: Vec3) {
        self.position = position;
        self.velocity = Vec3::ZERO;
        self.previous_input = input;
    }

    pub fn update(&mut self, input: Vec3, dt: f32) -> Vec3 {
        if dt <= 0.0 {
            return self.position;
        }

        let input_velocity = (input - self.previous_input) / dt;
        self.previous_input = input;

        let k2 = self
            .k2
            .max(dt * dt / 2.0 + dt * self.k1 / 2.0)
            .max(dt * self.k1);

        self.position += self.velocity * dt;
        let accel = (input + self.k3 * input_velocity - self.position - self.k1 * self.velocity) / k2;
        self.velocity += accel * dt;

        self.position
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }
}

fn constants(params: SpringParams) -> (f32, f32, f32) {
    let SpringParams {
        frequency: f,
        damping: z,
        response: r,
    } = params;
    let w = 2.0 * PI * f;
    (z / (PI * f), 1.0 / (w * w), r * z / (PI * f))
}

/// Pulls a point toward a fixed goal until it comes within `settle_radius`.
#[derive(Debug, Clone)]
pub struct SpringTarget {
    goal: Vec3,
    settle_radius: f32,
    dynamics: SecondOrderDynamics,
}

impl SpringTarget {
    pub fn new(goal: Vec3, settle_radius: f32, preset: SpringPreset) -> Self {
        Self {
            goal,
            settle_radius,
            dynamics: SecondOrderDynamics::from_preset(preset, goal),
        }
    }

    pub fn goal(&self) -> Vec3 {
        self.goal
    }

    pub fn settle_radius(&self) -> f32 {
        self.settle_radius
    }

    pub fn set_preset(&mut self, preset: SpringPreset) {
        self.dynamics.set_params(preset.params());
    }

    /// Starts pulling from `from` at rest.
    pub fn engage(&mut self, from: Vec3) {
        self.dynamics.reset(from, self.goal);
    }

    pub fn is_settled(&self, point: Vec3) -> bool {
        point.distance(self.goal) <= self.settle_radius
    }

    /// Next position for a point currently at `current`. Once settled the
    /// point is left where it is.
    pub fn update(&mut self, current: Vec3, dt: f32) -> Vec3 {
        if self.is_settled(current) {
            return current;
        }
        self.dynamics.update(self.goal, dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOAL: Vec3 = Vec3::new(1.732, 1.0, 0.0);

    fn run(target: &mut SpringTarget, from: Vec3, steps: usize) -> Vec3 {
        target.engage(from);
        let mut point = from;
        for _ in 0..steps {
            point = target.update(point, 1.0 / 60.0);
        }
        point
    }

    #[test]
    fn smooth_spring_settles_near_goal() {
        let mut target = SpringTarget::new(GOAL, 0.1, SpringPreset::Smooth);
        let end = run(&mut target, Vec3::new(-0.5, -0.5, 0.0), 600);

        assert!(target.is_settled(end));
        assert!(end.is_finite());
    }

    #[test]
    fn settled_point_stays_put() {
        let mut target = SpringTarget::new(GOAL, 0.1, SpringPreset::Bouncy);
        let near = GOAL + Vec3::new(0.05, 0.0, 0.0);
        target.engage(near);

        assert_eq!(target.update(near, 1.0 / 60.0), near);
    }

    #[test]
    fn every_preset_reaches_the_goal() {
        for preset in SpringPreset::ALL {
            let mut target = SpringTarget::new(GOAL, 0.1, preset);
            let end = run(&mut target, Vec3::ZERO, 1200);
            assert!(
                end.distance(GOAL) <= 0.1 + 1e-4,
                "{} ended at {:?}",
                preset.label(),
                end
            );
        }
    }

    #[test]
    fn critically_damped_spring_does_not_overshoot() {
        let mut dynamics = SecondOrderDynamics::from_preset(SpringPreset::Smooth, Vec3::ZERO);
        let mut furthest: f32 = 0.0;
        for _ in 0..600 {
            furthest = furthest.max(dynamics.update(Vec3::X, 1.0 / 60.0).x);
        }
        assert!(furthest <= 1.0 + 1e-3);
        assert!((dynamics.position().x - 1.0).abs() < 1e-3);
    }

    #[test]
    fn zero_dt_holds_position() {
        let mut dynamics = SecondOrderDynamics::from_preset(SpringPreset::Snappy, Vec3::ONE);
        assert_eq!(dynamics.update(Vec3::ZERO, 0.0), Vec3::ONE);
        assert_eq!(dynamics.velocity(), Vec3::ZERO);
    }
}
