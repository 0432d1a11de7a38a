use glam::{Mat4, Vec2, Vec3, Vec4};
use std::f32::consts::{FRAC_PI_2, PI};

/// Ray with a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Hit point on the plane `dot(normal, p) = offset`, if it lies ahead.
    pub fn intersect_plane(&self, normal: Vec3, offset: f32) -> Option<Vec3> {
        let denom = self.direction.dot(normal);
        if denom.abs() <= 1e-4 {
            return None;
        }
        let t = (offset - self.origin.dot(normal)) / denom;
        (t >= 0.0).then(|| self.origin + self.direction * t)
    }
}

/// Window pixel coordinates to normalized device coordinates, +Y up.
pub fn screen_to_ndc(pixel: Vec2, width: u32, height: u32) -> Vec2 {
    Vec2::new(
        2.0 * pixel.x / width.max(1) as f32 - 1.0,
        1.0 - 2.0 * pixel.y / height.max(1) as f32,
    )
}

#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.5, 5.0),
            target: Vec3::new(0.5, 0.5, 0.0),
            up: Vec3::Y,
            fov: 45.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// World-space ray through a point in normalized device coordinates.
    pub fn screen_to_ray(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let near = inverse * Vec4::new(ndc.x, ndc.y, 0.0, 1.0);
        let far = inverse * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);
        let near = near.truncate() / near.w;
        let far = far.truncate() / far.w;

        Ray {
            origin: near,
            direction: (far - near).normalize_or_zero(),
        }
    }

    pub fn screen_to_world_on_plane(&self, ndc: Vec2, normal: Vec3, offset: f32) -> Option<Vec3> {
        self.screen_to_ray(ndc).intersect_plane(normal, offset)
    }
}

/// Spherical orbit around `center` with damped input.
#[derive(Debug, Clone)]
pub struct OrbitController {
    pub center: Vec3,
    pub radius: f32,
    /// Azimuth around +Y, zero on +Z.
    pub yaw: f32,
    /// Elevation above the XZ plane.
    pub pitch: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub damping: f32,
    velocity: Vec3,
}

impl OrbitController {
    pub const MIN_RADIUS: f32 = 0.5;
    pub const MAX_RADIUS: f32 = 50.0;

    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius,
            yaw: 0.0,
            pitch: 0.2,
            rotate_speed: 0.005,
            zoom_speed: 0.1,
            damping: 0.8,
            velocity: Vec3::ZERO,
        }
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.velocity.x -= dx * self.rotate_speed;
        self.velocity.y += dy * self.rotate_speed;
    }

    pub fn zoom(&mut self, delta: f32) {
        self.velocity.z -= delta * self.zoom_speed * self.radius;
    }

    /// Applies and damps the pending motion.
    pub fn update(&mut self) {
        let limit = FRAC_PI_2 - 0.05;
        self.yaw = (self.yaw + self.velocity.x).rem_euclid(2.0 * PI);
        self.pitch = (self.pitch + self.velocity.y).clamp(-limit, limit);
        self.radius = (self.radius + self.velocity.z).clamp(Self::MIN_RADIUS, Self::MAX_RADIUS);

        self.velocity *= self.damping;
        if self.velocity.length_squared() < 1e-8 {
            self.velocity = Vec3::ZERO;
        }
    }

    pub fn camera_position(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.center + self.radius * Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw)
    }

    pub fn update_camera(&self, camera: &mut Camera) {
        camera.position = self.camera_position();
        camera.target = self.center;
    }
}
