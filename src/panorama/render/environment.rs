//! Scenes the software backend can render.

use glam::Vec3;

/// Colour seen from `origin` looking along the unit vector `direction`.
pub trait Environment: Send + Sync + 'static {
    fn radiance(&self, origin: Vec3, direction: Vec3) -> [u8; 3];
}

impl<F> Environment for F
where
    F: Fn(Vec3, Vec3) -> [u8; 3] + Send + Sync + 'static,
{
    fn radiance(&self, origin: Vec3, direction: Vec3) -> [u8; 3] {
        self(origin, direction)
    }
}

/// Sky dome with a zenith/horizon/ground gradient and a sun disc.
#[derive(Debug, Clone)]
pub struct SkyGradient {
    pub zenith: Vec3,
    pub horizon: Vec3,
    pub ground: Vec3,
    pub sun_direction: Vec3,
    pub sun_colour: Vec3,
    /// Angular radius of the sun disc, in degrees
    pub sun_radius_degrees: f32,
}

impl Default for SkyGradient {
    fn default() -> Self {
        Self {
            zenith: Vec3::new(0.18, 0.36, 0.78),
            horizon: Vec3::new(0.78, 0.86, 0.95),
            ground: Vec3::new(0.32, 0.28, 0.22),
            sun_direction: Vec3::new(0.3, 0.5, 0.8).normalize(),
            sun_colour: Vec3::new(1.0, 0.95, 0.8),
            sun_radius_degrees: 3.0,
        }
    }
}

impl Environment for SkyGradient {
    fn radiance(&self, _origin: Vec3, direction: Vec3) -> [u8; 3] {
        let colour = if direction.y >= 0.0 {
            let t = direction.y.powf(0.5);
            let sky = self.horizon.lerp(self.zenith, t);
            let cos_radius = self.sun_radius_degrees.to_radians().cos();
            if direction.dot(self.sun_direction) >= cos_radius {
                self.sun_colour
            } else {
                sky
            }
        } else {
            let t = (-direction.y).powf(0.35);
            self.horizon.lerp(self.ground, t)
        };
        let c = (colour.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
        [c.x as u8, c.y as u8, c.z as u8]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closures_are_environments() {
        let env = |_: Vec3, dir: Vec3| if dir.y > 0.0 { [255, 255, 255] } else { [0, 0, 0] };
        assert_eq!(env.radiance(Vec3::ZERO, Vec3::Y), [255, 255, 255]);
        assert_eq!(env.radiance(Vec3::ZERO, Vec3::NEG_Y), [0, 0, 0]);
    }

    #[test]
    fn test_sky_gradient_sun_and_ground() {
        let sky = SkyGradient::default();
        let sun = sky.radiance(Vec3::ZERO, sky.sun_direction);
        assert_eq!(sun, [255, 242, 204]);
        let ground = sky.radiance(Vec3::ZERO, Vec3::NEG_Y);
        assert_eq!(ground, [82, 71, 56]);
    }
}
