use num_complex::Complex64;
use std::fmt;
use std::sync::Arc;

/// External scattering solver boundary.
///
/// Implementations supply, per virtual channel and absolute sample time, a
/// complex reflection coefficient and an apparent phase (rad) that replace
/// the analytic radar-equation budget for the target carrying them.
pub trait ReflectionModel: Send + Sync {
    fn reflection(&self, channel: usize, t: f64) -> (Complex64, f64);
}

/// How a target's reflection amplitude is obtained.
#[derive(Clone, Default)]
pub enum Scattering {
    /// Analytic point target via the radar equation
    #[default]
    Point,
    /// Injected per-channel reflection coefficients
    External(Arc<dyn ReflectionModel>),
}

impl fmt::Debug for Scattering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scattering::Point => write!(f, "Point"),
            Scattering::External(_) => write!(f, "External(..)"),
        }
    }
}

/// One coordinate of a target location: a literal, or a function of the
/// absolute sample time.
#[derive(Clone)]
pub enum Coordinate {
    Literal(f64),
    Path(Arc<dyn Fn(f64) -> f64 + Send + Sync>),
}

impl Coordinate {
    pub fn at(&self, t: f64) -> f64 {
        match self {
            Coordinate::Literal(v) => *v,
            Coordinate::Path(f) => f(t),
        }
    }
}

impl From<f64> for Coordinate {
    fn from(v: f64) -> Self {
        Coordinate::Literal(v)
    }
}

impl fmt::Debug for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coordinate::Literal(v) => write!(f, "{v}"),
            Coordinate::Path(_) => write!(f, "Path(..)"),
        }
    }
}

/// An ideal point target.
#[derive(Debug, Clone)]
pub struct Target {
    /// Location at t = 0 [x, y, z] (m), literal or time-varying
    pub location: [Coordinate; 3],
    /// Velocity [vx, vy, vz] (m/s)
    pub speed: [f64; 3],
    /// Radar cross-section (dBsm)
    pub rcs: f64,
    /// Reflection phase (deg)
    pub phase: f64,
    pub scattering: Scattering,
}

impl Target {
    pub fn point(location: [f64; 3], rcs: f64) -> Self {
        Target {
            location: location.map(Coordinate::Literal),
            speed: [0.0; 3],
            rcs,
            phase: 0.0,
            scattering: Scattering::Point,
        }
    }

    /// A target whose coordinates follow arbitrary functions of time.
    pub fn on_path(location: [Coordinate; 3], rcs: f64) -> Self {
        Target {
            location,
            speed: [0.0; 3],
            rcs,
            phase: 0.0,
            scattering: Scattering::Point,
        }
    }

    pub fn with_speed(mut self, speed: [f64; 3]) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_phase(mut self, phase_deg: f64) -> Self {
        self.phase = phase_deg;
        self
    }

    pub fn with_reflection_model(mut self, model: Arc<dyn ReflectionModel>) -> Self {
        self.scattering = Scattering::External(model);
        self
    }

    /// World-frame position at absolute time `t`
    pub fn position(&self, t: f64) -> [f64; 3] {
        [
            self.location[0].at(t) + self.speed[0] * t,
            self.location[1].at(t) + self.speed[1] * t,
            self.location[2].at(t) + self.speed[2] * t,
        ]
    }
}

/// Platform pose at one sample instant. Rotation is [yaw, pitch, roll] in
/// radians, applied intrinsically around Z, then Y, then X.
#[derive(Debug, Clone, Copy)]
pub struct Pose {
    pub position: [f64; 3],
    pub rotation: [f64; 3],
}

impl Pose {
    fn matrix(&self) -> [[f64; 3]; 3] {
        let (sy, cy) = self.rotation[0].sin_cos();
        let (sp, cp) = self.rotation[1].sin_cos();
        let (sr, cr) = self.rotation[2].sin_cos();
        // R = Rz(yaw) * Ry(pitch) * Rx(roll)
        [
            [cy * cp, cy * sp * sr - sy * cr, cy * sp * cr + sy * sr],
            [sy * cp, sy * sp * sr + cy * cr, sy * sp * cr - cy * sr],
            [-sp, cp * sr, cp * cr],
        ]
    }

    /// Transforms a world-frame point into the platform body frame.
    pub fn to_body(&self, point: [f64; 3]) -> [f64; 3] {
        let d = [
            point[0] - self.position[0],
            point[1] - self.position[1],
            point[2] - self.position[2],
        ];
        let r = self.matrix();
        [
            r[0][0] * d[0] + r[1][0] * d[1] + r[2][0] * d[2],
            r[0][1] * d[0] + r[1][1] * d[1] + r[2][1] * d[2],
            r[0][2] * d[0] + r[1][2] * d[1] + r[2][2] * d[2],
        ]
    }

    /// Transforms a body-frame point into the world frame.
    pub fn to_world(&self, point: [f64; 3]) -> [f64; 3] {
        let r = self.matrix();
        [
            self.position[0] + r[0][0] * point[0] + r[0][1] * point[1] + r[0][2] * point[2],
            self.position[1] + r[1][0] * point[0] + r[1][1] * point[1] + r[1][2] * point[2],
            self.position[2] + r[2][0] * point[0] + r[2][1] * point[1] + r[2][2] * point[2],
        ]
    }
}

/// Range and look angles from a channel to a body-frame point.
#[derive(Debug, Clone, Copy)]
pub struct RelativeGeometry {
    pub range: f64,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

pub fn relative_geometry(channel: [f64; 3], body_point: [f64; 3]) -> RelativeGeometry {
    let dx = body_point[0] - channel[0];
    let dy = body_point[1] - channel[1];
    let dz = body_point[2] - channel[2];
    let horizontal = dx.hypot(dy);
    RelativeGeometry {
        range: (dx * dx + dy * dy + dz * dz).sqrt(),
        azimuth_deg: dy.atan2(dx).to_degrees(),
        elevation_deg: dz.atan2(horizontal).to_degrees(),
    }
}
