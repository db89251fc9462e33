use glam::{DMat3, DQuat, DVec3};

/// Shorter vectors than this are treated as having no direction.
const DEGENERATE_LENGTH: f64 = 1e-6;

/// One orientation sample from the handheld sensor.
///
/// Angles are in radians and still in the device's convention: `yaw` turns
/// the opposite way to the world yaw used everywhere else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
    /// Bumped by the operator on the device every time they request a reset.
    pub counter: u64,
}

/// A right-handed orthonormal frame described by its forward and up axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub forward: DVec3,
    pub up: DVec3,
}

impl Orientation {
    pub fn new(forward: DVec3, up: DVec3) -> Self {
        Self { forward, up }
    }

    /// The third axis, completing the right-handed frame (forward, left, up).
    pub fn left(&self) -> DVec3 {
        self.up.cross(self.forward)
    }

    /// Rotation matrix with columns forward, left, up.
    pub fn to_mat3(&self) -> DMat3 {
        DMat3::from_cols(self.forward, self.left(), self.up)
    }

    pub fn rotated(&self, rotation: DQuat) -> Self {
        Self {
            forward: rotation * self.forward,
            up: rotation * self.up,
        }
    }

    /// Gram-Schmidt: keep the forward direction, strip its component out of
    /// up and renormalize both.
    ///
    /// When up is (nearly) parallel to forward, world Z and then world X are
    /// tried as the up hint instead. A forward with no direction becomes world X.
    pub fn orthonormalized(&self) -> Self {
        let forward = unit(self.forward).unwrap_or(DVec3::X);
        let up = [self.up, DVec3::Z, DVec3::X]
            .into_iter()
            .find_map(|hint| unit(hint - forward * hint.dot(forward)))
            // Z and X cannot both be parallel to a unit forward.
            .unwrap_or(DVec3::Y);
        Self { forward, up }
    }
}

fn unit(v: DVec3) -> Option<DVec3> {
    let length = v.length();
    (length.is_finite() && length > DEGENERATE_LENGTH).then(|| v / length)
}

/// Orientation the vehicle is steered toward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetOrientation {
    pub forward: DVec3,
    pub up: DVec3,
}

impl TargetOrientation {
    /// Published until the first sensor sample arrives: nose straight up,
    /// roof facing world Y.
    pub const DEFAULT: Self = Self {
        forward: DVec3::Z,
        up: DVec3::Y,
    };

    pub fn orientation(&self) -> Orientation {
        Orientation::new(self.forward, self.up)
    }
}

impl Default for TargetOrientation {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<Orientation> for TargetOrientation {
    fn from(o: Orientation) -> Self {
        Self {
            forward: o.forward,
            up: o.up,
        }
    }
}
