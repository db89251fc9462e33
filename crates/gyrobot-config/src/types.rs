use glam::DVec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Nominal simulation tick rate (Hz). Used to pace the stand-in host and
    /// as the fallback time step when a tick reports no usable elapsed time.
    pub tick_rate_hz: f64,
    /// Sensor ingest configuration.
    pub sensor: SensorConfig,
    /// Rotation controller tuning.
    pub control: ControlConfig,
    /// Stand-in host used when no external simulation is attached.
    pub host: HostConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 120.0,
            sensor: SensorConfig::default(),
            control: ControlConfig::default(),
            host: HostConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Address the sensor ingest server listens on.
    pub listen_addr: String,
    /// Longest accepted message line in bytes. Longer lines are discarded.
    pub max_line_bytes: usize,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8765".into(),
            max_line_bytes: 4096,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Closed-loop natural frequency (rad/s). Higher = snappier, more saturation.
    pub natural_frequency: f64,
    /// Damping ratio. 1.0 is critically damped.
    pub damping_ratio: f64,
    /// Angular acceleration (rad/s^2) produced by a full command about the
    /// vehicle's forward (roll), left (pitch) and up (yaw) axes.
    #[serde(with = "dvec3_serde")]
    pub max_angular_acceleration: DVec3,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            natural_frequency: 8.0,
            damping_ratio: 1.0,
            max_angular_acceleration: DVec3::new(36.0, 12.0, 9.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// World position the vehicle is pinned to.
    #[serde(with = "dvec3_serde")]
    pub hold_position: DVec3,
    /// Initial heading (radians about world Z).
    pub spawn_yaw: f64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            hold_position: DVec3::new(0.0, -2000.0, 500.0),
            spawn_yaw: std::f64::consts::FRAC_PI_2,
        }
    }
}

// glam vectors are stored as plain `[x, y, z]` arrays.
mod dvec3_serde {
    use glam::DVec3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(v: &DVec3, s: S) -> Result<S::Ok, S::Error> {
        [v.x, v.y, v.z].serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DVec3, D::Error> {
        let [x, y, z] = <[f64; 3]>::deserialize(d)?;
        Ok(DVec3::new(x, y, z))
    }
}
