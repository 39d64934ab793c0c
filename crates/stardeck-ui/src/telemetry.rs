//! Telemetry records published by the data task.
//!
//! One [`InstanceTelemetry`] per remote controller per poll. The UI never
//! trusts these fields blindly: counters clamp, empty strings render as
//! placeholders, and progress is recomputed from the absolute exposure end
//! epoch rather than the elapsed field (which is stale the moment it is
//! polled).

/// Up to this many PWM channels are shown on the power row, after the two
/// aggregate readouts.
pub const MAX_POWER_CHANNELS: usize = 6;

/// One switch-hub PWM channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PowerChannel {
    pub name: String,
    /// Duty cycle, 0–100.
    pub value: f32,
}

/// Power readings from the instance's switch hub.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PowerBlock {
    /// Whether a switch hub is connected at all.
    pub connected: bool,
    pub amps: f32,
    pub watts: f32,
    pub channels: Vec<PowerChannel>,
}

/// One instance's state as of the last poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceTelemetry {
    pub connected: bool,
    pub profile_name: String,
    pub telescope_name: String,
    pub camera_name: String,
    pub target_name: String,
    pub current_filter: String,
    pub container_name: String,
    pub container_step: String,
    /// Elapsed/total exposure seconds as reported; see `exposure_end_epoch`.
    pub exposure_current_s: f32,
    pub exposure_total_s: f32,
    /// Monotonic seconds at which the running exposure completes; 0 when not
    /// exposing. The progress model derives elapsed time from this.
    pub exposure_end_epoch: i64,
    pub exposure_count: i32,
    pub exposure_iterations: i32,
    pub guider_rms_total: f32,
    pub guider_rms_ra: f32,
    pub guider_rms_dec: f32,
    pub hfr: f32,
    pub stars: i32,
    /// "HH:MM", "--", or "FLIPPING".
    pub meridian_flip: String,
    pub target_time_remaining: String,
    /// e.g. "sets", "dawn", "TIME LEFT".
    pub target_time_reason: String,
    pub power: PowerBlock,
    pub safety_connected: bool,
    pub safety_is_safe: bool,
    /// Monotonic ms of the last successful poll; staleness is judged
    /// against this.
    pub last_poll_ms: u64,
}

/// Everything the data task publishes, versioned so the UI applies each
/// poll exactly once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryFrame {
    pub version: u64,
    pub instances: Vec<InstanceTelemetry>,
}

/// Guider RMS history for the graph overlay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RmsHistory {
    /// Signed per-sample deviations, arcsec.
    pub ra: Vec<f32>,
    pub dec: Vec<f32>,
    /// Current aggregate magnitudes, arcsec.
    pub rms_ra: f32,
    pub rms_dec: f32,
    pub rms_total: f32,
}

/// HFR history for the graph overlay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HfrHistory {
    pub hfr: Vec<f32>,
}
