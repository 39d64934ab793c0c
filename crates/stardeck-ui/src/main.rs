#![forbid(unsafe_code)]

//! Bench binary: boots the UI against a simulated data source.
//!
//! On the real device the data task is the HTTP/WebSocket client; here a
//! background thread synthesises plausible telemetry so the whole UI can be
//! exercised without hardware. The thread only ever touches the channel
//! handles, exactly like the production client.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use stardeck_core::time::monotonic_ms;
use stardeck_runtime::NotificationBus;
use stardeck_style::Severity;
use stardeck_ui::app::{App, Channels};
use stardeck_ui::config::Config;
use stardeck_ui::overlay::graph::GraphKind;
use stardeck_ui::telemetry::{
    HfrHistory, InstanceTelemetry, PowerBlock, PowerChannel, RmsHistory, TelemetryFrame,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const TICK_MS: u64 = 33;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("stardeck.json"), PathBuf::from);
    let config = Config::load(&config_path);
    info!(path = %config_path.display(), instances = config.instances.len(), "starting");

    let instance_count = config.instances.len();
    let mut app = App::new(config, config_path, monotonic_ms());
    let channels = app.channels();

    let sim_channels = channels.clone();
    thread::spawn(move || simulate(sim_channels, instance_count));

    loop {
        app.tick(monotonic_ms());
        thread::sleep(Duration::from_millis(TICK_MS));
    }
}

/// The stand-in data task. Publishes telemetry frames at the configured
/// rate, answers graph requests, and posts the occasional notification.
fn simulate(channels: Channels, n: usize) {
    let mut version = 0u64;
    let mut rng = Lcg::new(0x5EED);

    channels.bus.post(
        Severity::Info,
        None,
        "Simulated data source online",
        monotonic_ms(),
    );

    loop {
        let now = monotonic_ms();
        version += 1;
        let frame = TelemetryFrame {
            version,
            instances: (0..n).map(|i| sample(i, now, &mut rng)).collect(),
        };
        channels.telemetry.publish(frame);

        answer_graph_requests(&channels, &mut rng);
        maybe_nag(&channels.bus, &mut rng, now);

        let rate = channels.rates.read().update_rate_s.clamp(1, 10);
        thread::sleep(Duration::from_secs(u64::from(rate)));
    }
}

fn sample(instance: usize, now_ms: u64, rng: &mut Lcg) -> InstanceTelemetry {
    let now_s = (now_ms / 1000) as i64;
    // 120 s exposures, restarting on a per-instance phase.
    let period = 120;
    let phase = (instance as i64) * 37;
    let into = (now_s + phase) % period;
    let filters = ["L", "R", "G", "B", "Ha"];
    let filter = filters[(((now_s + phase) / period) % filters.len() as i64) as usize];

    InstanceTelemetry {
        connected: true,
        profile_name: format!("Rig {}", instance + 1),
        telescope_name: "Esprit 100".into(),
        camera_name: "ASI2600MM".into(),
        target_name: "NGC 7000".into(),
        current_filter: filter.into(),
        container_name: "Deep Sky Sequence".into(),
        container_step: "Smart Exposure".into(),
        exposure_current_s: into as f32,
        exposure_total_s: period as f32,
        exposure_end_epoch: now_s + (period - into),
        exposure_count: (((now_s + phase) / period) % 40) as i32,
        exposure_iterations: 40,
        guider_rms_total: 0.45 + rng.unit() * 0.4,
        guider_rms_ra: 0.30 + rng.unit() * 0.3,
        guider_rms_dec: 0.25 + rng.unit() * 0.3,
        hfr: 2.0 + rng.unit(),
        stars: 400 + (rng.unit() * 300.0) as i32,
        meridian_flip: "02:35".into(),
        target_time_remaining: "04:12".into(),
        target_time_reason: "sets".into(),
        power: PowerBlock {
            connected: true,
            amps: 2.4 + rng.unit(),
            watts: 28.0 + rng.unit() * 8.0,
            channels: vec![
                PowerChannel {
                    name: "dew A".into(),
                    value: 35.0,
                },
                PowerChannel {
                    name: "dew B".into(),
                    value: 50.0,
                },
            ],
        },
        safety_connected: true,
        safety_is_safe: true,
        last_poll_ms: now_ms,
    }
}

fn answer_graph_requests(channels: &Channels, rng: &mut Lcg) {
    let request = {
        let mut taken = None;
        channels.graph.update(|feed| taken = feed.request.take());
        taken
    };
    let Some(request) = request else { return };
    match request.kind {
        GraphKind::Rms => {
            let n = request.point_count;
            let ra: Vec<f32> = (0..n).map(|_| (rng.unit() - 0.5) * 1.6).collect();
            let dec: Vec<f32> = (0..n).map(|_| (rng.unit() - 0.5) * 1.2).collect();
            let history = RmsHistory {
                rms_ra: 0.42,
                rms_dec: 0.31,
                rms_total: 0.52,
                ra,
                dec,
            };
            channels.graph.update(|feed| feed.rms = Some((request, history)));
        }
        GraphKind::Hfr => {
            let hfr: Vec<f32> = (0..request.point_count)
                .map(|_| 2.0 + rng.unit() * 1.5)
                .collect();
            channels
                .graph
                .update(|feed| feed.hfr = Some((request, HfrHistory { hfr })));
        }
    }
}

fn maybe_nag(bus: &NotificationBus, rng: &mut Lcg, now_ms: u64) {
    if rng.unit() > 0.97 {
        bus.post(Severity::Warning, Some(0), "Guider pulse exceeded 1s", now_ms);
    }
}

/// Tiny deterministic generator; the simulator needs wobble, not entropy.
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed | 1)
    }

    /// Uniform-ish value in `[0, 1)`.
    fn unit(&mut self) -> f32 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) as f32) / (u32::MAX >> 1) as f32
    }
}
