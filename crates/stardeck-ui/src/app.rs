//! The UI runtime context.
//!
//! One [`App`] owns the scene tree, the timeline, every page and overlay,
//! and the producer-facing channels. Exactly one instance exists, created
//! at boot by the binary. The outer loop calls [`App::tick`] with the
//! current monotonic time; everything else is driven from there: telemetry
//! application, input dispatch, the bus drain, periodic timers, and the
//! animation advance.
//!
//! Producer threads see only [`App::channels`]: the telemetry snapshot
//! cell, the graph-data exchange, the notification bus, the input queue,
//! and the live poll rates. They never touch the scene.

use std::path::PathBuf;
use std::sync::Arc;

use stardeck_core::event::InputEvent;
use stardeck_core::geometry::Rect;
use stardeck_runtime::{InputQueue, NotificationBus, SharedSnapshot, TimerId, Timers};
use stardeck_scene::{NodeId, SceneTree, Timeline};
use stardeck_style::Severity;
use tracing::{info, warn};

use crate::config::{Config, TransitionEffect};
use crate::overlay::graph::{GraphKind, GraphOverlay, GraphRequest, GraphTap};
use crate::overlay::info::{InfoData, InfoKind, InfoOverlay};
use crate::pages::instance::InstancePage;
use crate::pages::settings::{SettingsAction, SettingsPage};
use crate::pages::summary::SummaryPage;
use crate::pages::sysinfo::SysInfoPage;
use crate::router::{PageDescriptor, PageKind, PageRouter};
use crate::telemetry::{HfrHistory, RmsHistory, TelemetryFrame};
use crate::theme::ThemeState;
use crate::toast::ToastHost;

/// Screen edge length of the square panel.
pub const SCREEN_PX: i32 = 720;

const INTERP_PERIOD_MS: u64 = 200;
const SECOND_PERIOD_MS: u64 = 1_000;

/// Graph-data exchange between the UI and the data task.
#[derive(Debug, Default, Clone)]
pub struct GraphFeed {
    /// Raised by the UI, consumed by the data task.
    pub request: Option<GraphRequest>,
    /// Answered by the data task, consumed by the UI.
    pub rms: Option<(GraphRequest, RmsHistory)>,
    pub hfr: Option<(GraphRequest, HfrHistory)>,
}

/// Poll intervals the data task re-reads live, seconds.
#[derive(Debug, Clone, Copy)]
pub struct PollRates {
    pub update_rate_s: u32,
    pub graph_update_interval_s: u32,
}

/// Everything a producer thread may touch.
#[derive(Clone)]
pub struct Channels {
    pub telemetry: Arc<SharedSnapshot<TelemetryFrame>>,
    pub graph: Arc<SharedSnapshot<GraphFeed>>,
    pub bus: Arc<NotificationBus>,
    pub input: Arc<InputQueue>,
    pub rates: Arc<SharedSnapshot<PollRates>>,
}

/// The single UI runtime context.
pub struct App {
    pub tree: SceneTree,
    pub timeline: Timeline,
    pub theme: ThemeState,
    pub config: Config,
    config_path: PathBuf,

    pub router: PageRouter,
    pub summary: SummaryPage,
    pub instances: Vec<InstancePage>,
    pub settings: SettingsPage,
    pub sysinfo: SysInfoPage,
    pub graph: GraphOverlay,
    pub info: InfoOverlay,
    pub toast: ToastHost,

    timers: Timers,
    interp_timer: TimerId,
    second_timer: TimerId,
    rotate_timer: TimerId,

    channels: Channels,
    applied_version: u64,
    latest: TelemetryFrame,
}

impl App {
    /// Boot the whole UI from a loaded config.
    pub fn new(config: Config, config_path: PathBuf, now_ms: u64) -> Self {
        let mut tree = SceneTree::new(Rect::from_size(SCREEN_PX, SCREEN_PX));
        let theme = ThemeState::from_config(&config);
        let instance_count = config.instances.len();

        let summary = SummaryPage::build(&mut tree, &theme, instance_count);
        let instances: Vec<InstancePage> = (0..instance_count)
            .map(|i| InstancePage::build(&mut tree, &theme, i))
            .collect();
        let settings = SettingsPage::build(&mut tree, &theme);
        let sysinfo = SysInfoPage::build(&mut tree, &theme, instance_count);

        let mut pages = vec![PageDescriptor {
            kind: PageKind::Summary,
            root: summary.root(),
        }];
        for page in &instances {
            pages.push(PageDescriptor {
                kind: PageKind::Instance(page.instance),
                root: page.root(),
            });
        }
        pages.push(PageDescriptor {
            kind: PageKind::Settings,
            root: settings.root(),
        });
        pages.push(PageDescriptor {
            kind: PageKind::SysInfo,
            root: sysinfo.root(),
        });
        let router = PageRouter::new(&mut tree, &theme, pages);

        // Overlays and the toast bar sit above the pages.
        let graph = GraphOverlay::build(&mut tree, &theme);
        let info = InfoOverlay::build(&mut tree, &theme);
        let toast = ToastHost::build(&mut tree, &theme);

        let mut timers = Timers::new();
        let interp_timer = timers.register(INTERP_PERIOD_MS, now_ms);
        let second_timer = timers.register(SECOND_PERIOD_MS, now_ms);
        let rotate_timer = timers.register(u64::from(config.auto_rotate_interval_s) * 1000, now_ms);
        timers.set_enabled(rotate_timer, config.auto_rotate_enabled, now_ms);

        let channels = Channels {
            telemetry: Arc::new(SharedSnapshot::new(TelemetryFrame::default())),
            graph: Arc::new(SharedSnapshot::new(GraphFeed::default())),
            bus: Arc::new(NotificationBus::new()),
            input: Arc::new(InputQueue::new()),
            rates: Arc::new(SharedSnapshot::new(PollRates {
                update_rate_s: config.update_rate_s,
                graph_update_interval_s: config.graph_update_interval_s,
            })),
        };

        let mut app = Self {
            tree,
            timeline: Timeline::new(),
            theme,
            config,
            config_path,
            router,
            summary,
            instances,
            settings,
            sysinfo,
            graph,
            info,
            toast,
            timers,
            interp_timer,
            second_timer,
            rotate_timer,
            channels,
            applied_version: 0,
            latest: TelemetryFrame::default(),
        };
        app.settings.sync(&mut app.tree, &app.config, &app.theme);
        app.tree.layout();
        info!(instances = instance_count, "ui booted");
        app
    }

    /// Handles producer threads talk through.
    #[must_use]
    pub fn channels(&self) -> Channels {
        self.channels.clone()
    }

    #[must_use]
    pub fn overlay_visible(&self) -> bool {
        self.graph.is_visible() || self.info.is_visible()
    }

    /// One cooperative tick. Everything the UI does happens here.
    pub fn tick(&mut self, now_ms: u64) {
        self.apply_telemetry(now_ms);
        for event in self.channels.input.drain() {
            self.handle_input(event, now_ms);
        }
        self.drain_bus(now_ms);
        self.pump_graph_feed();

        for timer in self.timers.due(now_ms) {
            if timer == self.interp_timer {
                self.interp_tick(now_ms);
            } else if timer == self.second_timer {
                self.second_tick(now_ms);
            } else if timer == self.rotate_timer {
                self.auto_rotate_step(now_ms);
            }
        }

        let done = self.timeline.advance(&mut self.tree, now_ms);
        for event in &done {
            self.router
                .on_anim_done(&mut self.tree, &mut self.timeline, &self.theme, event, now_ms);
            self.toast.on_anim_done(&mut self.tree, event);
            self.summary.on_anim_done(&mut self.tree, event);
            for page in &mut self.instances {
                page.on_anim_done(&mut self.tree, event);
            }
        }
        for page in &self.instances {
            page.refresh_animated_labels(&mut self.tree);
        }

        self.tree.layout();
    }

    fn apply_telemetry(&mut self, now_ms: u64) {
        let frame = self.channels.telemetry.read();
        if frame.version == self.applied_version {
            return;
        }
        self.applied_version = frame.version;
        for page in &mut self.instances {
            let Some(t) = frame.instances.get(page.instance) else {
                continue;
            };
            let Some(cfg) = self.config.instances.get(page.instance) else {
                continue;
            };
            page.apply_telemetry(&mut self.tree, &mut self.timeline, &self.theme, cfg, t, now_ms);
        }
        self.summary.update(
            &mut self.tree,
            &mut self.timeline,
            &self.theme,
            &self.config.instances,
            &frame.instances,
            now_ms,
        );
        self.latest = frame;
    }

    fn drain_bus(&mut self, now_ms: u64) {
        for note in self.channels.bus.take_pending() {
            self.toast.show(
                &mut self.tree,
                &mut self.timeline,
                &self.theme,
                note.severity,
                &note.text,
                self.config.toast_duration_s,
                now_ms,
            );
        }
    }

    fn pump_graph_feed(&mut self) {
        if let Some(request) = self.graph.take_refresh_request() {
            self.channels.graph.update(|feed| feed.request = Some(request));
        }
        let (rms, hfr) = {
            let mut rms = None;
            let mut hfr = None;
            self.channels.graph.update(|feed| {
                rms = feed.rms.take();
                hfr = feed.hfr.take();
            });
            (rms, hfr)
        };
        if let Some((request, history)) = rms
            && let Some(cfg) = self.config.instances.get(request.instance)
        {
            self.graph
                .set_rms_data(&mut self.tree, &self.theme, cfg.rms_thresholds, &history);
        }
        if let Some((request, history)) = hfr
            && let Some(cfg) = self.config.instances.get(request.instance)
        {
            self.graph
                .set_hfr_data(&mut self.tree, &self.theme, cfg.hfr_thresholds, &history);
        }
    }

    fn interp_tick(&mut self, now_ms: u64) {
        // Only the active page's arc needs smoothing; hidden arcs catch up
        // the moment their page returns.
        if let PageKind::Instance(i) = self.router.active_kind()
            && let Some(page) = self.instances.iter_mut().find(|p| p.instance == i)
        {
            page.interp_tick(&mut self.tree, &mut self.timeline, now_ms);
        }
    }

    fn second_tick(&mut self, now_ms: u64) {
        for page in &mut self.instances {
            page.staleness_tick(&mut self.tree, &self.theme, now_ms);
        }
        self.toast.tick(&mut self.tree, &mut self.timeline, now_ms);
        self.settings.second_tick(&mut self.tree, now_ms);
        let connected: Vec<bool> = self.latest.instances.iter().map(|t| t.connected).collect();
        let events = self.channels.bus.log_snapshot();
        self.sysinfo
            .second_tick(&mut self.tree, &self.config, &connected, &events, now_ms);
    }

    fn auto_rotate_step(&mut self, now_ms: u64) {
        let n = self.router.len();
        for step in 1..n {
            let candidate = (self.router.active() + step) % n;
            let skip = match self.router.kind_at(candidate) {
                Some(PageKind::Instance(i)) => {
                    self.config.auto_rotate_skip_disconnected
                        && !self
                            .latest
                            .instances
                            .get(i)
                            .is_some_and(|t| t.connected)
                }
                _ => false,
            };
            if !skip {
                self.router.show_page(
                    &mut self.tree,
                    &mut self.timeline,
                    &self.theme,
                    candidate,
                    self.config.auto_rotate_effect,
                    now_ms,
                );
                return;
            }
        }
    }

    fn handle_input(&mut self, event: InputEvent, now_ms: u64) {
        match event {
            InputEvent::Swipe { dir, start } => {
                let overlay = self.overlay_visible();
                let consumed = self.router.gesture(
                    &mut self.tree,
                    &mut self.timeline,
                    &self.theme,
                    dir,
                    start,
                    overlay,
                    now_ms,
                );
                if consumed {
                    self.timers.reset(self.rotate_timer, now_ms);
                }
            }
            InputEvent::Tap(point) => {
                self.timers.reset(self.rotate_timer, now_ms);
                let Some(hit) = self.tree.hit_test(point.x, point.y) else {
                    return;
                };
                self.handle_tap(hit, now_ms);
            }
            InputEvent::SliderDrag { node, value } => self.handle_slider(node, value, false),
            InputEvent::SliderRelease { node, value } => self.handle_slider(node, value, true),
        }
    }

    fn handle_tap(&mut self, hit: NodeId, now_ms: u64) {
        // Overlays are topmost; they claim taps first.
        if self.graph.is_visible() {
            match self.graph.on_tap(&mut self.tree, &self.theme, hit) {
                GraphTap::Back => {
                    let target = self.graph.return_page();
                    self.router.show_page(
                        &mut self.tree,
                        &mut self.timeline,
                        &self.theme,
                        target,
                        TransitionEffect::Instant,
                        now_ms,
                    );
                }
                GraphTap::Refresh | GraphTap::Handled => {}
                GraphTap::None => {}
            }
            return;
        }
        if self.info.is_visible() {
            if hit == self.info.back_node() {
                let target = self.info.return_page();
                self.info.hide(&mut self.tree);
                self.router.show_page(
                    &mut self.tree,
                    &mut self.timeline,
                    &self.theme,
                    target,
                    TransitionEffect::Instant,
                    now_ms,
                );
            }
            return;
        }

        match self.router.active_kind() {
            PageKind::Summary => {
                if let Some(instance) = self.summary.card_instance(hit)
                    && let Some(index) = self.router.index_of_instance(instance)
                {
                    self.router.show_page(
                        &mut self.tree,
                        &mut self.timeline,
                        &self.theme,
                        index,
                        TransitionEffect::SlideLeft,
                        now_ms,
                    );
                }
            }
            PageKind::Instance(i) => {
                let here = self.router.active();
                let Some(page) = self.instances.iter().find(|p| p.instance == i) else {
                    return;
                };
                if hit == page.rms_node() {
                    self.graph
                        .open(&mut self.tree, &self.theme, GraphKind::Rms, i, here);
                    return;
                }
                if hit == page.hfr_node() {
                    self.graph
                        .open(&mut self.tree, &self.theme, GraphKind::Hfr, i, here);
                    return;
                }
                if hit == page.power_row_node() {
                    // Bottom row routes home.
                    self.router.show_page(
                        &mut self.tree,
                        &mut self.timeline,
                        &self.theme,
                        0,
                        TransitionEffect::SlideRight,
                        now_ms,
                    );
                    return;
                }
                // Header tap is the image panel (thumbnail transport is the
                // data task's concern); the cards carry their detail views.
                let kind = if hit == page.header_node() {
                    Some(InfoKind::ImageStats)
                } else if hit == page.seq_card_node() {
                    Some(InfoKind::Sequence)
                } else if hit == page.arc_card_node() {
                    Some(InfoKind::FilterWheel)
                } else if hit == page.metrics_card_node() {
                    Some(InfoKind::Autofocus)
                } else if hit == page.flip_card_node() {
                    Some(InfoKind::Mount)
                } else if hit == page.target_card_node() {
                    Some(InfoKind::SessionStats)
                } else {
                    None
                };
                if let Some(kind) = kind {
                    self.info.show(&mut self.tree, &self.theme, kind, here);
                    self.populate_info_from_latest(kind, i);
                }
            }
            PageKind::Settings => {
                if let Some(action) = self.settings.action_for(hit) {
                    self.apply_settings_action(action, now_ms);
                }
            }
            PageKind::SysInfo => {}
        }
    }

    /// Feed the open info overlay from the last applied telemetry frame.
    fn populate_info_from_latest(&mut self, kind: InfoKind, instance: usize) {
        let Some(t) = self.latest.instances.get(instance) else {
            return;
        };
        if !t.connected {
            let empty = match kind {
                InfoKind::Autofocus => InfoData::Autofocus(Default::default()),
                _ => InfoData::Pairs(Vec::new()),
            };
            self.info.populate(&mut self.tree, &self.theme, &empty);
            return;
        }
        let own = |s: &str| s.to_owned();
        let data = match kind {
            InfoKind::Camera | InfoKind::ImageStats => InfoData::Pairs(vec![
                (own("Camera"), t.camera_name.clone()),
                (own("Target"), t.target_name.clone()),
                (own("Filter"), t.current_filter.clone()),
                (own("HFR"), crate::format::hfr(t.hfr)),
                (own("Stars"), t.stars.max(0).to_string()),
            ]),
            InfoKind::Sequence => InfoData::Pairs(vec![
                (own("Container"), t.container_name.clone()),
                (own("Step"), t.container_step.clone()),
                (
                    own("Iteration"),
                    format!("{}/{}", t.exposure_count.max(0), t.exposure_iterations.max(0)),
                ),
                (
                    own("Exposure"),
                    crate::format::seconds(t.exposure_total_s),
                ),
            ]),
            InfoKind::FilterWheel => InfoData::Pairs(vec![(
                own("Current filter"),
                t.current_filter.clone(),
            )]),
            InfoKind::Mount => InfoData::Pairs(vec![
                (own("Telescope"), t.telescope_name.clone()),
                (
                    own("Meridian flip"),
                    crate::format::flip_countdown(&t.meridian_flip),
                ),
            ]),
            InfoKind::SessionStats => InfoData::Pairs(vec![
                (own("Target"), t.target_name.clone()),
                (own("Time left"), t.target_time_remaining.clone()),
                (own("Reason"), t.target_time_reason.clone()),
                (own("Stars"), t.stars.max(0).to_string()),
            ]),
            // Autofocus curves arrive with the data task's AF result; until
            // one lands the panel reads "No data".
            InfoKind::Autofocus => InfoData::Autofocus(Default::default()),
        };
        self.info.populate(&mut self.tree, &self.theme, &data);
    }

    fn handle_slider(&mut self, node: u64, value: i32, released: bool) {
        let value = value.clamp(0, 100) as u8;
        if node == self.settings.backlight_slider().to_raw() {
            // Backlight tracks the drag live; the driver applies it.
            self.config.brightness = value;
        } else if node == self.settings.text_brightness_slider().to_raw() && released {
            // Text brightness waits for release: every change reflows the
            // whole theme.
            self.config.color_brightness = value;
            self.theme.set_color_brightness(value);
            self.retheme_all();
            self.settings.sync(&mut self.tree, &self.config, &self.theme);
        }
    }

    fn apply_settings_action(&mut self, action: SettingsAction, now_ms: u64) {
        match action {
            SettingsAction::ThemeStep(delta) => {
                self.theme.step_palette(delta);
                self.config.theme_index = self.theme.palette_index();
                self.retheme_all();
            }
            SettingsAction::StyleStep(delta) => {
                self.config.widget_style = self.config.widget_style.step(delta);
                self.theme.set_widget_style(self.config.widget_style);
                self.retheme_all();
            }
            SettingsAction::DataRateStep(delta) => {
                self.config.update_rate_s =
                    self.config.update_rate_s.saturating_add_signed(delta).clamp(1, 10);
                self.publish_rates();
            }
            SettingsAction::GraphRateStep(delta) => {
                self.config.graph_update_interval_s = self
                    .config
                    .graph_update_interval_s
                    .saturating_add_signed(delta)
                    .clamp(2, 30);
                self.publish_rates();
            }
            SettingsAction::RotateToggle => {
                self.config.auto_rotate_enabled = !self.config.auto_rotate_enabled;
                self.timers
                    .set_enabled(self.rotate_timer, self.config.auto_rotate_enabled, now_ms);
            }
            SettingsAction::RotateIntervalStep(delta) => {
                let step = Config::rotate_interval_step(self.config.auto_rotate_interval_s);
                self.config.auto_rotate_interval_s = self
                    .config
                    .auto_rotate_interval_s
                    .saturating_add_signed(delta * step as i32)
                    .clamp(4, 3600);
                self.timers.set_period(
                    self.rotate_timer,
                    u64::from(self.config.auto_rotate_interval_s) * 1000,
                    now_ms,
                );
            }
            SettingsAction::RotateEffectStep(delta) => {
                self.config.auto_rotate_effect = self.config.auto_rotate_effect.step(delta);
            }
            SettingsAction::RotateSkipToggle => {
                self.config.auto_rotate_skip_disconnected =
                    !self.config.auto_rotate_skip_disconnected;
            }
            SettingsAction::Save => {
                match self.config.save(&self.config_path) {
                    Ok(()) => {
                        info!(path = %self.config_path.display(), "config saved");
                        self.settings.flash_saved(&mut self.tree, now_ms);
                    }
                    Err(err) => {
                        warn!(%err, "config save failed");
                        self.toast.show(
                            &mut self.tree,
                            &mut self.timeline,
                            &self.theme,
                            Severity::Error,
                            "Config save failed",
                            self.config.toast_duration_s,
                            now_ms,
                        );
                    }
                }
            }
        }
        self.settings.sync(&mut self.tree, &self.config, &self.theme);
    }

    fn publish_rates(&self) {
        self.channels.rates.publish(PollRates {
            update_rate_s: self.config.update_rate_s,
            graph_update_interval_s: self.config.graph_update_interval_s,
        });
    }

    /// Walk every page and overlay after a palette/style/brightness change.
    fn retheme_all(&mut self) {
        self.summary.retheme(&mut self.tree, &self.theme);
        for page in &mut self.instances {
            page.retheme(&mut self.tree, &self.theme);
        }
        self.settings.retheme(&mut self.tree, &self.theme);
        self.sysinfo.retheme(&mut self.tree, &self.theme);
        self.graph.retheme(&mut self.tree, &self.theme);
        self.info.retheme(&mut self.tree, &self.theme);
        self.toast.retheme(&mut self.tree, &self.theme);
        self.router.update_dots(&mut self.tree, &self.theme);
    }
}
