//! # Host Plugin Surface
//!
//! The hooks a simulator host calls: start, stop, enable, disable, inbound
//! plugin messages and the per-frame flight loop. A host adapter implements
//! [`SimHost`] over the simulator SDK and forwards each hook here.

use tracing::{error, info, trace};

use crate::bridge::TelemetryBridge;
use crate::config::Config;
use crate::error::{BridgeError, Result};
use crate::sim::SimAccessor;

/// Host-visible plugin name
pub const PLUGIN_NAME: &str = "TelemFFB-XPP";

/// Host-visible unique plugin signature
pub const PLUGIN_SIGNATURE: &str = "vpforce.telemffb.xpplugin";

/// Host-visible plugin description
pub const PLUGIN_DESCRIPTION: &str = "Collect and send Telemetry for FFB processing";

/// Identity strings the host displays for this plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginInfo {
    pub name: &'static str,
    pub signature: &'static str,
    pub description: &'static str,
}

impl PluginInfo {
    /// This plugin's identity
    pub const IDENTITY: PluginInfo = PluginInfo {
        name: PLUGIN_NAME,
        signature: PLUGIN_SIGNATURE,
        description: PLUGIN_DESCRIPTION,
    };
}

impl Default for PluginInfo {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// How often the host should call the flight loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoopInterval {
    /// Every `n` rendered frames
    Frames(u32),
    /// Every `s` seconds of simulator time
    Seconds(f32),
}

impl LoopInterval {
    /// Interval in the host's encoding: negative counts frames, positive counts seconds
    ///
    /// # Examples
    ///
    /// ```
    /// use telem_bridge::plugin::LoopInterval;
    ///
    /// assert_eq!(LoopInterval::Frames(1).host_value(), -1.0);
    /// assert_eq!(LoopInterval::Seconds(0.5).host_value(), 0.5);
    /// ```
    pub fn host_value(self) -> f32 {
        match self {
            LoopInterval::Frames(n) => -(n.max(1) as f32),
            LoopInterval::Seconds(s) => s,
        }
    }
}

impl Default for LoopInterval {
    fn default() -> Self {
        LoopInterval::Frames(1)
    }
}

/// Host flight loop registration
pub trait FlightLoopScheduler {
    fn register_flight_loop(&mut self, interval: LoopInterval);
    fn unregister_flight_loop(&mut self);
}

/// Everything the plugin needs from its host
pub trait SimHost: SimAccessor + FlightLoopScheduler {}

impl<T: SimAccessor + FlightLoopScheduler> SimHost for T {}

/// Plugin state held by the host adapter between start and stop
#[derive(Debug)]
pub struct TelemetryPlugin {
    config: Config,
    interval: LoopInterval,
    bridge: Option<TelemetryBridge>,
}

impl TelemetryPlugin {
    pub fn new(config: Config) -> Self {
        Self::with_interval(config, LoopInterval::default())
    }

    pub fn with_interval(config: Config, interval: LoopInterval) -> Self {
        Self {
            config,
            interval,
            bridge: None,
        }
    }

    /// Identity strings for the host
    ///
    /// Available before and regardless of [`TelemetryPlugin::start`]; host
    /// adapters fill the host's name/signature/description from this first.
    pub const fn info() -> PluginInfo {
        PluginInfo::IDENTITY
    }

    /// Start hook
    ///
    /// Resolves data refs, opens both sockets, starts the inbound listener
    /// and registers the flight loop.
    ///
    /// # Errors
    ///
    /// Returns error if already started or the bridge cannot start. Nothing
    /// is left open or registered on error.
    pub fn start<H: SimHost + ?Sized>(&mut self, host: &mut H) -> Result<PluginInfo> {
        if self.bridge.is_some() {
            return Err(BridgeError::AlreadyStarted);
        }

        let bridge = TelemetryBridge::start(&self.config, &*host).map_err(|e| {
            error!("{} failed to start: {}", PLUGIN_NAME, e);
            e
        })?;

        host.register_flight_loop(self.interval);
        self.bridge = Some(bridge);

        info!("{} started", PLUGIN_NAME);
        Ok(Self::info())
    }

    /// Stop hook; safe to call when not started
    pub fn stop<H: SimHost + ?Sized>(&mut self, host: &mut H) {
        let Some(mut bridge) = self.bridge.take() else {
            return;
        };

        host.unregister_flight_loop();
        if let Some(stats) = bridge.stop() {
            info!(
                "Inbound listener handled {} datagrams ({} bytes, {} errors)",
                stats.datagrams, stats.bytes, stats.errors
            );
        }
        info!("{} stopped", PLUGIN_NAME);
    }

    pub fn enable(&mut self) -> bool {
        true
    }

    pub fn disable(&mut self) {}

    /// Inter-plugin message hook; messages are not acted on
    pub fn receive_message(&mut self, from: i32, message: i32) {
        trace!("Ignoring plugin message {} from {}", message, from);
    }

    /// Flight loop callback: one sampling cycle
    ///
    /// Returns the interval until the next call in the host's encoding.
    pub fn flight_loop<A: SimAccessor + ?Sized>(&mut self, sim: &A) -> f32 {
        if let Some(bridge) = self.bridge.as_mut() {
            bridge.tick(sim);
        }
        self.interval.host_value()
    }

    pub fn is_started(&self) -> bool {
        self.bridge.is_some()
    }

    /// Bridge counters while started
    pub fn bridge(&self) -> Option<&TelemetryBridge> {
        self.bridge.as_ref()
    }
}
