//! The presence state machine: event evaluation and per-light timer slots.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use isapi_stream::{EventHandler, EventRecord, MOTION_EVENT_TYPE};
use light_control::LightDriver;

use crate::error::Result;
use crate::mapping::{ChannelGroup, LightMapping};
use crate::timer::{Scheduler, TimerHandle, TokioScheduler};

/// One light's auto-off state: either no live timer (the light is considered
/// off) or exactly one (the light is considered on).
///
/// The mutex is the light's critical section: cancel-and-rearm from a new
/// trigger and fire-and-clear from an expiring timer both run under it, so
/// the slot can never end up "on but no timer" or "off but armed".
type TimerSlot = Mutex<Option<TimerHandle>>;

/// Maps motion events onto light switching with debounced auto-off.
///
/// The engine owns the channel → rules mapping and one timer slot per
/// distinct light. It is driven from two directions at once — the stream's
/// reader task delivering events and timer callbacks expiring — and
/// serializes the two per light, never globally.
pub struct PresenceEngine {
    driver: Arc<dyn LightDriver>,
    scheduler: Arc<dyn Scheduler>,
    mapping: LightMapping,
    timers: HashMap<String, Arc<TimerSlot>>,
}

impl PresenceEngine {
    /// Build an engine with tokio-backed timers.
    ///
    /// Fails if the group definitions bind the same light twice on one
    /// channel, so a misconfigured mapping never starts handling events.
    pub fn new(driver: Arc<dyn LightDriver>, groups: Vec<ChannelGroup>) -> Result<Self> {
        Self::with_scheduler(driver, groups, Arc::new(TokioScheduler))
    }

    /// Build an engine with an injected timer facility.
    pub fn with_scheduler(
        driver: Arc<dyn LightDriver>,
        groups: Vec<ChannelGroup>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Result<Self> {
        let mapping = LightMapping::build(groups)?;
        let timers = mapping
            .light_names()
            .into_iter()
            .map(|light| (light.to_string(), Arc::new(Mutex::new(None))))
            .collect();
        Ok(Self {
            driver,
            scheduler,
            mapping,
            timers,
        })
    }

    /// The validated channel → rules mapping.
    pub fn mapping(&self) -> &LightMapping {
        &self.mapping
    }

    /// Evaluate one record against the mapping.
    ///
    /// Unknown channels and non-motion event types are no-ops, not errors.
    /// A missing or unreadable required field is an error the caller logs;
    /// the record is dropped and the engine keeps running.
    async fn process(&self, event: &EventRecord) -> Result<()> {
        let channel = event.channel_id()?;
        let Some(rules) = self.mapping.rules_for(channel) else {
            return Ok(());
        };
        if event.event_type() != Some(MOTION_EVENT_TYPE) {
            return Ok(());
        }

        let time = event.clock_time()?;
        debug!("motion on channel {channel} at {time:04}");
        for rule in rules {
            // The first matching window wins; windows do not accumulate.
            if rule.active_windows.is_empty()
                || rule.active_windows.iter().any(|window| window.contains(time))
            {
                self.turn_on(&rule.light, rule.duration_secs).await;
            } else {
                debug!(
                    "motion at {time:04} is outside the active windows of light {}",
                    rule.light
                );
            }
        }
        Ok(())
    }

    /// Trigger a light for `duration_secs`.
    ///
    /// A light with no live timer is considered off and gets a hardware
    /// call; if that call fails the trigger aborts with the slot left empty,
    /// so the next event retries. A light with a live timer is already on
    /// and only has its timer extended. A duration of zero means "stay on";
    /// no timer is armed.
    pub async fn turn_on(&self, light: &str, duration_secs: u64) {
        let Some(slot) = self.timers.get(light) else {
            warn!("light {light} has no timer slot, dropping trigger");
            return;
        };
        let mut timer = slot.lock().await;

        if timer.is_none() {
            if let Err(e) = self.driver.turn_on(light).await {
                warn!("could not turn on light {light}: {e}");
                return;
            }
            info!("light {light} on");
        } else {
            debug!("light {light} is already on");
        }

        if duration_secs > 0 {
            self.arm(
                &mut timer,
                light,
                Arc::clone(slot),
                Duration::from_secs(duration_secs),
            );
        }
    }

    /// Arm the auto-off timer, replacing any live one. Runs with the slot
    /// lock held.
    fn arm(
        &self,
        timer: &mut Option<TimerHandle>,
        light: &str,
        slot: Arc<TimerSlot>,
        duration: Duration,
    ) {
        if let Some(previous) = timer.take() {
            previous.cancel();
            debug!("cancelled the previous timer for light {light}");
        }

        let driver = Arc::clone(&self.driver);
        let name = light.to_string();
        let handle = self.scheduler.schedule(
            duration,
            Box::pin(async move {
                Self::expire(driver, slot, &name).await;
            }),
        );
        *timer = Some(handle);
        debug!("light {light} turns off in {duration:?}");
    }

    /// Switch a light off and clear its slot.
    ///
    /// Switching off is best-effort: a driver failure is logged but the
    /// bookkeeping is cleared regardless, so the light reads as off for
    /// future idempotence checks.
    pub async fn turn_off(&self, light: &str) {
        if let Some(slot) = self.timers.get(light) {
            Self::expire(Arc::clone(&self.driver), Arc::clone(slot), light).await;
        }
    }

    async fn expire(driver: Arc<dyn LightDriver>, slot: Arc<TimerSlot>, light: &str) {
        let mut timer = slot.lock().await;
        if let Err(e) = driver.turn_off(light).await {
            warn!("could not turn off light {light}: {e}");
        } else {
            info!("light {light} off");
        }
        *timer = None;
    }
}

#[async_trait]
impl EventHandler for PresenceEngine {
    async fn handle_event(&self, event: EventRecord) {
        if let Err(e) = self.process(&event).await {
            warn!("ignoring event: {e}");
        }
    }
}
