//! Channel-to-lights mapping and its construction-time validation.

use std::collections::{HashMap, HashSet};

use crate::error::{EngineError, Result};

/// An inclusive time-of-day range in 24-hour HHMM form.
///
/// `ActiveWindow::new(0, 800)` is active from midnight through 08:00
/// inclusive. Bounds are plain HHMM integers; `2400` is a legal open end
/// meaning "until midnight".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveWindow {
    /// First HHMM instant the window covers
    pub start: u16,
    /// Last HHMM instant the window covers
    pub end: u16,
}

impl ActiveWindow {
    /// Create a window covering `start..=end`.
    pub fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    /// Whether the given HHMM time falls inside the window, bounds included.
    pub fn contains(&self, time: u16) -> bool {
        self.start <= time && time <= self.end
    }
}

/// One light bound to a channel: what to switch, for how long, and when the
/// binding is eligible at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightRule {
    /// Light identifier, unique within a channel's rule list
    pub light: String,
    /// Seconds the light stays on after a trigger; 0 disables auto-off
    pub duration_secs: u64,
    /// Eligible time-of-day windows; an empty list means always eligible
    pub active_windows: Vec<ActiveWindow>,
}

/// A group definition: these channels each get all of these light rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelGroup {
    /// Camera channels the rules apply to
    pub channels: Vec<u32>,
    /// Rules appended to each channel's list
    pub lights: Vec<LightRule>,
}

/// The built channel → rules mapping.
#[derive(Debug, Clone)]
pub struct LightMapping {
    rules: HashMap<u32, Vec<LightRule>>,
}

impl LightMapping {
    /// Accumulate the group definitions into per-channel rule lists.
    ///
    /// Fails if any channel's accumulated list binds the same light twice,
    /// naming the channel and light. Uniqueness is checked per channel only;
    /// one light serving several channels is a supported layout.
    pub fn build(groups: Vec<ChannelGroup>) -> Result<Self> {
        let mut rules: HashMap<u32, Vec<LightRule>> = HashMap::new();
        for group in groups {
            for channel in &group.channels {
                rules
                    .entry(*channel)
                    .or_default()
                    .extend(group.lights.iter().cloned());
            }
        }

        for (channel, channel_rules) in &rules {
            let mut seen = HashSet::new();
            for rule in channel_rules {
                if !seen.insert(rule.light.as_str()) {
                    return Err(EngineError::DuplicateLight {
                        channel: *channel,
                        light: rule.light.clone(),
                    });
                }
            }
        }

        Ok(Self { rules })
    }

    /// The rules bound to a channel, in configuration order.
    pub fn rules_for(&self, channel: u32) -> Option<&[LightRule]> {
        self.rules.get(&channel).map(Vec::as_slice)
    }

    /// Every distinct light identifier appearing anywhere in the mapping.
    pub fn light_names(&self) -> HashSet<&str> {
        self.rules
            .values()
            .flatten()
            .map(|rule| rule.light.as_str())
            .collect()
    }

    /// Number of channels with at least one rule.
    pub fn channel_count(&self) -> usize {
        self.rules.len()
    }
}
