//! Feature-flag gate that routes sessions to the orchestrated pipeline.
//!
//! Flags are loaded once (usually from the environment at startup) and
//! passed explicitly to whatever needs them. Nothing in the parsing core
//! reads the environment.

use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, TimelineError},
    normalizer::sticky_hash,
};

pub const ENV_ENABLED: &str = "TIMELINE_V2_ENABLED";
pub const ENV_PERCENTAGE: &str = "TIMELINE_V2_PERCENTAGE";
pub const ENV_WHITELIST: &str = "TIMELINE_V2_WHITELIST";
pub const ENV_BLACKLIST: &str = "TIMELINE_V2_BLACKLIST";

/// Rollout configuration for the orchestrated pipeline.
///
/// # Examples
///
/// ```
/// use itinparse::flags::FeatureFlags;
///
/// let flags = FeatureFlags { percentage: 0, ..FeatureFlags::default() };
/// assert!(!flags.is_new_pipeline_enabled("session-1"));
///
/// let flags = FeatureFlags::default().with_whitelist(["session-1"]);
/// assert!(flags.is_new_pipeline_enabled("session-1"));
/// assert!(!flags.is_new_pipeline_enabled("session-2"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Global switch; when off nothing else is consulted.
    pub enabled: bool,
    /// Share of sessions (0-100) routed to the new pipeline.
    pub percentage: u8,
    /// When non-empty, only these sessions are routed; overrides `percentage`.
    pub whitelist: HashSet<String>,
    /// Sessions that always take the legacy path.
    pub blacklist: HashSet<String>,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enabled: true,
            percentage: 100,
            whitelist: HashSet::new(),
            blacklist: HashSet::new(),
        }
    }
}

/// A configuration value that was rejected while loading flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub key: &'static str,
    pub value: String,
    pub message: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={:?}: {}", self.key, self.value, self.message)
    }
}

/// Flags plus whatever could not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagsLoad {
    pub flags: FeatureFlags,
    /// Rejected values; the default was kept for each of these keys.
    pub issues: Vec<ConfigIssue>,
}

/// Why the gate decided the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateReason {
    GloballyDisabled,
    Blacklisted,
    Whitelisted,
    NotWhitelisted,
    FullRollout,
    PercentageBucket,
}

impl GateReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GloballyDisabled => "globally_disabled",
            Self::Blacklisted => "blacklisted",
            Self::Whitelisted => "whitelisted",
            Self::NotWhitelisted => "not_whitelisted",
            Self::FullRollout => "full_rollout",
            Self::PercentageBucket => "percentage_bucket",
        }
    }
}

impl fmt::Display for GateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GateDecision {
    pub enabled: bool,
    pub reason: GateReason,
}

impl FeatureFlags {
    /// Loads flags from the process environment.
    pub fn from_env() -> FlagsLoad {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads flags through `lookup`, starting from the defaults.
    ///
    /// Unset keys keep their default; values that do not parse are reported
    /// as [`ConfigIssue`]s and also keep their default.
    ///
    /// # Examples
    ///
    /// ```
    /// use itinparse::flags::FeatureFlags;
    ///
    /// let load = FeatureFlags::from_lookup(|key| match key {
    ///     "TIMELINE_V2_PERCENTAGE" => Some("25".to_string()),
    ///     "TIMELINE_V2_BLACKLIST" => Some(" a, ,b ".to_string()),
    ///     _ => None,
    /// });
    /// assert!(load.issues.is_empty());
    /// assert_eq!(load.flags.percentage, 25);
    /// assert_eq!(load.flags.blacklist.len(), 2);
    /// ```
    pub fn from_lookup(mut lookup: impl FnMut(&str) -> Option<String>) -> FlagsLoad {
        let mut flags = Self::default();
        let mut issues = Vec::new();

        if let Some(raw) = lookup(ENV_ENABLED) {
            match parse_bool(&raw) {
                Some(value) => flags.enabled = value,
                None => issues.push(ConfigIssue {
                    key: ENV_ENABLED,
                    value: raw,
                    message: "expected true/false, 1/0, yes/no or on/off".to_string(),
                }),
            }
        }

        if let Some(raw) = lookup(ENV_PERCENTAGE) {
            match raw.trim().parse::<u8>() {
                Ok(value) if value <= 100 => flags.percentage = value,
                _ => issues.push(ConfigIssue {
                    key: ENV_PERCENTAGE,
                    value: raw,
                    message: "expected an integer between 0 and 100".to_string(),
                }),
            }
        }

        if let Some(raw) = lookup(ENV_WHITELIST) {
            flags.whitelist = parse_list(&raw);
        }
        if let Some(raw) = lookup(ENV_BLACKLIST) {
            flags.blacklist = parse_list(&raw);
        }

        for issue in &issues {
            tracing::warn!(
                stage = "feature_flag",
                key = issue.key,
                value = %issue.value,
                "{}, keeping default",
                issue.message
            );
        }

        FlagsLoad { flags, issues }
    }

    pub fn with_whitelist<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.whitelist = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_blacklist<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklist = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Checks values that deserialisation alone cannot rule out.
    pub fn validate(&self) -> Result<()> {
        if self.percentage > 100 {
            return Err(TimelineError::InvalidConfig(format!(
                "percentage must be between 0 and 100, got {}",
                self.percentage
            )));
        }
        Ok(())
    }

    /// Decides whether `session_id` gets the orchestrated pipeline.
    ///
    /// Order: global switch, blacklist, whitelist, then the sticky
    /// percentage bucket.
    pub fn decide(&self, session_id: &str) -> GateDecision {
        let decision = if !self.enabled {
            GateDecision {
                enabled: false,
                reason: GateReason::GloballyDisabled,
            }
        } else if self.blacklist.contains(session_id) {
            GateDecision {
                enabled: false,
                reason: GateReason::Blacklisted,
            }
        } else if !self.whitelist.is_empty() {
            let listed = self.whitelist.contains(session_id);
            GateDecision {
                enabled: listed,
                reason: if listed {
                    GateReason::Whitelisted
                } else {
                    GateReason::NotWhitelisted
                },
            }
        } else if self.percentage >= 100 {
            GateDecision {
                enabled: true,
                reason: GateReason::FullRollout,
            }
        } else {
            GateDecision {
                enabled: rollout_bucket(session_id) < u32::from(self.percentage),
                reason: GateReason::PercentageBucket,
            }
        };

        tracing::info!(
            stage = "feature_flag",
            session_id = %session_id,
            enabled = decision.enabled,
            reason = decision.reason.as_str(),
            "timeline pipeline gate evaluated"
        );
        decision
    }

    #[inline]
    pub fn is_new_pipeline_enabled(&self, session_id: &str) -> bool {
        self.decide(session_id).enabled
    }

    /// One-line description for startup logs.
    pub fn summary(&self) -> String {
        format!(
            "enabled={} percentage={} whitelist={} blacklist={}",
            self.enabled,
            self.percentage,
            self.whitelist.len(),
            self.blacklist.len()
        )
    }
}

/// Sticky rollout bucket of a session, in `0..100`.
#[inline]
pub fn rollout_bucket(session_id: &str) -> u32 {
    sticky_hash(session_id) % 100
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}
