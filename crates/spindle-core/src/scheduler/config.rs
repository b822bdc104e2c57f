//! Scheduler configuration.

use serde::{Deserialize, Serialize};

/// How a pause interacts with a wait the task is holding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PausePolicy {
    /// Pausing takes the task out of its wait index and freezes the wait.
    /// A timed wait keeps its remaining duration and restarts counting on
    /// resume; a signal wait is re-registered on resume. Signals raised while
    /// paused are not seen.
    #[default]
    Freeze,

    /// The wait entry stays in its index and the timer keeps running while
    /// paused, but a paused task is never reawakened. A timer that expired
    /// during the pause fires on the first tick after resume.
    Elapse,
}

/// Scheduler configuration.
///
/// Deserializes from a partial document; missing fields take defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub pause_policy: PausePolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_freezes_waits() {
        assert_eq!(SchedulerConfig::default().pause_policy, PausePolicy::Freeze);
    }

    #[test]
    fn deserializes_partial_documents() {
        let empty: SchedulerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, SchedulerConfig::default());

        let elapse: SchedulerConfig =
            serde_json::from_str(r#"{ "pause_policy": "elapse" }"#).unwrap();
        assert_eq!(elapse.pause_policy, PausePolicy::Elapse);
    }
}
