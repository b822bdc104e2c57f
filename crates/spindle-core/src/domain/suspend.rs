//! Suspend request: the value a script hands back when it wants to park.

use serde::{Deserialize, Serialize};

/// Why and for how long a script wants to pause.
///
/// Built through [`Suspend::seconds`] / [`Suspend::signal`] so the delay is
/// always clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Suspend {
    /// Wake once the scheduler clock has advanced by this many seconds.
    Seconds(f64),

    /// Wake on the tick a signal with this name is raised.
    Signal(String),
}

impl Suspend {
    /// Wait `delay` seconds. Negative delays and NaN clamp to zero.
    pub fn seconds(delay: f64) -> Self {
        Suspend::Seconds(delay.max(0.0))
    }

    /// Wait for the named signal.
    pub fn signal(name: impl Into<String>) -> Self {
        Suspend::Signal(name.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1.5, 1.5)]
    #[case(0.0, 0.0)]
    #[case(-2.0, 0.0)]
    #[case(f64::NAN, 0.0)]
    fn seconds_are_clamped(#[case] input: f64, #[case] expected: f64) {
        assert_eq!(Suspend::seconds(input), Suspend::Seconds(expected));
    }

    #[test]
    fn infinite_delay_is_kept() {
        assert_eq!(
            Suspend::seconds(f64::INFINITY),
            Suspend::Seconds(f64::INFINITY)
        );
    }

    #[test]
    fn signal_keeps_its_name() {
        assert_eq!(Suspend::signal("done"), Suspend::Signal("done".to_string()));
    }
}
