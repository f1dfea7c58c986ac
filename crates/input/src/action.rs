use std::fmt;
use std::str::FromStr;

/// A ship command a key can be bound to.
///
/// The session consumes actions, never raw input events, so any device that
/// can produce them drives the same simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    PitchUp,
    PitchDown,
    YawLeft,
    YawRight,
    /// Held: burn boost energy.
    Boost,
    /// Pressed: fire a shockwave if off cooldown.
    Shockwave,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::PitchUp,
        Action::PitchDown,
        Action::YawLeft,
        Action::YawRight,
        Action::Boost,
        Action::Shockwave,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Action::PitchUp => "pitch_up",
            Action::PitchDown => "pitch_down",
            Action::YawLeft => "yaw_left",
            Action::YawRight => "yaw_right",
            Action::Boost => "boost",
            Action::Shockwave => "shockwave",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action: {0}")]
pub struct ActionParseError(pub String);

impl FromStr for Action {
    type Err = ActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ActionParseError(s.to_string()))
    }
}
