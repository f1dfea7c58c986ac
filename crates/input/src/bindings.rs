use std::collections::BTreeMap;

use crate::action::{Action, ActionParseError};

/// Lowercase key name to action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    keys: BTreeMap<String, Action>,
}

impl KeyBindings {
    pub fn empty() -> Self {
        Self {
            keys: BTreeMap::new(),
        }
    }

    pub fn bind(&mut self, key: &str, action: Action) {
        self.keys.insert(key.to_ascii_lowercase(), action);
    }

    /// Bind by action name, e.g. `("q", "shockwave")`.
    pub fn bind_named(&mut self, key: &str, action: &str) -> Result<(), ActionParseError> {
        let action = action.parse()?;
        self.bind(key, action);
        Ok(())
    }

    pub fn unbind(&mut self, key: &str) -> Option<Action> {
        self.keys.remove(&key.to_ascii_lowercase())
    }

    pub fn action_for(&self, key: &str) -> Option<Action> {
        self.keys.get(&key.to_ascii_lowercase()).copied()
    }

    /// Every key bound to `action`, in key order.
    pub fn keys_for(&self, action: Action) -> impl Iterator<Item = &str> {
        self.keys
            .iter()
            .filter(move |(_, a)| **a == action)
            .map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = Self::empty();
        for (key, action) in [
            ("w", Action::PitchUp),
            ("arrowup", Action::PitchUp),
            ("s", Action::PitchDown),
            ("arrowdown", Action::PitchDown),
            ("a", Action::YawLeft),
            ("arrowleft", Action::YawLeft),
            ("d", Action::YawRight),
            ("arrowright", Action::YawRight),
            ("shift", Action::Boost),
            ("e", Action::Shockwave),
        ] {
            bindings.bind(key, action);
        }
        bindings
    }
}

/// Controls for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlState {
    pub pitch_up: bool,
    pub pitch_down: bool,
    pub yaw_left: bool,
    pub yaw_right: bool,
    pub boost: bool,
    pub shockwave: bool,
}

impl ControlState {
    /// Fold the currently held keys through `bindings`. Unbound keys are
    /// ignored.
    pub fn from_keys<'a, I>(bindings: &KeyBindings, held: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut state = Self::default();
        for key in held {
            match bindings.action_for(key) {
                Some(action) => state.press(action),
                None => tracing::trace!(key, "unbound key"),
            }
        }
        state
    }

    pub fn press(&mut self, action: Action) {
        *self.slot(action) = true;
    }

    pub fn release(&mut self, action: Action) {
        *self.slot(action) = false;
    }

    pub fn is_pressed(&self, action: Action) -> bool {
        match action {
            Action::PitchUp => self.pitch_up,
            Action::PitchDown => self.pitch_down,
            Action::YawLeft => self.yaw_left,
            Action::YawRight => self.yaw_right,
            Action::Boost => self.boost,
            Action::Shockwave => self.shockwave,
        }
    }

    fn slot(&mut self, action: Action) -> &mut bool {
        match action {
            Action::PitchUp => &mut self.pitch_up,
            Action::PitchDown => &mut self.pitch_down,
            Action::YawLeft => &mut self.yaw_left,
            Action::YawRight => &mut self.yaw_right,
            Action::Boost => &mut self.boost,
            Action::Shockwave => &mut self.shockwave,
        }
    }
}
