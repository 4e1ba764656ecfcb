//! Abstract per-frame input: a held movement direction plus discrete events.
//! How keys map onto these is the binary's business.

/// Vertical movement derived from whichever direction key is held.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Movement {
    #[default]
    None,
    Up,
    Down,
}

/// One-shot signals delivered at most once per key press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Fire,
    ToggleDebug,
    Confirm,
}

/// Everything the core reads from the keyboard for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputSnapshot {
    pub movement: Movement,
    pub events: Vec<InputEvent>,
}

impl InputSnapshot {
    /// No key held, no events.
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn with_event(event: InputEvent) -> Self {
        Self {
            movement: Movement::None,
            events: vec![event],
        }
    }

    pub fn moving(movement: Movement) -> Self {
        Self {
            movement,
            events: Vec::new(),
        }
    }
}
