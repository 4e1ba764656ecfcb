//! Fire-and-forget sound triggers.
//!
//! Gameplay queues `Sound`s on the session while a frame is simulated; the
//! game flushes them to an `Audio` implementation at the end of the frame.

/// Named sound cues the simulation can request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sound {
    Background,
    PowerUp,
    PowerDown,
    Explosion,
    Shot,
    Hit,
    Shield,
}

pub trait Audio {
    fn play(&mut self, sound: Sound);
}

/// Swallows every cue.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

impl Audio for Silent {
    fn play(&mut self, _sound: Sound) {}
}

/// Records cues in order; handy for tests and replays.
impl Audio for Vec<Sound> {
    fn play(&mut self, sound: Sound) {
        self.push(sound);
    }
}
