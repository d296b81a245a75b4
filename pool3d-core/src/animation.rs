/// Shot animation states and the per-state clock
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationState {
    Ready,
    Aiming,
    Hit,
    Rolling,
    Pocket,
    End,
}

impl AnimationState {
    /// Whether the start input is accepted in this state.
    pub fn accepts_start(self) -> bool {
        matches!(self, AnimationState::Ready | AnimationState::End)
    }
}

impl fmt::Display for AnimationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnimationState::Ready => "ready",
            AnimationState::Aiming => "aiming",
            AnimationState::Hit => "hit",
            AnimationState::Rolling => "rolling",
            AnimationState::Pocket => "pocket",
            AnimationState::End => "end",
        };
        f.write_str(name)
    }
}

/// Current state plus seconds elapsed since the clock was last reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Animation {
    state: AnimationState,
    elapsed: f32,
}

impl Animation {
    pub fn new() -> Self {
        Self {
            state: AnimationState::Ready,
            elapsed: 0.0,
        }
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn tick(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    /// Switches state and resets the clock.
    pub fn enter(&mut self, state: AnimationState) {
        log::info!("animation: {} -> {} after {:.3}s", self.state, state, self.elapsed);
        self.state = state;
        self.elapsed = 0.0;
    }

    /// Switches state without touching the clock.
    ///
    /// `end` is reached this way from `rolling` and `pocket`; it has no timer of its own.
    pub fn set(&mut self, state: AnimationState) {
        log::info!("animation: {} -> {}", self.state, state);
        self.state = state;
    }

    /// Start input: begins aiming from `ready` or `end`, ignored otherwise.
    pub fn start(&mut self) -> bool {
        if !self.state.accepts_start() {
            log::debug!("animation: start ignored while {}", self.state);
            return false;
        }
        self.enter(AnimationState::Aiming);
        true
    }
}

impl Default for Animation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_ready() {
        let anim = Animation::new();
        assert_eq!(anim.state(), AnimationState::Ready);
        assert_eq!(anim.elapsed(), 0.0);
    }

    #[test]
    fn start_only_from_ready_or_end() {
        let mut anim = Animation::new();
        assert!(anim.start());
        assert_eq!(anim.state(), AnimationState::Aiming);

        anim.tick(0.5);
        assert!(!anim.start());
        assert_eq!(anim.elapsed(), 0.5);

        anim.set(AnimationState::End);
        assert!(anim.start());
        assert_eq!(anim.elapsed(), 0.0);
    }

    #[test]
    fn enter_resets_clock_but_set_does_not() {
        let mut anim = Animation::new();
        anim.tick(1.0);
        anim.set(AnimationState::Rolling);
        assert_eq!(anim.elapsed(), 1.0);
        anim.enter(AnimationState::Pocket);
        assert_eq!(anim.elapsed(), 0.0);
    }

    #[test]
    fn display_names() {
        assert_eq!(AnimationState::Rolling.to_string(), "rolling");
        assert_eq!(AnimationState::Pocket.to_string(), "pocket");
    }
}
