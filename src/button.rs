//! # Button FSM
//!
//! Three-state interaction machine for button instances.
//!
//! | from | input | to | event |
//! |------|-------|----|-------|
//! | Up | hover start | Over | hoverIn |
//! | Over | hover end | Up | hoverOut |
//! | Over | press | Down | down |
//! | Down | release | Over | up |
//! | Down | hover end | Up | hoverOut |
//!
//! Every other pair is ignored.

use crate::types::CharacterId;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ButtonState {
    #[default]
    Up,
    Over,
    Down,
}

/// Pointer input delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonInput {
    HoverStart,
    HoverEnd,
    Press,
    Release,
}

/// Handler slot fired by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ButtonEvent {
    HoverIn,
    HoverOut,
    Down,
    Up,
}

impl ButtonEvent {
    pub const ALL: [ButtonEvent; 4] = [
        ButtonEvent::HoverIn,
        ButtonEvent::HoverOut,
        ButtonEvent::Down,
        ButtonEvent::Up,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ButtonEvent::HoverIn => "hoverIn",
            ButtonEvent::HoverOut => "hoverOut",
            ButtonEvent::Down => "down",
            ButtonEvent::Up => "up",
        }
    }
}

impl fmt::Display for ButtonEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity of one button instance. Never reused within a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ButtonKey(pub(crate) u64);

/// Pure transition table.
pub fn transition(state: ButtonState, input: ButtonInput) -> Option<(ButtonState, ButtonEvent)> {
    use ButtonInput::*;
    match (state, input) {
        (ButtonState::Up, HoverStart) => Some((ButtonState::Over, ButtonEvent::HoverIn)),
        (ButtonState::Over, HoverEnd) => Some((ButtonState::Up, ButtonEvent::HoverOut)),
        (ButtonState::Over, Press) => Some((ButtonState::Down, ButtonEvent::Down)),
        (ButtonState::Down, Release) => Some((ButtonState::Over, ButtonEvent::Up)),
        (ButtonState::Down, HoverEnd) => Some((ButtonState::Up, ButtonEvent::HoverOut)),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub(crate) key: ButtonKey,
    pub(crate) character: CharacterId,
    pub(crate) state: ButtonState,
}

impl Button {
    pub fn new(key: ButtonKey, character: CharacterId) -> Self {
        Self {
            key,
            character,
            state: ButtonState::Up,
        }
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    pub fn character(&self) -> CharacterId {
        self.character
    }

    /// Applies one input, returning the event to fire.
    pub fn handle(&mut self, input: ButtonInput) -> Option<ButtonEvent> {
        let (next, event) = transition(self.state, input)?;
        self.state = next;
        Some(event)
    }

    /// Per-frame check: a pointer that left without a hover-end still resets the button.
    pub fn frame_update(&mut self, hovered: bool) -> Option<ButtonEvent> {
        if hovered || self.state == ButtonState::Up {
            return None;
        }
        self.state = ButtonState::Up;
        Some(ButtonEvent::HoverOut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button() -> Button {
        Button::new(ButtonKey(1), CharacterId(9))
    }

    #[test]
    fn hover_then_press_reaches_down() {
        let mut b = button();
        assert_eq!(b.handle(ButtonInput::HoverStart), Some(ButtonEvent::HoverIn));
        assert_eq!(b.handle(ButtonInput::Press), Some(ButtonEvent::Down));
        assert_eq!(b.state(), ButtonState::Down);
        assert_eq!(b.handle(ButtonInput::Release), Some(ButtonEvent::Up));
        assert_eq!(b.state(), ButtonState::Over);
    }

    #[test]
    fn press_from_up_is_ignored() {
        let mut b = button();
        assert_eq!(b.handle(ButtonInput::Press), None);
        assert_eq!(b.handle(ButtonInput::Release), None);
        assert_eq!(b.handle(ButtonInput::HoverEnd), None);
        assert_eq!(b.state(), ButtonState::Up);
    }

    #[test]
    fn release_outside_returns_to_up() {
        let mut b = button();
        b.handle(ButtonInput::HoverStart);
        b.handle(ButtonInput::Press);
        assert_eq!(b.handle(ButtonInput::HoverEnd), Some(ButtonEvent::HoverOut));
        assert_eq!(b.state(), ButtonState::Up);
    }

    #[test]
    fn frame_update_forces_up_when_not_hovered() {
        let mut b = button();
        assert_eq!(b.frame_update(false), None);
        b.handle(ButtonInput::HoverStart);
        assert_eq!(b.frame_update(true), None);
        assert_eq!(b.frame_update(false), Some(ButtonEvent::HoverOut));
        assert_eq!(b.state(), ButtonState::Up);
    }
}
