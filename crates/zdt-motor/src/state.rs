/// Caller-observed motion state. Nothing here polls the firmware; a
/// [`crate::MotorController`] advances this after each operation that
/// successfully changes it, and a caller who wants certainty about whether
/// `Moving` has actually settled still needs to read `in_position` off
/// `read_motor_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionState {
    #[default]
    Idle,
    Enabled,
    Moving,
    StallProtected,
}

/// Events that can move a motor session between [`MotionState`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionEvent {
    Enabled,
    Disabled,
    MoveIssued,
    Settled,
    Stopped,
    Stalled,
    StallReleased,
}

/// Pure transition function: given the current state and an event, returns
/// the next state. Events that make no sense in a given state (e.g.
/// `Settled` while `Idle`) leave the state unchanged.
pub fn transition(state: MotionState, event: MotionEvent) -> MotionState {
    use MotionEvent::*;
    use MotionState::*;

    match (state, event) {
        (Idle, Enabled) => self::MotionState::Enabled,
        (Enabled, Disabled) => Idle,
        (Enabled, MoveIssued) => Moving,
        (Moving, Settled) | (Moving, Stopped) => self::MotionState::Enabled,
        (Moving, Disabled) => Idle,
        (Moving, Stalled) => StallProtected,
        (StallProtected, StallReleased) => self::MotionState::Enabled,
        (StallProtected, Disabled) => Idle,
        (current, _) => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enable_then_move_then_settle() {
        let s = transition(MotionState::Idle, MotionEvent::Enabled);
        assert_eq!(s, MotionState::Enabled);
        let s = transition(s, MotionEvent::MoveIssued);
        assert_eq!(s, MotionState::Moving);
        let s = transition(s, MotionEvent::Settled);
        assert_eq!(s, MotionState::Enabled);
    }

    #[test]
    fn stall_and_release() {
        let s = transition(MotionState::Moving, MotionEvent::Stalled);
        assert_eq!(s, MotionState::StallProtected);
        let s = transition(s, MotionEvent::StallReleased);
        assert_eq!(s, MotionState::Enabled);
    }

    #[test]
    fn disable_from_any_state_returns_to_idle() {
        assert_eq!(transition(MotionState::Enabled, MotionEvent::Disabled), MotionState::Idle);
        assert_eq!(transition(MotionState::Moving, MotionEvent::Disabled), MotionState::Idle);
        assert_eq!(transition(MotionState::StallProtected, MotionEvent::Disabled), MotionState::Idle);
    }

    #[test]
    fn irrelevant_event_is_a_no_op() {
        assert_eq!(transition(MotionState::Idle, MotionEvent::Settled), MotionState::Idle);
    }
}
