//! Trigger-policy gate for the authentication prompt
//!
//! A two-state machine so the gating logic is testable in isolation: once
//! the user declines re-authentication, the gate latches and no further
//! prompts (or automatic passes) happen until authentication succeeds or
//! the process restarts.

/// State of the prompt gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Automatic sync may run; the user may be prompted to authenticate.
    Armed,
    /// The user declined (or failed) re-authentication; manual sync
    /// required until authentication succeeds.
    LatchedAwaitingAuth,
}

/// Sticky prompt gate, cleared only by successful authentication.
#[derive(Debug, Clone, Copy)]
pub struct PromptGate {
    state: GateState,
}

impl PromptGate {
    pub fn new() -> Self {
        Self { state: GateState::Armed }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_latched(&self) -> bool {
        self.state == GateState::LatchedAwaitingAuth
    }

    /// Latch after a declined or failed authentication prompt.
    pub fn latch(&mut self) {
        self.state = GateState::LatchedAwaitingAuth;
    }

    /// Re-arm after a successful authentication.
    pub fn rearm(&mut self) {
        self.state = GateState::Armed;
    }
}

impl Default for PromptGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_armed() {
        let gate = PromptGate::new();
        assert_eq!(gate.state(), GateState::Armed);
        assert!(!gate.is_latched());
    }

    #[test]
    fn latch_sticks_until_rearmed() {
        let mut gate = PromptGate::new();
        gate.latch();
        assert!(gate.is_latched());
        gate.latch();
        assert!(gate.is_latched());
        gate.rearm();
        assert!(!gate.is_latched());
    }
}
