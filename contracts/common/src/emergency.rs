//! Emergency Module
//!
//! Pause controls for the peg stability engine. Global pause and redeem
//! pause are two independent switches, modelled as one explicit state
//! machine so every combination and transition is enumerable.
//!
//! ```text
//!                 Pause                      PauseRedeem
//!   Active  ─────────────▶ Paused      Active ─────────▶ RedeemPaused
//!   RedeemPaused ────────▶ PausedRedeemPaused ◀──────── Paused
//! ```
//!
//! A transition that would leave the state unchanged is rejected.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::errors::{PegError, PegResult};

// ============================================================================
// Types
// ============================================================================

/// Combined pause state of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum PauseState {
    /// Mint and redeem both open
    #[default]
    Active,
    /// Only redemptions halted
    RedeemPaused,
    /// Globally paused; redeem switch off
    Paused,
    /// Globally paused with the redeem switch also on
    PausedRedeemPaused,
}

/// Requested change to the pause state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum PauseTransition {
    Pause,
    Unpause,
    PauseRedeem,
    UnpauseRedeem,
}

impl PauseTransition {
    /// Stable verb for error messages
    pub fn name(&self) -> &'static str {
        match self {
            PauseTransition::Pause => "pause",
            PauseTransition::Unpause => "unpause",
            PauseTransition::PauseRedeem => "pause redemptions",
            PauseTransition::UnpauseRedeem => "unpause redemptions",
        }
    }
}

/// Whether the redeem switch may be toggled while globally paused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedeemPausePolicy {
    /// Redeem toggles work in every state
    #[default]
    AllowWhileGloballyPaused,
    /// Redeem toggles fail with `Paused` while globally paused
    LockedWhileGloballyPaused,
}

impl PauseState {
    /// True in either globally paused state
    pub fn is_paused(&self) -> bool {
        matches!(self, PauseState::Paused | PauseState::PausedRedeemPaused)
    }

    /// True whenever the redeem switch is on, regardless of global pause
    pub fn is_redeem_paused(&self) -> bool {
        matches!(self, PauseState::RedeemPaused | PauseState::PausedRedeemPaused)
    }

    /// Stable name for error messages
    pub fn name(&self) -> &'static str {
        match self {
            PauseState::Active => "active",
            PauseState::RedeemPaused => "redeem paused",
            PauseState::Paused => "paused",
            PauseState::PausedRedeemPaused => "paused with redeem paused",
        }
    }

    fn from_flags(paused: bool, redeem_paused: bool) -> Self {
        match (paused, redeem_paused) {
            (false, false) => PauseState::Active,
            (false, true) => PauseState::RedeemPaused,
            (true, false) => PauseState::Paused,
            (true, true) => PauseState::PausedRedeemPaused,
        }
    }

    /// Apply a transition, returning the next state
    ///
    /// # Errors
    /// * `InvalidStateTransition` if the transition would not change the state
    /// * `Paused` for a redeem toggle while globally paused under
    ///   [`RedeemPausePolicy::LockedWhileGloballyPaused`]
    pub fn transition(self, transition: PauseTransition, policy: RedeemPausePolicy) -> PegResult<Self> {
        let (paused, redeem_paused) = (self.is_paused(), self.is_redeem_paused());

        let (next_paused, next_redeem_paused) = match transition {
            PauseTransition::Pause => (true, redeem_paused),
            PauseTransition::Unpause => (false, redeem_paused),
            PauseTransition::PauseRedeem | PauseTransition::UnpauseRedeem => {
                if paused && policy == RedeemPausePolicy::LockedWhileGloballyPaused {
                    return Err(PegError::Paused);
                }
                (paused, transition == PauseTransition::PauseRedeem)
            }
        };

        let next = Self::from_flags(next_paused, next_redeem_paused);
        if next == self {
            return Err(PegError::InvalidStateTransition {
                from: self.name(),
                transition: transition.name(),
            });
        }
        Ok(next)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use PauseState::*;
    use PauseTransition::*;

    const ALL_STATES: [PauseState; 4] = [Active, RedeemPaused, Paused, PausedRedeemPaused];
    const ALL_TRANSITIONS: [PauseTransition; 4] = [Pause, Unpause, PauseRedeem, UnpauseRedeem];

    /// Expected outcome under the permissive policy; `None` means rejected
    fn expected_allow(state: PauseState, transition: PauseTransition) -> Option<PauseState> {
        match (state, transition) {
            (Active, Pause) => Some(Paused),
            (Active, PauseRedeem) => Some(RedeemPaused),
            (RedeemPaused, Pause) => Some(PausedRedeemPaused),
            (RedeemPaused, UnpauseRedeem) => Some(Active),
            (Paused, Unpause) => Some(Active),
            (Paused, PauseRedeem) => Some(PausedRedeemPaused),
            (PausedRedeemPaused, Unpause) => Some(RedeemPaused),
            (PausedRedeemPaused, UnpauseRedeem) => Some(Paused),
            _ => None,
        }
    }

    #[test]
    fn test_initial_state_is_active() {
        let state = PauseState::default();
        assert_eq!(state, Active);
        assert!(!state.is_paused());
        assert!(!state.is_redeem_paused());
    }

    #[test]
    fn test_transition_table_allow_policy() {
        for state in ALL_STATES {
            for transition in ALL_TRANSITIONS {
                let result = state.transition(transition, RedeemPausePolicy::AllowWhileGloballyPaused);
                match expected_allow(state, transition) {
                    Some(next) => assert_eq!(result, Ok(next), "{:?} --{:?}-->", state, transition),
                    None => assert!(
                        matches!(result, Err(PegError::InvalidStateTransition { .. })),
                        "{:?} --{:?}--> should be rejected",
                        state,
                        transition
                    ),
                }
            }
        }
    }

    #[test]
    fn test_transition_table_locked_policy() {
        let policy = RedeemPausePolicy::LockedWhileGloballyPaused;
        for state in ALL_STATES {
            for transition in ALL_TRANSITIONS {
                let result = state.transition(transition, policy);
                let redeem_toggle = matches!(transition, PauseRedeem | UnpauseRedeem);
                if state.is_paused() && redeem_toggle {
                    assert_eq!(result, Err(PegError::Paused));
                } else {
                    assert_eq!(
                        result.ok(),
                        expected_allow(state, transition),
                        "{:?} --{:?}-->",
                        state,
                        transition
                    );
                }
            }
        }
    }

    #[test]
    fn test_redeem_pause_survives_global_pause_cycle() {
        let policy = RedeemPausePolicy::default();
        let state = Active
            .transition(PauseRedeem, policy)
            .and_then(|s| s.transition(Pause, policy))
            .and_then(|s| s.transition(Unpause, policy))
            .unwrap();
        assert_eq!(state, RedeemPaused);
    }

    #[test]
    fn test_rejected_transition_message() {
        let err = Paused.transition(Pause, RedeemPausePolicy::default()).unwrap_err();
        assert_eq!(err.to_string(), "cannot pause while paused");
    }
}
