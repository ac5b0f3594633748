//! The render orchestration state machine.
//!
//! Only one render may be in flight per session. The transitions are pure: `next`
//! takes the current state and an event and returns the state to move to, so the
//! machine can be exercised without a UI or a network.
//!
//! # State Transitions
//!
//! ```text
//!  ┌──────────┐  Trigger   ┌─────────────┐  Succeeded
//!  │          ├───────────►│             ├────────────┐
//!  │   Idle   │            │  Rendering  │            │
//!  │          │◄─────┐     │             ├──┐         │
//!  └──────────┘      │     └─────────────┘  │ Failed  │
//!       ▲            │  ┌──────────────┐    │         │
//!       │            └──┤ RenderFailed │◄───┘         │
//!       │               └──────────────┘              │
//!       └─────────────────────────────────────────────┘
//! ```
//!
//! `RenderFailed` carries the alert to show and is left for `Idle` as soon as the
//! failure has been recorded.
use std::time::Instant;

use crate::error::{EditorError, EditorResult};
use crate::event::Alert;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderState {
    /// No render in flight
    #[default]
    Idle,
    /// Waiting on the inpainting service
    Rendering { started_at: Instant },
    /// The last render failed; the alert still has to reach the user
    RenderFailed { alert: Alert },
}

/// Inputs to the render state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderEvent {
    Trigger { at: Instant },
    Succeeded,
    Failed { alert: Alert },
    Acknowledge,
}

impl RenderState {
    /// Validates whether a transition to the new state is allowed
    pub fn can_transition_to(&self, new_state: &RenderState) -> bool {
        matches!(
            (self, new_state),
            (RenderState::Idle, RenderState::Rendering { .. })
                | (RenderState::Rendering { .. }, RenderState::Idle)
                | (RenderState::Rendering { .. }, RenderState::RenderFailed { .. })
                | (RenderState::RenderFailed { .. }, RenderState::Idle)
        )
    }

    /// The state `event` leads to from here
    pub fn next(&self, event: RenderEvent) -> EditorResult<RenderState> {
        let target = match (self, event) {
            (RenderState::Rendering { .. }, RenderEvent::Trigger { .. }) => {
                return Err(EditorError::RenderInFlight);
            }
            (RenderState::Idle, RenderEvent::Succeeded | RenderEvent::Failed { .. }) => {
                return Err(EditorError::NoRenderInFlight);
            }
            (_, RenderEvent::Trigger { at }) => RenderState::Rendering { started_at: at },
            (_, RenderEvent::Failed { alert }) => RenderState::RenderFailed { alert },
            (RenderState::Rendering { .. }, RenderEvent::Succeeded)
            | (RenderState::RenderFailed { .. }, RenderEvent::Acknowledge) => RenderState::Idle,
            (from, _) => {
                return Err(EditorError::InvalidTransition {
                    from: from.name(),
                    to: "Idle",
                });
            }
        };

        if !self.can_transition_to(&target) {
            return Err(EditorError::InvalidTransition {
                from: self.name(),
                to: target.name(),
            });
        }
        Ok(target)
    }

    pub fn name(&self) -> &'static str {
        match self {
            RenderState::Idle => "Idle",
            RenderState::Rendering { .. } => "Rendering",
            RenderState::RenderFailed { .. } => "RenderFailed",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, RenderState::Idle)
    }

    pub fn is_rendering(&self) -> bool {
        matches!(self, RenderState::Rendering { .. })
    }

    /// When the in-flight render started, if there is one
    pub fn started_at(&self) -> Option<Instant> {
        match self {
            RenderState::Rendering { started_at } => Some(*started_at),
            _ => None,
        }
    }

    pub fn alert(&self) -> Option<Alert> {
        match self {
            RenderState::RenderFailed { alert } => Some(*alert),
            _ => None,
        }
    }
}
