//! Conversion state machine.
//!
//! ```text
//! Init -> Inspected -> Extracted -> AudioReady -> MuxAttempt -> Done
//!                          ^                          |
//!                          +------ Rebuilding <-------+  (frame rate, once)
//! ```
//!
//! Any non-terminal state can move to `Failed`.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// States of one conversion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineState {
    Init,
    Inspected,
    Extracted,
    AudioReady,
    MuxAttempt,
    Rebuilding,
    Done,
    Failed,
}

impl PipelineState {
    /// Whether the run has finished.
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Events reported by the stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    /// Report parsed and streams selected.
    Inspected,
    /// Both elementary streams extracted.
    Extracted,
    /// Audio is AC3 or AAC (converted or passed through).
    AudioReady,
    /// Descriptor written, tsMuxeR about to run.
    MuxStarted,
    /// tsMuxeR succeeded.
    Muxed,
    /// tsMuxeR failed with the frame-rate signature.
    FrameRateUndetected,
    /// A stage failed.
    Failed,
}

/// An event arrived in a state that does not accept it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Invalid pipeline transition: {event:?} in state {from}")]
pub struct InvalidTransition {
    pub from: PipelineState,
    pub event: PipelineEvent,
}

/// Tracks the current state, the visited states and whether the rebuild
/// fallback has been used.
#[derive(Debug, Clone)]
pub struct StateMachine {
    state: PipelineState,
    rebuild_attempted: bool,
    history: Vec<PipelineState>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: PipelineState::Init,
            rebuild_attempted: false,
            history: vec![PipelineState::Init],
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn rebuild_attempted(&self) -> bool {
        self.rebuild_attempted
    }

    /// Every state entered so far, starting with `Init`.
    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    /// Apply an event and return the new state.
    ///
    /// A frame-rate failure moves to `Rebuilding` the first time and to
    /// `Failed` after that.
    pub fn apply(&mut self, event: PipelineEvent) -> Result<PipelineState, InvalidTransition> {
        use PipelineEvent as E;
        use PipelineState as S;

        let next = match (self.state, event) {
            (from, E::Failed) if !from.is_terminal() => S::Failed,
            (S::Init, E::Inspected) => S::Inspected,
            (S::Inspected | S::Rebuilding, E::Extracted) => S::Extracted,
            (S::Extracted, E::AudioReady) => S::AudioReady,
            (S::AudioReady, E::MuxStarted) => S::MuxAttempt,
            (S::MuxAttempt, E::Muxed) => S::Done,
            (S::MuxAttempt, E::FrameRateUndetected) if !self.rebuild_attempted => {
                self.rebuild_attempted = true;
                S::Rebuilding
            }
            (S::MuxAttempt, E::FrameRateUndetected) => S::Failed,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        tracing::trace!("State {} -> {} on {:?}", self.state, next, event);
        self.state = next;
        self.history.push(next);
        Ok(next)
    }

    /// Move to `Failed` unless the run already finished.
    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            self.state = PipelineState::Failed;
            self.history.push(PipelineState::Failed);
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PipelineEvent as E;
    use PipelineState as S;

    fn drive(machine: &mut StateMachine, events: &[PipelineEvent]) {
        for &event in events {
            machine.apply(event).unwrap();
        }
    }

    #[test]
    fn straight_path_reaches_done() {
        let mut machine = StateMachine::new();
        drive(
            &mut machine,
            &[E::Inspected, E::Extracted, E::AudioReady, E::MuxStarted, E::Muxed],
        );
        assert_eq!(machine.state(), S::Done);
        assert!(!machine.rebuild_attempted());
        assert_eq!(
            machine.history(),
            &[S::Init, S::Inspected, S::Extracted, S::AudioReady, S::MuxAttempt, S::Done]
        );
    }

    #[test]
    fn frame_rate_failure_rebuilds_once() {
        let mut machine = StateMachine::new();
        drive(
            &mut machine,
            &[E::Inspected, E::Extracted, E::AudioReady, E::MuxStarted],
        );

        assert_eq!(machine.apply(E::FrameRateUndetected).unwrap(), S::Rebuilding);
        assert!(machine.rebuild_attempted());

        drive(&mut machine, &[E::Extracted, E::AudioReady, E::MuxStarted]);
        assert_eq!(machine.apply(E::FrameRateUndetected).unwrap(), S::Failed);
        assert!(machine.state().is_terminal());
    }

    #[test]
    fn out_of_order_event_is_rejected() {
        let mut machine = StateMachine::new();
        let err = machine.apply(E::MuxStarted).unwrap_err();
        assert_eq!(err.from, S::Init);
        assert_eq!(machine.state(), S::Init);
    }

    #[test]
    fn fail_is_idempotent_and_respects_done() {
        let mut machine = StateMachine::new();
        machine.apply(E::Inspected).unwrap();
        machine.fail();
        machine.fail();
        assert_eq!(machine.history(), &[S::Init, S::Inspected, S::Failed]);
        assert!(machine.apply(E::Failed).is_err());

        let mut done = StateMachine::new();
        drive(
            &mut done,
            &[E::Inspected, E::Extracted, E::AudioReady, E::MuxStarted, E::Muxed],
        );
        done.fail();
        assert_eq!(done.state(), S::Done);
    }
}
