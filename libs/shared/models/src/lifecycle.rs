use std::fmt;

use thiserror::Error;

/// Shared scheduling lifecycle for consultations and testing-service bookings.
///
/// Both entities move through the same coarse states; the transition table
/// below is the single source of truth for which events are legal from which
/// state. `Completed` and `Cancelled` are terminal for every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingState {
    Confirmed,
    Rescheduled,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingEvent {
    Reschedule,
    Start,
    Complete,
    Cancel,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Cannot {event} a {state} record")]
    Terminal {
        state: BookingState,
        event: BookingEvent,
    },

    #[error("Event {event} is not allowed from state {state}")]
    NotAllowed {
        state: BookingState,
        event: BookingEvent,
    },
}

impl fmt::Display for BookingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingState::Confirmed => write!(f, "confirmed"),
            BookingState::Rescheduled => write!(f, "rescheduled"),
            BookingState::InProgress => write!(f, "in_progress"),
            BookingState::Completed => write!(f, "completed"),
            BookingState::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl fmt::Display for BookingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingEvent::Reschedule => write!(f, "reschedule"),
            BookingEvent::Start => write!(f, "start"),
            BookingEvent::Complete => write!(f, "complete"),
            BookingEvent::Cancel => write!(f, "cancel"),
        }
    }
}

impl BookingState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingState::Completed | BookingState::Cancelled)
    }
}

/// The state x event table. Returns the next state, or the error the caller
/// surfaces as a 400.
pub fn transition(
    state: BookingState,
    event: BookingEvent,
) -> Result<BookingState, TransitionError> {
    use BookingEvent::*;
    use BookingState::*;

    if state.is_terminal() {
        return Err(TransitionError::Terminal { state, event });
    }

    match (state, event) {
        (Confirmed, Reschedule) | (Rescheduled, Reschedule) => Ok(Rescheduled),
        (Confirmed, Start) => Ok(InProgress),
        (Confirmed, Complete) | (Rescheduled, Complete) | (InProgress, Complete) => Ok(Completed),
        (_, Cancel) => Ok(Cancelled),
        (state, event) => Err(TransitionError::NotAllowed { state, event }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BookingEvent::*;
    use BookingState::*;

    #[test]
    fn confirmed_can_be_rescheduled_started_completed_cancelled() {
        assert_eq!(transition(Confirmed, Reschedule), Ok(Rescheduled));
        assert_eq!(transition(Confirmed, Start), Ok(InProgress));
        assert_eq!(transition(Confirmed, Complete), Ok(Completed));
        assert_eq!(transition(Confirmed, Cancel), Ok(Cancelled));
    }

    #[test]
    fn rescheduled_cannot_start() {
        assert_eq!(
            transition(Rescheduled, Start),
            Err(TransitionError::NotAllowed {
                state: Rescheduled,
                event: Start
            })
        );
    }

    #[test]
    fn in_progress_cannot_be_rescheduled() {
        assert_eq!(
            transition(InProgress, Reschedule),
            Err(TransitionError::NotAllowed {
                state: InProgress,
                event: Reschedule
            })
        );
        assert_eq!(transition(InProgress, Complete), Ok(Completed));
        assert_eq!(transition(InProgress, Cancel), Ok(Cancelled));
    }

    #[test]
    fn completed_is_terminal_for_every_event() {
        for event in [Reschedule, Start, Complete, Cancel] {
            assert_eq!(
                transition(Completed, event),
                Err(TransitionError::Terminal {
                    state: Completed,
                    event
                })
            );
        }
    }

    #[test]
    fn cancelled_is_terminal_for_every_event() {
        // Double-cancel raises rather than no-oping.
        for event in [Reschedule, Start, Complete, Cancel] {
            assert_eq!(
                transition(Cancelled, event),
                Err(TransitionError::Terminal {
                    state: Cancelled,
                    event
                })
            );
        }
    }
}
