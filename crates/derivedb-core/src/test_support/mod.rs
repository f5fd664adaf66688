//! Test-only helpers: an in-memory record store implementing both
//! collaborator boundaries, the astronomy fixture catalog, and a recording
//! trace sink.

pub(crate) mod fixtures;
pub(crate) mod store;

use crate::{
    ident::{EntityName, Ident},
    obs::{TraceEvent, TraceSink},
};
use std::{cell::RefCell, rc::Rc};

/// Build a test identifier, panicking on invalid input.
pub(crate) fn ident(raw: &str) -> Ident {
    Ident::try_from_str(raw).expect("test identifier should be valid")
}

/// Build a test entity name, panicking on invalid input.
pub(crate) fn entity(raw: &str) -> EntityName {
    EntityName::try_from_str(raw).expect("test entity name should be valid")
}

///
/// RecordingSink
///
/// Trace sink that appends every event to a shared buffer, so tests can
/// assert on wiring registrations, recompute persists, and soft skips.
///

pub(crate) struct RecordingSink {
    events: Rc<RefCell<Vec<TraceEvent>>>,
}

impl RecordingSink {
    pub(crate) fn new() -> (Self, Rc<RefCell<Vec<TraceEvent>>>) {
        let events = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                events: Rc::clone(&events),
            },
            events,
        )
    }
}

impl TraceSink for RecordingSink {
    fn record(&self, event: TraceEvent) {
        self.events.borrow_mut().push(event);
    }
}

/// Count recompute persists for one attribute in a recorded event stream.
pub(crate) fn recomputed_count(events: &[TraceEvent], attribute: &str) -> usize {
    events
        .iter()
        .filter(|event| {
            matches!(
                event,
                TraceEvent::Recomputed { attribute: a, .. } if a.as_str() == attribute
            )
        })
        .count()
}
