//! Ordered handler registry
//!
//! Registration order is the dispatch priority: the first entry whose
//! predicate matches wins. Predicates are declarative where possible so the
//! registry can report entries that an earlier entry makes unreachable.

use std::{fmt, sync::Arc};

use crate::{
    dispatch::{HandlerInput, RequestHandler},
    envelope::RequestKind,
};

/// Which requests a handler entry accepts
#[derive(Clone)]
pub enum Predicate {
    /// Any request of this kind
    RequestType(RequestKind),
    /// Intent requests whose intent name is one of these
    Intent(Vec<String>),
    /// APL user events raised by this component id
    UserEvent { source_id: String },
    /// Arbitrary check; never considered when looking for overlaps
    Custom(Arc<dyn Fn(&HandlerInput) -> bool + Send + Sync>),
}

impl Predicate {
    pub fn request_type(kind: RequestKind) -> Self {
        Predicate::RequestType(kind)
    }

    pub fn intent(name: &str) -> Self {
        Predicate::Intent(vec![name.to_string()])
    }

    pub fn intents(names: &[&str]) -> Self {
        Predicate::Intent(names.iter().map(|name| name.to_string()).collect())
    }

    pub fn user_event(source_id: &str) -> Self {
        Predicate::UserEvent {
            source_id: source_id.to_string(),
        }
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&HandlerInput) -> bool + Send + Sync + 'static,
    {
        Predicate::Custom(Arc::new(f))
    }

    /// Evaluate against the request; pure and side-effect-free
    pub fn matches(&self, input: &HandlerInput) -> bool {
        let envelope = &input.envelope;
        match self {
            Predicate::RequestType(kind) => envelope.request_kind() == *kind,
            Predicate::Intent(names) => envelope
                .intent_name()
                .map(|name| names.iter().any(|n| n == name))
                .unwrap_or(false),
            Predicate::UserEvent { source_id } => {
                envelope.user_event_source_id() == Some(source_id.as_str())
            }
            Predicate::Custom(f) => f(input),
        }
    }

    /// True when every request `other` accepts is also accepted by `self`
    pub fn subsumes(&self, other: &Predicate) -> bool {
        use Predicate::*;
        match (self, other) {
            (Custom(_), _) | (_, Custom(_)) => false,
            (RequestType(a), RequestType(b)) => a == b,
            (RequestType(kind), Intent(_)) => *kind == RequestKind::Intent,
            (RequestType(kind), UserEvent { .. }) => *kind == RequestKind::UserEvent,
            (Intent(a), Intent(b)) => !b.is_empty() && b.iter().all(|name| a.contains(name)),
            (UserEvent { source_id: a }, UserEvent { source_id: b }) => a == b,
            _ => false,
        }
    }

    /// True when some request could be accepted by both
    pub fn overlaps(&self, other: &Predicate) -> bool {
        use Predicate::*;
        match (self, other) {
            (Custom(_), _) | (_, Custom(_)) => false,
            (RequestType(a), RequestType(b)) => a == b,
            (RequestType(kind), Intent(_)) | (Intent(_), RequestType(kind)) => {
                *kind == RequestKind::Intent
            }
            (RequestType(kind), UserEvent { .. }) | (UserEvent { .. }, RequestType(kind)) => {
                *kind == RequestKind::UserEvent
            }
            (Intent(a), Intent(b)) => a.iter().any(|name| b.contains(name)),
            (UserEvent { source_id: a }, UserEvent { source_id: b }) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::RequestType(kind) => f.debug_tuple("RequestType").field(kind).finish(),
            Predicate::Intent(names) => f.debug_tuple("Intent").field(names).finish(),
            Predicate::UserEvent { source_id } => f
                .debug_struct("UserEvent")
                .field("source_id", source_id)
                .finish(),
            Predicate::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// A named predicate/action pair
#[derive(Clone)]
pub struct HandlerEntry {
    pub name: String,
    pub predicate: Predicate,
    pub handler: Arc<dyn RequestHandler>,
}

impl fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("name", &self.name)
            .field("predicate", &self.predicate)
            .finish_non_exhaustive()
    }
}

/// Two entries that can match the same request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConflict {
    pub earlier: String,
    pub later: String,
    /// The later entry can never run
    pub shadowed: bool,
}

/// Handler entries in dispatch order. Built once, then read-only.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    entries: Vec<HandlerEntry>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry after everything registered so far
    pub fn register<H>(mut self, name: &str, predicate: Predicate, handler: H) -> Self
    where
        H: RequestHandler + 'static,
    {
        self.push(HandlerEntry {
            name: name.to_string(),
            predicate,
            handler: Arc::new(handler),
        });
        self
    }

    pub fn push(&mut self, entry: HandlerEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[HandlerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry whose predicate matches
    pub fn find(&self, input: &HandlerInput) -> Option<&HandlerEntry> {
        self.entries
            .iter()
            .find(|entry| entry.predicate.matches(input))
    }

    /// Pairs of entries whose declarative predicates overlap, in registration order
    pub fn conflicts(&self) -> Vec<RouteConflict> {
        let mut conflicts = Vec::new();
        for (i, earlier) in self.entries.iter().enumerate() {
            for later in &self.entries[i + 1..] {
                if earlier.predicate.overlaps(&later.predicate) {
                    conflicts.push(RouteConflict {
                        earlier: earlier.name.clone(),
                        later: later.name.clone(),
                        shadowed: earlier.predicate.subsumes(&later.predicate),
                    });
                }
            }
        }
        conflicts
    }
}
