//! Optimistic mutations as an explicit state machine.
//!
//! Every attempt walks `Idle -> Pending -> Committed | RolledBack`. The
//! transitions are pure: each takes the machine and the collection currently
//! stored under the mutation's cache key and returns the next machine plus the
//! collection to store. `Coordinator` drives them around the remote call.

pub mod coordinator;

pub use coordinator::{Coordinator, MutationOutcome};

use shared_types::{Project, Task};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::cache::CacheKey;

/// Anything with a stable server-side identity.
pub trait Entity: Clone + PartialEq {
    fn id(&self) -> i64;
}

impl Entity for Project {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Entity for Task {
    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Pending,
    Committed,
    RolledBack,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    /// Append an entity carrying a temporary id
    Create(T),
    /// Replace the entity with the same id
    Update(T),
}

impl<T: Entity> Patch<T> {
    fn target_id(&self) -> i64 {
        match self {
            Patch::Create(entity) | Patch::Update(entity) => entity.id(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatchKind {
    Create,
    Update,
}

/// The collection under a cache key as it was when the mutation was
/// submitted. Never modified while the mutation is pending.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    key: CacheKey,
    entries: Vec<T>,
}

impl<T: Entity> Snapshot<T> {
    pub fn key(&self) -> CacheKey {
        self.key
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn get(&self, id: i64) -> Option<&T> {
        self.entries.iter().find(|entry| entry.id() == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Cannot apply {event} to a mutation in phase {from:?}")]
pub struct TransitionError {
    pub from: Phase,
    pub event: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mutation<T> {
    phase: Phase,
    key: CacheKey,
    kind: Option<PatchKind>,
    target_id: Option<i64>,
    snapshot: Option<Snapshot<T>>,
    editor_open: bool,
    notice: Option<String>,
}

impl<T: Entity> Mutation<T> {
    /// A fresh attempt for the collection under `key`, with its edit surface open.
    pub fn new(key: CacheKey) -> Self {
        Self {
            phase: Phase::Idle,
            key,
            kind: None,
            target_id: None,
            snapshot: None,
            editor_open: true,
            notice: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn key(&self) -> CacheKey {
        self.key
    }

    pub fn target_id(&self) -> Option<i64> {
        self.target_id
    }

    pub fn snapshot(&self) -> Option<&Snapshot<T>> {
        self.snapshot.as_ref()
    }

    pub fn editor_open(&self) -> bool {
        self.editor_open
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Idle -> Pending: snapshot `current` and apply the optimistic patch.
    pub fn submit(self, current: &[T], patch: Patch<T>) -> Result<(Self, Vec<T>), TransitionError> {
        self.expect_phase(Phase::Idle, "submit")?;

        let target_id = patch.target_id();
        let (kind, next) = match patch {
            Patch::Create(entity) => {
                let mut next = current.to_vec();
                next.push(entity);
                (PatchKind::Create, next)
            }
            Patch::Update(entity) => (PatchKind::Update, replace_by_id(current, target_id, entity)),
        };

        let machine = Self {
            phase: Phase::Pending,
            key: self.key,
            kind: Some(kind),
            target_id: Some(target_id),
            snapshot: Some(Snapshot {
                key: self.key,
                entries: current.to_vec(),
            }),
            editor_open: false,
            notice: None,
        };
        Ok((machine, next))
    }

    /// Pending -> Committed: swap the optimistic entry for the server's copy.
    pub fn succeed(self, current: &[T], confirmed: T) -> Result<(Self, Vec<T>), TransitionError> {
        self.expect_phase(Phase::Pending, "success")?;
        let target_id = self.target_id.unwrap_or_else(|| confirmed.id());

        let next = if current.iter().any(|entry| entry.id() == target_id) {
            let mut next: Vec<T> = replace_by_id(current, target_id, confirmed.clone());
            // A refetch may already have delivered the confirmed entity
            let mut seen = false;
            next.retain(|entry| {
                if entry.id() != confirmed.id() {
                    return true;
                }
                let keep = !seen;
                seen = true;
                keep
            });
            next
        } else if self.kind == Some(PatchKind::Create)
            && !current.iter().any(|entry| entry.id() == confirmed.id())
        {
            let mut next = current.to_vec();
            next.push(confirmed);
            next
        } else {
            current.to_vec()
        };

        let machine = Self {
            phase: Phase::Committed,
            editor_open: false,
            ..self
        };
        Ok((machine, next))
    }

    /// Pending -> RolledBack: put the touched entity back the way the
    /// snapshot had it and reopen the edit surface.
    ///
    /// Only the entity this mutation touched is restored, so other pending
    /// mutations on the same key keep their optimistic entries. With no
    /// interleaved writes the result equals the snapshot exactly.
    pub fn fail(self, current: &[T], notice: impl Into<String>) -> Result<(Self, Vec<T>), TransitionError> {
        self.expect_phase(Phase::Pending, "failure")?;

        let next = match (self.target_id, self.snapshot.as_ref()) {
            (Some(target_id), Some(snapshot)) => match snapshot.get(target_id) {
                Some(original) => replace_by_id(current, target_id, original.clone()),
                // only an optimistic create owns an entry the snapshot lacks
                None if self.kind == Some(PatchKind::Create) => current
                    .iter()
                    .filter(|entry| entry.id() != target_id)
                    .cloned()
                    .collect(),
                None => current.to_vec(),
            },
            _ => current.to_vec(),
        };

        let machine = Self {
            phase: Phase::RolledBack,
            editor_open: true,
            notice: Some(notice.into()),
            ..self
        };
        Ok((machine, next))
    }

    fn expect_phase(&self, phase: Phase, event: &'static str) -> Result<(), TransitionError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(TransitionError {
                from: self.phase,
                event,
            })
        }
    }
}

fn replace_by_id<T: Entity>(current: &[T], id: i64, replacement: T) -> Vec<T> {
    current
        .iter()
        .map(|entry| {
            if entry.id() == id {
                replacement.clone()
            } else {
                entry.clone()
            }
        })
        .collect()
}

/// Hands out ids for optimistic creates: -1, -2, -3, ...
///
/// Server ids are positive, so a temporary id can never collide with one.
#[derive(Debug, Default)]
pub struct TempIds {
    last: AtomicI64,
}

impl TempIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> i64 {
        self.last.fetch_sub(1, Ordering::Relaxed) - 1
    }

    pub fn is_temporary(id: i64) -> bool {
        id < 0
    }
}
