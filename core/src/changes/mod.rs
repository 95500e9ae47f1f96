//! Highlighting of procedures that appeared since the previous refresh.
//!
//! A viewer keeps one [`Snapshot`] per test and threads it through each
//! refresh: [`detect`] compares the fresh list against it and returns the
//! snapshot to use next time. Nothing here is persisted, so a new viewer
//! starts with an empty snapshot and sees every entry as new.

use crate::types::Procedure;

/// The procedure list a viewer last rendered for one test.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    procedures: Vec<Procedure>,
}

impl Snapshot {
    pub fn new(procedures: Vec<Procedure>) -> Self {
        Self { procedures }
    }

    pub fn procedures(&self) -> &[Procedure] {
        &self.procedures
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }

    fn contains(&self, procedure: &Procedure) -> bool {
        self.procedures.contains(procedure)
    }
}

/// One row of a refreshed list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observed {
    pub index: usize,
    pub procedure: Procedure,
    pub is_new: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refresh {
    pub entries: Vec<Observed>,
    /// Replaces the previous snapshot for the next refresh.
    pub snapshot: Snapshot,
}

impl Refresh {
    pub fn new_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_new).count()
    }

    pub fn new_entries(&self) -> impl Iterator<Item = &Observed> {
        self.entries.iter().filter(|entry| entry.is_new)
    }
}

/// Flags every entry of `current` without an equal entry in `previous`.
///
/// Equality covers the whole record, so an edited procedure counts as new.
pub fn detect(previous: &Snapshot, current: Vec<Procedure>) -> Refresh {
    let entries = current
        .iter()
        .enumerate()
        .map(|(index, procedure)| Observed {
            index,
            procedure: procedure.clone(),
            is_new: !previous.contains(procedure),
        })
        .collect();

    Refresh {
        entries,
        snapshot: Snapshot::new(current),
    }
}
