use crate::{models::TypeId, scope::ScopeId, symbol::Symbol};
use std::cell::RefCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupScope {
    Scope(ScopeId),
    Type(TypeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LookupRecord {
    pub scope: LookupScope,
    pub name: Symbol,
}

/// Receives every name lookup for incremental dependency tracking.
pub trait LookupTracker {
    fn record(&self, scope: LookupScope, name: Symbol);
}

pub struct NoopLookupTracker;

impl LookupTracker for NoopLookupTracker {
    fn record(&self, _: LookupScope, _: Symbol) {}
}

#[derive(Debug, Default)]
pub struct RecordingLookupTracker {
    records: RefCell<Vec<LookupRecord>>,
}

impl RecordingLookupTracker {
    pub fn new() -> RecordingLookupTracker {
        Default::default()
    }

    pub fn records(&self) -> Vec<LookupRecord> {
        self.records.borrow().clone()
    }

    pub fn contains(&self, scope: LookupScope, name: Symbol) -> bool {
        self.records
            .borrow()
            .iter()
            .any(|record| record.scope == scope && record.name == name)
    }
}

impl LookupTracker for RecordingLookupTracker {
    fn record(&self, scope: LookupScope, name: Symbol) {
        self.records.borrow_mut().push(LookupRecord { scope, name });
    }
}
