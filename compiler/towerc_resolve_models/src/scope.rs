use crate::{
    models::{DescriptorId, TypeId},
    receiver::ReceiverValueWithSmartCastInfo,
    symbol::Symbol,
};
use rustc_hash::FxHashMap;

index_vec::define_index_type! {
    pub struct ScopeId = u32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// A block, function body or class body on the lexical chain.
    Lexical { with_local_descriptors: bool },
    /// Imported or package-level declarations; never owns receivers.
    Importing,
    Member(TypeId),
    /// Static members reachable through a qualifier, e.g. enum entries.
    Static,
    Synthetic,
    Dynamic,
}

pub type ScopeTable = FxHashMap<Symbol, Vec<DescriptorId>>;

#[derive(Debug, Clone)]
pub struct ScopeData {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub table: ScopeTable,
    pub implicit_receiver: Option<ReceiverValueWithSmartCastInfo>,
    pub context_receivers: Vec<ReceiverValueWithSmartCastInfo>,
    /// An opaque scope cannot prove that it lacks a name.
    pub opaque: bool,
}

impl ScopeData {
    pub fn new(kind: ScopeKind, parent: Option<ScopeId>) -> ScopeData {
        ScopeData {
            kind,
            parent,
            table: Default::default(),
            implicit_receiver: None,
            context_receivers: Default::default(),
            opaque: false,
        }
    }

    pub fn is_lexical(&self) -> bool {
        matches!(self.kind, ScopeKind::Lexical { .. })
    }

    pub fn with_local_descriptors(&self) -> bool {
        matches!(
            self.kind,
            ScopeKind::Lexical {
                with_local_descriptors: true
            }
        )
    }

    pub fn contributed(&self, name: Symbol) -> &[DescriptorId] {
        self.table.get(&name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Negative-only membership check. `false` never proves presence.
    pub fn definitely_does_not_contain_name(&self, name: Symbol) -> bool {
        !self.opaque && !self.table.contains_key(&name)
    }
}
