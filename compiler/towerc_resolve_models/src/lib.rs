mod applicability;
mod lookup;
mod model;
mod models;
mod receiver;
mod scope;
mod symbol;

pub use applicability::Applicability;
pub use lookup::{LookupRecord, LookupScope, LookupTracker, NoopLookupTracker, RecordingLookupTracker};
pub use model::DeclarationModel;
pub use models::{
    CallableCategory, CallableDescriptor, DescriptorFlags, DescriptorId, DescriptorKind, TypeData,
    TypeId, TypeKind,
};
pub use receiver::{
    DetailedReceiver, QualifierReceiver, ReceiverOrigin, ReceiverValue,
    ReceiverValueWithSmartCastInfo,
};
pub use scope::{ScopeData, ScopeId, ScopeKind, ScopeTable};
pub use symbol::{Symbol, names};
