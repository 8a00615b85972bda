use crate::{
    models::{DescriptorId, TypeId},
    scope::ScopeId,
};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReceiverOrigin {
    Expression,
    /// Implicit `this` introduced by a lexical scope.
    ImplicitThis(ScopeId),
    ContextReceiver(ScopeId),
    /// Value of a class reference, e.g. a companion object.
    ClassValue,
    /// Value of a variable about to be invoked.
    Variable(DescriptorId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReceiverValue {
    pub ty: TypeId,
    pub origin: ReceiverOrigin,
}

impl ReceiverValue {
    pub fn new(ty: TypeId, origin: ReceiverOrigin) -> ReceiverValue {
        ReceiverValue { ty, origin }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverValueWithSmartCastInfo {
    pub receiver: ReceiverValue,
    pub smart_cast_types: SmallVec<[TypeId; 2]>,
    pub is_stable: bool,
}

impl ReceiverValueWithSmartCastInfo {
    pub fn new(receiver: ReceiverValue) -> ReceiverValueWithSmartCastInfo {
        ReceiverValueWithSmartCastInfo {
            receiver,
            smart_cast_types: SmallVec::new(),
            is_stable: true,
        }
    }

    pub fn expression(ty: TypeId) -> ReceiverValueWithSmartCastInfo {
        ReceiverValueWithSmartCastInfo::new(ReceiverValue::new(ty, ReceiverOrigin::Expression))
    }

    pub fn with_smart_cast(mut self, ty: TypeId) -> ReceiverValueWithSmartCastInfo {
        self.smart_cast_types.push(ty);
        self
    }

    pub fn unstable(mut self) -> ReceiverValueWithSmartCastInfo {
        self.is_stable = false;
        self
    }

    pub fn ty(&self) -> TypeId {
        self.receiver.ty
    }

    pub fn has_types_from_smart_casts(&self) -> bool {
        !self.smart_cast_types.is_empty()
    }

    /// The original type followed by every smart-cast type.
    pub fn all_types(&self) -> impl Iterator<Item = TypeId> + '_ {
        std::iter::once(self.receiver.ty).chain(self.smart_cast_types.iter().copied())
    }
}

/// A package or class reference used in receiver position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifierReceiver {
    pub static_scope: ScopeId,
    pub class_value_receiver: Option<ReceiverValueWithSmartCastInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailedReceiver {
    Value(ReceiverValueWithSmartCastInfo),
    Qualifier(QualifierReceiver),
}
