use crate::{applicability::Applicability, scope::ScopeId, symbol::Symbol};
use bitflags::bitflags;

index_vec::define_index_type! {
    pub struct TypeId = u32;
}

index_vec::define_index_type! {
    pub struct DescriptorId = u32;
}

#[derive(Debug, Clone)]
pub struct TypeData {
    pub name: Symbol,
    pub kind: TypeKind,
    pub supertypes: Vec<TypeId>,
    pub member_scope: ScopeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    /// Statically unchecked; no member can be proven absent.
    Dynamic,
    /// A function value type. `extension_receiver` is set for `R.() -> T`.
    Function { extension_receiver: Option<TypeId> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    Function,
    Variable,
    Object,
    EnumEntry,
}

/// What a tower level is asked to collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallableCategory {
    Functions,
    Variables,
    Objects,
}

impl CallableCategory {
    pub fn admits(self, kind: DescriptorKind) -> bool {
        match self {
            CallableCategory::Functions => kind == DescriptorKind::Function,
            CallableCategory::Variables => kind == DescriptorKind::Variable,
            CallableCategory::Objects => {
                matches!(kind, DescriptorKind::Object | DescriptorKind::EnumEntry)
            }
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DescriptorFlags: u8 {
        /// Extension allowed to shadow a member with the same shape.
        const HIDES_MEMBERS = 1 << 0;
        /// Extension that may be called on a dynamic receiver.
        const DYNAMIC_EXTENSION = 1 << 1;
        /// A compatibility-preserving resolution must be reported if it loses.
        const REPORT_COMPATIBILITY_WARNING = 1 << 2;
    }
}

#[derive(Debug, Clone)]
pub struct CallableDescriptor {
    pub name: Symbol,
    pub kind: DescriptorKind,
    pub extension_receiver: Option<TypeId>,
    /// Type of the value for variables, objects and enum entries.
    pub value_type: Option<TypeId>,
    /// Verdict of argument checking, known when the candidate is created.
    pub verdict: Applicability,
    /// Verdict only known after the call is completed.
    pub completion_verdict: Option<Applicability>,
    pub overrides: Option<DescriptorId>,
    pub flags: DescriptorFlags,
}

impl CallableDescriptor {
    fn new(name: &str, kind: DescriptorKind) -> CallableDescriptor {
        CallableDescriptor {
            name: Symbol::new(name),
            kind,
            extension_receiver: None,
            value_type: None,
            verdict: Applicability::Resolved,
            completion_verdict: None,
            overrides: None,
            flags: DescriptorFlags::empty(),
        }
    }

    pub fn function(name: &str) -> CallableDescriptor {
        CallableDescriptor::new(name, DescriptorKind::Function)
    }

    pub fn variable(name: &str, ty: TypeId) -> CallableDescriptor {
        CallableDescriptor::new(name, DescriptorKind::Variable).with_value_type(ty)
    }

    pub fn object(name: &str, ty: TypeId) -> CallableDescriptor {
        CallableDescriptor::new(name, DescriptorKind::Object).with_value_type(ty)
    }

    pub fn enum_entry(name: &str, ty: TypeId) -> CallableDescriptor {
        CallableDescriptor::new(name, DescriptorKind::EnumEntry).with_value_type(ty)
    }

    pub fn with_extension_receiver(mut self, ty: TypeId) -> CallableDescriptor {
        self.extension_receiver = Some(ty);
        self
    }

    pub fn with_value_type(mut self, ty: TypeId) -> CallableDescriptor {
        self.value_type = Some(ty);
        self
    }

    pub fn with_verdict(mut self, verdict: Applicability) -> CallableDescriptor {
        self.verdict = verdict;
        self
    }

    pub fn with_completion_verdict(mut self, verdict: Applicability) -> CallableDescriptor {
        self.completion_verdict = Some(verdict);
        self
    }

    pub fn with_flags(mut self, flags: DescriptorFlags) -> CallableDescriptor {
        self.flags |= flags;
        self
    }

    pub fn overriding(mut self, id: DescriptorId) -> CallableDescriptor {
        self.overrides = Some(id);
        self
    }

    pub fn has_extension_receiver(&self) -> bool {
        self.extension_receiver.is_some()
    }

    pub fn is_enum_entry(&self) -> bool {
        self.kind == DescriptorKind::EnumEntry
    }
}
