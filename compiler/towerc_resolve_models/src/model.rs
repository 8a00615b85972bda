use crate::{
    models::{CallableDescriptor, DescriptorId, TypeData, TypeId, TypeKind},
    receiver::{ReceiverOrigin, ReceiverValue, ReceiverValueWithSmartCastInfo},
    scope::{ScopeData, ScopeId, ScopeKind},
    symbol::{Symbol, names},
};
use index_vec::IndexVec;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

/// Owner of every type, callable and scope the resolver can see.
///
/// The model is built up front and is read-only while a call is resolved.
#[derive(Debug, Default)]
pub struct DeclarationModel {
    pub types: IndexVec<TypeId, TypeData>,
    pub descriptors: IndexVec<DescriptorId, CallableDescriptor>,
    pub scopes: IndexVec<ScopeId, ScopeData>,
}

impl DeclarationModel {
    pub fn new() -> DeclarationModel {
        Default::default()
    }
}

impl DeclarationModel {
    pub fn create_type(&mut self, name: &str, kind: TypeKind, supertypes: Vec<TypeId>) -> TypeId {
        let id = self.types.next_idx();
        let member_scope = self.scopes.push(ScopeData::new(ScopeKind::Member(id), None));
        self.types.push(TypeData {
            name: Symbol::new(name),
            kind,
            supertypes,
            member_scope,
        })
    }

    pub fn class_type(&mut self, name: &str) -> TypeId {
        self.create_type(name, TypeKind::Class, vec![])
    }

    pub fn subclass_type(&mut self, name: &str, supertypes: Vec<TypeId>) -> TypeId {
        self.create_type(name, TypeKind::Class, supertypes)
    }

    pub fn dynamic_type(&mut self) -> TypeId {
        self.create_type("dynamic", TypeKind::Dynamic, vec![])
    }

    /// A function value type together with its `invoke` member.
    pub fn function_type(&mut self, name: &str, extension_receiver: Option<TypeId>) -> TypeId {
        let ty = self.create_type(name, TypeKind::Function { extension_receiver }, vec![]);
        let mut invoke = CallableDescriptor::function(names::INVOKE);
        if let Some(receiver) = extension_receiver {
            invoke = invoke.with_extension_receiver(receiver);
        }
        self.add_member(ty, invoke);
        ty
    }

    pub fn create_scope(&mut self, kind: ScopeKind, parent: Option<ScopeId>) -> ScopeId {
        self.scopes.push(ScopeData::new(kind, parent))
    }

    pub fn define(&mut self, scope: ScopeId, descriptor: CallableDescriptor) -> DescriptorId {
        let name = descriptor.name;
        let id = self.descriptors.push(descriptor);
        self.scopes[scope].table.entry(name).or_default().push(id);
        id
    }

    pub fn add_member(&mut self, ty: TypeId, descriptor: CallableDescriptor) -> DescriptorId {
        let scope = self.types[ty].member_scope;
        self.define(scope, descriptor)
    }

    pub fn set_implicit_receiver(
        &mut self,
        scope: ScopeId,
        ty: TypeId,
    ) -> ReceiverValueWithSmartCastInfo {
        let receiver = ReceiverValueWithSmartCastInfo::new(ReceiverValue::new(
            ty,
            ReceiverOrigin::ImplicitThis(scope),
        ));
        self.set_implicit_receiver_value(scope, receiver.clone());
        receiver
    }

    pub fn set_implicit_receiver_value(
        &mut self,
        scope: ScopeId,
        receiver: ReceiverValueWithSmartCastInfo,
    ) {
        self.scopes[scope].implicit_receiver = Some(receiver);
    }

    pub fn add_context_receiver(
        &mut self,
        scope: ScopeId,
        ty: TypeId,
    ) -> ReceiverValueWithSmartCastInfo {
        let receiver = ReceiverValueWithSmartCastInfo::new(ReceiverValue::new(
            ty,
            ReceiverOrigin::ContextReceiver(scope),
        ));
        self.scopes[scope].context_receivers.push(receiver.clone());
        receiver
    }

    pub fn mark_opaque(&mut self, scope: ScopeId) {
        self.scopes[scope].opaque = true;
    }
}

impl DeclarationModel {
    pub fn descriptor(&self, id: DescriptorId) -> &CallableDescriptor {
        &self.descriptors[id]
    }

    pub fn scope(&self, id: ScopeId) -> &ScopeData {
        &self.scopes[id]
    }

    /// The scope itself followed by its parents, innermost first.
    pub fn parents_with_self(&self, scope: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(scope), move |id| self.scopes[*id].parent)
    }

    pub fn is_dynamic(&self, ty: TypeId) -> bool {
        self.types[ty].kind == TypeKind::Dynamic
    }

    pub fn extension_function_receiver(&self, ty: TypeId) -> Option<TypeId> {
        match self.types[ty].kind {
            TypeKind::Function { extension_receiver } => extension_receiver,
            _ => None,
        }
    }

    /// Breadth-first walk of the type and its supertypes, nearest first.
    pub fn supertypes_with_self(&self, ty: TypeId) -> Vec<TypeId> {
        let mut visited = FxHashSet::default();
        let mut queue = VecDeque::from([ty]);
        let mut result = vec![];
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            result.push(current);
            queue.extend(self.types[current].supertypes.iter().copied());
        }
        result
    }

    pub fn is_subtype_of(&self, sub: TypeId, sup: TypeId) -> bool {
        sub == sup || self.supertypes_with_self(sub).contains(&sup)
    }

    /// Members visible on `ty` under `name`, including inherited ones that
    /// are not overridden lower in the hierarchy.
    pub fn members_named(&self, ty: TypeId, name: Symbol) -> Vec<DescriptorId> {
        let mut result: Vec<DescriptorId> = vec![];
        let mut overridden = FxHashSet::default();
        for current in self.supertypes_with_self(ty) {
            let scope = &self.scopes[self.types[current].member_scope];
            for &id in scope.contributed(name) {
                if overridden.contains(&id) || result.contains(&id) {
                    continue;
                }
                overridden.extend(self.overridden_descriptors(id));
                result.push(id);
            }
        }
        result
    }

    /// Every descriptor `id` overrides, nearest first.
    pub fn overridden_descriptors(&self, id: DescriptorId) -> impl Iterator<Item = DescriptorId> + '_ {
        std::iter::successors(self.descriptors[id].overrides, move |&base| {
            self.descriptors[base].overrides
        })
    }

    pub fn type_definitely_does_not_contain_name(&self, ty: TypeId, name: Symbol) -> bool {
        self.supertypes_with_self(ty).into_iter().all(|current| {
            self.scopes[self.types[current].member_scope].definitely_does_not_contain_name(name)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::DescriptorKind, scope::ScopeKind};

    #[test]
    fn test_members_include_supertypes_and_skip_overridden() {
        let mut model = DeclarationModel::new();
        let base = model.class_type("Base");
        let derived = model.subclass_type("Derived", vec![base]);
        let base_foo = model.add_member(base, CallableDescriptor::function("foo"));
        let base_bar = model.add_member(base, CallableDescriptor::function("bar"));
        let derived_foo =
            model.add_member(derived, CallableDescriptor::function("foo").overriding(base_foo));

        assert_eq!(model.members_named(derived, Symbol::new("foo")), vec![derived_foo]);
        assert_eq!(model.members_named(derived, Symbol::new("bar")), vec![base_bar]);
        assert_eq!(model.members_named(base, Symbol::new("foo")), vec![base_foo]);
    }

    #[test]
    fn test_overridden_descriptors_follow_the_whole_chain() {
        let mut model = DeclarationModel::new();
        let a = model.class_type("A");
        let b = model.subclass_type("B", vec![a]);
        let c = model.subclass_type("C", vec![b]);
        let a_foo = model.add_member(a, CallableDescriptor::function("foo"));
        let b_foo = model.add_member(b, CallableDescriptor::function("foo").overriding(a_foo));
        let c_foo = model.add_member(c, CallableDescriptor::function("foo").overriding(b_foo));

        assert_eq!(model.overridden_descriptors(c_foo).collect::<Vec<_>>(), vec![b_foo, a_foo]);
        assert_eq!(model.overridden_descriptors(a_foo).count(), 0);
        assert_eq!(model.members_named(c, Symbol::new("foo")), vec![c_foo]);
    }

    #[test]
    fn test_subtyping_is_transitive() {
        let mut model = DeclarationModel::new();
        let a = model.class_type("A");
        let b = model.subclass_type("B", vec![a]);
        let c = model.subclass_type("C", vec![b]);
        assert!(model.is_subtype_of(c, a));
        assert!(model.is_subtype_of(c, c));
        assert!(!model.is_subtype_of(a, c));
    }

    #[test]
    fn test_negative_name_oracle() {
        let mut model = DeclarationModel::new();
        let ty = model.class_type("A");
        model.add_member(ty, CallableDescriptor::function("foo"));
        assert!(!model.type_definitely_does_not_contain_name(ty, Symbol::new("foo")));
        assert!(model.type_definitely_does_not_contain_name(ty, Symbol::new("bar")));

        let scope = model.create_scope(ScopeKind::Importing, None);
        assert!(model.scope(scope).definitely_does_not_contain_name(Symbol::new("bar")));
        model.mark_opaque(scope);
        assert!(!model.scope(scope).definitely_does_not_contain_name(Symbol::new("bar")));
    }

    #[test]
    fn test_function_type_carries_invoke() {
        let mut model = DeclarationModel::new();
        let receiver = model.class_type("R");
        let ext = model.function_type("R.() -> Unit", Some(receiver));
        let invokes = model.members_named(ext, names::invoke());
        assert_eq!(invokes.len(), 1);
        let invoke = model.descriptor(invokes[0]);
        assert_eq!(invoke.kind, DescriptorKind::Function);
        assert_eq!(invoke.extension_receiver, Some(receiver));
        assert_eq!(model.extension_function_receiver(ext), Some(receiver));
    }

    #[test]
    fn test_parents_with_self_walks_outward() {
        let mut model = DeclarationModel::new();
        let outer = model.create_scope(ScopeKind::Importing, None);
        let inner = model.create_scope(
            ScopeKind::Lexical {
                with_local_descriptors: true,
            },
            Some(outer),
        );
        let chain: Vec<_> = model.parents_with_self(inner).collect();
        assert_eq!(chain, vec![inner, outer]);
    }
}
