use super::ImplicitScopeTower;
use crate::candidate::{CandidateWithBoundDispatchReceiver, ResolutionDiagnostic};
use rustc_hash::FxHashSet;
use towerc_resolve_models::{
    CallableCategory, DescriptorFlags, DescriptorId, LookupScope, QualifierReceiver,
    ReceiverValueWithSmartCastInfo, ScopeId, Symbol,
};

/// A place where callables of a given name can be found.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeTowerLevel {
    /// Members of one receiver, bound to it as dispatch receiver.
    MemberScope {
        dispatch_receiver: ReceiverValueWithSmartCastInfo,
    },
    ScopeBased {
        scope: ScopeId,
    },
    ImportingScopeBased {
        scope: ScopeId,
    },
    SyntheticScopeBased,
    HidesMembers,
    ContextReceiversGroup {
        receivers: Vec<ReceiverValueWithSmartCastInfo>,
    },
    Qualifier {
        qualifier: QualifierReceiver,
    },
}

impl ScopeTowerLevel {
    pub fn collect_candidates(
        &self,
        tower: &ImplicitScopeTower<'_>,
        category: CallableCategory,
        name: Symbol,
        extension_receiver: Option<&ReceiverValueWithSmartCastInfo>,
    ) -> Vec<CandidateWithBoundDispatchReceiver> {
        match self {
            ScopeTowerLevel::MemberScope { dispatch_receiver } => {
                collect_members(tower, dispatch_receiver, category, name)
            }
            ScopeTowerLevel::ScopeBased { scope }
            | ScopeTowerLevel::ImportingScopeBased { scope } => {
                collect_from_scope(tower, *scope, category, name)
            }
            ScopeTowerLevel::SyntheticScopeBased => match extension_receiver {
                Some(receiver) => collect_synthetic(tower, receiver, category, name),
                None => vec![],
            },
            ScopeTowerLevel::HidesMembers => {
                if extension_receiver.is_none() {
                    return vec![];
                }
                collect_hides_members(tower, category, name)
            }
            ScopeTowerLevel::ContextReceiversGroup { receivers } => receivers
                .iter()
                .flat_map(|receiver| collect_members(tower, receiver, category, name))
                .collect(),
            ScopeTowerLevel::Qualifier { qualifier } => {
                collect_from_scope(tower, qualifier.static_scope, category, name)
            }
        }
    }

    pub fn record_lookup(&self, tower: &ImplicitScopeTower<'_>, name: Symbol) {
        match self {
            ScopeTowerLevel::MemberScope { dispatch_receiver } => {
                record_receiver_lookup(tower, dispatch_receiver, name)
            }
            ScopeTowerLevel::ScopeBased { scope }
            | ScopeTowerLevel::ImportingScopeBased { scope } => {
                tower.record_lookup(LookupScope::Scope(*scope), name)
            }
            ScopeTowerLevel::SyntheticScopeBased => {
                for &scope in &tower.synthetic_scopes {
                    tower.record_lookup(LookupScope::Scope(scope), name);
                }
            }
            // Qualifier lookups are recorded when the qualifier scope is collected.
            ScopeTowerLevel::HidesMembers | ScopeTowerLevel::Qualifier { .. } => {}
            ScopeTowerLevel::ContextReceiversGroup { receivers } => {
                for receiver in receivers {
                    record_receiver_lookup(tower, receiver, name);
                }
            }
        }
    }
}

fn raw_match(
    tower: &ImplicitScopeTower<'_>,
    descriptor: DescriptorId,
    dispatch_receiver: Option<ReceiverValueWithSmartCastInfo>,
    diagnostics: Vec<ResolutionDiagnostic>,
) -> CandidateWithBoundDispatchReceiver {
    CandidateWithBoundDispatchReceiver {
        dispatch_receiver,
        descriptor,
        diagnostics,
        requires_extension_receiver: tower.model.descriptor(descriptor).has_extension_receiver(),
    }
}

fn record_receiver_lookup(
    tower: &ImplicitScopeTower<'_>,
    receiver: &ReceiverValueWithSmartCastInfo,
    name: Symbol,
) {
    for ty in receiver.all_types() {
        tower.record_lookup(LookupScope::Type(ty), name);
    }
}

fn collect_members(
    tower: &ImplicitScopeTower<'_>,
    dispatch_receiver: &ReceiverValueWithSmartCastInfo,
    category: CallableCategory,
    name: Symbol,
) -> Vec<CandidateWithBoundDispatchReceiver> {
    let model = tower.model;
    let admitted = |id: &DescriptorId| category.admits(model.descriptor(*id).kind);
    let mut result = vec![];

    let ty = dispatch_receiver.ty();
    tower.record_lookup(LookupScope::Type(ty), name);
    for id in model.members_named(ty, name).into_iter().filter(admitted) {
        result.push(raw_match(tower, id, Some(dispatch_receiver.clone()), vec![]));
    }

    for &smart_cast in &dispatch_receiver.smart_cast_types {
        tower.record_lookup(LookupScope::Type(smart_cast), name);
        for id in model.members_named(smart_cast, name).into_iter().filter(admitted) {
            if result.iter().any(|candidate| candidate.descriptor == id) {
                continue;
            }
            let diagnostics = if dispatch_receiver.is_stable {
                vec![]
            } else {
                vec![ResolutionDiagnostic::UnstableSmartCast]
            };
            result.push(raw_match(tower, id, Some(dispatch_receiver.clone()), diagnostics));
        }
    }

    // A stable smart cast makes the narrower override the only member to call.
    if dispatch_receiver.is_stable && dispatch_receiver.has_types_from_smart_casts() {
        let overridden: FxHashSet<DescriptorId> = result
            .iter()
            .flat_map(|candidate| model.overridden_descriptors(candidate.descriptor))
            .collect();
        result.retain(|candidate| !overridden.contains(&candidate.descriptor));
    }

    if model.is_dynamic(ty) {
        if let Some(dynamic_scope) = tower.dynamic_scope {
            for &id in model.scope(dynamic_scope).contributed(name) {
                if admitted(&id) {
                    result.push(raw_match(
                        tower,
                        id,
                        Some(dispatch_receiver.clone()),
                        vec![ResolutionDiagnostic::DynamicDescriptor],
                    ));
                }
            }
        }
    }

    result
}

fn collect_from_scope(
    tower: &ImplicitScopeTower<'_>,
    scope: ScopeId,
    category: CallableCategory,
    name: Symbol,
) -> Vec<CandidateWithBoundDispatchReceiver> {
    let model = tower.model;
    tower.record_lookup(LookupScope::Scope(scope), name);
    model
        .scope(scope)
        .contributed(name)
        .iter()
        .filter(|&&id| category.admits(model.descriptor(id).kind))
        .map(|&id| raw_match(tower, id, None, vec![]))
        .collect()
}

fn collect_synthetic(
    tower: &ImplicitScopeTower<'_>,
    receiver: &ReceiverValueWithSmartCastInfo,
    category: CallableCategory,
    name: Symbol,
) -> Vec<CandidateWithBoundDispatchReceiver> {
    let model = tower.model;
    let mut result = vec![];
    for &scope in &tower.synthetic_scopes {
        tower.record_lookup(LookupScope::Scope(scope), name);
        for &id in model.scope(scope).contributed(name) {
            let descriptor = model.descriptor(id);
            if !category.admits(descriptor.kind) {
                continue;
            }
            let Some(parameter) = descriptor.extension_receiver else {
                continue;
            };
            if receiver.all_types().any(|ty| model.is_subtype_of(ty, parameter)) {
                result.push(raw_match(tower, id, None, vec![]));
            }
        }
    }
    result
}

fn collect_hides_members(
    tower: &ImplicitScopeTower<'_>,
    category: CallableCategory,
    name: Symbol,
) -> Vec<CandidateWithBoundDispatchReceiver> {
    let model = tower.model;
    model
        .parents_with_self(tower.lexical_scope)
        .flat_map(|scope| model.scope(scope).contributed(name).iter().copied())
        .filter(|&id| {
            let descriptor = model.descriptor(id);
            category.admits(descriptor.kind)
                && descriptor.has_extension_receiver()
                && descriptor.flags.contains(DescriptorFlags::HIDES_MEMBERS)
        })
        .map(|id| raw_match(tower, id, None, vec![]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::TowerSettings;
    use towerc_resolve_models::{
        CallableDescriptor, DeclarationModel, RecordingLookupTracker, ScopeKind,
    };

    #[test]
    fn test_member_level_adds_smart_cast_members() {
        let mut model = DeclarationModel::new();
        let a = model.class_type("A");
        let b = model.class_type("B");
        let on_a = model.add_member(a, CallableDescriptor::function("foo"));
        let on_b = model.add_member(b, CallableDescriptor::function("foo"));
        let scope = model.create_scope(ScopeKind::Importing, None);
        let settings = TowerSettings::default();
        let tracker = RecordingLookupTracker::new();
        let tower = ImplicitScopeTower::new(&model, scope, &settings, &tracker);
        let name = Symbol::new("foo");

        let receiver = ReceiverValueWithSmartCastInfo::expression(a)
            .with_smart_cast(b)
            .unstable();
        let level = ScopeTowerLevel::MemberScope {
            dispatch_receiver: receiver,
        };
        let found = level.collect_candidates(&tower, CallableCategory::Functions, name, None);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].descriptor, on_a);
        assert!(found[0].diagnostics.is_empty());
        assert_eq!(found[1].descriptor, on_b);
        assert_eq!(found[1].diagnostics, vec![ResolutionDiagnostic::UnstableSmartCast]);
        assert!(tracker.contains(LookupScope::Type(a), name));
        assert!(tracker.contains(LookupScope::Type(b), name));

        let variables = level.collect_candidates(&tower, CallableCategory::Variables, name, None);
        assert!(variables.is_empty());
    }

    #[test]
    fn test_synthetic_level_needs_a_matching_receiver() {
        let mut model = DeclarationModel::new();
        let a = model.class_type("A");
        let other = model.class_type("Other");
        let synthetic = model.create_scope(ScopeKind::Synthetic, None);
        let property = model.define(
            synthetic,
            CallableDescriptor::variable("size", a).with_extension_receiver(a),
        );
        let scope = model.create_scope(ScopeKind::Importing, None);
        let settings = TowerSettings::default();
        let tracker = RecordingLookupTracker::new();
        let tower =
            ImplicitScopeTower::new(&model, scope, &settings, &tracker).with_synthetic_scope(synthetic);
        let name = Symbol::new("size");
        let level = ScopeTowerLevel::SyntheticScopeBased;
        let category = CallableCategory::Variables;

        assert!(level.collect_candidates(&tower, category, name, None).is_empty());
        let on_other = ReceiverValueWithSmartCastInfo::expression(other);
        assert!(level.collect_candidates(&tower, category, name, Some(&on_other)).is_empty());
        let on_a = ReceiverValueWithSmartCastInfo::expression(a);
        let found = level.collect_candidates(&tower, category, name, Some(&on_a));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].descriptor, property);
        assert!(found[0].requires_extension_receiver);
    }

    #[test]
    fn test_hides_members_level_only_takes_flagged_extensions() {
        let mut model = DeclarationModel::new();
        let list = model.class_type("List");
        let scope = model.create_scope(ScopeKind::Importing, None);
        let flagged = model.define(
            scope,
            CallableDescriptor::function("forEach")
                .with_extension_receiver(list)
                .with_flags(DescriptorFlags::HIDES_MEMBERS),
        );
        model.define(
            scope,
            CallableDescriptor::function("forEach").with_extension_receiver(list),
        );
        let settings = TowerSettings::default();
        let tracker = RecordingLookupTracker::new();
        let tower = ImplicitScopeTower::new(&model, scope, &settings, &tracker);
        let name = Symbol::new("forEach");
        let receiver = ReceiverValueWithSmartCastInfo::expression(list);

        let found = ScopeTowerLevel::HidesMembers.collect_candidates(
            &tower,
            CallableCategory::Functions,
            name,
            Some(&receiver),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].descriptor, flagged);

        ScopeTowerLevel::HidesMembers.record_lookup(&tower, name);
        assert!(tracker.records().is_empty());
    }

    #[test]
    fn test_stable_smart_cast_drops_overridden_members() {
        let mut model = DeclarationModel::new();
        let a = model.class_type("A");
        let b = model.subclass_type("B", vec![a]);
        let a_foo = model.add_member(a, CallableDescriptor::function("foo"));
        let b_foo = model.add_member(b, CallableDescriptor::function("foo").overriding(a_foo));
        let scope = model.create_scope(ScopeKind::Importing, None);
        let settings = TowerSettings::default();
        let tracker = RecordingLookupTracker::new();
        let tower = ImplicitScopeTower::new(&model, scope, &settings, &tracker);
        let name = Symbol::new("foo");

        let stable = ReceiverValueWithSmartCastInfo::expression(a).with_smart_cast(b);
        let level = ScopeTowerLevel::MemberScope {
            dispatch_receiver: stable.clone(),
        };
        let found = level.collect_candidates(&tower, CallableCategory::Functions, name, None);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].descriptor, b_foo);

        let level = ScopeTowerLevel::MemberScope {
            dispatch_receiver: stable.unstable(),
        };
        let found = level.collect_candidates(&tower, CallableCategory::Functions, name, None);
        let ids: Vec<_> = found.iter().map(|candidate| candidate.descriptor).collect();
        assert_eq!(ids, vec![a_foo, b_foo]);
    }

    #[test]
    fn test_qualifier_level_records_on_collection_only() {
        let mut model = DeclarationModel::new();
        let statics = model.create_scope(ScopeKind::Static, None);
        model.define(statics, CallableDescriptor::function("of"));
        let scope = model.create_scope(ScopeKind::Importing, None);
        let settings = TowerSettings::default();
        let tracker = RecordingLookupTracker::new();
        let tower = ImplicitScopeTower::new(&model, scope, &settings, &tracker);
        let name = Symbol::new("of");
        let level = ScopeTowerLevel::Qualifier {
            qualifier: QualifierReceiver {
                static_scope: statics,
                class_value_receiver: None,
            },
        };

        level.record_lookup(&tower, name);
        assert!(tracker.records().is_empty());

        let found = level.collect_candidates(&tower, CallableCategory::Functions, name, None);
        assert_eq!(found.len(), 1);
        assert_eq!(tracker.records().len(), 1);
        assert!(tracker.contains(LookupScope::Scope(statics), name));
    }
}
