mod collector;
mod invoke;
mod level;
mod processor;
mod resolver;


pub use collector::{AllCandidatesCollector, ResultCollector, SuccessfulResultCollector};
pub use invoke::InvokeTowerProcessor;
pub use level::ScopeTowerLevel;
pub use processor::{
    CandidatesQuery, ExplicitReceiverScopeTowerProcessor, InvokeExtensionScopeTowerProcessor,
    KnownResultProcessor, NoExplicitReceiverScopeTowerProcessor, QualifierScopeTowerProcessor,
    ScopeTowerProcessor, VariableAndObjectScopeTowerProcessor,
    create_call_tower_processor_for_explicit_invoke, create_function_processor,
    create_processor_with_receiver_value_or_empty, create_simple_function_processor,
    create_simple_processor, create_variable_and_object_processor, create_variable_processor,
};
pub use resolver::TowerResolver;

use crate::{candidate::CandidateWithBoundDispatchReceiver, settings::TowerSettings};
use rustc_hash::{FxHashMap, FxHashSet};
use std::rc::Rc;
use towerc_resolve_models::{
    DeclarationModel, LookupScope, LookupTracker, ReceiverValueWithSmartCastInfo, ScopeId, Symbol,
    TypeId, names,
};

/// Decides, per lexical scope, whether extensions are looked up for the
/// scope's implicit receiver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImplicitsResolutionFilter {
    #[default]
    Default,
    /// Only the listed scopes resolve extensions for their receivers.
    PerScope(FxHashSet<ScopeId>),
}

/// Everything a single resolution call sees of its surroundings.
pub struct ImplicitScopeTower<'ctx> {
    pub model: &'ctx DeclarationModel,
    /// Innermost scope of the call site.
    pub lexical_scope: ScopeId,
    pub synthetic_scopes: Vec<ScopeId>,
    /// Members available on every dynamic receiver.
    pub dynamic_scope: Option<ScopeId>,
    pub are_context_receivers_enabled: bool,
    pub prune_by_name: bool,
    pub implicits_resolution_filter: ImplicitsResolutionFilter,
    hides_members_names: FxHashSet<Symbol>,
    import_aliases: FxHashMap<Symbol, Symbol>,
    lookups: &'ctx dyn LookupTracker,
}

impl<'ctx> ImplicitScopeTower<'ctx> {
    pub fn new(
        model: &'ctx DeclarationModel,
        lexical_scope: ScopeId,
        settings: &TowerSettings,
        lookups: &'ctx dyn LookupTracker,
    ) -> ImplicitScopeTower<'ctx> {
        ImplicitScopeTower {
            model,
            lexical_scope,
            synthetic_scopes: vec![],
            dynamic_scope: None,
            are_context_receivers_enabled: settings.context_receivers,
            prune_by_name: settings.prune_by_name,
            implicits_resolution_filter: ImplicitsResolutionFilter::Default,
            hides_members_names: settings.hides_members_symbols().collect(),
            import_aliases: Default::default(),
            lookups,
        }
    }

    pub fn with_synthetic_scope(mut self, scope: ScopeId) -> ImplicitScopeTower<'ctx> {
        self.synthetic_scopes.push(scope);
        self
    }

    pub fn with_dynamic_scope(mut self, scope: ScopeId) -> ImplicitScopeTower<'ctx> {
        self.dynamic_scope = Some(scope);
        self
    }

    /// `import a.b.target as alias`
    pub fn with_import_alias(mut self, alias: Symbol, target: Symbol) -> ImplicitScopeTower<'ctx> {
        self.import_aliases.insert(alias, target);
        self
    }

    pub fn with_implicits_resolution_filter(
        mut self,
        filter: ImplicitsResolutionFilter,
    ) -> ImplicitScopeTower<'ctx> {
        self.implicits_resolution_filter = filter;
        self
    }
}

impl<'ctx> ImplicitScopeTower<'ctx> {
    pub fn get_implicit_receiver(&self, scope: ScopeId) -> Option<&'ctx ReceiverValueWithSmartCastInfo> {
        self.model.scope(scope).implicit_receiver.as_ref()
    }

    pub fn get_context_receivers(&self, scope: ScopeId) -> &'ctx [ReceiverValueWithSmartCastInfo] {
        &self.model.scope(scope).context_receivers
    }

    pub fn get_name_for_given_import_alias(&self, name: Symbol) -> Option<Symbol> {
        self.import_aliases.get(&name).copied()
    }

    pub fn is_name_for_hides_member(&self, name: Symbol) -> bool {
        self.hides_members_names.contains(&name)
            || self
                .get_name_for_given_import_alias(name)
                .is_some_and(|target| self.hides_members_names.contains(&target))
    }

    /// The lexical chain paired with whether extensions are resolved for
    /// each scope's implicit receiver.
    pub fn scopes_with_implicits_resolution_info(&self) -> Vec<(ScopeId, bool)> {
        self.model
            .parents_with_self(self.lexical_scope)
            .map(|scope| {
                let resolve_extensions = match &self.implicits_resolution_filter {
                    ImplicitsResolutionFilter::Default => true,
                    ImplicitsResolutionFilter::PerScope(scopes) => scopes.contains(&scope),
                };
                (scope, resolve_extensions)
            })
            .collect()
    }

    pub fn record_lookup(&self, scope: LookupScope, name: Symbol) {
        self.lookups.record(scope, name);
    }
}

impl ImplicitScopeTower<'_> {
    pub fn scope_may_fit_for_name(&self, scope: ScopeId, name: Symbol) -> bool {
        if !self.prune_by_name {
            return true;
        }
        let data = self.model.scope(scope);
        !data.definitely_does_not_contain_name(name)
            || !data.definitely_does_not_contain_name(names::invoke())
    }

    pub fn receiver_may_fit_for_name(
        &self,
        receiver: &ReceiverValueWithSmartCastInfo,
        name: Symbol,
    ) -> bool {
        receiver.all_types().any(|ty| self.type_may_fit_for_name(ty, name))
    }

    fn type_may_fit_for_name(&self, ty: TypeId, name: Symbol) -> bool {
        !self.prune_by_name
            || self.model.is_dynamic(ty)
            || !self.model.type_definitely_does_not_contain_name(ty, name)
            || !self.model.type_definitely_does_not_contain_name(ty, names::invoke())
    }

    /// The `invoke` of an extension function type, e.g. `R.() -> Unit`.
    pub fn get_extension_invoke_candidate_descriptor(
        &self,
        receiver: &ReceiverValueWithSmartCastInfo,
    ) -> Option<CandidateWithBoundDispatchReceiver> {
        let model = self.model;
        let ty = receiver.ty();
        model.extension_function_receiver(ty)?;
        let invoke = model
            .members_named(ty, names::invoke())
            .into_iter()
            .find(|&id| model.descriptor(id).has_extension_receiver())?;
        Some(CandidateWithBoundDispatchReceiver {
            dispatch_receiver: Some(receiver.clone()),
            descriptor: invoke,
            diagnostics: vec![],
            requires_extension_receiver: true,
        })
    }
}

/// One position of the tower, visited in priority order.
#[derive(Debug, Clone)]
pub enum TowerData {
    Empty,
    OnlyImplicitReceiver(ReceiverValueWithSmartCastInfo),
    TowerLevel(Rc<ScopeTowerLevel>),
    BothTowerLevelAndImplicitReceiver(Rc<ScopeTowerLevel>, ReceiverValueWithSmartCastInfo),
    BothTowerLevelAndContextReceiversGroup(Rc<ScopeTowerLevel>, Vec<ReceiverValueWithSmartCastInfo>),
    /// Never resolved; kept so that skipped levels are still recorded.
    ForLookupForNoExplicitReceiver(Rc<ScopeTowerLevel>),
}

impl TowerData {
    pub fn description(&self) -> &'static str {
        match self {
            TowerData::Empty => "empty",
            TowerData::OnlyImplicitReceiver(_) => "implicit receiver",
            TowerData::TowerLevel(_) => "level",
            TowerData::BothTowerLevelAndImplicitReceiver(..) => "level with implicit receiver",
            TowerData::BothTowerLevelAndContextReceiversGroup(..) => {
                "level with context receivers"
            }
            TowerData::ForLookupForNoExplicitReceiver(_) => "lookup only",
        }
    }
}
