use super::{
    AllCandidatesCollector, ImplicitScopeTower, ResultCollector, ScopeTowerLevel,
    ScopeTowerProcessor, SuccessfulResultCollector, TowerData,
};
use crate::{
    cancel::CancellationToken,
    candidate::Candidate,
    error::ResolveResult,
};
use std::rc::Rc;
use towerc_resolve_models::{ReceiverValueWithSmartCastInfo, ScopeId, Symbol};
use tracing::{debug, debug_span, trace};

type Levels = Rc<[Rc<ScopeTowerLevel>]>;

/// `Some` when a position produced the final answer.
type Found<C> = ResolveResult<Option<Vec<C>>>;

/// Walks the tower of scopes and receivers for one name, highest priority
/// first, until a processor yields a group that stops the search.
#[derive(Debug, Clone, Default)]
pub struct TowerResolver {
    cancellation: CancellationToken,
}

impl TowerResolver {
    pub fn new(cancellation: CancellationToken) -> TowerResolver {
        TowerResolver { cancellation }
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn run_resolve<'ctx, C: Candidate>(
        &self,
        tower: &'ctx ImplicitScopeTower<'ctx>,
        processor: &mut ScopeTowerProcessor<'ctx, C>,
        use_order: bool,
        name: Symbol,
    ) -> ResolveResult<Vec<C>> {
        let mut collector = SuccessfulResultCollector::new();
        Task::new(self, tower, processor, &mut collector, use_order, name).run()
    }

    pub fn collect_all_candidates<'ctx, C: Candidate>(
        &self,
        tower: &'ctx ImplicitScopeTower<'ctx>,
        processor: &mut ScopeTowerProcessor<'ctx, C>,
        name: Symbol,
    ) -> ResolveResult<Vec<C>> {
        let mut collector = AllCandidatesCollector::new();
        Task::new(self, tower, processor, &mut collector, false, name).run()
    }

    /// Feeds a single empty position, for candidates known up front.
    pub fn run_with_empty_tower_data<C: Candidate, R: ResultCollector<C>>(
        &self,
        processor: &mut ScopeTowerProcessor<'_, C>,
        collector: &mut R,
        use_order: bool,
    ) -> ResolveResult<Vec<C>> {
        match self.process_tower_data(processor, collector, use_order, &TowerData::Empty)? {
            Some(result) => Ok(result),
            None => Ok(collector.final_candidates()),
        }
    }

    fn process_tower_data<C: Candidate, R: ResultCollector<C>>(
        &self,
        processor: &mut ScopeTowerProcessor<'_, C>,
        collector: &mut R,
        use_order: bool,
        data: &TowerData,
    ) -> Found<C> {
        self.cancellation.check_canceled()?;

        let groups = processor.process(data);
        let groups = if use_order {
            groups
        } else {
            vec![groups.into_iter().flatten().collect()]
        };

        for group in groups {
            collector.push_candidates(group);
            if let Some(result) = collector.successful_candidates() {
                return Ok(Some(result));
            }
        }

        Ok(None)
    }
}

struct Task<'a, 'ctx, C, R> {
    resolver: &'a TowerResolver,
    tower: &'ctx ImplicitScopeTower<'ctx>,
    processor: &'a mut ScopeTowerProcessor<'ctx, C>,
    result_collector: &'a mut R,
    use_order: bool,
    name: Symbol,
    is_name_for_hides_member: bool,
    skipped_data_for_lookup: Vec<TowerData>,
    local_levels: Option<Levels>,
    non_local_levels: Option<Levels>,
    hides_members_level: Rc<ScopeTowerLevel>,
    synthetic_level: Rc<ScopeTowerLevel>,
    /// One group per lexical scope declaring context receivers, innermost first.
    context_receivers_groups: Vec<Vec<ReceiverValueWithSmartCastInfo>>,
}

impl<'a, 'ctx, C: Candidate, R: ResultCollector<C>> Task<'a, 'ctx, C, R> {
    fn new(
        resolver: &'a TowerResolver,
        tower: &'ctx ImplicitScopeTower<'ctx>,
        processor: &'a mut ScopeTowerProcessor<'ctx, C>,
        result_collector: &'a mut R,
        use_order: bool,
        name: Symbol,
    ) -> Task<'a, 'ctx, C, R> {
        Task {
            resolver,
            tower,
            processor,
            result_collector,
            use_order,
            name,
            is_name_for_hides_member: tower.is_name_for_hides_member(name),
            skipped_data_for_lookup: vec![],
            local_levels: None,
            non_local_levels: None,
            hides_members_level: Rc::new(ScopeTowerLevel::HidesMembers),
            synthetic_level: Rc::new(ScopeTowerLevel::SyntheticScopeBased),
            context_receivers_groups: vec![],
        }
    }

    fn local_levels(&mut self) -> Levels {
        if let Some(levels) = &self.local_levels {
            return levels.clone();
        }

        let model = self.tower.model;
        let mut levels = vec![];
        for scope in model.parents_with_self(self.tower.lexical_scope) {
            if !model.scope(scope).with_local_descriptors() {
                continue;
            }
            let level = Rc::new(ScopeTowerLevel::ScopeBased { scope });
            if self.tower.scope_may_fit_for_name(scope, self.name) {
                levels.push(level);
            } else {
                self.skipped_data_for_lookup.push(TowerData::TowerLevel(level));
            }
        }

        let levels: Levels = levels.into();
        self.local_levels = Some(levels.clone());
        levels
    }

    fn non_local_levels(&mut self) -> Levels {
        if let Some(levels) = &self.non_local_levels {
            return levels.clone();
        }

        let tower = self.tower;
        let model = tower.model;
        let scopes: Vec<ScopeId> = model.parents_with_self(tower.lexical_scope).collect();
        let mut levels = vec![];

        if !tower.are_context_receivers_enabled {
            for scope in scopes {
                if model.scope(scope).is_lexical() {
                    self.add_levels_for_lexical_scope(&mut levels, scope);
                } else {
                    self.add_level_for_importing_scope(&mut levels, scope);
                }
            }
        } else {
            let first_importing = scopes
                .iter()
                .position(|&scope| !model.scope(scope).is_lexical())
                .unwrap_or(scopes.len());
            let (lexical, importing) = scopes.split_at(first_importing);

            let mut groups = vec![];
            for &scope in lexical {
                self.add_levels_for_lexical_scope(&mut levels, scope);
                let group = tower.get_context_receivers(scope);
                if !group.is_empty() {
                    groups.push(group.to_vec());
                }
            }
            for receivers in groups {
                let may_fit = receivers
                    .iter()
                    .any(|receiver| tower.receiver_may_fit_for_name(receiver, self.name));
                let level = Rc::new(ScopeTowerLevel::ContextReceiversGroup { receivers });
                self.add_level(&mut levels, level, may_fit);
            }
            for &scope in importing {
                self.add_level_for_importing_scope(&mut levels, scope);
            }
        }

        let levels: Levels = levels.into();
        self.non_local_levels = Some(levels.clone());
        levels
    }

    fn add_level(&mut self, levels: &mut Vec<Rc<ScopeTowerLevel>>, level: Rc<ScopeTowerLevel>, may_fit: bool) {
        if may_fit {
            levels.push(level);
        } else {
            self.skipped_data_for_lookup
                .push(TowerData::ForLookupForNoExplicitReceiver(level));
        }
    }

    fn add_levels_for_lexical_scope(&mut self, levels: &mut Vec<Rc<ScopeTowerLevel>>, scope: ScopeId) {
        let tower = self.tower;
        if !tower.model.scope(scope).with_local_descriptors() {
            let may_fit = tower.scope_may_fit_for_name(scope, self.name);
            self.add_level(levels, Rc::new(ScopeTowerLevel::ScopeBased { scope }), may_fit);
        }
        if let Some(receiver) = tower.get_implicit_receiver(scope) {
            let may_fit = tower.receiver_may_fit_for_name(receiver, self.name);
            let level = Rc::new(ScopeTowerLevel::MemberScope {
                dispatch_receiver: receiver.clone(),
            });
            self.add_level(levels, level, may_fit);
        }
    }

    fn add_level_for_importing_scope(&mut self, levels: &mut Vec<Rc<ScopeTowerLevel>>, scope: ScopeId) {
        let may_fit = self.tower.scope_may_fit_for_name(scope, self.name);
        self.add_level(levels, Rc::new(ScopeTowerLevel::ImportingScopeBased { scope }), may_fit);
    }

    fn process(&mut self, data: TowerData) -> Found<C> {
        trace!(position = data.description(), "processing tower position");
        let result = self.resolver.process_tower_data(
            &mut *self.processor,
            &mut *self.result_collector,
            self.use_order,
            &data,
        )?;
        if let Some(candidates) = &result {
            debug!(
                position = data.description(),
                candidates = candidates.len(),
                "search stopped"
            );
            self.record_lookups();
        }
        Ok(result)
    }

    fn process_if(&mut self, data: TowerData, may_fit: bool) -> Found<C> {
        if !may_fit {
            trace!(position = data.description(), "skipping tower position");
            self.skipped_data_for_lookup.push(data);
            return Ok(None);
        }
        self.process(data)
    }

    fn record_lookups(&self) {
        self.processor
            .record_lookups(&self.skipped_data_for_lookup, self.name);
    }

    fn run(mut self) -> ResolveResult<Vec<C>> {
        let span = debug_span!("tower_resolve", name = %self.name, use_order = self.use_order);
        let _enter = span.enter();

        if let Some(result) = self.run_positions()? {
            return Ok(result);
        }

        self.record_lookups();
        let result = self.result_collector.final_candidates();
        debug!(candidates = result.len(), "taking final candidates");
        Ok(result)
    }

    fn run_positions(&mut self) -> Found<C> {
        if self.is_name_for_hides_member {
            let level = self.hides_members_level.clone();
            if let Some(result) = self.process(TowerData::TowerLevel(level))? {
                return Ok(Some(result));
            }
        }

        if let Some(result) = self.process(TowerData::Empty)? {
            return Ok(Some(result));
        }

        let level = self.synthetic_level.clone();
        if let Some(result) = self.process(TowerData::TowerLevel(level))? {
            return Ok(Some(result));
        }

        for level in self.local_levels().iter() {
            if let Some(result) = self.process(TowerData::TowerLevel(level.clone()))? {
                return Ok(Some(result));
            }
        }

        let scopes = self.tower.scopes_with_implicits_resolution_info();
        if !self.tower.are_context_receivers_enabled {
            for (scope, resolve_extensions) in scopes {
                let found = if self.tower.model.scope(scope).is_lexical() {
                    self.process_lexical_scope(scope, resolve_extensions)?
                } else {
                    self.process_importing_scope(scope)?
                };
                if found.is_some() {
                    return Ok(found);
                }
            }
            return Ok(None);
        }

        let mut first_importing_scope_passed = false;
        for (scope, resolve_extensions) in scopes {
            if self.tower.model.scope(scope).is_lexical() {
                if let Some(result) = self.process_lexical_scope(scope, resolve_extensions)? {
                    return Ok(Some(result));
                }
                continue;
            }
            if !first_importing_scope_passed {
                first_importing_scope_passed = true;
                if let Some(result) = self.process_context_receiver_groups()? {
                    return Ok(Some(result));
                }
            }
            if let Some(result) = self.process_importing_scope(scope)? {
                return Ok(Some(result));
            }
        }

        if !first_importing_scope_passed {
            return self.process_context_receiver_groups();
        }
        Ok(None)
    }

    fn process_lexical_scope(&mut self, scope: ScopeId, resolve_extensions: bool) -> Found<C> {
        let tower = self.tower;
        if tower.are_context_receivers_enabled {
            let group = tower.get_context_receivers(scope);
            if !group.is_empty() {
                self.context_receivers_groups.push(group.to_vec());
            }
        }

        if !tower.model.scope(scope).with_local_descriptors() {
            let may_fit = tower.scope_may_fit_for_name(scope, self.name);
            let level = Rc::new(ScopeTowerLevel::ScopeBased { scope });
            if let Some(result) = self.process_if(TowerData::TowerLevel(level), may_fit)? {
                return Ok(Some(result));
            }
        }

        match tower.get_implicit_receiver(scope) {
            Some(receiver) => self.process_implicit_receiver(receiver, resolve_extensions),
            None => Ok(None),
        }
    }

    fn process_importing_scope(&mut self, scope: ScopeId) -> Found<C> {
        let may_fit = self.tower.scope_may_fit_for_name(scope, self.name);
        let level = Rc::new(ScopeTowerLevel::ImportingScopeBased { scope });
        self.process_if(TowerData::TowerLevel(level), may_fit)
    }

    fn process_implicit_receiver(
        &mut self,
        receiver: &ReceiverValueWithSmartCastInfo,
        resolve_extensions: bool,
    ) -> Found<C> {
        if self.is_name_for_hides_member {
            let level = self.hides_members_level.clone();
            let data = TowerData::BothTowerLevelAndImplicitReceiver(level, receiver.clone());
            if let Some(result) = self.process(data)? {
                return Ok(Some(result));
            }
        }

        let may_fit = self.tower.receiver_may_fit_for_name(receiver, self.name);
        let member_level = Rc::new(ScopeTowerLevel::MemberScope {
            dispatch_receiver: receiver.clone(),
        });
        if let Some(result) = self.process_if(TowerData::TowerLevel(member_level), may_fit)? {
            return Ok(Some(result));
        }

        let level = self.synthetic_level.clone();
        let data = TowerData::BothTowerLevelAndImplicitReceiver(level, receiver.clone());
        if let Some(result) = self.process(data)? {
            return Ok(Some(result));
        }

        if !resolve_extensions {
            return Ok(None);
        }

        if let Some(result) = self.process(TowerData::OnlyImplicitReceiver(receiver.clone()))? {
            return Ok(Some(result));
        }

        for level in self.local_levels().iter() {
            let data = TowerData::BothTowerLevelAndImplicitReceiver(level.clone(), receiver.clone());
            if let Some(result) = self.process(data)? {
                return Ok(Some(result));
            }
        }

        for level in self.non_local_levels().iter() {
            let data = TowerData::BothTowerLevelAndImplicitReceiver(level.clone(), receiver.clone());
            if let Some(result) = self.process(data)? {
                return Ok(Some(result));
            }
        }

        Ok(None)
    }

    fn process_context_receiver_groups(&mut self) -> Found<C> {
        for group in std::mem::take(&mut self.context_receivers_groups) {
            if let Some(result) = self.process_context_receiver_group(group)? {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    fn process_context_receiver_group(
        &mut self,
        group: Vec<ReceiverValueWithSmartCastInfo>,
    ) -> Found<C> {
        let level = Rc::new(ScopeTowerLevel::ContextReceiversGroup {
            receivers: group.clone(),
        });
        if let Some(result) = self.process(TowerData::TowerLevel(level))? {
            return Ok(Some(result));
        }

        let level = self.synthetic_level.clone();
        let data = TowerData::BothTowerLevelAndContextReceiversGroup(level, group.clone());
        if let Some(result) = self.process(data)? {
            return Ok(Some(result));
        }

        for level in self.non_local_levels().iter() {
            let data = TowerData::BothTowerLevelAndContextReceiversGroup(level.clone(), group.clone());
            if let Some(result) = self.process(data)? {
                return Ok(Some(result));
            }
        }

        Ok(None)
    }
}
