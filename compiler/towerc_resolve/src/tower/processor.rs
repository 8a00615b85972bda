use super::{ImplicitScopeTower, InvokeTowerProcessor, ScopeTowerLevel, TowerData};
use crate::candidate::{
    Candidate, CandidateWithBoundDispatchReceiver, ExplicitReceiverKind, FactoryRef,
    InvokeProviderRef,
};
use indexmap::IndexMap;
use towerc_resolve_models::{
    CallableCategory, DescriptorId, DetailedReceiver, QualifierReceiver,
    ReceiverValueWithSmartCastInfo, Symbol, names,
};

/// Name and kind of callable a processor looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidatesQuery {
    pub name: Symbol,
    pub category: CallableCategory,
}

impl CandidatesQuery {
    pub fn functions(name: Symbol) -> CandidatesQuery {
        CandidatesQuery {
            name,
            category: CallableCategory::Functions,
        }
    }

    pub fn variables(name: Symbol) -> CandidatesQuery {
        CandidatesQuery {
            name,
            category: CallableCategory::Variables,
        }
    }

    pub fn objects(name: Symbol) -> CandidatesQuery {
        CandidatesQuery {
            name,
            category: CallableCategory::Objects,
        }
    }

    fn collect(
        &self,
        level: &ScopeTowerLevel,
        tower: &ImplicitScopeTower<'_>,
        extension_receiver: Option<&ReceiverValueWithSmartCastInfo>,
    ) -> Vec<CandidateWithBoundDispatchReceiver> {
        level.collect_candidates(tower, self.category, self.name, extension_receiver)
    }
}

/// Maps a tower position to priority-ordered groups of candidates.
pub enum ScopeTowerProcessor<'ctx, C> {
    KnownResult(KnownResultProcessor<C>),
    ExplicitReceiver(ExplicitReceiverScopeTowerProcessor<'ctx, C>),
    Qualifier(QualifierScopeTowerProcessor<'ctx, C>),
    NoExplicitReceiver(NoExplicitReceiverScopeTowerProcessor<'ctx, C>),
    InvokeExtension(InvokeExtensionScopeTowerProcessor<'ctx, C>),
    /// Groups of every inner processor, in order, at the same position.
    PrioritizedComposite(Vec<ScopeTowerProcessor<'ctx, C>>),
    VariableAndObject(Box<VariableAndObjectScopeTowerProcessor<'ctx, C>>),
    Invoke(Box<InvokeTowerProcessor<'ctx, C>>),
}

impl<'ctx, C: Candidate> ScopeTowerProcessor<'ctx, C> {
    pub fn process(&mut self, data: &TowerData) -> Vec<Vec<C>> {
        match self {
            ScopeTowerProcessor::KnownResult(processor) => processor.process(data),
            ScopeTowerProcessor::ExplicitReceiver(processor) => {
                single_group(processor.simple_process(data))
            }
            ScopeTowerProcessor::Qualifier(processor) => single_group(processor.simple_process(data)),
            ScopeTowerProcessor::NoExplicitReceiver(processor) => {
                single_group(processor.simple_process(data))
            }
            ScopeTowerProcessor::InvokeExtension(processor) => {
                single_group(processor.simple_process(data))
            }
            ScopeTowerProcessor::PrioritizedComposite(processors) => processors
                .iter_mut()
                .flat_map(|processor| processor.process(data))
                .collect(),
            ScopeTowerProcessor::VariableAndObject(processor) => processor.process(data),
            ScopeTowerProcessor::Invoke(processor) => processor.process(data),
        }
    }

    /// Marks every level this processor would have consulted at `skipped`.
    pub fn record_lookups(&self, skipped: &[TowerData], name: Symbol) {
        match self {
            ScopeTowerProcessor::KnownResult(_)
            | ScopeTowerProcessor::Qualifier(_)
            | ScopeTowerProcessor::InvokeExtension(_) => {}
            ScopeTowerProcessor::ExplicitReceiver(processor) => {
                processor.record_lookups(skipped, name)
            }
            ScopeTowerProcessor::NoExplicitReceiver(processor) => {
                processor.record_lookups(skipped, name)
            }
            ScopeTowerProcessor::PrioritizedComposite(processors) => {
                for processor in processors {
                    processor.record_lookups(skipped, name);
                }
            }
            ScopeTowerProcessor::VariableAndObject(processor) => {
                processor.variable_processor.record_lookups(skipped, name);
                processor.object_processor.record_lookups(skipped, name);
            }
            ScopeTowerProcessor::Invoke(processor) => processor.record_lookups(skipped, name),
        }
    }
}

fn single_group<C>(candidates: Vec<C>) -> Vec<Vec<C>> {
    if candidates.is_empty() {
        vec![]
    } else {
        vec![candidates]
    }
}

pub(crate) fn empty_processor<'ctx, C>() -> ScopeTowerProcessor<'ctx, C> {
    ScopeTowerProcessor::KnownResult(KnownResultProcessor::new(vec![]))
}

/// Yields a fixed group once, at the empty position.
pub struct KnownResultProcessor<C> {
    result: Vec<C>,
}

impl<C> KnownResultProcessor<C> {
    pub fn new(result: Vec<C>) -> KnownResultProcessor<C> {
        KnownResultProcessor { result }
    }
}

impl<C: Clone> KnownResultProcessor<C> {
    fn process(&self, data: &TowerData) -> Vec<Vec<C>> {
        match data {
            TowerData::Empty if !self.result.is_empty() => vec![self.result.clone()],
            _ => vec![],
        }
    }
}

pub struct ExplicitReceiverScopeTowerProcessor<'ctx, C> {
    tower: &'ctx ImplicitScopeTower<'ctx>,
    factory: FactoryRef<'ctx, C>,
    explicit_receiver: ReceiverValueWithSmartCastInfo,
    query: CandidatesQuery,
}

impl<'ctx, C: Candidate> ExplicitReceiverScopeTowerProcessor<'ctx, C> {
    pub fn new(
        tower: &'ctx ImplicitScopeTower<'ctx>,
        factory: FactoryRef<'ctx, C>,
        explicit_receiver: ReceiverValueWithSmartCastInfo,
        query: CandidatesQuery,
    ) -> ExplicitReceiverScopeTowerProcessor<'ctx, C> {
        ExplicitReceiverScopeTowerProcessor {
            tower,
            factory,
            explicit_receiver,
            query,
        }
    }

    fn simple_process(&self, data: &TowerData) -> Vec<C> {
        match data {
            TowerData::Empty => self.resolve_as_member(),
            TowerData::TowerLevel(level) => self.resolve_as_extension(level),
            _ => vec![],
        }
    }

    fn resolve_as_member(&self) -> Vec<C> {
        let level = ScopeTowerLevel::MemberScope {
            dispatch_receiver: self.explicit_receiver.clone(),
        };
        self.query
            .collect(&level, self.tower, None)
            .into_iter()
            .filter(|candidate| !candidate.requires_extension_receiver)
            .map(|candidate| {
                self.factory
                    .create_candidate(candidate, ExplicitReceiverKind::DispatchReceiver, None)
            })
            .collect()
    }

    fn resolve_as_extension(&self, level: &ScopeTowerLevel) -> Vec<C> {
        self.query
            .collect(level, self.tower, Some(&self.explicit_receiver))
            .into_iter()
            .filter(|candidate| candidate.requires_extension_receiver)
            .map(|candidate| {
                self.factory.create_candidate(
                    candidate,
                    ExplicitReceiverKind::ExtensionReceiver,
                    Some(&self.explicit_receiver),
                )
            })
            .collect()
    }

    fn record_lookups(&self, skipped: &[TowerData], name: Symbol) {
        for data in skipped {
            if let TowerData::TowerLevel(level) = data {
                level.record_lookup(self.tower, name);
            }
        }
    }
}

pub struct QualifierScopeTowerProcessor<'ctx, C> {
    tower: &'ctx ImplicitScopeTower<'ctx>,
    factory: FactoryRef<'ctx, C>,
    qualifier: QualifierReceiver,
    query: CandidatesQuery,
}

impl<'ctx, C: Candidate> QualifierScopeTowerProcessor<'ctx, C> {
    pub fn new(
        tower: &'ctx ImplicitScopeTower<'ctx>,
        factory: FactoryRef<'ctx, C>,
        qualifier: QualifierReceiver,
        query: CandidatesQuery,
    ) -> QualifierScopeTowerProcessor<'ctx, C> {
        QualifierScopeTowerProcessor {
            tower,
            factory,
            qualifier,
            query,
        }
    }

    fn simple_process(&self, data: &TowerData) -> Vec<C> {
        if !matches!(data, TowerData::Empty) {
            return vec![];
        }
        let level = ScopeTowerLevel::Qualifier {
            qualifier: self.qualifier.clone(),
        };
        self.query
            .collect(&level, self.tower, None)
            .into_iter()
            .filter(|candidate| !candidate.requires_extension_receiver)
            .map(|candidate| {
                self.factory
                    .create_candidate(candidate, ExplicitReceiverKind::NoExplicitReceiver, None)
            })
            .collect()
    }
}

pub struct NoExplicitReceiverScopeTowerProcessor<'ctx, C> {
    tower: &'ctx ImplicitScopeTower<'ctx>,
    factory: FactoryRef<'ctx, C>,
    query: CandidatesQuery,
}

impl<'ctx, C: Candidate> NoExplicitReceiverScopeTowerProcessor<'ctx, C> {
    pub fn new(
        tower: &'ctx ImplicitScopeTower<'ctx>,
        factory: FactoryRef<'ctx, C>,
        query: CandidatesQuery,
    ) -> NoExplicitReceiverScopeTowerProcessor<'ctx, C> {
        NoExplicitReceiverScopeTowerProcessor {
            tower,
            factory,
            query,
        }
    }

    fn simple_process(&self, data: &TowerData) -> Vec<C> {
        let kind = ExplicitReceiverKind::NoExplicitReceiver;
        match data {
            TowerData::TowerLevel(level) => self
                .query
                .collect(level, self.tower, None)
                .into_iter()
                .filter(|candidate| !candidate.requires_extension_receiver)
                .map(|candidate| self.factory.create_candidate(candidate, kind, None))
                .collect(),
            TowerData::BothTowerLevelAndImplicitReceiver(level, receiver) => self
                .query
                .collect(level, self.tower, Some(receiver))
                .into_iter()
                .filter(|candidate| candidate.requires_extension_receiver)
                .map(|candidate| self.factory.create_candidate(candidate, kind, Some(receiver)))
                .collect(),
            TowerData::BothTowerLevelAndContextReceiversGroup(level, receivers) => {
                self.process_context_receivers_group(level, receivers)
            }
            _ => vec![],
        }
    }

    /// One candidate per descriptor, carrying every receiver that reached it.
    fn process_context_receivers_group(
        &self,
        level: &ScopeTowerLevel,
        receivers: &[ReceiverValueWithSmartCastInfo],
    ) -> Vec<C> {
        let mut grouped: IndexMap<
            DescriptorId,
            (CandidateWithBoundDispatchReceiver, Vec<ReceiverValueWithSmartCastInfo>),
        > = IndexMap::new();

        for receiver in receivers {
            let candidates = self.query.collect(level, self.tower, Some(receiver));
            for candidate in candidates {
                if !candidate.requires_extension_receiver {
                    continue;
                }
                grouped
                    .entry(candidate.descriptor)
                    .or_insert_with(|| (candidate, vec![]))
                    .1
                    .push(receiver.clone());
            }
        }

        grouped
            .into_values()
            .map(|(candidate, receivers)| {
                self.factory.create_candidate_with_receivers(
                    candidate,
                    ExplicitReceiverKind::NoExplicitReceiver,
                    receivers,
                )
            })
            .collect()
    }

    fn record_lookups(&self, skipped: &[TowerData], name: Symbol) {
        for data in skipped {
            match data {
                TowerData::TowerLevel(level)
                | TowerData::BothTowerLevelAndImplicitReceiver(level, _)
                | TowerData::ForLookupForNoExplicitReceiver(level)
                | TowerData::BothTowerLevelAndContextReceiversGroup(level, _) => {
                    level.record_lookup(self.tower, name)
                }
                TowerData::Empty | TowerData::OnlyImplicitReceiver(_) => {}
            }
        }
    }
}

/// Binds the `invoke` of an extension function value to its receiver.
pub struct InvokeExtensionScopeTowerProcessor<'ctx, C> {
    factory: FactoryRef<'ctx, C>,
    invoke: CandidateWithBoundDispatchReceiver,
    explicit_receiver: Option<ReceiverValueWithSmartCastInfo>,
}

impl<'ctx, C: Candidate> InvokeExtensionScopeTowerProcessor<'ctx, C> {
    pub fn new(
        factory: FactoryRef<'ctx, C>,
        invoke: CandidateWithBoundDispatchReceiver,
        explicit_receiver: Option<ReceiverValueWithSmartCastInfo>,
    ) -> InvokeExtensionScopeTowerProcessor<'ctx, C> {
        InvokeExtensionScopeTowerProcessor {
            factory,
            invoke,
            explicit_receiver,
        }
    }

    fn simple_process(&self, data: &TowerData) -> Vec<C> {
        match (&self.explicit_receiver, data) {
            (Some(receiver), TowerData::Empty) => vec![self.factory.create_candidate(
                self.invoke.clone(),
                ExplicitReceiverKind::BothReceivers,
                Some(receiver),
            )],
            (None, TowerData::OnlyImplicitReceiver(receiver)) => {
                vec![self.factory.create_candidate(
                    self.invoke.clone(),
                    ExplicitReceiverKind::DispatchReceiver,
                    Some(receiver),
                )]
            }
            _ => vec![],
        }
    }
}

/// Variables and objects of one name, with enum entries ranked as variables.
pub struct VariableAndObjectScopeTowerProcessor<'ctx, C> {
    variable_processor: ScopeTowerProcessor<'ctx, C>,
    object_processor: ScopeTowerProcessor<'ctx, C>,
}

impl<'ctx, C: Candidate> VariableAndObjectScopeTowerProcessor<'ctx, C> {
    pub fn new(
        variable_processor: ScopeTowerProcessor<'ctx, C>,
        object_processor: ScopeTowerProcessor<'ctx, C>,
    ) -> VariableAndObjectScopeTowerProcessor<'ctx, C> {
        VariableAndObjectScopeTowerProcessor {
            variable_processor,
            object_processor,
        }
    }

    fn process(&mut self, data: &TowerData) -> Vec<Vec<C>> {
        let variables = self.variable_processor.process(data);
        let objects = self.object_processor.process(data);
        merge_variables_and_objects(variables, objects)
    }
}

fn merge_variables_and_objects<C: Candidate>(
    variables: Vec<Vec<C>>,
    objects: Vec<Vec<C>>,
) -> Vec<Vec<C>> {
    if objects.is_empty() {
        return variables;
    }

    let mut merged = vec![];
    let mut extra = vec![];
    let mut variables = variables.into_iter();
    let mut objects = objects.into_iter();
    loop {
        let (variable_group, object_group) = match (variables.next(), objects.next()) {
            (None, None) => break,
            pair => pair,
        };
        let mut group = variable_group.unwrap_or_default();
        if let Some(object_group) = object_group {
            let (enum_entries, others): (Vec<C>, Vec<C>) = object_group
                .into_iter()
                .partition(|candidate| candidate.is_enum_entry());
            group.extend(enum_entries);
            if !others.is_empty() {
                extra.push(others);
            }
        }
        if !group.is_empty() {
            merged.push(group);
        }
    }
    merged.extend(extra);
    merged
}

pub fn create_simple_processor_without_class_value_receiver<'ctx, C: Candidate>(
    tower: &'ctx ImplicitScopeTower<'ctx>,
    factory: FactoryRef<'ctx, C>,
    explicit_receiver: Option<&DetailedReceiver>,
    query: CandidatesQuery,
) -> ScopeTowerProcessor<'ctx, C> {
    match explicit_receiver {
        None => ScopeTowerProcessor::NoExplicitReceiver(NoExplicitReceiverScopeTowerProcessor::new(
            tower, factory, query,
        )),
        Some(DetailedReceiver::Value(receiver)) => ScopeTowerProcessor::ExplicitReceiver(
            ExplicitReceiverScopeTowerProcessor::new(tower, factory, receiver.clone(), query),
        ),
        Some(DetailedReceiver::Qualifier(qualifier)) => ScopeTowerProcessor::Qualifier(
            QualifierScopeTowerProcessor::new(tower, factory, qualifier.clone(), query),
        ),
    }
}

/// With `class_value_receiver`, a qualifier that also denotes a value (a
/// companion or object) is searched through that value at lower priority.
pub fn create_simple_processor<'ctx, C: Candidate>(
    tower: &'ctx ImplicitScopeTower<'ctx>,
    factory: FactoryRef<'ctx, C>,
    explicit_receiver: Option<&DetailedReceiver>,
    class_value_receiver: bool,
    query: CandidatesQuery,
) -> ScopeTowerProcessor<'ctx, C> {
    let class_value = match explicit_receiver {
        Some(DetailedReceiver::Qualifier(qualifier)) if class_value_receiver => {
            qualifier.class_value_receiver.clone()
        }
        _ => None,
    };
    let without_class_value = create_simple_processor_without_class_value_receiver(
        tower,
        factory.clone(),
        explicit_receiver,
        query,
    );
    match class_value {
        Some(receiver) => ScopeTowerProcessor::PrioritizedComposite(vec![
            without_class_value,
            ScopeTowerProcessor::ExplicitReceiver(ExplicitReceiverScopeTowerProcessor::new(
                tower, factory, receiver, query,
            )),
        ]),
        None => without_class_value,
    }
}

pub fn create_simple_function_processor<'ctx, C: Candidate>(
    tower: &'ctx ImplicitScopeTower<'ctx>,
    name: Symbol,
    factory: FactoryRef<'ctx, C>,
    explicit_receiver: Option<&DetailedReceiver>,
    class_value_receiver: bool,
) -> ScopeTowerProcessor<'ctx, C> {
    create_simple_processor(
        tower,
        factory,
        explicit_receiver,
        class_value_receiver,
        CandidatesQuery::functions(name),
    )
}

pub fn create_variable_processor<'ctx, C: Candidate>(
    tower: &'ctx ImplicitScopeTower<'ctx>,
    name: Symbol,
    factory: FactoryRef<'ctx, C>,
    explicit_receiver: Option<&DetailedReceiver>,
    class_value_receiver: bool,
) -> ScopeTowerProcessor<'ctx, C> {
    create_simple_processor(
        tower,
        factory,
        explicit_receiver,
        class_value_receiver,
        CandidatesQuery::variables(name),
    )
}

pub fn create_variable_and_object_processor<'ctx, C: Candidate>(
    tower: &'ctx ImplicitScopeTower<'ctx>,
    name: Symbol,
    factory: FactoryRef<'ctx, C>,
    explicit_receiver: Option<&DetailedReceiver>,
    class_value_receiver: bool,
) -> ScopeTowerProcessor<'ctx, C> {
    let variables = create_variable_processor(
        tower,
        name,
        factory.clone(),
        explicit_receiver,
        class_value_receiver,
    );
    let objects = create_simple_processor(
        tower,
        factory,
        explicit_receiver,
        class_value_receiver,
        CandidatesQuery::objects(name),
    );
    ScopeTowerProcessor::VariableAndObject(Box::new(VariableAndObjectScopeTowerProcessor::new(
        variables, objects,
    )))
}

/// A call `foo()` may be a function, `foo.invoke()` on a variable, or an
/// extension function value `foo` applied to the receiver.
pub fn create_function_processor<'ctx, C: Candidate>(
    tower: &'ctx ImplicitScopeTower<'ctx>,
    name: Symbol,
    factory: FactoryRef<'ctx, C>,
    provider: InvokeProviderRef<'ctx, C>,
    explicit_receiver: Option<&DetailedReceiver>,
) -> ScopeTowerProcessor<'ctx, C> {
    let simple = create_simple_function_processor(tower, name, factory, explicit_receiver, true);
    let invoke = ScopeTowerProcessor::Invoke(Box::new(InvokeTowerProcessor::on_variable(
        tower,
        name,
        provider.clone(),
        explicit_receiver,
    )));
    let invoke_extension = create_processor_with_receiver_value_or_empty(explicit_receiver, |receiver| {
        ScopeTowerProcessor::Invoke(Box::new(InvokeTowerProcessor::on_extension_variable(
            tower,
            name,
            provider,
            receiver.cloned(),
        )))
    });
    ScopeTowerProcessor::PrioritizedComposite(vec![simple, invoke, invoke_extension])
}

/// Runs `create` with the receiver value; a qualifier contributes its class
/// value, or nothing when it has none.
pub fn create_processor_with_receiver_value_or_empty<'ctx, C: Candidate>(
    explicit_receiver: Option<&DetailedReceiver>,
    create: impl FnOnce(Option<&ReceiverValueWithSmartCastInfo>) -> ScopeTowerProcessor<'ctx, C>,
) -> ScopeTowerProcessor<'ctx, C> {
    match explicit_receiver {
        None => create(None),
        Some(DetailedReceiver::Value(receiver)) => create(Some(receiver)),
        Some(DetailedReceiver::Qualifier(qualifier)) => match &qualifier.class_value_receiver {
            Some(receiver) => create(Some(receiver)),
            None => empty_processor(),
        },
    }
}

/// `(expression)()` and `receiver.(expression)()`.
pub fn create_call_tower_processor_for_explicit_invoke<'ctx, C: Candidate>(
    tower: &'ctx ImplicitScopeTower<'ctx>,
    factory: FactoryRef<'ctx, C>,
    expression_for_invoke: ReceiverValueWithSmartCastInfo,
    explicit_receiver: Option<ReceiverValueWithSmartCastInfo>,
) -> ScopeTowerProcessor<'ctx, C> {
    let invoke_extension = tower.get_extension_invoke_candidate_descriptor(&expression_for_invoke);

    match (explicit_receiver, invoke_extension) {
        (Some(_), None) => ScopeTowerProcessor::KnownResult(KnownResultProcessor::new(vec![
            factory.create_error_candidate(),
        ])),
        (Some(receiver), Some(invoke)) => ScopeTowerProcessor::InvokeExtension(
            InvokeExtensionScopeTowerProcessor::new(factory, invoke, Some(receiver)),
        ),
        (None, invoke_extension) => {
            let using_expression = ScopeTowerProcessor::ExplicitReceiver(
                ExplicitReceiverScopeTowerProcessor::new(
                    tower,
                    factory.clone(),
                    expression_for_invoke,
                    CandidatesQuery::functions(names::invoke()),
                ),
            );
            match invoke_extension {
                Some(invoke) => ScopeTowerProcessor::PrioritizedComposite(vec![
                    using_expression,
                    ScopeTowerProcessor::InvokeExtension(InvokeExtensionScopeTowerProcessor::new(
                        factory, invoke, None,
                    )),
                ]),
                None => using_expression,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_known_result_yields_only_at_the_empty_position() {
        let processor = KnownResultProcessor::new(vec![1u32, 2]);
        assert_eq!(processor.process(&TowerData::Empty), vec![vec![1, 2]]);
        let level = TowerData::TowerLevel(Rc::new(ScopeTowerLevel::HidesMembers));
        assert!(processor.process(&level).is_empty());
    }

    #[test]
    fn test_empty_processor_needs_no_candidate_bound() {
        match empty_processor::<u32>() {
            ScopeTowerProcessor::KnownResult(processor) => {
                assert!(processor.process(&TowerData::Empty).is_empty());
            }
            _ => panic!("expected a known-result processor"),
        }
    }
}
