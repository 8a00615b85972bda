use crate::{
    candidate::{
        Candidate, CandidateFactory, CandidateWithBoundDispatchReceiver, ExplicitReceiverKind,
        FactoryRef, InvokeProviderRef,
    },
    error::ResolveResult,
    resolution_candidate::{
        ResolutionCandidate, ResolutionCandidateFactory, ResolutionInvokeFactoryProvider,
    },
    tower::{
        AllCandidatesCollector, ImplicitScopeTower, KnownResultProcessor, ScopeTowerProcessor,
        SuccessfulResultCollector, TowerResolver, create_call_tower_processor_for_explicit_invoke,
        create_function_processor, create_simple_function_processor,
        create_variable_and_object_processor, create_variable_processor,
    },
};
use std::rc::Rc;
use towerc_resolve_models::{Applicability, DetailedReceiver, ReceiverValueWithSmartCastInfo, Symbol};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionKind {
    /// `foo()`, including `foo.invoke()` desugarings.
    Function,
    /// `foo` in value position.
    Variable,
    /// `::foo`; every priority group of a position is considered at once.
    CallableReference,
    /// `(expression)()` or `receiver.(expression)()`.
    Invoke {
        expression: ReceiverValueWithSmartCastInfo,
    },
}

impl ResolutionKind {
    pub fn use_order(&self) -> bool {
        !matches!(self, ResolutionKind::CallableReference)
    }
}

#[derive(Debug, Clone)]
pub enum OverloadResolutionResults<C> {
    Success(C),
    Ambiguity(Vec<C>),
    Inapplicable {
        applicability: Applicability,
        candidates: Vec<C>,
    },
    NameNotFound,
    AllCandidates(Vec<C>),
}

impl<C: Candidate> OverloadResolutionResults<C> {
    /// Classifies a result set where every member shares the best verdict.
    pub fn from_candidates(mut candidates: Vec<C>) -> OverloadResolutionResults<C> {
        let applicability = candidates
            .iter()
            .map(Candidate::resulting_applicability)
            .max()
            .unwrap_or(Applicability::Hidden);

        if applicability == Applicability::Hidden {
            return OverloadResolutionResults::NameNotFound;
        }
        if !applicability.is_success() {
            return OverloadResolutionResults::Inapplicable {
                applicability,
                candidates,
            };
        }
        if candidates.len() == 1 {
            OverloadResolutionResults::Success(candidates.remove(0))
        } else {
            OverloadResolutionResults::Ambiguity(candidates)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OverloadResolutionResults::Success(_))
    }

    pub fn candidates(&self) -> &[C] {
        match self {
            OverloadResolutionResults::Success(candidate) => std::slice::from_ref(candidate),
            OverloadResolutionResults::Ambiguity(candidates)
            | OverloadResolutionResults::Inapplicable { candidates, .. }
            | OverloadResolutionResults::AllCandidates(candidates) => candidates,
            OverloadResolutionResults::NameNotFound => &[],
        }
    }
}

/// Entry point used by call checking: builds the processor for a call shape
/// and runs the tower with it.
#[derive(Debug, Clone, Default)]
pub struct CallResolver {
    tower_resolver: TowerResolver,
}

impl CallResolver {
    pub fn new(tower_resolver: TowerResolver) -> CallResolver {
        CallResolver { tower_resolver }
    }

    pub fn run_resolution<'ctx>(
        &self,
        tower: &'ctx ImplicitScopeTower<'ctx>,
        name: Symbol,
        kind: &ResolutionKind,
        explicit_receiver: Option<&DetailedReceiver>,
    ) -> ResolveResult<OverloadResolutionResults<ResolutionCandidate>> {
        let mut processor = create_processor(tower, name, kind, explicit_receiver);
        let candidates =
            self.tower_resolver
                .run_resolve(tower, &mut processor, kind.use_order(), name)?;
        let applicability = candidates
            .iter()
            .map(Candidate::resulting_applicability)
            .max()
            .map_or("none", Applicability::description);
        let result = OverloadResolutionResults::from_candidates(candidates);
        debug!(
            %name,
            candidates = result.candidates().len(),
            success = result.is_success(),
            applicability,
            "resolved call"
        );
        Ok(result)
    }

    pub fn collect_all_candidates<'ctx>(
        &self,
        tower: &'ctx ImplicitScopeTower<'ctx>,
        name: Symbol,
        kind: &ResolutionKind,
        explicit_receiver: Option<&DetailedReceiver>,
    ) -> ResolveResult<OverloadResolutionResults<ResolutionCandidate>> {
        let mut processor = create_processor(tower, name, kind, explicit_receiver);
        let candidates = self
            .tower_resolver
            .collect_all_candidates(tower, &mut processor, name)?;
        Ok(OverloadResolutionResults::AllCandidates(candidates))
    }

    /// Resolves among candidates chosen elsewhere, e.g. by a delegate
    /// convention, without walking the tower.
    pub fn run_resolution_for_given_candidates<'ctx>(
        &self,
        tower: &'ctx ImplicitScopeTower<'ctx>,
        given: Vec<CandidateWithBoundDispatchReceiver>,
        collect_all: bool,
    ) -> ResolveResult<OverloadResolutionResults<ResolutionCandidate>> {
        let factory = ResolutionCandidateFactory::new(tower);
        let candidates = given
            .into_iter()
            .map(|candidate| {
                let kind = match candidate.dispatch_receiver {
                    Some(_) => ExplicitReceiverKind::DispatchReceiver,
                    None => ExplicitReceiverKind::NoExplicitReceiver,
                };
                factory.create_candidate(candidate, kind, None)
            })
            .collect();
        let mut processor = ScopeTowerProcessor::KnownResult(KnownResultProcessor::new(candidates));

        if collect_all {
            let mut collector = AllCandidatesCollector::new();
            let candidates =
                self.tower_resolver
                    .run_with_empty_tower_data(&mut processor, &mut collector, false)?;
            return Ok(OverloadResolutionResults::AllCandidates(candidates));
        }

        let mut collector = SuccessfulResultCollector::new();
        let candidates =
            self.tower_resolver
                .run_with_empty_tower_data(&mut processor, &mut collector, true)?;
        Ok(OverloadResolutionResults::from_candidates(candidates))
    }
}

fn create_processor<'ctx>(
    tower: &'ctx ImplicitScopeTower<'ctx>,
    name: Symbol,
    kind: &ResolutionKind,
    explicit_receiver: Option<&DetailedReceiver>,
) -> ScopeTowerProcessor<'ctx, ResolutionCandidate> {
    let factory: FactoryRef<'ctx, ResolutionCandidate> = Rc::new(ResolutionCandidateFactory::new(tower));
    match kind {
        ResolutionKind::Function => {
            let provider: InvokeProviderRef<'ctx, ResolutionCandidate> =
                Rc::new(ResolutionInvokeFactoryProvider::new(tower));
            create_function_processor(tower, name, factory, provider, explicit_receiver)
        }
        ResolutionKind::Variable => {
            create_variable_and_object_processor(tower, name, factory, explicit_receiver, true)
        }
        ResolutionKind::CallableReference => ScopeTowerProcessor::PrioritizedComposite(vec![
            create_simple_function_processor(tower, name, factory.clone(), explicit_receiver, true),
            create_variable_processor(tower, name, factory, explicit_receiver, true),
        ]),
        ResolutionKind::Invoke { expression } => {
            let receiver = explicit_receiver.and_then(|receiver| match receiver {
                DetailedReceiver::Value(value) => Some(value.clone()),
                DetailedReceiver::Qualifier(qualifier) => qualifier.class_value_receiver.clone(),
            });
            create_call_tower_processor_for_explicit_invoke(tower, factory, expression.clone(), receiver)
        }
    }
}
