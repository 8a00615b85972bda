use super::{
    ImplicitScopeTower, TowerData,
    processor::{
        CandidatesQuery, ExplicitReceiverScopeTowerProcessor, InvokeExtensionScopeTowerProcessor,
        ScopeTowerProcessor, create_variable_and_object_processor, empty_processor,
    },
};
use crate::candidate::{Candidate, CandidateFactoryProviderForInvoke, InvokeProviderRef};
use towerc_resolve_models::{DetailedReceiver, ReceiverValueWithSmartCastInfo, Symbol, names};

enum InvokeMode {
    /// `foo()` as `foo.invoke()`.
    OnVariable,
    /// `receiver.foo()` where `foo` holds an extension function value.
    OnExtensionVariable {
        explicit_receiver: Option<ReceiverValueWithSmartCastInfo>,
    },
}

/// Finds variables first, then the `invoke` to call on each of them.
///
/// A variable found at a late position still gets its `invoke` looked up at
/// every position seen so far.
pub struct InvokeTowerProcessor<'ctx, C> {
    tower: &'ctx ImplicitScopeTower<'ctx>,
    provider: InvokeProviderRef<'ctx, C>,
    mode: InvokeMode,
    variable_processor: ScopeTowerProcessor<'ctx, C>,
    previous_data: Vec<TowerData>,
    invoke_processors: Vec<Vec<VariableInvokeProcessor<'ctx, C>>>,
}

struct VariableInvokeProcessor<'ctx, C> {
    variable: C,
    invoke_processor: ScopeTowerProcessor<'ctx, C>,
}

impl<'ctx, C: Candidate> VariableInvokeProcessor<'ctx, C> {
    fn process(
        &mut self,
        provider: &dyn CandidateFactoryProviderForInvoke<'ctx, Candidate = C>,
        data: &TowerData,
    ) -> Vec<Vec<C>> {
        self.invoke_processor
            .process(data)
            .into_iter()
            .map(|group| {
                group
                    .into_iter()
                    .map(|invoke| provider.transform_candidate(&self.variable, invoke))
                    .collect()
            })
            .collect()
    }
}

impl<'ctx, C: Candidate> InvokeTowerProcessor<'ctx, C> {
    pub fn on_variable(
        tower: &'ctx ImplicitScopeTower<'ctx>,
        name: Symbol,
        provider: InvokeProviderRef<'ctx, C>,
        explicit_receiver: Option<&DetailedReceiver>,
    ) -> InvokeTowerProcessor<'ctx, C> {
        let variable_processor = create_variable_and_object_processor(
            tower,
            name,
            provider.factory_for_variable(),
            explicit_receiver,
            true,
        );
        InvokeTowerProcessor::new(tower, provider, InvokeMode::OnVariable, variable_processor)
    }

    /// The variable itself is always looked up without the receiver.
    pub fn on_extension_variable(
        tower: &'ctx ImplicitScopeTower<'ctx>,
        name: Symbol,
        provider: InvokeProviderRef<'ctx, C>,
        explicit_receiver: Option<ReceiverValueWithSmartCastInfo>,
    ) -> InvokeTowerProcessor<'ctx, C> {
        let variable_processor = create_variable_and_object_processor(
            tower,
            name,
            provider.factory_for_variable(),
            None,
            true,
        );
        InvokeTowerProcessor::new(
            tower,
            provider,
            InvokeMode::OnExtensionVariable { explicit_receiver },
            variable_processor,
        )
    }

    fn new(
        tower: &'ctx ImplicitScopeTower<'ctx>,
        provider: InvokeProviderRef<'ctx, C>,
        mode: InvokeMode,
        variable_processor: ScopeTowerProcessor<'ctx, C>,
    ) -> InvokeTowerProcessor<'ctx, C> {
        InvokeTowerProcessor {
            tower,
            provider,
            mode,
            variable_processor,
            previous_data: vec![],
            invoke_processors: vec![],
        }
    }

    pub(super) fn process(&mut self, data: &TowerData) -> Vec<Vec<C>> {
        self.previous_data.push(data.clone());
        let provider = &*self.provider;

        let mut candidate_groups = vec![];
        for processors in &mut self.invoke_processors {
            candidate_groups.extend(process_variable_group(processors, provider, data));
        }

        for variables in self.variable_processor.process(data) {
            let mut processors: Vec<_> = variables
                .into_iter()
                .filter(|variable| variable.is_successful())
                .map(|variable| {
                    let invoke_processor =
                        create_invoke_processor(self.tower, provider, &self.mode, &variable);
                    VariableInvokeProcessor {
                        variable,
                        invoke_processor,
                    }
                })
                .collect();
            if processors.is_empty() {
                continue;
            }
            for previous in &self.previous_data {
                candidate_groups.extend(process_variable_group(&mut processors, provider, previous));
            }
            self.invoke_processors.push(processors);
        }

        candidate_groups
    }

    pub(super) fn record_lookups(&self, skipped: &[TowerData], name: Symbol) {
        self.variable_processor.record_lookups(skipped, name);
    }
}

/// Invokes found for variables of one group share a single priority group.
fn process_variable_group<'ctx, C: Candidate>(
    processors: &mut [VariableInvokeProcessor<'ctx, C>],
    provider: &dyn CandidateFactoryProviderForInvoke<'ctx, Candidate = C>,
    data: &TowerData,
) -> Vec<Vec<C>> {
    if let [processor] = processors {
        return processor.process(provider, data);
    }
    let merged: Vec<C> = processors
        .iter_mut()
        .flat_map(|processor| processor.process(provider, data))
        .flatten()
        .collect();
    if merged.is_empty() { vec![] } else { vec![merged] }
}

fn create_invoke_processor<'ctx, C: Candidate>(
    tower: &'ctx ImplicitScopeTower<'ctx>,
    provider: &dyn CandidateFactoryProviderForInvoke<'ctx, Candidate = C>,
    mode: &InvokeMode,
    variable: &C,
) -> ScopeTowerProcessor<'ctx, C> {
    let Some((receiver, factory)) = provider.factory_for_invoke(variable) else {
        return empty_processor();
    };
    match mode {
        InvokeMode::OnVariable => ScopeTowerProcessor::ExplicitReceiver(
            ExplicitReceiverScopeTowerProcessor::new(
                tower,
                factory,
                receiver,
                CandidatesQuery::functions(names::invoke()),
            ),
        ),
        InvokeMode::OnExtensionVariable { explicit_receiver } => {
            match tower.get_extension_invoke_candidate_descriptor(&receiver) {
                Some(invoke) => ScopeTowerProcessor::InvokeExtension(
                    InvokeExtensionScopeTowerProcessor::new(
                        factory,
                        invoke,
                        explicit_receiver.clone(),
                    ),
                ),
                None => empty_processor(),
            }
        }
    }
}
