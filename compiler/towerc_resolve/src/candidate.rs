use std::rc::Rc;
use towerc_resolve_models::{Applicability, DescriptorId, ReceiverValueWithSmartCastInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExplicitReceiverKind {
    NoExplicitReceiver,
    DispatchReceiver,
    ExtensionReceiver,
    BothReceivers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionDiagnostic {
    HiddenDescriptor,
    HiddenExtensionRelatedToDynamicTypes,
    UnstableSmartCast,
    /// Member coming from the dynamic scope.
    DynamicDescriptor,
    WrongReceiver,
    /// Verdict produced by the candidate resolver for this call.
    PreviousResolutionError(Applicability),
    LowerPriorityToPreserveCompatibility { needs_warning: bool },
    /// `a.(expr)()` where `expr` is not an extension function value.
    NotAnExtensionFunction,
}

impl ResolutionDiagnostic {
    pub fn applicability(&self) -> Applicability {
        match self {
            ResolutionDiagnostic::HiddenDescriptor
            | ResolutionDiagnostic::HiddenExtensionRelatedToDynamicTypes => Applicability::Hidden,
            ResolutionDiagnostic::UnstableSmartCast => Applicability::UnstableSmartcast,
            ResolutionDiagnostic::DynamicDescriptor => Applicability::ResolvedLowPriority,
            ResolutionDiagnostic::WrongReceiver => Applicability::InapplicableWrongReceiver,
            ResolutionDiagnostic::PreviousResolutionError(applicability) => *applicability,
            ResolutionDiagnostic::LowerPriorityToPreserveCompatibility { .. } => {
                Applicability::ResolvedNeedPreserveCompatibility
            }
            ResolutionDiagnostic::NotAnExtensionFunction => Applicability::Inapplicable,
        }
    }
}

/// The worst verdict among `diagnostics`, or `Resolved` when there are none.
pub fn result_applicability<'a>(
    diagnostics: impl IntoIterator<Item = &'a ResolutionDiagnostic>,
) -> Applicability {
    diagnostics
        .into_iter()
        .map(ResolutionDiagnostic::applicability)
        .min()
        .unwrap_or(Applicability::Resolved)
}

pub trait Candidate: Clone {
    /// Cheap, eagerly computed viability signal.
    fn is_successful(&self) -> bool;

    /// Final verdict. Must not change once read.
    fn resulting_applicability(&self) -> Applicability;

    fn add_compatibility_warning(&self, other: &Self);

    /// Whether losing to another candidate must be reported.
    fn needs_compatibility_warning(&self) -> bool {
        false
    }

    fn is_enum_entry(&self) -> bool {
        false
    }
}

/// A raw match produced by a tower level, with its dispatch receiver bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateWithBoundDispatchReceiver {
    pub dispatch_receiver: Option<ReceiverValueWithSmartCastInfo>,
    pub descriptor: DescriptorId,
    pub diagnostics: Vec<ResolutionDiagnostic>,
    pub requires_extension_receiver: bool,
}

pub trait CandidateFactory {
    type Candidate;

    fn create_candidate(
        &self,
        tower_candidate: CandidateWithBoundDispatchReceiver,
        explicit_receiver_kind: ExplicitReceiverKind,
        extension_receiver: Option<&ReceiverValueWithSmartCastInfo>,
    ) -> Self::Candidate;

    /// One candidate for an extension reachable through several context
    /// receivers of the same group.
    fn create_candidate_with_receivers(
        &self,
        tower_candidate: CandidateWithBoundDispatchReceiver,
        explicit_receiver_kind: ExplicitReceiverKind,
        extension_receiver_candidates: Vec<ReceiverValueWithSmartCastInfo>,
    ) -> Self::Candidate;

    fn create_error_candidate(&self) -> Self::Candidate;
}

pub type FactoryRef<'ctx, C> = Rc<dyn CandidateFactory<Candidate = C> + 'ctx>;

pub trait CandidateFactoryProviderForInvoke<'ctx> {
    type Candidate;

    /// Combines a resolved variable with the `invoke` chosen for it.
    fn transform_candidate(
        &self,
        variable: &Self::Candidate,
        invoke: Self::Candidate,
    ) -> Self::Candidate;

    fn factory_for_variable(&self) -> FactoryRef<'ctx, Self::Candidate>;

    /// Receiver and factory used to look up `invoke` on the variable's value;
    /// `None` when the variable cannot be invoked.
    fn factory_for_invoke(
        &self,
        variable: &Self::Candidate,
    ) -> Option<(ReceiverValueWithSmartCastInfo, FactoryRef<'ctx, Self::Candidate>)>;
}

pub type InvokeProviderRef<'ctx, C> =
    Rc<dyn CandidateFactoryProviderForInvoke<'ctx, Candidate = C> + 'ctx>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_applicability_takes_the_worst() {
        assert_eq!(
            result_applicability(std::iter::empty::<&ResolutionDiagnostic>()),
            Applicability::Resolved
        );
        let diagnostics = [
            ResolutionDiagnostic::DynamicDescriptor,
            ResolutionDiagnostic::WrongReceiver,
        ];
        assert_eq!(
            result_applicability(&diagnostics),
            Applicability::InapplicableWrongReceiver
        );
        let diagnostics = [
            ResolutionDiagnostic::LowerPriorityToPreserveCompatibility { needs_warning: true },
            ResolutionDiagnostic::HiddenDescriptor,
        ];
        assert_eq!(result_applicability(&diagnostics), Applicability::Hidden);
    }
}
