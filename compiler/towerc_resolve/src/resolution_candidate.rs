use crate::{
    candidate::{
        Candidate, CandidateFactory, CandidateFactoryProviderForInvoke,
        CandidateWithBoundDispatchReceiver, ExplicitReceiverKind, FactoryRef, ResolutionDiagnostic,
        result_applicability,
    },
    tower::ImplicitScopeTower,
};
use std::{
    cell::{OnceCell, RefCell},
    rc::Rc,
};
use towerc_resolve_models::{
    Applicability, CallableDescriptor, DescriptorFlags, DescriptorId, ReceiverOrigin,
    ReceiverValue, ReceiverValueWithSmartCastInfo, TypeId,
};

/// A candidate built over the declaration model.
///
/// Clones share state, so a compatibility warning added through one handle is
/// visible through every other.
#[derive(Debug, Clone)]
pub struct ResolutionCandidate(Rc<CandidateData>);

#[derive(Debug)]
pub struct CandidateData {
    descriptor: Option<DescriptorId>,
    dispatch_receiver: Option<ReceiverValueWithSmartCastInfo>,
    extension_receivers: Vec<ReceiverValueWithSmartCastInfo>,
    explicit_receiver_kind: ExplicitReceiverKind,
    diagnostics: Vec<ResolutionDiagnostic>,
    completion_verdict: Option<Applicability>,
    /// Set when this candidate is the `invoke` of a resolved variable.
    variable: Option<ResolutionCandidate>,
    is_enum_entry: bool,
    applicability: OnceCell<Applicability>,
    compatibility_warnings: RefCell<Vec<ResolutionCandidate>>,
}

impl ResolutionCandidate {
    fn error() -> ResolutionCandidate {
        ResolutionCandidate(Rc::new(CandidateData {
            descriptor: None,
            dispatch_receiver: None,
            extension_receivers: vec![],
            explicit_receiver_kind: ExplicitReceiverKind::NoExplicitReceiver,
            diagnostics: vec![ResolutionDiagnostic::NotAnExtensionFunction],
            completion_verdict: None,
            variable: None,
            is_enum_entry: false,
            applicability: OnceCell::new(),
            compatibility_warnings: Default::default(),
        }))
    }

    fn with_variable(variable: ResolutionCandidate, invoke: ResolutionCandidate) -> ResolutionCandidate {
        let invoke = &invoke.0;
        let mut diagnostics = variable.0.diagnostics.clone();
        diagnostics.extend(invoke.diagnostics.iter().copied());
        let completion_verdict = match (variable.0.completion_verdict, invoke.completion_verdict) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        ResolutionCandidate(Rc::new(CandidateData {
            descriptor: invoke.descriptor,
            dispatch_receiver: invoke.dispatch_receiver.clone(),
            extension_receivers: invoke.extension_receivers.clone(),
            explicit_receiver_kind: invoke.explicit_receiver_kind,
            diagnostics,
            completion_verdict,
            variable: Some(variable),
            is_enum_entry: false,
            applicability: OnceCell::new(),
            compatibility_warnings: Default::default(),
        }))
    }

    /// `None` for the error candidate.
    pub fn descriptor(&self) -> Option<DescriptorId> {
        self.0.descriptor
    }

    pub fn dispatch_receiver(&self) -> Option<&ReceiverValueWithSmartCastInfo> {
        self.0.dispatch_receiver.as_ref()
    }

    pub fn extension_receiver(&self) -> Option<&ReceiverValueWithSmartCastInfo> {
        self.0.extension_receivers.first()
    }

    pub fn extension_receivers(&self) -> &[ReceiverValueWithSmartCastInfo] {
        &self.0.extension_receivers
    }

    pub fn explicit_receiver_kind(&self) -> ExplicitReceiverKind {
        self.0.explicit_receiver_kind
    }

    pub fn diagnostics(&self) -> &[ResolutionDiagnostic] {
        &self.0.diagnostics
    }

    pub fn variable(&self) -> Option<&ResolutionCandidate> {
        self.0.variable.as_ref()
    }

    pub fn compatibility_warnings(&self) -> Vec<ResolutionCandidate> {
        self.0.compatibility_warnings.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &ResolutionCandidate) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Candidate for ResolutionCandidate {
    fn is_successful(&self) -> bool {
        result_applicability(&self.0.diagnostics).is_success()
    }

    fn resulting_applicability(&self) -> Applicability {
        *self.0.applicability.get_or_init(|| {
            let eager = result_applicability(&self.0.diagnostics);
            match self.0.completion_verdict {
                Some(completion) => eager.min(completion),
                None => eager,
            }
        })
    }

    fn add_compatibility_warning(&self, other: &ResolutionCandidate) {
        self.0.compatibility_warnings.borrow_mut().push(other.clone());
    }

    fn needs_compatibility_warning(&self) -> bool {
        self.0.diagnostics.iter().any(|diagnostic| {
            matches!(
                diagnostic,
                ResolutionDiagnostic::LowerPriorityToPreserveCompatibility {
                    needs_warning: true
                }
            )
        })
    }

    fn is_enum_entry(&self) -> bool {
        self.0.is_enum_entry
    }
}

pub struct ResolutionCandidateFactory<'ctx> {
    tower: &'ctx ImplicitScopeTower<'ctx>,
}

impl<'ctx> ResolutionCandidateFactory<'ctx> {
    pub fn new(tower: &'ctx ImplicitScopeTower<'ctx>) -> ResolutionCandidateFactory<'ctx> {
        ResolutionCandidateFactory { tower }
    }

    fn create(
        &self,
        tower_candidate: CandidateWithBoundDispatchReceiver,
        explicit_receiver_kind: ExplicitReceiverKind,
        extension_receivers: Vec<ReceiverValueWithSmartCastInfo>,
    ) -> ResolutionCandidate {
        let descriptor = self.tower.model.descriptor(tower_candidate.descriptor);
        let mut diagnostics = tower_candidate.diagnostics;

        if let Some(parameter) = descriptor.extension_receiver {
            if let Some(diagnostic) =
                self.check_extension_receivers(descriptor, parameter, &extension_receivers)
            {
                diagnostics.push(diagnostic);
            }
        }

        diagnostics.extend(verdict_diagnostic(descriptor));

        ResolutionCandidate(Rc::new(CandidateData {
            descriptor: Some(tower_candidate.descriptor),
            dispatch_receiver: tower_candidate.dispatch_receiver,
            extension_receivers,
            explicit_receiver_kind,
            diagnostics,
            completion_verdict: descriptor.completion_verdict,
            variable: None,
            is_enum_entry: descriptor.is_enum_entry(),
            applicability: OnceCell::new(),
            compatibility_warnings: Default::default(),
        }))
    }

    /// The best outcome among the receivers; a group of context receivers
    /// only needs one of them to fit.
    fn check_extension_receivers(
        &self,
        descriptor: &CallableDescriptor,
        parameter: TypeId,
        receivers: &[ReceiverValueWithSmartCastInfo],
    ) -> Option<ResolutionDiagnostic> {
        let mut best: Option<ResolutionDiagnostic> = None;
        for receiver in receivers {
            let diagnostic = self.check_extension_receiver(descriptor, parameter, receiver)?;
            if best.is_none_or(|b| diagnostic.applicability() > b.applicability()) {
                best = Some(diagnostic);
            }
        }
        Some(best.unwrap_or(ResolutionDiagnostic::WrongReceiver))
    }

    fn check_extension_receiver(
        &self,
        descriptor: &CallableDescriptor,
        parameter: TypeId,
        receiver: &ReceiverValueWithSmartCastInfo,
    ) -> Option<ResolutionDiagnostic> {
        let model = self.tower.model;
        let receiver_is_dynamic = receiver.all_types().any(|ty| model.is_dynamic(ty));
        let parameter_is_dynamic = model.is_dynamic(parameter);

        if receiver_is_dynamic != parameter_is_dynamic
            && !descriptor.flags.contains(DescriptorFlags::DYNAMIC_EXTENSION)
        {
            return Some(ResolutionDiagnostic::HiddenExtensionRelatedToDynamicTypes);
        }

        if parameter_is_dynamic || receiver_is_dynamic || model.is_subtype_of(receiver.ty(), parameter) {
            return None;
        }

        let fits_smart_cast = receiver
            .smart_cast_types
            .iter()
            .any(|&ty| model.is_subtype_of(ty, parameter));
        match (fits_smart_cast, receiver.is_stable) {
            (true, true) => None,
            (true, false) => Some(ResolutionDiagnostic::UnstableSmartCast),
            (false, _) => Some(ResolutionDiagnostic::WrongReceiver),
        }
    }
}

fn verdict_diagnostic(descriptor: &CallableDescriptor) -> Option<ResolutionDiagnostic> {
    match descriptor.verdict {
        Applicability::Resolved => None,
        Applicability::Hidden => Some(ResolutionDiagnostic::HiddenDescriptor),
        Applicability::ResolvedNeedPreserveCompatibility => {
            Some(ResolutionDiagnostic::LowerPriorityToPreserveCompatibility {
                needs_warning: descriptor
                    .flags
                    .contains(DescriptorFlags::REPORT_COMPATIBILITY_WARNING),
            })
        }
        verdict => Some(ResolutionDiagnostic::PreviousResolutionError(verdict)),
    }
}

impl CandidateFactory for ResolutionCandidateFactory<'_> {
    type Candidate = ResolutionCandidate;

    fn create_candidate(
        &self,
        tower_candidate: CandidateWithBoundDispatchReceiver,
        explicit_receiver_kind: ExplicitReceiverKind,
        extension_receiver: Option<&ReceiverValueWithSmartCastInfo>,
    ) -> ResolutionCandidate {
        self.create(
            tower_candidate,
            explicit_receiver_kind,
            extension_receiver.into_iter().cloned().collect(),
        )
    }

    fn create_candidate_with_receivers(
        &self,
        tower_candidate: CandidateWithBoundDispatchReceiver,
        explicit_receiver_kind: ExplicitReceiverKind,
        extension_receiver_candidates: Vec<ReceiverValueWithSmartCastInfo>,
    ) -> ResolutionCandidate {
        self.create(tower_candidate, explicit_receiver_kind, extension_receiver_candidates)
    }

    fn create_error_candidate(&self) -> ResolutionCandidate {
        ResolutionCandidate::error()
    }
}

/// Builds the `invoke` half of `foo()` when `foo` resolves to a variable.
pub struct ResolutionInvokeFactoryProvider<'ctx> {
    tower: &'ctx ImplicitScopeTower<'ctx>,
    factory: Rc<ResolutionCandidateFactory<'ctx>>,
}

impl<'ctx> ResolutionInvokeFactoryProvider<'ctx> {
    pub fn new(tower: &'ctx ImplicitScopeTower<'ctx>) -> ResolutionInvokeFactoryProvider<'ctx> {
        ResolutionInvokeFactoryProvider {
            tower,
            factory: Rc::new(ResolutionCandidateFactory::new(tower)),
        }
    }
}

impl<'ctx> CandidateFactoryProviderForInvoke<'ctx> for ResolutionInvokeFactoryProvider<'ctx> {
    type Candidate = ResolutionCandidate;

    fn transform_candidate(
        &self,
        variable: &ResolutionCandidate,
        invoke: ResolutionCandidate,
    ) -> ResolutionCandidate {
        ResolutionCandidate::with_variable(variable.clone(), invoke)
    }

    fn factory_for_variable(&self) -> FactoryRef<'ctx, ResolutionCandidate> {
        self.factory.clone()
    }

    fn factory_for_invoke(
        &self,
        variable: &ResolutionCandidate,
    ) -> Option<(ReceiverValueWithSmartCastInfo, FactoryRef<'ctx, ResolutionCandidate>)> {
        let id = variable.descriptor()?;
        let ty = self.tower.model.descriptor(id).value_type?;
        let receiver = ReceiverValueWithSmartCastInfo::new(ReceiverValue::new(
            ty,
            ReceiverOrigin::Variable(id),
        ));
        Some((receiver, self.factory.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::TowerSettings;
    use towerc_resolve_models::{DeclarationModel, NoopLookupTracker, ScopeKind};

    fn raw(descriptor: DescriptorId) -> CandidateWithBoundDispatchReceiver {
        CandidateWithBoundDispatchReceiver {
            dispatch_receiver: None,
            descriptor,
            diagnostics: vec![],
            requires_extension_receiver: true,
        }
    }

    #[test]
    fn test_extension_receiver_checks() {
        let mut model = DeclarationModel::new();
        let base = model.class_type("Base");
        let derived = model.subclass_type("Derived", vec![base]);
        let other = model.class_type("Other");
        let dynamic = model.dynamic_type();
        let scope = model.create_scope(ScopeKind::Importing, None);
        let ext = model.define(
            scope,
            CallableDescriptor::function("ext").with_extension_receiver(base),
        );
        let settings = TowerSettings::default();
        let tracker = NoopLookupTracker;
        let tower = ImplicitScopeTower::new(&model, scope, &settings, &tracker);
        let factory = ResolutionCandidateFactory::new(&tower);
        let kind = ExplicitReceiverKind::ExtensionReceiver;

        let fits = ReceiverValueWithSmartCastInfo::expression(derived);
        let candidate = factory.create_candidate(raw(ext), kind, Some(&fits));
        assert_eq!(candidate.resulting_applicability(), Applicability::Resolved);

        let wrong = ReceiverValueWithSmartCastInfo::expression(other);
        let candidate = factory.create_candidate(raw(ext), kind, Some(&wrong));
        assert_eq!(
            candidate.resulting_applicability(),
            Applicability::InapplicableWrongReceiver
        );
        assert!(!candidate.is_successful());

        let stable_cast = ReceiverValueWithSmartCastInfo::expression(other).with_smart_cast(base);
        let candidate = factory.create_candidate(raw(ext), kind, Some(&stable_cast));
        assert!(candidate.diagnostics().is_empty());

        let unstable_cast = stable_cast.clone().unstable();
        let candidate = factory.create_candidate(raw(ext), kind, Some(&unstable_cast));
        assert_eq!(candidate.diagnostics(), &[ResolutionDiagnostic::UnstableSmartCast]);

        let on_dynamic = ReceiverValueWithSmartCastInfo::expression(dynamic);
        let candidate = factory.create_candidate(raw(ext), kind, Some(&on_dynamic));
        assert_eq!(candidate.resulting_applicability(), Applicability::Hidden);
    }

    #[test]
    fn test_verdicts_become_diagnostics() {
        let mut model = DeclarationModel::new();
        let scope = model.create_scope(ScopeKind::Importing, None);
        let hidden = model.define(
            scope,
            CallableDescriptor::function("f").with_verdict(Applicability::Hidden),
        );
        let compat = model.define(
            scope,
            CallableDescriptor::function("f")
                .with_verdict(Applicability::ResolvedNeedPreserveCompatibility)
                .with_flags(DescriptorFlags::REPORT_COMPATIBILITY_WARNING),
        );
        let late = model.define(
            scope,
            CallableDescriptor::function("f").with_completion_verdict(Applicability::Inapplicable),
        );
        let settings = TowerSettings::default();
        let tracker = NoopLookupTracker;
        let tower = ImplicitScopeTower::new(&model, scope, &settings, &tracker);
        let factory = ResolutionCandidateFactory::new(&tower);
        let kind = ExplicitReceiverKind::NoExplicitReceiver;

        let candidate = factory.create_candidate(raw(hidden), kind, None);
        assert_eq!(candidate.resulting_applicability(), Applicability::Hidden);

        let candidate = factory.create_candidate(raw(compat), kind, None);
        assert!(candidate.is_successful());
        assert!(candidate.needs_compatibility_warning());
        assert_eq!(
            candidate.resulting_applicability(),
            Applicability::ResolvedNeedPreserveCompatibility
        );

        let candidate = factory.create_candidate(raw(late), kind, None);
        assert!(candidate.is_successful());
        assert_eq!(candidate.resulting_applicability(), Applicability::Inapplicable);
        assert_eq!(candidate.resulting_applicability(), Applicability::Inapplicable);
    }

    #[test]
    fn test_clones_share_compatibility_warnings() {
        let first = ResolutionCandidate::error();
        let second = ResolutionCandidate::error();
        let alias = first.clone();
        alias.add_compatibility_warning(&second);
        let warnings = first.compatibility_warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].ptr_eq(&second));
        assert_eq!(first.resulting_applicability(), Applicability::Inapplicable);
    }
}
