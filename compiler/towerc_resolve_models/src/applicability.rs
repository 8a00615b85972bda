/// Verdict attached to a resolution candidate.
///
/// Variants are declared from worst to best so that the derived ordering can
/// be used directly for "best of group" comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Applicability {
    /// Removed from resolution entirely, even from error reporting.
    Hidden,
    Unsupported,
    InapplicableWrongReceiver,
    InapplicableArgumentsMappingError,
    Inapplicable,
    UnsafeCall,
    UnstableSmartcast,
    ConventionError,
    ResolvedLowPriority,
    /// Wins over lower tiers but keeps the search going so that a better
    /// candidate can still be found; reported with a warning if one is.
    ResolvedNeedPreserveCompatibility,
    Resolved,
}

impl Applicability {
    pub fn is_success(self) -> bool {
        self >= Applicability::ResolvedLowPriority
    }

    pub fn should_stop_resolve(self) -> bool {
        self > Applicability::ResolvedNeedPreserveCompatibility
    }

    pub fn is_inapplicable(self) -> bool {
        matches!(
            self,
            Applicability::Inapplicable
                | Applicability::InapplicableArgumentsMappingError
                | Applicability::InapplicableWrongReceiver
        )
    }

    pub fn description(self) -> &'static str {
        match self {
            Applicability::Hidden => "hidden",
            Applicability::Unsupported => "unsupported",
            Applicability::InapplicableWrongReceiver => "inapplicable receiver",
            Applicability::InapplicableArgumentsMappingError => "argument mapping error",
            Applicability::Inapplicable => "inapplicable",
            Applicability::UnsafeCall => "unsafe call",
            Applicability::UnstableSmartcast => "unstable smart cast",
            Applicability::ConventionError => "convention error",
            Applicability::ResolvedLowPriority => "resolved with low priority",
            Applicability::ResolvedNeedPreserveCompatibility => "resolved for compatibility",
            Applicability::Resolved => "resolved",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_is_worst_to_best() {
        assert!(Applicability::Hidden < Applicability::InapplicableWrongReceiver);
        assert!(Applicability::Inapplicable < Applicability::ResolvedLowPriority);
        assert!(Applicability::ResolvedNeedPreserveCompatibility < Applicability::Resolved);
    }

    #[test]
    fn test_only_resolved_stops_resolution() {
        assert!(Applicability::Resolved.should_stop_resolve());
        assert!(!Applicability::ResolvedNeedPreserveCompatibility.should_stop_resolve());
        assert!(!Applicability::ResolvedLowPriority.should_stop_resolve());
        assert!(!Applicability::Inapplicable.should_stop_resolve());
    }

    #[test]
    fn test_success_and_inapplicable_sets() {
        assert!(Applicability::ResolvedLowPriority.is_success());
        assert!(Applicability::ResolvedNeedPreserveCompatibility.is_success());
        assert!(!Applicability::ConventionError.is_success());

        assert!(Applicability::Inapplicable.is_inapplicable());
        assert!(Applicability::InapplicableWrongReceiver.is_inapplicable());
        assert!(Applicability::InapplicableArgumentsMappingError.is_inapplicable());
        assert!(!Applicability::UnsafeCall.is_inapplicable());
        assert!(!Applicability::Hidden.is_inapplicable());
    }
}
