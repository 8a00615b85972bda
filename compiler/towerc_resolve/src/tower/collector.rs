use crate::candidate::Candidate;
use towerc_resolve_models::Applicability;

pub trait ResultCollector<C> {
    /// `Some` once the search may stop.
    fn successful_candidates(&self) -> Option<Vec<C>>;

    /// Best effort result when no position stopped the search.
    fn final_candidates(&self) -> Vec<C>;

    fn push_candidates(&mut self, candidates: Vec<C>);
}

/// Gathers every non-hidden candidate and never stops the search.
#[derive(Debug)]
pub struct AllCandidatesCollector<C> {
    all_candidates: Vec<C>,
}

impl<C> AllCandidatesCollector<C> {
    pub fn new() -> AllCandidatesCollector<C> {
        AllCandidatesCollector {
            all_candidates: vec![],
        }
    }
}

impl<C> Default for AllCandidatesCollector<C> {
    fn default() -> Self {
        AllCandidatesCollector::new()
    }
}

impl<C: Candidate> ResultCollector<C> for AllCandidatesCollector<C> {
    fn successful_candidates(&self) -> Option<Vec<C>> {
        None
    }

    fn final_candidates(&self) -> Vec<C> {
        self.all_candidates.clone()
    }

    fn push_candidates(&mut self, candidates: Vec<C>) {
        self.all_candidates.extend(
            candidates
                .into_iter()
                .filter(|candidate| candidate.resulting_applicability() != Applicability::Hidden),
        );
    }
}

#[derive(Debug)]
pub struct SuccessfulResultCollector<C> {
    candidate_groups: Vec<Vec<C>>,
    is_successful: bool,
}

impl<C> SuccessfulResultCollector<C> {
    pub fn new() -> SuccessfulResultCollector<C> {
        SuccessfulResultCollector {
            candidate_groups: vec![],
            is_successful: false,
        }
    }
}

impl<C> Default for SuccessfulResultCollector<C> {
    fn default() -> Self {
        SuccessfulResultCollector::new()
    }
}

fn should_stop_resolve_on_candidate<C: Candidate>(candidate: &C) -> bool {
    candidate.resulting_applicability().should_stop_resolve()
}

fn is_preserve_compatibility_candidate<C: Candidate>(candidate: &C) -> bool {
    candidate.resulting_applicability() == Applicability::ResolvedNeedPreserveCompatibility
}

fn group_applicability<C: Candidate>(group: &[C]) -> Applicability {
    group
        .iter()
        .map(Candidate::resulting_applicability)
        .max()
        .unwrap_or(Applicability::Hidden)
}

impl<C: Candidate> ResultCollector<C> for SuccessfulResultCollector<C> {
    fn successful_candidates(&self) -> Option<Vec<C>> {
        if !self.is_successful {
            return None;
        }

        let mut stop_group: Option<(usize, &Vec<C>)> = None;
        let mut compatibility_candidate: Option<(usize, &C)> = None;
        for (index, group) in self.candidate_groups.iter().enumerate() {
            for candidate in group {
                if compatibility_candidate.is_none() && is_preserve_compatibility_candidate(candidate) {
                    compatibility_candidate = Some((index, candidate));
                }
                if stop_group.is_none() && should_stop_resolve_on_candidate(candidate) {
                    stop_group = Some((index, group));
                }
            }
        }

        let (stop_index, group) = stop_group?;

        if let Some((compatibility_index, compatibility)) = compatibility_candidate {
            if compatibility_index != stop_index && compatibility.needs_compatibility_warning() {
                for candidate in group {
                    candidate.add_compatibility_warning(compatibility);
                }
            }
        }

        Some(
            group
                .iter()
                .filter(|candidate| should_stop_resolve_on_candidate(*candidate))
                .cloned()
                .collect(),
        )
    }

    fn final_candidates(&self) -> Vec<C> {
        let mut best: Option<(&Vec<C>, Applicability)> = None;
        for group in &self.candidate_groups {
            let applicability = group_applicability(group);
            // Earlier groups win ties.
            if best.is_none_or(|(_, current)| applicability > current) {
                best = Some((group, applicability));
            }
        }

        match best {
            Some((group, applicability)) if applicability != Applicability::Hidden => group
                .iter()
                .filter(|candidate| candidate.resulting_applicability() == applicability)
                .cloned()
                .collect(),
            _ => vec![],
        }
    }

    fn push_candidates(&mut self, candidates: Vec<C>) {
        let successful: Vec<C> = candidates
            .iter()
            .filter(|candidate| candidate.is_successful())
            .cloned()
            .collect();

        if !self.is_successful && successful.is_empty() {
            self.candidate_groups.push(candidates);
            return;
        }

        if !self.is_successful {
            self.candidate_groups.clear();
            self.is_successful = true;
        }
        if !successful.is_empty() {
            self.candidate_groups.push(successful);
        }
    }
}
