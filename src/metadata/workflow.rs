//! The fallback cascade as an explicit state machine.
//!
//! [`transition`] is pure and only ever moves forward, so a run visits each
//! step at most once and always terminates.

use std::fmt;

/// A stage of the fallback cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Extract an ASIN from the source tracker.
    MamLookup,
    /// Resolve the ASIN against the book provider.
    AsinResolve,
    /// Search the catalog by guessed title and author.
    TitleSearch,
    /// Every step came up empty.
    Exhausted,
}

impl Step {
    /// Position in the cascade; strictly increases along any run.
    pub fn ordinal(self) -> u8 {
        match self {
            Step::MamLookup => 0,
            Step::AsinResolve => 1,
            Step::TitleSearch => 2,
            Step::Exhausted => 3,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Step::Exhausted)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::MamLookup => write!(f, "mam_lookup"),
            Step::AsinResolve => write!(f, "asin_resolve"),
            Step::TitleSearch => write!(f, "title_search"),
            Step::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// What a step produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// An intermediate key (an ASIN) was found.
    Found,
    /// A complete metadata record was produced.
    Resolved,
    /// The provider answered with nothing.
    NotFound,
    /// The provider could not be reached.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Advance(Step),
    Finish,
}

pub fn transition(step: Step, outcome: Outcome) -> Transition {
    match (step, outcome) {
        (Step::Exhausted, _) => Transition::Finish,
        (_, Outcome::Resolved) => Transition::Finish,
        (Step::MamLookup, Outcome::Found) => Transition::Advance(Step::AsinResolve),
        (Step::MamLookup, _) => Transition::Advance(Step::TitleSearch),
        (Step::AsinResolve, _) => Transition::Advance(Step::TitleSearch),
        (Step::TitleSearch, _) => Transition::Advance(Step::Exhausted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEPS: [Step; 4] = [
        Step::MamLookup,
        Step::AsinResolve,
        Step::TitleSearch,
        Step::Exhausted,
    ];
    const OUTCOMES: [Outcome; 4] = [
        Outcome::Found,
        Outcome::Resolved,
        Outcome::NotFound,
        Outcome::Failed,
    ];

    #[test]
    fn never_moves_backwards() {
        for step in STEPS {
            for outcome in OUTCOMES {
                if let Transition::Advance(next) = transition(step, outcome) {
                    assert!(
                        next.ordinal() > step.ordinal(),
                        "{step} --{outcome:?}--> {next}"
                    );
                }
            }
        }
    }

    #[test]
    fn mam_hit_goes_to_asin_resolution() {
        assert_eq!(
            transition(Step::MamLookup, Outcome::Found),
            Transition::Advance(Step::AsinResolve)
        );
    }

    #[test]
    fn mam_miss_or_failure_skips_to_search() {
        for outcome in [Outcome::NotFound, Outcome::Failed] {
            assert_eq!(
                transition(Step::MamLookup, outcome),
                Transition::Advance(Step::TitleSearch)
            );
        }
    }

    #[test]
    fn provider_failure_advances() {
        assert_eq!(
            transition(Step::AsinResolve, Outcome::Failed),
            Transition::Advance(Step::TitleSearch)
        );
        assert_eq!(
            transition(Step::TitleSearch, Outcome::Failed),
            Transition::Advance(Step::Exhausted)
        );
    }

    #[test]
    fn resolution_finishes() {
        assert_eq!(transition(Step::AsinResolve, Outcome::Resolved), Transition::Finish);
        assert_eq!(transition(Step::TitleSearch, Outcome::Resolved), Transition::Finish);
        assert_eq!(transition(Step::Exhausted, Outcome::NotFound), Transition::Finish);
        assert!(Step::Exhausted.is_terminal());
    }
}
