use crate::model::{Teacher, NO_TEACHER};

/// How a free-text teacher label from a generated slot is matched against a
/// directory record. Generated timetables usually carry either the bare name
/// or "Name (ID: id)".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    ExactName,
    ExactNameWithId,
    /// The label contains the teacher's name as a substring. Deliberately
    /// permissive; can mis-attribute when one name is a substring of
    /// another label. First directory match wins.
    SubstringContains,
}

impl MatchStrategy {
    fn matches(self, label: &str, teacher: &Teacher) -> bool {
        match self {
            Self::ExactName => label == teacher.name,
            Self::ExactNameWithId => {
                label == format!("{} (ID: {})", teacher.name, teacher.id)
            }
            Self::SubstringContains => label.contains(&teacher.name),
        }
    }
}

/// Default strategy order, strictest first.
pub const DEFAULT_STRATEGIES: [MatchStrategy; 3] = [
    MatchStrategy::ExactName,
    MatchStrategy::ExactNameWithId,
    MatchStrategy::SubstringContains,
];

/// Resolves a slot's teacher label against the directory. Empty labels and
/// the "N/A" sentinel mean "no teacher", not a failed match. Strategies are
/// tried in order and the first hit wins, so resolution is deterministic for
/// a fixed directory order even when the substring rule is ambiguous.
pub fn resolve_with<'a>(
    label: &str,
    directory: &'a [Teacher],
    strategies: &[MatchStrategy],
) -> Option<&'a Teacher> {
    if label.is_empty() || label == NO_TEACHER {
        return None;
    }
    for strategy in strategies {
        if let Some(t) = directory.iter().find(|t| strategy.matches(label, t)) {
            return Some(t);
        }
    }
    None
}

pub fn resolve<'a>(label: &str, directory: &'a [Teacher]) -> Option<&'a Teacher> {
    resolve_with(label, directory, &DEFAULT_STRATEGIES)
}
