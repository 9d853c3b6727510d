// ********* Input data structures ***********

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

/// The leadership role a participant declared for themselves in the
/// survey.
///
/// Anything that does not match one of the two leadership phrases in the
/// survey maps to `ExecutionOnly`: such participants are never considered
/// by the allocation or scoring passes.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum LeadershipIntent {
    /// Willing to lead a working group directly.
    Direct,
    /// Willing to assist whoever ends up leading a group.
    Support,
    /// Wants to take part in the activities only.
    ExecutionOnly,
}

/// Sentiment label attached to one free-text answer by the upstream
/// classifier.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
        };
        write!(f, "{}", s)
    }
}

/// One anonymized survey respondent, as produced by the preprocessing
/// stage. Records are read-only during analysis: the engine only derives
/// new output fields, it never patches these.
#[derive(PartialEq, Debug, Clone)]
pub struct Participant {
    /// Opaque numeric id, unique, assigned at ingestion and never reused.
    pub id: u32,
    /// Display label used in logs and group outcomes. Pseudonymized
    /// upstream; may be a plain `ID_<n>` marker.
    pub label: String,
    /// Preferred working group. May name a group outside the catalog.
    pub primary_group: String,
    /// Fallback working group, or the catalog's "no other interest"
    /// sentinel.
    pub alternate_group: String,
    pub intent: LeadershipIntent,
    /// Dominant topic assigned by the external topic model, when it
    /// produced one.
    pub topic: Option<u32>,
    /// Sentiment labels for the leadership-relevant free-text fields, in
    /// the configured field order.
    pub sentiments: Vec<Sentiment>,
    /// Free-text contribution snippet, carried through unchanged.
    pub snippet: String,
}

/// The closed catalog of working groups. Group names are fixed at
/// construction time and ordered; the order drives the scorer's
/// first-seen tie-break over the gap set.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct GroupCatalog {
    names: Vec<String>,
    no_alternate: String,
}

impl GroupCatalog {
    /// Builds a catalog from an ordered list of group names and the
    /// literal answer that means "no alternate preference".
    pub fn new(names: &[String], no_alternate: &str) -> Result<GroupCatalog, AnalysisError> {
        if names.is_empty() {
            return Err(AnalysisError::EmptyCatalog);
        }
        for (idx, n) in names.iter().enumerate() {
            if names[..idx].contains(n) {
                return Err(AnalysisError::DuplicateGroup(n.clone()));
            }
        }
        Ok(GroupCatalog {
            names: names.to_vec(),
            no_alternate: no_alternate.to_string(),
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of a group in the catalog, or `None` for unmapped names.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// The literal that marks the absence of an alternate preference.
    pub fn no_alternate_answer(&self) -> &str {
        &self.no_alternate
    }
}

/// Static mapping from topic id to per-group affinity weight in [0, 1].
/// Built once from configuration, never mutated by the engine.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct AffinityTable {
    weights: HashMap<u32, HashMap<String, f64>>,
}

impl AffinityTable {
    pub fn new() -> AffinityTable {
        AffinityTable {
            weights: HashMap::new(),
        }
    }

    pub fn insert(&mut self, topic: u32, group: &str, weight: f64) {
        self.weights
            .entry(topic)
            .or_default()
            .insert(group.to_string(), weight);
    }

    /// Affinity of a topic for a group. `None` when either side is
    /// unknown to the table.
    pub fn weight(&self, topic: u32, group: &str) -> Option<f64> {
        self.weights.get(&topic).and_then(|m| m.get(group)).copied()
    }
}

// ******** Output data structures *********

/// How a direct leader landed on their group.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum AssignmentKind {
    /// Assigned through the primary group preference.
    Primary,
    /// Assigned through the alternate group preference.
    Alternate,
}

impl Display for AssignmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AssignmentKind::Primary => "direct-primary",
            AssignmentKind::Alternate => "direct-alternate",
        };
        write!(f, "{}", s)
    }
}

/// Terminal status of a participant after the two passes. Exactly one of
/// these per participant; the default state is kept when neither pass
/// claimed the participant.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum FinalStatus {
    /// Neither pass changed this participant.
    Default,
    /// Claimed by the direct-leader allocator.
    LeaderAssigned(AssignmentKind),
    /// Declared direct intent but no eligible group had an open slot.
    DirectUnassigned,
    /// Best-scoring support candidate for some gap group.
    PotentialSupportLeader,
    /// Declared support intent but no gap group scored above zero.
    SupportNoStrongMatch,
}

impl Display for FinalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinalStatus::Default => write!(f, "Participant (default)"),
            FinalStatus::LeaderAssigned(kind) => write!(f, "Leader Assigned ({})", kind),
            FinalStatus::DirectUnassigned => write!(f, "Direct Leader (unassigned)"),
            FinalStatus::PotentialSupportLeader => write!(f, "Potential Leader for Support"),
            FinalStatus::SupportNoStrongMatch => write!(f, "Support interest, no strong match"),
        }
    }
}

/// Origin of a suggested group in a [`LeadershipResult`].
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SuggestionKind {
    /// Produced by the support-leader scorer.
    Algorithmic,
}

impl Display for SuggestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestionKind::Algorithmic => write!(f, "algorithmic suggestion"),
        }
    }
}

/// The derived leadership record for one participant. Written exactly
/// once by the pipeline, never revised.
#[derive(PartialEq, Debug, Clone)]
pub struct LeadershipResult {
    pub participant_id: u32,
    pub intent: LeadershipIntent,
    pub primary_group: String,
    pub alternate_group: String,
    pub suggested_group: Option<String>,
    pub suggestion: Option<SuggestionKind>,
    pub status: FinalStatus,
    /// Aptitude score rounded to 2 decimal places; 0.0 unless the scorer
    /// kept a positive best match.
    pub aptitude_score: f64,
    /// Human-readable topic justification ("Topic 4", or "N/A").
    pub topic_label: String,
    /// Sentiment pair for the first two leadership fields,
    /// e.g. "Positive/Neutral".
    pub sentiment_label: String,
    /// Free-text contribution snippet, carried through unchanged.
    pub snippet: String,
}

/// A direct leader attached to a group by the allocator.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct GroupLeader {
    pub participant_id: u32,
    pub label: String,
    pub kind: AssignmentKind,
}

/// Final state of one catalog group after the allocation pass.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct GroupOutcome {
    pub name: String,
    pub leader: Option<GroupLeader>,
    /// Direct candidates who preferred this group but found the slot
    /// already taken. Audit trail for over-subscribed groups.
    pub unassigned_direct: Vec<(u32, String)>,
}

/// Outcome of a full analysis run.
#[derive(PartialEq, Debug, Clone)]
pub struct AnalysisResult {
    /// One record per participant, in input order.
    pub results: Vec<LeadershipResult>,
    /// One outcome per catalog group, in catalog order.
    pub groups: Vec<GroupOutcome>,
    /// Groups still without a leader after both passes, in catalog
    /// order.
    pub gap_groups: Vec<String>,
}

/// Errors that prevent an analysis run from starting.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AnalysisError {
    EmptyCatalog,
    DuplicateGroup(String),
    DuplicateParticipant(u32),
}

impl Error for AnalysisError {}

impl Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::EmptyCatalog => write!(f, "the group catalog is empty"),
            AnalysisError::DuplicateGroup(name) => {
                write!(f, "duplicate group name in catalog: {}", name)
            }
            AnalysisError::DuplicateParticipant(id) => {
                write!(f, "duplicate participant id: {}", id)
            }
        }
    }
}
