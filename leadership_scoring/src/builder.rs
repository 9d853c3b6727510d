pub use crate::config::*;
use crate::run_leadership_analysis;

/// A builder for assembling an analysis run.
///
/// It collects the catalog, the affinity table and the participant
/// records, then hands them to the engine in one call.
///
/// ```
/// pub use leadership_scoring::builder::Builder;
/// # use leadership_scoring::{AnalysisError, LeadershipIntent, Participant, Sentiment};
///
/// let groups = vec!["Automation".to_string(), "Database".to_string()];
/// let mut builder = Builder::new(&groups, "No other interest")?
///     .affinity(4, "Database", 0.9);
///
/// builder.add_participant(&Participant {
///     id: 1,
///     label: "ID_1".to_string(),
///     primary_group: "Automation".to_string(),
///     alternate_group: "No other interest".to_string(),
///     intent: LeadershipIntent::Direct,
///     topic: None,
///     sentiments: vec![Sentiment::Neutral; 3],
///     snippet: String::new(),
/// })?;
///
/// let outcome = builder.run()?;
/// assert_eq!(outcome.gap_groups, vec!["Database".to_string()]);
///
/// # Ok::<(), AnalysisError>(())
/// ```
pub struct Builder {
    pub(crate) _catalog: GroupCatalog,
    pub(crate) _affinity: AffinityTable,
    pub(crate) _participants: Vec<Participant>,
}

impl Builder {
    pub fn new(group_names: &[String], no_alternate: &str) -> Result<Builder, AnalysisError> {
        Ok(Builder {
            _catalog: GroupCatalog::new(group_names, no_alternate)?,
            _affinity: AffinityTable::new(),
            _participants: Vec::new(),
        })
    }

    /// Registers one affinity weight. Chainable; weights outside the
    /// catalog are accepted and simply never read.
    pub fn affinity(mut self, topic: u32, group: &str, weight: f64) -> Builder {
        self._affinity.insert(topic, group, weight);
        self
    }

    /// Adds a participant record. Input order is preserved and is the
    /// allocation tie-break.
    pub fn add_participant(&mut self, participant: &Participant) -> Result<(), AnalysisError> {
        if self._participants.iter().any(|p| p.id == participant.id) {
            return Err(AnalysisError::DuplicateParticipant(participant.id));
        }
        self._participants.push(participant.clone());
        Ok(())
    }

    pub fn run(&self) -> Result<AnalysisResult, AnalysisError> {
        run_leadership_analysis(&self._participants, &self._catalog, &self._affinity)
    }
}
