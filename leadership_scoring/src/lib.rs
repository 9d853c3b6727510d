mod config;
pub mod builder;

use log::{debug, info, warn};

use std::collections::HashSet;

pub use crate::config::*;

// **** Private structures ****

// Index of a group in the catalog order.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct GroupId(usize);

// Score weights for the support-leader pass.
const PRIMARY_PREFERENCE_TERM: f64 = 0.5;
const ALTERNATE_PREFERENCE_TERM: f64 = 0.3;
const TOPIC_AFFINITY_FACTOR: f64 = 0.7;
const SENTIMENT_FACTOR: f64 = 0.1;

// Leadership slot of one catalog group during a run. Mutated only by the
// allocation pass; the scorer reads it through the gap set.
#[derive(Debug, Clone)]
struct GroupSlot {
    leader: Option<GroupLeader>,
    unassigned_direct: Vec<(u32, String)>,
}

impl GroupSlot {
    fn empty() -> GroupSlot {
        GroupSlot {
            leader: None,
            unassigned_direct: Vec::new(),
        }
    }
}

// Fields derived for one participant across the two passes. Starts at the
// default status and transitions at most once.
#[derive(Debug, Clone)]
struct DerivedFields {
    status: FinalStatus,
    suggested: Option<GroupId>,
    suggestion: Option<SuggestionKind>,
    score: f64,
}

impl DerivedFields {
    fn default_fields() -> DerivedFields {
        DerivedFields {
            status: FinalStatus::Default,
            suggested: None,
            suggestion: None,
            score: 0.0,
        }
    }
}

/// Runs the full leadership analysis: the direct-leader allocation pass,
/// followed by the support-leader scoring pass over the groups still
/// lacking a leader, and finally the export of one result record per
/// participant in input order.
///
/// Arguments:
/// * `participants` the anonymized participant records, in survey order.
///   Iteration order is the tie-break: earlier records claim group slots
///   first.
/// * `catalog` the closed catalog of working groups.
/// * `affinity` the static topic-to-group affinity table.
///
/// An empty participant table yields an empty result set, not an error.
pub fn run_leadership_analysis(
    participants: &[Participant],
    catalog: &GroupCatalog,
    affinity: &AffinityTable,
) -> Result<AnalysisResult, AnalysisError> {
    info!(
        "Processing {:?} participants over {:?} catalog groups",
        participants.len(),
        catalog.len()
    );
    checks(participants)?;

    let mut slots: Vec<GroupSlot> = vec![GroupSlot::empty(); catalog.len()];
    let mut derived: Vec<DerivedFields> =
        vec![DerivedFields::default_fields(); participants.len()];

    if participants.is_empty() {
        warn!("No participant records: returning an empty result set");
        return Ok(export(participants, catalog, &slots, &derived));
    }

    allocate_direct_leaders(participants, catalog, &mut slots, &mut derived);

    let gaps = leaderless_groups(&slots);
    info!(
        "Groups still without a direct leader: {:?}",
        gaps.iter()
            .map(|g| catalog.names()[g.0].as_str())
            .collect::<Vec<_>>()
    );

    score_support_candidates(participants, catalog, affinity, &gaps, &mut derived);

    Ok(export(participants, catalog, &slots, &derived))
}

// Rejects duplicate participant ids. Ids are assigned at ingestion and
// must be unique within a run.
fn checks(participants: &[Participant]) -> Result<(), AnalysisError> {
    let mut seen: HashSet<u32> = HashSet::new();
    for p in participants.iter() {
        if !seen.insert(p.id) {
            return Err(AnalysisError::DuplicateParticipant(p.id));
        }
    }
    debug!("checks: {:?} unique participant ids", seen.len());
    Ok(())
}

// First pass: assign declared direct leaders to groups, one leader per
// group, primary preference before alternate, first-in-order wins.
fn allocate_direct_leaders(
    participants: &[Participant],
    catalog: &GroupCatalog,
    slots: &mut [GroupSlot],
    derived: &mut [DerivedFields],
) {
    for (idx, p) in participants.iter().enumerate() {
        if p.intent != LeadershipIntent::Direct {
            continue;
        }
        let primary = catalog.index_of(&p.primary_group);
        let alternate = if p.alternate_group == catalog.no_alternate_answer() {
            None
        } else {
            catalog.index_of(&p.alternate_group)
        };

        let assigned: Option<(GroupId, AssignmentKind)> = match primary {
            Some(g) if slots[g].leader.is_none() => Some((GroupId(g), AssignmentKind::Primary)),
            _ => match alternate {
                Some(g) if slots[g].leader.is_none() => {
                    Some((GroupId(g), AssignmentKind::Alternate))
                }
                _ => None,
            },
        };

        match assigned {
            Some((gid, kind)) => {
                slots[gid.0].leader = Some(GroupLeader {
                    participant_id: p.id,
                    label: p.label.clone(),
                    kind,
                });
                derived[idx].status = FinalStatus::LeaderAssigned(kind);
                derived[idx].suggested = Some(gid);
                info!(
                    "Direct leader '{}' (id: {}) assigned to group '{}' ({})",
                    p.label,
                    p.id,
                    catalog.names()[gid.0],
                    kind
                );
            }
            None => {
                // Keep the audit trail of over-subscribed groups.
                if let Some(g) = primary {
                    slots[g].unassigned_direct.push((p.id, p.label.clone()));
                }
                derived[idx].status = FinalStatus::DirectUnassigned;
                warn!(
                    "Direct leader '{}' (id: {}) could not be assigned. Preferences: primary='{}', alternate='{}'",
                    p.label, p.id, p.primary_group, p.alternate_group
                );
            }
        }
    }
}

// The gap set: catalog groups whose leader slot is still empty, in
// catalog order. Pure function over the registry state.
fn leaderless_groups(slots: &[GroupSlot]) -> Vec<GroupId> {
    slots
        .iter()
        .enumerate()
        .filter_map(|(idx, s)| {
            if s.leader.is_none() {
                Some(GroupId(idx))
            } else {
                None
            }
        })
        .collect()
}

// Second pass: rank the remaining support candidates against the gap set
// and keep the single best-scoring group per candidate.
fn score_support_candidates(
    participants: &[Participant],
    catalog: &GroupCatalog,
    affinity: &AffinityTable,
    gaps: &[GroupId],
    derived: &mut [DerivedFields],
) {
    if gaps.is_empty() {
        info!("Every group has a direct leader, skipping the support pass");
        return;
    }

    let candidate_count = participants
        .iter()
        .zip(derived.iter())
        .filter(|(p, d)| {
            p.intent == LeadershipIntent::Support && matches!(d.status, FinalStatus::Default)
        })
        .count();
    info!(
        "Evaluating {:?} support-leader candidates against {:?} gap groups",
        candidate_count,
        gaps.len()
    );

    for (idx, p) in participants.iter().enumerate() {
        if p.intent != LeadershipIntent::Support
            || !matches!(derived[idx].status, FinalStatus::Default)
        {
            continue;
        }

        // Seeded below zero so a group scoring in (-1, 0] is still picked
        // as "best" before the > 0 gate demotes the candidate.
        let mut best_score: f64 = -1.0;
        let mut best_group: Option<GroupId> = None;
        for &gid in gaps.iter() {
            let group_name = &catalog.names()[gid.0];
            let score = aptitude_score(p, group_name, catalog, affinity);
            debug!(
                "score_support_candidates: id {} group '{}' score {:.4}",
                p.id, group_name, score
            );
            // Strict comparison: the first gap group in catalog order
            // wins exact ties.
            if score > best_score {
                best_score = score;
                best_group = Some(gid);
            }
        }

        if best_score > 0.0 {
            derived[idx].status = FinalStatus::PotentialSupportLeader;
            derived[idx].suggested = best_group;
            derived[idx].suggestion = Some(SuggestionKind::Algorithmic);
            derived[idx].score = round2(best_score);
        } else {
            derived[idx].status = FinalStatus::SupportNoStrongMatch;
            derived[idx].score = 0.0;
        }
    }
}

// Weighted multi-signal score of one (participant, group) pair:
// stated preference, topic-model alignment and sentiment polarity.
fn aptitude_score(
    p: &Participant,
    group: &str,
    catalog: &GroupCatalog,
    affinity: &AffinityTable,
) -> f64 {
    let mut score: f64 = 0.0;

    if p.primary_group == group {
        score += PRIMARY_PREFERENCE_TERM;
    } else if p.alternate_group != catalog.no_alternate_answer() && p.alternate_group == group {
        score += ALTERNATE_PREFERENCE_TERM;
    }

    if let Some(topic) = p.topic {
        if let Some(w) = affinity.weight(topic, group) {
            score += finite_or_zero(w * TOPIC_AFFINITY_FACTOR);
        }
    }

    let mut polarity: i32 = 0;
    for s in p.sentiments.iter() {
        match s {
            Sentiment::Positive => polarity += 1,
            Sentiment::Negative => polarity -= 1,
            Sentiment::Neutral => {}
        }
    }
    score += polarity as f64 * SENTIMENT_FACTOR;

    finite_or_zero(score)
}

// Malformed numeric input must never poison the run.
fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

// Final pass: one output record per participant, input order preserved.
// Pure serialization of the derived fields.
fn export(
    participants: &[Participant],
    catalog: &GroupCatalog,
    slots: &[GroupSlot],
    derived: &[DerivedFields],
) -> AnalysisResult {
    let results: Vec<LeadershipResult> = participants
        .iter()
        .zip(derived.iter())
        .map(|(p, d)| LeadershipResult {
            participant_id: p.id,
            intent: p.intent,
            primary_group: p.primary_group.clone(),
            alternate_group: p.alternate_group.clone(),
            suggested_group: d.suggested.map(|gid| catalog.names()[gid.0].clone()),
            suggestion: d.suggestion,
            status: d.status,
            aptitude_score: d.score,
            topic_label: match p.topic {
                Some(t) => format!("Topic {}", t),
                None => "N/A".to_string(),
            },
            sentiment_label: sentiment_pair(&p.sentiments),
            snippet: p.snippet.clone(),
        })
        .collect();

    let groups: Vec<GroupOutcome> = catalog
        .names()
        .iter()
        .zip(slots.iter())
        .map(|(name, slot)| GroupOutcome {
            name: name.clone(),
            leader: slot.leader.clone(),
            unassigned_direct: slot.unassigned_direct.clone(),
        })
        .collect();

    let gap_groups: Vec<String> = leaderless_groups(slots)
        .iter()
        .map(|gid| catalog.names()[gid.0].clone())
        .collect();

    AnalysisResult {
        results,
        groups,
        gap_groups,
    }
}

// Justification label built from the first two leadership sentiment
// fields, matching the exported sentiment-pair column.
fn sentiment_pair(sentiments: &[Sentiment]) -> String {
    let first = sentiments
        .first()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    let second = sentiments
        .get(1)
        .map(|s| s.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    format!("{}/{}", first, second)
}
