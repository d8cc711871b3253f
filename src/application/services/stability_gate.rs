//! Stability Gate (C4)
//!
//! Per-candidate counter of consecutive frames a new-looking embedding
//! persists; controls admission into the quality collector. Owned
//! exclusively by the tracker core — never shared across threads.

use chrono::{DateTime, Duration, Utc};

use crate::domain::entities::DetectionCandidate;
use crate::domain::value_objects::FaceEmbedding;

/// Outcome of probing the stability gate with a new embedding.
pub enum CandidateProbe {
    /// An existing candidate matched; it has not yet reached stability.
    StillCollecting { candidate_id: String },
    /// An existing candidate matched and just reached stability; the caller
    /// should remove it and hand off to the quality collector.
    ReachedStability { candidate_id: String },
    /// No existing candidate matched; a new one was created.
    NewCandidate { candidate_id: String },
}

/// Flat, owned table of in-flight candidates keyed by an opaque id (C4).
#[derive(Default)]
pub struct StabilityGate {
    candidates: std::collections::HashMap<String, DetectionCandidate>,
    next_candidate_ordinal: u64,
}

impl StabilityGate {
    pub fn new() -> Self {
        Self {
            candidates: std::collections::HashMap::new(),
            next_candidate_ordinal: 1,
        }
    }

    /// Drops candidates that have gone unseen longer than `stale_after`.
    pub fn evict_stale(&mut self, now: DateTime<Utc>, stale_after: Duration) {
        self.candidates.retain(|_, candidate| !candidate.is_stale(now, stale_after));
    }

    pub fn get(&self, candidate_id: &str) -> Option<&DetectionCandidate> {
        self.candidates.get(candidate_id)
    }

    pub fn remove(&mut self, candidate_id: &str) -> Option<DetectionCandidate> {
        self.candidates.remove(candidate_id)
    }

    /// Finds the candidate whose embedding is closest to `embedding`, within
    /// `tau_dup`, and either advances it or creates a new one (§4.2 step 3).
    pub fn probe(
        &mut self,
        embedding: &FaceEmbedding,
        tau_dup: f32,
        n_stability: u32,
        now: DateTime<Utc>,
    ) -> CandidateProbe {
        let nearest = self
            .candidates
            .iter()
            .map(|(id, candidate)| (id.clone(), candidate.embedding().distance(embedding)))
            .filter(|(_, distance)| *distance <= tau_dup)
            .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        match nearest {
            Some((candidate_id, _)) => {
                let candidate = self
                    .candidates
                    .get_mut(&candidate_id)
                    .expect("candidate id came from this map");
                candidate.observe(now);
                if candidate.is_stable(n_stability) {
                    CandidateProbe::ReachedStability { candidate_id }
                } else {
                    CandidateProbe::StillCollecting { candidate_id }
                }
            }
            None => {
                let candidate_id = format!("cand_{}", self.next_candidate_ordinal);
                self.next_candidate_ordinal += 1;
                self.candidates
                    .insert(candidate_id.clone(), DetectionCandidate::new(candidate_id.clone(), embedding.clone(), now));
                CandidateProbe::NewCandidate { candidate_id }
            }
        }
    }
}
