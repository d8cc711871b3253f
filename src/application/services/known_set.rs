//! Known Set (C1)
//!
//! Holds the pre-enrolled, read-mostly set of identities used for
//! recognition probes. Rebuild is an operator-rare operation that takes a
//! write lock; lookups are far more frequent and only read.

use tokio::sync::RwLock;

use crate::domain::entities::KnownIdentity;
use crate::domain::value_objects::FaceEmbedding;

/// Result of a recognition probe against the known set.
#[derive(Debug, Clone, PartialEq)]
pub struct KnownMatch {
    pub name: String,
    pub distance: f32,
}

/// The embedding store of pre-enrolled identities (C1).
pub struct KnownSet {
    identities: RwLock<Vec<KnownIdentity>>,
    tau_recog: f32,
}

impl KnownSet {
    pub fn new(tau_recog: f32) -> Self {
        Self {
            identities: RwLock::new(Vec::new()),
            tau_recog,
        }
    }

    /// Replaces the known set wholesale (operator rebuild command).
    pub async fn rebuild(&self, identities: Vec<KnownIdentity>) {
        let mut guard = self.identities.write().await;
        *guard = identities;
    }

    /// Adds a single identity without disturbing the rest of the set.
    pub async fn add(&self, identity: KnownIdentity) {
        let mut guard = self.identities.write().await;
        guard.push(identity);
    }

    pub async fn len(&self) -> usize {
        self.identities.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Finds the nearest known identity to `embedding`. Returns `None` if
    /// the set is empty or nothing falls within `tau_recog`. Ties are broken
    /// by whichever identity was encountered first in internal order, which
    /// is deterministic because the set is scanned linearly in insertion
    /// order.
    pub async fn find_match(&self, embedding: &FaceEmbedding) -> Option<KnownMatch> {
        let guard = self.identities.read().await;
        let mut best: Option<KnownMatch> = None;
        for identity in guard.iter() {
            let distance = identity.nearest_distance(embedding);
            let better = match &best {
                None => true,
                Some(current) => distance < current.distance,
            };
            if better {
                best = Some(KnownMatch {
                    name: identity.name().to_string(),
                    distance,
                });
            }
        }
        best.filter(|m| m.distance <= self.tau_recog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedding(value: f32) -> FaceEmbedding {
        FaceEmbedding::new(vec![value; 128])
    }

    #[tokio::test]
    async fn empty_set_never_matches() {
        let set = KnownSet::new(0.6);
        assert!(set.find_match(&embedding(0.1)).await.is_none());
    }

    #[tokio::test]
    async fn finds_match_within_threshold() {
        let set = KnownSet::new(0.6);
        set.add(KnownIdentity::new("ada", vec![embedding(0.0)])).await;
        let result = set.find_match(&embedding(0.1)).await;
        assert_eq!(result.unwrap().name, "ada");
    }

    #[tokio::test]
    async fn distance_exactly_at_threshold_is_a_match() {
        let set = KnownSet::new(0.6);
        // distance across 128 dims of a constant delta d is d * sqrt(128).
        let delta = 0.6 / (128f32).sqrt();
        set.add(KnownIdentity::new("ada", vec![embedding(0.0)])).await;
        let result = set.find_match(&embedding(delta)).await;
        assert!(result.is_some());
    }

    #[tokio::test]
    async fn no_match_beyond_threshold() {
        let set = KnownSet::new(0.1);
        set.add(KnownIdentity::new("ada", vec![embedding(0.0)])).await;
        assert!(set.find_match(&embedding(5.0)).await.is_none());
    }

    #[tokio::test]
    async fn rebuild_replaces_the_whole_set() {
        let set = KnownSet::new(0.6);
        set.add(KnownIdentity::new("ada", vec![embedding(0.0)])).await;
        set.rebuild(vec![KnownIdentity::new("bob", vec![embedding(1.0)])]).await;
        assert_eq!(set.len().await, 1);
        assert!(set.find_match(&embedding(0.0)).await.is_none());
    }
}
