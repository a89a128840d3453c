//! Duplicate clustering by transitive closure.
//!
//! Two observations are related when they share a title or a reachability
//! value. Clusters are the connected components of that relation, found in
//! pair space: collect related pairs, close them, then read the clusters off
//! the sorted closed pair set.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::metrics::CLUSTERS_FORMED;
use crate::observation::{ObservationId, VideoObservation};

/// Observations judged to be the same video. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateCluster {
    /// Ordered by fingerprint, without repeats.
    members: Vec<VideoObservation>,
}

impl DuplicateCluster {
    /// Build a cluster directly. Members with equal fingerprints collapse into
    /// one; `None` if nothing is left.
    pub fn from_members(members: Vec<VideoObservation>) -> Option<Self> {
        let by_id: BTreeMap<ObservationId, VideoObservation> =
            members.into_iter().map(|m| (m.id(), m)).collect();
        if by_id.is_empty() {
            return None;
        }
        Some(Self {
            members: by_id.into_values().collect(),
        })
    }

    pub fn members(&self) -> &[VideoObservation] {
        &self.members
    }

    pub fn into_members(self) -> Vec<VideoObservation> {
        self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false; kept alongside [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

type Pair = (usize, usize);

/// Partition `observations` into duplicate clusters.
///
/// Observations are identified by fingerprint, so exact copies count once.
/// Clusters come out ordered by their smallest fingerprint.
pub fn cluster(observations: &[VideoObservation]) -> Vec<DuplicateCluster> {
    // Index space follows fingerprint order.
    let by_id: BTreeMap<ObservationId, &VideoObservation> =
        observations.iter().map(|o| (o.id(), o)).collect();
    let pool: Vec<&VideoObservation> = by_id.into_values().collect();

    let mut pairs = BTreeSet::new();
    pairs.extend(group_pairs(&pool, |o| o.title.as_str()));
    pairs.extend(group_pairs(&pool, |o| o.reachability.value()));

    let closed = transitive_closure(pairs);
    let groups = pairs_to_groups(&closed);

    let clusters: Vec<DuplicateCluster> = groups
        .into_iter()
        .map(|group| DuplicateCluster {
            members: group.into_iter().map(|i| pool[i].clone()).collect(),
        })
        .collect();

    CLUSTERS_FORMED.inc_by(clusters.len() as u64);
    debug!(
        "Clustered {} observations ({} distinct) into {} clusters",
        observations.len(),
        pool.len(),
        clusters.len()
    );

    clusters
}

/// All pairs, self-pairs included, within each group of equal keys.
fn group_pairs<'a, F>(pool: &[&'a VideoObservation], key: F) -> BTreeSet<Pair>
where
    F: Fn(&'a VideoObservation) -> &'a str,
{
    let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, &observation) in pool.iter().enumerate() {
        groups.entry(key(observation)).or_default().push(index);
    }

    let mut pairs = BTreeSet::new();
    for members in groups.values() {
        for (i, &a) in members.iter().enumerate() {
            for &b in &members[i..] {
                pairs.insert((a, b));
            }
        }
    }
    pairs
}

/// Reflexive, symmetric and transitive closure by fixed-point iteration,
/// normalized to `(min, max)` pairs.
fn transitive_closure(pairs: BTreeSet<Pair>) -> BTreeSet<Pair> {
    let mut related: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
    for (a, b) in pairs {
        related.entry(a).or_default().extend([a, b]);
        related.entry(b).or_default().extend([a, b]);
    }

    loop {
        let mut additions = Vec::new();
        for (&a, neighbours) in &related {
            for b in neighbours {
                if let Some(next) = related.get(b) {
                    additions.extend(next.difference(neighbours).map(|&c| (a, c)));
                }
            }
        }
        if additions.is_empty() {
            break;
        }
        for (a, c) in additions {
            related.entry(a).or_default().insert(c);
            related.entry(c).or_default().insert(a);
        }
    }

    related
        .into_iter()
        .flat_map(|(a, neighbours)| neighbours.into_iter().map(move |b| (a.min(b), a.max(b))))
        .collect()
}

/// Read disjoint groups off a sorted, closed pair set.
///
/// Each unseen head opens a group; unseen tails join the group of their
/// head. Groups keep the order of their heads.
fn pairs_to_groups(pairs: &BTreeSet<Pair>) -> Vec<Vec<usize>> {
    let mut owner: HashMap<usize, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for &(head, tail) in pairs {
        let group = match owner.get(&head) {
            Some(&group) => group,
            None => {
                groups.push(vec![head]);
                owner.insert(head, groups.len() - 1);
                groups.len() - 1
            }
        };
        if let Entry::Vacant(slot) = owner.entry(tail) {
            slot.insert(group);
            groups[group].push(tail);
        }
    }

    for group in &mut groups {
        group.sort_unstable();
    }
    groups
}
