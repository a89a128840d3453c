//! Field-wise majority fusion of a duplicate cluster.

use crate::observation::{CanonicalVideo, Reachability, VideoObservation};

use super::DuplicateCluster;

/// Fuse a cluster into one canonical record.
///
/// A singleton comes back unchanged. Otherwise members that name a series
/// form the voting pool (all members if none does), and each field takes its
/// most frequent non-empty value. Ties go to the value seen first in
/// fingerprint order, so the result does not depend on input order.
/// The fused link is always recorded as [`Reachability::Direct`].
pub fn fuse(cluster: &DuplicateCluster) -> CanonicalVideo {
    if let [only] = cluster.members() {
        return CanonicalVideo::from(only.clone());
    }

    let with_series: Vec<&VideoObservation> = cluster
        .members()
        .iter()
        .filter(|m| !m.series.is_empty())
        .collect();
    let pool: Vec<&VideoObservation> = if with_series.is_empty() {
        cluster.members().iter().collect()
    } else {
        with_series
    };

    CanonicalVideo {
        title: vote(&pool, |m| m.title.as_str()),
        thumbnail: vote(&pool, |m| m.thumbnail.as_str()),
        shortname: vote(&pool, |m| m.shortname.as_str()),
        series: vote(&pool, |m| m.series.as_str()),
        reachability: Reachability::Direct(vote(&pool, |m| m.reachability.value())),
    }
}

struct Tally<'a> {
    value: &'a str,
    count: usize,
}

/// Most frequent non-empty value of one field; `""` if there is none.
fn vote<'a, F>(pool: &[&'a VideoObservation], field: F) -> String
where
    F: Fn(&'a VideoObservation) -> &'a str,
{
    // Kept in first-appearance order
    let mut tallies: Vec<Tally<'a>> = Vec::new();
    for &member in pool {
        let value = field(member);
        if value.is_empty() {
            continue;
        }
        match tallies.iter_mut().find(|t| t.value == value) {
            Some(tally) => tally.count += 1,
            None => tallies.push(Tally { value, count: 1 }),
        }
    }

    let mut winner: Option<&Tally<'a>> = None;
    for tally in &tallies {
        let better = match winner {
            None => true,
            Some(best) => tally.count > best.count,
        };
        if better {
            winner = Some(tally);
        }
    }

    winner.map(|t| t.value.to_string()).unwrap_or_default()
}
