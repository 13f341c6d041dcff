// src/pipeline/partition.rs

//! Order-preserving split of a chapter list across workers.

use crate::models::Segment;

/// Split `links` into `workers` contiguous segments of near-equal size.
///
/// The last segment absorbs the remainder. `workers` is clamped to
/// `1..=links.len()` so no segment is empty; an empty list yields no segments.
pub fn partition(links: &[String], workers: usize) -> Vec<Segment> {
    if links.is_empty() {
        return Vec::new();
    }
    let workers = workers.clamp(1, links.len());
    let size = links.len() / workers;

    (0..workers)
        .map(|i| {
            let start = i * size;
            let end = if i + 1 == workers {
                links.len()
            } else {
                start + size
            };
            Segment {
                start,
                links: links[start..end].to_vec(),
            }
        })
        .collect()
}
