//! Waypoint sampling and batching.
//!
//! A solved route is far too dense for link-based map consumers, so it is
//! thinned to waypoints spaced at least a threshold apart along the path and
//! then split into fixed-capacity batches, one deep link per batch.

use crate::geo::Coordinate;

/// Default along-path spacing between sampled waypoints, meters.
pub const DEFAULT_SPACING_M: f64 = 100.0;

/// Default waypoint capacity per deep link batch.
pub const DEFAULT_BATCH_CAPACITY: usize = 25;

/// Thin a coordinate sequence to points at least `spacing_m` apart along the
/// path.
///
/// The first point is always emitted. Distance accumulates point to point;
/// once the accumulator reaches the threshold the point is emitted and the
/// accumulator resets. Consecutive identical points contribute nothing and
/// are never emitted twice.
pub fn sample_waypoints(coords: &[Coordinate], spacing_m: f64) -> Vec<Coordinate> {
    let mut sampled = Vec::new();
    let Some(first) = coords.first() else {
        return sampled;
    };
    sampled.push(*first);

    let mut accumulated = 0.0;
    for pair in coords.windows(2) {
        accumulated += pair[0].distance_to(&pair[1]);
        if accumulated >= spacing_m {
            sampled.push(pair[1]);
            accumulated = 0.0;
        }
    }
    sampled
}

/// Partition waypoints into batches of at most `capacity`, preserving order.
/// Only the final batch may be under capacity.
pub fn batch_waypoints(waypoints: &[Coordinate], capacity: usize) -> Vec<Vec<Coordinate>> {
    waypoints
        .chunks(capacity.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}
