//! Walking-route synthesis between two map coordinates.
//!
//! There is no road graph behind this: the kiosk map only needs a line that
//! looks like a plausible footpath and a rough ETA. Interior points are a
//! jittered linear interpolation with two fixed "turns"; distance is the
//! accumulated great-circle length of the polyline and duration follows
//! from a fixed walking speed. The straight-line fallback is used when the
//! caller asks for it or the inputs are unusable.

use rand::Rng;
use serde::Serialize;

/// Mean Earth radius in meters, used for all great-circle math.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Average walking speed, ~5 km/h.
pub const WALKING_SPEED_MPS: f64 = 1.4;

/// Interior point count of a synthesized route; with the exact start and
/// end framing them, every synthesized polyline has 10 points.
const INTERIOR_POINTS: usize = 8;

/// Jitter half-width in degrees, roughly ±11 m.
const JITTER_DEGREES: f64 = 0.0001;

/// Point count of the straight-line fallback.
const FALLBACK_POINTS: usize = 21;

/// A synthesized route: the polyline plus its metrics.
#[derive(Debug, Clone, Serialize)]
pub struct Route {
    /// `[lat, lng]` pairs from start to end inclusive.
    pub coordinates: Vec<[f64; 2]>,
    /// Total length in meters.
    pub distance: f64,
    /// Estimated walking time in seconds.
    pub duration: f64,
}

/// Entry point used by the map page. Never fails: unusable coordinates or
/// an explicit `direct` request fall back to the straight line.
pub fn plan(start: [f64; 2], end: [f64; 2], direct: bool) -> Route {
    if direct || !finite(start) || !finite(end) {
        return straight_line(start, end);
    }
    synthesize(start, end)
}

/// Produce a road-like polyline between `start` and `end`.
pub fn synthesize(start: [f64; 2], end: [f64; 2]) -> Route {
    let mut rng = rand::thread_rng();
    let mut coordinates = Vec::with_capacity(INTERIOR_POINTS + 2);

    coordinates.push(start);
    for i in 1..=INTERIOR_POINTS {
        let f = i as f64 / (INTERIOR_POINTS + 1) as f64;
        let lat = start[0]
            + (end[0] - start[0]) * f
            + rng.gen_range(-JITTER_DEGREES..=JITTER_DEGREES);
        let mut lng = start[1]
            + (end[1] - start[1]) * f
            + rng.gen_range(-JITTER_DEGREES..=JITTER_DEGREES);

        // Two fixed turns so the line does not read as jittered-straight
        if f > 0.3 && f < 0.4 {
            lng += JITTER_DEGREES;
        }
        if f > 0.6 && f < 0.7 {
            lng -= JITTER_DEGREES;
        }

        coordinates.push([lat, lng]);
    }
    coordinates.push(end);

    finish(coordinates)
}

/// Evenly subdivided straight line, used when synthesis is skipped.
pub fn straight_line(start: [f64; 2], end: [f64; 2]) -> Route {
    let mut coordinates = Vec::with_capacity(FALLBACK_POINTS);
    coordinates.push(start);
    for i in 1..FALLBACK_POINTS - 1 {
        let f = i as f64 / (FALLBACK_POINTS - 1) as f64;
        coordinates.push([
            start[0] + (end[0] - start[0]) * f,
            start[1] + (end[1] - start[1]) * f,
        ]);
    }
    coordinates.push(end);

    finish(coordinates)
}

/// Great-circle distance between two `[lat, lng]` points, in meters.
pub fn haversine(a: [f64; 2], b: [f64; 2]) -> f64 {
    let lat_a = a[0].to_radians();
    let lat_b = b[0].to_radians();
    let d_lat = (b[0] - a[0]).to_radians();
    let d_lng = (b[1] - a[1]).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

fn finish(coordinates: Vec<[f64; 2]>) -> Route {
    let distance = coordinates
        .windows(2)
        .map(|pair| haversine(pair[0], pair[1]))
        .sum::<f64>();
    Route {
        coordinates,
        distance,
        duration: distance / WALKING_SPEED_MPS,
    }
}

fn finite(point: [f64; 2]) -> bool {
    point[0].is_finite() && point[1].is_finite()
}
