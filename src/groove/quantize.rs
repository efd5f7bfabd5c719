// Grid Inference - Decides whether a layer's notes sit on a grid, and which one
// Quantised layers take the first candidate grid that explains them; anything else keeps raw ticks

use serde::{Deserialize, Serialize};

use super::grid::{StepLength, ANALYSIS_TICKS_PER_BEAT};

const STRAIGHT_TICKS: i64 = 120;
const TRIPLET_TICKS: i64 = 160;

/// Tunable thresholds for grid inference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceSettings {
    /// Fraction of notes that must land on a grid for it to count as quantised
    pub alignment_threshold: f64,

    /// Fraction of triplet-only and of straight-only notes that marks a pattern as mixed
    pub mixed_fraction: f64,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        InferenceSettings {
            alignment_threshold: 0.95,
            mixed_fraction: 0.20,
        }
    }
}

/// Global timing policy for every sequence layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingMode {
    /// Infer per layer
    #[default]
    Inferred,

    /// Keep raw tick timing everywhere
    Unquantised,
}

/// Result of grid inference for one layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridInference {
    pub is_unquantised: bool,

    /// Winning grid; 1/16 whenever the layer is unquantised
    pub step_length: StepLength,

    /// Some note lands on a triplet position that no straight grid explains
    pub has_triplets: bool,

    /// Some note lands on a straight position that no triplet grid explains
    pub has_straight: bool,

    pub mixed: bool,

    /// Alignment ratio of the winning grid
    pub score: f64,
}

impl GridInference {
    fn empty() -> Self {
        GridInference {
            is_unquantised: false,
            step_length: StepLength::Sixteenth,
            has_triplets: false,
            has_straight: false,
            mixed: false,
            score: 1.0,
        }
    }

    /// Same analysis, but forced down the raw-tick path
    pub fn into_unquantised(self) -> Self {
        GridInference {
            is_unquantised: true,
            step_length: StepLength::Sixteenth,
            ..self
        }
    }
}

/// Infer the quantisation grid of a layer from its note start times in beats
///
/// Algorithm:
/// 1. Convert starts to ticks at 960 per beat
/// 2. Score straight grids (1/16, 1/8, 1/4, 1/2, and 1/32 only when some note needs it);
///    a later grid replaces the best only with a strictly higher score
/// 3. Score triplet grids (1/16T, 1/8T); ties keep 1/16T
/// 4. Mark the layer mixed when both triplet-only and straight-only notes exceed the mixed fraction
/// 5. A triplet grid wins only when it clears the threshold, the layer is not mixed,
///    and it strictly beats the best straight grid
pub fn infer(times_beats: &[f64], settings: &InferenceSettings) -> GridInference {
    if times_beats.is_empty() {
        return GridInference::empty();
    }

    let ticks: Vec<i64> = times_beats
        .iter()
        .map(|t| (t * ANALYSIS_TICKS_PER_BEAT as f64).round() as i64)
        .collect();
    let total = ticks.len() as f64;

    let needs_thirty_second = ticks
        .iter()
        .any(|t| t % STRAIGHT_TICKS == 0 && t % (2 * STRAIGHT_TICKS) != 0);

    let mut straight = vec![
        StepLength::Sixteenth,
        StepLength::Eighth,
        StepLength::Quarter,
        StepLength::Half,
    ];
    if needs_thirty_second {
        straight.push(StepLength::ThirtySecond);
    }

    let (best_straight, straight_score) = best_grid(&ticks, &straight);
    let (best_triplet, triplet_score) =
        best_grid(&ticks, &[StepLength::SixteenthTriplet, StepLength::EighthTriplet]);

    let triplet_only = ticks
        .iter()
        .filter(|t| *t % TRIPLET_TICKS == 0 && *t % STRAIGHT_TICKS != 0)
        .count();
    let straight_only = ticks
        .iter()
        .filter(|t| *t % STRAIGHT_TICKS == 0 && *t % TRIPLET_TICKS != 0)
        .count();

    let mixed = triplet_only as f64 / total > settings.mixed_fraction
        && straight_only as f64 / total > settings.mixed_fraction;

    let triplet_wins =
        triplet_score >= settings.alignment_threshold && !mixed && triplet_score > straight_score;

    let (winner, score) = if triplet_wins {
        (best_triplet, triplet_score)
    } else {
        (best_straight, straight_score)
    };

    let is_unquantised = score < settings.alignment_threshold || mixed;

    let inference = GridInference {
        is_unquantised,
        step_length: if is_unquantised { StepLength::Sixteenth } else { winner },
        has_triplets: triplet_only > 0,
        has_straight: straight_only > 0,
        mixed,
        score,
    };

    log::debug!(
        "    Grid inference: {} notes, straight {} ({:.2}), triplet {} ({:.2}), mixed {} -> {}",
        ticks.len(),
        best_straight.label(),
        straight_score,
        best_triplet.label(),
        triplet_score,
        mixed,
        if is_unquantised { "unquantised" } else { winner.label() }
    );

    inference
}

/// Highest-scoring grid; earlier candidates win ties
fn best_grid(ticks: &[i64], candidates: &[StepLength]) -> (StepLength, f64) {
    let mut best = candidates[0];
    let mut best_score = alignment(ticks, best);

    for &candidate in &candidates[1..] {
        let score = alignment(ticks, candidate);
        if score > best_score {
            best = candidate;
            best_score = score;
        }
    }

    (best, best_score)
}

/// Fraction of ticks landing exactly on the grid
fn alignment(ticks: &[i64], grid: StepLength) -> f64 {
    let size = grid.analysis_ticks() as i64;
    let aligned = ticks.iter().filter(|t| *t % size == 0).count();
    aligned as f64 / ticks.len() as f64
}

/// Nearest grid step index for a time in beats
pub fn snap_to_grid(time_beats: f64, grid: StepLength) -> u64 {
    (time_beats.max(0.0) * grid.steps_per_beat()).round() as u64
}
