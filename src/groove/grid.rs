// Step Grid - Sequencer step lengths, tick resolutions and the coarsening ladder
// Provides the rhythmic vocabulary shared by grid inference and sequence building

use serde::{Deserialize, Serialize};

/// Ticks per beat used when testing note starts against candidate grids
pub const ANALYSIS_TICKS_PER_BEAT: u32 = 960;

/// Ticks per beat in emitted note events (960 per 1/16 step)
pub const OUTPUT_TICKS_PER_BEAT: u32 = 3840;

/// Most steps a sequence cell can hold
pub const MAX_STEPS: u32 = 256;

pub const BEATS_PER_BAR: f64 = 4.0;

/// Step length of a sequence cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepLength {
    ThirtySecond,
    Sixteenth,
    Eighth,
    Quarter,
    Half,
    Bar,
    TwoBars,
    FourBars,
    EightBars,

    /// 1/16 triplet (6 per beat)
    SixteenthTriplet,

    /// 1/8 triplet (3 per beat)
    EighthTriplet,
}

/// Rungs walked when a cell would exceed `MAX_STEPS`
const LADDER: [StepLength; 8] = [
    StepLength::Sixteenth,
    StepLength::Eighth,
    StepLength::Quarter,
    StepLength::Half,
    StepLength::Bar,
    StepLength::TwoBars,
    StepLength::FourBars,
    StepLength::EightBars,
];

impl StepLength {
    /// Destination `notesteplen` code
    pub fn code(&self) -> u8 {
        match self {
            StepLength::ThirtySecond => 12,
            StepLength::Sixteenth => 10,
            StepLength::Eighth => 8,
            StepLength::Quarter => 6,
            StepLength::Half => 4,
            StepLength::Bar => 3,
            StepLength::TwoBars => 2,
            StepLength::FourBars => 1,
            StepLength::EightBars => 0,
            StepLength::SixteenthTriplet => 11,
            StepLength::EighthTriplet => 9,
        }
    }

    /// Number of steps that fit in one beat
    pub fn steps_per_beat(&self) -> f64 {
        match self {
            StepLength::ThirtySecond => 8.0,
            StepLength::Sixteenth => 4.0,
            StepLength::Eighth => 2.0,
            StepLength::Quarter => 1.0,
            StepLength::Half => 0.5,
            StepLength::Bar => 0.25,
            StepLength::TwoBars => 0.125,
            StepLength::FourBars => 0.0625,
            StepLength::EightBars => 0.03125,
            StepLength::SixteenthTriplet => 6.0,
            StepLength::EighthTriplet => 3.0,
        }
    }

    /// Length of one step in beats
    pub fn beats(&self) -> f64 {
        1.0 / self.steps_per_beat()
    }

    /// Length of one step at the analysis resolution
    pub fn analysis_ticks(&self) -> u32 {
        (self.beats() * ANALYSIS_TICKS_PER_BEAT as f64).round() as u32
    }

    /// Length of one step at the output resolution
    pub fn output_ticks(&self) -> u32 {
        (self.beats() * OUTPUT_TICKS_PER_BEAT as f64).round() as u32
    }

    /// Next strictly coarser rung of the ladder, if any
    pub fn coarser(&self) -> Option<StepLength> {
        let beats = self.beats();
        LADDER.iter().copied().find(|rung| rung.beats() > beats)
    }

    pub fn label(&self) -> &'static str {
        match self {
            StepLength::ThirtySecond => "1/32",
            StepLength::Sixteenth => "1/16",
            StepLength::Eighth => "1/8",
            StepLength::Quarter => "1/4",
            StepLength::Half => "1/2",
            StepLength::Bar => "1 bar",
            StepLength::TwoBars => "2 bars",
            StepLength::FourBars => "4 bars",
            StepLength::EightBars => "8 bars",
            StepLength::SixteenthTriplet => "1/16T",
            StepLength::EighthTriplet => "1/8T",
        }
    }
}

/// Step grid of one sequence cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepGrid {
    pub step_length: StepLength,

    /// Always within 1..=MAX_STEPS
    pub step_count: u32,
}

impl StepGrid {
    /// Grid for an event-less slot with no clip
    pub fn minimal() -> Self {
        StepGrid {
            step_length: StepLength::Sixteenth,
            step_count: 1,
        }
    }

    /// Fit a clip length onto a grid, coarsening until it fits in `MAX_STEPS`
    pub fn fit(length_beats: f64, start: StepLength) -> Self {
        let count = |step: StepLength| (length_beats.max(0.0) * step.steps_per_beat() + 1e-9).floor() as u32;

        let mut step_length = start;
        let mut step_count = count(step_length);

        while step_count > MAX_STEPS {
            match step_length.coarser() {
                Some(next) => {
                    step_length = next;
                    step_count = count(next);
                }
                None => break,
            }
        }

        StepGrid {
            step_length,
            step_count: step_count.clamp(1, MAX_STEPS),
        }
    }

    /// Index of the step containing a time in beats
    pub fn step_at(&self, time_beats: f64) -> u32 {
        (time_beats.max(0.0) * self.step_length.steps_per_beat() + 1e-9).floor() as u32
    }

    pub fn length_beats(&self) -> f64 {
        self.step_count as f64 * self.step_length.beats()
    }
}
