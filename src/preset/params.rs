// Pad parameters - The full playback parameter set of one pad cell
// Values not derived from the source stay at the device's factory defaults

use serde::{Deserialize, Serialize};

use crate::project::Envelope;
use crate::sampler::PlaybackPlan;
use crate::tree::Node;

use super::cells::{format_int, params_node};

/// Envelope of an inert template pad
pub const TEMPLATE_ENVELOPE: Envelope = Envelope {
    attack: 0.0,
    decay: 0.0,
    sustain: 1000.0,
    release: 4.0,
};

/// Derived parameters of a pad; everything else is constant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PadParams {
    pub envelope: Envelope,
    pub sample_start: f64,
    pub sample_length: u64,
    pub multi_sample: bool,
    pub loop_enabled: bool,
    pub loop_start: f64,
    pub loop_end: f64,
    pub beat_count: u32,
    pub trigger_code: u8,
    pub cell_mode: u8,
    pub choke_group: u8,
}

impl PadParams {
    /// Parameters of an empty slot
    pub fn template() -> Self {
        PadParams {
            envelope: TEMPLATE_ENVELOPE,
            sample_start: 0.0,
            sample_length: 0,
            multi_sample: false,
            loop_enabled: false,
            loop_start: 0.0,
            loop_end: 0.0,
            beat_count: 0,
            trigger_code: 0,
            cell_mode: 0,
            choke_group: 0,
        }
    }

    pub fn from_plan(plan: &PlaybackPlan, multi_sample: bool, choke_group: u8) -> Self {
        PadParams {
            envelope: plan.envelope,
            sample_start: plan.sample_start,
            sample_length: plan.sample_length,
            multi_sample,
            loop_enabled: plan.loop_enabled,
            loop_start: plan.loop_start,
            loop_end: plan.loop_end,
            beat_count: plan.beat_count,
            trigger_code: plan.trigger_code,
            cell_mode: plan.cell_mode.code(),
            choke_group,
        }
    }

    /// Render the `<params>` element
    pub fn to_node(&self) -> Node {
        let flag = |on: bool| u8::from(on).to_string();

        params_node([
            ("gaindb", "0".to_string()),
            ("pitch", "0".to_string()),
            ("panpos", "0".to_string()),
            ("samtrigtype", self.trigger_code.to_string()),
            ("loopmode", flag(self.loop_enabled)),
            ("loopmodes", "0".to_string()),
            ("midimode", "0".to_string()),
            ("midioutchan", "0".to_string()),
            ("reverse", "0".to_string()),
            ("cellmode", self.cell_mode.to_string()),
            ("envattack", format_int(self.envelope.attack)),
            ("envdecay", format_int(self.envelope.decay)),
            ("envsus", format_int(self.envelope.sustain)),
            ("envrel", format_int(self.envelope.release)),
            ("samstart", format_int(self.sample_start)),
            ("samlen", self.sample_length.to_string()),
            ("loopstart", format_int(self.loop_start)),
            ("loopend", format_int(self.loop_end)),
            ("quantsize", "3".to_string()),
            ("synctype", "5".to_string()),
            ("actslice", "1".to_string()),
            ("outputbus", "0".to_string()),
            ("polymode", "0".to_string()),
            ("polymodeslice", "0".to_string()),
            ("slicestepmode", "0".to_string()),
            ("chokegrp", self.choke_group.to_string()),
            ("dualfilcutoff", "0".to_string()),
            ("res", "500".to_string()),
            ("rootnote", "0".to_string()),
            ("beatcount", self.beat_count.to_string()),
            ("fx1send", "0".to_string()),
            ("fx2send", "0".to_string()),
            ("multisammode", flag(self.multi_sample)),
            ("interpqual", "0".to_string()),
            ("playthru", "0".to_string()),
            ("slicerquantsize", "13".to_string()),
            ("slicersync", "0".to_string()),
            ("padnote", "0".to_string()),
            ("loopfadeamt", "0".to_string()),
            ("lfowave", "0".to_string()),
            ("lforate", "100".to_string()),
            ("lfoamount", "1000".to_string()),
            ("lfokeytrig", "0".to_string()),
            ("lfobeatsync", "0".to_string()),
            ("lforatebeatsync", "0".to_string()),
            ("grainsizeperc", "300".to_string()),
            ("grainscat", "0".to_string()),
            ("grainpanrnd", "0".to_string()),
            ("graindensity", "600".to_string()),
            ("slicemode", "0".to_string()),
            ("legatomode", "0".to_string()),
            ("gainssrcwin", "0".to_string()),
            ("grainreadspeed", "1000".to_string()),
            ("recpresetlen", "0".to_string()),
            ("recquant", "3".to_string()),
            ("recinput", "0".to_string()),
            ("recinputmulti", "0".to_string()),
            ("recusethres", "0".to_string()),
            ("recthresh", "-20000".to_string()),
            ("recmonoutbus", "0".to_string()),
        ])
    }
}
