use crate::params::NumericParameter;

/// Parameter surface of the external delay unit. The signal path lives in the
/// audio layer; the autopilot only wanders `feedback` and `dry_wet`, and the
/// engine slaves `time` to the tempo.
pub struct DelaySection {
    pub dry_wet: NumericParameter,
    pub feedback: NumericParameter,
    pub time: NumericParameter,
}

impl DelaySection {
    pub fn new() -> Self {
        Self {
            dry_wet: NumericParameter::new("Delay Dry/Wet", (0.0, 0.5), 0.5),
            feedback: NumericParameter::new("Delay Feedback", (0.0, 0.9), 0.3),
            time: NumericParameter::new("Delay Time", (0.0, 2.0), 0.3),
        }
    }
}

impl Default for DelaySection {
    fn default() -> Self {
        Self::new()
    }
}
