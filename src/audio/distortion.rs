// Soft-clip waveshaper, x / (1 + |x|) with drive-dependent makeup gain.
// Stateless apart from its settings, so one instance can be shared by every
// drum voice.

pub const MIN_DRIVE: f32 = 0.1;
pub const MAX_DRIVE: f32 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TubeDistortion {
    drive: f32,
    mix: f32,
    enabled: bool,
}

impl Default for TubeDistortion {
    fn default() -> Self {
        Self {
            drive: 8.0,
            mix: 1.0,
            enabled: false,
        }
    }
}

impl TubeDistortion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_drive(&mut self, drive: f32) {
        if drive.is_nan() {
            return;
        }
        self.drive = drive.clamp(MIN_DRIVE, MAX_DRIVE);
    }

    pub fn set_mix(&mut self, mix: f32) {
        if mix.is_nan() {
            return;
        }
        self.mix = mix.clamp(0.0, 1.0);
    }

    pub fn set_enabled(&mut self, on: bool) {
        self.enabled = on;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn drive(&self) -> f32 {
        self.drive
    }

    pub fn mix(&self) -> f32 {
        self.mix
    }

    #[inline]
    pub fn process(&self, input: f32) -> f32 {
        if !self.enabled {
            return input;
        }
        let driven = input * self.drive;
        let shaped = driven / (1.0 + driven.abs());
        let comp = 1.0 / (1.0 + 0.3 * self.drive);
        input * (1.0 - self.mix) + shaped * comp * self.mix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_is_passthrough() {
        let d = TubeDistortion::new();
        for x in [-3.0, -0.5, 0.0, 0.25, 7.0] {
            assert_eq!(d.process(x), x);
        }
    }

    #[test]
    fn settings_are_clamped() {
        let mut d = TubeDistortion::new();
        d.set_drive(100.0);
        assert_eq!(d.drive(), MAX_DRIVE);
        d.set_drive(0.0);
        assert_eq!(d.drive(), MIN_DRIVE);
        d.set_mix(-1.0);
        assert_eq!(d.mix(), 0.0);
        d.set_mix(2.0);
        assert_eq!(d.mix(), 1.0);
    }

    #[test]
    fn wet_output_is_bounded_and_odd() {
        let mut d = TubeDistortion::new();
        d.set_enabled(true);
        d.set_drive(3.0);
        let comp = 1.0 / (1.0 + 0.3 * 3.0);
        for x in [0.1f32, 1.0, 10.0, 1000.0] {
            let y = d.process(x);
            assert!(y.abs() <= comp + 1e-6);
            assert!((d.process(-x) + y).abs() < 1e-6);
        }
    }

    #[test]
    fn zero_mix_is_dry() {
        let mut d = TubeDistortion::new();
        d.set_enabled(true);
        d.set_mix(0.0);
        assert_eq!(d.process(0.7), 0.7);
    }
}
