use super::distortion::TubeDistortion;
use super::filter::{FilterKind, VoiceFilter};
use super::param::Parameter;

// 0.01 is roughly -40 dB, a practical "off" point for the envelope
const DECAY_TARGET_LOG: f32 = -4.605_170_2; // ln(0.01)
const SILENCE_FLOOR: f32 = 1e-4;
const MIN_CUTOFF_HZ: f32 = 50.0;
const SUPER_SAW_DETUNE: [f32; SUPER_SAW_OSC_COUNT] = [0.988, 0.993, 0.998, 1.002, 1.007, 1.012];
const SUPER_SAW_OSC_COUNT: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TB303ParamId {
    Cutoff,
    Resonance,
    EnvAmount,
    EnvDecay,
    Oscillator,
    FilterType,
    MainVolume,
}

impl TB303ParamId {
    pub const COUNT: usize = 7;
    pub const ALL: [TB303ParamId; Self::COUNT] = [
        TB303ParamId::Cutoff,
        TB303ParamId::Resonance,
        TB303ParamId::EnvAmount,
        TB303ParamId::EnvDecay,
        TB303ParamId::Oscillator,
        TB303ParamId::FilterType,
        TB303ParamId::MainVolume,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Oscillator {
    Saw,
    Square,
    SuperSaw,
}

impl Oscillator {
    pub const LABELS: &'static [&'static str] = &["saw", "sqr", "super"];

    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Oscillator::Saw,
            1 => Oscillator::Square,
            _ => Oscillator::SuperSaw,
        }
    }
}

fn default_parameters() -> [Parameter; TB303ParamId::COUNT] {
    [
        Parameter::new("cut", "Hz", 60.0, 2500.0, 800.0, 100.0),
        Parameter::new("res", "", 0.05, 0.85, 0.6, 0.05),
        Parameter::new("env", "Hz", 0.0, 2000.0, 400.0, 200.0),
        Parameter::new("dec", "ms", 20.0, 2200.0, 420.0, 50.0),
        Parameter::with_options("osc", Oscillator::LABELS, 0),
        Parameter::with_options("flt", FilterKind::LABELS, 0),
        Parameter::new("vol", "", 0.0, 1.0, 0.8, 1.0 / 32.0),
    ]
}

/// Monophonic acid lead: oscillator, decaying filter envelope, accent and
/// slide. Parameters survive `reset()`; only runtime state is cleared.
#[derive(Clone, Debug)]
pub struct TB303Voice {
    phase: f32,
    super_phases: [f32; SUPER_SAW_OSC_COUNT],
    freq: f32,        // current, possibly mid-slide
    target_freq: f32, // slide target
    slide_speed: f32,
    env: f32,
    gate: bool,
    amp: f32,

    sample_rate: f32,
    inv_sample_rate: f32,
    nyquist: f32,

    params: [Parameter; TB303ParamId::COUNT],
    filter: VoiceFilter,
    distortion: TubeDistortion,
}

impl TB303Voice {
    pub fn new(sample_rate: f32) -> Self {
        let mut voice = Self {
            phase: 0.0,
            super_phases: [0.0; SUPER_SAW_OSC_COUNT],
            freq: 110.0,
            target_freq: 110.0,
            slide_speed: 0.002,
            env: 0.0,
            gate: false,
            amp: 0.3,
            sample_rate: 0.0,
            inv_sample_rate: 0.0,
            nyquist: 0.0,
            params: default_parameters(),
            filter: VoiceFilter::new(sample_rate),
            distortion: TubeDistortion::new(),
        };
        voice.distortion.set_drive(4.0);
        voice.set_sample_rate(sample_rate);
        voice.reset();
        voice
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
        // spread the super-saw phases so the stack doesn't start as one big spike
        for (i, p) in self.super_phases.iter_mut().enumerate() {
            *p = i as f32 / SUPER_SAW_OSC_COUNT as f32;
        }
        self.freq = 110.0;
        self.target_freq = 110.0;
        self.env = 0.0;
        self.gate = false;
        self.filter.reset();
    }

    pub fn set_sample_rate(&mut self, sr: f32) {
        let sr = if sr > 0.0 && sr.is_finite() { sr } else { 44100.0 };
        self.sample_rate = sr;
        self.inv_sample_rate = 1.0 / sr;
        self.nyquist = sr * 0.5;
        self.filter.set_sample_rate(sr);
    }

    pub fn start_note(&mut self, freq_hz: f32, accent: bool, slide: bool) {
        if !freq_hz.is_finite() || freq_hz <= 0.0 {
            return;
        }
        if !slide {
            self.freq = freq_hz;
        }
        self.target_freq = freq_hz;
        self.gate = true;
        // accent doubles the initial envelope energy
        self.env = if accent { 2.0 } else { 1.0 };
    }

    pub fn release(&mut self) {
        self.gate = false;
    }

    pub fn is_gate_on(&self) -> bool {
        self.gate
    }

    pub fn envelope(&self) -> f32 {
        self.env
    }

    pub fn frequency(&self) -> f32 {
        self.freq
    }

    pub fn is_silent(&self) -> bool {
        !self.gate && self.env < SILENCE_FLOOR
    }

    pub fn process(&mut self) -> f32 {
        if self.is_silent() {
            return 0.0;
        }
        let osc = self.oscillator_sample();
        let out = self.svf_process(osc) * self.amp * self.param_value(TB303ParamId::MainVolume);
        self.distortion.process(out)
    }

    pub fn parameter(&self, id: TB303ParamId) -> &Parameter {
        &self.params[id.index()]
    }

    pub fn set_parameter(&mut self, id: TB303ParamId, value: f32) {
        self.params[id.index()].set_value(value);
        self.sync_filter_kind();
    }

    pub fn adjust_parameter(&mut self, id: TB303ParamId, steps: i32) {
        self.params[id.index()].add_steps(steps);
        self.sync_filter_kind();
    }

    pub fn param_value(&self, id: TB303ParamId) -> f32 {
        self.params[id.index()].value()
    }

    pub fn oscillator(&self) -> Oscillator {
        Oscillator::from_index(self.params[TB303ParamId::Oscillator.index()].option_index())
    }

    pub fn filter_kind(&self) -> FilterKind {
        self.filter.kind()
    }

    pub fn set_distortion_enabled(&mut self, on: bool) {
        self.distortion.set_enabled(on);
    }

    pub fn is_distortion_enabled(&self) -> bool {
        self.distortion.is_enabled()
    }

    fn sync_filter_kind(&mut self) {
        let idx = self.params[TB303ParamId::FilterType.index()].option_index();
        self.filter.set_kind(FilterKind::from_index(idx));
    }

    fn osc_saw(&mut self) -> f32 {
        self.phase += self.freq * self.inv_sample_rate;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }
        2.0 * self.phase - 1.0
    }

    fn osc_square(saw: f32) -> f32 {
        if saw < 0.0 { -1.0 } else { 1.0 }
    }

    fn osc_super_saw(&mut self) -> f32 {
        let mut sum = 0.0;
        for (phase, detune) in self.super_phases.iter_mut().zip(SUPER_SAW_DETUNE) {
            *phase += self.freq * detune * self.inv_sample_rate;
            if *phase >= 1.0 {
                *phase -= phase.floor();
            }
            sum += 2.0 * *phase - 1.0;
        }
        // detuned saws partially cancel, so don't divide all the way down
        sum * (1.5 / SUPER_SAW_OSC_COUNT as f32)
    }

    fn oscillator_sample(&mut self) -> f32 {
        match self.oscillator() {
            Oscillator::Saw => self.osc_saw(),
            Oscillator::Square => {
                let saw = self.osc_saw();
                Self::osc_square(saw) * 0.7
            }
            Oscillator::SuperSaw => self.osc_super_saw(),
        }
    }

    fn svf_process(&mut self, input: f32) -> f32 {
        self.freq += (self.target_freq - self.freq) * self.slide_speed;
        if !self.freq.is_finite() {
            self.freq = self.target_freq;
        }

        let decay_ms = self.param_value(TB303ParamId::EnvDecay);
        let decay_samples = (decay_ms * self.sample_rate * 0.001).max(1.0);
        let decay_coeff = (DECAY_TARGET_LOG / decay_samples).exp();
        self.env *= decay_coeff;

        let cutoff = self.param_value(TB303ParamId::Cutoff)
            + self.param_value(TB303ParamId::EnvAmount) * self.env;
        let cutoff = cutoff.clamp(MIN_CUTOFF_HZ, self.nyquist * 0.9);

        self.filter
            .process(input, cutoff, self.param_value(TB303ParamId::Resonance))
    }
}
