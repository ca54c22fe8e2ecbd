use std::f32::consts::TAU;

use super::distortion::TubeDistortion;
use super::param::Parameter;
use crate::shared::DrumVoice;

// All the decay multipliers below are per-sample constants tuned by ear on the
// handheld at 22050 Hz. Treat them as the instrument's voicing, not as
// approximations of anything.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrumParamId {
    MainVolume,
}

impl DrumParamId {
    pub const COUNT: usize = 1;

    pub fn index(self) -> usize {
        self as usize
    }
}

#[inline]
fn advance(phase: &mut f32, freq: f32, inv_sr: f32) {
    *phase += freq * inv_sr;
    if *phase >= 1.0 {
        *phase -= phase.floor();
    }
}

// white noise in -1..1, pulled from the kit's own rng so nothing allocates
#[inline]
fn frand(rng: &mut fastrand::Rng) -> f32 {
    rng.f32() * 2.0 - 1.0
}

#[derive(Clone, Debug, Default)]
struct Kick {
    phase: f32,
    env_amp: f32,
    env_pitch: f32,
    active: bool,
    accent_gain: f32,
    accent: bool,
    amp_decay: f32,
    base_freq: f32,
}

impl Kick {
    fn trigger(&mut self, accent: bool) {
        self.active = true;
        self.phase = 0.0;
        self.env_amp = if accent { 1.4 } else { 1.2 };
        self.env_pitch = 1.0;
        self.accent_gain = if accent { 1.15 } else { 1.0 };
        self.accent = accent;
        self.amp_decay = if accent { 0.99965 } else { 0.9995 };
        self.base_freq = if accent { 36.0 } else { 42.0 };
    }

    fn process(&mut self, inv_sr: f32) -> f32 {
        if !self.active {
            return 0.0;
        }
        // long amp tail, fast pitch drop
        self.env_amp *= self.amp_decay;
        self.env_pitch *= 0.997;
        if self.env_amp < 0.0008 {
            self.active = false;
            return 0.0;
        }
        let pitch = self.env_pitch * self.env_pitch;
        advance(&mut self.phase, self.base_freq + 170.0 * pitch, inv_sr);

        let body = (TAU * self.phase).sin();
        let transient = (TAU * self.phase * 3.0).sin() * pitch * 0.25;
        let driven = (body * (2.8 + 0.6 * self.env_amp)).tanh();
        (driven * 0.85 + transient) * self.env_amp * self.accent_gain
    }
}

#[derive(Clone, Debug, Default)]
struct Snare {
    env_amp: f32,
    tone_env: f32,
    active: bool,
    bp: f32,
    lp: f32,
    tone_phase: f32,
    tone_phase2: f32,
    accent_gain: f32,
    tone_gain: f32,
    accent: bool,
}

impl Snare {
    fn trigger(&mut self, accent: bool) {
        self.active = true;
        self.env_amp = if accent { 1.4 } else { 1.0 };
        self.tone_env = if accent { 1.35 } else { 1.0 };
        self.tone_phase = 0.0;
        self.tone_phase2 = 0.0;
        self.accent_gain = if accent { 1.15 } else { 1.0 };
        self.tone_gain = if accent { 1.2 } else { 1.0 };
        self.accent = accent;
    }

    fn process(&mut self, rng: &mut fastrand::Rng, inv_sr: f32) -> f32 {
        if !self.active {
            return 0.0;
        }
        // 808 style: long noise tail, short tonal tick
        self.env_amp *= 0.9985;
        self.tone_env *= 0.99999;
        if self.env_amp < 0.0002 {
            self.active = false;
            return 0.0;
        }

        let n = frand(rng);
        // bandpass somewhere around 1-2 kHz plus a lot of crude highpass fizz
        let f = 0.28;
        self.bp += f * (n - self.lp - 0.20 * self.bp);
        self.lp += f * self.bp;
        let noise_hp = n - self.lp;
        let noise = self.bp * 0.35 + noise_hp * 0.65;

        advance(&mut self.tone_phase, 330.0, inv_sr);
        advance(&mut self.tone_phase2, 180.0, inv_sr);
        let tone_a = (TAU * self.tone_phase).sin();
        let tone_b = (TAU * self.tone_phase2).sin();
        let tone = (tone_a * 0.55 + tone_b * 0.45) * self.tone_env * self.tone_gain;

        (noise * 0.75 + tone * 0.65) * self.env_amp * self.accent_gain
    }
}

/// Closed and open hat share one algorithm with different voicing.
#[derive(Clone, Debug, Default)]
struct Hat {
    env_amp: f32,
    tone_env: f32,
    active: bool,
    hp: f32,
    prev: f32,
    phase_a: f32,
    phase_b: f32,
    accent_gain: f32,
    brightness: f32,
    accent: bool,
}

#[derive(Clone, Copy, Debug)]
struct HatVoicing {
    amp_decay: f32,
    tone_decay: f32,
    floor: f32,
    alpha: f32,
    partials: (f32, f32),
    noise_mix: f32,
    tone_mix: f32,
    level: f32,
}

const CLOSED_HAT: HatVoicing = HatVoicing {
    amp_decay: 0.998,
    tone_decay: 0.92,
    floor: 0.0005,
    alpha: 0.92,
    partials: (6200.0, 7400.0),
    noise_mix: 0.65,
    tone_mix: 0.7,
    level: 0.6,
};

const OPEN_HAT: HatVoicing = HatVoicing {
    amp_decay: 0.9993,
    tone_decay: 0.94,
    floor: 0.0004,
    alpha: 0.93,
    partials: (5100.0, 6600.0),
    noise_mix: 0.55,
    tone_mix: 0.95,
    level: 0.7,
};

impl Hat {
    fn trigger_closed(&mut self, accent: bool) {
        self.active = true;
        self.env_amp = if accent { 0.7 } else { 0.5 };
        self.tone_env = 1.0;
        self.phase_a = 0.0;
        self.phase_b = 0.25;
        self.accent_gain = if accent { 1.4 } else { 1.0 };
        self.brightness = if accent { 1.45 } else { 1.0 };
        self.accent = accent;
    }

    fn trigger_open(&mut self, accent: bool) {
        self.active = true;
        self.env_amp = if accent { 0.999 } else { 0.9 };
        self.tone_env = 1.0;
        self.phase_a = 0.0;
        self.phase_b = 0.37;
        self.accent_gain = if accent { 1.3 } else { 1.0 };
        self.brightness = if accent { 1.25 } else { 1.0 };
        self.accent = accent;
    }

    fn choke(&mut self) {
        self.env_amp *= 0.3;
    }

    fn process(&mut self, v: &HatVoicing, rng: &mut fastrand::Rng, inv_sr: f32) -> f32 {
        if !self.active {
            return 0.0;
        }
        self.env_amp *= v.amp_decay;
        self.tone_env *= v.tone_decay;
        if self.env_amp < v.floor {
            self.active = false;
            return 0.0;
        }

        let n = frand(rng);
        self.hp = v.alpha * (self.hp + n - self.prev);
        self.prev = n;

        // metallic partials on top of the noise
        advance(&mut self.phase_a, v.partials.0, inv_sr);
        advance(&mut self.phase_b, v.partials.1, inv_sr);
        let tone = ((TAU * self.phase_a).sin() + (TAU * self.phase_b).sin())
            * 0.5
            * self.tone_env
            * self.brightness;

        (self.hp * v.noise_mix + tone * v.tone_mix) * self.env_amp * v.level * self.accent_gain
    }
}

/// Toms and rim: a decaying sine with a little noise on top.
#[derive(Clone, Debug, Default)]
struct Tone {
    phase: f32,
    env: f32,
    active: bool,
    accent_gain: f32,
    accent: bool,
}

#[derive(Clone, Copy, Debug)]
struct ToneVoicing {
    freq: f32,
    decay: f32,
    floor: f32,
    accent_gain: f32,
}

const MID_TOM: ToneVoicing = ToneVoicing { freq: 180.0, decay: 0.99925, floor: 0.0003, accent_gain: 1.45 };
const HIGH_TOM: ToneVoicing = ToneVoicing { freq: 240.0, decay: 0.99915, floor: 0.0003, accent_gain: 1.45 };
const RIM: ToneVoicing = ToneVoicing { freq: 900.0, decay: 0.9985, floor: 0.0004, accent_gain: 1.4 };

impl Tone {
    fn trigger(&mut self, v: &ToneVoicing, accent: bool) {
        self.active = true;
        self.env = 1.0;
        self.phase = 0.0;
        self.accent_gain = if accent { v.accent_gain } else { 1.0 };
        self.accent = accent;
    }

    // returns the raw sine, or None once the envelope has died
    fn step(&mut self, v: &ToneVoicing, inv_sr: f32) -> Option<f32> {
        if !self.active {
            return None;
        }
        self.env *= v.decay;
        if self.env < v.floor {
            self.active = false;
            return None;
        }
        advance(&mut self.phase, v.freq, inv_sr);
        Some((TAU * self.phase).sin())
    }
}

#[derive(Clone, Debug, Default)]
struct Clap {
    env: f32,
    trans: f32,
    noise: f32,
    active: bool,
    elapsed: f32, // seconds since trigger
    accent_gain: f32,
    accent: bool,
}

impl Clap {
    fn trigger(&mut self, accent: bool, rng: &mut fastrand::Rng) {
        self.active = true;
        self.env = 1.0;
        self.trans = 1.0;
        self.noise = frand(rng);
        self.elapsed = 0.0;
        self.accent_gain = if accent { 1.45 } else { 1.0 };
        self.accent = accent;
    }

    fn process(&mut self, rng: &mut fastrand::Rng, inv_sr: f32) -> f32 {
        if !self.active {
            return 0.0;
        }
        self.env *= 0.99992;
        self.trans *= 0.9985;
        self.elapsed += inv_sr;
        if self.env < 0.0002 {
            self.active = false;
            return 0.0;
        }
        // three hand claps 24 ms apart
        let burst = if self.elapsed < 0.024 {
            1.0
        } else if self.elapsed < 0.048 {
            0.8
        } else if self.elapsed < 0.072 {
            0.6
        } else {
            0.0
        };
        let noise = frand(rng) * 0.7 + self.noise * 0.3;
        let tone = (TAU * 1100.0 * self.elapsed).sin();
        (noise * 0.7 + tone * 0.3) * self.trans * burst * self.env * self.accent_gain
    }
}

/// The whole eight-piece kit. Every voice is independent except that a closed
/// hat chokes a ringing open hat, like on the real machines.
#[derive(Clone, Debug)]
pub struct DrumSynthVoice {
    kick: Kick,
    snare: Snare,
    hat: Hat,
    open_hat: Hat,
    mid_tom: Tone,
    high_tom: Tone,
    rim: Tone,
    clap: Clap,

    sample_rate: f32,
    inv_sample_rate: f32,
    rng: fastrand::Rng,
    accent_distortion: TubeDistortion,
    params: [Parameter; DrumParamId::COUNT],
}

impl DrumSynthVoice {
    pub fn new(sample_rate: f32) -> Self {
        Self::with_seed(sample_rate, 0x5eed_ac1d)
    }

    /// Fixed noise seed, for renders that have to be reproducible.
    pub fn with_seed(sample_rate: f32, seed: u64) -> Self {
        let mut accent_distortion = TubeDistortion::new();
        accent_distortion.set_enabled(true);
        accent_distortion.set_drive(3.0);
        let mut kit = Self {
            kick: Kick::default(),
            snare: Snare::default(),
            hat: Hat::default(),
            open_hat: Hat::default(),
            mid_tom: Tone::default(),
            high_tom: Tone::default(),
            rim: Tone::default(),
            clap: Clap::default(),
            sample_rate: 0.0,
            inv_sample_rate: 0.0,
            rng: fastrand::Rng::with_seed(seed),
            accent_distortion,
            params: [Parameter::new("vol", "", 0.0, 1.0, 0.8, 1.0 / 128.0)],
        };
        kit.set_sample_rate(sample_rate);
        kit
    }

    pub fn reset(&mut self) {
        self.kick = Kick::default();
        self.snare = Snare::default();
        self.hat = Hat::default();
        self.open_hat = Hat::default();
        self.mid_tom = Tone::default();
        self.high_tom = Tone::default();
        self.rim = Tone::default();
        self.clap = Clap::default();
    }

    pub fn set_sample_rate(&mut self, sr: f32) {
        let sr = if sr > 0.0 && sr.is_finite() { sr } else { 44100.0 };
        self.sample_rate = sr;
        self.inv_sample_rate = 1.0 / sr;
    }

    pub fn trigger(&mut self, voice: DrumVoice, accent: bool) {
        match voice {
            DrumVoice::Kick => self.kick.trigger(accent),
            DrumVoice::Snare => self.snare.trigger(accent),
            DrumVoice::ClosedHat => {
                self.hat.trigger_closed(accent);
                // closing the hat chokes any ringing open-hat tail
                self.open_hat.choke();
            }
            DrumVoice::OpenHat => self.open_hat.trigger_open(accent),
            DrumVoice::MidTom => self.mid_tom.trigger(&MID_TOM, accent),
            DrumVoice::HighTom => self.high_tom.trigger(&HIGH_TOM, accent),
            DrumVoice::Rim => self.rim.trigger(&RIM, accent),
            DrumVoice::Clap => self.clap.trigger(accent, &mut self.rng),
        }
    }

    pub fn is_active(&self, voice: DrumVoice) -> bool {
        match voice {
            DrumVoice::Kick => self.kick.active,
            DrumVoice::Snare => self.snare.active,
            DrumVoice::ClosedHat => self.hat.active,
            DrumVoice::OpenHat => self.open_hat.active,
            DrumVoice::MidTom => self.mid_tom.active,
            DrumVoice::HighTom => self.high_tom.active,
            DrumVoice::Rim => self.rim.active,
            DrumVoice::Clap => self.clap.active,
        }
    }

    /// Next sample of one voice, 0.0 once it has decayed out.
    pub fn process(&mut self, voice: DrumVoice) -> f32 {
        let inv_sr = self.inv_sample_rate;
        let rng = &mut self.rng;
        let (out, accent) = match voice {
            DrumVoice::Kick => (self.kick.process(inv_sr), self.kick.accent),
            DrumVoice::Snare => (self.snare.process(rng, inv_sr), self.snare.accent),
            DrumVoice::ClosedHat => (self.hat.process(&CLOSED_HAT, rng, inv_sr), self.hat.accent),
            DrumVoice::OpenHat => (self.open_hat.process(&OPEN_HAT, rng, inv_sr), self.open_hat.accent),
            DrumVoice::MidTom => {
                let t = &mut self.mid_tom;
                let out = t.step(&MID_TOM, inv_sr).map_or(0.0, |tone| {
                    (tone * 0.9 + frand(rng) * 0.05) * t.env * 0.8 * t.accent_gain
                });
                (out, t.accent)
            }
            DrumVoice::HighTom => {
                let t = &mut self.high_tom;
                let out = t.step(&HIGH_TOM, inv_sr).map_or(0.0, |tone| {
                    (tone * 0.88 + frand(rng) * 0.04) * t.env * 0.75 * t.accent_gain
                });
                (out, t.accent)
            }
            DrumVoice::Rim => {
                let t = &mut self.rim;
                let out = t.step(&RIM, inv_sr).map_or(0.0, |tone| {
                    let click = (frand(rng) * 0.6 + 0.4) * t.env;
                    (tone * 0.5 + click) * t.env * 0.8 * t.accent_gain
                });
                (out, t.accent)
            }
            DrumVoice::Clap => (self.clap.process(rng, inv_sr), self.clap.accent),
        };
        if out == 0.0 {
            return 0.0;
        }
        let out = if accent { self.accent_distortion.process(out) } else { out };
        out * self.params[DrumParamId::MainVolume.index()].value()
    }

    pub fn parameter(&self, id: DrumParamId) -> &Parameter {
        &self.params[id.index()]
    }

    pub fn set_parameter(&mut self, id: DrumParamId, value: f32) {
        self.params[id.index()].set_value(value);
    }

    pub fn adjust_parameter(&mut self, id: DrumParamId, steps: i32) {
        self.params[id.index()].add_steps(steps);
    }
}
