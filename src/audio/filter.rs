use std::f32::consts::PI;

// Both filters clamp their integrator states every sample. Nothing upstream
// (cutoff sweeps, accent boosts, resonance at the top of its range) may make
// a voice blow up, so this is the last line of defence.
const STATE_LIMIT: f32 = 50.0;

fn fallback_rate(sr: f32) -> f32 {
    if sr > 0.0 && sr.is_finite() { sr } else { 44100.0 }
}

#[inline]
fn bound(x: f32) -> f32 {
    if x.is_finite() { x.clamp(-STATE_LIMIT, STATE_LIMIT) } else { 0.0 }
}

/// Two-integrator state variable lowpass with a saturated bandpass state.
#[derive(Clone, Debug)]
pub struct ChamberlinFilter {
    lp: f32,
    bp: f32,
    sample_rate: f32,
}

impl ChamberlinFilter {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            lp: 0.0,
            bp: 0.0,
            sample_rate: fallback_rate(sample_rate),
        }
    }

    pub fn reset(&mut self) {
        self.lp = 0.0;
        self.bp = 0.0;
    }

    pub fn set_sample_rate(&mut self, sr: f32) {
        self.sample_rate = fallback_rate(sr);
    }

    pub fn process(&mut self, input: f32, cutoff_hz: f32, resonance: f32) -> f32 {
        let mut f = 2.0 * (PI * cutoff_hz / self.sample_rate).sin();
        if !f.is_finite() || cutoff_hz >= self.sample_rate * 0.5 {
            f = 0.0;
        }
        let q = (1.0 / (1.0 + resonance * 4.0)).max(0.06);
        let q = if q.is_finite() { q } else { 0.06 };

        let hp = input - self.lp - q * self.bp;
        self.bp += f * hp;
        self.lp += f * self.bp;

        // analog-ish overdrive on the resonant path
        self.bp = (self.bp * 1.3).tanh();

        self.lp = bound(self.lp);
        self.bp = bound(self.bp);
        self.lp
    }

    pub fn state(&self) -> (f32, f32) {
        (self.lp, self.bp)
    }
}

/// Four cascaded one-pole lowpasses with resonance fed back from the last
/// stage and a tanh on the input.
#[derive(Clone, Debug)]
pub struct LadderFilter {
    stages: [f32; 4],
    sample_rate: f32,
}

impl LadderFilter {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            stages: [0.0; 4],
            sample_rate: fallback_rate(sample_rate),
        }
    }

    pub fn reset(&mut self) {
        self.stages = [0.0; 4];
    }

    pub fn set_sample_rate(&mut self, sr: f32) {
        self.sample_rate = fallback_rate(sr);
    }

    pub fn process(&mut self, input: f32, cutoff_hz: f32, resonance: f32) -> f32 {
        let cutoff = cutoff_hz.clamp(0.0, self.sample_rate * 0.45);
        let mut g = 1.0 - (-2.0 * PI * cutoff / self.sample_rate).exp();
        if !g.is_finite() {
            g = 0.0;
        }
        // resonance knob is 0.05..0.85, self-oscillation sits around k = 4
        let k = (resonance * 4.5).clamp(0.0, 4.0);
        let x = (input - k * self.stages[3]).tanh();

        self.stages[0] += g * (x - self.stages[0]);
        self.stages[1] += g * (self.stages[0] - self.stages[1]);
        self.stages[2] += g * (self.stages[1] - self.stages[2]);
        self.stages[3] += g * (self.stages[2] - self.stages[3]);

        for s in self.stages.iter_mut() {
            *s = bound(*s);
        }
        self.stages[3]
    }
}

/// Closed set of filters a lead voice can run. Picked by the FilterType
/// parameter; dispatch is a plain match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    Chamberlin,
    Ladder,
}

impl FilterKind {
    pub const LABELS: &'static [&'static str] = &["svf", "ladder"];

    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => FilterKind::Chamberlin,
            _ => FilterKind::Ladder,
        }
    }
}

#[derive(Clone, Debug)]
pub struct VoiceFilter {
    kind: FilterKind,
    svf: ChamberlinFilter,
    ladder: LadderFilter,
}

impl VoiceFilter {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            kind: FilterKind::Chamberlin,
            svf: ChamberlinFilter::new(sample_rate),
            ladder: LadderFilter::new(sample_rate),
        }
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: FilterKind) {
        if kind != self.kind {
            // the incoming filter starts from rest so it can't click in with stale state
            match kind {
                FilterKind::Chamberlin => self.svf.reset(),
                FilterKind::Ladder => self.ladder.reset(),
            }
            self.kind = kind;
        }
    }

    pub fn reset(&mut self) {
        self.svf.reset();
        self.ladder.reset();
    }

    pub fn set_sample_rate(&mut self, sr: f32) {
        self.svf.set_sample_rate(sr);
        self.ladder.set_sample_rate(sr);
    }

    #[inline]
    pub fn process(&mut self, input: f32, cutoff_hz: f32, resonance: f32) -> f32 {
        match self.kind {
            FilterKind::Chamberlin => self.svf.process(input, cutoff_hz, resonance),
            FilterKind::Ladder => self.ladder.process(input, cutoff_hz, resonance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 22050.0;

    #[test]
    fn chamberlin_state_stays_bounded_under_sweeps() {
        let mut rng = fastrand::Rng::with_seed(7);
        let cutoffs = [1.0, 50.0, 800.0, 5000.0, SR * 0.5 - 1.0];
        let resonances = [0.05, 0.45, 0.85];
        for &cutoff in &cutoffs {
            for &res in &resonances {
                let mut filter = ChamberlinFilter::new(SR);
                for _ in 0..20_000 {
                    let input = rng.f32() * 20.0 - 10.0;
                    filter.process(input, cutoff, res);
                    let (lp, bp) = filter.state();
                    assert!(lp.abs() <= STATE_LIMIT && bp.abs() <= STATE_LIMIT);
                }
            }
        }
    }

    #[test]
    fn chamberlin_freezes_at_or_above_nyquist() {
        let mut filter = ChamberlinFilter::new(SR);
        for _ in 0..100 {
            assert_eq!(filter.process(1.0, SR, 0.5), 0.0);
        }
    }

    #[test]
    fn chamberlin_recovers_from_nan_input() {
        let mut filter = ChamberlinFilter::new(SR);
        filter.process(f32::NAN, 1000.0, 0.5);
        let (lp, bp) = filter.state();
        assert!(lp.is_finite() && bp.is_finite());
    }

    #[test]
    fn chamberlin_silence_in_silence_out() {
        let mut filter = ChamberlinFilter::new(SR);
        for _ in 0..1000 {
            assert_eq!(filter.process(0.0, 1000.0, 0.85), 0.0);
        }
    }

    #[test]
    fn ladder_state_stays_bounded() {
        let mut rng = fastrand::Rng::with_seed(11);
        let mut filter = LadderFilter::new(SR);
        for i in 0..20_000 {
            let cutoff = (i % 400) as f32 * 25.0;
            filter.process(rng.f32() * 100.0 - 50.0, cutoff, 0.85);
            assert!(filter.stages.iter().all(|s| s.abs() <= STATE_LIMIT));
        }
    }

    #[test]
    fn switching_kind_resets_incoming_filter() {
        let mut filter = VoiceFilter::new(SR);
        filter.set_kind(FilterKind::Ladder);
        for _ in 0..100 {
            filter.process(1.0, 500.0, 0.5);
        }
        filter.set_kind(FilterKind::Chamberlin);
        filter.set_kind(FilterKind::Ladder);
        assert_eq!(filter.ladder.stages, [0.0; 4]);
    }
}
