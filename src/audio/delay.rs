use crate::shared::MIN_BPM;

// for 2 voices at 22050 Hz this is as much as the handheld can spare
const MAX_DELAY_SECONDS: f32 = 1.0;

/// Circular-buffer echo locked to the sequencer tempo.
///
/// The buffer is sized once per sample rate; `process` only indexes into it.
/// Callers have to tick it every sample, feeding 0.0 while the source voice
/// is muted, otherwise the tail freezes instead of dying away.
#[derive(Clone, Debug)]
pub struct TempoDelay {
    buffer: Vec<f32>,
    write_index: usize,
    delay_samples: usize,
    sample_rate: f32,
    bpm: f32,
    beats: f32,    // delay length in beats
    mix: f32,      // wet 0..1
    feedback: f32, // 0..0.95
    enabled: bool,
}

impl TempoDelay {
    pub fn new(sample_rate: f32) -> Self {
        let mut delay = Self {
            buffer: Vec::new(),
            write_index: 0,
            delay_samples: 1,
            sample_rate: 0.0,
            bpm: 120.0,
            beats: 0.25,
            mix: 0.35,
            feedback: 0.45,
            enabled: false,
        };
        delay.set_sample_rate(sample_rate);
        delay
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_index = 0;
        self.delay_samples = self.clamp_delay(self.delay_samples);
    }

    pub fn set_sample_rate(&mut self, sr: f32) {
        let sr = if sr > 0.0 && sr.is_finite() { sr } else { 44100.0 };
        self.sample_rate = sr;
        // the one allocation this type ever makes, never on the render path
        let len = ((sr * MAX_DELAY_SECONDS) as usize).max(2);
        self.buffer = vec![0.0; len];
        self.write_index = 0;
        self.recompute();
    }

    pub fn set_bpm(&mut self, bpm: f32) {
        self.bpm = if bpm.is_finite() { bpm.max(MIN_BPM) } else { MIN_BPM };
        self.recompute();
    }

    pub fn set_beats(&mut self, beats: f32) {
        self.beats = if beats.is_finite() { beats.max(0.125) } else { 0.125 };
        self.recompute();
    }

    pub fn set_mix(&mut self, mix: f32) {
        if !mix.is_nan() {
            self.mix = mix.clamp(0.0, 1.0);
        }
    }

    pub fn set_feedback(&mut self, fb: f32) {
        if !fb.is_nan() {
            self.feedback = fb.clamp(0.0, 0.95);
        }
    }

    pub fn set_enabled(&mut self, on: bool) {
        if on && !self.enabled {
            // don't replay whatever was sitting in the line last time
            self.buffer.fill(0.0);
            self.write_index = 0;
        }
        self.enabled = on;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn delay_samples(&self) -> usize {
        self.delay_samples
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn beats(&self) -> f32 {
        self.beats
    }

    pub fn mix(&self) -> f32 {
        self.mix
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let len = self.buffer.len();
        if !self.enabled || len == 0 {
            return input;
        }
        let read_index = (self.write_index + len - self.delay_samples) % len;
        let delayed = self.buffer[read_index];
        self.buffer[self.write_index] = input + delayed * self.feedback;
        self.write_index += 1;
        if self.write_index >= len {
            self.write_index = 0;
        }
        input + delayed * self.mix
    }

    fn recompute(&mut self) {
        let seconds_per_beat = 60.0 / self.bpm;
        let samples = (seconds_per_beat * self.beats * self.sample_rate) as usize;
        self.delay_samples = self.clamp_delay(samples);
    }

    fn clamp_delay(&self, samples: usize) -> usize {
        let max = self.buffer.len().saturating_sub(1).max(1);
        samples.clamp(1, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled_delay(sr: f32) -> TempoDelay {
        let mut d = TempoDelay::new(sr);
        d.set_enabled(true);
        d
    }

    #[test]
    fn delay_length_follows_tempo() {
        let mut d = TempoDelay::new(22050.0);
        d.set_beats(0.5);
        d.set_bpm(120.0);
        assert_eq!(d.delay_samples(), 5512); // 0.25 s
        d.set_bpm(60.0);
        assert_eq!(d.delay_samples(), 11025);
    }

    #[test]
    fn delay_length_is_clamped_to_buffer() {
        let mut d = TempoDelay::new(22050.0);
        d.set_beats(8.0);
        d.set_bpm(40.0);
        assert_eq!(d.delay_samples(), d.buffer_len() - 1);
        d.set_bpm(f32::NAN);
        assert!(d.delay_samples() >= 1 && d.delay_samples() < d.buffer_len());
    }

    #[test]
    fn echo_arrives_exactly_delay_samples_later_through_muted_ticks() {
        let mut d = enabled_delay(1000.0);
        d.set_feedback(0.0);
        d.set_mix(0.5);
        d.set_beats(0.25);
        d.set_bpm(150.0); // 100 samples
        let n = d.delay_samples();
        assert_eq!(n, 100);

        assert_eq!(d.process(1.0), 1.0);
        // muted voice: the engine keeps feeding zeros
        for i in 1..n {
            assert_eq!(d.process(0.0), 0.0, "early echo at {i}");
        }
        assert_eq!(d.process(0.0), 0.5);
        assert_eq!(d.process(0.25), 0.25);
    }

    #[test]
    fn feedback_repeats_decay() {
        let mut d = enabled_delay(1000.0);
        d.set_feedback(0.5);
        d.set_mix(1.0);
        d.set_beats(0.125);
        d.set_bpm(600.0); // 12 samples
        let n = d.delay_samples();
        d.process(1.0);
        let mut echoes = Vec::new();
        for i in 1..=(3 * n) {
            let y = d.process(0.0);
            if i % n == 0 {
                echoes.push(y);
            }
        }
        assert_eq!(echoes, vec![1.0, 0.5, 0.25]);
    }

    #[test]
    fn disabled_is_passthrough_and_reenable_clears() {
        let mut d = enabled_delay(1000.0);
        d.set_beats(0.125);
        d.set_bpm(600.0);
        d.process(1.0);
        d.set_enabled(false);
        assert_eq!(d.process(0.3), 0.3);
        d.set_enabled(true);
        for _ in 0..50 {
            assert_eq!(d.process(0.0), 0.0);
        }
    }
}
