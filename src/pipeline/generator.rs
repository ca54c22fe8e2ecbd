// Random fills for the randomize buttons. Nothing clever: a Dorian acid line
// and a drum groove built from per-voice hit probabilities.

use super::project::{DrumPatternSet, DrumStep, SynthPattern, SynthStep};
use crate::shared::{DrumVoice, SEQ_STEPS};

const LEAD_ROOT: u8 = 26;
const DORIAN: [u8; 7] = [0, 2, 3, 5, 7, 9, 10];

pub struct PatternGenerator {
    rng: fastrand::Rng,
}

impl PatternGenerator {
    pub fn new() -> Self {
        Self { rng: fastrand::Rng::new() }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { rng: fastrand::Rng::with_seed(seed) }
    }

    // true pct% of the time
    fn chance(&mut self, pct: u8) -> bool {
        self.rng.u8(1..=100) <= pct
    }

    pub fn lead_pattern(&mut self) -> SynthPattern {
        let mut pattern = SynthPattern::default();
        for step in pattern.steps.iter_mut() {
            let note = if self.chance(70) {
                let interval = DORIAN[self.rng.usize(..DORIAN.len())];
                Some(LEAD_ROOT + interval + 12 * self.rng.u8(0..3))
            } else {
                None
            };
            *step = SynthStep {
                note,
                accent: self.chance(30),
                slide: self.chance(20),
            };
        }
        pattern
    }

    pub fn drum_pattern_set(&mut self) -> DrumPatternSet {
        let mut set = DrumPatternSet::default();
        for i in 0..SEQ_STEPS {
            let kick = i % 4 == 0 || self.chance(20);
            let snare = (i % 4 == 2 || self.chance(15)) && self.chance(80);
            let mut hat = self.chance(90) && self.chance(80);
            let open = (i % 4 == 3 && self.chance(65)) || (self.chance(20) && hat);
            if open {
                hat = false; // let the open hat ring
            }
            let mid_tom = (i % 8 == 4 && self.chance(75)) || self.chance(8);
            let high_tom = (i % 8 == 6 && self.chance(70)) || self.chance(6);
            let rim = i % 4 == 1 && self.chance(25);
            let clap = if i % 4 == 2 { self.chance(80) } else { self.chance(5) };

            let hits = [kick, snare, hat, open, mid_tom, high_tom, rim, clap];
            for (voice, hit) in DrumVoice::ALL.into_iter().zip(hits) {
                set.voice_mut(voice).steps[i] = DrumStep { hit, accent: hit };
            }
        }
        set
    }
}

impl Default for PatternGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lead_notes_stay_in_the_scale() {
        let mut g = PatternGenerator::with_seed(7);
        for _ in 0..50 {
            for step in g.lead_pattern().steps {
                if let Some(note) = step.note {
                    assert!((LEAD_ROOT..LEAD_ROOT + 36).contains(&note));
                    assert!(DORIAN.contains(&((note - LEAD_ROOT) % 12)));
                }
            }
        }
    }

    #[test]
    fn kick_always_on_the_beat() {
        let mut g = PatternGenerator::with_seed(42);
        for _ in 0..50 {
            let set = g.drum_pattern_set();
            let kick = set.voice(DrumVoice::Kick);
            for i in (0..SEQ_STEPS).step_by(4) {
                assert!(kick.steps[i].hit);
            }
            // open and closed hat never share a step
            for i in 0..SEQ_STEPS {
                assert!(!(set.voice(DrumVoice::OpenHat).steps[i].hit && set.voice(DrumVoice::ClosedHat).steps[i].hit));
                assert!(!set.voice(DrumVoice::Rim).steps[i].hit || i % 4 == 1);
            }
        }
    }

    #[test]
    fn accent_mirrors_hit() {
        let mut g = PatternGenerator::with_seed(3);
        let set = g.drum_pattern_set();
        for pattern in set.voices {
            for step in pattern.steps {
                assert_eq!(step.hit, step.accent);
            }
        }
    }

    #[test]
    fn same_seed_same_fill() {
        let a = PatternGenerator::with_seed(99).lead_pattern();
        let b = PatternGenerator::with_seed(99).lead_pattern();
        assert_eq!(a, b);
    }
}
