// Pattern data: what a step holds, how steps group into patterns, patterns
// into banks, banks into a scene, and how a song strings pattern slots
// together. Plain data; the scene manager owns and edits it.

use serde::{Deserialize, Serialize};

use crate::shared::{
    DrumVoice, NUM_DRUM_VOICES, NUM_PATTERNS, SEQ_STEPS, SONG_MAX_POSITIONS, SongTrack,
    clamp_pattern_index, clamp_song_row,
};

pub const MIN_NOTE: u8 = 24;
pub const MAX_NOTE: u8 = 96;
pub const BASE_NOTE: u8 = 48; // where a rest starts when you nudge it

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthStep {
    pub note: Option<u8>, // None is a rest
    pub slide: bool,
    pub accent: bool,
}

impl SynthStep {
    pub fn note(note: u8) -> Self {
        Self { note: Some(note), ..Self::default() }
    }

    pub fn is_rest(&self) -> bool {
        self.note.is_none()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthPattern {
    pub steps: [SynthStep; SEQ_STEPS],
}

impl SynthPattern {
    pub fn step(&self, idx: usize) -> &SynthStep {
        &self.steps[idx % SEQ_STEPS]
    }

    pub fn step_mut(&mut self, idx: usize) -> &mut SynthStep {
        &mut self.steps[idx % SEQ_STEPS]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrumStep {
    pub hit: bool,
    pub accent: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrumPattern {
    pub steps: [DrumStep; SEQ_STEPS],
}

impl DrumPattern {
    pub fn step(&self, idx: usize) -> &DrumStep {
        &self.steps[idx % SEQ_STEPS]
    }

    pub fn step_mut(&mut self, idx: usize) -> &mut DrumStep {
        &mut self.steps[idx % SEQ_STEPS]
    }

    pub fn hits(&self) -> [bool; SEQ_STEPS] {
        std::array::from_fn(|i| self.steps[i].hit)
    }
}

/// One drum pattern per kit voice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrumPatternSet {
    pub voices: [DrumPattern; NUM_DRUM_VOICES],
}

impl DrumPatternSet {
    pub fn voice(&self, voice: DrumVoice) -> &DrumPattern {
        &self.voices[voice.index()]
    }

    pub fn voice_mut(&mut self, voice: DrumVoice) -> &mut DrumPattern {
        &mut self.voices[voice.index()]
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank<T> {
    pub patterns: [T; NUM_PATTERNS],
}

impl<T> Bank<T> {
    pub fn pattern(&self, idx: usize) -> &T {
        &self.patterns[clamp_pattern_index(idx)]
    }

    pub fn pattern_mut(&mut self, idx: usize) -> &mut T {
        &mut self.patterns[clamp_pattern_index(idx)]
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub drum_bank: Bank<DrumPatternSet>,
    pub synth_a_bank: Bank<SynthPattern>,
    pub synth_b_bank: Bank<SynthPattern>,
}

impl Scene {
    pub fn synth_bank(&self, voice: usize) -> &Bank<SynthPattern> {
        match SongTrack::for_synth(voice) {
            SongTrack::SynthA => &self.synth_a_bank,
            _ => &self.synth_b_bank,
        }
    }

    pub fn synth_bank_mut(&mut self, voice: usize) -> &mut Bank<SynthPattern> {
        match SongTrack::for_synth(voice) {
            SongTrack::SynthA => &mut self.synth_a_bank,
            _ => &mut self.synth_b_bank,
        }
    }
}

/// One row of the arrangement: which pattern slot each track plays, if any.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongPosition {
    pub patterns: [Option<u8>; SongTrack::COUNT],
}

impl SongPosition {
    pub fn pattern(&self, track: SongTrack) -> Option<usize> {
        self.patterns[track.index()].map(|p| clamp_pattern_index(p as usize))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.iter().all(Option::is_none)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    positions: Vec<SongPosition>, // never empty, never over SONG_MAX_POSITIONS
}

impl Default for Song {
    fn default() -> Self {
        Self { positions: vec![SongPosition::default()] }
    }
}

impl Song {
    pub fn len(&self) -> usize {
        self.positions.len().max(1)
    }

    pub fn is_empty(&self) -> bool {
        self.positions.iter().all(SongPosition::is_empty)
    }

    pub fn positions(&self) -> &[SongPosition] {
        &self.positions
    }

    pub fn pattern_at(&self, row: usize, track: SongTrack) -> Option<usize> {
        self.positions.get(row).and_then(|p| p.pattern(track))
    }

    /// Writing past the end grows the song up to the row (capped at 64 rows).
    pub fn set_pattern(&mut self, row: usize, track: SongTrack, pattern: usize) {
        let row = clamp_song_row(row);
        if self.positions.len() <= row {
            self.positions.resize(row + 1, SongPosition::default());
        }
        self.positions[row].patterns[track.index()] = Some(clamp_pattern_index(pattern) as u8);
    }

    pub fn clear_pattern(&mut self, row: usize, track: SongTrack) {
        if let Some(pos) = self.positions.get_mut(row) {
            pos.patterns[track.index()] = None;
        }
        // trailing empty rows don't count towards the song length
        while self.positions.len() > 1 && self.positions.last().is_some_and(SongPosition::is_empty) {
            self.positions.pop();
        }
    }

    /// Restore the invariants after deserializing something we didn't write.
    pub fn sanitize(&mut self) {
        self.positions.truncate(SONG_MAX_POSITIONS);
        if self.positions.is_empty() {
            self.positions.push(SongPosition::default());
        }
        for pos in self.positions.iter_mut() {
            for slot in pos.patterns.iter_mut() {
                *slot = slot.map(|p| clamp_pattern_index(p as usize) as u8);
            }
        }
    }
}

/// Lead voice settings stored with a scene. Oscillator and filter type live
/// here too, so they are per scene rather than per pattern.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthParameters {
    pub cutoff: f32,
    pub resonance: f32,
    pub env_amount: f32,
    pub env_decay: f32,
    pub oscillator: u8,
    pub filter_type: u8,
    pub volume: f32,
}

impl Default for SynthParameters {
    fn default() -> Self {
        Self {
            cutoff: 800.0,
            resonance: 0.6,
            env_amount: 400.0,
            env_decay: 420.0,
            oscillator: 0,
            filter_type: 0,
            volume: 0.8,
        }
    }
}

impl SynthParameters {
    /// Lead B starts a little darker so the two voices don't sound identical.
    pub fn default_for(voice: usize) -> Self {
        if voice == 0 {
            return Self::default();
        }
        Self {
            cutoff: 500.0,
            resonance: 0.45,
            env_amount: 200.0,
            ..Self::default()
        }
    }
}

// -- built-in scene, the groove the device boots with --

const DEFAULT_NOTES_A: [i8; SEQ_STEPS] = [48, 48, 55, 55, 50, 50, 55, 55, 48, 48, 55, 55, 50, 55, 50, -1];
const DEFAULT_ACCENT_A: [u8; SEQ_STEPS] = [0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 0];
const DEFAULT_SLIDE_A: [u8; SEQ_STEPS] = [0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 0];
const DEFAULT_ACCENT_B: [u8; SEQ_STEPS] = [1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0];
const DEFAULT_SLIDE_B: [u8; SEQ_STEPS] = [0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0];

const DEFAULT_DRUMS: [[u8; SEQ_STEPS]; NUM_DRUM_VOICES] = [
    [1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0], // kick
    [0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0], // snare
    [1, 1, 1, 0, 1, 1, 1, 1, 1, 1, 1, 0, 1, 1, 1, 1], // closed hat, open on 3 and 11
    [0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0], // open hat
    [0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0], // mid tom
    [0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0], // high tom
    [0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0], // rim
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0], // clap
];

fn synth_pattern_from(notes: &[i8; SEQ_STEPS], accent: &[u8; SEQ_STEPS], slide: &[u8; SEQ_STEPS]) -> SynthPattern {
    SynthPattern {
        steps: std::array::from_fn(|i| SynthStep {
            note: u8::try_from(notes[i]).ok(),
            accent: accent[i] != 0,
            slide: slide[i] != 0,
        }),
    }
}

impl Scene {
    pub fn builtin() -> Self {
        let mut scene = Scene::default();
        scene.synth_a_bank.patterns[0] = synth_pattern_from(&DEFAULT_NOTES_A, &DEFAULT_ACCENT_A, &DEFAULT_SLIDE_A);
        scene.synth_b_bank.patterns[0] = synth_pattern_from(&DEFAULT_NOTES_A, &DEFAULT_ACCENT_B, &DEFAULT_SLIDE_B);
        let drums = &mut scene.drum_bank.patterns[0];
        for (voice, row) in DEFAULT_DRUMS.iter().enumerate() {
            for (step, &hit) in row.iter().enumerate() {
                let hit = hit != 0;
                drums.voices[voice].steps[step] = DrumStep { hit, accent: hit };
            }
        }
        scene
    }
}
