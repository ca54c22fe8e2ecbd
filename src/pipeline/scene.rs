use serde::{Deserialize, Serialize};

use super::persistence::SceneError;
use super::project::{
    DrumPatternSet, MAX_NOTE, MIN_NOTE, Scene, Song, SynthParameters, SynthPattern, SynthStep,
};
use crate::shared::{
    DEFAULT_BPM, DrumVoice, NUM_303_VOICES, NUM_DRUM_VOICES, SongTrack, clamp_bpm,
    clamp_pattern_index, clamp_synth_voice,
};

/// What goes to disk: the banks plus everything needed to pick up where the
/// user left off. Missing fields fall back to the built-in scene's values.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
struct SceneDocument {
    scene: Scene,
    drum_pattern_index: usize,
    synth_pattern_index: [usize; NUM_303_VOICES],
    drum_mutes: [bool; NUM_DRUM_VOICES],
    synth_mutes: [bool; NUM_303_VOICES],
    synth_params: [SynthParameters; NUM_303_VOICES],
    bpm: f32,
    song: Song,
    song_mode: bool,
    song_position: usize,
}

impl Default for SceneDocument {
    fn default() -> Self {
        Self {
            scene: Scene::builtin(),
            drum_pattern_index: 0,
            synth_pattern_index: [0; NUM_303_VOICES],
            drum_mutes: [false; NUM_DRUM_VOICES],
            synth_mutes: [false; NUM_303_VOICES],
            synth_params: std::array::from_fn(SynthParameters::default_for),
            bpm: DEFAULT_BPM,
            song: Song::default(),
            song_mode: false,
            song_position: 0,
        }
    }
}

/// Owns the scene being edited and the selection state around it: which
/// pattern slot each track edits, mutes, tempo, lead settings and the song.
#[derive(Clone, Debug)]
pub struct SceneManager {
    doc: SceneDocument,
}

impl Default for SceneManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneManager {
    pub fn new() -> Self {
        Self { doc: SceneDocument::default() }
    }

    pub fn load_default_scene(&mut self) {
        self.doc = SceneDocument::default();
    }

    pub fn scene(&self) -> &Scene {
        &self.doc.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.doc.scene
    }

    // -- pattern slots --

    pub fn current_synth_pattern_index(&self, voice: usize) -> usize {
        self.doc.synth_pattern_index[clamp_synth_voice(voice)]
    }

    pub fn set_current_synth_pattern_index(&mut self, voice: usize, idx: usize) {
        self.doc.synth_pattern_index[clamp_synth_voice(voice)] = clamp_pattern_index(idx);
    }

    pub fn current_drum_pattern_index(&self) -> usize {
        self.doc.drum_pattern_index
    }

    pub fn set_current_drum_pattern_index(&mut self, idx: usize) {
        self.doc.drum_pattern_index = clamp_pattern_index(idx);
    }

    pub fn synth_pattern(&self, voice: usize, idx: usize) -> &SynthPattern {
        self.doc.scene.synth_bank(voice).pattern(idx)
    }

    pub fn drum_pattern_set(&self, idx: usize) -> &DrumPatternSet {
        self.doc.scene.drum_bank.pattern(idx)
    }

    pub fn current_synth_pattern(&self, voice: usize) -> &SynthPattern {
        self.synth_pattern(voice, self.current_synth_pattern_index(voice))
    }

    pub fn edit_current_synth_pattern(&mut self, voice: usize) -> &mut SynthPattern {
        let idx = self.current_synth_pattern_index(voice);
        self.doc.scene.synth_bank_mut(voice).pattern_mut(idx)
    }

    pub fn current_drum_pattern_set(&self) -> &DrumPatternSet {
        self.drum_pattern_set(self.doc.drum_pattern_index)
    }

    pub fn edit_current_drum_pattern_set(&mut self) -> &mut DrumPatternSet {
        let idx = self.doc.drum_pattern_index;
        self.doc.scene.drum_bank.pattern_mut(idx)
    }

    // -- step edits, always on the edit slot --

    pub fn set_synth_step(&mut self, voice: usize, step: usize, value: SynthStep) {
        *self.edit_current_synth_pattern(voice).step_mut(step) = value;
    }

    pub fn set_drum_step(&mut self, voice: DrumVoice, step: usize, hit: bool, accent: bool) {
        let s = self.edit_current_drum_pattern_set().voice_mut(voice).step_mut(step);
        s.hit = hit;
        s.accent = accent;
    }

    pub fn set_synth_pattern(&mut self, voice: usize, pattern: SynthPattern) {
        *self.edit_current_synth_pattern(voice) = pattern;
    }

    pub fn set_drum_pattern_set(&mut self, set: DrumPatternSet) {
        *self.edit_current_drum_pattern_set() = set;
    }

    // -- mutes --

    pub fn synth_mute(&self, voice: usize) -> bool {
        self.doc.synth_mutes[clamp_synth_voice(voice)]
    }

    pub fn set_synth_mute(&mut self, voice: usize, mute: bool) {
        self.doc.synth_mutes[clamp_synth_voice(voice)] = mute;
    }

    pub fn drum_mute(&self, voice: DrumVoice) -> bool {
        self.doc.drum_mutes[voice.index()]
    }

    pub fn set_drum_mute(&mut self, voice: DrumVoice, mute: bool) {
        self.doc.drum_mutes[voice.index()] = mute;
    }

    // -- lead settings and tempo --

    pub fn synth_parameters(&self, voice: usize) -> &SynthParameters {
        &self.doc.synth_params[clamp_synth_voice(voice)]
    }

    pub fn set_synth_parameters(&mut self, voice: usize, params: SynthParameters) {
        self.doc.synth_params[clamp_synth_voice(voice)] = params;
    }

    pub fn bpm(&self) -> f32 {
        self.doc.bpm
    }

    pub fn set_bpm(&mut self, bpm: f32) {
        self.doc.bpm = clamp_bpm(bpm);
    }

    // -- song --

    pub fn song(&self) -> &Song {
        &self.doc.song
    }

    pub fn set_song_pattern(&mut self, row: usize, track: SongTrack, idx: usize) {
        self.doc.song.set_pattern(row, track, idx);
    }

    pub fn clear_song_pattern(&mut self, row: usize, track: SongTrack) {
        self.doc.song.clear_pattern(row, track);
        self.clamp_song_position();
    }

    pub fn song_mode(&self) -> bool {
        self.doc.song_mode
    }

    pub fn set_song_mode(&mut self, on: bool) {
        self.doc.song_mode = on;
    }

    pub fn song_position(&self) -> usize {
        self.doc.song_position
    }

    pub fn set_song_position(&mut self, row: usize) {
        self.doc.song_position = row;
        self.clamp_song_position();
    }

    /// Moves the playhead one row on, wrapping at the end of the song.
    pub fn advance_song_position(&mut self) -> usize {
        self.doc.song_position = (self.doc.song_position + 1) % self.doc.song.len();
        self.doc.song_position
    }

    fn clamp_song_position(&mut self) {
        self.doc.song_position = self.doc.song_position.min(self.doc.song.len() - 1);
    }

    // -- json --

    pub fn dump_current_scene(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string_pretty(&self.doc)?)
    }

    /// On a parse error the current scene is left untouched.
    pub fn load_scene(&mut self, json: &str) -> Result<(), SceneError> {
        let mut doc: SceneDocument = serde_json::from_str(json)?;
        sanitize(&mut doc);
        self.doc = doc;
        Ok(())
    }
}

// values that parsed fine but are out of range get pulled back in
fn sanitize(doc: &mut SceneDocument) {
    doc.drum_pattern_index = clamp_pattern_index(doc.drum_pattern_index);
    for idx in doc.synth_pattern_index.iter_mut() {
        *idx = clamp_pattern_index(*idx);
    }
    doc.bpm = clamp_bpm(doc.bpm);
    doc.song.sanitize();
    doc.song_position = doc.song_position.min(doc.song.len() - 1);
    let banks = [&mut doc.scene.synth_a_bank, &mut doc.scene.synth_b_bank];
    for bank in banks {
        for pattern in bank.patterns.iter_mut() {
            for step in pattern.steps.iter_mut() {
                step.note = step.note.map(|n| n.clamp(MIN_NOTE, MAX_NOTE));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_the_builtin_scene() {
        let sm = SceneManager::new();
        assert_eq!(sm.scene(), &Scene::builtin());
        assert_eq!(sm.bpm(), DEFAULT_BPM);
        assert_eq!(sm.synth_parameters(1).cutoff, 500.0);
        assert!(!sm.song_mode());
    }

    #[test]
    fn indices_are_clamped() {
        let mut sm = SceneManager::new();
        sm.set_current_synth_pattern_index(7, 42);
        assert_eq!(sm.current_synth_pattern_index(1), 7);
        sm.set_current_drum_pattern_index(usize::MAX);
        assert_eq!(sm.current_drum_pattern_index(), 7);
        sm.set_synth_mute(9, true);
        assert!(sm.synth_mute(1));
        sm.set_bpm(1000.0);
        assert_eq!(sm.bpm(), 200.0);
    }

    #[test]
    fn step_edits_land_on_the_edit_slot() {
        let mut sm = SceneManager::new();
        sm.set_current_synth_pattern_index(0, 2);
        sm.set_synth_step(0, 18, SynthStep { note: Some(60), slide: true, accent: false });
        assert_eq!(sm.scene().synth_a_bank.patterns[2].steps[2].note, Some(60));
        assert!(sm.scene().synth_b_bank.patterns[2].steps[2].is_rest());

        sm.set_current_drum_pattern_index(5);
        sm.set_drum_step(DrumVoice::Clap, 3, true, false);
        let step = sm.scene().drum_bank.patterns[5].voice(DrumVoice::Clap).steps[3];
        assert!(step.hit && !step.accent);
    }

    #[test]
    fn song_position_stays_inside_the_song() {
        let mut sm = SceneManager::new();
        sm.set_song_position(10);
        assert_eq!(sm.song_position(), 0);
        sm.set_song_pattern(3, SongTrack::Drums, 1);
        sm.set_song_position(10);
        assert_eq!(sm.song_position(), 3);
        assert_eq!(sm.advance_song_position(), 0);
        sm.clear_song_pattern(3, SongTrack::Drums);
        assert_eq!(sm.song_position(), 0);
    }

    #[test]
    fn json_round_trip_restores_everything() {
        let mut sm = SceneManager::new();
        sm.set_current_synth_pattern_index(1, 4);
        sm.set_synth_step(1, 0, SynthStep { note: Some(36), slide: false, accent: true });
        sm.set_drum_mute(DrumVoice::Rim, true);
        sm.set_bpm(133.0);
        sm.set_song_pattern(1, SongTrack::SynthA, 3);
        sm.set_song_mode(true);
        sm.set_song_position(1);
        let mut params = *sm.synth_parameters(0);
        params.oscillator = 2;
        params.cutoff = 1200.0;
        sm.set_synth_parameters(0, params);

        let json = sm.dump_current_scene().unwrap();
        let mut other = SceneManager::new();
        other.load_scene(&json).unwrap();

        assert_eq!(other.scene(), sm.scene());
        assert_eq!(other.current_synth_pattern_index(1), 4);
        assert!(other.drum_mute(DrumVoice::Rim));
        assert_eq!(other.bpm(), 133.0);
        assert_eq!(other.song(), sm.song());
        assert!(other.song_mode());
        assert_eq!(other.song_position(), 1);
        assert_eq!(other.synth_parameters(0), &params);
    }

    #[test]
    fn malformed_json_leaves_scene_alone() {
        let mut sm = SceneManager::new();
        sm.set_bpm(90.0);
        assert!(matches!(sm.load_scene("{ not json"), Err(SceneError::Parse(_))));
        assert_eq!(sm.bpm(), 90.0);
    }

    #[test]
    fn partial_and_out_of_range_documents_are_repaired() {
        let mut sm = SceneManager::new();
        sm.load_scene(r#"{"bpm": 999, "drum_pattern_index": 31, "song_position": 12}"#).unwrap();
        assert_eq!(sm.bpm(), 200.0);
        assert_eq!(sm.current_drum_pattern_index(), 7);
        assert_eq!(sm.song_position(), 0);
        // absent banks come from the built-in scene
        assert_eq!(sm.scene(), &Scene::builtin());
    }
}
