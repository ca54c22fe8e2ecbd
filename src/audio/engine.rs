// The MiniAcid engine: sequencer transport, the two leads, the drum kit and
// their delays, mixed down to mono i16.
//
// Nothing below `generate_audio_buffer` allocates, logs or fails. Scene I/O
// only happens from control calls (stop, load, save), which the host makes
// through AudioGuard::with, never from the render callback.

use tracing::{debug, info, warn};

use super::delay::TempoDelay;
use super::drums::{DrumParamId, DrumSynthVoice};
use super::param::Parameter;
use super::tb303::{TB303ParamId, TB303Voice};
use crate::pipeline::generator::PatternGenerator;
use crate::pipeline::persistence::{MemorySceneStore, SceneError, SceneStore, validate_scene_name};
use crate::pipeline::project::{
    BASE_NOTE, DrumPatternSet, DrumStep, MAX_NOTE, MIN_NOTE, SynthParameters, SynthPattern, SynthStep,
};
use crate::pipeline::scene::SceneManager;
use crate::shared::{
    AUDIO_BUFFER_SAMPLES, DrumVoice, NUM_303_VOICES, SEQ_STEPS, SongTrack, clamp_synth_voice, note_to_freq,
};

pub const DEFAULT_SCENE_NAME: &str = "default";

const LEAD_GAIN: f32 = 0.5;
const MASTER_GAIN: f32 = 0.65;

pub struct MiniAcid {
    sample_rate: f32,
    voices: [TB303Voice; NUM_303_VOICES],
    drums: DrumSynthVoice,
    delays: [TempoDelay; NUM_303_VOICES],
    scenes: SceneManager,
    store: Box<dyn SceneStore>,
    scene_name: String,
    // off after a fallback from an unreadable scene file, so stop() can't clobber it
    autosave: bool,
    generator: PatternGenerator,

    playing: bool,
    current_step: Option<usize>, // None while stopped or before the first step
    samples_into_step: f32,
    samples_per_step: f32,

    last_buffer: [i16; AUDIO_BUFFER_SAMPLES],
    last_len: usize,
}

impl MiniAcid {
    pub fn new(sample_rate: f32, store: Box<dyn SceneStore>) -> Self {
        let sr = if sample_rate > 0.0 && sample_rate.is_finite() { sample_rate } else { 44100.0 };
        let mut delays = [TempoDelay::new(sr), TempoDelay::new(sr)];
        // eighth-note echoes, B a touch drier than A
        for (delay, (mix, feedback)) in delays.iter_mut().zip([(0.25, 0.35), (0.22, 0.32)]) {
            delay.set_beats(0.5);
            delay.set_mix(mix);
            delay.set_feedback(feedback);
        }
        let mut engine = Self {
            sample_rate: sr,
            voices: [TB303Voice::new(sr), TB303Voice::new(sr)],
            drums: DrumSynthVoice::new(sr),
            delays,
            scenes: SceneManager::new(),
            store,
            scene_name: DEFAULT_SCENE_NAME.to_string(),
            autosave: true,
            generator: PatternGenerator::new(),
            playing: false,
            current_step: None,
            samples_into_step: 0.0,
            samples_per_step: 0.0,
            last_buffer: [0; AUDIO_BUFFER_SAMPLES],
            last_len: 0,
        };
        engine.apply_scene_settings();
        engine
    }

    /// Engine with a throwaway in-memory store.
    pub fn in_memory(sample_rate: f32) -> Self {
        Self::new(sample_rate, Box::new(MemorySceneStore::new()))
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    // ── Transport ─────────────────────────────────────────────────

    pub fn start(&mut self) {
        self.playing = true;
        // current_step stays None until the next rendered sample fires step 0
        self.current_step = None;
        self.samples_into_step = 0.0;
        info!(bpm = self.bpm(), "transport started");
    }

    pub fn stop(&mut self) {
        self.playing = false;
        self.current_step = None;
        self.samples_into_step = 0.0;
        for voice in self.voices.iter_mut() {
            voice.release();
        }
        self.drums.reset();
        info!("transport stopped");
        if !self.autosave {
            debug!(scene = %self.scene_name, "autosave is off, not saving on stop");
        } else if let Err(e) = self.save_current_scene() {
            warn!(scene = %self.scene_name, "could not save scene on stop: {e}");
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn current_step(&self) -> Option<usize> {
        self.current_step
    }

    pub fn bpm(&self) -> f32 {
        self.scenes.bpm()
    }

    pub fn set_bpm(&mut self, bpm: f32) {
        self.scenes.set_bpm(bpm);
        self.update_tempo();
    }

    pub fn samples_per_step(&self) -> f32 {
        self.samples_per_step
    }

    fn update_tempo(&mut self) {
        let bpm = self.scenes.bpm();
        self.samples_per_step = self.sample_rate * 60.0 / (bpm * 4.0);
        for delay in self.delays.iter_mut() {
            delay.set_bpm(bpm);
        }
    }

    // ── Render ────────────────────────────────────────────────────

    /// Fill `out` with the next mono samples. Silence while stopped.
    pub fn generate_audio_buffer(&mut self, out: &mut [i16]) {
        if out.is_empty() {
            return;
        }
        for slot in out.iter_mut() {
            let mut sample = 0.0f32;
            if self.playing {
                if self.current_step.is_none() {
                    self.samples_into_step = 0.0;
                    self.advance_step();
                } else if self.samples_into_step >= self.samples_per_step {
                    // carry only the sub-sample remainder; a tempo change mid-step
                    // can leave several new steps' worth behind
                    self.samples_into_step = (self.samples_into_step - self.samples_per_step).fract();
                    self.advance_step();
                }
                self.samples_into_step += 1.0;
                sample = self.mix_sample();
            }
            let sample = (sample * MASTER_GAIN).clamp(-1.0, 1.0);
            *slot = (sample * 32767.0) as i16;
        }

        // keep the tail for the scope view
        let n = out.len().min(AUDIO_BUFFER_SAMPLES);
        self.last_buffer[..n].copy_from_slice(&out[out.len() - n..]);
        self.last_len = n;
    }

    /// Copies the most recently rendered samples (at most one block) into
    /// `dst`, returning how many were written.
    pub fn copy_last_audio(&self, dst: &mut [i16]) -> usize {
        let n = self.last_len.min(dst.len());
        dst[..n].copy_from_slice(&self.last_buffer[self.last_len - n..self.last_len]);
        n
    }

    fn mix_sample(&mut self) -> f32 {
        let mut lead = 0.0;
        for (i, (voice, delay)) in self.voices.iter_mut().zip(self.delays.iter_mut()).enumerate() {
            if self.scenes.synth_mute(i) {
                // tails still have to die away
                delay.process(0.0);
            } else {
                lead += delay.process(voice.process() * LEAD_GAIN);
            }
        }
        let mut drums = 0.0;
        for voice in DrumVoice::ALL {
            if !self.scenes.drum_mute(voice) {
                drums += self.drums.process(voice);
            }
        }
        lead + drums
    }

    fn advance_step(&mut self) {
        let step = match self.current_step {
            Some(s) => (s + 1) % SEQ_STEPS,
            None => 0,
        };
        if step == 0 && self.current_step.is_some() && self.scenes.song_mode() {
            self.scenes.advance_song_position();
        }
        self.current_step = Some(step);

        for v in 0..NUM_303_VOICES {
            let pattern = self.active_synth_pattern(v);
            let note = match pattern {
                Some(p) if !self.scenes.synth_mute(v) => {
                    let s = p.step(step);
                    s.note.map(|n| (n, s.accent, s.slide))
                }
                _ => None,
            };
            match note {
                Some((n, accent, slide)) => self.voices[v].start_note(note_to_freq(n), accent, slide),
                None => self.voices[v].release(),
            }
        }

        if let Some(set) = self.active_drum_pattern_set().copied() {
            for voice in DrumVoice::ALL {
                let s = set.voice(voice).step(step);
                if s.hit && !self.scenes.drum_mute(voice) {
                    self.drums.trigger(voice, s.accent);
                }
            }
        }
    }

    // what is sounding now: the song row in song mode, the edit slot otherwise
    fn active_synth_pattern(&self, voice: usize) -> Option<&SynthPattern> {
        self.display_synth_pattern_index(voice)
            .map(|idx| self.scenes.synth_pattern(voice, idx))
    }

    fn active_drum_pattern_set(&self) -> Option<&DrumPatternSet> {
        self.display_drum_pattern_index()
            .map(|idx| self.scenes.drum_pattern_set(idx))
    }

    // ── Mutes, delay, distortion ──────────────────────────────────

    pub fn is_synth_muted(&self, voice: usize) -> bool {
        self.scenes.synth_mute(voice)
    }

    pub fn set_synth_mute(&mut self, voice: usize, mute: bool) {
        self.scenes.set_synth_mute(voice, mute);
    }

    pub fn toggle_synth_mute(&mut self, voice: usize) {
        let muted = self.scenes.synth_mute(voice);
        self.scenes.set_synth_mute(voice, !muted);
    }

    pub fn is_drum_muted(&self, voice: DrumVoice) -> bool {
        self.scenes.drum_mute(voice)
    }

    pub fn set_drum_mute(&mut self, voice: DrumVoice, mute: bool) {
        self.scenes.set_drum_mute(voice, mute);
    }

    pub fn toggle_drum_mute(&mut self, voice: DrumVoice) {
        let muted = self.scenes.drum_mute(voice);
        self.scenes.set_drum_mute(voice, !muted);
    }

    pub fn is_synth_delay_enabled(&self, voice: usize) -> bool {
        self.delays[clamp_synth_voice(voice)].is_enabled()
    }

    pub fn toggle_synth_delay(&mut self, voice: usize) {
        let delay = &mut self.delays[clamp_synth_voice(voice)];
        delay.set_enabled(!delay.is_enabled());
    }

    pub fn is_synth_distortion_enabled(&self, voice: usize) -> bool {
        self.voices[clamp_synth_voice(voice)].is_distortion_enabled()
    }

    pub fn toggle_synth_distortion(&mut self, voice: usize) {
        let v = &mut self.voices[clamp_synth_voice(voice)];
        v.set_distortion_enabled(!v.is_distortion_enabled());
    }

    // ── Parameters ────────────────────────────────────────────────

    pub fn synth_voice(&self, voice: usize) -> &TB303Voice {
        &self.voices[clamp_synth_voice(voice)]
    }

    pub fn synth_parameter(&self, voice: usize, id: TB303ParamId) -> &Parameter {
        self.voices[clamp_synth_voice(voice)].parameter(id)
    }

    pub fn set_synth_parameter(&mut self, voice: usize, id: TB303ParamId, value: f32) {
        let voice = clamp_synth_voice(voice);
        self.voices[voice].set_parameter(id, value);
        self.store_synth_parameters(voice);
    }

    pub fn adjust_synth_parameter(&mut self, voice: usize, id: TB303ParamId, steps: i32) {
        let voice = clamp_synth_voice(voice);
        self.voices[voice].adjust_parameter(id, steps);
        self.store_synth_parameters(voice);
    }

    pub fn drum_parameter(&self, id: DrumParamId) -> &Parameter {
        self.drums.parameter(id)
    }

    pub fn set_drum_parameter(&mut self, id: DrumParamId, value: f32) {
        self.drums.set_parameter(id, value);
    }

    pub fn adjust_drum_parameter(&mut self, id: DrumParamId, steps: i32) {
        self.drums.adjust_parameter(id, steps);
    }

    // voice -> scene, so a save picks up the knob positions
    fn store_synth_parameters(&mut self, voice: usize) {
        let v = &self.voices[voice];
        let params = SynthParameters {
            cutoff: v.param_value(TB303ParamId::Cutoff),
            resonance: v.param_value(TB303ParamId::Resonance),
            env_amount: v.param_value(TB303ParamId::EnvAmount),
            env_decay: v.param_value(TB303ParamId::EnvDecay),
            oscillator: v.parameter(TB303ParamId::Oscillator).option_index() as u8,
            filter_type: v.parameter(TB303ParamId::FilterType).option_index() as u8,
            volume: v.param_value(TB303ParamId::MainVolume),
        };
        self.scenes.set_synth_parameters(voice, params);
    }

    // scene -> voices and tempo, after anything replaced the scene
    fn apply_scene_settings(&mut self) {
        for (i, voice) in self.voices.iter_mut().enumerate() {
            let p = *self.scenes.synth_parameters(i);
            voice.set_parameter(TB303ParamId::Cutoff, p.cutoff);
            voice.set_parameter(TB303ParamId::Resonance, p.resonance);
            voice.set_parameter(TB303ParamId::EnvAmount, p.env_amount);
            voice.set_parameter(TB303ParamId::EnvDecay, p.env_decay);
            voice.set_parameter(TB303ParamId::Oscillator, p.oscillator as f32);
            voice.set_parameter(TB303ParamId::FilterType, p.filter_type as f32);
            voice.set_parameter(TB303ParamId::MainVolume, p.volume);
        }
        // write back the clamped values
        for i in 0..NUM_303_VOICES {
            self.store_synth_parameters(i);
        }
        self.update_tempo();
    }

    // ── Patterns and step edits ───────────────────────────────────

    pub fn scene_manager(&self) -> &SceneManager {
        &self.scenes
    }

    pub fn current_synth_pattern_index(&self, voice: usize) -> usize {
        self.scenes.current_synth_pattern_index(voice)
    }

    pub fn set_synth_pattern_index(&mut self, voice: usize, idx: usize) {
        self.scenes.set_current_synth_pattern_index(voice, idx);
    }

    pub fn current_drum_pattern_index(&self) -> usize {
        self.scenes.current_drum_pattern_index()
    }

    pub fn set_drum_pattern_index(&mut self, idx: usize) {
        self.scenes.set_current_drum_pattern_index(idx);
    }

    /// The slot actually playing for a lead; `None` when song mode has
    /// nothing assigned for it on the current row.
    pub fn display_synth_pattern_index(&self, voice: usize) -> Option<usize> {
        if self.scenes.song_mode() {
            self.scenes.song().pattern_at(self.scenes.song_position(), SongTrack::for_synth(voice))
        } else {
            Some(self.scenes.current_synth_pattern_index(voice))
        }
    }

    pub fn display_drum_pattern_index(&self) -> Option<usize> {
        if self.scenes.song_mode() {
            self.scenes.song().pattern_at(self.scenes.song_position(), SongTrack::Drums)
        } else {
            Some(self.scenes.current_drum_pattern_index())
        }
    }

    /// The pattern in the edit slot of a lead.
    pub fn synth_pattern(&self, voice: usize) -> &SynthPattern {
        self.scenes.current_synth_pattern(voice)
    }

    pub fn drum_pattern_set(&self) -> &DrumPatternSet {
        self.scenes.current_drum_pattern_set()
    }

    pub fn synth_step(&self, voice: usize, step: usize) -> SynthStep {
        *self.scenes.current_synth_pattern(voice).step(step)
    }

    pub fn drum_step(&self, voice: DrumVoice, step: usize) -> DrumStep {
        *self.scenes.current_drum_pattern_set().voice(voice).step(step)
    }

    pub fn adjust_synth_step_note(&mut self, voice: usize, step: usize, delta: i32) {
        let s = self.scenes.edit_current_synth_pattern(voice).step_mut(step);
        let base = s.note.unwrap_or(BASE_NOTE) as i32;
        s.note = Some((base + delta).clamp(MIN_NOTE as i32, MAX_NOTE as i32) as u8);
    }

    pub fn adjust_synth_step_octave(&mut self, voice: usize, step: usize, delta: i32) {
        self.adjust_synth_step_note(voice, step, delta.saturating_mul(12));
    }

    pub fn clear_synth_step_note(&mut self, voice: usize, step: usize) {
        self.scenes.edit_current_synth_pattern(voice).step_mut(step).note = None;
    }

    pub fn toggle_synth_accent_step(&mut self, voice: usize, step: usize) {
        let s = self.scenes.edit_current_synth_pattern(voice).step_mut(step);
        s.accent = !s.accent;
    }

    pub fn toggle_synth_slide_step(&mut self, voice: usize, step: usize) {
        let s = self.scenes.edit_current_synth_pattern(voice).step_mut(step);
        s.slide = !s.slide;
    }

    /// Flips the hit; the accent follows it.
    pub fn toggle_drum_step(&mut self, voice: DrumVoice, step: usize) {
        let s = self.drum_step(voice, step);
        self.scenes.set_drum_step(voice, step, !s.hit, !s.hit);
    }

    /// Only meaningful on a hit step; rests stay unaccented.
    pub fn toggle_drum_accent_step(&mut self, voice: DrumVoice, step: usize) {
        let s = self.drum_step(voice, step);
        if s.hit {
            self.scenes.set_drum_step(voice, step, true, !s.accent);
        }
    }

    pub fn randomize_synth_pattern(&mut self, voice: usize) {
        let pattern = self.generator.lead_pattern();
        self.scenes.set_synth_pattern(voice, pattern);
    }

    pub fn randomize_drum_pattern(&mut self) {
        let set = self.generator.drum_pattern_set();
        self.scenes.set_drum_pattern_set(set);
    }

    // ── Song ──────────────────────────────────────────────────────

    pub fn song_mode_enabled(&self) -> bool {
        self.scenes.song_mode()
    }

    pub fn set_song_mode(&mut self, on: bool) {
        self.scenes.set_song_mode(on);
    }

    pub fn toggle_song_mode(&mut self) {
        let on = self.scenes.song_mode();
        self.scenes.set_song_mode(!on);
    }

    pub fn song_length(&self) -> usize {
        self.scenes.song().len()
    }

    pub fn song_pattern_at(&self, row: usize, track: SongTrack) -> Option<usize> {
        self.scenes.song().pattern_at(row, track)
    }

    pub fn set_song_pattern(&mut self, row: usize, track: SongTrack, idx: usize) {
        self.scenes.set_song_pattern(row, track, idx);
    }

    pub fn clear_song_pattern(&mut self, row: usize, track: SongTrack) {
        self.scenes.clear_song_pattern(row, track);
    }

    pub fn set_song_position(&mut self, row: usize) {
        self.scenes.set_song_position(row);
    }

    /// Where the song playhead sits, whether or not song mode is on.
    pub fn song_playhead_position(&self) -> usize {
        self.scenes.song_position()
    }

    /// The row being played, only while playing in song mode.
    pub fn current_song_position(&self) -> Option<usize> {
        (self.playing && self.scenes.song_mode()).then(|| self.scenes.song_position())
    }

    // ── Scenes ────────────────────────────────────────────────────

    pub fn current_scene_name(&self) -> &str {
        &self.scene_name
    }

    pub fn available_scene_names(&self) -> Result<Vec<String>, SceneError> {
        self.store.list_scenes()
    }

    /// Startup load. Anything that goes wrong leaves the built-in scene in
    /// place. A scene that simply doesn't exist yet takes the requested name;
    /// one that exists but can't be read keeps its file untouched, and
    /// `stop()` won't save until a load or save succeeds.
    pub fn load_or_default(&mut self, name: &str) {
        let err = match self.load_scene_by_name(name) {
            Ok(()) => return,
            Err(e) => e,
        };
        warn!(scene = name, "falling back to the default scene: {err}");
        self.scenes.load_default_scene();
        self.apply_scene_settings();
        match err {
            SceneError::NotFound(_) => {
                if let Ok(valid) = validate_scene_name(name) {
                    self.scene_name = valid.to_string();
                }
            }
            SceneError::InvalidName(_) => {}
            SceneError::Io(_) | SceneError::Parse(_) => {
                self.scene_name = DEFAULT_SCENE_NAME.to_string();
                self.autosave = false;
            }
        }
    }

    /// Whether `stop()` writes the current scene back to the store.
    pub fn autosave_enabled(&self) -> bool {
        self.autosave
    }

    /// Name and JSON of the current scene, for hosts that write it out
    /// themselves once the engine lock is released.
    pub fn scene_snapshot(&self) -> Result<(String, String), SceneError> {
        Ok((self.scene_name.clone(), self.scenes.dump_current_scene()?))
    }

    pub fn load_scene_by_name(&mut self, name: &str) -> Result<(), SceneError> {
        let name = validate_scene_name(name)?;
        let json = self.store.read_scene(name)?;
        self.scenes.load_scene(&json)?;
        self.apply_scene_settings();
        self.scene_name = name.to_string();
        self.autosave = true;
        info!(scene = name, "scene loaded");
        Ok(())
    }

    pub fn save_scene_as(&mut self, name: &str) -> Result<(), SceneError> {
        let name = validate_scene_name(name)?.to_string();
        let json = self.scenes.dump_current_scene()?;
        self.store.write_scene(&name, &json)?;
        debug!(scene = %name, bytes = json.len(), "scene saved");
        self.scene_name = name;
        self.autosave = true;
        Ok(())
    }

    pub fn save_current_scene(&mut self) -> Result<(), SceneError> {
        let name = self.scene_name.clone();
        self.save_scene_as(&name)
    }

    /// Starts a fresh scene from the built-in groove and saves it right away.
    pub fn create_new_scene_with_name(&mut self, name: &str) -> Result<(), SceneError> {
        let name = validate_scene_name(name)?.to_string();
        self.scenes.load_default_scene();
        self.apply_scene_settings();
        self.save_scene_as(&name)?;
        info!(scene = %name, "new scene created");
        Ok(())
    }
}
