// Constants and small index enums shared by the DSP, sequencer and scene layers.
//
// Everything that addresses a voice, pattern slot or song row goes through one
// of the clamping helpers here, so no caller can reach outside the fixed arrays.

use serde::{Deserialize, Serialize};

pub const SAMPLE_RATE: u32 = 22050; // Hz, what the handheld runs at
pub const AUDIO_BUFFER_SAMPLES: usize = 256; // per block, mono
pub const SEQ_STEPS: usize = 16;
pub const NUM_303_VOICES: usize = 2;
pub const NUM_DRUM_VOICES: usize = 8;
pub const NUM_PATTERNS: usize = 8; // slots per bank
pub const SONG_MAX_POSITIONS: usize = 64;

pub const MIN_BPM: f32 = 40.0;
pub const MAX_BPM: f32 = 200.0;
pub const DEFAULT_BPM: f32 = 110.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrumVoice {
    Kick,
    Snare,
    ClosedHat,
    OpenHat,
    MidTom,
    HighTom,
    Rim,
    Clap,
}

impl DrumVoice {
    pub const ALL: [DrumVoice; NUM_DRUM_VOICES] = [
        DrumVoice::Kick,
        DrumVoice::Snare,
        DrumVoice::ClosedHat,
        DrumVoice::OpenHat,
        DrumVoice::MidTom,
        DrumVoice::HighTom,
        DrumVoice::Rim,
        DrumVoice::Clap,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    // out of range indices land on the last voice instead of panicking
    pub fn from_index(idx: usize) -> Self {
        Self::ALL[idx.min(NUM_DRUM_VOICES - 1)]
    }

    pub fn label(self) -> &'static str {
        match self {
            DrumVoice::Kick => "BD",
            DrumVoice::Snare => "SD",
            DrumVoice::ClosedHat => "CH",
            DrumVoice::OpenHat => "OH",
            DrumVoice::MidTom => "MT",
            DrumVoice::HighTom => "HT",
            DrumVoice::Rim => "RS",
            DrumVoice::Clap => "CP",
        }
    }
}

/// The three columns of a song arrangement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SongTrack {
    SynthA,
    SynthB,
    Drums,
}

impl SongTrack {
    pub const COUNT: usize = 3;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn for_synth(voice: usize) -> Self {
        if clamp_synth_voice(voice) == 0 {
            SongTrack::SynthA
        } else {
            SongTrack::SynthB
        }
    }
}

pub fn clamp_synth_voice(voice: usize) -> usize {
    voice.min(NUM_303_VOICES - 1)
}

pub fn clamp_pattern_index(idx: usize) -> usize {
    idx.min(NUM_PATTERNS - 1)
}

pub fn clamp_song_row(row: usize) -> usize {
    row.min(SONG_MAX_POSITIONS - 1)
}

pub fn clamp_bpm(bpm: f32) -> f32 {
    if !bpm.is_finite() {
        return DEFAULT_BPM;
    }
    bpm.clamp(MIN_BPM, MAX_BPM)
}

/// Equal-tempered MIDI note to Hz, A4 = 440.
pub fn note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drum_voice_index_round_trips_and_clamps() {
        for voice in DrumVoice::ALL {
            assert_eq!(DrumVoice::from_index(voice.index()), voice);
        }
        assert_eq!(DrumVoice::from_index(99), DrumVoice::Clap);
    }

    #[test]
    fn bpm_is_clamped_and_nan_falls_back() {
        assert_eq!(clamp_bpm(10.0), MIN_BPM);
        assert_eq!(clamp_bpm(500.0), MAX_BPM);
        assert_eq!(clamp_bpm(f32::NAN), DEFAULT_BPM);
    }

    #[test]
    fn a4_is_440() {
        assert!((note_to_freq(69) - 440.0).abs() < 1e-3);
        assert!((note_to_freq(57) - 220.0).abs() < 1e-3);
    }
}
