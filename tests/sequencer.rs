use miniacid::audio::{MiniAcid, TB303ParamId};
use miniacid::shared::{DrumVoice, SAMPLE_RATE, SEQ_STEPS, SongTrack, note_to_freq};

fn engine() -> MiniAcid {
    MiniAcid::in_memory(SAMPLE_RATE as f32)
}

fn render(e: &mut MiniAcid, n: usize) -> Vec<i16> {
    let mut out = vec![0i16; n];
    e.generate_audio_buffer(&mut out);
    out
}

fn mute_everything(e: &mut MiniAcid) {
    e.set_synth_mute(0, true);
    e.set_synth_mute(1, true);
    for voice in DrumVoice::ALL {
        e.set_drum_mute(voice, true);
    }
}

#[test]
fn samples_per_step_at_120_bpm() {
    let mut e = engine();
    e.set_bpm(120.0);
    assert_eq!(e.samples_per_step(), 2756.25);
}

#[test]
fn step_advances_after_samples_per_step() {
    let mut e = engine();
    e.set_bpm(120.0);
    e.start();
    // step 1 starts on the first sample at or past 2756.25
    render(&mut e, 2757);
    assert_eq!(e.current_step(), Some(0));
    render(&mut e, 1);
    assert_eq!(e.current_step(), Some(1));
}

#[test]
fn step_wraps_after_a_full_pattern() {
    let mut e = engine();
    e.set_bpm(120.0);
    e.start();
    let loop_len = (2756.25 * SEQ_STEPS as f32) as usize; // 44100
    render(&mut e, loop_len);
    assert_eq!(e.current_step(), Some(SEQ_STEPS - 1));
    render(&mut e, 1);
    assert_eq!(e.current_step(), Some(0));
}

#[test]
fn kick_lands_on_step_boundaries() {
    let mut e = engine();
    e.set_bpm(80.0); // long enough steps for the kick to die between hits
    mute_everything(&mut e);
    e.set_drum_mute(DrumVoice::Kick, false);
    // kick on 0 and 8 only, unaccented
    for step in [4, 12] {
        e.toggle_drum_step(DrumVoice::Kick, step);
    }
    for step in [0, 8] {
        e.toggle_drum_accent_step(DrumVoice::Kick, step);
    }
    let sps = e.samples_per_step() as f64;

    e.start();
    let out = render(&mut e, (sps * 17.0) as usize);

    // an onset is the first loud sample after a long silent stretch
    let mut onsets = Vec::new();
    let mut quiet = usize::MAX;
    for (i, &s) in out.iter().enumerate() {
        if s == 0 {
            quiet = quiet.saturating_add(1);
        } else {
            if quiet > 200 {
                onsets.push(i);
            }
            quiet = 0;
        }
    }

    let expected = [0.0, 8.0 * sps, 16.0 * sps];
    assert_eq!(onsets.len(), expected.len(), "onsets at {onsets:?}");
    for (onset, want) in onsets.iter().zip(expected) {
        assert!((*onset as f64 - want).abs() <= 1.0, "kick at {onset}, step boundary at {want}");
    }
}

#[test]
fn song_mode_plays_the_row_pattern() {
    let mut e = engine();
    e.set_synth_pattern_index(0, 3);
    e.adjust_synth_step_note(0, 0, 12); // pattern 3 was empty, so 48 + 12
    e.set_synth_pattern_index(0, 0);

    e.set_song_pattern(0, SongTrack::SynthA, 3);
    e.set_song_mode(true);
    assert_eq!(e.display_synth_pattern_index(0), Some(3));
    // nothing assigned for lead B or drums on this row
    assert_eq!(e.display_synth_pattern_index(1), None);
    assert_eq!(e.display_drum_pattern_index(), None);

    e.start();
    render(&mut e, 1);
    let lead = e.synth_voice(0);
    assert!(lead.is_gate_on());
    assert!((lead.frequency() - note_to_freq(60)).abs() < 1e-3);
    assert!(!e.synth_voice(1).is_gate_on());
}

#[test]
fn song_playhead_advances_on_pattern_wrap() {
    let mut e = engine();
    e.set_bpm(200.0);
    for row in 0..3 {
        e.set_song_pattern(row, SongTrack::Drums, row);
    }
    e.set_song_mode(true);
    e.start();
    assert_eq!(e.current_song_position(), Some(0));

    let sps = e.samples_per_step() as f64;
    // through step 15 of the first pass
    render(&mut e, (sps * 16.0) as usize);
    assert_eq!(e.current_song_position(), Some(0));
    render(&mut e, 2);
    assert_eq!(e.current_song_position(), Some(1));

    // two more passes wrap back to the top
    render(&mut e, (sps * 32.0) as usize);
    assert_eq!(e.current_song_position(), Some(0));

    e.stop();
    assert_eq!(e.current_song_position(), None);
}

#[test]
fn muting_a_lead_silences_its_echoes_too() {
    let mut e = engine();
    mute_everything(&mut e);
    e.set_synth_mute(0, false);
    e.toggle_synth_delay(0);

    e.start();
    let out = render(&mut e, 200); // the lead sounds into the delay line
    assert!(out.iter().any(|&s| s != 0));

    // the line keeps running underneath, but nothing of it reaches the mix
    e.set_synth_mute(0, true);
    let out = render(&mut e, 22050);
    assert!(out.iter().all(|&s| s == 0));
}

#[test]
fn every_index_is_clamped() {
    let mut e = engine();
    e.set_synth_pattern_index(99, 99);
    assert_eq!(e.current_synth_pattern_index(1), 7);
    e.set_drum_pattern_index(1000);
    assert_eq!(e.current_drum_pattern_index(), 7);
    e.toggle_synth_mute(42);
    assert!(e.is_synth_muted(1));
    e.toggle_synth_delay(42);
    assert!(e.is_synth_delay_enabled(1));
    e.toggle_synth_distortion(42);
    assert!(e.is_synth_distortion_enabled(1));
    e.set_synth_parameter(0, TB303ParamId::Cutoff, 1.0e9);
    assert_eq!(e.synth_parameter(0, TB303ParamId::Cutoff).value(), 2500.0);
    e.set_song_pattern(500, SongTrack::Drums, 500);
    assert_eq!(e.song_length(), 64);
    assert_eq!(e.song_pattern_at(63, SongTrack::Drums), Some(7));
    e.set_song_position(1000);
    assert_eq!(e.song_playhead_position(), 63);
}

#[test]
fn copy_last_audio_matches_render() {
    let mut e = engine();
    e.start();
    let out = render(&mut e, 100);
    let mut dst = [0i16; 256];
    assert_eq!(e.copy_last_audio(&mut dst), 100);
    assert_eq!(&dst[..100], &out[..]);
}
