use miniacid::audio::{MiniAcid, TB303ParamId};
use miniacid::pipeline::{DirSceneStore, SceneError, SceneStore};
use miniacid::shared::{DEFAULT_BPM, DrumVoice, SAMPLE_RATE, SongTrack};

fn engine_in(dir: &std::path::Path) -> MiniAcid {
    MiniAcid::new(SAMPLE_RATE as f32, Box::new(DirSceneStore::new(dir)))
}

#[test]
fn scene_round_trips_through_the_project_dir() {
    let dir = tempfile::tempdir().unwrap();

    let mut e = engine_in(dir.path());
    e.load_or_default("groove");
    e.set_bpm(126.0);
    e.set_drum_pattern_index(2);
    e.toggle_drum_step(DrumVoice::Snare, 5);
    e.set_synth_pattern_index(1, 6);
    e.adjust_synth_step_note(1, 9, -3);
    e.toggle_synth_mute(1);
    e.set_synth_parameter(0, TB303ParamId::FilterType, 1.0);
    e.set_song_pattern(0, SongTrack::SynthB, 6);
    e.set_song_pattern(1, SongTrack::Drums, 2);
    e.set_song_mode(true);
    e.save_current_scene().unwrap();
    assert!(dir.path().join(".miniacid/groove.json").is_file());

    let mut again = engine_in(dir.path());
    again.load_or_default("groove");
    assert_eq!(again.bpm(), 126.0);
    assert_eq!(again.current_drum_pattern_index(), 2);
    assert!(again.drum_step(DrumVoice::Snare, 5).hit);
    assert_eq!(again.current_synth_pattern_index(1), 6);
    assert_eq!(again.synth_step(1, 9).note, Some(45));
    assert!(again.is_synth_muted(1));
    assert_eq!(again.synth_parameter(0, TB303ParamId::FilterType).option_label(), Some("ladder"));
    assert_eq!(again.song_length(), 2);
    assert_eq!(again.song_pattern_at(1, SongTrack::Drums), Some(2));
    assert!(again.song_mode_enabled());
}

#[test]
fn malformed_scene_falls_back_to_default() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = DirSceneStore::new(dir.path());
    store.write_scene("broken", "{\"bpm\": 130, \"scene\": [").unwrap();

    let mut e = engine_in(dir.path());
    assert!(matches!(e.load_scene_by_name("broken"), Err(SceneError::Parse(_))));
    e.load_or_default("broken");
    assert_eq!(e.bpm(), DEFAULT_BPM);
    assert!(e.drum_step(DrumVoice::Kick, 0).hit);
    assert_eq!(e.current_scene_name(), "default");

    // a play/stop cycle must leave the unreadable file alone
    e.start();
    e.stop();
    assert_eq!(store.read_scene("broken").unwrap(), "{\"bpm\": 130, \"scene\": [");
    assert_eq!(e.available_scene_names().unwrap(), vec!["broken"]);
}

#[test]
fn stop_writes_the_scene() {
    let dir = tempfile::tempdir().unwrap();
    let mut e = engine_in(dir.path());
    e.start();
    e.stop();
    let names = e.available_scene_names().unwrap();
    assert_eq!(names, vec!["default"]);
}

#[test]
fn new_scene_starts_from_the_builtin_groove() {
    let dir = tempfile::tempdir().unwrap();
    let mut e = engine_in(dir.path());
    e.set_bpm(90.0);
    e.randomize_drum_pattern();
    e.create_new_scene_with_name("blank").unwrap();
    assert_eq!(e.current_scene_name(), "blank");
    assert_eq!(e.bpm(), DEFAULT_BPM);
    assert!(e.drum_step(DrumVoice::Kick, 4).hit);
    assert!(matches!(e.create_new_scene_with_name("../up"), Err(SceneError::InvalidName(_))));
    assert_eq!(e.current_scene_name(), "blank");
}
