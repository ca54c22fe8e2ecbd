// The one door into the engine from outside the audio thread.
//
// Control code calls `with` and may block for at most one render block. The
// device callback calls `render`, which never blocks: if the UI is holding
// the lock it gets a block of silence instead.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::audio::MiniAcid;
use crate::pipeline::persistence::{SceneError, SceneStore};

#[derive(Clone)]
pub struct AudioGuard {
    engine: Arc<Mutex<MiniAcid>>,
}

impl AudioGuard {
    pub fn new(engine: MiniAcid) -> Self {
        Self { engine: Arc::new(Mutex::new(engine)) }
    }

    /// Run a control-path mutation (or read) with exclusive access.
    pub fn with<R>(&self, f: impl FnOnce(&mut MiniAcid) -> R) -> R {
        let mut engine = self.engine.lock();
        f(&mut engine)
    }

    /// Save the current scene without holding the engine across the write:
    /// the JSON is taken under the lock, the store is written after it is
    /// released. Returns the name it was saved under.
    pub fn save_scene(&self, store: &mut dyn SceneStore) -> Result<String, SceneError> {
        let (name, json) = self.with(|e| e.scene_snapshot())?;
        store.write_scene(&name, &json)?;
        Ok(name)
    }

    /// Render callback entry point. Returns false when the block was
    /// replaced by silence because the lock was busy.
    pub fn render(&self, out: &mut [i16]) -> bool {
        match self.engine.try_lock() {
            Some(mut engine) => {
                engine.generate_audio_buffer(out);
                true
            }
            None => {
                out.fill(0);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SceneManager;
    use crate::shared::SAMPLE_RATE;

    #[test]
    fn with_returns_closure_result() {
        let guard = AudioGuard::new(MiniAcid::in_memory(SAMPLE_RATE as f32));
        guard.with(|e| e.set_bpm(140.0));
        assert_eq!(guard.with(|e| e.bpm()), 140.0);
    }

    #[test]
    fn contended_render_is_silent() {
        let guard = AudioGuard::new(MiniAcid::in_memory(SAMPLE_RATE as f32));
        guard.with(|e| e.start());
        let mut buf = [1i16; 64];
        let other = guard.clone();
        let rendered = guard.with(|_| other.render(&mut buf));
        assert!(!rendered);
        assert!(buf.iter().all(|&s| s == 0));
        // the engine never saw that block
        assert_eq!(guard.with(|e| e.current_step()), None);
    }

    // a store that renders a block while it is being written to
    struct RenderingStore {
        audio: AudioGuard,
        rendered_during_write: Option<bool>,
        written: Vec<(String, String)>,
    }

    impl SceneStore for RenderingStore {
        fn read_scene(&self, name: &str) -> Result<String, SceneError> {
            Err(SceneError::NotFound(name.to_string()))
        }

        fn write_scene(&mut self, name: &str, json: &str) -> Result<(), SceneError> {
            let mut buf = [0i16; 64];
            self.rendered_during_write = Some(self.audio.render(&mut buf));
            self.written.push((name.to_string(), json.to_string()));
            Ok(())
        }

        fn list_scenes(&self) -> Result<Vec<String>, SceneError> {
            Ok(self.written.iter().map(|(n, _)| n.clone()).collect())
        }
    }

    #[test]
    fn saving_leaves_the_audio_path_free() {
        let guard = AudioGuard::new(MiniAcid::in_memory(SAMPLE_RATE as f32));
        guard.with(|e| {
            e.set_bpm(133.0);
            e.start();
        });
        let mut store = RenderingStore { audio: guard.clone(), rendered_during_write: None, written: Vec::new() };

        let name = guard.save_scene(&mut store).unwrap();
        assert_eq!(name, "default");
        assert_eq!(store.rendered_during_write, Some(true));
        assert_eq!(guard.with(|e| e.current_step()), Some(0));

        let (_, json) = &store.written[0];
        let mut reloaded = SceneManager::new();
        reloaded.load_scene(json).unwrap();
        assert_eq!(reloaded.bpm(), 133.0);
    }

    #[test]
    fn render_from_another_thread() {
        let guard = AudioGuard::new(MiniAcid::in_memory(SAMPLE_RATE as f32));
        guard.with(|e| e.start());
        let audio = guard.clone();
        let handle = std::thread::spawn(move || {
            let mut buf = [0i16; 256];
            audio.render(&mut buf)
        });
        assert!(handle.join().unwrap());
        assert_eq!(guard.with(|e| e.current_step()), Some(0));
    }
}
