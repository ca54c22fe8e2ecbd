pub mod generator;
pub mod persistence;
pub mod project;
pub mod scene;

pub use generator::PatternGenerator;
pub use persistence::{DirSceneStore, MemorySceneStore, SceneError, SceneStore};
pub use project::{
    Bank, DrumPattern, DrumPatternSet, DrumStep, Scene, Song, SongPosition, SynthParameters,
    SynthPattern, SynthStep,
};
pub use scene::SceneManager;
