pub mod delay;
pub mod distortion;
pub mod drums;
pub mod engine;
pub mod filter;
pub mod output;
pub mod param;
pub mod tb303;

pub use delay::TempoDelay;
pub use distortion::TubeDistortion;
pub use drums::{DrumParamId, DrumSynthVoice};
pub use engine::MiniAcid;
pub use filter::{ChamberlinFilter, FilterKind, LadderFilter, VoiceFilter};
pub use output::{AudioHandle, OutputDevice};
pub use param::Parameter;
pub use tb303::{Oscillator, TB303ParamId, TB303Voice};
