//! The five pipeline stages. Each one turns the previous stage's artifact into
//! the next and never reaches past its own input.

pub mod captions;
pub mod compose;
pub mod events;
pub mod footage;
pub mod narration;
pub mod script;

use crate::{error::Result, workdir::RunDir};

pub use captions::CaptionAligner;
pub use compose::{CompositionInput, VideoComposer};
pub use footage::{FootageRequest, FootageResolver};
pub use narration::{Narration, NarrationSynthesizer};
pub use script::ScriptGenerator;

pub mod stage_ids {
    pub const SCRIPT: &str = "script.generate";
    pub const NARRATION: &str = "narration.synth";
    pub const CAPTIONS: &str = "captions.align";
    pub const FOOTAGE: &str = "footage.resolve";
    pub const COMPOSE: &str = "video.compose";
}

/// What every stage can see besides its input.
pub struct StageContext<'a> {
    pub run_dir: &'a RunDir,
}

pub trait Stage: Send + Sync {
    const STAGE_ID: &'static str;
    /// Human-readable progress label.
    const LABEL: &'static str;

    type Input: Send + Sync;
    type Output: Send;

    async fn run(&self, input: &Self::Input, ctx: &StageContext<'_>) -> Result<Self::Output>;
}
