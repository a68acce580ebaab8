pub mod captions_aligned;
pub mod footage_resolved;
pub mod narration_synthesized;
pub mod pipeline_failed;
pub mod run_started;
pub mod script_generated;
pub mod stage_started;
pub mod video_rendered;

pub use captions_aligned::*;
pub use footage_resolved::*;
pub use narration_synthesized::*;
pub use pipeline_failed::*;
pub use run_started::*;
pub use script_generated::*;
pub use stage_started::*;
pub use video_rendered::*;
