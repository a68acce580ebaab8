pub mod clients;
pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod media;
pub mod pipeline;
pub mod provider;
pub mod queues;
pub mod routes;
pub mod stages;
pub mod subscribers;
pub mod timeline;
pub mod types;
pub mod workdir;

pub use config::{PipelineConfig, Settings};
pub use error::{ErrorKind, ReelError, Result};
pub use format::{format_run_summary, format_timestamp};
pub use pipeline::{Pipeline, PipelineParts, RunReport};
pub use provider::{Provider, ProviderConfig};
pub use types::{
    AudioTrack, Caption, FootageClip, RenderedVideo, Script, ScriptSegment, TimeWindow, Topic,
    WordTiming, WordTimings,
};
