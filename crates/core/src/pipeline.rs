use std::{path::PathBuf, sync::Arc, time::Instant};

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    clients::{
        ChatClient, FootageSearch, GoogleTranslateSpeech, OpenAiSpeech, OpenAiTranscriber,
        PexelsClient, SpeechService, TextGenerator, Transcriber,
    },
    config::{PipelineConfig, Settings},
    error::Result,
    events::{Event, EventBus},
    stages::{
        CaptionAligner, CompositionInput, FootageRequest, FootageResolver, NarrationSynthesizer,
        ScriptGenerator, Stage, StageContext, VideoComposer,
        events::{
            CaptionsAligned, FootageResolved, NarrationSynthesized, PipelineFailed, RunStarted,
            ScriptGenerated, StageStarted, VideoRendered,
        },
        narration::NarratedAudio,
    },
    types::{FootageClip, RenderedVideo, Script, Topic},
    workdir::RunDir,
};

/// Stage id reported when a run is rejected before any stage starts.
pub const RUN_STAGE_ID: &str = "run";

/// The external services a pipeline talks to.
pub struct PipelineParts {
    pub llm: Box<dyn TextGenerator>,
    pub primary_speech: Box<dyn SpeechService>,
    pub fallback_speech: Box<dyn SpeechService>,
    pub transcriber: Box<dyn Transcriber>,
    pub footage: Box<dyn FootageSearch>,
}

impl PipelineParts {
    pub fn from_settings(settings: &Settings, config: &PipelineConfig) -> Self {
        Self {
            llm: Box::new(ChatClient::from_settings(config.provider, settings)),
            primary_speech: Box::new(OpenAiSpeech::from_settings(settings, &config.narration)),
            fallback_speech: Box::new(GoogleTranslateSpeech::new(&config.narration.language)),
            transcriber: Box::new(OpenAiTranscriber::from_settings(settings, &config.narration)),
            footage: Box::new(PexelsClient::from_settings(settings, &config.footage)),
        }
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub script: Script,
    pub narration: NarratedAudio,
    pub clips: Vec<FootageClip>,
    pub video: RenderedVideo,
    /// Scratch directory, when it was kept.
    pub run_dir: Option<PathBuf>,
}

/// Publishes events so each one names the previous as its parent.
struct Trail<'a> {
    bus: &'a EventBus,
    last: Uuid,
}

impl<'a> Trail<'a> {
    fn start(bus: &'a EventBus, first: RunStarted) -> Self {
        let last = first.event_id();
        bus.publish(Arc::new(first));
        Self { bus, last }
    }

    fn publish<E: Event>(&mut self, make: impl FnOnce(Uuid) -> E) {
        let event = make(self.last);
        self.last = event.event_id();
        self.bus.publish(Arc::new(event));
    }
}

async fn execute<S: Stage>(
    stage: &S,
    input: &S::Input,
    ctx: &StageContext<'_>,
    trail: &mut Trail<'_>,
) -> Result<S::Output> {
    trail.publish(|parent| StageStarted::new(parent, S::STAGE_ID, S::LABEL));
    info!(stage = S::STAGE_ID, "stage started");
    let started = Instant::now();

    match stage.run(input, ctx).await {
        Ok(output) => {
            info!(
                stage = S::STAGE_ID,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "stage finished"
            );
            Ok(output)
        }
        Err(e) => {
            error!(stage = S::STAGE_ID, kind = ?e.kind(), error = %e, "stage failed");
            trail.publish(|parent| PipelineFailed::new(Some(parent), S::STAGE_ID, &e));
            Err(e)
        }
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    script: ScriptGenerator,
    narration: NarrationSynthesizer,
    captions: CaptionAligner,
    footage: FootageResolver,
    composer: VideoComposer,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, parts: PipelineParts) -> Self {
        Self {
            script: ScriptGenerator::new(parts.llm),
            narration: NarrationSynthesizer::new(parts.primary_speech, parts.fallback_speech),
            captions: CaptionAligner::new(parts.transcriber),
            footage: FootageResolver::new(parts.footage, config.footage.clone()),
            composer: VideoComposer::new(config.output_path.clone(), config.render.clone()),
            config,
        }
    }

    pub fn from_settings(settings: &Settings, config: PipelineConfig) -> Self {
        let parts = PipelineParts::from_settings(settings, &config);
        Self::new(config, parts)
    }

    /// Turn `topic` into a narrated video, reporting progress on `bus`.
    ///
    /// The first failing stage aborts the run. The scratch directory is removed
    /// afterwards either way unless `keep_temp` is set.
    pub async fn run(&self, topic: &str, bus: &EventBus) -> Result<RunReport> {
        let topic = match Topic::new(topic) {
            Ok(topic) => topic,
            Err(e) => {
                bus.publish(Arc::new(PipelineFailed::new(None, RUN_STAGE_ID, &e)));
                return Err(e);
            }
        };

        let run_dir = RunDir::create(self.config.work_root.as_deref()).await?;
        let run_id = run_dir.id();
        info!(%run_id, topic = topic.as_str(), dir = %run_dir.path().display(), "run started");

        let mut trail = Trail::start(
            bus,
            RunStarted::new(
                run_id,
                topic.as_str(),
                self.config.provider,
                self.config.output_path.clone(),
            ),
        );

        let result = self.run_stages(&topic, &run_dir, &mut trail).await;

        let kept = if self.config.keep_temp {
            info!(dir = %run_dir.path().display(), "keeping run directory");
            Some(run_dir.path().to_path_buf())
        } else {
            if let Err(e) = run_dir.cleanup().await {
                warn!(error = %e, "could not remove run directory");
            }
            None
        };

        result.map(|mut report| {
            report.run_dir = kept;
            report
        })
    }

    async fn run_stages(
        &self,
        topic: &Topic,
        run_dir: &RunDir,
        trail: &mut Trail<'_>,
    ) -> Result<RunReport> {
        let ctx = StageContext { run_dir };

        let script = execute(&self.script, topic, &ctx, trail).await?;
        trail.publish(|parent| ScriptGenerated::new(parent, script.clone()));

        let narration = execute(&self.narration, &script, &ctx, trail).await?;
        trail.publish(|parent| {
            NarrationSynthesized::new(
                parent,
                narration.track.clone(),
                narration.engine,
                narration.primary_error.clone(),
            )
        });

        let timings = execute(&self.captions, &narration.track, &ctx, trail).await?;
        trail.publish(|parent| CaptionsAligned::new(parent, timings.clone()));

        let request = FootageRequest {
            segments: script.segments.clone(),
            timings,
        };
        let clips = execute(&self.footage, &request, &ctx, trail).await?;
        trail.publish(|parent| FootageResolved::new(parent, clips.clone()));

        let input = CompositionInput {
            audio: narration.track.clone(),
            timings: request.timings,
            clips,
        };
        let video = execute(&self.composer, &input, &ctx, trail).await?;
        trail.publish(|parent| VideoRendered::new(parent, video.clone()));

        Ok(RunReport {
            run_id: run_dir.id(),
            script,
            narration,
            clips: input.clips,
            video,
            run_dir: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        path::Path,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;

    use super::*;
    use crate::{
        clients::{FootageVideo, RawTranscript},
        error::{ErrorKind, ReelError},
        events::{bus_builder, downcast_ref},
        provider::Provider,
        routes::ANY_EVENT,
        stages::{narration::tests::CountingSpeech, stage_ids},
        subscribers::{Inbox, SubscriptionSpec},
    };

    const REPLY: &str = r#"{"segments": [
        {"text": "Octopuses have three hearts.", "keywords": ["octopus swimming"]},
        {"text": "Their blood is blue.", "keywords": ["blue water"]},
        {"text": "They taste with their arms.", "keywords": ["octopus tentacles"]}
    ]}"#;

    struct CannedLlm(Arc<AtomicUsize>);

    #[async_trait]
    impl TextGenerator for CannedLlm {
        fn name(&self) -> &'static str {
            "canned"
        }

        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(REPLY.to_string())
        }
    }

    struct CountingTranscriber(Arc<AtomicUsize>);

    #[async_trait]
    impl Transcriber for CountingTranscriber {
        async fn transcribe(&self, _audio: &Path) -> Result<RawTranscript> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(RawTranscript::default())
        }
    }

    struct NoFootage;

    #[async_trait]
    impl FootageSearch for NoFootage {
        async fn search(&self, _query: &str) -> Result<Vec<FootageVideo>> {
            Ok(Vec::new())
        }

        async fn download(&self, _link: &str, _dest: &Path) -> Result<()> {
            Ok(())
        }
    }

    struct Harness {
        pipeline: Pipeline,
        llm_calls: Arc<AtomicUsize>,
        fallback_calls: Arc<AtomicUsize>,
        transcriber_calls: Arc<AtomicUsize>,
        _work: tempfile::TempDir,
        work_root: PathBuf,
    }

    #[derive(Default)]
    struct Options {
        llm: Option<Box<dyn TextGenerator>>,
        primary_speaks: bool,
        keep_temp: bool,
    }

    fn harness(options: Options) -> Harness {
        let work = tempfile::tempdir().unwrap();
        let work_root = work.path().to_path_buf();
        let llm_calls = Arc::new(AtomicUsize::new(0));
        let transcriber_calls = Arc::new(AtomicUsize::new(0));
        let (primary, _) = CountingSpeech::new("primary", options.primary_speaks);
        let (fallback, fallback_calls) = CountingSpeech::new("fallback", false);

        let mut config = PipelineConfig::new(Provider::Groq);
        config.work_root = Some(work_root.clone());
        config.output_path = work_root.join("out.mp4");
        config.keep_temp = options.keep_temp;

        let parts = PipelineParts {
            llm: options.llm.unwrap_or_else(|| {
                Box::new(CannedLlm(Arc::clone(&llm_calls))) as Box<dyn TextGenerator>
            }),
            primary_speech: Box::new(primary),
            fallback_speech: Box::new(fallback),
            transcriber: Box::new(CountingTranscriber(Arc::clone(&transcriber_calls))),
            footage: Box::new(NoFootage),
        };

        Harness {
            pipeline: Pipeline::new(config, parts),
            llm_calls,
            fallback_calls,
            transcriber_calls,
            _work: work,
            work_root,
        }
    }

    fn recording_bus() -> (EventBus, Inbox) {
        let (bus, mut wiring) = bus_builder()
            .subscribe(SubscriptionSpec {
                subscriber_id: "test.recorder",
                event_types: vec![ANY_EVENT],
                capacity: 64,
            })
            .build()
            .unwrap();
        let inbox = wiring.take("test.recorder").unwrap();
        (bus, inbox)
    }

    fn drain(inbox: &Inbox) -> Vec<Arc<crate::events::EnrichedEvent>> {
        std::iter::from_fn(|| inbox.try_recv()).collect()
    }

    #[tokio::test]
    async fn blank_topic_is_rejected_before_any_stage() {
        let h = harness(Options::default());
        let (bus, inbox) = recording_bus();

        let err = h.pipeline.run("   ", &bus).await.unwrap_err();

        assert!(matches!(err, ReelError::InvalidInput { .. }));
        assert_eq!(h.llm_calls.load(Ordering::SeqCst), 0);
        let events = drain(&inbox);
        assert_eq!(events.len(), 1);
        let failed = downcast_ref::<PipelineFailed>(&events[0].event).unwrap();
        assert_eq!(failed.stage, RUN_STAGE_ID);
        assert_eq!(failed.kind, ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn synthesis_failure_stops_before_alignment() {
        let h = harness(Options::default());
        let (bus, inbox) = recording_bus();

        let err = h.pipeline.run("weird ocean facts", &bus).await.unwrap_err();

        assert!(matches!(err, ReelError::Synthesis { .. }));
        assert_eq!(h.fallback_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.transcriber_calls.load(Ordering::SeqCst), 0);

        let types: Vec<_> = drain(&inbox)
            .iter()
            .map(|e| e.event.event_type())
            .collect();
        assert_eq!(
            types,
            vec![
                RunStarted::EVENT_TYPE,
                StageStarted::EVENT_TYPE,
                ScriptGenerated::EVENT_TYPE,
                StageStarted::EVENT_TYPE,
                PipelineFailed::EVENT_TYPE,
            ]
        );

        let runs: Vec<_> = std::fs::read_dir(h.work_root.join("runs")).unwrap().collect();
        assert!(runs.is_empty(), "run directory was not cleaned up");
    }

    #[tokio::test]
    async fn failure_event_names_stage_and_kind() {
        let h = harness(Options {
            llm: Some(Box::new(ChatClient::new(Provider::Openai, None))),
            ..Options::default()
        });
        let (bus, inbox) = recording_bus();

        let err = h.pipeline.run("space facts", &bus).await.unwrap_err();
        assert!(matches!(err, ReelError::Config { env_var: "OPENAI_API_KEY", .. }));

        let events = drain(&inbox);
        let last = events.last().unwrap();
        assert!(last.event.is_terminal());
        let failed = downcast_ref::<PipelineFailed>(&last.event).unwrap();
        assert_eq!(failed.stage, stage_ids::SCRIPT);
        assert_eq!(failed.kind, ErrorKind::Config);
        assert_eq!(last.event.parent_ids().len(), 1);
    }

    #[tokio::test]
    async fn kept_run_dir_survives_a_failed_run() {
        // The primary engine "succeeds" with a few junk bytes, so narration.mp3
        // is written and the WAV conversion afterwards fails.
        let h = harness(Options {
            primary_speaks: true,
            keep_temp: true,
            ..Options::default()
        });
        let (bus, inbox) = recording_bus();

        assert!(h.pipeline.run("weird ocean facts", &bus).await.is_err());
        assert_eq!(h.transcriber_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.fallback_calls.load(Ordering::SeqCst), 0);

        let runs: Vec<_> = std::fs::read_dir(h.work_root.join("runs"))
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(runs.len(), 1, "run directory was removed");
        assert!(runs[0].join("narration.mp3").is_file());
        assert!(runs[0].join("clips").is_dir());

        let started = drain(&inbox)
            .iter()
            .find_map(|e| downcast_ref::<RunStarted>(&e.event).map(|r| r.run_id))
            .unwrap();
        assert!(runs[0].ends_with(started.to_string()));
        assert!(!h.work_root.join("out.mp4").exists());
    }
}
