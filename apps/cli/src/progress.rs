use std::time::{Duration, Instant};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use reelgen_core::{
    events::downcast_ref,
    format_timestamp,
    routes::ANY_EVENT,
    stages::events::{
        CaptionsAligned, FootageResolved, NarrationSynthesized, PipelineFailed, ScriptGenerated,
        StageStarted, VideoRendered,
    },
    subscribers::{Inbox, SubscriptionSpec},
};

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let spinner_style = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(spinner_style);
    pb.set_message(format!("{}...", msg));
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

struct Step {
    spinner: ProgressBar,
    started: Instant,
}

impl Step {
    fn finish(self, line: String) {
        self.spinner.finish_with_message(format!(
            "{} {} {}",
            style("✓").green().bold(),
            line,
            style(format!("[{}]", format_duration(self.started.elapsed()))).dim()
        ));
    }

    fn fail(self, stage: &str) {
        self.spinner
            .finish_with_message(format!("{} {}", style("✗").red().bold(), style(stage).red()));
    }
}

/// Renders one spinner per stage from pipeline events.
pub struct ProgressSink {
    current: Option<Step>,
}

impl ProgressSink {
    pub const SUBSCRIBER_ID: &'static str = "cli.progress";

    pub fn subscription() -> SubscriptionSpec {
        SubscriptionSpec {
            subscriber_id: Self::SUBSCRIBER_ID,
            event_types: vec![ANY_EVENT],
            capacity: 64,
        }
    }

    pub fn new() -> Self {
        Self { current: None }
    }

    fn finish(&mut self, line: String) {
        if let Some(step) = self.current.take() {
            step.finish(line);
        }
    }

    /// Consume events until a terminal one arrives or the bus closes.
    pub async fn run(mut self, inbox: Inbox) {
        while let Some(enriched) = inbox.recv().await {
            let event = &enriched.event;

            if let Some(e) = downcast_ref::<StageStarted>(event) {
                self.finish(String::new());
                self.current = Some(Step {
                    spinner: create_spinner(e.label),
                    started: Instant::now(),
                });
            } else if let Some(e) = downcast_ref::<ScriptGenerated>(event) {
                self.finish(format!(
                    "Script: {} segments, {} words",
                    e.script.segments.len(),
                    e.script.text.split_whitespace().count()
                ));
            } else if let Some(e) = downcast_ref::<NarrationSynthesized>(event) {
                let mut line = format!(
                    "Narration: {} {}",
                    format_timestamp(e.audio.duration),
                    style(format!("({})", e.engine)).dim()
                );
                if e.primary_error.is_some() {
                    line.push_str(&format!(" {}", style("fallback voice").yellow()));
                }
                self.finish(line);
            } else if let Some(e) = downcast_ref::<CaptionsAligned>(event) {
                self.finish(format!("Captions: {} words aligned", e.timings.len()));
            } else if let Some(e) = downcast_ref::<FootageResolved>(event) {
                let mut line = format!("Footage: {} clips", e.clips.len());
                if e.reused_segments > 0 {
                    line.push_str(&format!(
                        " {}",
                        style(format!("({} segments reuse a clip)", e.reused_segments)).yellow()
                    ));
                }
                self.finish(line);
            } else if let Some(e) = downcast_ref::<VideoRendered>(event) {
                self.finish(format!(
                    "Rendered: {}",
                    style(e.video.path.display()).cyan()
                ));
            } else if let Some(e) = downcast_ref::<PipelineFailed>(event) {
                if let Some(step) = self.current.take() {
                    step.fail(e.stage);
                }
            }

            if event.is_terminal() {
                break;
            }
        }

        if inbox.dropped() > 0 {
            tracing::debug!(dropped = inbox.dropped(), "progress events dropped");
        }
    }
}
