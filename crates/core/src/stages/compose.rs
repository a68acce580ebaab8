use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::{
    config::RenderConfig,
    error::{ReelError, Result},
    format::{captions_to_srt, group_captions},
    media,
    stages::{Stage, StageContext, stage_ids},
    timeline::windows_tile,
    types::{AudioTrack, FootageClip, RenderedVideo, WordTimings},
};

/// Tolerance for clip windows summing to the narration length.
pub const WINDOW_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct CompositionInput {
    pub audio: AudioTrack,
    pub timings: WordTimings,
    pub clips: Vec<FootageClip>,
}

/// Reject inputs that cannot produce a video of exactly the narration's length.
pub fn validate_inputs(input: &CompositionInput) -> Result<()> {
    if input.clips.is_empty() {
        return Err(ReelError::composition("no clips to compose"));
    }
    if !input.audio.path.is_file() {
        return Err(ReelError::composition(format!(
            "narration file {} is missing",
            input.audio.path.display()
        )));
    }
    if let Some(missing) = input.clips.iter().find(|c| !c.path.is_file()) {
        return Err(ReelError::composition(format!(
            "clip for segment {} is missing at {}",
            missing.segment_index,
            missing.path.display()
        )));
    }

    let windows: Vec<_> = input.clips.iter().map(|c| c.window).collect();
    if !windows_tile(&windows, input.audio.duration, WINDOW_EPSILON) {
        let sum: f64 = windows.iter().map(|w| w.duration()).sum();
        return Err(ReelError::composition(format!(
            "clip windows do not cover the narration contiguously (sum {:.6}s, narration {:.6}s)",
            sum, input.audio.duration
        )));
    }
    Ok(())
}

/// The muxed video must match the narration to within `tolerance` seconds.
fn check_duration(rendered: f64, narration: f64, tolerance: f64) -> Result<()> {
    if (rendered - narration).abs() > tolerance {
        return Err(ReelError::composition(format!(
            "rendered video is {:.3}s but narration is {:.3}s",
            rendered, narration
        )));
    }
    Ok(())
}

/// Move a finished video to `dest`. Falls back to copying when `src` and
/// `dest` are on different filesystems; a failed copy leaves nothing behind.
async fn move_into_place(src: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    if fs::rename(src, dest).await.is_ok() {
        return Ok(());
    }
    if let Err(e) = fs::copy(src, dest).await {
        let _ = fs::remove_file(dest).await;
        return Err(e.into());
    }
    fs::remove_file(src).await?;
    Ok(())
}

pub struct VideoComposer {
    output_path: PathBuf,
    render: RenderConfig,
}

impl VideoComposer {
    pub fn new(output_path: PathBuf, render: RenderConfig) -> Self {
        Self {
            output_path,
            render,
        }
    }
}

impl Stage for VideoComposer {
    const STAGE_ID: &'static str = stage_ids::COMPOSE;
    const LABEL: &'static str = "Rendering video";

    type Input = CompositionInput;
    type Output = RenderedVideo;

    async fn run(&self, input: &CompositionInput, ctx: &StageContext<'_>) -> Result<RenderedVideo> {
        validate_inputs(input)?;
        let run_dir = ctx.run_dir;

        let mut segment_files = Vec::with_capacity(input.clips.len());
        for (position, clip) in input.clips.iter().enumerate() {
            let frames = media::frames_between(clip.window.start, clip.window.end, self.render.fps);
            if frames == 0 {
                debug!(segment = clip.segment_index, "window shorter than a frame, skipped");
                continue;
            }
            let segment = run_dir.segment_path(position);
            media::render_segment(&clip.path, &segment, frames, &self.render).await?;
            segment_files.push(std::path::absolute(&segment)?);
        }
        if segment_files.is_empty() {
            return Err(ReelError::composition("narration is shorter than one frame"));
        }

        let list_path = run_dir.concat_list_path();
        fs::write(&list_path, media::concat_list(&segment_files)).await?;
        let visual = run_dir.visual_track_path();
        media::concat_segments(&list_path, &visual).await?;

        let captions = group_captions(&input.timings, self.render.caption_max_chars);
        let captions_path = if captions.is_empty() {
            None
        } else {
            let path = run_dir.captions_path();
            fs::write(&path, captions_to_srt(&captions)).await?;
            Some(path)
        };
        debug!(captions = captions.len(), "captions written");

        // Muxed inside the run dir so a failed or mismatched render never
        // reaches the output path.
        let staged = run_dir.final_video_path();
        media::burn_captions_and_mux(
            &visual,
            &input.audio.path,
            captions_path.as_deref(),
            &staged,
            input.audio.duration,
            &self.render,
        )
        .await?;

        let duration = media::probe_video_duration(&staged).await?;
        check_duration(duration, input.audio.duration, self.render.frame_duration())?;
        move_into_place(&staged, &self.output_path).await?;

        info!(path = %self.output_path.display(), duration, "video rendered");
        Ok(RenderedVideo {
            path: self.output_path.clone(),
            duration,
            width: self.render.width,
            height: self.render.height,
            fps: self.render.fps,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::types::{NarrationSource, TimeWindow};

    fn touch(path: &Path) {
        std::fs::write(path, b"x").unwrap();
    }

    fn clip(dir: &Path, idx: usize, start: f64, end: f64) -> FootageClip {
        let path = dir.join(format!("clip_{idx}.mp4"));
        touch(&path);
        FootageClip {
            segment_index: idx,
            keyword: "sea".to_string(),
            source_url: String::new(),
            path,
            width: 1920,
            height: 1080,
            window: TimeWindow::new(start, end),
            covers_segments: vec![idx],
        }
    }

    fn input(dir: &Path, duration: f64, clips: Vec<FootageClip>) -> CompositionInput {
        let audio = dir.join("narration.wav");
        touch(&audio);
        CompositionInput {
            audio: AudioTrack {
                path: audio,
                duration,
                sample_rate: 16_000,
                source: NarrationSource::Primary,
            },
            timings: WordTimings {
                words: Vec::new(),
                duration,
            },
            clips,
        }
    }

    #[test]
    fn accepts_contiguous_windows() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        let clips = vec![clip(dir, 0, 0.0, 2.5), clip(dir, 1, 2.5, 6.1)];
        assert!(validate_inputs(&input(dir, 6.1, clips)).is_ok());
    }

    #[test]
    fn rejects_gaps_overlaps_and_short_coverage() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();

        let cases = [
            vec![clip(dir, 0, 0.0, 2.0), clip(dir, 1, 2.5, 6.0)],
            vec![clip(dir, 0, 0.0, 3.0), clip(dir, 1, 2.5, 6.0)],
            vec![clip(dir, 0, 0.5, 6.0)],
            vec![clip(dir, 0, 0.0, 5.99)],
        ];
        for clips in cases {
            let err = validate_inputs(&input(dir, 6.0, clips)).unwrap_err();
            assert!(matches!(err, ReelError::Composition { .. }));
        }
    }

    #[test]
    fn rejects_empty_clip_list() {
        let tmp = tempfile::tempdir().unwrap();
        let err = validate_inputs(&input(tmp.path(), 3.0, Vec::new())).unwrap_err();
        assert!(matches!(err, ReelError::Composition { .. }));
    }

    #[test]
    fn rejects_missing_files() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();

        let mut missing_clip = input(dir, 3.0, vec![clip(dir, 0, 0.0, 3.0)]);
        missing_clip.clips[0].path = dir.join("gone.mp4");
        assert!(matches!(
            validate_inputs(&missing_clip),
            Err(ReelError::Composition { .. })
        ));

        let mut missing_audio = input(dir, 3.0, vec![clip(dir, 0, 0.0, 3.0)]);
        missing_audio.audio.path = dir.join("gone.wav");
        assert!(matches!(
            validate_inputs(&missing_audio),
            Err(ReelError::Composition { .. })
        ));
    }

    #[test]
    fn duration_must_match_within_a_frame() {
        let frame = RenderConfig::default().frame_duration();
        assert!(check_duration(10.0 + frame * 0.5, 10.0, frame).is_ok());
        assert!(check_duration(10.0 - frame * 0.9, 10.0, frame).is_ok());
        assert!(matches!(
            check_duration(9.2, 10.0, frame),
            Err(ReelError::Composition { .. })
        ));
    }

    #[tokio::test]
    async fn finished_video_moves_to_output_path() {
        let tmp = tempfile::tempdir().unwrap();
        let staged = tmp.path().join("final.mp4");
        std::fs::write(&staged, b"video").unwrap();
        let dest = tmp.path().join("renders/nested/out.mp4");

        move_into_place(&staged, &dest).await.unwrap();

        assert!(!staged.exists());
        assert_eq!(std::fs::read(&dest).unwrap(), b"video");
    }

    #[tokio::test]
    async fn missing_staged_video_leaves_no_output() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("out.mp4");

        assert!(move_into_place(&tmp.path().join("final.mp4"), &dest).await.is_err());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn stage_validates_before_touching_ffmpeg() {
        let tmp = tempfile::tempdir().unwrap();
        let run_dir = crate::workdir::RunDir::create(Some(tmp.path())).await.unwrap();
        let composer = VideoComposer::new(tmp.path().join("out.mp4"), RenderConfig::default());

        let err = composer
            .run(
                &input(tmp.path(), 3.0, Vec::new()),
                &StageContext { run_dir: &run_dir },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ReelError::Composition { .. }));
        assert!(!tmp.path().join("out.mp4").exists());
    }
}
