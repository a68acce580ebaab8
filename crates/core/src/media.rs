//! Thin wrappers around `ffmpeg`, `ffprobe` and WAV header inspection.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::debug;

use crate::{
    config::RenderConfig,
    error::{ReelError, Result},
};

async fn run(tool: &'static str, command: &mut Command, subject: &Path) -> Result<Vec<u8>> {
    debug!(tool, subject = %subject.display(), "spawning");
    let output = command.output().await.map_err(|e| ReelError::Media {
        tool,
        path: subject.to_path_buf(),
        reason: format!("could not start {tool}: {e}"),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: Vec<&str> = stderr.lines().rev().take(6).collect();
        return Err(ReelError::Media {
            tool,
            path: subject.to_path_buf(),
            reason: format!(
                "{} ({})",
                output.status,
                tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
            ),
        });
    }

    Ok(output.stdout)
}

/// Convert any audio file to 16 kHz mono PCM WAV
pub async fn transcode_to_wav(input: &Path, output: &Path) -> Result<()> {
    run(
        "ffmpeg",
        Command::new("ffmpeg")
            .arg("-y")
            .arg("-i")
            .arg(input)
            .arg("-vn")
            .arg("-acodec")
            .arg("pcm_s16le")
            .arg("-ar")
            .arg("16000")
            .arg("-ac")
            .arg("1")
            .arg(output),
        input,
    )
    .await?;
    Ok(())
}

/// Duration in seconds and sample rate, read from the WAV header
pub fn wav_duration(path: &Path) -> Result<(f64, u32)> {
    let reader = hound::WavReader::open(path).map_err(|e| ReelError::Media {
        tool: "hound",
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let sample_rate = reader.spec().sample_rate;
    if sample_rate == 0 {
        return Err(ReelError::Media {
            tool: "hound",
            path: path.to_path_buf(),
            reason: "sample rate is zero".to_string(),
        });
    }
    Ok((reader.duration() as f64 / sample_rate as f64, sample_rate))
}

/// Duration of the first video stream, in seconds
pub async fn probe_video_duration(path: &Path) -> Result<f64> {
    let stdout = run(
        "ffprobe",
        Command::new("ffprobe")
            .arg("-v")
            .arg("error")
            .arg("-select_streams")
            .arg("v:0")
            .arg("-show_entries")
            .arg("stream=duration")
            .arg("-of")
            .arg("default=noprint_wrappers=1:nokey=1")
            .arg(path),
        path,
    )
    .await?;

    let text = String::from_utf8_lossy(&stdout);
    text.trim().parse::<f64>().map_err(|e| ReelError::Media {
        tool: "ffprobe",
        path: path.to_path_buf(),
        reason: format!("unexpected duration output {:?}: {e}", text.trim()),
    })
}

/// Number of frames between `start` and `end` when both are snapped to the frame grid.
///
/// Snapping the boundaries rather than the lengths keeps the sum of all
/// segments equal to the frame count of the whole timeline.
pub fn frames_between(start: f64, end: f64, fps: u32) -> u64 {
    let f = fps as f64;
    let a = (start * f).round() as u64;
    let b = (end * f).round() as u64;
    b.saturating_sub(a)
}

/// Loop or trim a stock clip to exactly `frames` frames at the target size
pub async fn render_segment(
    clip: &Path,
    output: &Path,
    frames: u64,
    render: &RenderConfig,
) -> Result<()> {
    let filter = format!(
        "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},setsar=1,fps={fps}",
        w = render.width,
        h = render.height,
        fps = render.fps
    );
    run(
        "ffmpeg",
        Command::new("ffmpeg")
            .arg("-y")
            .arg("-stream_loop")
            .arg("-1")
            .arg("-i")
            .arg(clip)
            .arg("-vf")
            .arg(filter)
            .arg("-frames:v")
            .arg(frames.to_string())
            .arg("-an")
            .arg("-c:v")
            .arg("libx264")
            .arg("-preset")
            .arg("veryfast")
            .arg("-pix_fmt")
            .arg("yuv420p")
            .arg(output),
        clip,
    )
    .await?;
    Ok(())
}

/// Concat-demuxer list file contents
pub fn concat_list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("file '{}'\n", p.display().to_string().replace('\'', r"'\''")))
        .collect()
}

pub async fn concat_segments(list_file: &Path, output: &Path) -> Result<()> {
    run(
        "ffmpeg",
        Command::new("ffmpeg")
            .arg("-y")
            .arg("-f")
            .arg("concat")
            .arg("-safe")
            .arg("0")
            .arg("-i")
            .arg(list_file)
            .arg("-c")
            .arg("copy")
            .arg(output),
        list_file,
    )
    .await?;
    Ok(())
}

pub fn subtitle_filter(captions_file_name: &str, render: &RenderConfig) -> String {
    format!(
        "subtitles={}:force_style='FontName=Arial,FontSize={},PrimaryColour=&H00FFFFFF,OutlineColour=&H00000000,BorderStyle=1,Outline=2,Shadow=0,Alignment=2,MarginV=40'",
        captions_file_name, render.caption_font_size
    )
}

/// Burn captions into the visual track, attach the narration and cut to `duration`.
///
/// `captions` is `None` when there is nothing to show (silent narration).
pub async fn burn_captions_and_mux(
    visual: &Path,
    audio: &Path,
    captions: Option<&Path>,
    output: &Path,
    duration: f64,
    render: &RenderConfig,
) -> Result<()> {
    let visual = std::path::absolute(visual)?;
    let audio = std::path::absolute(audio)?;
    let output = std::path::absolute(output)?;

    let mut command = Command::new("ffmpeg");
    command.arg("-y").arg("-i").arg(&visual).arg("-i").arg(&audio);

    // The subtitles filter takes a filtergraph-escaped path; running from the
    // captions directory lets us pass a bare file name instead.
    if let Some(captions) = captions {
        let captions = std::path::absolute(captions)?;
        if let (Some(dir), Some(name)) = (captions.parent(), captions.file_name()) {
            command.current_dir(dir);
            command
                .arg("-vf")
                .arg(subtitle_filter(&name.to_string_lossy(), render));
        }
    }

    command
        .arg("-map")
        .arg("0:v:0")
        .arg("-map")
        .arg("1:a:0")
        .arg("-c:v")
        .arg("libx264")
        .arg("-preset")
        .arg("veryfast")
        .arg("-pix_fmt")
        .arg("yuv420p")
        .arg("-r")
        .arg(render.fps.to_string())
        .arg("-c:a")
        .arg("aac")
        .arg("-b:a")
        .arg("192k")
        .arg("-t")
        .arg(format!("{:.3}", duration))
        .arg("-movflags")
        .arg("+faststart")
        .arg(&output);

    run("ffmpeg", &mut command, &visual).await?;
    Ok(())
}
