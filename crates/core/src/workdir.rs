use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::error::Result;

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("reelgen")
}

/// Scratch directory owned by a single pipeline run.
///
/// Every intermediate artifact (narration, clips, rendered segments, captions)
/// lives here and goes away with [`RunDir::cleanup`].
#[derive(Debug)]
pub struct RunDir {
    id: Uuid,
    root: PathBuf,
}

impl RunDir {
    pub async fn create(work_root: Option<&Path>) -> Result<Self> {
        let id = Uuid::new_v4();
        let base = match work_root {
            Some(dir) => dir.to_path_buf(),
            None => get_root_cache_dir(),
        };
        let root = base.join("runs").join(id.to_string());
        fs::create_dir_all(root.join("clips")).await?;
        fs::create_dir_all(root.join("segments")).await?;
        Ok(Self { id, root })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn narration_mp3_path(&self) -> PathBuf {
        self.root.join("narration.mp3")
    }

    pub fn narration_wav_path(&self) -> PathBuf {
        self.root.join("narration.wav")
    }

    pub fn transcript_path(&self) -> PathBuf {
        self.root.join("transcript.json")
    }

    /// Downloaded stock clip for a segment
    pub fn clip_path(&self, segment_index: usize) -> PathBuf {
        self.root
            .join("clips")
            .join(format!("clip_{:03}.mp4", segment_index))
    }

    /// Clip re-encoded to its time window and the target resolution
    pub fn segment_path(&self, position: usize) -> PathBuf {
        self.root
            .join("segments")
            .join(format!("segment_{:03}.mp4", position))
    }

    pub fn concat_list_path(&self) -> PathBuf {
        self.root.join("segments.txt")
    }

    pub fn visual_track_path(&self) -> PathBuf {
        self.root.join("visual.mp4")
    }

    pub fn captions_path(&self) -> PathBuf {
        self.root.join("captions.srt")
    }

    /// Muxed video, before it passes the duration check and moves to the output path
    pub fn final_video_path(&self) -> PathBuf {
        self.root.join("final.mp4")
    }

    pub async fn cleanup(self) -> Result<()> {
        if fs::try_exists(&self.root).await? {
            fs::remove_dir_all(&self.root).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_dir_is_created_and_removed() {
        let tmp = tempfile::tempdir().unwrap();
        let run = RunDir::create(Some(tmp.path())).await.unwrap();

        assert!(run.path().starts_with(tmp.path().join("runs")));
        assert!(run.path().join("clips").is_dir());
        assert!(run.path().join("segments").is_dir());
        assert_eq!(
            run.clip_path(3).file_name().unwrap().to_string_lossy(),
            "clip_003.mp4"
        );

        assert!(run.final_video_path().starts_with(run.path()));

        let root = run.path().to_path_buf();
        fs::write(run.captions_path(), "1\n").await.unwrap();
        run.cleanup().await.unwrap();
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn every_run_gets_its_own_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let a = RunDir::create(Some(tmp.path())).await.unwrap();
        let b = RunDir::create(Some(tmp.path())).await.unwrap();
        assert_ne!(a.id(), b.id());
        assert_ne!(a.path(), b.path());
    }
}
