use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use crate::{domain::FileRef, errors::Error, Result};

/// Pulls the audio track out of a video file.
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    async fn extract(&self, video: &Path, audio: &Path) -> Result<()>;
}

/// `ffmpeg`-backed extractor (`-vn`, mp3 output).
#[derive(Clone, Debug)]
pub struct FfmpegExtractor {
    binary: PathBuf,
}

impl FfmpegExtractor {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl AudioExtractor for FfmpegExtractor {
    async fn extract(&self, video: &Path, audio: &Path) -> Result<()> {
        let output = Command::new(&self.binary)
            .arg("-y")
            .arg("-i")
            .arg(video)
            .arg("-vn")
            .arg("-acodec")
            .arg("libmp3lame")
            .arg(audio)
            .output()
            .await
            .map_err(|e| Error::External(format!("failed to run {}: {e}", self.binary.display())))?;

        if !output.status.success() {
            return Err(Error::External(format!(
                "ffmpeg audio extraction failed: {}",
                String::from_utf8_lossy(&output.stderr)
                    .trim()
                    .chars()
                    .take(240)
                    .collect::<String>()
            )));
        }
        Ok(())
    }
}

/// Scratch files for one video note, named after its file id.
///
/// Both files are removed when the guard drops, whichever way processing ends.
#[derive(Debug)]
pub struct VideoNoteFiles {
    pub video: PathBuf,
    pub audio: PathBuf,
}

impl VideoNoteFiles {
    pub fn new(temp_dir: &Path, file: &FileRef) -> Self {
        let stem = sanitize_file_stem(file.as_str());
        Self {
            video: temp_dir.join(format!("{stem}.mp4")),
            audio: temp_dir.join(format!("{stem}.mp3")),
        }
    }

    pub fn audio_file_name(&self) -> String {
        self.audio
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio.mp3".to_string())
    }
}

impl Drop for VideoNoteFiles {
    fn drop(&mut self) {
        for path in [&self.video, &self.audio] {
            match std::fs::remove_file(path) {
                Ok(()) => tracing::info!(path = %path.display(), "removed temporary file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "failed to remove temporary file")
                }
            }
        }
    }
}

/// Telegram file ids are URL-safe base64, but never trust a path component.
fn sanitize_file_stem(id: &str) -> String {
    let out: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if out.is_empty() {
        "video_note".to_string()
    } else {
        out
    }
}
