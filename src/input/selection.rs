// src/input/selection.rs
use super::preview::{ObjectUrl, PreviewRegistry};
use super::validation::{is_video_mime, sniff_video_mime};
use crate::error::{ClientResult, ValidationError};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub mime: String,
    pub size: u64,
}

impl SelectedFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn size_mb(&self) -> f64 {
        self.size as f64 / (1024.0 * 1024.0)
    }
}

#[derive(Debug)]
struct Selection {
    file: SelectedFile,
    preview: ObjectUrl,
}

/// Drag-and-drop / browse state for one upload interaction.
#[derive(Debug)]
pub struct UploadSelection {
    previews: PreviewRegistry,
    drag_active: bool,
    current: Option<Selection>,
}

impl UploadSelection {
    pub fn new(previews: PreviewRegistry) -> Self {
        Self {
            previews,
            drag_active: false,
            current: None,
        }
    }

    pub fn is_drag_active(&self) -> bool {
        self.drag_active
    }

    pub fn drag_enter(&mut self) {
        self.drag_active = true;
    }

    pub fn drag_over(&mut self) {
        self.drag_active = true;
    }

    pub fn drag_leave(&mut self) {
        self.drag_active = false;
    }

    /// Only the first dropped file is considered.
    pub fn drop_files(&mut self, paths: &[PathBuf]) -> ClientResult<Option<&SelectedFile>> {
        self.drag_active = false;
        match paths.first() {
            Some(path) => self.select_file(path).map(Some),
            None => Ok(None),
        }
    }

    /// Accept `path` if it is a video. A rejected file leaves the previous
    /// selection and its preview untouched.
    pub fn select_file(&mut self, path: impl AsRef<Path>) -> ClientResult<&SelectedFile> {
        let path = path.as_ref();
        let mime = sniff_video_mime(path)?;
        if !is_video_mime(&mime) {
            tracing::warn!(path = %path.display(), mime = %mime, "Rejected non-video file");
            return Err(ValidationError::NotAVideo(mime).into());
        }
        let size = std::fs::metadata(path)?.len();

        let file = SelectedFile {
            path: path.to_path_buf(),
            mime,
            size,
        };
        let preview = self.previews.create(path);
        tracing::info!(file = %file.file_name(), mime = %file.mime, "🎞️ Video selected");

        // Replacing the old selection drops its preview handle, which revokes it
        let selection = self.current.insert(Selection { file, preview });
        Ok(&selection.file)
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.current.as_ref().map(|s| &s.file)
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.preview.as_str())
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
