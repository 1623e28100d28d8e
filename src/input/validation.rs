// src/input/validation.rs
use crate::error::ValidationError;
use crate::input::selection::SelectedFile;
use crate::models::auth::SignupForm;
use crate::models::job::ContentKind;
use regex::Regex;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

pub const DEFAULT_VIDEO_PROMPT: &str = "Analyze this video";
pub const DEFAULT_YOUTUBE_PROMPT: &str = "Analyze this YouTube video";
pub const MAX_NAME_LENGTH: usize = 50;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const UNKNOWN_MIME: &str = "application/octet-stream";

lazy_static::lazy_static! {
    static ref YOUTUBE_URL: Regex =
        Regex::new(r"^(https?://)?(www\.)?(youtube\.com|youtu\.be)/.+$").expect("valid regex");
    static ref VIDEO_ID_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([^&\n?#\s]+)").expect("valid regex"),
        Regex::new(r"youtube\.com/v/([^&\n?#\s]+)").expect("valid regex"),
    ];
}

/// The discriminated payload handed to the submission callback.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Video {
        file: PathBuf,
        mime: String,
        prompt: String,
    },
    Youtube {
        url: String,
        prompt: String,
    },
    Text {
        content: String,
    },
}

impl Submission {
    pub fn kind(&self) -> ContentKind {
        match self {
            Submission::Video { .. } => ContentKind::Video,
            Submission::Youtube { .. } => ContentKind::Youtube,
            Submission::Text { .. } => ContentKind::Text,
        }
    }

    /// Text sent as the `message` form field. The backend detects YouTube
    /// jobs by finding the link inside the message, so the URL leads.
    pub fn message(&self) -> String {
        match self {
            Submission::Video { prompt, .. } => prompt.clone(),
            Submission::Youtube { url, prompt } => format!("{} {}", url, prompt),
            Submission::Text { content } => content.clone(),
        }
    }

    pub fn file(&self) -> Option<&Path> {
        match self {
            Submission::Video { file, .. } => Some(file),
            _ => None,
        }
    }

    pub fn source_url(&self) -> Option<&str> {
        match self {
            Submission::Youtube { url, .. } => Some(url),
            _ => None,
        }
    }
}

pub fn is_video_mime(mime: &str) -> bool {
    mime.starts_with("video/")
}

pub fn is_youtube_url(url: &str) -> bool {
    YOUTUBE_URL.is_match(url.trim())
}

/// For an explicit URL field: anything that is not a YouTube link is refused.
pub fn validate_youtube_url(url: &str) -> Result<String, ValidationError> {
    let url = url.trim();
    if is_youtube_url(url) {
        Ok(url.to_string())
    } else {
        Err(ValidationError::InvalidYoutubeUrl)
    }
}

pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn embed_url(video_id: &str) -> String {
    format!("https://www.youtube.com/embed/{}", video_id)
}

/// Turn the user's input into exactly one submission. A selected file wins;
/// otherwise a YouTube link anywhere in the text makes it a YouTube job and
/// the remaining words become the prompt; anything else is free text.
pub fn classify_input(file: Option<&SelectedFile>, text: &str) -> Result<Submission, ValidationError> {
    let text = text.trim();

    if let Some(file) = file {
        if !is_video_mime(&file.mime) {
            return Err(ValidationError::NotAVideo(file.mime.clone()));
        }
        let prompt = if text.is_empty() { DEFAULT_VIDEO_PROMPT } else { text };
        return Ok(Submission::Video {
            file: file.path.clone(),
            mime: file.mime.clone(),
            prompt: prompt.to_string(),
        });
    }

    if text.is_empty() {
        return Err(ValidationError::EmptyInput);
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if let Some(pos) = words.iter().position(|w| is_youtube_url(w)) {
        let rest: Vec<&str> = words
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != pos)
            .map(|(_, w)| *w)
            .collect();
        let prompt = if rest.is_empty() {
            DEFAULT_YOUTUBE_PROMPT.to_string()
        } else {
            rest.join(" ")
        };
        return Ok(Submission::Youtube {
            url: words[pos].to_string(),
            prompt,
        });
    }

    Ok(Submission::Text {
        content: text.to_string(),
    })
}

pub fn validate_signup(form: &SignupForm) -> Result<(), ValidationError> {
    let email = form.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ValidationError::InvalidEmail);
    }
    check_name("First name", &form.first_name)?;
    check_name("Last name", &form.last_name)?;
    if form.password != form.confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }
    if form.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::WeakPassword {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

fn check_name(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if len == 0 || len > MAX_NAME_LENGTH {
        return Err(ValidationError::InvalidName {
            field,
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(())
}

/// Best-effort MIME type of a local file: magic bytes first, extension second.
pub fn sniff_video_mime(path: &Path) -> io::Result<String> {
    // Large enough to reach the EBML DocType of a WebM header
    let mut header = [0u8; 64];
    let mut file = File::open(path)?;
    let mut filled = 0;
    while filled < header.len() {
        let n = file.read(&mut header[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    let mime = mime_from_bytes(&header[..filled])
        .or_else(|| mime_from_extension(path))
        .unwrap_or(UNKNOWN_MIME);
    Ok(mime.to_string())
}

pub fn mime_from_bytes(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
        // ISO base media; the major brand tells QuickTime apart from MP4
        return Some(match &bytes[8..12] {
            b"qt  " => "video/quicktime",
            b"3gp4" | b"3gp5" | b"3gp6" | b"3ge6" => "video/3gpp",
            _ => "video/mp4",
        });
    }
    if bytes.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        // EBML; WebM and Matroska share the header, only the DocType differs
        return Some(if bytes.windows(4).any(|w| w == b"webm") {
            "video/webm"
        } else {
            "video/x-matroska"
        });
    }
    if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"AVI " {
        return Some("video/x-msvideo");
    }
    if bytes.starts_with(b"FLV") {
        return Some("video/x-flv");
    }
    if bytes.starts_with(b"OggS") {
        return Some("video/ogg");
    }
    if bytes.starts_with(&[0x00, 0x00, 0x01, 0xBA]) || bytes.starts_with(&[0x00, 0x00, 0x01, 0xB3]) {
        return Some("video/mpeg");
    }
    None
}

pub fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    Some(match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "flv" => "video/x-flv",
        "wmv" => "video/x-ms-wmv",
        "3gp" => "video/3gpp",
        "ogv" => "video/ogg",
        "mpeg" | "mpg" => "video/mpeg",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(path: &str, mime: &str) -> SelectedFile {
        SelectedFile {
            path: PathBuf::from(path),
            mime: mime.to_string(),
            size: 1024,
        }
    }

    #[test]
    fn only_video_mime_types_pass() {
        assert!(is_video_mime("video/quicktime"));
        assert!(is_video_mime("video/mp4"));
        assert!(!is_video_mime("image/png"));
        assert!(!is_video_mime("application/octet-stream"));
        assert!(!is_video_mime("VIDEO/mp4"));
    }

    #[test]
    fn youtube_hosts_are_recognized() {
        assert!(is_youtube_url("https://youtu.be/abc123XYZ90"));
        assert!(is_youtube_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_youtube_url("youtube.com/embed/xyz"));
        assert!(!is_youtube_url("https://vimeo.com/12345"));
        assert!(!is_youtube_url("https://notyoutube.com/watch?v=1"));
        assert!(!is_youtube_url("https://youtu.be/"));
    }

    #[test]
    fn short_link_yields_embed_id() {
        let submission = classify_input(None, "https://youtu.be/abc123XYZ90").unwrap();
        assert_eq!(submission.kind(), ContentKind::Youtube);
        let url = submission.source_url().unwrap();
        let id = extract_video_id(url).unwrap();
        assert_eq!(id, "abc123XYZ90");
        assert_eq!(embed_url(&id), "https://www.youtube.com/embed/abc123XYZ90");
    }

    #[test]
    fn video_id_patterns_cover_watch_embed_and_v() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(extract_video_id("https://youtube.com/embed/abc?rel=0").as_deref(), Some("abc"));
        assert_eq!(extract_video_id("https://youtube.com/v/legacy1").as_deref(), Some("legacy1"));
        assert_eq!(extract_video_id("https://youtube.com/channel/UC123"), None);
    }

    #[test]
    fn youtube_link_inside_text_splits_prompt() {
        let submission =
            classify_input(None, "summarize https://www.youtube.com/watch?v=abc please").unwrap();
        assert_eq!(
            submission,
            Submission::Youtube {
                url: "https://www.youtube.com/watch?v=abc".into(),
                prompt: "summarize please".into(),
            }
        );
        assert_eq!(
            submission.message(),
            "https://www.youtube.com/watch?v=abc summarize please"
        );
    }

    #[test]
    fn non_youtube_text_falls_back_to_free_text() {
        let submission = classify_input(None, "look at https://vimeo.com/1 for me").unwrap();
        assert_eq!(
            submission,
            Submission::Text {
                content: "look at https://vimeo.com/1 for me".into()
            }
        );
    }

    #[test]
    fn file_wins_over_text() {
        let file = video("clip.mov", "video/quicktime");
        let submission = classify_input(Some(&file), "https://youtu.be/abc").unwrap();
        assert_eq!(submission.kind(), ContentKind::Video);
        assert_eq!(submission.file(), Some(Path::new("clip.mov")));
        assert_eq!(submission.message(), "https://youtu.be/abc");

        let bare = classify_input(Some(&file), "  ").unwrap();
        assert_eq!(bare.message(), DEFAULT_VIDEO_PROMPT);
    }

    #[test]
    fn empty_input_and_non_video_files_are_refused() {
        assert_eq!(classify_input(None, "   "), Err(ValidationError::EmptyInput));
        let image = video("photo.png", "image/png");
        assert_eq!(
            classify_input(Some(&image), "describe"),
            Err(ValidationError::NotAVideo("image/png".into()))
        );
    }

    #[test]
    fn explicit_url_field_rejects_other_hosts() {
        assert_eq!(
            validate_youtube_url(" https://youtu.be/abc "),
            Ok("https://youtu.be/abc".to_string())
        );
        assert_eq!(
            validate_youtube_url("https://example.com/video"),
            Err(ValidationError::InvalidYoutubeUrl)
        );
    }

    fn form(password: &str, confirm: &str) -> SignupForm {
        SignupForm {
            email: "ada@example.com".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            password: password.into(),
            confirm_password: confirm.into(),
        }
    }

    #[test]
    fn mismatched_passwords_are_blocked() {
        let err = validate_signup(&form("abc", "xyz")).unwrap_err();
        assert_eq!(err, ValidationError::PasswordMismatch);
        assert_eq!(err.to_string(), "Passwords do not match");
    }

    #[test]
    fn signup_checks_names_email_and_length() {
        assert!(validate_signup(&form("correct horse", "correct horse")).is_ok());
        assert_eq!(
            validate_signup(&form("short", "short")),
            Err(ValidationError::WeakPassword { min: 8 })
        );

        let mut missing_name = form("correct horse", "correct horse");
        missing_name.first_name = "  ".into();
        assert!(matches!(
            validate_signup(&missing_name),
            Err(ValidationError::InvalidName { field: "First name", .. })
        ));

        let mut long_name = form("correct horse", "correct horse");
        long_name.last_name = "x".repeat(51);
        assert!(matches!(
            validate_signup(&long_name),
            Err(ValidationError::InvalidName { field: "Last name", .. })
        ));

        let mut bad_email = form("correct horse", "correct horse");
        bad_email.email = "ada.example.com".into();
        assert_eq!(validate_signup(&bad_email), Err(ValidationError::InvalidEmail));
    }

    #[test]
    fn magic_bytes_identify_containers() {
        let mut mov = vec![0, 0, 0, 0x14];
        mov.extend_from_slice(b"ftypqt  ");
        assert_eq!(mime_from_bytes(&mov), Some("video/quicktime"));

        let mut mp4 = vec![0, 0, 0, 0x18];
        mp4.extend_from_slice(b"ftypisom");
        assert_eq!(mime_from_bytes(&mp4), Some("video/mp4"));

        let mut avi = b"RIFF".to_vec();
        avi.extend_from_slice(&[0, 0, 0, 0]);
        avi.extend_from_slice(b"AVI ");
        assert_eq!(mime_from_bytes(&avi), Some("video/x-msvideo"));

        assert_eq!(mime_from_bytes(&[0x89, b'P', b'N', b'G']), None);
    }

    #[test]
    fn webm_doctype_is_read_past_the_ebml_header() {
        // EBML header as written by common muxers: DocType sits at offset 24
        let header: &[u8] = &[
            0x1A, 0x45, 0xDF, 0xA3, 0x9F, 0x42, 0x86, 0x81, 0x01, 0x42, 0xF7, 0x81, 0x01, 0x42,
            0xF2, 0x81, 0x04, 0x42, 0xF3, 0x81, 0x08, 0x42, 0x82, 0x84, b'w', b'e', b'b', b'm',
            0x42, 0x87, 0x81, 0x04, 0x42, 0x85, 0x81, 0x02,
        ];
        let dir = tempfile::tempdir().unwrap();
        let clip = dir.path().join("clip.bin");
        std::fs::write(&clip, header).unwrap();
        assert_eq!(sniff_video_mime(&clip).unwrap(), "video/webm");

        let mut matroska = header.to_vec();
        matroska[24..28].copy_from_slice(b"mtrs");
        let mkv = dir.path().join("movie.bin");
        std::fs::write(&mkv, &matroska).unwrap();
        assert_eq!(sniff_video_mime(&mkv).unwrap(), "video/x-matroska");
    }

    #[test]
    fn video_id_stops_at_whitespace() {
        let submission = classify_input(None, "https://youtu.be/abc123XYZ90").unwrap();
        assert_eq!(
            extract_video_id(&submission.message()).as_deref(),
            Some("abc123XYZ90")
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ what is this").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn sniffing_falls_back_to_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mov = dir.path().join("clip.mov");
        std::fs::write(&mov, b"not really a header").unwrap();
        assert_eq!(sniff_video_mime(&mov).unwrap(), "video/quicktime");

        let notes = dir.path().join("notes.bin");
        std::fs::write(&notes, b"hello").unwrap();
        assert_eq!(sniff_video_mime(&notes).unwrap(), UNKNOWN_MIME);
    }
}
