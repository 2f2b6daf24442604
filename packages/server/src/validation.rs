//! Upload validation: size, declared type, content signature and filename.
//!
//! Everything here is a pure function of the candidate's bytes and declared
//! metadata. Nothing is written until a candidate has passed every check.

use thiserror::Error;

/// Maximum size of a slide/flyer upload.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Maximum size of a professor portrait upload.
pub const MAX_PORTRAIT_BYTES: u64 = 2 * 1024 * 1024;

const PNG_SIGNATURE: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];
const JPEG_SIGNATURE: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// Image formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// Extension given to stored filenames, including the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => ".png",
            Self::Jpeg => ".jpg",
        }
    }

    /// Identify the format from the leading bytes.
    ///
    /// Requires at least four bytes even for JPEG, whose signature is three.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < PNG_SIGNATURE.len() {
            return None;
        }
        if bytes.starts_with(&PNG_SIGNATURE) {
            Some(Self::Png)
        } else if bytes.starts_with(&JPEG_SIGNATURE) {
            Some(Self::Jpeg)
        } else {
            None
        }
    }

    fn from_declared_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    fn accepts_extension(self, ext: &str) -> bool {
        match self {
            Self::Png => ext.eq_ignore_ascii_case("png"),
            Self::Jpeg => ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"),
        }
    }
}

/// Why a candidate upload was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No file uploaded.")]
    NoFile,
    #[error("File too large. Max size is {limit} bytes.")]
    PayloadTooLarge { limit: u64 },
    #[error("Invalid file type. Only PNG and JPEG are allowed.")]
    UnsupportedType,
    #[error("Invalid file signature (not a real PNG/JPEG).")]
    SignatureMismatch,
}

impl ValidationError {
    /// Machine-readable code surfaced to clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoFile => "NO_FILE",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::UnsupportedType => "UNSUPPORTED_TYPE",
            Self::SignatureMismatch => "SIGNATURE_MISMATCH",
        }
    }
}

/// Limits applied to one class of uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: u64,
}

impl UploadPolicy {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn slides() -> Self {
        Self::new(MAX_UPLOAD_BYTES)
    }

    pub fn portraits() -> Self {
        Self::new(MAX_PORTRAIT_BYTES)
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::slides()
    }
}

/// An upload as received, with client-supplied metadata that is not trusted.
#[derive(Debug, Clone, Default)]
pub struct CandidateUpload {
    pub declared_name: Option<String>,
    pub declared_mime: Option<String>,
    pub bytes: Vec<u8>,
}

/// An upload that passed every check.
#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    pub bytes: Vec<u8>,
    /// Format detected from content, never the declared one.
    pub kind: ImageKind,
    /// Sanitized filename without extension.
    pub base_name: String,
}

impl ValidatedUpload {
    pub fn detected_mime(&self) -> &'static str {
        self.kind.mime()
    }

    pub fn detected_ext(&self) -> &'static str {
        self.kind.extension()
    }

    /// Stored display filename: sanitized base plus the detected extension.
    pub fn filename(&self) -> String {
        format!("{}{}", self.base_name, self.kind.extension())
    }
}

/// Run every check in order, stopping at the first failure.
pub fn validate(
    policy: &UploadPolicy,
    upload: CandidateUpload,
) -> Result<ValidatedUpload, ValidationError> {
    if upload.bytes.is_empty() {
        return Err(ValidationError::NoFile);
    }

    if upload.bytes.len() as u64 > policy.max_bytes {
        return Err(ValidationError::PayloadTooLarge {
            limit: policy.max_bytes,
        });
    }

    let declared_name = upload.declared_name.as_deref().unwrap_or_default();
    let declared = upload
        .declared_mime
        .as_deref()
        .and_then(ImageKind::from_declared_mime)
        .ok_or(ValidationError::UnsupportedType)?;
    let ext_matches = declared_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| declared.accepts_extension(ext));
    if !ext_matches {
        return Err(ValidationError::UnsupportedType);
    }

    let detected = ImageKind::sniff(&upload.bytes).ok_or(ValidationError::SignatureMismatch)?;
    if detected != declared {
        return Err(ValidationError::SignatureMismatch);
    }

    Ok(ValidatedUpload {
        base_name: sanitize_base_name(declared_name),
        bytes: upload.bytes,
        kind: detected,
    })
}

/// Derive a safe base name from a client-supplied filename.
///
/// Every character outside `[A-Za-z0-9._-]` becomes `_`, the final extension
/// is dropped, and leading dots are stripped. Falls back to `file`.
pub fn sanitize_base_name(original: &str) -> String {
    let sanitized: String = original
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let base = match sanitized.rfind('.') {
        Some(pos) => &sanitized[..pos],
        None => sanitized.as_str(),
    };
    let base = base.trim_start_matches('.');

    if base.is_empty() {
        "file".to_string()
    } else {
        base.to_string()
    }
}
