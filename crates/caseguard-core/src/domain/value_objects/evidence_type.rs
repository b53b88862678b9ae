//! Evidence Type Value Object
//!
//! Closed set of evidence kinds, each fixing its upload constraints.
//! There is no fallback variant: unknown names fail construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MB: u64 = 1024 * 1024;

/// Evidence type value object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EvidenceType {
    Document,
    Photo,
    Email,
    Recording,
    Note,
    Witness,
}

impl EvidenceType {
    /// Every variant, in declaration order
    pub const ALL: [EvidenceType; 6] = [
        Self::Document,
        Self::Photo,
        Self::Email,
        Self::Recording,
        Self::Note,
        Self::Witness,
    ];

    /// Parse a variant name (trimmed, case-insensitive)
    pub fn new(value: impl AsRef<str>) -> Result<Self, EvidenceTypeError> {
        let raw = value.as_ref().trim();
        if raw.is_empty() {
            return Err(EvidenceTypeError::Empty);
        }
        match raw.to_ascii_lowercase().as_str() {
            "document" => Ok(Self::Document),
            "photo" => Ok(Self::Photo),
            "email" => Ok(Self::Email),
            "recording" => Ok(Self::Recording),
            "note" => Ok(Self::Note),
            "witness" => Ok(Self::Witness),
            _ => Err(EvidenceTypeError::Unknown(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Photo => "photo",
            Self::Email => "email",
            Self::Recording => "recording",
            Self::Note => "note",
            Self::Witness => "witness",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Document => "Document",
            Self::Photo => "Photo",
            Self::Email => "Email",
            Self::Recording => "Audio/Video Recording",
            Self::Note => "Note",
            Self::Witness => "Witness Statement",
        }
    }

    /// Whether an upload must include a file
    pub fn requires_file(&self) -> bool {
        match self {
            Self::Document | Self::Photo | Self::Email | Self::Recording => true,
            Self::Note | Self::Witness => false,
        }
    }

    /// Lower-case extensions without the leading dot
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Document => &["pdf", "doc", "docx", "txt", "rtf", "odt"],
            Self::Photo => &["jpg", "jpeg", "png", "gif", "heic", "webp"],
            Self::Email => &["eml", "msg", "pdf"],
            Self::Recording => &["mp3", "wav", "m4a", "mp4", "mov", "avi"],
            Self::Note => &["txt", "md"],
            Self::Witness => &["pdf", "doc", "docx", "txt"],
        }
    }

    /// Maximum file size in bytes
    pub fn max_file_size(&self) -> u64 {
        match self {
            Self::Document => 10 * MB,
            Self::Photo => 5 * MB,
            Self::Email => 5 * MB,
            Self::Recording => 100 * MB,
            Self::Note => MB,
            Self::Witness => 10 * MB,
        }
    }

    pub fn is_extension_allowed(&self, extension: &str) -> bool {
        let extension = extension.trim().trim_start_matches('.').to_ascii_lowercase();
        self.allowed_extensions().contains(&extension.as_str())
    }

    /// Check an upload against this type's constraints.
    ///
    /// Must pass before any evidence record is constructed.
    pub fn validate_upload(&self, file_name: &str, size_bytes: u64) -> Result<(), EvidenceTypeError> {
        let extension = file_name
            .rsplit_once('.')
            .map(|(stem, ext)| (stem, ext.trim()))
            .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .ok_or_else(|| EvidenceTypeError::MissingExtension(file_name.to_string()))?;

        if !self.is_extension_allowed(&extension) {
            return Err(EvidenceTypeError::ExtensionNotAllowed {
                evidence_type: *self,
                extension,
            });
        }

        if size_bytes > self.max_file_size() {
            return Err(EvidenceTypeError::FileTooLarge {
                evidence_type: *self,
                size: size_bytes,
                max: self.max_file_size(),
            });
        }

        Ok(())
    }
}

impl FromStr for EvidenceType {
    type Err = EvidenceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for EvidenceType {
    type Error = EvidenceTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EvidenceType> for String {
    fn from(value: EvidenceType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for EvidenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvidenceTypeError {
    #[error("evidence type cannot be empty")]
    Empty,

    #[error("unknown evidence type '{0}'; expected one of document, photo, email, recording, note, witness")]
    Unknown(String),

    #[error("file '{0}' has no extension")]
    MissingExtension(String),

    #[error("extension '.{extension}' is not allowed for {evidence_type} evidence")]
    ExtensionNotAllowed {
        evidence_type: EvidenceType,
        extension: String,
    },

    #[error("file of {size} bytes exceeds the {max} byte limit for {evidence_type} evidence")]
    FileTooLarge {
        evidence_type: EvidenceType,
        size: u64,
        max: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_ceilings() {
        assert_eq!(EvidenceType::new("document").unwrap().max_file_size(), 10_485_760);
        assert_eq!(EvidenceType::Photo.max_file_size(), 5_242_880);
        assert_eq!(EvidenceType::Email.max_file_size(), 5_242_880);
        assert_eq!(EvidenceType::Recording.max_file_size(), 104_857_600);
        assert_eq!(EvidenceType::Note.max_file_size(), 1_048_576);
        assert_eq!(EvidenceType::Witness.max_file_size(), 10_485_760);
    }

    #[test]
    fn test_unknown_variant_fails() {
        assert_eq!(
            EvidenceType::new("invalid"),
            Err(EvidenceTypeError::Unknown("invalid".into()))
        );
        assert_eq!(EvidenceType::new(" "), Err(EvidenceTypeError::Empty));
        assert!("other".parse::<EvidenceType>().is_err());
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(EvidenceType::new(" Photo ").unwrap(), EvidenceType::Photo);
        for kind in EvidenceType::ALL {
            assert_eq!(EvidenceType::new(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn test_file_requirement() {
        assert!(EvidenceType::Document.requires_file());
        assert!(EvidenceType::Recording.requires_file());
        assert!(!EvidenceType::Note.requires_file());
        assert!(!EvidenceType::Witness.requires_file());
    }

    #[test]
    fn test_validate_upload() {
        let photo = EvidenceType::Photo;
        assert!(photo.validate_upload("scene.JPG", 1024).is_ok());
        assert!(matches!(
            photo.validate_upload("scene.pdf", 1024),
            Err(EvidenceTypeError::ExtensionNotAllowed { .. })
        ));
        assert!(matches!(
            photo.validate_upload("scene.png", 5 * MB + 1),
            Err(EvidenceTypeError::FileTooLarge { max, .. }) if max == 5 * MB
        ));
        assert!(matches!(
            photo.validate_upload("README", 10),
            Err(EvidenceTypeError::MissingExtension(_))
        ));
        assert!(matches!(
            photo.validate_upload(".png", 10),
            Err(EvidenceTypeError::MissingExtension(_))
        ));
    }

    #[test]
    fn test_serde_uses_variant_name() {
        assert_eq!(serde_json::to_string(&EvidenceType::Witness).unwrap(), "\"witness\"");
        let parsed: EvidenceType = serde_json::from_str("\"recording\"").unwrap();
        assert_eq!(parsed, EvidenceType::Recording);
        assert!(serde_json::from_str::<EvidenceType>("\"other\"").is_err());
    }
}
