//! File type detection

use std::path::Path;

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Clone, PartialEq)]
pub enum FileType {
    Pdf,
    Unknown,
}

impl FileType {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => FileType::Pdf,
            _ => FileType::Unknown,
        }
    }

    /// Sniff the leading bytes; PDF writers may put junk before the header
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let head = &bytes[..bytes.len().min(1024)];
        if head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC) {
            FileType::Pdf
        } else {
            FileType::Unknown
        }
    }

    pub fn detect(path: &Path, bytes: &[u8]) -> Self {
        let by_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(FileType::Unknown);

        match by_extension {
            FileType::Pdf => FileType::Pdf,
            FileType::Unknown => Self::from_bytes(bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_detection() {
        assert_eq!(FileType::from_extension("PDF"), FileType::Pdf);
        assert_eq!(FileType::from_extension("docx"), FileType::Unknown);
    }

    #[test]
    fn test_magic_bytes_without_extension() {
        let path = Path::new("upload");
        assert_eq!(FileType::detect(path, b"%PDF-1.5\n..."), FileType::Pdf);
        assert_eq!(FileType::detect(path, b"plain text"), FileType::Unknown);
    }
}
