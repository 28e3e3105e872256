//! Download a resolved PDF to a temporary file, within size bounds.

pub mod download;
pub mod temp_file;

pub use download::Delivery;
pub use temp_file::{safe_file_name, TempPdf};

/// Why a resolved link could not be turned into a file.
#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    #[error("not a PDF (content type: {content_type})")]
    NotPdf { content_type: String },

    #[error("file too small ({bytes} bytes)")]
    TooSmall { bytes: u64 },

    #[error("file larger than {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("download failed with HTTP status {0}")]
    HttpStatus(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DeliveryError {
    /// Chat message shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotPdf { content_type } => {
                format!("⚠️ فشل: الرابط لا يبدو PDF ({content_type}).")
            }
            Self::TooSmall { .. } => "⚠️ فشل: الملف صغير جدًا.".to_string(),
            Self::TooLarge { .. } => {
                "⚠️ فشل: الملف أكبر من الحد المسموح للإرسال عبر تيليجرام (50MB).".to_string()
            }
            Self::HttpStatus(status) => format!("⚠️ فشل تحميل الملف (status={status})."),
            Self::Network(e) => format!("⚠️ خطأ أثناء تنزيل الملف: {e}"),
            Self::Io(e) => format!("⚠️ خطأ أثناء حفظ الملف: {e}"),
        }
    }
}
