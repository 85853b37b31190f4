// Version information for the CAPTCHA OCR node

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-digit-recognition-2025-08-07";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

/// Build date
pub const BUILD_DATE: &str = "2025-08-07";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "multipart-upload",
    "otsu-binarization",
    "paddleocr-recognition",
    "digit-filtering",
];
