use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptionError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("API key is not set. Set GOOGLE_API_KEY or run `museum-caption config --set-api-key YOUR_KEY`")]
    MissingApiKey,

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("Required column missing: expected one of {expected:?} in {file}")]
    MissingColumn { expected: Vec<String>, file: String },

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Image load error: {0}")]
    ImageLoad(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Excel generation error: {0}")]
    ExcelGeneration(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl CaptionError {
    /// Configuration and input errors stop the run; everything else only
    /// affects the current object.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            CaptionError::ImageLoad(_)
                | CaptionError::Generation(_)
                | CaptionError::RateLimited { .. }
                | CaptionError::EmptyResponse
                | CaptionError::Http(_)
        )
    }
}

impl From<rust_xlsxwriter::XlsxError> for CaptionError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        CaptionError::ExcelGeneration(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CaptionError>;
