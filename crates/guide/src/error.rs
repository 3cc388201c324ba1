#[derive(Debug)]
pub enum GuideError {
    MissingApiKey,
    Http { status: u16, body: String },
    Transport(String),
    Decode(String),
    /// Error object returned inside an otherwise successful response.
    Api(String),
    InvalidDataset(String),
    Cancelled,
}

impl std::fmt::Display for GuideError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuideError::MissingApiKey => write!(f, "LLM_API_KEY is not set"),
            GuideError::Http { status, body } => {
                write!(f, "model API returned HTTP {status}: {body}")
            }
            GuideError::Transport(e) => write!(f, "model API request failed: {e}"),
            GuideError::Decode(e) => write!(f, "failed to decode model response: {e}"),
            GuideError::Api(e) => write!(f, "model API error: {e}"),
            GuideError::InvalidDataset(e) => write!(f, "invalid bar race dataset: {e}"),
            GuideError::Cancelled => write!(f, "stream cancelled"),
        }
    }
}

impl std::error::Error for GuideError {}

impl From<reqwest::Error> for GuideError {
    fn from(e: reqwest::Error) -> Self {
        GuideError::Transport(e.to_string())
    }
}
