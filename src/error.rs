use std::fmt;

#[derive(Debug)]
pub enum ScanError {
    Request(String),
    NonJsonResponse(String),
    Parse(String),
    DataUnavailable { symbol: String, reason: String },
    Config(String),
}

impl ScanError {
    pub fn unavailable(symbol: &str, reason: impl Into<String>) -> Self {
        ScanError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScanError::Request(msg) => write!(f, "Request error: {}", msg),
            ScanError::NonJsonResponse(preview) => write!(f, "Non-JSON response: {}", preview),
            ScanError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ScanError::DataUnavailable { symbol, reason } => {
                write!(f, "Data unavailable for {}: {}", symbol, reason)
            }
            ScanError::Config(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ScanError {}

impl From<reqwest::Error> for ScanError {
    fn from(err: reqwest::Error) -> Self {
        ScanError::Request(err.to_string())
    }
}

impl From<serde_json::Error> for ScanError {
    fn from(err: serde_json::Error) -> Self {
        ScanError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_data_unavailable() {
        let err = ScanError::unavailable("PLTR", "empty price history");
        assert_eq!(err.to_string(), "Data unavailable for PLTR: empty price history");
    }

    #[test]
    fn test_from_serde_error() {
        let err: ScanError = serde_json::from_str::<Vec<f64>>("{").unwrap_err().into();
        assert!(matches!(err, ScanError::Parse(_)));
    }
}
