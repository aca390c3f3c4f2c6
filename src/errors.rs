use thiserror::Error;

/// Why a single hash could not be resolved to an app-data document.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("request for {hash} failed: {source}")]
    Network {
        hash: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("app data lookup for {hash} returned status {status}")]
    Status { hash: String, status: u16 },

    #[error("response envelope for {hash} is not valid JSON: {source}")]
    EnvelopeParse {
        hash: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("fullAppData for {hash} is not a valid app data document: {source}")]
    DocumentParse {
        hash: String,
        #[source]
        source: serde_json::Error,
    },
}

impl EnrichError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network { .. } => FailureKind::Network,
            Self::Status { .. } => FailureKind::Status,
            Self::EnvelopeParse { .. } => FailureKind::EnvelopeParse,
            Self::DocumentParse { .. } => FailureKind::DocumentParse,
        }
    }
}

/// Warehouse rejected a row.
#[derive(Debug, Error)]
#[error("insert of {app_hash} into {table} failed: {reason}")]
pub struct LoadError {
    pub app_hash: String,
    pub table: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Network,
    Status,
    EnvelopeParse,
    DocumentParse,
    Insert,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Network => "network",
            FailureKind::Status => "status",
            FailureKind::EnvelopeParse => "envelope_parse",
            FailureKind::DocumentParse => "document_parse",
            FailureKind::Insert => "insert",
        }
    }
}
