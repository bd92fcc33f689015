use std::fmt;

use crate::error::DriftError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefusalCode {
    BadInput,
    Io,
    Tool,
    Timeout,
    BadReport,
    Network,
}

impl RefusalCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BadInput => "E_BAD_INPUT",
            Self::Io => "E_IO",
            Self::Tool => "E_TOOL",
            Self::Timeout => "E_TIMEOUT",
            Self::BadReport => "E_BAD_REPORT",
            Self::Network => "E_NETWORK",
        }
    }

    pub fn default_message(self) -> &'static str {
        match self {
            Self::BadInput => "Payload or arguments are not usable",
            Self::Io => "Cannot stage or read the response payload",
            Self::Tool => "Drift tool could not be run",
            Self::Timeout => "Drift tool did not finish in time",
            Self::BadReport => "Drift tool printed a report that is not a JSON object",
            Self::Network => "Cannot fetch the API response",
        }
    }

    pub fn for_error(error: &DriftError) -> Self {
        match error {
            DriftError::EmptyKey | DriftError::BadInput { .. } | DriftError::Serialize(_) => {
                Self::BadInput
            }
            DriftError::TempFile { .. } | DriftError::Wait { .. } | DriftError::ReadPayload { .. } => {
                Self::Io
            }
            DriftError::Spawn { .. } | DriftError::Terminated { .. } => Self::Tool,
            DriftError::Timeout { .. } => Self::Timeout,
            DriftError::MalformedReport { .. } => Self::BadReport,
            DriftError::Network { .. } | DriftError::UnexpectedStatus { .. } => Self::Network,
        }
    }
}

impl fmt::Display for RefusalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
