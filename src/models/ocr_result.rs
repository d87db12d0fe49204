use serde::{Deserialize, Serialize};

/// Outcome of one capture + recognition attempt
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OcrSample {
    Valid(u32),
    Invalid,
}

impl OcrSample {
    pub fn value(&self) -> Option<u32> {
        match self {
            OcrSample::Valid(v) => Some(*v),
            OcrSample::Invalid => None,
        }
    }
}

impl From<Option<u32>> for OcrSample {
    fn from(value: Option<u32>) -> Self {
        value.map_or(OcrSample::Invalid, OcrSample::Valid)
    }
}

/// Aggregated reading of one sampling run.
/// `value` is `None` when no sample passed validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OcrResult {
    pub value: Option<u32>,
    pub samples: Vec<OcrSample>,
}

impl OcrResult {
    pub fn is_none(&self) -> bool {
        self.value.is_none()
    }

    /// Number of recognizer calls made
    pub fn attempts(&self) -> usize {
        self.samples.len()
    }

    pub fn valid_values(&self) -> impl Iterator<Item = u32> + '_ {
        self.samples.iter().filter_map(OcrSample::value)
    }
}
