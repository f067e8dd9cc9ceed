mod classifier;
mod dummy;
#[cfg(feature = "opencv")]
mod haar;

use serde::{Deserialize, Serialize};

pub use classifier::{classify_features, decode_image_payload, mock_face_analysis, FaceClassifier};
pub use dummy::DummyFaceDetector;
#[cfg(feature = "opencv")]
pub use haar::HaarCascadeDetector;

/// Axis-aligned rectangle in pixels. Smile and eye regions are relative to the
/// face region they were detected in.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Detector output for the primary face in an image.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FaceFeatures {
    pub face: Region,
    pub smiles: Vec<Region>,
    pub eyes: Vec<Region>,
}

#[derive(thiserror::Error, Debug)]
pub enum FaceError {
    #[error("image payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("image could not be decoded: {0}")]
    Decode(String),

    #[error("face detector unavailable")]
    Unavailable,

    #[error("face detector failed: {0}")]
    Detector(String),
}

/// Frontal-face, smile and eye-pair detection over an encoded image.
///
/// Returns `Ok(None)` when no face is present. Implementations are called on a
/// blocking worker thread.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, image: &[u8]) -> Result<Option<FaceFeatures>, FaceError>;
}
