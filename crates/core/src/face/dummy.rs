use crate::face::{FaceDetector, FaceError, FaceFeatures};

/// Stand-in used when the `opencv` feature is off or the cascades cannot be
/// loaded; every call reports [`FaceError::Unavailable`], which puts the
/// classifier in mock mode.
#[derive(Clone, Debug, Default)]
pub struct DummyFaceDetector;

impl DummyFaceDetector {
    pub fn new() -> Self {
        Self
    }
}

impl FaceDetector for DummyFaceDetector {
    fn detect(&self, _image: &[u8]) -> Result<Option<FaceFeatures>, FaceError> {
        Err(FaceError::Unavailable)
    }
}
