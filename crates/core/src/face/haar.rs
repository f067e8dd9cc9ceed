//! Haar-cascade face, smile and eye detection on OpenCV.
//!
//! Loads the stock `haarcascade_frontalface_default.xml`, `haarcascade_smile.xml`
//! and `haarcascade_eye.xml` from one directory. Smiles and eyes are searched
//! inside the first detected face only.

use crate::face::{FaceDetector, FaceError, FaceFeatures, Region};
use opencv::core::{Mat, Rect, Size, Vector};
use opencv::imgcodecs::{self, IMREAD_COLOR};
use opencv::imgproc::{self, COLOR_BGR2GRAY};
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;
use std::path::Path;
use std::sync::Mutex;

const LOG_TARGET: &str = "face";

const FACE_CASCADE_FILE: &str = "haarcascade_frontalface_default.xml";
const SMILE_CASCADE_FILE: &str = "haarcascade_smile.xml";
const EYE_CASCADE_FILE: &str = "haarcascade_eye.xml";

#[derive(Clone, Copy, Debug)]
struct ScanParams {
    scale_factor: f64,
    min_neighbors: i32,
}

const FACE_SCAN: ScanParams = ScanParams {
    scale_factor: 1.2,
    min_neighbors: 4,
};
// high neighbour count keeps open mouths from reading as smiles
const SMILE_SCAN: ScanParams = ScanParams {
    scale_factor: 1.7,
    min_neighbors: 18,
};
const EYE_SCAN: ScanParams = ScanParams {
    scale_factor: 1.2,
    min_neighbors: 4,
};

struct Cascade {
    // detect_multi_scale needs &mut
    classifier: Mutex<CascadeClassifier>,
    params: ScanParams,
}

impl Cascade {
    fn load(path: &Path, params: ScanParams) -> Result<Self, FaceError> {
        let name = path
            .to_str()
            .ok_or_else(|| FaceError::Detector(format!("non-utf8 cascade path {}", path.display())))?;
        let classifier = CascadeClassifier::new(name).map_err(detector_error)?;
        if classifier.empty().map_err(detector_error)? {
            return Err(FaceError::Detector(format!(
                "cascade {} is missing or invalid",
                path.display()
            )));
        }
        Ok(Self {
            classifier: Mutex::new(classifier),
            params,
        })
    }

    fn scan(&self, gray: &Mat) -> Result<Vector<Rect>, FaceError> {
        let mut found = Vector::<Rect>::new();
        let mut classifier = self
            .classifier
            .lock()
            .map_err(|_| FaceError::Detector("cascade lock poisoned".to_owned()))?;
        classifier
            .detect_multi_scale(
                gray,
                &mut found,
                self.params.scale_factor,
                self.params.min_neighbors,
                0,
                Size::default(),
                Size::default(),
            )
            .map_err(detector_error)?;
        Ok(found)
    }
}

/// [`FaceDetector`] backed by OpenCV's stock Haar cascades.
pub struct HaarCascadeDetector {
    face: Cascade,
    smile: Cascade,
    eye: Cascade,
}

impl HaarCascadeDetector {
    /// Fails when any of the three cascade files cannot be loaded.
    pub fn from_dir(dir: &Path) -> Result<Self, FaceError> {
        let detector = Self {
            face: Cascade::load(&dir.join(FACE_CASCADE_FILE), FACE_SCAN)?,
            smile: Cascade::load(&dir.join(SMILE_CASCADE_FILE), SMILE_SCAN)?,
            eye: Cascade::load(&dir.join(EYE_CASCADE_FILE), EYE_SCAN)?,
        };
        tracing::info!(target: LOG_TARGET, dir = %dir.display(), "haar cascades loaded");
        Ok(detector)
    }
}

impl FaceDetector for HaarCascadeDetector {
    fn detect(&self, image: &[u8]) -> Result<Option<FaceFeatures>, FaceError> {
        let encoded = Vector::<u8>::from_slice(image);
        let decoded =
            imgcodecs::imdecode(&encoded, IMREAD_COLOR).map_err(|e| FaceError::Decode(e.to_string()))?;
        if decoded.empty() {
            return Err(FaceError::Decode("unrecognized image format".to_owned()));
        }

        let mut gray = Mat::default();
        imgproc::cvt_color_def(&decoded, &mut gray, COLOR_BGR2GRAY).map_err(detector_error)?;

        let faces = self.face.scan(&gray)?;
        tracing::debug!(
            target: LOG_TARGET,
            faces = faces.len(),
            rows = gray.rows(),
            cols = gray.cols(),
            "faces scanned"
        );
        let Some(face) = faces.iter().next() else {
            return Ok(None);
        };

        let face_gray = Mat::roi(&gray, face)
            .and_then(|roi| roi.try_clone())
            .map_err(detector_error)?;
        let smiles = self.smile.scan(&face_gray)?;
        let eyes = self.eye.scan(&face_gray)?;

        Ok(Some(FaceFeatures {
            face: to_region(face),
            smiles: smiles.iter().map(to_region).collect(),
            eyes: eyes.iter().map(to_region).collect(),
        }))
    }
}

fn detector_error(e: opencv::Error) -> FaceError {
    FaceError::Detector(e.to_string())
}

fn to_region(rect: Rect) -> Region {
    let clamp = |v: i32| u32::try_from(v).unwrap_or(0);
    Region::new(clamp(rect.x), clamp(rect.y), clamp(rect.width), clamp(rect.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CASCADE_DIR;
    use opencv::core::{Scalar, CV_8UC3};

    fn installed_detector() -> Option<HaarCascadeDetector> {
        HaarCascadeDetector::from_dir(Path::new(DEFAULT_CASCADE_DIR)).ok()
    }

    fn blank_png() -> Vec<u8> {
        let image =
            Mat::new_rows_cols_with_default(120, 160, CV_8UC3, Scalar::all(0.0)).expect("mat");
        let mut buf = Vector::<u8>::new();
        imgcodecs::imencode(".png", &image, &mut buf, &Vector::new()).expect("encode");
        buf.to_vec()
    }

    #[test]
    fn negative_rect_fields_clamp_to_zero() {
        assert_eq!(to_region(Rect::new(-3, 4, 10, -1)), Region::new(0, 4, 10, 0));
    }

    #[test]
    fn missing_cascades_are_detector_errors() {
        let err = HaarCascadeDetector::from_dir(Path::new("/nonexistent/cascades"))
            .err()
            .expect("missing dir");
        assert!(matches!(err, FaceError::Detector(_)));
    }

    #[test]
    fn undecodable_bytes_are_decode_errors() {
        let Some(detector) = installed_detector() else {
            return;
        };
        let err = detector.detect(b"not really a png").expect_err("garbage");
        assert!(matches!(err, FaceError::Decode(_)));
    }

    #[test]
    fn blank_frame_has_no_face() {
        let Some(detector) = installed_detector() else {
            return;
        };
        assert_eq!(detector.detect(&blank_png()).expect("decodes"), None);
    }
}
