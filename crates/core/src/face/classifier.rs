use crate::face::{FaceDetector, FaceError, FaceFeatures, Region};
use crate::mood::{FaceAnalysisResult, MoodLabel};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::Rng;
use std::sync::Arc;

const LOG_TARGET: &str = "face";

const SMILE_MIN_WIDTH_RATIO: f64 = 0.35;
const SMILE_MIN_HEIGHT_RATIO: f64 = 0.12;
const SMILE_MIN_AREA_RATIO: f64 = 0.05;
const EYES_LOW_FACTOR: f64 = 1.1;
const EYES_HIGH_FACTOR: f64 = 0.9;
const WIDE_EYES_AREA_RATIO: f64 = 0.055;

const MOCK_MIN_CONFIDENCE: i64 = 60;
const MOCK_MAX_CONFIDENCE: i64 = 85;

/// Geometric facial-expression heuristics on top of a [`FaceDetector`].
///
/// Classification never fails: decode, detector and worker errors degrade to
/// [`mock_face_analysis`].
#[derive(Clone)]
pub struct FaceClassifier {
    detector: Arc<dyn FaceDetector>,
}

impl FaceClassifier {
    pub fn new(detector: Arc<dyn FaceDetector>) -> Self {
        Self { detector }
    }

    pub fn classify(&self, image_data: &str) -> FaceAnalysisResult {
        match self.try_classify(image_data) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(target: LOG_TARGET, error = %e, "face analysis failed, using mock reading");
                mock_face_analysis()
            }
        }
    }

    /// Runs [`classify`](Self::classify) on the blocking pool.
    pub async fn classify_blocking(&self, image_data: String) -> FaceAnalysisResult {
        let this = self.clone();
        match tokio::task::spawn_blocking(move || this.classify(&image_data)).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(target: LOG_TARGET, error = %e, "face analysis worker aborted, using mock reading");
                mock_face_analysis()
            }
        }
    }

    pub fn try_classify(&self, image_data: &str) -> Result<FaceAnalysisResult, FaceError> {
        let bytes = decode_image_payload(image_data)?;
        match self.detector.detect(&bytes)? {
            Some(features) => Ok(classify_features(&features)),
            None => {
                tracing::debug!(target: LOG_TARGET, "no face detected");
                Ok(FaceAnalysisResult::new(MoodLabel::Neutral, 55))
            }
        }
    }
}

/// Maps detected regions of the primary face to a mood.
pub fn classify_features(features: &FaceFeatures) -> FaceAnalysisResult {
    let face = features.face;
    let face_w = f64::from(face.width.max(1));
    let face_h = f64::from(face.height.max(1));
    let face_area = face.area().max(1) as f64;

    tracing::debug!(
        target: LOG_TARGET,
        smiles = features.smiles.len(),
        eyes = features.eyes.len(),
        face_w = face.width,
        face_h = face.height,
        "face regions"
    );

    if let Some(smile) = features.smiles.first() {
        let w_ratio = f64::from(smile.width) / face_w;
        let h_ratio = f64::from(smile.height) / face_h;
        let area_ratio = smile.area() as f64 / face_area;
        if w_ratio >= SMILE_MIN_WIDTH_RATIO
            && h_ratio >= SMILE_MIN_HEIGHT_RATIO
            && area_ratio >= SMILE_MIN_AREA_RATIO
        {
            return FaceAnalysisResult::new(MoodLabel::Energized, 90);
        }
    }

    if features.eyes.len() >= 2 {
        let avg_eye_y = features.eyes[..2]
            .iter()
            .map(|e| f64::from(e.y))
            .sum::<f64>()
            / 2.0;
        let mid_face_y = f64::from(face.height) / 2.0;

        // lower eyes read as droopy, higher eyes as furrowed
        if avg_eye_y > mid_face_y * EYES_LOW_FACTOR {
            return FaceAnalysisResult::new(MoodLabel::Stressed, 75);
        }
        if avg_eye_y < mid_face_y * EYES_HIGH_FACTOR {
            return FaceAnalysisResult::new(MoodLabel::Stressed, 70);
        }

        let eye_area: u64 = features.eyes.iter().map(Region::area).sum();
        if eye_area as f64 / face_area > WIDE_EYES_AREA_RATIO {
            return FaceAnalysisResult::new(MoodLabel::Focused, 78);
        }
    }

    FaceAnalysisResult::new(MoodLabel::Neutral, 65)
}

/// Strips an optional `data:image/...;base64,` prefix and decodes the payload.
pub fn decode_image_payload(image_data: &str) -> Result<Vec<u8>, FaceError> {
    let payload = if image_data.starts_with("data:image") {
        image_data
            .split_once(',')
            .map(|(_, rest)| rest)
            .ok_or_else(|| FaceError::Decode("data uri has no payload".to_owned()))?
    } else {
        image_data
    };
    // MIME-wrapped payloads carry line breaks
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(compact)?;
    if bytes.is_empty() {
        return Err(FaceError::Decode("empty image".to_owned()));
    }
    Ok(bytes)
}

/// Uniformly random mood with confidence in `60..=85`.
pub fn mock_face_analysis() -> FaceAnalysisResult {
    let mut rng = rand::rng();
    let mood = MoodLabel::ALL[rng.random_range(0..MoodLabel::ALL.len())];
    let confidence = rng.random_range(MOCK_MIN_CONFIDENCE..=MOCK_MAX_CONFIDENCE);
    FaceAnalysisResult::new(mood, confidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::DummyFaceDetector;

    struct FixedDetector(Option<FaceFeatures>);

    impl FaceDetector for FixedDetector {
        fn detect(&self, _image: &[u8]) -> Result<Option<FaceFeatures>, FaceError> {
            Ok(self.0.clone())
        }
    }

    struct PanickyDetector;

    impl FaceDetector for PanickyDetector {
        fn detect(&self, _image: &[u8]) -> Result<Option<FaceFeatures>, FaceError> {
            panic!("detector crashed")
        }
    }

    fn face_with(smiles: Vec<Region>, eyes: Vec<Region>) -> FaceFeatures {
        FaceFeatures {
            face: Region::new(10, 10, 200, 200),
            smiles,
            eyes,
        }
    }

    fn payload() -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(b"not really a png"))
    }

    fn in_mock_range(r: FaceAnalysisResult) -> bool {
        (60..=85).contains(&r.confidence.get())
    }

    #[test]
    fn large_smile_is_energized() {
        let f = face_with(vec![Region::new(50, 140, 80, 30)], vec![]);
        assert_eq!(classify_features(&f), FaceAnalysisResult::new(MoodLabel::Energized, 90));
    }

    #[test]
    fn narrow_smile_does_not_fire() {
        // width ratio 0.30 is below the 0.35 threshold
        let f = face_with(vec![Region::new(50, 140, 60, 40)], vec![]);
        assert_eq!(classify_features(&f), FaceAnalysisResult::new(MoodLabel::Neutral, 65));
    }

    #[test]
    fn low_eyes_are_stressed_75() {
        let f = face_with(vec![], vec![Region::new(40, 120, 20, 20), Region::new(120, 124, 20, 20)]);
        assert_eq!(classify_features(&f), FaceAnalysisResult::new(MoodLabel::Stressed, 75));
    }

    #[test]
    fn high_eyes_are_stressed_70() {
        let f = face_with(vec![], vec![Region::new(40, 50, 20, 20), Region::new(120, 54, 20, 20)]);
        assert_eq!(classify_features(&f), FaceAnalysisResult::new(MoodLabel::Stressed, 70));
    }

    #[test]
    fn wide_centered_eyes_are_focused() {
        // avg y 100 == midline; eye area 2 * 1600 / 40000 = 0.08
        let f = face_with(vec![], vec![Region::new(40, 98, 40, 40), Region::new(120, 102, 40, 40)]);
        assert_eq!(classify_features(&f), FaceAnalysisResult::new(MoodLabel::Focused, 78));
    }

    #[test]
    fn small_centered_eyes_are_neutral() {
        let f = face_with(vec![], vec![Region::new(40, 100, 10, 10), Region::new(120, 100, 10, 10)]);
        assert_eq!(classify_features(&f), FaceAnalysisResult::new(MoodLabel::Neutral, 65));
    }

    #[test]
    fn single_eye_is_neutral() {
        let f = face_with(vec![], vec![Region::new(40, 150, 40, 40)]);
        assert_eq!(classify_features(&f), FaceAnalysisResult::new(MoodLabel::Neutral, 65));
    }

    #[test]
    fn no_face_is_neutral_55() {
        let classifier = FaceClassifier::new(Arc::new(FixedDetector(None)));
        let r = classifier.try_classify(&payload()).expect("decodes");
        assert_eq!(r, FaceAnalysisResult::new(MoodLabel::Neutral, 55));
    }

    #[test]
    fn decode_strips_data_uri_prefix() {
        assert_eq!(decode_image_payload(&payload()).expect("valid"), b"not really a png");
        assert!(decode_image_payload("data:image/png;base64").is_err());
        assert!(decode_image_payload("%%%").is_err());
        assert!(decode_image_payload("").is_err());
    }

    #[test]
    fn decode_accepts_wrapped_base64() {
        let image = vec![b'x'; 100];
        let encoded = STANDARD.encode(&image);
        let wrapped = format!("{}\n{}\r\n", &encoded[..76], &encoded[76..]);
        assert_eq!(decode_image_payload(&wrapped).expect("wrapped"), image);
        assert_eq!(
            decode_image_payload(&format!("data:image/jpeg;base64, {}", wrapped)).expect("wrapped uri"),
            image
        );
    }

    #[test]
    fn failures_fall_back_to_mock() {
        let classifier = FaceClassifier::new(Arc::new(DummyFaceDetector::new()));
        assert!(in_mock_range(classifier.classify(&payload())));

        let classifier = FaceClassifier::new(Arc::new(FixedDetector(None)));
        assert!(in_mock_range(classifier.classify("!!not base64!!")));
    }

    #[tokio::test]
    async fn worker_panic_falls_back_to_mock() {
        let classifier = FaceClassifier::new(Arc::new(PanickyDetector));
        assert!(in_mock_range(classifier.classify_blocking(payload()).await));
    }

    #[test]
    fn mock_stays_in_range() {
        for _ in 0..200 {
            assert!(in_mock_range(mock_face_analysis()));
        }
    }
}
