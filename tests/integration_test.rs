//! Integration tests for the complete skin analysis pipeline
//!
//! These tests validate the end-to-end workflow on synthetic faces:
//! - Input validation and calibration
//! - Skin tone estimation and override
//! - Acne detection, classification, filtering and ROI density
//! - Hybrid refinement of external boxes and the local fallback
//! - Pigmentation and wrinkle metrics
//! - Severity boundaries

use palette::Srgb;
use skinquant::analysis::{LesionClassifier, SeverityGrader};
use skinquant::calibration::SkinToneEstimator;
use skinquant::config::{ClassificationConfig, SeverityConfig};
use skinquant::detection::DetectorError;
use skinquant::{
    analyze_skin, AnalysisConfig, AnalysisError, AnalysisInput, AnalysisKind, CalibrationInput,
    DetectionMode, LesionKind, PixelBuffer, ReferenceKind, RoughBox, Severity, SkinAnalyzer,
    SkinTone, StaticBoxes,
};
use std::time::Duration;

const SKIN: Srgb<u8> = Srgb::new(200, 150, 130);
const INFLAMED: Srgb<u8> = Srgb::new(220, 60, 60);

fn face(size: u32) -> PixelBuffer {
    PixelBuffer::filled(size, size, SKIN)
}

fn paint_disc(image: &mut PixelBuffer, cx: i64, cy: i64, r: i64, color: Srgb<u8>) {
    for y in cy - r..=cy + r {
        for x in cx - r..=cx + r {
            if (x - cx).pow(2) + (y - cy).pow(2) <= r * r {
                image.set_rgb(x as u32, y as u32, color);
            }
        }
    }
}

fn paint_rect(image: &mut PixelBuffer, x0: u32, y0: u32, x1: u32, y1: u32, color: Srgb<u8>) {
    for y in y0..y1 {
        for x in x0..x1 {
            image.set_rgb(x, y, color);
        }
    }
}

// ============================================================================
// Input Validation Tests
// ============================================================================

#[test]
fn test_rgba_length_must_match_dimensions() {
    let err = AnalysisInput::from_rgba(20, 10, vec![0; 20 * 10 * 3]).unwrap_err();
    match err {
        AnalysisError::DimensionMismatch {
            expected, actual, ..
        } => {
            assert_eq!(expected, 800);
            assert_eq!(actual, 600);
        }
        other => panic!("Expected DimensionMismatch, got: {:?}", other),
    }
}

#[test]
fn test_zero_reference_measurement_is_rejected() {
    let input = AnalysisInput::new(face(100)).with_calibration(CalibrationInput::with_reference(
        ReferenceKind::Finger,
        20.0,
        0.0,
    ));
    let err = analyze_skin(&input).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidCalibration { .. }));
    assert!(err.is_recoverable());
}

#[test]
fn test_coin_reference_sets_scale() {
    let input = AnalysisInput::new(face(100)).with_calibration(CalibrationInput::with_reference(
        ReferenceKind::Coin,
        25.0,
        100.0,
    ));
    let result = analyze_skin(&input).unwrap();
    assert_eq!(result.calibration.pixels_per_mm, 4.0);
}

// ============================================================================
// Skin Tone Tests
// ============================================================================

#[test]
fn test_no_skin_in_centre_gives_default_tone() {
    let image = PixelBuffer::filled(50, 50, Srgb::new(40, 40, 200));
    assert_eq!(
        SkinToneEstimator::new().estimate(&image),
        SkinTone::new(200.0, 150.0, 130.0)
    );
}

// ============================================================================
// Acne Tests
// ============================================================================

#[test]
fn test_clear_face_has_no_lesions() {
    let result = analyze_skin(&AnalysisInput::new(face(200))).unwrap();
    let acne = result.acne.unwrap();
    assert_eq!(acne.metrics.total_count, 0);
    assert_eq!(acne.metrics.severity, Severity::Mild);
    assert!(acne.rois.iter().all(|r| r.density == 0.0));
}

#[test]
fn test_lesions_on_both_cheeks() {
    let mut image = face(200);
    paint_disc(&mut image, 50, 105, 6, INFLAMED);
    paint_disc(&mut image, 150, 105, 6, INFLAMED);
    let result = analyze_skin(&AnalysisInput::new(image)).unwrap();
    let acne = result.acne.unwrap();

    assert_eq!(acne.metrics.total_count, 2);
    assert_eq!(acne.metrics.inflammatory_count, 2);
    assert_eq!(acne.rois[1].lesion_count, 1);
    assert_eq!(acne.rois[2].lesion_count, 1);
    assert!(acne.metrics.average_density > 0.0);
    assert!(acne.metrics.average_redness > 30.0);

    let ppm = result.calibration.pixels_per_mm;
    for lesion in &acne.lesions {
        assert_eq!(lesion.area_mm2, lesion.area as f64 / (ppm * ppm));
    }
}

#[test]
fn test_many_lesions_raise_severity() {
    let mut image = face(400);
    let mut placed = 0;
    for row in 0..6 {
        for col in 0..8 {
            paint_disc(&mut image, 40 + col * 45, 40 + row * 60, 5, INFLAMED);
            placed += 1;
        }
    }
    assert_eq!(placed, 48);
    let input = AnalysisInput::new(image)
        .with_kind(AnalysisKind::Acne)
        .with_skin_tone(SkinTone::new(200.0, 150.0, 130.0));
    let result = analyze_skin(&input).unwrap();
    assert!(result.pigmentation.is_none());
    let acne = result.acne.unwrap();

    // The false-positive filter keeps at most 30 lesions
    assert_eq!(acne.metrics.total_count, 30);
    assert_eq!(acne.metrics.inflammatory_percent, 100.0);
    assert!(acne.metrics.severity >= Severity::Moderate);
}

#[test]
fn test_analysis_is_repeatable() {
    let mut image = face(200);
    paint_disc(&mut image, 50, 105, 6, INFLAMED);
    paint_disc(&mut image, 140, 60, 4, Srgb::new(60, 45, 40));
    let input = AnalysisInput::new(image);
    let analyzer = SkinAnalyzer::default();
    assert_eq!(analyzer.analyze(&input).unwrap(), analyzer.analyze(&input).unwrap());
}

// ============================================================================
// Hybrid Detection Tests
// ============================================================================

#[test]
fn test_external_boxes_use_hybrid_path() {
    let mut image = face(200);
    paint_disc(&mut image, 50, 105, 6, INFLAMED);
    let input = AnalysisInput::new(image).with_boxes(vec![RoughBox::from_center(
        50.0, 105.0, 14.0, 14.0, 0.9, "papule",
    )]);
    let acne = analyze_skin(&input).unwrap().acne.unwrap();
    assert_eq!(acne.detection_mode, DetectionMode::Hybrid);
    assert_eq!(acne.metrics.total_count, 1);
}

#[test]
fn test_low_confidence_boxes_fall_back() {
    let mut image = face(200);
    paint_disc(&mut image, 50, 105, 6, INFLAMED);
    let input = AnalysisInput::new(image).with_boxes(vec![RoughBox::from_center(
        50.0, 105.0, 14.0, 14.0, 0.2, "papule",
    )]);
    let acne = analyze_skin(&input).unwrap().acne.unwrap();
    assert_eq!(acne.detection_mode, DetectionMode::LocalOnly);
    assert_eq!(acne.metrics.total_count, 1);
}

#[test]
fn test_detector_timeout_falls_back() {
    let mut image = face(200);
    paint_disc(&mut image, 50, 105, 6, INFLAMED);
    let analyzer = SkinAnalyzer::default().with_detector(
        |_: &PixelBuffer, limit: Duration| -> Result<Vec<RoughBox>, DetectorError> {
            Err(DetectorError::Timeout {
                elapsed_ms: limit.as_millis() as u64 + 1,
                limit_ms: limit.as_millis() as u64,
            })
        },
    );
    let acne = analyzer.analyze(&AnalysisInput::new(image)).unwrap().acne.unwrap();
    assert_eq!(acne.detection_mode, DetectionMode::LocalOnly);
    assert_eq!(acne.metrics.total_count, 1);
}

#[test]
fn test_request_boxes_take_precedence_over_detector() {
    let mut image = face(200);
    paint_disc(&mut image, 50, 105, 6, INFLAMED);
    let analyzer = SkinAnalyzer::default().with_detector(StaticBoxes(vec![RoughBox::from_center(
        50.0, 105.0, 14.0, 14.0, 0.1, "papule",
    )]));
    let input = AnalysisInput::new(image).with_boxes(vec![RoughBox::from_center(
        50.0, 105.0, 14.0, 14.0, 0.95, "pustule",
    )]);
    let acne = analyzer.analyze(&input).unwrap().acne.unwrap();
    assert_eq!(acne.detection_mode, DetectionMode::Hybrid);
}

// ============================================================================
// Pigmentation and Wrinkle Tests
// ============================================================================

#[test]
fn test_brown_patch_is_moderate_pigmentation() {
    let mut image = face(200);
    paint_rect(&mut image, 20, 150, 40, 170, Srgb::new(150, 110, 80));
    let input = AnalysisInput::new(image).with_kind(AnalysisKind::Pigmentation);
    let pig = analyze_skin(&input).unwrap().pigmentation.unwrap();
    assert_eq!(pig.metrics.spot_count, 1);
    assert!(pig.metrics.avg_intensity_diff > 20.0);
    assert_eq!(pig.metrics.severity, Severity::Moderate);
    assert!(pig.metrics.shi > 0.02);
}

#[test]
fn test_large_dark_area_is_severe_pigmentation() {
    let mut image = face(100);
    // Skin tone supplied: the centre is covered by the patch
    paint_rect(&mut image, 5, 5, 95, 95, Srgb::new(120, 90, 60));
    let input = AnalysisInput::new(image)
        .with_kind(AnalysisKind::Pigmentation)
        .with_skin_tone(SkinTone::new(200.0, 150.0, 130.0));
    let pig = analyze_skin(&input).unwrap().pigmentation.unwrap();
    assert!(pig.metrics.pigmented_percent >= 30.0);
    assert_eq!(pig.metrics.severity, Severity::Severe);
}

#[test]
fn test_dark_lines_are_wrinkles() {
    let mut image = face(200);
    for y in [40u32, 60, 80, 120] {
        paint_rect(&mut image, 30, y, 170, y + 1, Srgb::new(90, 60, 50));
    }
    let input = AnalysisInput::new(image).with_kind(AnalysisKind::Wrinkles);
    let wr = analyze_skin(&input).unwrap().wrinkles.unwrap();
    assert!(wr.metrics.count >= 4);
    assert!(wr.metrics.avg_depth > 50.0);
    assert_eq!(wr.metrics.severity, Severity::Severe);
}

// ============================================================================
// Boundary Scenarios
// ============================================================================

#[test]
fn test_grading_boundaries() {
    let config = SeverityConfig::default();
    let grader = SeverityGrader::new(&config);
    assert_eq!(grader.acne(5, 90.0, 0.0, 0), Severity::Mild);
    assert_eq!(grader.pigmentation(32.0, 10.0), Severity::Severe);
    assert_eq!(grader.wrinkles(6.0, 10.0, 10.0), Severity::Moderate);
}

#[test]
fn test_classification_boundaries() {
    let config = ClassificationConfig::default();
    let classifier = LesionClassifier::new(&config);
    assert_eq!(classifier.kind(2.0, 0.7, 160.0), LesionKind::Pustule);
    assert_eq!(classifier.kind(6.0, 0.9, 200.0), LesionKind::Nodule);
}

#[test]
fn test_config_round_trip_through_json() {
    let config = AnalysisConfig::default();
    let json = serde_json::to_string_pretty(&config).unwrap();
    let parsed = AnalysisConfig::from_json_str(&json).unwrap();
    assert_eq!(parsed.hybrid.max_regions_per_box, 3);
    assert_eq!(parsed.segmentation.border_margin, 5);
}
