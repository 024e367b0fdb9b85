//! Analysis orchestration
//!
//! [`SkinAnalyzer`] runs calibration and skin tone estimation once, then the
//! requested condition pipelines over the same pixel buffer. Each call owns
//! its buffers and arenas; an analyzer can be shared between threads when
//! its detector is.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::analysis::{
    AcneAnalysis, AcneAnalyzer, PigmentationAnalysis, PigmentationAnalyzer, WrinkleAnalysis,
    WrinkleAnalyzer,
};
use crate::calibration::{
    CalibrationData, CalibrationInput, CalibrationService, SkinTone, SkinToneEstimator,
};
use crate::color::SkinToneProfile;
use crate::config::AnalysisConfig;
use crate::detection::{request_boxes, LesionBoxSource, RoughBox};
use crate::error::Result;
use crate::image_loader::PixelBuffer;

/// Which conditions to analyse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Acne,
    Pigmentation,
    Wrinkles,
    #[default]
    Full,
}

impl AnalysisKind {
    pub fn includes_acne(self) -> bool {
        matches!(self, AnalysisKind::Acne | AnalysisKind::Full)
    }

    pub fn includes_pigmentation(self) -> bool {
        matches!(self, AnalysisKind::Pigmentation | AnalysisKind::Full)
    }

    pub fn includes_wrinkles(self) -> bool {
        matches!(self, AnalysisKind::Wrinkles | AnalysisKind::Full)
    }
}

/// One analysis request
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisInput {
    pub image: PixelBuffer,
    pub calibration: CalibrationInput,
    /// Caller-supplied baseline; estimated from the frame centre when absent
    pub skin_tone: Option<SkinTone>,
    /// Rough boxes already produced by an external detector
    pub external_boxes: Vec<RoughBox>,
    pub kind: AnalysisKind,
}

impl AnalysisInput {
    /// Full analysis of `image` with heuristic calibration
    pub fn new(image: PixelBuffer) -> Self {
        Self {
            image,
            calibration: CalibrationInput::default(),
            skin_tone: None,
            external_boxes: Vec::new(),
            kind: AnalysisKind::Full,
        }
    }

    /// Validate and wrap a raw RGBA buffer
    ///
    /// # Errors
    ///
    /// [`AnalysisError::DimensionMismatch`](crate::AnalysisError::DimensionMismatch)
    /// when `data.len() != width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        Ok(Self::new(PixelBuffer::new(width, height, data)?))
    }

    pub fn with_calibration(mut self, calibration: CalibrationInput) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn with_skin_tone(mut self, tone: SkinTone) -> Self {
        self.skin_tone = Some(tone);
        self
    }

    pub fn with_boxes(mut self, boxes: Vec<RoughBox>) -> Self {
        self.external_boxes = boxes;
        self
    }

    pub fn with_kind(mut self, kind: AnalysisKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Result of one analysis; skipped conditions are `None`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub kind: AnalysisKind,
    pub calibration: CalibrationData,
    pub skin_tone: SkinToneProfile,
    pub acne: Option<AcneAnalysis>,
    pub pigmentation: Option<PigmentationAnalysis>,
    pub wrinkles: Option<WrinkleAnalysis>,
}

/// Skin analysis engine
pub struct SkinAnalyzer {
    config: AnalysisConfig,
    calibration: CalibrationService,
    tone_estimator: SkinToneEstimator,
    detector: Option<Box<dyn LesionBoxSource + Send + Sync>>,
}

impl Default for SkinAnalyzer {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl SkinAnalyzer {
    /// Create an analyzer
    ///
    /// # Panics
    ///
    /// Panics when `config` fails [`AnalysisConfig::validate`]. A malformed
    /// threshold record is a programming error; use [`SkinAnalyzer::try_new`]
    /// for configurations read at runtime.
    pub fn new(config: AnalysisConfig) -> Self {
        if let Err(e) = config.validate() {
            panic!("invalid analysis configuration: {}", e);
        }
        Self::build(config)
    }

    /// Create an analyzer from a configuration that may be invalid
    ///
    /// # Errors
    ///
    /// The validation error of `config`.
    pub fn try_new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: AnalysisConfig) -> Self {
        Self {
            config,
            calibration: CalibrationService::new(),
            tone_estimator: SkinToneEstimator::new(),
            detector: None,
        }
    }

    /// Attach an external rough-box detector for hybrid acne detection
    pub fn with_detector(mut self, detector: impl LesionBoxSource + Send + Sync + 'static) -> Self {
        self.detector = Some(Box::new(detector));
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyse one photo
    ///
    /// # Errors
    ///
    /// [`AnalysisError::InvalidCalibration`](crate::AnalysisError::InvalidCalibration)
    /// when the reference measurement gives no usable scale. Nothing is
    /// computed in that case.
    pub fn analyze(&self, input: &AnalysisInput) -> Result<AnalysisResult> {
        let image = &input.image;
        let calibration = self.calibration.calibrate(&input.calibration, image.width())?;
        let (tone, estimated) = match input.skin_tone {
            Some(tone) => (tone, false),
            None => (self.tone_estimator.estimate(image), true),
        };

        let acne = input.kind.includes_acne().then(|| {
            let boxes = self.rough_boxes(input);
            AcneAnalyzer::new(&self.config).analyze(image, &calibration, tone, &boxes)
        });
        let pigmentation = input
            .kind
            .includes_pigmentation()
            .then(|| PigmentationAnalyzer::new(&self.config).analyze(image, &calibration, tone));
        let wrinkles = input
            .kind
            .includes_wrinkles()
            .then(|| WrinkleAnalyzer::new(&self.config).analyze(image));

        tracing::info!(
            width = image.width(),
            height = image.height(),
            kind = ?input.kind,
            lesions = acne.as_ref().map(|a| a.metrics.total_count),
            acne = ?acne.as_ref().map(|a| a.metrics.severity),
            pigmentation = ?pigmentation.as_ref().map(|p| p.metrics.severity),
            wrinkles = ?wrinkles.as_ref().map(|w| w.metrics.severity),
            "skin analysis complete"
        );

        Ok(AnalysisResult {
            kind: input.kind,
            calibration,
            skin_tone: SkinToneProfile::new(tone, estimated),
            acne,
            pigmentation,
            wrinkles,
        })
    }

    /// Boxes from the request, else from the attached detector
    ///
    /// Detector failures are logged and yield no boxes.
    fn rough_boxes(&self, input: &AnalysisInput) -> Vec<RoughBox> {
        if !input.external_boxes.is_empty() {
            return input.external_boxes.clone();
        }
        let Some(detector) = self.detector.as_deref() else {
            return Vec::new();
        };
        let timeout = Duration::from_millis(self.config.hybrid.detector_timeout_ms);
        match request_boxes(detector, &input.image, timeout) {
            Ok(boxes) => boxes,
            Err(e) => {
                tracing::debug!(error = %e, "detector unavailable, using local segmentation");
                Vec::new()
            }
        }
    }
}
