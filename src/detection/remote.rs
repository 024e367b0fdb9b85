//! HTTP client for a remote lesion detector service
//!
//! The service takes a base64 PNG and answers with centre-format boxes:
//!
//! ```text
//! POST {base_url}/analyze/yolo
//! { "imageBase64": "data:image/png;base64,...", "width": 640, "height": 480, "confidence": 0.3 }
//! -> { "boxes": [{ "x", "y", "width", "height", "confidence", "classId", "class" }], "model", "count" }
//! ```

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::time::Duration;

use crate::detection::hybrid::{box_label_for_class_id, DetectorError, LesionBoxSource, RoughBox};
use crate::image_loader::PixelBuffer;

/// Blocking client for the detector endpoint
pub struct HttpBoxSource {
    base_url: String,
    client: reqwest::blocking::Client,
    /// Minimum confidence asked of the service
    confidence: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetectRequest<'a> {
    image_base64: &'a str,
    width: u32,
    height: u32,
    confidence: f32,
}

#[derive(Deserialize)]
struct DetectResponse {
    boxes: Vec<CenterBox>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CenterBox {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    confidence: f32,
    #[serde(default)]
    class_id: Option<u32>,
    #[serde(default, rename = "class")]
    label: Option<String>,
}

impl From<CenterBox> for RoughBox {
    fn from(b: CenterBox) -> Self {
        let label = b
            .label
            .unwrap_or_else(|| box_label_for_class_id(b.class_id.unwrap_or(u32::MAX)).to_string());
        RoughBox::from_center(b.x, b.y, b.width, b.height, b.confidence, label)
    }
}

impl HttpBoxSource {
    /// Client for the service rooted at `base_url`
    ///
    /// # Errors
    ///
    /// [`DetectorError::Transport`] when the HTTP client cannot be built.
    pub fn new(base_url: &str, confidence: f32) -> Result<Self, DetectorError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| DetectorError::Transport {
                message: e.to_string(),
            })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            confidence,
        })
    }

    fn encode(image: &PixelBuffer) -> Result<String, DetectorError> {
        let rgba = image.to_rgba_image().ok_or_else(|| DetectorError::Rejected {
            reason: "pixel buffer does not form an image".to_string(),
        })?;
        let mut png = Cursor::new(Vec::new());
        rgba.write_to(&mut png, image::ImageFormat::Png)
            .map_err(|e| DetectorError::Rejected {
                reason: e.to_string(),
            })?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(png.into_inner());
        Ok(format!("data:image/png;base64,{}", encoded))
    }
}

impl LesionBoxSource for HttpBoxSource {
    fn detect(&self, image: &PixelBuffer, timeout: Duration) -> Result<Vec<RoughBox>, DetectorError> {
        let url = format!("{}/analyze/yolo", self.base_url);
        let payload = Self::encode(image)?;
        let body = DetectRequest {
            image_base64: &payload,
            width: image.width(),
            height: image.height(),
            confidence: self.confidence,
        };

        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    DetectorError::Timeout {
                        elapsed_ms: timeout.as_millis() as u64,
                        limit_ms: timeout.as_millis() as u64,
                    }
                } else if e.is_connect() {
                    DetectorError::Unavailable
                } else {
                    DetectorError::Transport {
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(DetectorError::Rejected {
                reason: format!("HTTP {}: {}", status.as_u16(), text),
            });
        }

        let parsed: DetectResponse = response.json().map_err(|e| DetectorError::Transport {
            message: e.to_string(),
        })?;
        tracing::debug!(boxes = parsed.boxes.len(), "remote detector answered");
        Ok(parsed.boxes.into_iter().map(RoughBox::from).collect())
    }
}
