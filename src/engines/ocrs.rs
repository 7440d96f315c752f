//! OCRS recognizer implementation
//!
//! Pure Rust OCR engine using the ocrs library. No system dependencies required.
//! Downloads neural network models automatically on first use.

use crate::config::Config;
use crate::engine::{plate_number, PlateRecognizer, Recognition};
use crate::error::ServiceError;
use ocrs::{DecodeMethod, ImageSource, OcrEngine as OcrsOcrEngine, OcrEngineParams};
use rten::Model;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default model URLs from the ocrs project
const DETECTION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-detection.rten";
const RECOGNITION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-recognition.rten";

/// Cache subdirectory used when no model directory is configured
const CACHE_DIR_NAME: &str = "plate-preprocess-server";

/// Languages the ocrs models can read
const SUPPORTED_LANGUAGES: &[&str] = &["eng"];

/// Plate recognizer wrapping the ocrs library
pub struct OcrsRecognizer {
    engine: OcrsOcrEngine,
}

impl OcrsRecognizer {
    /// Create a new recognizer, downloading models if needed
    pub fn new(config: &Config) -> Result<Self, ServiceError> {
        let model_dir = match &config.model_dir {
            Some(dir) => dir.clone(),
            None => dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(CACHE_DIR_NAME),
        };

        let detection_model_path =
            ensure_model_downloaded(&model_dir, DETECTION_MODEL_URL, "text-detection.rten")?;
        let recognition_model_path =
            ensure_model_downloaded(&model_dir, RECOGNITION_MODEL_URL, "text-recognition.rten")?;

        let detection_model = Model::load_file(&detection_model_path).map_err(|e| {
            ServiceError::InitializationError(format!("Failed to load detection model: {}", e))
        })?;
        let recognition_model = Model::load_file(&recognition_model_path).map_err(|e| {
            ServiceError::InitializationError(format!("Failed to load recognition model: {}", e))
        })?;

        let engine = OcrsOcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            decode_method: DecodeMethod::Greedy,
            ..Default::default()
        })
        .map_err(|e| {
            ServiceError::InitializationError(format!("Failed to create OCR engine: {}", e))
        })?;

        tracing::info!("ocrs engine initialized successfully");

        Ok(Self { engine })
    }
}

impl PlateRecognizer for OcrsRecognizer {
    fn name(&self) -> &'static str {
        "ocrs"
    }

    fn description(&self) -> &'static str {
        "Pure Rust OCR engine - Latin letters and digits, no system dependencies"
    }

    fn recognize(&self, png: &[u8], language_hints: &[String]) -> Result<Recognition, ServiceError> {
        let mut warnings = Vec::new();
        for hint in language_hints {
            if !SUPPORTED_LANGUAGES.contains(&hint.as_str()) {
                warnings.push(format!(
                    "Language '{}' is not supported by ocrs, reading Latin characters only",
                    hint
                ));
            }
        }

        let rgb_img = image::load_from_memory(png)
            .map_err(|e| ServiceError::RecognitionError(format!("Failed to load image: {}", e)))?
            .into_rgb8();
        let dimensions = rgb_img.dimensions();

        let img_source = ImageSource::from_bytes(rgb_img.as_raw(), dimensions).map_err(|e| {
            ServiceError::RecognitionError(format!("Failed to create image source: {}", e))
        })?;

        let ocr_input = self.engine.prepare_input(img_source).map_err(|e| {
            ServiceError::RecognitionError(format!("Failed to prepare input: {}", e))
        })?;

        let word_rects = self.engine.detect_words(&ocr_input).map_err(|e| {
            ServiceError::RecognitionError(format!("Failed to detect words: {}", e))
        })?;

        let line_rects = self.engine.find_text_lines(&ocr_input, &word_rects);

        let line_texts = self
            .engine
            .recognize_text(&ocr_input, &line_rects)
            .map_err(|e| {
                ServiceError::RecognitionError(format!("Failed to recognize text: {}", e))
            })?;

        let text: String = line_texts
            .iter()
            .filter_map(|line| line.as_ref())
            .map(|line| {
                line.words()
                    .map(|word| word.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n");

        let confidence = calculate_confidence(&text);
        if confidence < 0.5 {
            warnings.push("Recognized text does not look like a plate number".to_string());
        }

        Ok(Recognition {
            text,
            confidence,
            warnings,
        })
    }

    fn supported_languages(&self) -> Vec<String> {
        SUPPORTED_LANGUAGES.iter().map(|s| s.to_string()).collect()
    }
}

// ============================================================================
// Confidence scoring heuristics
// ============================================================================

/// Calculate confidence that `text` is a correctly read plate.
///
/// ocrs doesn't provide per-character confidence scores, so the recognized
/// text is checked against the shape of a plate number instead.
fn calculate_confidence(text: &str) -> f32 {
    let plate = plate_number(text);
    if plate.is_empty() {
        return 0.0;
    }

    let length_score = analyze_length(&plate);
    let digit_score = analyze_digit_ratio(&plate);
    let noise_score = analyze_noise(text, &plate);
    let repetition_score = detect_repetition(&plate);

    let confidence =
        0.35 * length_score + 0.30 * digit_score + 0.20 * noise_score + 0.15 * repetition_score;

    confidence.clamp(0.0, 1.0)
}

/// Plates carry 7 to 9 characters ("12가3456", "123가4567", or 7-8 digits
/// when the Hangul syllable is not read).
fn analyze_length(plate: &str) -> f32 {
    match plate.chars().count() {
        7..=9 => 1.0,
        5..=6 | 10 => 0.6,
        _ => 0.3,
    }
}

/// Plates are mostly digits; letter-heavy output suggests surrounding text
fn analyze_digit_ratio(plate: &str) -> f32 {
    let total = plate.chars().count();
    if total == 0 {
        return 0.0;
    }
    let digits = plate.chars().filter(|c| c.is_ascii_digit()).count();
    (digits as f32 / total as f32 / 0.6).min(1.0)
}

/// Share of non-whitespace characters that survived plate cleanup
fn analyze_noise(text: &str, plate: &str) -> f32 {
    let visible = text.chars().filter(|c| !c.is_whitespace()).count();
    if visible == 0 {
        return 0.0;
    }
    plate.chars().count() as f32 / visible as f32
}

/// Detect repeated character sequences.
///
/// Long runs like "1111" usually come from plate frames or bolts.
fn detect_repetition(text: &str) -> f32 {
    let mut max_repeat = 1;
    let mut current = 1;
    let mut prev: Option<char> = None;

    for c in text.chars() {
        if Some(c) == prev {
            current += 1;
            max_repeat = max_repeat.max(current);
        } else {
            current = 1;
        }
        prev = Some(c);
    }

    match max_repeat {
        1..=3 => 1.0,
        4..=5 => 0.7,
        _ => 0.3,
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Ensure model is downloaded and return its path
fn ensure_model_downloaded(dir: &Path, url: &str, filename: &str) -> Result<PathBuf, ServiceError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        ServiceError::InitializationError(format!("Failed to create model directory: {}", e))
    })?;

    let model_path = dir.join(filename);

    if !model_path.exists() {
        tracing::info!("Downloading {} (this may take a moment)...", filename);
        download_file(url, &model_path)?;
        tracing::info!("Downloaded {} to {:?}", filename, model_path);
    } else {
        tracing::info!("Using cached model from {:?}", model_path);
    }

    Ok(model_path)
}

/// Download a file from URL to path using ureq
fn download_file(url: &str, path: &Path) -> Result<(), ServiceError> {
    let response = ureq::get(url).call().map_err(|e| {
        ServiceError::InitializationError(format!("Failed to download model: {}", e))
    })?;

    let buffer = response.into_body().read_to_vec().map_err(|e| {
        ServiceError::InitializationError(format!("Failed to read response body: {}", e))
    })?;

    // Write next to the target and rename, so an interrupted download
    // never leaves a truncated model that looks cached
    let partial = path.with_extension("part");
    let mut file = File::create(&partial).map_err(|e| {
        ServiceError::InitializationError(format!("Failed to create model file: {}", e))
    })?;
    file.write_all(&buffer).map_err(|e| {
        ServiceError::InitializationError(format!("Failed to write model file: {}", e))
    })?;
    std::fs::rename(&partial, path).map_err(|e| {
        ServiceError::InitializationError(format!("Failed to move model into place: {}", e))
    })?;

    Ok(())
}
