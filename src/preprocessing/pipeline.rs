use crate::error::PreprocessError;
use crate::preprocessing::raster::{RasterBuffer, Region};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::steps;
use super::steps::select::ScoredCandidate;

/// Per-call stage switches. Grayscale conversion always runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessOptions {
    /// Linear contrast stretch around the midpoint (default: true)
    pub enhance_contrast: bool,
    /// Gaussian blur (default: true)
    pub denoise: bool,
    /// 3x3 high-pass sharpening (default: true)
    pub sharpen: bool,
    /// Crop to the best plate-shaped region, if one is found (default: true)
    pub detect_plate_region: bool,
    /// Resize to the canonical target resolution (default: true)
    pub normalize_size: bool,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            enhance_contrast: true,
            denoise: true,
            sharpen: true,
            detect_plate_region: true,
            normalize_size: true,
        }
    }
}

impl PreprocessOptions {
    /// Every optional stage disabled: decode and grayscale only
    #[allow(dead_code)]
    pub fn none() -> Self {
        Self {
            enhance_contrast: false,
            denoise: false,
            sharpen: false,
            detect_plate_region: false,
            normalize_size: false,
        }
    }

    /// Filtering stages only, leaving geometry untouched
    pub fn filters_only(self) -> Self {
        Self {
            detect_plate_region: false,
            normalize_size: false,
            ..self
        }
    }
}

/// Numeric parameters shared by every pipeline invocation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PipelineParams {
    pub denoise_radius: u32,
    pub contrast_factor: f32,
    pub target_width: u32,
    pub target_height: u32,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            denoise_radius: steps::denoise::DEFAULT_RADIUS,
            contrast_factor: steps::contrast::DEFAULT_FACTOR,
            target_width: steps::normalize::TARGET_WIDTH,
            target_height: steps::normalize::TARGET_HEIGHT,
        }
    }
}

/// Timing information for a single preprocessing step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Result of preprocessing including timing stats
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessingResult {
    /// Preprocessed raster (not serialized)
    #[serde(skip)]
    pub buffer: RasterBuffer,
    /// Region the output was cropped to, when detection succeeded
    pub plate_region: Option<Region>,
    /// Total preprocessing time in milliseconds
    pub total_time_ms: u64,
    /// Options used
    pub options: PreprocessOptions,
    /// Individual step timings
    pub steps: Vec<StepTiming>,
}

/// Outcome of plate detection on a filtered buffer
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    /// Plate-shaped candidates in discovery order
    pub candidates: Vec<ScoredCandidate>,
    /// Winning candidate, if any scored above the trust floor
    pub selected: Option<ScoredCandidate>,
}

/// Preprocessing pipeline: decode, filter, detect, crop, normalize.
///
/// Holds no mutable state, so one instance can serve concurrent callers;
/// each call owns its buffers.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    params: PipelineParams,
}

impl Pipeline {
    pub fn new(params: PipelineParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    /// Decode `bytes` and run the enabled stages.
    ///
    /// Decoding is the only failure; detection problems fall back to the
    /// undetected buffer.
    pub fn preprocess(
        &self,
        bytes: &[u8],
        options: &PreprocessOptions,
    ) -> Result<PreprocessingResult, PreprocessError> {
        let start = Instant::now();
        let decode_start = Instant::now();
        let buffer = RasterBuffer::decode(bytes)?;
        let decode_timing = StepTiming {
            name: "decode".to_string(),
            time_ms: decode_start.elapsed().as_millis() as u64,
        };

        let mut result = self.process(buffer, options);
        result.steps.insert(0, decode_timing);
        result.total_time_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    /// Run the enabled stages on an already decoded buffer
    pub fn process(&self, buffer: RasterBuffer, options: &PreprocessOptions) -> PreprocessingResult {
        let start = Instant::now();
        let mut steps_timing = Vec::new();
        let params = self.params;

        let mut img = self.run_step("grayscale", buffer, &mut steps_timing, steps::grayscale::apply);

        if options.denoise {
            img = self.run_step("denoise", img, &mut steps_timing, |b| {
                steps::denoise::apply(b, params.denoise_radius)
            });
        }

        if options.enhance_contrast {
            img = self.run_step("contrast", img, &mut steps_timing, |b| {
                steps::contrast::apply(b, params.contrast_factor)
            });
        }

        if options.sharpen {
            img = self.run_step("sharpen", img, &mut steps_timing, steps::sharpen::apply);
        }

        let mut plate_region = None;
        if options.detect_plate_region {
            let step_start = Instant::now();
            let (cropped, region) = self.crop_to_plate(img);
            img = cropped;
            plate_region = region;
            steps_timing.push(StepTiming {
                name: "detect".to_string(),
                time_ms: step_start.elapsed().as_millis() as u64,
            });
        }

        if options.normalize_size {
            img = self.run_step("normalize", img, &mut steps_timing, |b| {
                steps::normalize::apply(b, params.target_width, params.target_height)
            });
        }

        PreprocessingResult {
            buffer: img,
            plate_region,
            total_time_ms: start.elapsed().as_millis() as u64,
            options: *options,
            steps: steps_timing,
        }
    }

    /// Find and score plate candidates in a grayscale buffer
    pub fn detect(&self, gray: &RasterBuffer) -> Detection {
        let edges = steps::edges::apply(gray);
        let regions = steps::regions::find_regions(&edges);
        let candidates = steps::select::score_all(&regions);
        let selected = steps::select::select_best(&candidates);

        match &selected {
            Some(best) => tracing::debug!(
                "Selected plate candidate {:?} (score {:.3}) out of {}",
                best.region,
                best.total_score,
                candidates.len()
            ),
            None => tracing::debug!(
                "No trusted plate candidate among {} regions",
                candidates.len()
            ),
        }

        Detection {
            candidates,
            selected,
        }
    }

    /// Crop to the detected plate, or hand the buffer back untouched
    fn crop_to_plate(&self, img: RasterBuffer) -> (RasterBuffer, Option<Region>) {
        let detection = self.detect(&img);
        Self::crop_to_selection(img, &detection)
    }

    fn crop_to_selection(
        img: RasterBuffer,
        detection: &Detection,
    ) -> (RasterBuffer, Option<Region>) {
        let Some(best) = detection.selected else {
            return (img, None);
        };

        match steps::extract::apply(&img, &best.region) {
            Ok(cropped) => (cropped, Some(best.region)),
            Err(e) => {
                tracing::warn!("Plate extraction failed, continuing without crop: {}", e);
                (img, None)
            }
        }
    }

    fn run_step<F>(
        &self,
        name: &str,
        img: RasterBuffer,
        timings: &mut Vec<StepTiming>,
        step_fn: F,
    ) -> RasterBuffer
    where
        F: FnOnce(RasterBuffer) -> RasterBuffer,
    {
        let step_start = Instant::now();
        let result = step_fn(img);
        timings.push(StepTiming {
            name: name.to_string(),
            time_ms: step_start.elapsed().as_millis() as u64,
        });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::raster::CHANNELS;

    fn plate_scene() -> RasterBuffer {
        let mut img = RasterBuffer::filled(800, 600, [0, 0, 0, 255]);
        for y in 250..350 {
            for x in 235..565 {
                img.put_pixel(x, y, [255, 255, 255, 255]);
            }
        }
        img
    }

    fn step_names(result: &PreprocessingResult) -> Vec<&str> {
        result.steps.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_defaults_enable_every_stage() {
        let options = PreprocessOptions::default();
        assert!(options.enhance_contrast);
        assert!(options.denoise);
        assert!(options.sharpen);
        assert!(options.detect_plate_region);
        assert!(options.normalize_size);
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: PreprocessOptions = serde_json::from_str(r#"{"sharpen": false}"#).unwrap();
        assert!(!options.sharpen);
        assert!(options.denoise);
        assert!(options.normalize_size);
    }

    #[test]
    fn test_all_options_off_yields_grayscale_input() {
        let mut img = RasterBuffer::filled(64, 48, [200, 30, 90, 255]);
        img.put_pixel(10, 10, [0, 255, 12, 255]);
        let png = img.encode_png().unwrap();

        let result = Pipeline::default()
            .preprocess(&png, &PreprocessOptions::none())
            .unwrap();

        assert_eq!(result.buffer, steps::grayscale::apply(img));
        assert_eq!(result.buffer.dimensions(), (64, 48));
        assert_eq!(step_names(&result), vec!["decode", "grayscale"]);
        assert_eq!(result.plate_region, None);
    }

    #[test]
    fn test_decode_failure_is_the_hard_error() {
        let err = Pipeline::default()
            .preprocess(b"\x89PNG but not really", &PreprocessOptions::default())
            .unwrap_err();
        assert!(matches!(err, PreprocessError::Decode(_)));
    }

    #[test]
    fn test_detection_scores_plate_rectangle() {
        let gray = steps::grayscale::apply(plate_scene());

        let detection = Pipeline::default().detect(&gray);

        assert_eq!(detection.candidates.len(), 1);
        let best = detection.selected.unwrap();
        assert!(
            (best.total_score - 1.0).abs() < 0.02,
            "Expected ~1.0, got {}",
            best.total_score
        );
    }

    #[test]
    fn test_full_pipeline_crops_and_normalizes() {
        let result = Pipeline::default().process(plate_scene(), &PreprocessOptions::default());

        assert_eq!(result.plate_region, Some(Region::new(234, 249, 332, 102)));
        assert_eq!(result.buffer.dimensions(), (400, 120));
        assert_eq!(
            step_names(&result),
            vec!["grayscale", "denoise", "contrast", "sharpen", "detect", "normalize"]
        );
    }

    #[test]
    fn test_detection_without_normalize_keeps_crop_size() {
        let options = PreprocessOptions {
            normalize_size: false,
            ..PreprocessOptions::default()
        };

        let result = Pipeline::default().process(plate_scene(), &options);

        assert_eq!(result.buffer.dimensions(), (332, 102));
    }

    #[test]
    fn test_no_candidate_falls_back_to_filtered_buffer() {
        let img = RasterBuffer::filled(320, 240, [90, 90, 90, 255]);
        let options = PreprocessOptions {
            normalize_size: false,
            ..PreprocessOptions::default()
        };

        let result = Pipeline::default().process(img, &options);

        assert_eq!(result.plate_region, None);
        assert_eq!(result.buffer.dimensions(), (320, 240));
        assert!(result
            .buffer
            .pixels()
            .chunks(CHANNELS)
            .all(|p| p[0] == p[1] && p[1] == p[2]));
    }

    #[test]
    fn test_custom_target_size() {
        let params = PipelineParams {
            target_width: 200,
            target_height: 60,
            ..PipelineParams::default()
        };
        let result = Pipeline::new(params).process(plate_scene(), &PreprocessOptions::default());
        assert_eq!(result.buffer.dimensions(), (200, 60));
    }

    #[test]
    fn test_out_of_bounds_selection_falls_back_to_input() {
        let img = RasterBuffer::filled(100, 40, [70, 70, 70, 255]);
        // Plate-shaped, but reaches 20 columns past the right edge
        let escaped = Region::new(60, 5, 60, 20);
        assert!(matches!(
            steps::extract::apply(&img, &escaped),
            Err(PreprocessError::RegionOutOfBounds { .. })
        ));

        let selected = steps::select::score(&escaped);
        let detection = Detection {
            candidates: vec![selected],
            selected: Some(selected),
        };

        let (buffer, region) = Pipeline::crop_to_selection(img.clone(), &detection);

        assert_eq!(region, None);
        assert_eq!(buffer, img);
    }

    #[test]
    fn test_in_bounds_selection_is_cropped() {
        let img = RasterBuffer::filled(100, 40, [70, 70, 70, 255]);
        let inside = Region::new(10, 5, 60, 20);
        let selected = steps::select::score(&inside);
        let detection = Detection {
            candidates: vec![selected],
            selected: Some(selected),
        };

        let (buffer, region) = Pipeline::crop_to_selection(img, &detection);

        assert_eq!(region, Some(inside));
        assert_eq!(buffer.dimensions(), (60, 20));
    }
}
