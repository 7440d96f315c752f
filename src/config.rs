use crate::preprocessing::PipelineParams;
use crate::Args;
use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_file_size: usize,
    pub pipeline: PipelineParams,
    pub ocr_enabled: bool,
    pub model_dir: Option<PathBuf>,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            max_file_size: args.max_file_size,
            pipeline: PipelineParams {
                denoise_radius: args.denoise_radius,
                contrast_factor: args.contrast_factor,
                target_width: args.target_width,
                target_height: args.target_height,
            },
            ocr_enabled: !args.no_ocr,
            model_dir: args.model_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults_match_pipeline_defaults() {
        let args = Args::parse_from(["plate-preprocess-server"]);
        let config = Config::from(args);

        assert_eq!(config.pipeline, PipelineParams::default());
        assert!(config.ocr_enabled);
        assert_eq!(config.port, 9393);
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::parse_from([
            "plate-preprocess-server",
            "--no-ocr",
            "--denoise-radius",
            "2",
            "--target-width",
            "200",
        ]);
        let config = Config::from(args);

        assert!(!config.ocr_enabled);
        assert_eq!(config.pipeline.denoise_radius, 2);
        assert_eq!(config.pipeline.target_width, 200);
        assert_eq!(config.pipeline.target_height, 120);
    }

    #[test]
    fn test_denoise_radius_is_bounded() {
        let result = Args::try_parse_from([
            "plate-preprocess-server",
            "--denoise-radius",
            "5000",
        ]);
        assert!(result.is_err());

        let args = Args::try_parse_from(["plate-preprocess-server", "--denoise-radius", "64"])
            .unwrap();
        assert_eq!(Config::from(args).pipeline.denoise_radius, 64);
    }
}
