use crate::error::ServiceError;

/// Text recognized from a preprocessed plate raster
#[derive(Debug, Clone)]
pub struct Recognition {
    pub text: String,
    pub confidence: f32,
    pub warnings: Vec<String>,
}

/// Trait that all plate recognizers must implement.
///
/// Recognizers receive the PNG payload produced by the preprocessing
/// pipeline and know nothing about how it was made.
pub trait PlateRecognizer: Send + Sync {
    /// Returns the engine identifier (e.g., "ocrs")
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of the engine
    fn description(&self) -> &'static str;

    /// Recognize text in an encoded raster
    fn recognize(&self, png: &[u8], language_hints: &[String])
        -> Result<Recognition, ServiceError>;

    /// Get supported languages
    fn supported_languages(&self) -> Vec<String>;
}

/// Reduce raw OCR output to a plate number candidate.
///
/// Keeps ASCII digits, Latin letters (upper-cased) and Hangul syllables;
/// whitespace and punctuation picked up from bolts or frames are dropped.
pub fn plate_number(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric() || is_hangul_syllable(*c))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn is_hangul_syllable(c: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

/// Split a comma-separated `languages` form field into hints
pub fn parse_language_hints(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(|lang| lang.trim().to_lowercase())
            .filter(|lang| !lang.is_empty())
            .collect()
    })
    .unwrap_or_default()
}
