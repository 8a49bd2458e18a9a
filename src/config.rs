/// Settings shared by every transform
#[derive(Debug, Clone)]
pub struct TransformConfig {
    /// Separator joining key-path segments when flattening and unnesting
    pub separator: String,

    /// Field delimiter for delimited text; `None` keeps the transform's own default
    pub delimiter: Option<u8>,

    /// Number of rows handed to an output sink at a time
    pub batch_size: usize,

    /// Number of leading rows scanned when inferring column types
    pub infer_schema_length: usize,

    /// Whether to draw progress bars on stderr
    pub show_progress: bool,
}

impl TransformConfig {
    /// The configured delimiter, or `default` when none was given
    pub fn delimiter_or(&self, default: u8) -> u8 {
        self.delimiter.unwrap_or(default)
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        TransformConfig {
            separator: String::from("."),
            delimiter: None,
            batch_size: 10_000,
            infer_schema_length: 100_000,
            show_progress: true,
        }
    }
}
