//! Geometry build options.

/// How per-record problems are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Skip bad records and keep going.
    #[default]
    Lenient,
    /// Abort on the first bad record.
    Strict,
}

/// Grouping mode handed to a structural extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupingMode {
    /// The extractor's own grouping
    #[default]
    Default,
    /// Group only what the markup's element ids account for
    Strict,
}

impl GroupingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupingMode::Default => "default",
            GroupingMode::Strict => "strict",
        }
    }
}

/// Options for building geometry from marks.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Language tag attached to every element
    pub language: String,

    /// Left edge of paired regions, in points from the page's left side
    pub margin_left: f64,

    /// Distance of the right edge of paired regions from the page's right side
    pub margin_right: f64,

    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Grouping mode for the structural fallback
    pub grouping: GroupingMode,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            margin_left: 72.0,
            margin_right: 72.0,
            error_mode: ErrorMode::Lenient,
            grouping: GroupingMode::Default,
        }
    }
}

impl BuildOptions {
    /// Create new build options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the element language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the horizontal margins.
    pub fn with_margins(mut self, left: f64, right: f64) -> Self {
        self.margin_left = left;
        self.margin_right = right;
        self
    }

    /// Set the error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Set the structural grouping mode.
    pub fn with_grouping(mut self, grouping: GroupingMode) -> Self {
        self.grouping = grouping;
        self
    }

    /// Use strict error mode.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Use lenient error mode.
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.error_mode == ErrorMode::Strict
    }
}
