//! Configuration types for HTML-to-block conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The defaults reproduce the plain
//! converter exactly: literal run contents, every closed block emitted, and a
//! generous nesting cap.

use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use std::fmt;

/// Default cap on the scope stack depth.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Configuration for a conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use canvas2notion::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .max_depth(128)
///     .collapse_whitespace(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Maximum number of simultaneously open tag scopes. Default: 512.
    ///
    /// Start tags beyond the cap are not pushed; the overflowing region is
    /// treated like unsupported content (one fallback callout, text dropped).
    pub max_depth: usize,

    /// Collapse runs of HTML whitespace inside each text run to one space. Default: false.
    ///
    /// Canvas markup is pretty-printed, so text nodes often carry newlines and
    /// indentation a browser would never render. Left off, run contents are
    /// the literal character data of each text event.
    pub collapse_whitespace: bool,

    /// Remove text-bearing blocks that hold no visible text. Default: false.
    pub drop_empty_blocks: bool,

    /// Number of documents converted in parallel by the batch APIs. Default: 8.
    pub concurrency: usize,

    /// Download timeout for URL inputs in seconds. Default: 30.
    pub download_timeout_secs: u64,

    /// Optional per-document progress callback for batch conversions.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            collapse_whitespace: false,
            drop_empty_blocks: false,
            concurrency: 8,
            download_timeout_secs: 30,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("max_depth", &self.max_depth)
            .field("collapse_whitespace", &self.collapse_whitespace)
            .field("drop_empty_blocks", &self.drop_empty_blocks)
            .field("concurrency", &self.concurrency)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    pub fn collapse_whitespace(mut self, v: bool) -> Self {
        self.config.collapse_whitespace = v;
        self
    }

    pub fn drop_empty_blocks(mut self, v: bool) -> Self {
        self.config.drop_empty_blocks = v;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let c = &self.config;
        if c.max_depth == 0 {
            return Err(ConvertError::InvalidConfig(
                "max_depth must be ≥ 1".into(),
            ));
        }
        if c.download_timeout_secs == 0 {
            return Err(ConvertError::InvalidConfig(
                "download timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}
