//! Sequential generation runs
//!
//! - caption: one request per photograph
//! - enrich: one request per object group, spreadsheet facts in the prompt
//! - catalog: one request per object and language, wide output
//!
//! All runs share `RunContext`: pacing, cancellation, the failure policy
//! (non-fatal error -> fallback row + pause) and the run summary.

pub mod caption;
pub mod catalog;
pub mod enrich;
pub mod pacing;

pub use caption::{run_caption, CAPTION_HEADERS};
pub use catalog::{catalog_headers, collect_catalog_objects, run_catalog, CatalogObject};
pub use enrich::{enrich_headers, prepare_objects, run_enrich};
pub use pacing::{CancelFlag, RateLimiter};

use crate::config::Config;
use crate::error::{CaptionError, Result};
use crate::generator::{CaptionGenerator, ImagePayload};
use indicatif::{ProgressBar, ProgressStyle};
use museum_caption_common::{fallback_caption, parse_response, CaptionResult, CleaningRules, LabelSchema};
use std::time::Duration;
use tracing::{debug, warn};

/// Pacing and image limits of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub batch: usize,
    pub window: Duration,
    pub failure_pause: Duration,
    pub max_image_size: u32,
    pub max_images: usize,
}

impl RunOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            batch: config.rate_limit_batch,
            window: Duration::from_secs(config.rate_limit_window_secs),
            failure_pause: Duration::from_secs(config.failure_pause_secs),
            max_image_size: config.max_image_size,
            max_images: config.max_images_per_object,
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Objects (or images) taken from the queue
    pub processed: usize,
    /// Responses with every expected label
    pub generated: usize,
    /// Responses where the parser had to fill in a headline or description
    pub fallback: usize,
    /// Requests that failed; a fallback row was written instead
    pub failed: usize,
    pub matched: usize,
    pub unmatched: usize,
    /// Stopped early by Ctrl-C
    pub cancelled: bool,
}

impl RunSummary {
    pub fn print(&self) {
        println!("\n📊 Summary");
        println!("  processed: {}", self.processed);
        println!("  generated: {}", self.generated);
        println!("  fallback:  {}", self.fallback);
        println!("  failed:    {}", self.failed);
        if self.matched + self.unmatched > 0 {
            println!("  matched:   {}", self.matched);
            println!("  unmatched: {}", self.unmatched);
        }
        if self.cancelled {
            println!("  ⚠ cancelled before the end of the queue");
        }
    }
}

/// Whether the parser substituted a fallback headline or description.
pub fn used_fallback(result: &CaptionResult, rules: &CleaningRules) -> bool {
    result.headline == rules.fallback_headline
        || result.description == rules.short_replacement
        || rules.fallback_descriptions.iter().any(|d| *d == result.description)
}

pub(crate) fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner} [{bar:30}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}

/// State shared by the object loop of every run
pub struct RunContext<'a, G: CaptionGenerator + ?Sized> {
    generator: &'a G,
    pub options: RunOptions,
    pub rules: CleaningRules,
    cancel: CancelFlag,
    limiter: RateLimiter,
    pub summary: RunSummary,
}

impl<'a, G: CaptionGenerator + ?Sized> RunContext<'a, G> {
    pub fn new(generator: &'a G, options: RunOptions, cancel: CancelFlag) -> Self {
        let limiter = RateLimiter::new(options.batch, options.window);
        Self {
            generator,
            options,
            rules: CleaningRules::default(),
            cancel,
            limiter,
            summary: RunSummary::default(),
        }
    }

    pub fn with_rules(mut self, rules: CleaningRules) -> Self {
        self.rules = rules;
        self
    }

    /// Checked before each object; records the cancellation in the summary.
    pub(crate) fn should_stop(&mut self) -> bool {
        if self.cancel.is_cancelled() {
            self.summary.cancelled = true;
            return true;
        }
        false
    }

    /// Send one paced request and parse the answer.
    ///
    /// Non-fatal errors produce the fallback caption for `seed`; fatal errors
    /// are returned.
    pub(crate) async fn request(
        &mut self,
        prompt: &str,
        images: &[ImagePayload],
        schema: &LabelSchema,
        seed: &str,
    ) -> Result<CaptionResult> {
        self.limiter.acquire().await;

        match self.generator.generate(prompt, images).await {
            Ok(text) => {
                debug!("{}: response {} chars", seed, text.len());
                let result = parse_response(&text, schema, &self.rules);
                if used_fallback(&result, &self.rules) {
                    warn!("{}: response missing labels, fallback used", seed);
                    self.summary.fallback += 1;
                } else {
                    self.summary.generated += 1;
                }
                Ok(result)
            }
            Err(e) => self.record_failure(e, schema, seed).await,
        }
    }

    /// Fallback caption after a per-object error, followed by the failure pause.
    pub(crate) async fn record_failure(
        &mut self,
        error: CaptionError,
        schema: &LabelSchema,
        seed: &str,
    ) -> Result<CaptionResult> {
        self.note_failure(error, seed).await?;
        Ok(fallback_caption(schema, &self.rules, seed))
    }

    /// Count a non-fatal error and pause; fatal errors are returned.
    pub(crate) async fn note_failure(&mut self, error: CaptionError, seed: &str) -> Result<()> {
        if error.is_fatal() {
            return Err(error);
        }

        warn!("{}: {}", seed, error);
        self.summary.failed += 1;
        if !self.options.failure_pause.is_zero() {
            tokio::time::sleep(self.options.failure_pause).await;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted generator: pops one reply per call, records prompts.
    #[derive(Default)]
    pub struct ScriptedGenerator {
        replies: Mutex<VecDeque<Result<String>>>,
        pub prompts: Mutex<Vec<(String, usize)>>,
    }

    impl ScriptedGenerator {
        pub fn new(replies: Vec<Result<String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CaptionGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str, images: &[ImagePayload]) -> Result<String> {
            self.prompts.lock().unwrap().push((prompt.to_string(), images.len()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(CaptionError::EmptyResponse))
        }
    }

    pub fn quick_options() -> RunOptions {
        RunOptions {
            batch: 0,
            window: Duration::ZERO,
            failure_pause: Duration::ZERO,
            max_image_size: 64,
            max_images: 4,
        }
    }
}
