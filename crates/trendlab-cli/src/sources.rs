//! Signal sources available to the CLI.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use trendlab_core::model::RawSignal;
use trendlab_core::ports::{FetchParams, SignalSource, SourceError};
use trendlab_core::SourceUsage;

/// Reads raw signals from a JSON export on disk: one array of signal
/// objects, as written by the provider dump jobs.
///
/// The file is re-read on every fetch, so repeated collection passes pick
/// up a refreshed export without rebuilding the source.
pub(crate) struct FileSource {
    name: String,
    path: PathBuf,
    pub(crate) usage: Arc<SourceUsage>,
}

impl FileSource {
    /// Builds a source named after the file stem, so `exports/search.json`
    /// shows up as source `search` on every record it produces.
    pub(crate) fn new(path: &Path) -> Self {
        let name = path
            .file_stem()
            .map_or_else(|| "file".to_string(), |s| s.to_string_lossy().into_owned());
        let usage = Arc::new(SourceUsage::new(name.clone()));
        Self {
            name,
            path: path.to_path_buf(),
            usage,
        }
    }
}

#[async_trait]
impl SignalSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_signals(&self, params: &FetchParams) -> Result<Vec<RawSignal>, SourceError> {
        self.usage.record_request();

        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                self.usage.record_failure();
                return Err(SourceError::unavailable(format!(
                    "{}: {e}",
                    self.path.display()
                )));
            }
        };
        let mut signals: Vec<RawSignal> = match serde_json::from_str(&raw) {
            Ok(signals) => signals,
            Err(e) => {
                self.usage.record_failure();
                return Err(SourceError::malformed(format!(
                    "{}: {e}",
                    self.path.display()
                )));
            }
        };

        if !params.seed_keywords.is_empty() {
            let seeds: Vec<String> = params
                .seed_keywords
                .iter()
                .map(|s| s.to_lowercase())
                .collect();
            signals.retain(|signal| {
                let keyword = signal.keyword.to_lowercase();
                seeds.iter().any(|seed| keyword.contains(seed))
            });
        }
        signals.truncate(params.limit);

        // Every signal carries this source's name, whatever the export said.
        for signal in &mut signals {
            signal.source.clone_from(&self.name);
        }

        self.usage.record_signals(signals.len() as u64);
        Ok(signals)
    }
}
