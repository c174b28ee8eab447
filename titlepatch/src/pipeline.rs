//! The update pipeline: validate → fetch → parse → download.

use tracing::{info, warn};

use crate::config::UpdaterConfig;
use crate::download::{
    DownloadObserver, DownloadOrchestrator, HttpDownloader, OverwritePrompt, PackageDownloader,
    RunReport,
};
use crate::error::UpdateResult;
use crate::identifier::TitleId;
use crate::manifest::{
    parse_manifest, HttpManifestFetcher, Manifest, ManifestSource, PackageSelection,
};

/// Retrieves and downloads title updates according to an `UpdaterConfig`.
pub struct TitleUpdater {
    config: UpdaterConfig,
    source: Box<dyn ManifestSource>,
    downloader: Box<dyn PackageDownloader>,
}

impl TitleUpdater {
    /// Create an updater talking to the HTTP endpoints in `config`.
    pub fn new(config: UpdaterConfig) -> UpdateResult<Self> {
        config.validate()?;
        let source = HttpManifestFetcher::new(&config)?;
        let downloader = HttpDownloader::new(&config)?;
        Ok(Self {
            config,
            source: Box::new(source),
            downloader: Box::new(downloader),
        })
    }

    /// Create an updater with custom manifest source and downloader.
    pub fn with_components(
        config: UpdaterConfig,
        source: Box<dyn ManifestSource>,
        downloader: Box<dyn PackageDownloader>,
    ) -> UpdateResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            downloader,
        })
    }

    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    /// Validate a raw title id against the configured allow-list.
    ///
    /// The input is taken as given; surrounding whitespace makes it the
    /// wrong length.
    pub fn validate(&self, raw: &str) -> UpdateResult<TitleId> {
        TitleId::parse(raw, &self.config.allowed_prefixes)
    }

    /// Validate `raw`, fetch its manifest and parse it.
    pub fn fetch_manifest(&self, raw: &str) -> UpdateResult<Manifest> {
        let title_id = self.validate(raw)?;
        let text = self.source.fetch(&title_id)?;
        let manifest = parse_manifest(&title_id, &text)?;
        info!(
            title_id = %title_id,
            packages = manifest.records.len(),
            "manifest ready"
        );
        Ok(manifest)
    }

    /// Download the selected packages of `manifest`.
    pub fn download(
        &self,
        manifest: &Manifest,
        selection: &PackageSelection,
        prompt: &mut dyn OverwritePrompt,
        observer: &mut dyn DownloadObserver,
    ) -> UpdateResult<RunReport> {
        let records = selection.apply(manifest.records.clone());
        if records.is_empty() && !manifest.is_empty() {
            warn!(selection = ?selection, "no packages match the selection");
        }

        DownloadOrchestrator::new(self.downloader.as_ref(), &self.config.target_dir)
            .with_continue_on_error(self.config.continue_on_error)
            .run(&records, self.config.overwrite_policy, prompt, observer)
    }

    /// Run the whole pipeline for one title id.
    pub fn run(
        &self,
        raw: &str,
        selection: &PackageSelection,
        prompt: &mut dyn OverwritePrompt,
        observer: &mut dyn DownloadObserver,
    ) -> UpdateResult<(Manifest, RunReport)> {
        let manifest = self.fetch_manifest(raw)?;
        let report = self.download(&manifest, selection, prompt, observer)?;
        Ok((manifest, report))
    }
}
