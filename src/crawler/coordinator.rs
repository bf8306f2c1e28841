//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the recursive crawl that ties everything together:
//! - Visited-set and depth checks
//! - Fetching pages and saving their text
//! - Classifying links into documents, same-host pages and external links
//! - Downloading documents
//! - Accumulating the run report

use crate::config::Config;
use crate::crawler::parser::parse_html;
use crate::crawler::{
    build_http_client, fetch_page_with_retry, fetch_with_retry, FetchResult, RetryPolicy,
};
use crate::output::{CrawlReport, OutputDir};
use crate::url::{classify_link, document_file_name, page_file_stem, parse_seed, LinkKind};
use crate::HarvestError;
use reqwest::{Client, Response};
use std::collections::HashSet;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Main crawler structure
///
/// Holds everything a run mutates: the visited set and the report. One
/// `Crawler` per run; requests are issued strictly one after another.
pub struct Crawler {
    client: Client,
    policy: RetryPolicy,
    output: OutputDir,
    visited: HashSet<String>,
    report: CrawlReport,
}

impl Crawler {
    /// Creates a new crawler
    ///
    /// Builds the HTTP client and creates the output directory.
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to crawl
    /// * `Err(HarvestError)` - Client could not be built or directory created
    pub fn new(config: &Config) -> Result<Self, HarvestError> {
        let client = build_http_client(&config.fetch)?;
        let output = OutputDir::create(&config.output.directory)?;

        Ok(Self {
            client,
            policy: RetryPolicy::from_config(&config.fetch),
            output,
            visited: HashSet::new(),
            report: CrawlReport::new(),
        })
    }

    /// URLs processed so far in this run
    pub fn visited(&self) -> &HashSet<String> {
        &self.visited
    }

    pub fn report(&self) -> &CrawlReport {
        &self.report
    }

    pub fn output(&self) -> &OutputDir {
        &self.output
    }

    /// Stamps the finish time and returns the report
    pub fn into_report(mut self) -> CrawlReport {
        self.report.finish();
        self.report
    }

    /// Crawls a page and recurses into its same-host links
    ///
    /// Returns without fetching when the URL was already visited or the depth
    /// budget is spent. Otherwise the page is fetched with retry, its text saved
    /// and its links handled in document order:
    ///
    /// - documents (`.pdf`, `.doc`, `.docx`) are downloaded directly
    /// - same-host pages are crawled with `depth - 1`
    /// - everything else is ignored
    ///
    /// Failures are counted in the report and never abort the crawl.
    pub async fn crawl(&mut self, url: &Url, depth: u32) {
        let key = url.as_str();

        if self.visited.contains(key) {
            tracing::debug!("Skipping already visited {}", url);
            self.report.duplicates_skipped += 1;
            return;
        }

        if depth == 0 {
            tracing::debug!("Skipping {}: depth exhausted", url);
            self.report.depth_exhausted += 1;
            return;
        }

        self.visited.insert(key.to_string());
        self.report.total_links += 1;
        tracing::info!("Crawling {} (depth {})", url, depth);

        let fetched = match fetch_page_with_retry(&self.client, url, &self.policy).await {
            FetchResult::Success { content, .. } => content,
            FetchResult::Exhausted {
                attempts,
                last_failure,
            } => {
                tracing::error!(
                    "Failed to access {} after {} attempts: {}",
                    url,
                    attempts,
                    last_failure
                );
                self.report.failures += 1;
                return;
            }
        };

        // A redirect target counts as visited too; links resolve against it
        let mut final_url = fetched.final_url;
        final_url.set_fragment(None);
        if final_url != *url && !self.visited.insert(final_url.to_string()) {
            tracing::debug!("{} redirected to already visited {}", url, final_url);
            self.report.duplicates_skipped += 1;
            return;
        }

        let page = parse_html(&fetched.body, &final_url);
        if let Some(title) = &page.title {
            tracing::info!("Fetched {} ({})", final_url, title);
        }

        match self.output.save_text(&page.text, &page_file_stem(&final_url)) {
            Ok(_) => self.report.pages_saved += 1,
            Err(e) => {
                tracing::error!("{}", e);
                self.report.write_errors += 1;
            }
        }

        for link in &page.links {
            match classify_link(link, &final_url) {
                LinkKind::Document => self.download_document(link).await,
                LinkKind::SameHost => Box::pin(self.crawl(link, depth - 1)).await,
                LinkKind::External => {
                    tracing::debug!("Ignoring external link {}", link);
                    self.report.external_ignored += 1;
                }
            }
        }
    }

    /// Downloads a document linked from a page into the output directory
    ///
    /// Each document URL is downloaded at most once per run.
    async fn download_document(&mut self, url: &Url) {
        if self.visited.contains(url.as_str()) {
            tracing::debug!("Skipping already downloaded {}", url);
            self.report.duplicates_skipped += 1;
            return;
        }
        self.visited.insert(url.to_string());

        let Some(file_name) = document_file_name(url) else {
            tracing::warn!("Cannot derive a file name for {}", url);
            self.report.failures += 1;
            return;
        };

        let path = self.output.document_path(&file_name);
        self.download(url, &path).await;
    }

    /// Streams a URL to `path` with the retry policy
    ///
    /// Increments the success counter when the whole body was written and the
    /// failure counter otherwise. A partially written file is removed.
    ///
    /// # Returns
    ///
    /// `true` if the download succeeded
    pub async fn download(&mut self, url: &Url, path: &Path) -> bool {
        let response = match fetch_with_retry(&self.client, url, &self.policy).await {
            FetchResult::Success { content, .. } => content,
            FetchResult::Exhausted {
                attempts,
                last_failure,
            } => {
                tracing::error!(
                    "Failed to download {} after {} attempts: {}",
                    url,
                    attempts,
                    last_failure
                );
                self.report.failures += 1;
                return false;
            }
        };

        match write_stream(response, url, path).await {
            Ok(bytes) => {
                tracing::info!("Downloaded: {} ({} bytes)", path.display(), bytes);
                self.report.downloads_succeeded += 1;
                true
            }
            Err(e) => {
                tracing::error!("Failed to download {}: {}", url, e);
                if let Err(remove_err) = tokio::fs::remove_file(path).await {
                    tracing::debug!(
                        "No partial file to remove at {}: {}",
                        path.display(),
                        remove_err
                    );
                }
                self.report.failures += 1;
                false
            }
        }
    }
}

/// Writes a response body to disk chunk by chunk
async fn write_stream(mut response: Response, url: &Url, path: &Path) -> Result<u64, HarvestError> {
    let write_error = |source| HarvestError::Write {
        path: path.display().to_string(),
        source,
    };

    let mut file = tokio::fs::File::create(path).await.map_err(write_error)?;
    let mut written = 0u64;

    while let Some(chunk) = response.chunk().await.map_err(|source| HarvestError::Http {
        url: url.to_string(),
        source,
    })? {
        file.write_all(&chunk).await.map_err(write_error)?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(write_error)?;
    Ok(written)
}

/// Runs the main crawl operation
///
/// 1. Create the output directory and HTTP client
/// 2. Crawl every seed, in order, with the configured depth
/// 3. Return the report
///
/// Seeds that fail to parse are logged, counted as failures and skipped.
///
/// # Example
///
/// ```no_run
/// use ton_harvest::config::Config;
/// use ton_harvest::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = run_crawl(&Config::default()).await?;
/// println!("{} documents downloaded", report.downloads_succeeded);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config) -> Result<CrawlReport, HarvestError> {
    let mut crawler = Crawler::new(config)?;

    tracing::info!(
        "Starting crawl of {} seeds (depth {}) into {}",
        config.seeds.len(),
        config.crawler.max_depth,
        crawler.output().path().display()
    );

    for seed in &config.seeds {
        match parse_seed(seed) {
            Ok(url) => crawler.crawl(&url, config.crawler.max_depth).await,
            Err(e) => {
                tracing::error!("Skipping seed {}: {}", seed, e);
                crawler.report.failures += 1;
            }
        }
    }

    let report = crawler.into_report();
    tracing::info!(
        "Crawl completed: {} pages, {} downloads, {} failures",
        report.pages_saved,
        report.downloads_succeeded,
        report.failures
    );

    Ok(report)
}
