//! Concurrent image downloading for the HTML pipeline.
//!
//! Every `<img>` in the original page is resolved against the base URL and
//! downloaded through a semaphore-bounded task set sharing the page's
//! rate-limited fetcher. Download failures are logged and skipped; they never
//! fail the parse. Without an output directory nothing is downloaded and the
//! references carry the resolved URLs instead.

use crate::parsers::html::fetcher::ContentFetcher;
use crate::processors::image_saver::{extension_for_content_type, probe_dimensions};
use crate::types::ImageReference;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use url::Url;

static IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("img").expect("valid selector"));

/// One downloadable image found in the page.
#[derive(Debug, Clone)]
pub struct ImageTask {
    pub index: usize,
    pub url: String,
    pub alt_text: Option<String>,
}

/// Collect downloadable image tasks from the original HTML.
///
/// `data:` URIs and non-HTTP schemes are skipped. Scheme-relative sources
/// (`//host/...`) become `https:`; relative sources resolve against the base.
pub fn collect_image_tasks(html: &str, base_url: Option<&Url>) -> Vec<ImageTask> {
    let document = Html::parse_document(html);
    let mut tasks = Vec::new();

    for element in document.select(&IMG_SELECTOR) {
        let Some(src) = element.value().attr("src") else {
            continue;
        };
        let src = src.trim();
        if src.is_empty() {
            continue;
        }
        let Some(resolved) = resolve_image_url(src, base_url) else {
            continue;
        };
        let alt_text = element
            .value()
            .attr("alt")
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);
        tasks.push(ImageTask {
            index: tasks.len(),
            url: resolved,
            alt_text,
        });
    }

    tasks
}

/// Resolve an `img src` to a fetchable HTTP(S) URL.
pub fn resolve_image_url(src: &str, base_url: Option<&Url>) -> Option<String> {
    let lower = src.to_ascii_lowercase();
    if lower.starts_with("data:") {
        return None;
    }
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(src.to_string());
    }
    if let Some(rest) = src.strip_prefix("//") {
        return Some(format!("https://{}", rest));
    }
    // Any other explicit scheme (mailto:, file:, javascript:) is skipped.
    if src.contains(':') && !src.starts_with('/') && !src.starts_with('.') {
        return None;
    }
    let base = base_url?;
    base.join(src).ok().map(|u| u.to_string())
}

/// Download the images concurrently and return their references sorted by id.
pub async fn download_images(
    tasks: Vec<ImageTask>,
    fetcher: Arc<ContentFetcher>,
    output_dir: &Path,
    max_workers: usize,
    warnings: &mut Vec<String>,
) -> Vec<ImageReference> {
    if tasks.is_empty() {
        return Vec::new();
    }
    if let Err(e) = std::fs::create_dir_all(output_dir) {
        warnings.push(format!(
            "Cannot create image output directory {}: {}",
            output_dir.display(),
            e
        ));
        return Vec::new();
    }

    let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));
    let output_dir: PathBuf = output_dir.to_path_buf();
    let mut join_set = tokio::task::JoinSet::new();

    for task in tasks {
        let fetcher = Arc::clone(&fetcher);
        let semaphore = Arc::clone(&semaphore);
        let output_dir = output_dir.clone();
        join_set.spawn(async move {
            let _permit = semaphore.acquire().await.ok()?;
            match download_one(&task, &fetcher, &output_dir).await {
                Ok(image) => Some(image),
                Err(e) => {
                    warn!(url = %task.url, "Image download failed: {}", e);
                    None
                }
            }
        });
    }

    let mut images: Vec<ImageReference> = Vec::new();
    while let Some(result) = join_set.join_next().await {
        match result {
            Ok(Some(image)) => images.push(image),
            Ok(None) => {}
            Err(e) => warnings.push(format!("Image download task panicked: {}", e)),
        }
    }

    images.sort_by(|a, b| a.image_id.cmp(&b.image_id));
    images
}

async fn download_one(
    task: &ImageTask,
    fetcher: &ContentFetcher,
    output_dir: &Path,
) -> crate::Result<ImageReference> {
    let (bytes, content_type) = fetcher.fetch_bytes(&task.url).await?;

    let extension = content_type
        .as_deref()
        .map(extension_for_content_type)
        .unwrap_or_else(|| extension_from_url(&task.url));
    let file_name = format!("img_{:03}.{}", task.index + 1, extension);
    let target = output_dir.join(file_name);
    tokio::fs::write(&target, &bytes).await?;

    let (width, height, format) = probe_dimensions(&bytes);
    let absolute = std::fs::canonicalize(&target).unwrap_or(target);
    debug!(url = %task.url, path = %absolute.display(), "Downloaded image");

    let mut image = ImageReference::new(format!("img_{:03}", task.index + 1));
    image.position = task.index * 100;
    image.file_path = Some(absolute.to_string_lossy().into_owned());
    image.alt_text = task.alt_text.clone();
    image.size = width.zip(height);
    image.format = format;
    Ok(image)
}

/// References without downloads: used when no output directory is configured.
pub fn reference_only_images(tasks: &[ImageTask]) -> Vec<ImageReference> {
    tasks
        .iter()
        .map(|task| {
            let mut image = ImageReference::new(format!("img_{:03}", task.index + 1));
            image.position = task.index * 100;
            image.file_path = Some(task.url.clone());
            image.alt_text = task.alt_text.clone();
            image.format = extension_from_url(&task.url).to_string();
            image
        })
        .collect()
}

fn extension_from_url(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some("jpg") | Some("jpeg") => "jpg",
        Some("gif") => "gif",
        Some("bmp") => "bmp",
        Some("webp") => "webp",
        Some("tiff") | Some("tif") => "tiff",
        _ => "png",
    }
}
