use scraper::{Html, Selector};
use url::Url;

/// Parse and normalize a seed URL; only absolute http(s) URLs with a host are accepted.
/// The fragment is dropped.
pub fn normalize_seed(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| format!("invalid url '{}': {}", raw, e))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported url scheme '{}'", other)),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(format!("url '{}' has no host", raw));
    }

    url.set_fragment(None);
    Ok(url)
}

/// Name of the per-site folder: the seed's host without a leading `www.`
pub fn site_folder_name(seed: &Url) -> String {
    let host = seed.host_str().unwrap_or("site");
    let host = host.strip_prefix("www.").unwrap_or(host);

    match seed.port() {
        Some(port) => format!("{}_{}", host, port),
        None => host.to_string(),
    }
}

/// File name for an archived page: path segments joined by `_`, `index` for an empty path
pub fn page_file_name(url: &str, extension: &str) -> String {
    let stem = Url::parse(url)
        .ok()
        .map(|parsed| {
            parsed.path()
                .split('/')
                .filter(|segment| !segment.is_empty())
                .collect::<Vec<_>>()
                .join("_")
        })
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "index".to_string());

    format!("{}.{}", stem, extension)
}

/// Absolute targets of every `a[href]` in the markup, in document order.
///
/// Fragments are removed, so `/about` and `/about#team` name the same page.
pub fn extract_links(markup: &str, page_url: &str) -> Vec<String> {
    let Ok(base) = Url::parse(page_url) else {
        return Vec::new();
    };
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let document = Html::parse_document(markup);
    document.select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map(|mut url| {
            url.set_fragment(None);
            String::from(url)
        })
        .collect()
}
