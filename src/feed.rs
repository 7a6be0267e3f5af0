//! Fetching the ICS feed text.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use url::Url;

const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, PartialEq)]
enum FeedLocation {
    Http(Url),
    File(PathBuf),
}

/// `webcal://` is plain HTTPS; anything that isn't an http(s) URL is a path.
fn locate(source: &str) -> Result<FeedLocation> {
    let source = source.trim();
    let rewritten = match source.get(..9) {
        Some(scheme) if scheme.eq_ignore_ascii_case("webcal://") => {
            format!("https://{}", &source[9..])
        }
        _ => source.to_string(),
    };

    match Url::parse(&rewritten) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(FeedLocation::Http(url)),
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .map(FeedLocation::File)
            .map_err(|_| anyhow::anyhow!("Invalid file URL: {}", source)),
        Ok(url) if url.scheme().len() > 1 => {
            bail!("Unsupported feed scheme '{}' in {}", url.scheme(), source)
        }
        // Relative paths, absolute paths and Windows drive letters
        _ => Ok(FeedLocation::File(PathBuf::from(source))),
    }
}

fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(format!("calsync/{}", CURRENT_VERSION))
        .timeout(FETCH_TIMEOUT)
        .build()?)
}

fn ensure_calendar(text: String, source: &str) -> Result<String> {
    if !text.trim_start().starts_with("BEGIN:VCALENDAR") {
        bail!("{} is not an ICS calendar (missing BEGIN:VCALENDAR)", source);
    }
    Ok(text)
}

/// Download (or read) the feed and check that it looks like a calendar.
pub async fn fetch_text(source: &str) -> Result<String> {
    let text = match locate(source)? {
        FeedLocation::Http(url) => {
            tracing::debug!(%url, "fetching feed");
            let response = http_client()?
                .get(url.clone())
                .send()
                .await
                .with_context(|| format!("Failed to fetch {}", url))?;

            if !response.status().is_success() {
                bail!("Failed to fetch {} (HTTP {})", url, response.status());
            }

            response.text().await?
        }
        FeedLocation::File(path) => {
            tracing::debug!(path = %path.display(), "reading feed file");
            tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Could not read {}", path.display()))?
        }
    };

    ensure_calendar(text, source)
}
