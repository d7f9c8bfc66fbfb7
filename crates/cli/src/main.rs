//! cachefront entry point.
//!
//! Loads configuration, installs and activates a cache proxy over the
//! configured store, then routes each URL given on the command line
//! through the interceptor and prints how it was resolved. Logging
//! goes to stderr so stdout stays parseable.

use anyhow::{Context, Result, bail};
use cachefront_core::{ProxyConfig, StoreDb};
use cachefront_proxy::{CacheProxy, FetchConfig, HttpFetcher, Request, canonicalize};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let urls: Vec<String> = std::env::args().skip(1).collect();
    if urls.is_empty() {
        bail!("usage: cachefront <url>...");
    }

    let config = ProxyConfig::load().context("failed to load configuration")?;
    let store = StoreDb::open(&config.db_path)
        .await
        .with_context(|| format!("failed to open store at {}", config.db_path.display()))?;
    let fetcher = HttpFetcher::new(FetchConfig::from_proxy(&config))?;

    let mut proxy = CacheProxy::new(store, fetcher, config)?;
    proxy.install().await.context("precache install failed")?;
    proxy.activate().await?;

    for raw in urls {
        let url = canonicalize(&raw).with_context(|| format!("invalid url: {raw}"))?;
        let (response, disposition) = proxy.intercept(&Request::get(url.clone())).await?;
        println!("{} {:>8}B {} {}", response.status.as_u16(), response.body.len(), disposition, url);
    }

    Ok(())
}
