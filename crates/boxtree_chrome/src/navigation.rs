//! Navigation bounded by a persistence tier.

use crate::config::Persistence;
use anyhow::{Result, bail};
use chromiumoxide::cdp::browser_protocol::page::{
    EventLifecycleEvent, NavigateParams, SetLifecycleEventsEnabledParams,
};
use chromiumoxide::page::Page;
use futures::StreamExt as _;
use log::{info, warn};
use tokio::time::{Instant, timeout};
use url::Url;

/// Navigate `page` to `url` and wait for the tier's lifecycle event.
///
/// Failures and timeouts are logged and reported as `false`; whatever the
/// page has rendered by then is still usable.
pub async fn navigate(page: &Page, url: &Url, persistence: Persistence) -> bool {
    let start = Instant::now();
    match timeout(persistence.timeout(), load(page, url, persistence)).await {
        Ok(Ok(())) => {
            info!(
                "[NAV] {} reached {} in {:?}",
                url,
                persistence.lifecycle_event(),
                start.elapsed()
            );
            true
        }
        Ok(Err(err)) => {
            warn!("[NAV] navigation to {url} failed: {err}");
            false
        }
        Err(_) => {
            warn!(
                "[NAV] {} did not reach {} within {:?}, extracting anyway",
                url,
                persistence.lifecycle_event(),
                persistence.timeout()
            );
            false
        }
    }
}

async fn load(page: &Page, url: &Url, persistence: Persistence) -> Result<()> {
    page.execute(SetLifecycleEventsEnabledParams::new(true)).await?;
    // subscribe first so early events are not missed
    let mut events = page.event_listener::<EventLifecycleEvent>().await?;
    let navigated = page.execute(NavigateParams::new(url.as_str())).await?;
    if let Some(error) = &navigated.error_text {
        bail!("{error}");
    }
    let wanted = persistence.lifecycle_event();
    while let Some(event) = events.next().await {
        if event.frame_id != navigated.frame_id {
            continue;
        }
        if navigated
            .loader_id
            .as_ref()
            .is_some_and(|loader| *loader != event.loader_id)
        {
            continue;
        }
        if event.name == wanted {
            return Ok(());
        }
    }
    bail!("lifecycle event stream closed")
}
