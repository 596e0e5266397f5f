use std::{sync::Arc, time::Duration};

use anyhow::Context as _;
use headless_chrome::{Browser, Element, Tab, browser::tab::NoElementFound};
use serde::Deserialize;
use tokio::{
    task::spawn_blocking,
    time::{Instant, sleep},
};

#[derive(Deserialize)]
struct VersionInfo {
    #[serde(rename = "webSocketDebuggerUrl")]
    ws_url: String,
}

/// Attaches to a running browser started with `--remote-debugging-port`.
///
/// The session (cookies, login) is whatever that browser already has.
pub async fn attach(debugger: &str, idle_timeout: Duration) -> anyhow::Result<Browser> {
    let url = format!("http://{debugger}/json/version");
    let info = reqwest::get(&url)
        .await
        .and_then(reqwest::Response::error_for_status)
        .with_context(|| format!("no browser is listening on {debugger}"))?
        .json::<VersionInfo>()
        .await
        .with_context(|| format!("unexpected response from {url}"))?;

    tracing::info!(target: "browser", "attaching to \x1b[1;36m{}\x1b[0m", info.ws_url);

    Browser::connect_with_timeout(info.ws_url, idle_timeout)
}

pub async fn navigate_to(tab: &Arc<Tab>, url: String) -> anyhow::Result<()> {
    let tab = Arc::clone(tab);

    spawn_blocking(move || {
        tab.navigate_to(&url)?;
        if let Err(e) = tab.wait_until_navigated() {
            tracing::warn!(target: "browser", "{url} did not settle: {e}");
        }
        Ok::<_, anyhow::Error>(())
    })
    .await?
}

/// Polls until `selector` matches, for at most `timeout`.
///
/// Returns `false` when nothing showed up in time.
pub async fn wait_for(tab: &Arc<Tab>, selector: &str, timeout: Duration) -> anyhow::Result<bool> {
    const PERIOD: Duration = Duration::from_millis(1832 / 4);

    let deadline = Instant::now() + timeout;
    loop {
        let arc_tab = Arc::clone(tab);
        let selector = selector.to_owned();

        match spawn_blocking(move || arc_tab.find_element(&selector).map(drop)).await? {
            Ok(()) => break Ok(true),
            Err(err) => {
                if !err.is::<NoElementFound>() {
                    break Err(err);
                }
            }
        }

        if Instant::now() >= deadline {
            break Ok(false);
        }
        sleep(PERIOD).await;
    }
}

/// Outer HTML of every element matching `selector`, each read separately.
pub async fn outer_htmls(
    tab: &Arc<Tab>,
    selector: &str,
) -> anyhow::Result<Vec<anyhow::Result<String>>> {
    let tab = Arc::clone(tab);
    let selector = selector.to_owned();

    spawn_blocking(move || {
        let elements = match tab.find_elements(&selector) {
            Ok(elements) => elements,
            Err(err) if err.is::<NoElementFound>() => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        Ok(elements.iter().map(Element::get_content).collect())
    })
    .await?
}
