use core::time::Duration;
use std::sync::Arc;

use chrono::NaiveDate;
use headless_chrome::Tab;
use scraper::{Html, Selector};
use tokio::time::sleep;

use crate::date::{Cursor, PostDate};

pub mod puppeteer;

pub struct Context {
    pub sel_date: Selector,
}

impl Context {
    pub fn new(date_selector: &str) -> anyhow::Result<Self> {
        let sel_date = Selector::parse(date_selector)
            .map_err(|e| anyhow::anyhow!("bad date selector {date_selector:?}: {e}"))?;
        Ok(Self { sel_date })
    }
}

/// A post container as found on the page, before its date is resolved.
#[derive(Debug, PartialEq, Eq)]
pub struct RawPost {
    pub label: String,
    pub content: String,
}

#[derive(Debug)]
pub struct Post {
    pub date: PostDate,
    pub content: String,
}

pub struct Options {
    pub max_pages: u32,
    /// Stop after this many pages in a row without dated posts; `0` never stops early.
    pub empty_streak: u32,
    pub delay: Duration,
}

/// A source of search-result pages, numbered from 1.
pub trait ResultPages {
    /// Outer HTML of each post container on `page`, or the error hit while
    /// reading that one post. An outer error means the source itself broke.
    fn load(
        &mut self,
        page: u32,
    ) -> impl Future<Output = anyhow::Result<Vec<anyhow::Result<String>>>>;
}

/// Search results read through a tab of the attached browser.
pub struct SearchPages {
    pub tab: Arc<Tab>,
    pub base_url: String,
    pub keyword: String,
    pub post_selector: String,
    pub wait: Duration,
}

impl ResultPages for SearchPages {
    async fn load(&mut self, page: u32) -> anyhow::Result<Vec<anyhow::Result<String>>> {
        let url = search_url(&self.base_url, &self.keyword, page);
        tracing::debug!(target: "browser", "[Page #{page}] {url}");

        puppeteer::navigate_to(&self.tab, url).await?;
        if !puppeteer::wait_for(&self.tab, &self.post_selector, self.wait).await? {
            return Ok(Vec::new());
        }
        puppeteer::outer_htmls(&self.tab, &self.post_selector).await
    }
}

#[must_use]
pub fn search_url(base: &str, keyword: &str, page: u32) -> String {
    format!(
        "{}/{}/p/{page}",
        base.trim_end_matches('/'),
        urlencoding::encode(keyword),
    )
}

/// Pulls the date label and text out of one post container.
///
/// `None` when the post has no (or a blank) date label.
pub fn extract(html: &str, ctx: &Context) -> Option<RawPost> {
    let fragment = Html::parse_fragment(html);

    let label = fragment
        .select(&ctx.sel_date)
        .next()?
        .text()
        .map(str::trim)
        .collect::<String>();
    if label.is_empty() {
        return None;
    }

    let content = fragment
        .root_element()
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    Some(RawPost { label, content })
}

/// Walks pages `1..=max_pages` in order and resolves every dated post
/// against `cursor`, in page order and then on-page order.
pub async fn collect<P: ResultPages>(
    pages: &mut P,
    ctx: &Context,
    cursor: &mut Cursor,
    options: &Options,
) -> anyhow::Result<Vec<Post>> {
    let mut posts = Vec::new();
    let mut empty = 0;

    for page in 1..=options.max_pages {
        tracing::info!(target: "worker", "[Page #{page}] start");

        let mut dated = 0usize;
        let mut page_dates = Vec::<NaiveDate>::new();
        for (idx, snapshot) in pages.load(page).await?.into_iter().enumerate() {
            let html = match snapshot {
                Ok(html) => html,
                Err(e) => {
                    tracing::error!(target: "worker", "\x1b[31m[Page #{page}] post #{idx} failed: {e}\x1b[0m");
                    continue;
                }
            };
            let Some(RawPost { label, content }) = extract(&html, ctx) else {
                continue;
            };

            let date = cursor.resolve(&label);
            match &date {
                PostDate::Parsed(d) => {
                    tracing::debug!(target: "worker", "[Page #{page}] {label} -> {d}");
                    page_dates.push(*d);
                }
                PostDate::Unparsed(raw) => {
                    tracing::debug!(target: "worker", "[Page #{page}] unparsed label {raw:?}");
                }
            }
            dated += 1;
            posts.push(Post { date, content });
        }

        if dated == 0 {
            tracing::warn!(target: "worker", "[Page #{page}] no dated posts");
            empty += 1;
            if options.empty_streak != 0 && empty >= options.empty_streak {
                tracing::info!(target: "worker", "{empty} empty pages in a row, stopping at page {page}");
                break;
            }
        } else {
            empty = 0;
            page_dates.sort_unstable();
            page_dates.dedup();
            tracing::info!(
                target: "worker",
                "\x1b[36m[Page #{page}] {dated} posts, dates {page_dates:?}\x1b[0m"
            );
        }

        if page < options.max_pages && !options.delay.is_zero() {
            sleep(options.delay).await;
        }
    }

    Ok(posts)
}
