use core::time::Duration;
use std::{io::Write, path::PathBuf};

use chrono::Local;
use ktrend::{
    chart,
    date::Cursor,
    scrape::{self, Context, Options, SearchPages},
    stats::{self, Unparsed},
};

/// Half-year mention trend of a keyword in a forum's search results.
///
/// Attach to a logged-in browser started with `--remote-debugging-port`.
#[derive(clap::Parser)]
#[command(version, about)]
struct Args {
    /// Search keyword, percent-encoded before it goes into the URL
    #[arg(short, long, env = "TREND_KEYWORD", default_value = "열람실")]
    keyword: String,
    /// Upper bound on result pages to visit
    #[arg(short, long, env = "TREND_PAGES", default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..))]
    pages: u32,
    /// DevTools endpoint of the running browser
    #[arg(long, env = "TREND_DEBUGGER", default_value = "127.0.0.1:9222")]
    debugger: String,
    #[arg(long, env = "TREND_BASE_URL", default_value = "https://everytime.kr/search/all")]
    base_url: String,
    #[arg(long, env = "TREND_POST_SELECTOR", default_value = ".article")]
    post_selector: String,
    #[arg(long, env = "TREND_DATE_SELECTOR", default_value = "time.small")]
    date_selector: String,
    /// Year of the newest result [default: current year]
    #[arg(long, env = "TREND_YEAR")]
    year: Option<i32>,
    /// How long to wait for posts to render on each page
    #[arg(long, env = "TREND_WAIT_MS", default_value_t = 10_000)]
    wait_ms: u64,
    /// Pause between pages
    #[arg(long, env = "TREND_DELAY_MS", default_value_t = 500)]
    delay_ms: u64,
    /// Stop after this many consecutive pages without dated posts (0: never)
    #[arg(long, env = "TREND_EMPTY_STREAK", default_value_t = 2)]
    empty_streak: u32,
    /// What to do with posts whose date label is not month/day
    #[arg(long, env = "TREND_UNPARSED", value_enum, default_value_t = UnparsedArg::Skip)]
    unparsed: UnparsedArg,
    /// Drop the browser connection after this long without any event
    #[arg(long, env = "TREND_IDLE_TIMEOUT_SECS", default_value_t = 300)]
    idle_timeout_secs: u64,
    /// Also draw the chart into this SVG file
    #[arg(long, env = "TREND_CHART", value_name = "file")]
    chart: Option<PathBuf>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum UnparsedArg {
    /// Leave them out of the counts
    Skip,
    /// Count them as posted today
    Today,
}

fn init_logger() {
    let mut builder = pretty_env_logger::formatted_timed_builder();
    builder
        .filter_level(log::LevelFilter::Info)
        .filter_module("headless_chrome", log::LevelFilter::Warn);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    use clap::Parser;

    init_logger();

    let args = Args::parse();
    let today = Local::now().date_naive();
    let ctx = Context::new(&args.date_selector)?;

    let browser = scrape::puppeteer::attach(
        &args.debugger,
        Duration::from_secs(args.idle_timeout_secs),
    )
    .await?;
    let tab = browser.new_tab()?;

    let mut pages = SearchPages {
        tab: tab.clone(),
        base_url: args.base_url,
        keyword: args.keyword.clone(),
        post_selector: args.post_selector,
        wait: Duration::from_millis(args.wait_ms),
    };
    let mut cursor = args
        .year
        .map_or_else(|| Cursor::seeded(today), |year| Cursor::new(year, 12));
    let options = Options {
        max_pages: args.pages,
        empty_streak: args.empty_streak,
        delay: Duration::from_millis(args.delay_ms),
    };

    let posts = scrape::collect(&mut pages, &ctx, &mut cursor, &options).await;
    if let Err(e) = tab.close(true) {
        tracing::warn!(target: "browser", "closing tab failed: {e}");
    }
    let posts = posts?;
    tracing::info!(target: "worker", "collected {} dated posts, oldest year {}", posts.len(), cursor.year());

    let unparsed = match args.unparsed {
        UnparsedArg::Skip => Unparsed::Skip,
        UnparsedArg::Today => Unparsed::Today(today),
    };
    let counts = stats::count_by_date(&posts, unparsed);
    let periods = stats::summarize(&counts);
    let title = format!("Keyword Mentions of {:?}", args.keyword);

    let mut stdout = std::io::stdout().lock();
    chart::render_counts(&counts, &mut stdout)?;
    writeln!(stdout)?;
    chart::render_text(&periods, &title, &mut stdout)?;
    stdout.flush()?;

    if let Some(path) = args.chart {
        if periods.is_empty() {
            tracing::warn!(target: "chart", "no periods, {} not written", path.display());
        } else {
            chart::render_svg(&periods, &title, &path)?;
        }
    }

    Ok(())
}
