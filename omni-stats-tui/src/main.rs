/// Omni Stats Dashboard (terminal presenter)
///
/// Renders the global metric tiles, the three Top-10 lists, and the
/// listings/analysis tables from `omni-stats`. Fetches once at startup and on
/// manual refresh only; a failed fetch shows an error banner and leaves the
/// previous page state untouched.
///
/// Keys: `r` refresh (invalidates the supply cache), Tab toggle
/// listings/analysis, `q`/Esc quit.
use std::{
    error::Error,
    io,
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use omni_stats::{
    DEFAULT_HTTP_TIMEOUT, DEFAULT_SUPPLY_TTL, DashboardViews, DerivedRow, StatsClient, StatsError,
    SupplyCache, assemble, derive_rows,
    format::{format_fdv, format_pct, format_ratio, format_usd, format_usd_precise},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};
use tokio::sync::mpsc;
use tracing::{error, info};

const DEFAULT_STATS_URL: &str =
    "https://omni-client-api.prod.ap-northeast-1.variational.io/metadata/stats";
const DEFAULT_SUPPLY_FILE: &str = "TotalSupply_20260107.csv";

const C_DIM: Color = Color::Rgb(120, 120, 120);
const C_BRIGHT: Color = Color::Rgb(220, 220, 220);
const C_ACCENT: Color = Color::Rgb(100, 180, 220);
const C_ERROR: Color = Color::Rgb(220, 100, 100);

/// Get the stats endpoint from OMNI_STATS_URL env var
fn get_stats_url() -> String {
    std::env::var("OMNI_STATS_URL").unwrap_or_else(|_| DEFAULT_STATS_URL.to_string())
}

/// Get the supply CSV path from OMNI_SUPPLY_FILE env var
fn get_supply_file() -> String {
    std::env::var("OMNI_SUPPLY_FILE").unwrap_or_else(|_| DEFAULT_SUPPLY_FILE.to_string())
}

/// Get the supply cache TTL from OMNI_SUPPLY_TTL_SECS env var (default: 3600)
fn get_supply_ttl() -> Duration {
    std::env::var("OMNI_SUPPLY_TTL_SECS")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_SUPPLY_TTL)
}

/// Get the HTTP timeout from OMNI_HTTP_TIMEOUT_SECS env var (default: 10)
fn get_http_timeout() -> Duration {
    std::env::var("OMNI_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_HTTP_TIMEOUT)
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
}

/// Global metric tile values from one snapshot.
#[derive(Debug, Clone, Copy, Default)]
struct GlobalStats {
    total_volume_24h: f64,
    cumulative_volume: f64,
    tvl: f64,
    open_interest: f64,
}

/// One completed render cycle, delivered from the fetch task.
struct RenderPayload {
    global: GlobalStats,
    views: DashboardViews,
    fetched_at: DateTime<Utc>,
}

/// Dashboard state. On fetch failure only `error` changes; the previous
/// views and tiles stay on screen.
#[derive(Default)]
struct App {
    global: GlobalStats,
    views: DashboardViews,
    last_updated: Option<DateTime<Utc>>,
    error: Option<String>,
    fetching: bool,
    show_analysis: bool,
}

impl App {
    fn apply(&mut self, outcome: Result<RenderPayload, StatsError>) {
        self.fetching = false;
        match outcome {
            Ok(payload) => {
                self.global = payload.global;
                self.views = payload.views;
                self.last_updated = Some(payload.fetched_at);
                self.error = None;
            }
            Err(err) => {
                self.error = Some(err.to_string());
            }
        }
    }
}

/// Fetch, join with the cached supply table, derive, and assemble views.
async fn run_cycle(
    client: &StatsClient,
    supply_cache: &SupplyCache,
) -> Result<RenderPayload, StatsError> {
    let update = client.fetch().await?;
    let supply_map = supply_cache.get();
    let rows = derive_rows(&update.snapshot, &supply_map);
    Ok(RenderPayload {
        global: GlobalStats {
            total_volume_24h: update.snapshot.total_volume_24h,
            cumulative_volume: update.snapshot.cumulative_volume,
            tvl: update.snapshot.tvl,
            open_interest: update.snapshot.open_interest,
        },
        views: assemble(&rows),
        fetched_at: update.fetched_at,
    })
}

fn spawn_fetch(
    client: StatsClient,
    supply_cache: Arc<SupplyCache>,
    tx: mpsc::UnboundedSender<Result<RenderPayload, StatsError>>,
) {
    tokio::spawn(async move {
        let outcome = run_cycle(&client, &supply_cache).await;
        if let Err(err) = &outcome {
            error!(%err, "render cycle aborted");
        }
        let _ = tx.send(outcome);
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logging();

    // Setup panic hook to restore terminal on crash
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let client = StatsClient::new(get_stats_url(), get_http_timeout())?;
    let supply_cache = Arc::new(SupplyCache::new(get_supply_file(), get_supply_ttl()));
    let (tx, mut rx) = mpsc::unbounded_channel();

    info!(url = %get_stats_url(), "starting omni-stats dashboard");

    let mut app = App {
        fetching: true,
        ..App::default()
    };
    spawn_fetch(client.clone(), Arc::clone(&supply_cache), tx.clone());

    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(outcome) = rx.try_recv() {
            app.apply(outcome);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| render_ui(f, &app))?;
            last_tick = Instant::now();
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Char('r') => {
                        if !app.fetching {
                            // Manual refresh drops the cached supply table too.
                            supply_cache.invalidate();
                            app.fetching = true;
                            spawn_fetch(client.clone(), Arc::clone(&supply_cache), tx.clone());
                        }
                    }
                    KeyCode::Tab => app.show_analysis = !app.show_analysis,
                    _ => {}
                }
            }
        }
    }

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn render_ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(13),
            Constraint::Min(5),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_metric_tiles(f, app, chunks[1]);
    render_top_lists(f, app, chunks[2]);
    if app.show_analysis {
        render_analysis(f, app, chunks[3]);
    } else {
        render_listings(f, app, chunks[3]);
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let status = if let Some(err) = &app.error {
        Span::styled(format!("  {err}"), Style::default().fg(C_ERROR))
    } else if app.fetching {
        Span::styled("  fetching...", Style::default().fg(C_DIM))
    } else {
        Span::raw("")
    };

    let updated = app
        .last_updated
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());

    let lines = vec![
        Line::from(vec![
            Span::styled(
                "VARIATIONAL OMNI DASHBOARD",
                Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
            ),
            status,
        ]),
        Line::from(vec![
            Span::styled("Last Updated: ", Style::default().fg(C_DIM)),
            Span::styled(updated, Style::default().fg(C_BRIGHT)),
            Span::styled(
                "   [r] refresh  [Tab] listings/analysis  [q] quit",
                Style::default().fg(C_DIM),
            ),
        ]),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn render_metric_tiles(f: &mut Frame, app: &App, area: Rect) {
    let tiles = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    let values = [
        ("Total Volume 24h", app.global.total_volume_24h),
        ("Cumulative Volume", app.global.cumulative_volume),
        ("TVL", app.global.tvl),
        ("Open Interest", app.global.open_interest),
    ];

    for (i, (title, value)) in values.iter().enumerate() {
        let block = Block::default()
            .title(format!(" {title} "))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(C_DIM));
        let text = Line::from(Span::styled(
            format_usd(*value),
            Style::default().fg(C_BRIGHT).add_modifier(Modifier::BOLD),
        ));
        f.render_widget(Paragraph::new(text).block(block), tiles[i]);
    }
}

fn render_top_lists(f: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(area);

    render_top_table(
        f,
        columns[0],
        " HIGHEST FDV / VOLUME 24H ",
        "FDV / Volume 24h",
        &app.views.top_fdv_volume,
        |row| format_ratio(row.fdv_over_volume),
    );
    render_top_table(
        f,
        columns[1],
        " HIGHEST FDV / TOTAL OI ",
        "FDV / Total OI",
        &app.views.top_fdv_total_oi,
        |row| format_ratio(row.fdv_over_total_oi),
    );
    render_top_table(
        f,
        columns[2],
        " HIGHEST HOURLY FUNDING ",
        "Hourly Funding Rate",
        &app.views.top_funding,
        |row| format_pct(row.hourly_funding_rate, 4),
    );
}

fn render_top_table(
    f: &mut Frame,
    area: Rect,
    title: &str,
    metric_header: &str,
    rows: &[DerivedRow],
    metric: impl Fn(&DerivedRow) -> String,
) {
    let header = Row::new([
        Cell::from("Ticker").style(header_style()),
        Cell::from(metric_header).style(header_style()),
    ]);

    let body = rows.iter().map(|row| {
        Row::new([
            Cell::from(row.ticker.clone()).style(Style::default().fg(C_BRIGHT)),
            Cell::from(metric(row)).style(Style::default().fg(C_ACCENT)),
        ])
    });

    let table = Table::new(body, [Constraint::Length(8), Constraint::Min(12)])
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(C_DIM)),
        );
    f.render_widget(table, area);
}

fn render_listings(f: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(
        [
            "Ticker",
            "Name",
            "Price",
            "Volume 24h",
            "Hourly Funding",
            "Spread (bps)",
            "FDV",
            "Long OI",
            "Short OI",
        ]
        .map(|h| Cell::from(h).style(header_style())),
    );

    let body = app.views.listings.iter().map(|row| {
        Row::new([
            Cell::from(row.ticker.clone()).style(Style::default().fg(C_BRIGHT)),
            Cell::from(row.name.clone()).style(Style::default().fg(C_DIM)),
            Cell::from(format_usd_precise(row.price)),
            Cell::from(format_usd(row.volume_24h)),
            Cell::from(format_pct(row.hourly_funding_rate, 6)),
            Cell::from(format!("{:.2}", row.base_spread_bps)),
            Cell::from(format_fdv(row.fdv)),
            Cell::from(format_usd(row.long_oi)),
            Cell::from(format_usd(row.short_oi)),
        ])
    });

    let table = Table::new(
        body,
        [
            Constraint::Length(8),
            Constraint::Min(12),
            Constraint::Length(14),
            Constraint::Length(16),
            Constraint::Length(14),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(14),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(" MARKET LISTINGS ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(C_DIM)),
    );
    f.render_widget(table, area);
}

fn render_analysis(f: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(
        [
            "Ticker",
            "FDV / Volume 24h",
            "FDV / Long OI",
            "FDV / Short OI",
            "FDV / Total OI",
        ]
        .map(|h| Cell::from(h).style(header_style())),
    );

    let body = app.views.analysis.iter().map(|row| {
        Row::new([
            Cell::from(row.ticker.clone()).style(Style::default().fg(C_BRIGHT)),
            Cell::from(format_ratio(row.fdv_over_volume)),
            Cell::from(format_ratio(row.fdv_over_long_oi)),
            Cell::from(format_ratio(row.fdv_over_short_oi)),
            Cell::from(format_ratio(row.fdv_over_total_oi)),
        ])
    });

    let table = Table::new(
        body,
        [
            Constraint::Length(8),
            Constraint::Length(18),
            Constraint::Length(16),
            Constraint::Length(16),
            Constraint::Length(16),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(" ANALYSIS (traded markets) ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(C_DIM)),
    );
    f.render_widget(table, area);
}

fn header_style() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}
