use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use aquawatch::app::{export_document, App};
use aquawatch::config::{ResolvedSettings, Settings, ThemeChoice};
use aquawatch::events;
use aquawatch::refresh::{run_cycle, DashboardState, RefreshLoop};
use aquawatch::source::ReadingFetcher;
use aquawatch::ui::{self, Theme};

#[derive(Parser, Debug)]
#[command(name = "aquawatch", version)]
#[command(about = "Terminal dashboard for monitoring water-quality sensor readings")]
struct Args {
    /// Path to a TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read readings from a JSON file instead of the configured store
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Initial time range (1h, 24h, 7d, 30d)
    #[arg(long)]
    range: Option<String>,

    /// Refresh interval (e.g., "30s", "1m")
    #[arg(short, long)]
    refresh: Option<String>,

    /// Color theme
    #[arg(long, value_enum)]
    theme: Option<ThemeChoice>,

    /// Write logs to this file while the dashboard is running
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Fetch once, export the dashboard state to a JSON file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // The TUI owns the terminal, so logs only reach stderr in export mode
    init_logging(args.log_file.as_deref(), args.export.is_some())?;

    let settings = load_settings(&args).inspect_err(|e| {
        tracing::error!(error = %e, "invalid settings");
    })?;

    let store = settings.open_store(args.file.as_deref())?;
    let fetcher = ReadingFetcher::new(store).with_page_size(settings.page_size);

    let rt = tokio::runtime::Runtime::new()?;

    if let Some(ref export_path) = args.export {
        return rt.block_on(export_to_file(&fetcher, &settings, export_path));
    }

    run_tui(rt, fetcher, settings)
}

/// Install the tracing subscriber.
fn init_logging(log_file: Option<&Path>, to_stderr: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "aquawatch=info,aquawatch_adapters=info".into());

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };
    let stderr_layer = to_stderr.then(|| fmt::layer().with_writer(io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();
    Ok(())
}

/// Layer command-line flags over file and environment settings.
fn load_settings(args: &Args) -> Result<ResolvedSettings> {
    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(ref refresh) = args.refresh {
        settings.refresh = refresh.clone();
    }
    if let Some(ref range) = args.range {
        settings.range = range.clone();
    }
    if let Some(theme) = args.theme {
        settings.theme = theme.to_string();
    }
    Ok(settings.resolve()?)
}

/// Run the TUI against a refresh loop on the given runtime.
fn run_tui(
    rt: tokio::runtime::Runtime,
    fetcher: ReadingFetcher,
    settings: ResolvedSettings,
) -> Result<()> {
    let description = fetcher.description().to_string();
    let theme = Theme::from_choice(settings.theme);

    let handle = {
        let _guard = rt.enter();
        RefreshLoop::new(fetcher)
            .interval(settings.refresh)
            .range(settings.range)
            .policy(settings.policy.clone())
            .spawn()
    };

    let mut app = App::new(handle, settings.policy.clone())
        .with_source_info(description, settings.refresh)
        .with_theme(theme);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    rt.block_on(app.into_handle().shutdown());
    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    while app.running {
        app.sync();

        terminal.draw(|frame| ui::render(frame, app))?;

        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => {
                    events::handle_mouse_event(app, mouse, ui::CONTENT_START_ROW)
                }
                // Redrawn on the next iteration
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    Ok(())
}

/// Fetch once and write the dashboard state to a JSON file.
async fn export_to_file(
    fetcher: &ReadingFetcher,
    settings: &ResolvedSettings,
    export_path: &Path,
) -> Result<()> {
    let result = run_cycle(fetcher, settings.range).await;

    let mut state = DashboardState::new(settings.range);
    state.apply(1, result, &settings.policy);
    if let Some(err) = state.error() {
        anyhow::bail!("failed to fetch readings from {}: {}", fetcher.description(), err);
    }

    let export = export_document(&state, fetcher.description());
    let json = serde_json::to_string_pretty(&export)?;
    std::fs::write(export_path, json)
        .with_context(|| format!("cannot write {}", export_path.display()))?;

    println!("Exported dashboard state to: {}", export_path.display());
    Ok(())
}
