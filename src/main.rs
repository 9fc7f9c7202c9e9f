use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    Terminal,
};
use tracing::{error, info};

use saido::app::{App, View};
use saido::config::{self, DashboardInfo};
use saido::driver::Driver;
use saido::inspector::{Inspector, MetricRegistry};
use saido::inventory::Strategy;
use saido::poll::{self, InspectorSampler, PollHandle, Sampler};
use saido::ui::{self, Theme};
use saido::{events, logging, Settings};

/// How often the dashboard pulls new samples from the pollers.
const REFRESH_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Parser, Debug)]
#[command(name = "saido")]
#[command(about = "Terminal dashboard for polling metrics from local and SSH hosts")]
struct Args {
    /// Path to the dashboard document
    #[arg(default_value = "config.yaml")]
    config: PathBuf,

    /// Runtime settings file (TOML, YAML or JSON)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Hosts per page (overrides settings)
    #[arg(long)]
    page_size: Option<usize>,

    /// Validate the configuration, print the resolved inventory and exit
    #[arg(long)]
    check: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings =
        Settings::load(args.settings.as_deref()).context("Failed to load settings")?;
    if let Some(page_size) = args.page_size {
        if page_size == 0 {
            bail!("--page-size must be at least 1");
        }
        settings.page_size = page_size;
    }

    logging::init(&settings.log_path(), &settings.log_level)?;

    let info = config::load(&args.config)
        .with_context(|| format!("Invalid configuration in {}", args.config.display()))?;

    // Handle check mode (non-interactive)
    if args.check {
        print_inventory(&info);
        return Ok(());
    }

    run_dashboard(info, &settings)
}

/// Print the resolved inventory as a table.
fn print_inventory(info: &DashboardInfo) {
    println!("{} (poll every {}s)", info.title, info.poll_interval.as_secs());

    let metrics: Vec<String> = info
        .metrics
        .iter()
        .map(|(name, command)| match command {
            Some(command) => format!("{} ({})", name, command),
            None => name.clone(),
        })
        .collect();
    println!("Metrics: {}", metrics.join(", "));
    println!();

    println!(
        "{:<30} {:<20} {:<6} {:<30} {:>5}",
        "ADDRESS", "ALIAS", "DRIVER", "TARGET", "PORT"
    );
    for host in &info.hosts {
        let connection = &host.connection;
        let target = match connection.username {
            Some(ref user) => format!("{}@{}", user, connection.target_host),
            None => connection.target_host.clone(),
        };
        let port = match connection.strategy {
            Strategy::RemoteShell => connection.port.to_string(),
            Strategy::Local => "-".to_string(),
        };
        println!(
            "{:<30} {:<20} {:<6} {:<30} {:>5}",
            host.address,
            host.display_alias(),
            connection.strategy.label(),
            target,
            port
        );
    }
}

/// Start polling and run the dashboard until the user quits.
fn run_dashboard(info: DashboardInfo, settings: &Settings) -> Result<()> {
    let registry = MetricRegistry::new();
    let mut inspectors: BTreeMap<String, Arc<dyn Inspector>> = BTreeMap::new();
    for (name, command) in &info.metrics {
        inspectors.insert(name.clone(), registry.inspector(name, command.as_deref())?);
    }

    // Build a tokio runtime for the pollers; the UI stays on this thread
    let rt = tokio::runtime::Runtime::new()?;
    let handle = {
        let _guard = rt.enter();
        start_polling(&info, &inspectors, settings.sample_timeout())
    };

    let app = App::new(&info, handle.board(), settings.page_size, Theme::auto_detect());
    let result = run_tui(app);

    // Signal shutdown
    if let Err(e) = rt.block_on(handle.stop(settings.shutdown_grace())) {
        eprintln!("Warning: {}", e);
    }

    if let Err(ref e) = result {
        error!(error = %e, "Dashboard exited with an error");
    }
    result
}

fn start_polling(
    info: &DashboardInfo,
    inspectors: &BTreeMap<String, Arc<dyn Inspector>>,
    deadline: Duration,
) -> PollHandle {
    // One driver per host, shared by its metrics
    let mut drivers: HashMap<String, Arc<dyn Driver>> = HashMap::new();
    let metrics: Vec<String> = inspectors.keys().cloned().collect();

    poll::start(
        &info.hosts,
        &metrics,
        |host, metric| -> Arc<dyn Sampler> {
            let driver = drivers
                .entry(host.address.clone())
                .or_insert_with(|| host.connection.to_driver())
                .clone();
            Arc::new(InspectorSampler::new(driver, inspectors[metric].clone(), deadline))
        },
        info.poll_interval,
    )
}

/// Run the TUI with the given app
fn run_tui(mut app: App) -> Result<()> {
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

    info!(title = %app.title, "Dashboard started");
    app.refresh();

    // Run the main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let mut last_refresh = Instant::now();
    // Where the host table was last drawn, for mouse hit testing
    let mut table_area = Rect::default();

    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                table_area = Rect::default();
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let centered = Rect::new(
                    0,
                    (area.height / 2).saturating_sub(2),
                    area.width,
                    5.min(area.height),
                );
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Metric tabs
                Constraint::Min(8),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::common::render_tabs(frame, app, chunks[1]);

            let content =
                Layout::horizontal([Constraint::Percentage(30), Constraint::Percentage(70)])
                    .split(chunks[2]);
            ui::common::render_log(frame, app, content[0]);
            table_area = content[1];
            match app.view {
                View::Hosts => ui::hosts::render(frame, app, content[1]),
                View::Detail => ui::detail::render(frame, app, content[1]),
            }

            ui::common::render_status_bar(frame, app, chunks[3]);

            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        // Poll for events with a short timeout
        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse, table_area),
                _ => {}
            }
        }

        if last_refresh.elapsed() >= REFRESH_INTERVAL {
            app.refresh();
            last_refresh = Instant::now();
        }
    }

    Ok(())
}
