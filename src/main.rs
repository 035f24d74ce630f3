use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::cursor::SetCursorStyle;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::*;

mod app;
mod artifact_io;
mod backend;
mod config;
mod default_config;
mod events;
mod registry;
mod scripts;
mod services;
mod session;
mod theme;
mod ui;

use app::{App, Page};
use backend::{HttpQaBackend, QaBackend};
use config::ConsoleConfig;
use events::AppEvent;
use services::{DefaultWorkflowService, WorkflowService};
use theme::Theme;

fn main() -> io::Result<()> {
    let launch_options = parse_launch_options(std::env::args().skip(1))?;
    if launch_options.show_help {
        print_usage();
        return Ok(());
    }

    let mut config = ConsoleConfig::load()?;
    if let Some(api_url) = launch_options.api_url {
        config.api.base_url = api_url;
    }
    let backend = HttpQaBackend::new(
        &config.api.base_url,
        Duration::from_secs(config.api.timeout_secs),
    )
    .map_err(io::Error::other)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, SetCursorStyle::SteadyBar)?;

    let terminal_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(terminal_backend)?;
    terminal.clear()?;
    let theme_path = launch_options
        .theme_file
        .unwrap_or_else(|| PathBuf::from("theme.toml"));
    let theme = Theme::load_or_default(theme_path);

    let result = run_app(&mut terminal, App::default(), &theme, &backend, &config);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        SetCursorStyle::DefaultUserShape,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    theme: &Theme,
    backend: &dyn QaBackend,
    config: &ConsoleConfig,
) -> io::Result<()> {
    let result = event_loop(terminal, &mut app, theme, backend, config);
    // Best-effort cleanup signal, fired on every teardown path including
    // loop errors; never blocks shutdown and is not retried.
    backend.notify_session_closed(app.session());
    result
}

fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    theme: &Theme,
    backend: &dyn QaBackend,
    config: &ConsoleConfig,
) -> io::Result<()> {
    let services = DefaultWorkflowService;
    app.push_info(format!(
        "Connected to {} as session {}.",
        config.api.base_url,
        app.session().id()
    ));

    while app.running {
        terminal.draw(|frame| ui::render(frame, app, theme))?;

        // Effect of the InFlight state, observed after the frame that shows
        // the generating marker: claim the single pending dispatch, issue the
        // call, resolve the state, then redraw before reading more input. A
        // second iteration finds nothing left to claim.
        if services.dispatch_pending_script(app, backend) {
            continue;
        }

        match events::next_event()? {
            AppEvent::Tick => {}
            AppEvent::Quit => app.quit(),
            AppEvent::SwitchPage => app.switch_page(),
            AppEvent::MoveUp => app.move_selection_up(),
            AppEvent::MoveDown => app.move_selection_down(),
            AppEvent::CursorLeft => app.cursor_left(),
            AppEvent::CursorRight => app.cursor_right(),
            AppEvent::InputChar(c) => app.input_char(c),
            AppEvent::Backspace => app.backspace(),
            AppEvent::ToggleExpand => app.toggle_expanded(),
            AppEvent::GenerateScript => app.request_script_for_selected(),
            AppEvent::SaveScript => {
                services.save_selected_script(app, &config.downloads.dir);
            }
            AppEvent::Submit => {
                submit_active_page(terminal, app, &services, backend, theme)?;
            }
        }
    }

    Ok(())
}

/// Runs the blocking top-level action for the current page. One frame with
/// the busy hint is drawn before the call so the user sees progress while the
/// loop is blocked.
fn submit_active_page<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    services: &DefaultWorkflowService,
    backend: &dyn QaBackend,
    theme: &Theme,
) -> io::Result<()> {
    match app.page() {
        Page::KnowledgeBase => {
            let input = app.knowledge_input().to_string();
            if !input.trim().is_empty() {
                app.set_busy("Ingesting documents...");
                terminal.draw(|frame| ui::render(frame, app, theme))?;
            }
            services.build_knowledge_base(app, backend, &input);
        }
        Page::TestCases => {
            let query = app.query_input().to_string();
            if !query.trim().is_empty() {
                app.set_busy("Analyzing knowledge base and generating test cases...");
                terminal.draw(|frame| ui::render(frame, app, theme))?;
            }
            services.generate_test_cases(app, backend, &query);
        }
    }
    app.clear_busy();
    Ok(())
}

#[derive(Debug, Default)]
struct LaunchOptions {
    api_url: Option<String>,
    theme_file: Option<PathBuf>,
    show_help: bool,
}

fn parse_launch_options<I>(args: I) -> io::Result<LaunchOptions>
where
    I: IntoIterator<Item = String>,
{
    let mut options = LaunchOptions::default();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--api-url" => {
                let Some(url) = iter.next() else {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "--api-url requires a URL argument",
                    ));
                };
                options.api_url = Some(url);
            }
            "--theme" => {
                let Some(path) = iter.next() else {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "--theme requires a path argument",
                    ));
                };
                options.theme_file = Some(PathBuf::from(path));
            }
            "--help" | "-h" => options.show_help = true,
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Unknown argument: {arg}"),
                ));
            }
        }
    }
    Ok(options)
}

fn print_usage() {
    println!("qa-console - terminal client for the Autonomous QA Agent backend");
    println!();
    println!("Usage: qa-console [--api-url URL] [--theme PATH]");
    println!();
    println!("  --api-url URL   Backend base URL (overrides ~/.qa-console/config.toml)");
    println!("  --theme PATH    Theme TOML file (default: theme.toml)");
    println!("  -h, --help      Show this help");
}
