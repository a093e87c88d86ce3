use anyhow::Result;
use cardwall::{config::Config, config::DEFAULT_CONFIG_FILE, kanban_board::KanbanBoard, logging, ui};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, path::PathBuf};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "cardwall")]
#[command(version, about = "Terminal kanban board with due-date urgency badges")]
struct Cli {
    /// Path to the config file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Board file to open, overriding the config
    #[arg(long)]
    board: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if let Some(board) = cli.board {
        config.board_file = board;
    }
    let _guard = logging::init(&config, cli.verbose)?;

    // Board setup
    let mut board = KanbanBoard::load(&config.board_file)?;
    if board.lists.is_empty() {
        board = KanbanBoard::with_lists(&config.default_lists)?;
        info!(lists = config.default_lists.len(), "seeded default lists");
    }

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = ui::run_app(&mut terminal, &mut board, &config);

    // Save, then restore the terminal
    ui::save_and_restore(&board, &config.board_file, || {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()
    })?;

    if let Err(err) = result {
        error!(%err, "board loop failed");
        eprintln!("{:?}", err);
    }
    Ok(())
}
