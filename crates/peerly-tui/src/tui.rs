//! Terminal setup, teardown and panic-safe restoration.
//!
//! Raw mode and the alternate screen are owned by [`Tui`]; nothing else in
//! the app touches crossterm's terminal state.

use std::io::{Stdout, stdout};

use color_eyre::eyre::Result;
use crossterm::{
    ExecutableCommand, cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{Terminal, backend::CrosstermBackend};

pub type Backend = CrosstermBackend<Stdout>;

pub struct Tui {
    pub terminal: Terminal<Backend>,
}

impl Tui {
    /// Create the terminal without entering raw mode.
    pub fn new() -> Result<Self> {
        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }

    /// Alternate screen, raw mode, mouse capture, hidden cursor.
    pub fn enter(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;
        stdout().execute(EnableMouseCapture)?;
        stdout().execute(cursor::Hide)?;
        stdout().execute(terminal::SetTitle("peerly"))?;
        self.terminal.clear()?;
        Ok(())
    }

    /// Restore the terminal. Every step is attempted even if one fails.
    pub fn exit(&mut self) {
        restore_terminal();
    }

    pub fn draw<F>(&mut self, render: F) -> Result<()>
    where
        F: FnOnce(&mut ratatui::Frame),
    {
        self.terminal.draw(render)?;
        Ok(())
    }

    /// Terminal size as (cols, rows).
    pub fn size(&self) -> Result<(u16, u16)> {
        let size = self.terminal.size()?;
        Ok((size.width, size.height))
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        self.exit();
    }
}

fn restore_terminal() {
    let _ = stdout().execute(cursor::Show);
    let _ = stdout().execute(DisableMouseCapture);
    let _ = stdout().execute(LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
}

/// Install error and panic hooks. Panics restore the terminal first, then
/// print a full backtrace in debug builds and a crash report file in
/// release builds.
///
/// Call before [`Tui::enter`] so panics during startup also print cleanly.
pub fn install_hooks() -> Result<()> {
    let (_, eyre_hook) = color_eyre::config::HookBuilder::default()
        .display_env_section(false)
        .into_hooks();
    eyre_hook.install()?;

    #[cfg(debug_assertions)]
    {
        std::panic::set_hook(Box::new(|info| {
            restore_terminal();
            better_panic::Settings::auto()
                .most_recent_first(false)
                .lineno_suffix(true)
                .create_panic_handler()(info);
        }));
    }

    #[cfg(not(debug_assertions))]
    {
        let metadata = human_panic::metadata!();
        std::panic::set_hook(Box::new(move |info| {
            restore_terminal();
            let file_path = human_panic::handle_dump(&metadata, info);
            let _ = human_panic::print_msg(file_path, &metadata);
        }));
    }

    Ok(())
}
