//! Component trait implemented by every screen.

use color_eyre::eyre::Result;
use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::{Frame, layout::Rect};

use crate::action::{Action, ScreenTx, ScreenUpdate};

/// Lifecycle: `init` → (`handle_key_event` | `update` | `apply` | `render`)* → `unmount`
pub trait Component: Send {
    /// Called once when the screen becomes active.
    fn init(&mut self, _tx: ScreenTx) -> Result<()> {
        Ok(())
    }

    fn handle_key_event(&mut self, _key: KeyEvent) -> Result<Option<Action>> {
        Ok(None)
    }

    fn handle_mouse_event(&mut self, _mouse: MouseEvent) -> Result<Option<Action>> {
        Ok(None)
    }

    /// Observe a broadcast action (ticks, session and domain events).
    fn update(&mut self, _action: &Action) -> Result<Option<Action>> {
        Ok(None)
    }

    /// Take the result of a task this screen spawned.
    fn apply(&mut self, _update: ScreenUpdate) -> Result<Option<Action>> {
        Ok(None)
    }

    /// Called when the screen is replaced. In-flight work is abandoned.
    fn unmount(&mut self) {}

    /// True while the screen is capturing text input, so global keys
    /// like `q` go to the screen instead.
    fn captures_input(&self) -> bool {
        false
    }

    fn render(&self, frame: &mut Frame, area: Rect);

    fn id(&self) -> &'static str;
}
