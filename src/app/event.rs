// Keyboard event handling
//
// Maps key presses onto state changes and the network tasks they need.

use super::{AppState, Task};
use crossterm::event::KeyCode;

/// Handle keyboard events and update application state
///
/// Returns the tasks the key press asks for; the caller spawns them.
///
/// # Key Bindings
/// - `q`, `Q`, `Esc` - Quit the application
/// - `s`, `S` - Start the simulation
/// - `p`, `P` - Pause the simulation
/// - `+`, `=` - Next faster speed preset
/// - `-`, `_` - Next slower speed preset
/// - `Up` / `Down` - Select scenario
/// - `Enter` - Load the selected scenario
/// - `c`, `C` - Reload the scenario catalog
/// - `Left` / `Right` - Select building for the inspector
/// - `r`, `R` - Refresh the snapshot now
/// - `a`, `A` - Open or close the analytics report
pub fn handle_key_event(app: &mut AppState, key: KeyCode) -> Vec<Task> {
    match key {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
            app.running = false;
            Vec::new()
        }
        KeyCode::Char('s') | KeyCode::Char('S') => app.start_simulation(),
        KeyCode::Char('p') | KeyCode::Char('P') => app.pause_simulation(),
        KeyCode::Char('+') | KeyCode::Char('=') => app.speed_up(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.slow_down(),
        KeyCode::Up => {
            app.select_previous_scenario();
            Vec::new()
        }
        KeyCode::Down => {
            app.select_next_scenario();
            Vec::new()
        }
        KeyCode::Enter => app.load_selected_scenario(),
        KeyCode::Char('c') | KeyCode::Char('C') => vec![Task::FetchCatalog],
        KeyCode::Left => {
            app.select_previous_building();
            Vec::new()
        }
        KeyCode::Right => {
            app.select_next_building();
            Vec::new()
        }
        KeyCode::Char('r') | KeyCode::Char('R') => app.request_refresh(),
        KeyCode::Char('a') | KeyCode::Char('A') => app.toggle_report(),
        _ => Vec::new(),
    }
}
