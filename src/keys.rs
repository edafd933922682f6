use crate::app::{App, MenuItem};
use crate::state::messages::Command;
use campus_api::Side;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Apply a key press to the app. Anything that has to leave the UI task
/// (a remount or a gateway write) comes back as a [`Command`].
pub async fn handle_key_bindings(key_event: KeyEvent, app: &Arc<Mutex<App>>) -> Option<Command> {
    let mut guard = app.lock().await;

    match (guard.state.active_tab, key_event.code, key_event.modifiers) {
        // Quit
        (_, Char('q'), _) | (_, Char('c'), KeyModifiers::CONTROL) => {
            crate::cleanup_terminal();
            std::process::exit(0);
        }

        // Tab switching
        (_, Char('1'), _) => guard.update_tab(MenuItem::Live).map(Command::Mount),
        (_, Char('2'), _) => guard.update_tab(MenuItem::Schedule).map(Command::Mount),
        (_, Char('3'), _) => guard.update_tab(MenuItem::Results).map(Command::Mount),
        (_, Char('4'), _) => guard.update_tab(MenuItem::BigScreen).map(Command::Mount),
        (_, Char('5'), _) => guard.update_tab(MenuItem::Teams).map(Command::Mount),
        (_, Char('?'), _) => guard.update_tab(MenuItem::Help).map(Command::Mount),
        (MenuItem::Help, KeyCode::Esc, _) => guard.exit_help().map(Command::Mount),
        (MenuItem::Help, _, _) => None,

        // Scorekeeping
        (MenuItem::Live, Char('a'), _) => guard.adjust_score(Side::A, 1).map(Command::Network),
        (MenuItem::Live, Char('b'), _) => guard.adjust_score(Side::B, 1).map(Command::Network),
        (MenuItem::Live, Char('A'), _) => guard.adjust_score(Side::A, -1).map(Command::Network),
        (MenuItem::Live, Char('B'), _) => guard.adjust_score(Side::B, -1).map(Command::Network),
        (MenuItem::Live | MenuItem::Schedule | MenuItem::Results, Char('s'), _) => {
            guard.cycle_status().map(Command::Network)
        }

        // Big screen
        (MenuItem::BigScreen, Char('h') | KeyCode::Left, _) => {
            guard.move_quadrant(-1);
            None
        }
        (MenuItem::BigScreen, Char('l') | KeyCode::Right, _) => {
            guard.move_quadrant(1);
            None
        }
        (MenuItem::BigScreen, Char('c'), _) => guard.cycle_quadrant_sport().map(Command::Network),
        (MenuItem::BigScreen, Char('x'), _) => guard.clear_quadrant().map(Command::Network),

        // List navigation
        (_, Char('j') | KeyCode::Down, _) => {
            guard.move_selection(1);
            None
        }
        (_, Char('k') | KeyCode::Up, _) => {
            guard.move_selection(-1);
            None
        }

        // Global
        (_, Char('f'), _) => {
            guard.toggle_full_screen();
            None
        }
        (_, Char('"'), _) => {
            guard.toggle_show_logs();
            None
        }

        _ => None,
    }
}
