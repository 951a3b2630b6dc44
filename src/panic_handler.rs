use crossterm::{
    event::DisableMouseCapture,
    execute,
    terminal::{LeaveAlternateScreen, disable_raw_mode},
};
use log::error;

/// Puts the terminal back into a usable state before the panic report is
/// printed, otherwise the report lands inside the alternate screen.
pub fn initialize_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        error!("Application panicked: {panic_info}");

        if cfg!(debug_assertions) {
            better_panic::Settings::auto()
                .most_recent_first(false)
                .lineno_suffix(true)
                .create_panic_handler()(panic_info);
        } else {
            let metadata = human_panic::metadata!();
            let report_path = human_panic::handle_dump(&metadata, panic_info);
            human_panic::print_msg(report_path, &metadata)
                .unwrap_or_else(|_| default_hook(panic_info));
        }

        std::process::exit(1);
    }));
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(std::io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
}
