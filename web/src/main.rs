extern crate console_error_panic_hook;

use std::panic;

use log::error;

use gitlab_panel_web::{config::load_panel_config, init_log, start};

fn main() {
    panic::set_hook(Box::new(console_error_panic_hook::hook));
    init_log();

    if let Err(error) = load_panel_config().and_then(start) {
        error!("Unable to mount GitLab panel: {error:?}");
    }
}
