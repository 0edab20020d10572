//! Osrview - Off-Screen Browser Embedding Demo
//!
//! Entry point: parses the few host options and runs the windowed shell.

use std::env;
use std::process;

use osrview::ui::{self, ViewConfig};
use osrview::{NAME, VERSION};

fn usage() -> ! {
    println!(
        "{NAME} v{VERSION}\n\
         \n\
         Usage: osrview [OPTIONS]\n\
         \n\
         Options:\n\
         \x20 --transparent        zero-alpha background; blend the view quad\n\
         \x20 --show-update-rect   outline the most recent dirty rectangle\n\
         \x20 --width <px>         initial window width (default 800)\n\
         \x20 --height <px>        initial window height (default 600)\n\
         \x20 --help               print this message"
    );
    process::exit(0);
}

fn parse_args() -> ViewConfig {
    let mut config = ViewConfig::default();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--transparent" => config.background_color = [0, 0, 0, 0],
            "--show-update-rect" => config.show_update_rect = true,
            "--width" => match args.next().and_then(|v| v.parse().ok()) {
                Some(width) => config.window_width = width,
                None => {
                    eprintln!("--width needs a pixel value");
                    process::exit(2);
                }
            },
            "--height" => match args.next().and_then(|v| v.parse().ok()) {
                Some(height) => config.window_height = height,
                None => {
                    eprintln!("--height needs a pixel value");
                    process::exit(2);
                }
            },
            "--help" | "-h" => usage(),
            other => {
                eprintln!("unknown option: {other}");
                process::exit(2);
            }
        }
    }
    config
}

fn main() {
    env_logger::init();

    let config = parse_args();
    log::info!("{NAME} v{VERSION} starting ({}x{})", config.window_width, config.window_height);

    if let Err(e) = ui::run(config) {
        eprintln!("{NAME} failed: {e}");
        process::exit(1);
    }
}
