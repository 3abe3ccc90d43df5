//! Command line entry point.

#[cfg(feature = "native")]
fn main() {
    env_logger::init();
    log::info!("Starting LayoutKit");

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("Usage: layoutkit <script.json>");
        std::process::exit(2);
    };
    match layoutkit_app::run_script(std::path::Path::new(&path)) {
        Ok(report) => println!("{report}"),
        Err(err) => {
            log::error!("Replay of {path} failed: {err}");
            std::process::exit(1);
        }
    }
}

#[cfg(not(feature = "native"))]
fn main() {
    panic!("Native feature not enabled. Use `cargo run --features native`");
}
