mod app;
mod widgets;

use cuentacuentos_core::Storyteller;
use std::sync::Arc;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            // Override with RUST_LOG, e.g. RUST_LOG=cuentacuentos_core::api=debug
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cuentacuentos_core=info,cuentacuentos_gui=info".into()),
        )
        .init();
}

fn main() -> iced::Result {
    init_logging();

    let teller = match Storyteller::from_env() {
        Ok(teller) => Arc::new(teller),
        Err(e) => {
            eprintln!("Failed to set up the story client: {}", e);
            std::process::exit(1);
        }
    };

    iced::application("Cuentacuentos", app::update, app::view)
        .run_with(move || app::initialize(teller.clone()))
}
