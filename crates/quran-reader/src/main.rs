use anyhow::Result;
use log::LevelFilter;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use quran_reader::App;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger with debug fallback for development
    let mut logger = env_logger::Builder::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        logger.filter_level(LevelFilter::Info);
        logger.filter_module("quran_reader", LevelFilter::Debug);
        logger.filter_module("quran_core", LevelFilter::Debug);
    }
    logger.init();

    let mut app = match App::new().await {
        Ok(app) => {
            log::info!("Application initialized successfully");
            app
        }
        Err(e) => {
            eprintln!("Failed to start the reader: {}", e);
            if let Some(source) = e.source() {
                eprintln!("Cause: {}", source);
            }
            return Err(e);
        }
    };

    // Optional starting reference, e.g. `quran-reader 2:255`
    if let Some(reference) = std::env::args().nth(1) {
        let output = app.handle_line(&format!("goto {}", reference)).await;
        if output.is_empty() {
            log::warn!("Could not open '{}' from the command line", reference);
        }
    }

    let res = run_app(&mut app).await;

    app.shutdown();

    if let Err(err) = res {
        eprintln!("Error while running the reader: {}", err);
        log::error!("Application error: {}", err);
    }

    Ok(())
}

async fn run_app(app: &mut App) -> Result<()> {
    app.refresh_auxiliary().await;
    println!("{}\n", app.render_current());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        app.update_status();
        print!("{}", app.prompt());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            log::info!("Input closed");
            break;
        };

        let output = app.handle_line(&line).await;
        if !output.is_empty() {
            println!("{}\n", output);
        }

        if app.should_quit() {
            log::info!("Application shutdown requested");
            break;
        }
    }

    Ok(())
}
