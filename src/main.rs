use anyhow::Result;
use std::process;
use log::{error, info};
use blogstats::{app, cli, display, logging};

fn main() {
    if let Err(e) = run() {
        error!("Application error: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = cli::parse_args();
    cli::validate_args(&args)?;

    let config_manager = app::load_configuration(&args)?;

    let log_config = app::configure_logging(&args, &config_manager)?;
    logging::init_logger(log_config)?;

    let colours = app::create_colour_manager(&args, &config_manager);
    let repo_path = app::resolve_repository_path(args.repository.as_deref())?;
    let settings = app::build_settings(&args, &config_manager, repo_path)?;

    let outcome = app::run_pipeline(&settings)?;

    print!("{}", display::render_stats_table(&outcome.cache, &colours));
    if !outcome.gathered.is_empty() {
        println!(
            "{} {:?} -> {}",
            colours.success("Gathered"),
            outcome.gathered,
            settings.cache_file.display()
        );
    }
    for chart in &outcome.charts {
        info!("Chart written: {}", chart.display());
    }

    Ok(())
}
