use clap::Parser;
use rsidx::{
    cli::{init_verbose, Cli, Command, FULL_VERSION},
    commands::{annotate, convert},
    utils::{
        util::{handle_error_and_exit, Result},
        util_intern::{peak_memory_usage, readable_size},
    },
};
use std::time;

fn runner() -> Result<()> {
    let cli = Cli::parse();
    init_verbose(&cli)?;
    log::trace!("CLI options set: {:?}", cli);

    log::info!(
        "Running {}-{} [{}]",
        env!("CARGO_PKG_NAME"),
        &**FULL_VERSION,
        cli.command.name()
    );

    let start_timer = time::Instant::now();
    match cli.command {
        Command::Annotate(args) => {
            log::trace!("Annotate arguments: {:#?}", args);
            annotate(args)?
        }
        Command::Convert(args) => {
            log::trace!("Convert arguments: {:#?}", args);
            convert(args)?
        }
    }
    log::info!("Total execution time: {:.2?}", start_timer.elapsed());

    match peak_memory_usage() {
        Ok(bytes) => {
            let (size, unit) = readable_size(bytes);
            log::info!("Peak memory use: {:.2} {}", size, unit);
        }
        Err(e) => log::debug!("Peak memory use unavailable: {e}"),
    }

    log::info!("{} end", env!("CARGO_PKG_NAME"));
    Ok(())
}

fn main() {
    if let Err(e) = runner() {
        handle_error_and_exit(e);
    }
}
