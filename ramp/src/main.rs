use clap::Parser;
use load_ramp::args::RampArgs;
use load_ramp::cache::DirectoryStore;
use load_ramp::config::RampConfig;
use load_ramp::error::RampError;
use load_ramp::executor::ProcessExecutor;
use load_ramp::interrupt::InterruptHandler;
use load_ramp::logging::Logging;
use load_ramp::orchestrator::Sweep;
use load_ramp::target::Target;
use std::fs;
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match RampArgs::try_parse() {
        Ok(args) => args,
        Err(error) => {
            let _ = error.print();
            return ExitCode::from(error.exit_code() as u8);
        }
    };
    if args.help {
        eprintln!("{}", RampArgs::usage());
        return ExitCode::from(1);
    }

    let mut logging = Logging::new();
    logging.init(args.quiet, &args.debug);

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if let RampError::InvalidTarget(_) = error {
                eprintln!("{}", RampArgs::usage());
            }
            if args.quiet {
                eprintln!("{error}");
            }
            error!("{error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run(args: &RampArgs) -> Result<(), RampError> {
    let target = read_target(args)?;

    let mut config = RampConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;
    fs::create_dir_all(&config.output_dir)?;

    let interrupted = Arc::new(AtomicBool::new(false));
    tokio::spawn(InterruptHandler::new(interrupted.clone()).listen());

    let mut sweep = Sweep::new(
        &config,
        target,
        Arc::new(ProcessExecutor),
        Arc::new(DirectoryStore::new(&config.output_dir)),
        interrupted,
    )?;
    let outcome = sweep.run().await?;

    if outcome.render_failures.is_empty() {
        info!("Finished the sweep.");
    } else {
        warn!(
            "Finished the sweep, {} render stage(s) failed. Datasets are in '{}'.",
            outcome.render_failures.len(),
            config.output_dir.display()
        );
    }
    Ok(())
}

fn read_target(args: &RampArgs) -> Result<Target, RampError> {
    let text = match &args.target_file {
        Some(path) => fs::read_to_string(path).map_err(|error| {
            RampError::InvalidTarget(format!("cannot read '{}': {error}", path.display()))
        })?,
        None if io::stdin().is_terminal() => String::new(),
        None => io::read_to_string(io::stdin())?,
    };
    text.parse()
}
