use std::env::args_os;

use pixkit::{CLIParser, Outcome, init_logger, run};

fn main() {
    let mut cli_parser = CLIParser::default();
    let arguments = cli_parser.parse(args_os());
    if let Err(e) = init_logger(arguments.log_config.as_deref(), arguments.verbose) {
        eprintln!("Logging disabled because of: {}", e);
    }

    let outcomes = run(&arguments);
    let converted = outcomes
        .iter()
        .filter(|o| matches!(o, Outcome::Converted { .. }))
        .count();
    log::info!("{} of {} inputs converted", converted, outcomes.len());
}
