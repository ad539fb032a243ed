use clap::error::ErrorKind;
use clap::{
    Arg, ArgAction, ArgMatches, Command, arg, crate_description, crate_name, crate_version,
    value_parser,
};
use std::ffi::OsString;
use std::path::PathBuf;

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arguments {
    pub inputs: Vec<PathBuf>,
    pub out_dir: PathBuf,
    pub log_config: Option<PathBuf>,
    pub verbose: bool,
}

pub struct CLIParser {
    command: Command,
}

impl CLIParser {
    pub fn new() -> Self {
        let command = Self::create_base_command();
        let command = Self::register_arguments(command);
        CLIParser { command }
    }

    /// Parse `itr` into [`Arguments`].
    ///
    /// Usage errors, `--help` and `--version` print their message and end
    /// the process with status 0.
    pub fn parse<I, T>(&mut self, itr: I) -> Arguments
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        self.try_parse(itr).unwrap_or_else(|e| {
            Self::report(&e);
            std::process::exit(0)
        })
    }

    /// Parse `itr` into [`Arguments`], returning clap's error for usage
    /// errors, `--help` and `--version`.
    pub fn try_parse<I, T>(&mut self, itr: I) -> Result<Arguments, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self.command.try_get_matches_from_mut(itr)?;
        Ok(Self::extract_arguments(&matches))
    }

    /// Print a parse error; help and version text go to stdout.
    fn report(error: &clap::Error) {
        let message = error.render();
        match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => print!("{}", message),
            _ => eprint!("{}", message),
        }
    }

    fn register_arguments(command: Command) -> Command {
        let command = Self::register_inputs_argument(command);
        let command = Self::register_out_dir_argument(command);
        let command = Self::register_log_config_argument(command);
        Self::register_verbose_argument(command)
    }

    fn register_inputs_argument(command: Command) -> Command {
        command.arg(Self::create_inputs_argument())
    }

    fn register_out_dir_argument(command: Command) -> Command {
        command.arg(Self::create_out_dir_argument())
    }

    fn register_log_config_argument(command: Command) -> Command {
        command.arg(Self::create_log_config_argument())
    }

    fn register_verbose_argument(command: Command) -> Command {
        command.arg(Self::create_verbose_argument())
    }

    fn create_base_command() -> Command {
        Command::new(crate_name!())
            .version(crate_version!())
            .about(crate_description!())
    }

    fn create_inputs_argument() -> Arg {
        Arg::new("inputs")
            .help("Image files to convert (bmp, jpg, jpeg, png, pbm, pgm, ppm)")
            .value_parser(value_parser!(PathBuf))
            .num_args(0..)
            .action(ArgAction::Append)
    }

    fn create_out_dir_argument() -> Arg {
        arg!(out_dir: -o --"out-dir" <DIR> "Directory for converted files")
            .default_value("out")
            .required(false)
            .value_parser(value_parser!(PathBuf))
    }

    fn create_log_config_argument() -> Arg {
        arg!(log_config: -l --"log-config" <FILE> "log4rs YAML configuration")
            .required(false)
            .value_parser(value_parser!(PathBuf))
    }

    fn create_verbose_argument() -> Arg {
        arg!(verbose: -v --verbose "Log debug messages to the console").action(ArgAction::SetTrue)
    }

    fn extract_arguments(matches: &ArgMatches) -> Arguments {
        Arguments {
            inputs: Self::extract_inputs_argument(matches),
            out_dir: Self::extract_out_dir_argument(matches),
            log_config: Self::extract_log_config_argument(matches),
            verbose: Self::extract_verbose_argument(matches),
        }
    }

    fn extract_inputs_argument(matches: &ArgMatches) -> Vec<PathBuf> {
        matches
            .get_many::<PathBuf>("inputs")
            .map(|values| values.cloned().collect())
            .unwrap_or_default()
    }

    fn extract_out_dir_argument(matches: &ArgMatches) -> PathBuf {
        matches
            .get_one::<PathBuf>("out_dir")
            .cloned()
            .unwrap_or_else(|| PathBuf::from("out"))
    }

    fn extract_log_config_argument(matches: &ArgMatches) -> Option<PathBuf> {
        matches.get_one::<PathBuf>("log_config").cloned()
    }

    fn extract_verbose_argument(matches: &ArgMatches) -> bool {
        matches.get_flag("verbose")
    }
}

impl Default for CLIParser {
    fn default() -> Self {
        Self::new()
    }
}
