// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! The tvamcus binary's command-line interface.

use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};

use bounded::{
    checker::{Feedback, Verdict},
    evaluator::Evaluator,
    runner::{Report, Runner},
    timing,
};
use cfgs::{
    config::{Combinator, Configuration, ProcessSelection, PropertyKind},
    loader::{self, LoadError},
    model::Cfgs,
    parser::parse_error_diagnostic,
    printer,
};
use clap::Args;
use codespan_reporting::{
    files::SimpleFile,
    term::{
        self as terminal,
        termcolor::{ColorChoice, StandardStream},
    },
};

#[derive(clap::ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum ColorOutput {
    Never,
    Auto,
    Always,
}

#[derive(Args, Clone, Debug, PartialEq, Eq)]
struct CheckArgs {
    #[arg(short, long)]
    /// Location of interest
    location: usize,

    #[arg(short, long, default_value = "all")]
    /// Processes under test: `all`, or a comma-separated list of ids such as
    /// `(0, 2)`
    processes: String,

    #[arg(long)]
    /// Require only some process under test to be at the location, rather
    /// than all of them
    any: bool,

    #[arg(short, long, default_value_t = 10)]
    /// Largest timestep to search
    bound: usize,

    #[arg(long)]
    /// Only report liveness lassos in which every process moves
    fair: bool,

    #[arg(long)]
    /// Check an abstract model first and confirm its possible violations in
    /// this model
    multi_model: bool,

    #[arg(long = "abstract", value_name = "FILE")]
    /// Abstract model for --multi-model (default: the model's file name
    /// with `_0P` appended)
    abstract_file: Option<String>,

    #[arg(long)]
    /// Print the result as JSON
    json: bool,

    #[arg(long)]
    /// Print timing statistics
    time: bool,

    /// File name for a .json model
    file: String,
}

#[derive(clap::Subcommand, Clone, Debug, PartialEq, Eq)]
enum Command {
    /// Search for a path on which the processes under test reach a location.
    Reachability(CheckArgs),
    /// Search for a lasso on which the processes under test never reach a
    /// location again.
    Liveness(CheckArgs),
    /// Parse and re-print a model (for debugging)
    Print {
        /// File name for a .json model
        file: String,
    },
}

impl Command {
    fn file(&self) -> &str {
        match self {
            Command::Reachability(CheckArgs { file, .. }) => file,
            Command::Liveness(CheckArgs { file, .. }) => file,
            Command::Print { file } => file,
        }
    }
}

#[derive(clap::Parser, Debug)]
#[command(about, long_about=None)]
/// Entrypoint for the tvamcus binary, including all commands.
pub struct App {
    #[arg(value_enum, long, default_value_t = ColorOutput::Auto)]
    /// Control color output. Auto disables colors with TERM=dumb or
    /// NO_COLOR=true.
    color: ColorOutput,

    #[command(subcommand)]
    /// Command to run
    command: Command,
}

/// The abstract model that goes with a concrete model by default:
/// `model.json` becomes `model_0P.json`.
pub fn default_abstract_path(file: &Path) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = match file.extension() {
        Some(ext) => format!("{stem}_0P.{}", ext.to_string_lossy()),
        None => format!("{stem}_0P"),
    };
    file.with_file_name(name)
}

/// The banner printed for a final answer.
pub fn verdict_banner(feedback: &Feedback, elapsed: Duration) -> String {
    let time = format!("{}s  ({}ms)", elapsed.as_secs(), elapsed.as_millis());
    let rule = "_".repeat(70);
    match feedback.verdict {
        Verdict::Definite => format!(
            "{rule}\n\n  SATISFIABLE at timestep: {}\n  Time elapsed since start: {time}\n{rule}",
            feedback.k
        ),
        Verdict::Possible => format!(
            "{rule}\n\n  UNKNOWN after timestep: {}\n  Time elapsed since start: {time}\n{rule}",
            feedback.k
        ),
        Verdict::NoneFound => format!(
            "No error found for bound of {}\nTotal time: {time}",
            feedback.k
        ),
    }
}

impl CheckArgs {
    fn configuration(&self, property: PropertyKind, cfgs: &Cfgs) -> Configuration {
        let processes = match self.processes.parse::<ProcessSelection>() {
            Ok(selection) => selection.resolve(cfgs),
            Err(err) => {
                eprintln!("{err}");
                process::exit(1);
            }
        };
        let mut config = Configuration::new(property, self.location, processes, self.bound);
        if self.any {
            config.combinator = Combinator::Any;
        }
        config.fairness = self.fair;
        config.multi_model = self.multi_model || self.abstract_file.is_some();
        if let Err(err) = config.validate(cfgs) {
            eprintln!("{err}");
            process::exit(1);
        }
        config
    }

    fn abstract_path(&self) -> PathBuf {
        match &self.abstract_file {
            Some(file) => PathBuf::from(file),
            None => default_abstract_path(Path::new(&self.file)),
        }
    }
}

impl App {
    /// Load a model, rendering expression errors against their source text.
    fn load(&self, file: &Path) -> Cfgs {
        match loader::load(file) {
            Ok(cfgs) => cfgs,
            Err(LoadError::Expression {
                process: id,
                text,
                error,
            }) => {
                let writer = StandardStream::stderr(match &self.color {
                    ColorOutput::Never => ColorChoice::Never,
                    ColorOutput::Always => ColorChoice::Always,
                    ColorOutput::Auto => ColorChoice::Auto,
                });
                let config = codespan_reporting::term::Config::default();
                let files = SimpleFile::new(
                    format!("{} (process {id})", file.display()),
                    text.as_str(),
                );
                let diagnostic = parse_error_diagnostic((), &error);
                if let Err(err) = terminal::emit(&mut writer.lock(), &config, &files, &diagnostic)
                {
                    eprintln!("could not parse `{text}`: {error} ({err})");
                }
                process::exit(1);
            }
            Err(err) => {
                eprintln!("{err}");
                process::exit(1);
            }
        }
    }

    fn check(&self, property: PropertyKind, args: &CheckArgs) {
        let start = Instant::now();
        let concrete = self.load(Path::new(&args.file));
        let config = args.configuration(property, &concrete);
        log::info!(
            "checking {property:?} of location {} for processes {:?} ({}), bound {}",
            config.location,
            config.processes,
            config.combinator,
            config.bound
        );

        let abstraction = config.multi_model.then(|| {
            let path = args.abstract_path();
            let abstraction = self.load(&path);
            if let Err(err) = config.validate(&abstraction) {
                eprintln!("{}: {err}", path.display());
                process::exit(1);
            }
            abstraction
        });
        let mut runner = match &abstraction {
            Some(abstraction) => Runner::multi(
                Evaluator::new(abstraction, &config),
                Evaluator::new(&concrete, &config),
            ),
            None => Runner::uni(Evaluator::new(&concrete, &config)),
        };
        let report = match runner.run() {
            Ok(report) => report,
            Err(err) => {
                eprintln!("{err}");
                process::exit(1);
            }
        };

        if args.json {
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(err) => {
                    eprintln!("could not serialize result: {err}");
                    process::exit(1);
                }
            }
        } else {
            print_report(&report, start.elapsed());
        }
        if args.time {
            println!("{}", timing::report());
        }
    }

    /// Run the application.
    pub fn exec(self) {
        match &self.command {
            Command::Print { .. } => {
                let cfgs = self.load(Path::new(self.command.file()));
                print!("{}", printer::fmt(&cfgs));
            }
            Command::Reachability(args) => self.check(PropertyKind::Reachability, args),
            Command::Liveness(args) => self.check(PropertyKind::Liveness, args),
        }
    }
}

fn print_report(report: &Report, elapsed: Duration) {
    for refinement in &report.refinements {
        println!(
            "refinement: abstract witness at timestep {} is {:?} in the concrete model",
            refinement.k, refinement.concrete
        );
    }
    for step in &report.feedback.witness {
        println!("{step}");
    }
    println!();
    println!("{}", verdict_banner(&report.feedback, elapsed));
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_abstract_path() {
        assert_eq!(
            default_abstract_path(Path::new("models/mutex.json")),
            PathBuf::from("models/mutex_0P.json")
        );
        assert_eq!(
            default_abstract_path(Path::new("mutex")),
            PathBuf::from("mutex_0P")
        );
    }

    #[test]
    fn test_verdict_banner() {
        let elapsed = Duration::from_millis(1500);
        let definite = Feedback {
            verdict: Verdict::Definite,
            k: 3,
            witness: vec![],
        };
        let banner = verdict_banner(&definite, elapsed);
        assert!(banner.contains("SATISFIABLE at timestep: 3"));
        assert!(banner.contains("1s  (1500ms)"));

        let possible = Feedback {
            verdict: Verdict::Possible,
            ..definite
        };
        assert!(verdict_banner(&possible, elapsed).contains("UNKNOWN after timestep: 3"));

        insta::assert_snapshot!(
            verdict_banner(&Feedback::none_found(7), elapsed),
            @r###"
        No error found for bound of 7
        Total time: 1s  (1500ms)
        "###
        );
    }

    #[test]
    fn test_parse_args() {
        let app = App::parse_from([
            "tvamcus",
            "liveness",
            "--location=2",
            "--processes=(0, 1)",
            "--any",
            "--fair",
            "--bound=4",
            "m.json",
        ]);
        let Command::Liveness(args) = app.command else {
            panic!("expected the liveness command");
        };
        assert_eq!(args.location, 2);
        assert_eq!(args.processes, "(0, 1)");
        assert!(args.any && args.fair && !args.multi_model);
        assert_eq!(args.bound, 4);
        assert_eq!(args.abstract_path(), PathBuf::from("m_0P.json"));
    }
}
