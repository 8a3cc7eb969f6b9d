//! Entry point for the `conda-envfile` binary.

use clap::Parser;
use indicatif::MultiProgress;
use tracing_subscriber::{fmt, prelude::*};

use conda_envfile::{
    check::run_check,
    console_utils::{IndicatifWriter, TracingFormatter, get_default_env_filter},
    fmt::run_fmt,
    list::run_list,
    opt::{App, SubCommands},
};

fn main() -> miette::Result<()> {
    let args = App::parse();

    let multi_progress = MultiProgress::new();

    tracing_subscriber::registry()
        .with(get_default_env_filter(args.verbose.filter()))
        .with(
            fmt::layer()
                .with_writer(IndicatifWriter::new(multi_progress.clone()))
                .event_format(TracingFormatter),
        )
        .init();

    match args.subcommand {
        SubCommands::Check(args) => run_check(args),
        SubCommands::List(args) => run_list(args),
        SubCommands::Fmt(args) => run_fmt(args),
    }
}
