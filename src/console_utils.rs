//! Console and logging helpers.

use std::{io, str::FromStr};

use clap_verbosity_flag::VerbosityFilter;
use indicatif::MultiProgress;
use tracing_core::{Event, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    filter::Directive,
    fmt::{
        FmtContext, FormatEvent, FormatFields, MakeWriter,
        format::{self, Format, Writer},
    },
    registry::LookupSpan,
};

/// A tracing writer that suspends any active progress bars while a log line
/// is printed, so bars and log output do not interleave.
#[derive(Clone)]
pub struct IndicatifWriter {
    progress_bars: MultiProgress,
}

impl IndicatifWriter {
    pub fn new(pb: MultiProgress) -> Self {
        Self { progress_bars: pb }
    }
}

impl io::Write for IndicatifWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.progress_bars.suspend(|| io::stderr().write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.progress_bars.suspend(|| io::stderr().flush())
    }
}

impl<'a> MakeWriter<'a> for IndicatifWriter {
    type Writer = IndicatifWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Event formatter: our own info-level messages print bare, everything else
/// uses the default format.
pub struct TracingFormatter;

impl<S, N> FormatEvent<S, N> for TracingFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();

        let mut buffer = String::new();
        let mut custom_writer = Writer::new(&mut buffer);

        if *metadata.level() == tracing_core::metadata::Level::INFO
            && (metadata.target().starts_with("conda_envfile")
                || metadata.target().starts_with("envfile"))
        {
            ctx.format_fields(custom_writer.by_ref(), event)?;
        } else {
            let default_format = Format::default();
            default_format.format_event(ctx, custom_writer, event)?;
        }

        filter_secrets(&mut buffer);
        writer.write_str(&buffer)
    }
}

/// Mask conda channel tokens (`/t/<token>/`) that may appear in channel URLs.
fn filter_secrets(buffer: &mut String) {
    let rex = regex::Regex::new(r"(/t/)([a-zA-Z0-9\-]{20,})").expect("static regex is valid");
    *buffer = rex.replace_all(buffer, "$1<token>").to_string();
}

/// Derive the tracing filter from the `-v`/`-q` flags. Our own crates follow
/// the requested level; everything else stays at warn unless tracing is
/// requested.
pub fn get_default_env_filter(verbose: VerbosityFilter) -> EnvFilter {
    let level = match verbose {
        VerbosityFilter::Off => "off",
        VerbosityFilter::Error => "error",
        VerbosityFilter::Warn => "warn",
        VerbosityFilter::Info => "info",
        VerbosityFilter::Debug => "debug",
        VerbosityFilter::Trace => "trace",
    };
    let mut result = EnvFilter::new(format!(
        "conda_envfile={level},envfile_parser={level},envfile_types={level}"
    ));

    let fallback = if verbose == VerbosityFilter::Trace {
        "info"
    } else {
        "warn"
    };
    result = result.add_directive(Directive::from_str(fallback).expect("valid directive"));

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_are_masked() {
        let mut line =
            "fetching https://conda.anaconda.org/t/ab-12345678901234567890/private".to_string();
        filter_secrets(&mut line);
        assert!(!line.contains("12345678901234567890"));
        assert!(line.contains("/t/<token>"));
    }

    #[test]
    fn env_filter_follows_verbosity() {
        let filter = get_default_env_filter(VerbosityFilter::Debug);
        let rendered = filter.to_string();
        assert!(rendered.contains("conda_envfile=debug"));
        assert!(rendered.contains("envfile_parser=debug"));
    }
}
