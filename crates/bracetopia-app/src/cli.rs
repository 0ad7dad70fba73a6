//! Command-line flags mapped onto [`BracetopiaConfig`].

use std::time::Duration;

use bracetopia_core::BracetopiaConfig;
use clap::{Parser, error::ErrorKind};

/// Delay between interactive cycles when `-t` is absent.
pub const DEFAULT_DELAY_MICROS: u64 = 900_000;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "bracetopia",
    about = "Endline and newline brace fans relocate until enough of their neighbors agree",
    override_usage = "bracetopia [-h] [-t N] [-c N] [-d dim] [-s %str] [-v %vac] [-e %end]"
)]
pub struct Cli {
    /// Microseconds cycle delay in interactive mode.
    #[arg(
        short = 't',
        value_name = "N",
        default_value_t = DEFAULT_DELAY_MICROS,
        allow_negative_numbers = true,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub delay_micros: u64,

    /// Print N cycles after the initial grid, then exit.
    #[arg(
        short = 'c',
        value_name = "N",
        allow_negative_numbers = true,
        value_parser = clap::value_parser!(u64)
    )]
    pub count: Option<u64>,

    /// Width and height dimension.
    #[arg(
        short = 'd',
        value_name = "dim",
        default_value_t = 15,
        allow_negative_numbers = true,
        value_parser = clap::value_parser!(u8).range(5..=39)
    )]
    pub dimension: u8,

    /// Strength of preference.
    #[arg(
        short = 's',
        value_name = "%str",
        default_value_t = 50,
        allow_negative_numbers = true,
        value_parser = clap::value_parser!(u8).range(1..=99)
    )]
    pub strength: u8,

    /// Percent vacancies.
    #[arg(
        short = 'v',
        value_name = "%vac",
        default_value_t = 20,
        allow_negative_numbers = true,
        value_parser = clap::value_parser!(u8).range(1..=99)
    )]
    pub vacancy: u8,

    /// Percent Endline braces. Others want Newline.
    #[arg(
        short = 'e',
        value_name = "%endl",
        default_value_t = 60,
        allow_negative_numbers = true,
        value_parser = clap::value_parser!(u8).range(1..=99)
    )]
    pub endline: u8,
}

impl Cli {
    #[must_use]
    pub fn to_config(&self) -> BracetopiaConfig {
        BracetopiaConfig {
            dimension: usize::from(self.dimension),
            strength: self.strength,
            vacancy: self.vacancy,
            endline: self.endline,
            ..BracetopiaConfig::default()
        }
    }

    #[must_use]
    pub const fn cycle_delay(&self) -> Duration {
        Duration::from_micros(self.delay_micros)
    }
}

/// Process exit code for a failed parse: help succeeds, unknown options
/// fail with 1 and rejected values with 2.
#[must_use]
pub const fn exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        ErrorKind::UnknownArgument => 1,
        _ => 2,
    }
}
