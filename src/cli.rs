// photoprep/src/cli.rs
use crate::core::{Action, Result, SweepError, MAX_COMPRESS_QUALITY, MAX_RESIZE_PERCENT};
use crate::processors::DateStyle;
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "photoprep", author, version, about, long_about = None)]
pub struct Cli {
    /// Folder of photos to process (modified in place)
    pub folder: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// How catalog dates are rendered
    #[arg(long, value_enum, default_value_t = DateStyle::Auto, global = true)]
    pub date_style: DateStyle,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Re-encode every photo into thumbs/ at a lower JPEG quality (default action)
    Compress {
        /// JPEG quality, 1-95; prompted for when omitted
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=95))]
        quality: Option<u8>,
    },
    /// Scale every photo into thumbs/ by a percentage
    Resize {
        /// Size in percent of the original, 1-100; prompted for when omitted
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
        percent: Option<u8>,
    },
    /// Write info.json with a title and date for every photo
    Info,
}

impl Cli {
    /// Turns the parsed command into an [`Action`], asking on `input` for any
    /// number that was not given.
    pub fn resolve_action<R: BufRead, W: Write>(&self, input: &mut R, output: &mut W) -> Result<Action> {
        let command = self
            .command
            .clone()
            .unwrap_or(Commands::Compress { quality: None });

        let action = match command {
            Commands::Compress { quality: Some(quality) } => Action::Compress { quality },
            Commands::Compress { quality: None } => Action::Compress {
                quality: prompt_in_range(
                    input,
                    output,
                    "Enter compression % (1-95): ",
                    1,
                    MAX_COMPRESS_QUALITY,
                )?,
            },
            Commands::Resize { percent: Some(percent) } => Action::Resize { percent },
            Commands::Resize { percent: None } => Action::Resize {
                percent: prompt_in_range(
                    input,
                    output,
                    "Enter resize % (1-100): ",
                    1,
                    MAX_RESIZE_PERCENT,
                )?,
            },
            Commands::Info => Action::Info,
        };

        Ok(action)
    }
}

/// Asks until a whole number in `min..=max` is entered. End of input is an
/// error since no value can ever arrive.
pub fn prompt_in_range<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
    min: u8,
    max: u8,
) -> Result<u8> {
    loop {
        write!(output, "{}", prompt)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(SweepError::InvalidParameter(
                "Input closed before a value was entered".to_string(),
            ));
        }

        match line.trim().parse::<u8>() {
            Ok(value) if (min..=max).contains(&value) => return Ok(value),
            _ => writeln!(output, "Please enter a whole number between {} and {}.", min, max)?,
        }
    }
}
