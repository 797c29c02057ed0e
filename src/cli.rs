use std::path::PathBuf;

use clap::{ArgAction, CommandFactory, Parser};

use crate::config::{parse_delimiter, ChartKind, ColumnRef, Configuration};
use crate::error::Result;

/// Quickly visualize data from a text or Parquet file.
#[derive(Parser, Debug)]
#[command(name = "plot-file", version, about, long_about = None)]
pub struct Args {
    /// Path to the file that should be plotted
    pub path: Option<PathBuf>,

    /// The column(s) to plot, either as 0-based position or, if the file has
    /// headers, column name
    #[arg(short, long, num_args = 1.., value_name = "COLUMN")]
    pub columns: Option<Vec<ColumnRef>>,

    /// Treat the first row as data instead of column names
    #[arg(long = "no-headers", action = ArgAction::SetFalse)]
    pub headers: bool,

    /// The delimiter used in the file
    #[arg(short, long, default_value = ",", value_name = "DELIM")]
    pub delimiter: String,

    /// The index column of the file (name or 0-based position)
    #[arg(long = "index-col", value_name = "COLUMN")]
    pub index_col: Option<ColumnRef>,

    /// The type of chart to produce
    #[arg(short = 't', long = "type", value_enum, default_value = "line")]
    pub kind: ChartKind,

    /// Save the chart to this file (.png, .jpg or .svg)
    #[arg(short, long = "output-file", value_name = "PATH")]
    pub output_file: Option<PathBuf>,

    /// The x-axis label
    #[arg(long)]
    pub xlabel: Option<String>,

    /// The y-axis label
    #[arg(long)]
    pub ylabel: Option<String>,

    /// The chart title
    #[arg(long)]
    pub title: Option<String>,

    /// Ask for every option interactively; other flags are ignored
    #[arg(short, long)]
    pub interactive: bool,

    /// Do not open the chart window (useful with --output-file)
    #[arg(long)]
    pub no_show: bool,
}

/// What the command line asks for.
#[derive(Debug, PartialEq)]
pub enum Invocation {
    Run(Configuration),
    Interactive { show: bool },
    /// No path and no interactive mode: print usage and stop.
    Help,
}

impl Args {
    pub fn resolve(self) -> Result<Invocation> {
        if self.interactive {
            return Ok(Invocation::Interactive {
                show: !self.no_show,
            });
        }
        let Some(path) = self.path else {
            return Ok(Invocation::Help);
        };

        Ok(Invocation::Run(Configuration {
            path,
            delimiter: parse_delimiter(&self.delimiter)?,
            has_headers: self.headers,
            index_column: self.index_col,
            columns: self.columns,
            kind: self.kind,
            output: self.output_file,
            title: self.title,
            x_label: self.xlabel,
            y_label: self.ylabel,
            show: !self.no_show,
        }))
    }
}

pub fn print_help() -> std::io::Result<()> {
    Args::command().print_help()
}
