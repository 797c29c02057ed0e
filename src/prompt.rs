use std::io::{self, BufRead, StdinLock, Stdout, Write};
use std::path::PathBuf;

use clap::ValueEnum;

use crate::config::{parse_column_list, parse_delimiter, ChartKind, ColumnRef, Configuration};
use crate::data::loader::Format;
use crate::error::{PlotError, Result};

// ---------------------------------------------------------------------------
// Interactive configuration
// ---------------------------------------------------------------------------

/// Asks for the options one question at a time.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `question` and read one answer line, without its line ending.
    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{question}: ").map_err(PlotError::Prompt)?;
        self.output.flush().map_err(PlotError::Prompt)?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line).map_err(PlotError::Prompt)?;
        if read == 0 {
            return Err(PlotError::Prompt(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input ended before all questions were answered",
            )));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Like [`ask`](Self::ask), but a blank answer is `None`.
    fn ask_optional(&mut self, question: &str) -> Result<Option<String>> {
        let answer = self.ask(question)?;
        let answer = answer.trim();
        Ok((!answer.is_empty()).then(|| answer.to_string()))
    }

    fn say(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "{message}").map_err(PlotError::Prompt)
    }

    /// Walk through every question and build the configuration.
    ///
    /// The path is asked until it is non-empty; the delimiter and index
    /// column are only asked for delimited text files. Every other blank
    /// answer keeps the default.
    pub fn configuration(&mut self) -> Result<Configuration> {
        let path = loop {
            if let Some(p) = self.ask_optional("Path to the file to plot")? {
                break PathBuf::from(p);
            }
            self.say("A path is required.")?;
        };
        let mut config = Configuration::new(path);

        if Format::from_path(&config.path) == Some(Format::Delimited) {
            config.delimiter = loop {
                let answer = self.ask("Delimiter [,]")?;
                if answer.is_empty() {
                    break b',';
                }
                match parse_delimiter(&answer) {
                    Ok(d) => break d,
                    Err(e) => self.say(&e.to_string())?,
                }
            };
            config.index_column = self
                .ask_optional("Index column, name or position (blank for none)")?
                .map(|a| ColumnRef::parse(&a));
        }

        config.columns =
            parse_column_list(&self.ask("Columns to plot, comma separated (blank for all)")?);

        config.kind = loop {
            let Some(answer) = self.ask_optional("Chart type, line/bar/barh/hist/box/area [line]")?
            else {
                break ChartKind::default();
            };
            match ChartKind::from_str(&answer, true) {
                Ok(kind) => break kind,
                Err(_) => self.say(&format!("Unknown chart type {answer:?}."))?,
            }
        };

        config.output = self
            .ask_optional("Output file (blank to skip saving)")?
            .map(PathBuf::from);
        config.title = self.ask_optional("Title (blank for none)")?;
        config.x_label = self.ask_optional("X-axis label (blank for none)")?;
        config.y_label = self.ask_optional("Y-axis label (blank for none)")?;

        Ok(config)
    }
}
