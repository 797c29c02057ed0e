mod app;
mod chart;
mod cli;
mod color;
mod config;
mod data;
mod error;
mod prompt;
mod ui;

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use clap::Parser;

use chart::{export, Chart, Labels};
use cli::{Args, Invocation};
use config::Configuration;
use data::{loader, select};
use prompt::Prompter;

fn main() -> Result<()> {
    env_logger::init();

    let config = match Args::parse().resolve()? {
        Invocation::Help => {
            cli::print_help()?;
            return Ok(());
        }
        Invocation::Interactive { show } => prompted(&mut Prompter::stdio(), show)?,
        Invocation::Run(config) => config,
    };

    run(&config)
}

/// Ask for every option; only the window flag comes from the command line.
fn prompted<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    show: bool,
) -> Result<Configuration> {
    let mut config = prompter
        .configuration()
        .context("reading interactive answers")?;
    config.show = show;
    Ok(config)
}

/// Load, select, export and show, strictly in that order.
fn run(config: &Configuration) -> Result<()> {
    let table = loader::load_file(&config.path, &config.load_options())
        .with_context(|| format!("loading {}", config.path.display()))?;

    let selected =
        select::select(&table, config.columns.as_deref()).context("selecting columns")?;

    let labels = Labels {
        title: config.title.clone(),
        x_label: config.x_label.clone(),
        y_label: config.y_label.clone(),
    };
    let chart = Chart::build(&selected, config.kind, labels)
        .with_context(|| format!("building {} chart", config.kind))?;

    if let Some(output) = &config.output {
        export::save(&chart, output)
            .with_context(|| format!("saving chart to {}", output.display()))?;
    }

    if config.show {
        app::show(chart, &window_title(config)).context("showing chart")?;
    }
    Ok(())
}

fn window_title(config: &Configuration) -> String {
    match &config.title {
        Some(title) => title.clone(),
        None => {
            let file = config
                .path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default();
            format!("plot-file – {file}")
        }
    }
}
