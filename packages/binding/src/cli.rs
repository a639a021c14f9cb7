//! Command-line interface for the binding engine.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;

use crate::config::BindingConfig;
use crate::error::{BindingError, Result};
use crate::rss::{rss_binder, RssFeed};

/// RegelRecht Binding - Read XML documents into typed structures and write them back.
#[derive(Parser)]
#[command(name = "regelrecht-binding")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read an RSS feed, print a summary and write it back.
    Rss {
        /// Path to the RSS document
        file: PathBuf,

        /// YAML file with binding settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Ignore elements and attributes without a binding
        #[arg(short, long)]
        lenient: bool,

        /// Write the feed to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Rss {
            file,
            config,
            lenient,
            output,
        } => rss_command(&file, config.as_deref(), lenient, output.as_deref()),
    }
}

/// Execute the rss command.
fn rss_command(
    file: &Path,
    config: Option<&Path>,
    lenient: bool,
    output: Option<&Path>,
) -> Result<()> {
    if !file.is_file() {
        return Err(BindingError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Input file does not exist: {}", file.display()),
        )));
    }

    let mut settings = match config {
        Some(path) => BindingConfig::from_file(path)?,
        None => BindingConfig::default(),
    };
    if lenient {
        settings = settings.lenient();
    }

    let binder = rss_binder(settings)?;
    let feed: RssFeed = binder.read_file(file)?;

    print_summary(&feed);

    match output {
        Some(path) => {
            binder.write_file(path, &feed)?;
            eprintln!();
            eprintln!("{} {}", style("Saved to:").green().bold(), path.display());
        }
        None => {
            let stdout = std::io::stdout();
            binder.write(stdout.lock(), &feed)?;
            println!();
        }
    }

    Ok(())
}

/// Print channel details to stderr so stdout stays a clean document.
fn print_summary(feed: &RssFeed) {
    let Some(channel) = feed.channel.as_ref() else {
        eprintln!("{}", style("Feed has no channel").yellow().bold());
        return;
    };

    eprintln!("  Title: {}", style(&channel.title).green());
    eprintln!("  Link: {}", channel.link);
    if let Some(language) = &channel.language {
        eprintln!("  Language: {language}");
    }
    eprintln!("  Items: {}", style(feed.item_count()).cyan());
    for item in &channel.items {
        let date = item
            .pub_date
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        eprintln!("    {} {}", style(date).dim(), item.title);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_rss() {
        let cli = Cli::parse_from(["regelrecht-binding", "rss", "feed.xml"]);

        let Commands::Rss {
            file,
            config,
            lenient,
            output,
        } = cli.command;
        assert_eq!(file, PathBuf::from("feed.xml"));
        assert!(config.is_none());
        assert!(!lenient);
        assert!(output.is_none());
    }

    #[test]
    fn test_cli_parse_rss_with_options() {
        let cli = Cli::parse_from([
            "regelrecht-binding",
            "rss",
            "feed.xml",
            "--lenient",
            "--config",
            "binding.yaml",
            "-o",
            "out.xml",
        ]);

        let Commands::Rss {
            lenient,
            config,
            output,
            ..
        } = cli.command;
        assert!(lenient);
        assert_eq!(config, Some(PathBuf::from("binding.yaml")));
        assert_eq!(output, Some(PathBuf::from("out.xml")));
    }
}
