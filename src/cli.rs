use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::report::ViewMode;

/// Command-line arguments of `repolens`.
#[derive(Parser, Debug)]
#[clap(version, about = "Structural metrics and UML for Java code on GitHub", long_about = None, name = "repolens")]
pub struct RepolensArgs {
    /// Increase log verbosity (-v info, -vv debug)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file to use instead of ~/.config/repolens/config.toml
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// GitHub access token, overrides config and GH_ACCESS_TOKEN
    #[clap(long, global = true)]
    pub token: Option<String>,

    #[clap(subcommand)]
    pub command: RepolensSubCommand,
}

#[derive(Parser, Debug, Clone)]
pub enum RepolensSubCommand {
    /// Analyze one GitHub folder and print the results
    #[clap(alias = "a")]
    Analyze(AnalyzeArgs),

    /// Interactive session reading commands from stdin
    Shell,
}

#[derive(Parser, Debug, Clone)]
pub struct AnalyzeArgs {
    /// GitHub folder URL, e.g. https://github.com/owner/repo/tree/main/src
    pub url: String,

    /// Which dataset to print
    #[clap(long, value_enum, default_value_t = ViewArg::All)]
    pub view: ViewArg,

    /// Only show grid entries under this folder
    #[clap(long)]
    pub folder: Option<String>,

    /// Print the whole result as JSON
    #[clap(long)]
    pub json: bool,

    /// Write the PlantUML document to this file
    #[clap(long)]
    pub uml_out: Option<PathBuf>,

    /// Print the folder tree of analyzed files
    #[clap(long)]
    pub tree: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewArg {
    Grid,
    Dia,
    Uml,
    All,
}

impl ViewArg {
    /// The views to print, in display order.
    pub fn modes(self) -> Vec<ViewMode> {
        match self {
            ViewArg::Grid => vec![ViewMode::Grid],
            ViewArg::Dia => vec![ViewMode::Dia],
            ViewArg::Uml => vec![ViewMode::Uml],
            ViewArg::All => vec![ViewMode::Grid, ViewMode::Dia, ViewMode::Uml],
        }
    }
}

/// One line of `repolens shell` input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Analyze(String),
    Reload,
    Clear,
    Show(ViewArg),
    ShowFile(String),
    Folder(Option<String>),
    Help,
    Exit,
    Empty,
    Unknown(String),
}

impl ShellCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        match word {
            "" => ShellCommand::Empty,
            "analyze" | "open" => ShellCommand::Analyze(rest.to_string()),
            "reload" => ShellCommand::Reload,
            "clear" => ShellCommand::Clear,
            "show" if rest.is_empty() => ShellCommand::Show(ViewArg::All),
            "show" if rest == "file" || rest.starts_with("file ") => {
                ShellCommand::ShowFile(rest["file".len()..].trim().to_string())
            }
            "show" => match ViewArg::from_str(rest, true) {
                Ok(view) => ShellCommand::Show(view),
                Err(_) => ShellCommand::Unknown(line.to_string()),
            },
            "folder" => ShellCommand::Folder(crate::report::normalize_folder(rest)),
            "help" | "?" => ShellCommand::Help,
            "exit" | "quit" => ShellCommand::Exit,
            _ => ShellCommand::Unknown(line.to_string()),
        }
    }
}

pub const SHELL_HELP: &str = "\
analyze <url>          analyze a GitHub folder
reload                 analyze the last URL again
clear                  drop the current result
show [grid|dia|uml]    print the current result
show file <path>       print the metrics of one analyzed file
folder [prefix]        restrict the grid to a folder, no prefix resets
exit                   leave the shell";
