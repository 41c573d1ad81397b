//! CLI command definitions.
//!
//! Each subcommand loads one template, transforms it and writes the result
//! to stdout or to `--output`.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

use stackfold_core::Template;

pub mod flatten;
pub mod retain;

/// stackfold - CloudFormation nested-stack flattener
#[derive(Parser)]
#[command(name = "stackfold")]
#[command(version, about = "stackfold - flatten nested CloudFormation stacks")]
#[command(long_about = r#"
stackfold inlines nested CloudFormation stacks and SAM applications that
point at local templates, producing one self-contained template.

COMMANDS:
  flatten  → Inline nested stacks, renaming resources and retargeting references
  retain   → Set DeletionPolicy: Retain on stateful resources

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or file not found
  3 - Template parse error
  4 - Configuration error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Configuration file (defaults to .stackfold.yaml when present)
    #[arg(long, global = true, env = "STACKFOLD_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inline nested stacks into a single template
    Flatten(flatten::FlattenArgs),

    /// Mark stateful resources with a retaining deletion policy
    Retain(retain::RetainArgs),
}

/// Output format for transformed templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Tagged YAML, the same dialect as the input
    #[default]
    Yaml,
    /// Plain JSON with intrinsic functions in their long form
    Json,
}

/// Arguments shared by every template command.
#[derive(Args)]
pub struct TemplateArgs {
    /// Template file
    pub template: PathBuf,

    /// Evaluate macros while loading
    #[arg(long, overrides_with = "no_macros")]
    pub macros: bool,

    /// Keep macro tags unevaluated
    #[arg(long = "no-macros", overrides_with = "macros")]
    pub no_macros: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    /// Write the result to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl TemplateArgs {
    /// Macro flag given on the command line, if any.
    pub fn macros_override(&self) -> Option<bool> {
        if self.macros {
            Some(true)
        } else if self.no_macros {
            Some(false)
        } else {
            None
        }
    }

    /// Render `template` and write it out.
    pub fn write(&self, template: &Template) -> Result<()> {
        let rendered = match self.format {
            OutputFormat::Yaml => template.to_yaml()?,
            OutputFormat::Json => template.to_json()?,
        };

        match &self.output {
            Some(path) => {
                fs::write(path, &rendered)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Wrote {}", path.display());
            }
            None => println!("{}", rendered),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flatten_with_macros() {
        let cli =
            Cli::try_parse_from(["stackfold", "flatten", "template.yaml", "--macros"]).unwrap();
        match cli.command {
            Commands::Flatten(args) => {
                assert_eq!(args.template.template, PathBuf::from("template.yaml"));
                assert_eq!(args.template.macros_override(), Some(true));
                assert_eq!(args.template.format, OutputFormat::Yaml);
            }
            _ => panic!("expected flatten"),
        }
    }

    #[test]
    fn test_last_macro_flag_wins() {
        let cli = Cli::try_parse_from([
            "stackfold", "retain", "t.yaml", "--macros", "--no-macros", "--format", "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Retain(args) => {
                assert_eq!(args.template.macros_override(), Some(false));
                assert_eq!(args.template.format, OutputFormat::Json);
            }
            _ => panic!("expected retain"),
        }
    }

    #[test]
    fn test_macro_flag_defaults_to_config() {
        let cli = Cli::try_parse_from(["stackfold", "retain", "t.yaml"]).unwrap();
        match cli.command {
            Commands::Retain(args) => assert_eq!(args.template.macros_override(), None),
            _ => panic!("expected retain"),
        }
    }

    #[test]
    fn test_template_is_required() {
        assert!(Cli::try_parse_from(["stackfold", "flatten"]).is_err());
    }
}
