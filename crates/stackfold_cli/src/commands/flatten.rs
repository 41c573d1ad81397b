//! Flatten command - Inline nested stacks.

use anyhow::{Context, Result};
use clap::Args;

use stackfold_core::Flattener;

use super::TemplateArgs;
use crate::config::StackfoldConfig;

#[derive(Args)]
pub struct FlattenArgs {
    #[command(flatten)]
    pub template: TemplateArgs,
}

pub fn execute(args: FlattenArgs, config: &StackfoldConfig) -> Result<()> {
    let path = &args.template.template;
    let flattener = Flattener::new(config.loader(args.template.macros_override()));
    let template = flattener
        .flatten(path)
        .with_context(|| format!("Failed to flatten {}", path.display()))?;

    args.template.write(&template)
}
