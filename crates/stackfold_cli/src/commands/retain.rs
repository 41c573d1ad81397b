//! Retain command - Protect stateful resources from deletion.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use stackfold_core::Template;

use super::TemplateArgs;
use crate::config::StackfoldConfig;

#[derive(Args)]
pub struct RetainArgs {
    #[command(flatten)]
    pub template: TemplateArgs,
}

pub fn execute(args: RetainArgs, config: &StackfoldConfig) -> Result<()> {
    let path = &args.template.template;
    info!("Marking stateful resources in: {}", path.display());

    let loader = config.loader(args.template.macros_override());
    let template = Template::load(&loader, path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    let retained = config.retention_marker().mark(&template)?;

    args.template.write(&retained)
}
