//! Repository bootstrap command.

use anyhow::{Context, Result};
use kubeseed_bootstrap::{BootstrapPolicy, PlainSecrets};
use kubeseed_config::BootstrapOptions;

pub fn run(opts: &BootstrapOptions) -> Result<()> {
    let written = kubeseed_bootstrap::init(opts, &BootstrapPolicy::default(), &PlainSecrets)
        .with_context(|| format!("failed to bootstrap {}", opts.output_path.display()))?;
    println!(
        "Bootstrapped {} files in {}",
        written.len(),
        opts.output_path.display()
    );
    Ok(())
}
