use std::process::Command;

use anyhow::{Context, Result};

/// Workspace packages in dependency order.
const PACKAGES: &[&str] =
    &["profilesync-domain", "profilesync-core", "profilesync-infra", "profilesync-app"];

/// Check that every package compiles on its own, which catches features that
/// only resolve through workspace unification.
pub fn check_each_package() -> Result<()> {
    println!("Checking {} workspace packages individually...", PACKAGES.len());

    for (index, package) in PACKAGES.iter().enumerate() {
        println!("\n[{}/{}] cargo check -p {package} --all-targets", index + 1, PACKAGES.len());

        let status = Command::new("cargo")
            .args(["check", "-p", package, "--all-targets"])
            .status()
            .with_context(|| format!("Failed to run cargo check for '{package}'"))?;

        if !status.success() {
            anyhow::bail!("Package '{package}' failed to compile on its own");
        }

        println!("✅ {package} compiles");
    }

    println!("\n✅ All {} packages compile individually!", PACKAGES.len());
    Ok(())
}
