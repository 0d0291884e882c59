use anyhow::Result;
use keepfresh_browser::ChromeFinder;
use keepfresh_core::{Action, ConfigFile, ExitPolicy};
use std::path::PathBuf;

/// Verify the environment can support a run without launching one.
pub fn execute(chrome_path: Option<PathBuf>, config: Option<PathBuf>) -> Result<()> {
    println!("🔍 Locating browser...");
    let binary = ChromeFinder::new(chrome_path)
        .find()
        .map_err(|e| anyhow::anyhow!(e))?;
    println!("✅ Found browser at: {}", binary.display());

    if let Some(path) = config {
        println!("🔍 Validating config: {}", path.display());
        let run = ConfigFile::load(&path)?
            .finish(Action::Resume, ExitPolicy::AlwaysZero)
            .map_err(|e| anyhow::anyhow!(e))?;

        println!("✅ Config valid");
        println!("   Login URL:   {}", run.urls.login);
        println!("   Profile URL: {}", run.urls.profile);
        match &run.resume_path {
            Some(resume) if resume.exists() => {
                println!("   Resume:      {}", resume.display());
            }
            Some(resume) => {
                println!(
                    "⚠️  Resume file missing: {} (resume runs will be skipped)",
                    resume.display()
                );
            }
            None => println!("   Resume:      not configured"),
        }
    }

    Ok(())
}
