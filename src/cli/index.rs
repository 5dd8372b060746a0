use anyhow::Result;

use crate::config::JournalConfig;
use crate::journal::JournalContext;

/// Run one indexing pass from the terminal. Exits non-zero on failure.
pub fn index(config: JournalConfig, full: bool) -> Result<()> {
    let ctx = JournalContext::open(config)?;
    let report = ctx.index(full);

    println!("{}", report.message);
    if report.files_skipped > 0 {
        println!("  {} file(s) skipped, see log for details", report.files_skipped);
    }
    anyhow::ensure!(report.success, "index update failed");
    Ok(())
}
