use anyhow::Result;
use shrike_browser::ChromeFinder;
use std::path::PathBuf;

/// Report which Chrome binary discovery resolves, without launching it.
pub fn execute(chrome_path: Option<PathBuf>) -> Result<()> {
    let finder = ChromeFinder::new(chrome_path);
    let chrome_binary = finder.find()?;
    println!("✅ Chrome: {}", chrome_binary.display());
    Ok(())
}
