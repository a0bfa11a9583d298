//! `plandesk init`: first-time setup.

use plandesk_config::AppConfig;
use std::path::Path;

pub fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let path = super::config_path(config_path);

    if path.exists() {
        println!("Config already exists at: {}", path.display());
        println!("   Edit it manually or delete it and re-run init.");
        return Ok(());
    }

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&path, AppConfig::default_toml())?;

    println!("Created {}", path.display());
    println!("\nNext steps:");
    println!("   1. Set GEMINI_API_KEY (a .env file in the working directory works)");
    println!("   2. Set SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY for chat history");
    println!("   3. Set VECTORIZE_URL and VECTORIZE_API_KEY for knowledge-base search");
    println!("   4. Run: plandesk serve");
    Ok(())
}
