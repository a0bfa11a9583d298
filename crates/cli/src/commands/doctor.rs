//! `plandesk doctor`: diagnose configuration and backends.

use plandesk_config::AppConfig;
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("plandesk doctor");
    println!("===============\n");

    let mut issues = 0;

    let path = super::config_path(config_path);
    if !path.exists() {
        println!("  [warn] No config file at {} (defaults + env in use)", path.display());
    }

    let config = match AppConfig::load_path(&path) {
        Ok(config) => {
            println!("  [ok]   Config valid");
            config
        }
        Err(e) => {
            println!("  [fail] Config invalid: {e}");
            return Ok(());
        }
    };

    match plandesk_providers::build_from_config(&config) {
        Ok(provider) => match provider.health_check().await {
            Ok(true) => println!("  [ok]   Completion backend '{}' reachable", provider.name()),
            Ok(false) => {
                println!("  [fail] Completion backend '{}' rejected the health check", provider.name());
                issues += 1;
            }
            Err(e) => {
                println!("  [fail] Completion backend '{}': {e}", provider.name());
                issues += 1;
            }
        },
        Err(e) => {
            println!("  [fail] Completion backend: {e}");
            issues += 1;
        }
    }

    match plandesk_history::build_from_config(&config).await {
        Ok(history) => println!("  [ok]   History store '{}' configured", history.name()),
        Err(e) => {
            println!("  [fail] History store: {e}");
            issues += 1;
        }
    }

    match plandesk_retrieval::build_from_config(&config) {
        Ok(retriever) => println!("  [ok]   Knowledge-base search '{}' configured", retriever.name()),
        Err(e) => {
            println!("  [warn] Knowledge-base search: {e}");
            issues += 1;
        }
    }

    if let Some(digest) = &config.knowledge.digest_path {
        if digest.exists() {
            println!("  [ok]   Digest {}", digest.display());
        } else {
            println!("  [fail] Digest {} not found", digest.display());
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  All checks passed!");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
