//! Validate config command implementation
//!
//! This module implements the `validate-config` command, which checks the
//! configuration file and that the signing key it names can be loaded.

use crate::adapters::leagueapps::TokenProvider;
use crate::config::load_config;
use crate::core::retry::RetryPolicy;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(2);
            }
        };

        if let Err(e) = TokenProvider::from_config(reqwest::Client::new(), &config) {
            println!("❌ Signing key could not be loaded");
            println!("   Error: {e}");
            println!();
            return Ok(2);
        }
        println!("✅ Signing key loaded");

        let policy = match RetryPolicy::from_config(&config.export) {
            Ok(policy) => policy,
            Err(e) => {
                println!("❌ {e}");
                println!();
                return Ok(e.exit_code());
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        if let Some(site_id) = config.api.site_id {
            println!("  Site ID: {site_id}");
        }
        if let Some(client_id) = &config.auth.client_id {
            println!("  Client ID: {client_id}");
        }
        if let Some(record_type) = config.export.record_type {
            println!("  Record Type: {record_type}");
        }
        println!("  Auth Host: {}", config.auth_host());
        println!("  Admin Host: {}", config.admin_host());
        println!("  Output Directory: {}", config.export.output_dir.display());
        println!("  Initial Cursor: {}", config.export.initial_cursor());
        println!("  Max Attempts: {}", policy.max_attempts);
        println!(
            "  Backoff: {:.2}s slots, up to {:.2}s",
            policy.slot_time.as_secs_f64(),
            policy.max_delay().as_secs_f64()
        );
        println!();

        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const KEY_PATH: &str = concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/test_signing_key.pem"
    );

    fn config_file(pem_file: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[auth]
client_id = "client-42"
pem_file = "{pem_file}"

[api]
site_id = 42

[export]
record_type = "members-2"
"#
        )
        .unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_valid_config_exit_0() {
        let file = config_file(KEY_PATH);
        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_missing_key_exit_2() {
        let file = config_file("/no/such/key.pem");
        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 2);
    }

    #[tokio::test]
    async fn test_missing_file_exit_2() {
        let code = ValidateArgs {}.execute("missing.toml").await.unwrap();
        assert_eq!(code, 2);
    }
}
