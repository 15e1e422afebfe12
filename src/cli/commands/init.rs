//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "lapps-export.toml")]
    pub output: String,

    /// Include every option with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing lapps-export configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your site id and client id", self.output);
                println!("  2. Point auth.pem_file at the private key registered for the client");
                println!("  3. Validate configuration: lapps-export validate-config");
                println!("  4. Run export: lapps-export export --type members-2");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# lapps-export configuration

[auth]
client_id = "your-client-id"
pem_file = "your-client-id.pem"

[api]
site_id = 12345

[export]
record_type = "members-2"
output_dir = "export"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# lapps-export configuration
#
# Values of the form ${VAR} are replaced with environment variables.
# Any value can also be overridden with LAPPS_<SECTION>_<KEY>, for example
# LAPPS_API_SITE_ID=42, and command-line flags override everything.

[application]
# trace | debug | info | warn | error
log_level = "info"

[auth]
# Client id registered for API access; also the assertion issuer and subject
client_id = "your-client-id"
# RSA private key (PEM) registered for the client
pem_file = "your-client-id.pem"
# Token server; defaults to https://auth.{api.domain}
# auth_host = "https://auth.leagueapps.io"
# Audience claim of the signed assertion
audience = "https://auth.leagueapps.io/v2/auth/token"
# Lifetime of the signed assertion in seconds
token_lifetime_secs = 300

[api]
site_id = 12345
# leagueapps.io in production; lapps-local.io for local development
domain = "leagueapps.io"
# Admin API; defaults to https://admin.{domain}
# admin_host = "https://admin.leagueapps.io"
# Per-request timeout in seconds
request_timeout_secs = 10

[export]
# registrations-2 | members-2 | transactions-2 | accountingCodes
record_type = "members-2"
# Cursor of the first request
last_updated = 0
last_id = 0
# Pages, manifests and checkpoints are written here
output_dir = "export"
# Fetch pages without writing them
dry_run = false
# Start from the saved checkpoint instead of last_updated/last_id
resume = false
# Consecutive non-progressing attempts before giving up
max_attempts = 5
# Backoff: random whole slots in [0, 2^attempts - 1], exponent capped at max_slots
slot_time_secs = 1.42
max_slots = 5

[logging]
# JSON log files in addition to console output
local_enabled = false
local_path = "logs"
# daily | hourly | never
local_rotation = "daily"
"#
        .to_string()
    }
}
