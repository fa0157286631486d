use anyhow::Context;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;

pub fn handle(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    config.validate().context("configuration is invalid")?;

    // jwt_secret is skipped by the serializer
    let effective = serde_json::to_value(config)?;

    match output_format {
        OutputFormat::Json => output_success(
            &output_format,
            "configuration is valid",
            Some(json!({ "config": effective })),
        ),
        OutputFormat::Text => {
            output_success(&output_format, "configuration is valid", None)?;
            println!("{}", serde_json::to_string_pretty(&effective)?);
            Ok(())
        }
    }
}
