//! Model listing functionality
//!
//! Prints the models the configured server reports.

use crate::api::models::model_label;
use crate::api::ModelInfo;
use crate::core::config::Config;
use crate::core::session::SessionContext;
use std::error::Error;

pub async fn list_models(config: &Config) -> Result<(), Box<dyn Error>> {
    let session = SessionContext::from_config(config)?;
    let response = session.fetch_models().await?;

    println!("Available models on {}", session.base_url);
    println!();
    print!("{}", format_model_listing(&response.models, &config.ui.default_model));
    Ok(())
}

/// One block per model: label, then family and quantization when known.
pub fn format_model_listing(models: &[ModelInfo], default_model: &str) -> String {
    if models.is_empty() {
        return "No models found. Pull one with `ollama pull <model>`.\n".to_string();
    }

    let mut out = String::new();
    for model in models {
        let marker = if model.name == default_model {
            " (default)"
        } else {
            ""
        };
        out.push_str(&format!("  • {}{marker}\n", model_label(model)));
        if !model.details.family.is_empty() {
            out.push_str(&format!("    Family: {}\n", model.details.family));
        }
        if !model.details.quantization_level.is_empty() {
            out.push_str(&format!(
                "    Quantization: {}\n",
                model.details.quantization_level
            ));
        }
        if let Some(size) = model.size {
            out.push_str(&format!("    Size: {}\n", format_size(size)));
        }
    }
    out
}

fn format_size(bytes: u64) -> String {
    const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;
    let bytes = bytes as f64;
    if bytes >= GIB {
        format!("{:.1} GiB", bytes / GIB)
    } else {
        format!("{:.1} MiB", bytes / MIB)
    }
}
