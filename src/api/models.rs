use crate::api::{ModelInfo, ModelsResponse};
use crate::utils::url::construct_api_url;

pub async fn fetch_models(
    client: &reqwest::Client,
    base_url: &str,
    models_endpoint: &str,
) -> Result<ModelsResponse, Box<dyn std::error::Error>> {
    let models_url = construct_api_url(base_url, models_endpoint);
    let response = client
        .get(models_url)
        .header("Content-Type", "application/json")
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(format!("API request failed with status {status}: {error_text}").into());
    }

    let models_response = response.json::<ModelsResponse>().await?;
    Ok(models_response)
}

/// Choose the model a fresh session starts with.
///
/// A preferred name wins only when the backend actually serves it; otherwise
/// the first listed model is used.
pub fn pick_initial_model(models: &[ModelInfo], preferred: Option<&str>) -> Option<String> {
    if let Some(preferred) = preferred.filter(|name| !name.is_empty()) {
        if let Some(found) = models.iter().find(|m| m.name == preferred) {
            return Some(found.name.clone());
        }
    }
    models.first().map(|m| m.name.clone())
}

/// Short label used by pickers and listings, e.g. `llama2 (7B)`.
pub fn model_label(model: &ModelInfo) -> String {
    if model.details.parameter_size.is_empty() {
        model.name.clone()
    } else {
        format!("{} ({})", model.name, model.details.parameter_size)
    }
}
