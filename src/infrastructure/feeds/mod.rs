pub mod yahoo;

use crate::domain::ports::market_data::GatewayError;
use serde::de::DeserializeOwned;

/// Longest provider error body kept in a [`GatewayError::Status`] message.
pub(crate) const MAX_ERROR_BODY: usize = 200;

/// GET `url` with `query` and decode the JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, &str)],
) -> Result<T, GatewayError> {
    let resp = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| GatewayError::Network(e.to_string()))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(GatewayError::Status {
            status: status.as_u16(),
            message: body.chars().take(MAX_ERROR_BODY).collect(),
        });
    }

    resp.json::<T>()
        .await
        .map_err(|e| GatewayError::Parse(e.to_string()))
}
