use std::time::Duration;

use crate::error::AppError;
use crate::utils::debug_log;

use super::types::RawDataset;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const FETCH_RETRIES: usize = 3;
const RETRY_BACKOFF_MS: u64 = 250;

/// Fetch the raw pricing table over HTTP. Deserializing into `RawDataset`
/// enforces the top-level shape: anything that is not a JSON object (an
/// array, a bare value) fails here and is treated as a fetch failure by the
/// caller.
pub(super) fn fetch_pricing_raw(url: &str) -> Result<RawDataset, String> {
    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(FETCH_TIMEOUT))
        .build()
        .into();

    let mut last_error = String::from("no attempt made");

    for attempt in 0..FETCH_RETRIES {
        match agent.get(url).call() {
            Ok(response) => {
                let mut body = response.into_body();
                match serde_json::from_reader::<_, RawDataset>(body.as_reader()) {
                    Ok(parsed) => {
                        debug_log(format!("fetched {} pricing entries", parsed.len()));
                        return Ok(parsed);
                    }
                    Err(e) => last_error = format!("{} ({e})", AppError::MalformedDataset),
                }
            }
            Err(e) => last_error = e.to_string(),
        }

        if attempt + 1 < FETCH_RETRIES {
            std::thread::sleep(Duration::from_millis(
                RETRY_BACKOFF_MS * (attempt as u64 + 1),
            ));
        }
    }

    Err(last_error)
}
