//! Postal code lookup client.
//!
//! Resolves a 6-digit postal code to a district and state so checkout can
//! prefill the city/state fields. Lookup failure is non-fatal by contract:
//! any error leaves the fields unfilled.

use serde::Deserialize;
use tracing::instrument;

/// District/state pair for a postal code.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PostalPlace {
    pub city: String,
    pub state: String,
}

/// Client for the postal code lookup service.
#[derive(Clone)]
pub struct PostalClient {
    client: reqwest::Client,
    base: String,
}

impl PostalClient {
    /// Create a new lookup client.
    #[must_use]
    pub fn new(base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_owned(),
        }
    }

    /// Look up a postal code.
    ///
    /// Returns `None` on any failure - a missing prefill is not an error.
    #[instrument(skip(self))]
    pub async fn lookup(&self, code: &str) -> Option<PostalPlace> {
        let url = format!("{}/{code}", self.base);

        let body = match self.client.get(&url).send().await {
            Ok(response) => match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(error = %e, "postal lookup body read failed");
                    return None;
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "postal lookup request failed");
                return None;
            }
        };

        match parse_lookup(&body) {
            Some(place) => Some(place),
            None => {
                tracing::warn!(code, "postal lookup returned no match");
                None
            }
        }
    }
}

// The service answers with a single-element array:
// [{ "Status": "Success", "PostOffice": [{ "District": ..., "State": ... }] }]
#[derive(Deserialize)]
struct LookupEnvelope {
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "PostOffice")]
    post_offices: Option<Vec<PostOffice>>,
}

#[derive(Deserialize)]
struct PostOffice {
    #[serde(rename = "District")]
    district: String,
    #[serde(rename = "State")]
    state: String,
}

fn parse_lookup(body: &str) -> Option<PostalPlace> {
    let envelopes: Vec<LookupEnvelope> = serde_json::from_str(body).ok()?;
    let envelope = envelopes.into_iter().next()?;
    if envelope.status != "Success" {
        return None;
    }

    let office = envelope.post_offices?.into_iter().next()?;
    Some(PostalPlace {
        city: office.district,
        state: office.state,
    })
}
