//! GraphQL client for the off-chain transaction metadata service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::domain::EngineError;
use crate::ports::{CallDataBackend, CallDataQuery, RawCallMetadata};

const TX_METADATA_QUERY: &str = "query TxMetadataByPk($timepoint_height: Int!, $timepoint_index: Int!, $multisig: String!, $chain: String!) {
  tx_metadata_by_pk(multisig: $multisig, timepoint_height: $timepoint_height, timepoint_index: $timepoint_index, chain: $chain) {
    call_data
    description
    change_config_details
  }
}";

#[derive(Debug, Serialize)]
struct Variables<'a> {
    timepoint_height: u32,
    timepoint_index: u32,
    multisig: &'a str,
    chain: &'a str,
}

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a> {
    query: &'static str,
    variables: Variables<'a>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct TxMetadataData {
    tx_metadata_by_pk: Option<RawCallMetadata>,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<TxMetadataData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

impl GraphqlResponse {
    fn into_metadata(self) -> Result<Option<RawCallMetadata>, EngineError> {
        if !self.errors.is_empty() {
            let messages: Vec<String> = self.errors.into_iter().map(|e| e.message).collect();
            return Err(EngineError::MetadataService(messages.join("; ")));
        }
        self.data
            .map(|data| data.tx_metadata_by_pk)
            .ok_or_else(|| EngineError::MetadataService("response has no data".to_string()))
    }
}

fn build_request(query: &CallDataQuery) -> GraphqlRequest<'_> {
    GraphqlRequest {
        query: TX_METADATA_QUERY,
        variables: Variables {
            timepoint_height: query.timepoint.height,
            timepoint_index: query.timepoint.index,
            multisig: &query.multisig,
            chain: query.chain_id.as_str(),
        },
    }
}

/// Metadata service client.
pub struct GraphqlMetadataClient {
    client: Client,
    url: String,
}

impl GraphqlMetadataClient {
    /// Create a client for the GraphQL endpoint at `url`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(2)))
            .build()
            .map_err(|e| EngineError::MetadataService(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CallDataBackend for GraphqlMetadataClient {
    async fn fetch_call_data(
        &self,
        query: &CallDataQuery,
    ) -> Result<Option<RawCallMetadata>, EngineError> {
        let response = self
            .client
            .post(&self.url)
            .json(&build_request(query))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    EngineError::MetadataService(format!("Cannot connect to {}", self.url))
                } else {
                    EngineError::MetadataService(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::MetadataService(format!("HTTP {}", status)));
        }

        let body: GraphqlResponse = response
            .json()
            .await
            .map_err(|e| EngineError::MetadataService(format!("Failed to parse response: {}", e)))?;
        body.into_metadata()
    }
}
