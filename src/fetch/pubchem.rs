// src/fetch/pubchem.rs

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument};
use url::Url;

use super::retry::{get_with_retry, RetryPolicy};
use super::transport::Transport;
use super::{Lookup, StructureResolver};

#[derive(Deserialize)]
struct CidResponse {
    #[serde(rename = "IdentifierList")]
    identifier_list: IdentifierList,
}

#[derive(Deserialize)]
struct IdentifierList {
    #[serde(rename = "CID", default)]
    cid: Vec<u64>,
}

#[derive(Deserialize)]
struct PropertyResponse {
    #[serde(rename = "PropertyTable")]
    property_table: PropertyTable,
}

#[derive(Deserialize)]
struct PropertyTable {
    #[serde(rename = "Properties", default)]
    properties: Vec<Map<String, Value>>,
}

/// PUG REST client: CAS name → CID → SMILES property.
pub struct PubChemClient<T> {
    transport: T,
    base: Url,
    property: String,
    policy: RetryPolicy,
}

impl<T: Transport> PubChemClient<T> {
    pub fn new(transport: T, base_url: &str, property: &str, policy: RetryPolicy) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| anyhow!("invalid base URL {base_url:?}: {e}"))?;
        if base.cannot_be_a_base() {
            return Err(anyhow!("base URL {base_url:?} cannot take path segments"));
        }
        Ok(Self {
            transport,
            base,
            property: property.to_string(),
            policy,
        })
    }

    /// `{base}/compound/name/{cas}/cids/JSON`, with `cas` percent-encoded as one segment.
    pub fn cid_url(&self, cas: &str) -> Url {
        self.endpoint(&["compound", "name", cas, "cids", "JSON"])
    }

    /// `{base}/compound/cid/{cid}/property/{property}/JSON`.
    pub fn property_url(&self, cid: u64) -> Url {
        let cid = cid.to_string();
        self.endpoint(&["compound", "cid", &cid, "property", &self.property, "JSON"])
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // errs only for cannot-be-a-base URLs, which `new` rejects
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_body(&self, url: &Url) -> Result<String, Lookup> {
        match get_with_retry(&self.transport, url, &self.policy).await {
            Ok(resp) if resp.is_success() => Ok(resp.body),
            Ok(resp) if self.policy.is_retry_status(resp.status) => {
                Err(Lookup::TransportError(format!("HTTP {}", resp.status)))
            }
            Ok(resp) => {
                debug!(%url, status = resp.status, "no match");
                Err(Lookup::NotFound)
            }
            Err(e) => Err(Lookup::TransportError(e.to_string())),
        }
    }

    /// First CID PubChem lists for the name.
    pub async fn cid_for(&self, cas: &str) -> Result<u64, Lookup> {
        let body = self.get_body(&self.cid_url(cas)).await?;
        let parsed: CidResponse = serde_json::from_str(&body).map_err(|e| {
            debug!(cas, error = %e, "unexpected CID payload");
            Lookup::NotFound
        })?;
        parsed
            .identifier_list
            .cid
            .first()
            .copied()
            .ok_or(Lookup::NotFound)
    }

    /// SMILES of the first property row returned for the CID.
    pub async fn smiles_for(&self, cid: u64) -> Result<String, Lookup> {
        let body = self.get_body(&self.property_url(cid)).await?;
        let parsed: PropertyResponse = serde_json::from_str(&body).map_err(|e| {
            debug!(cid, error = %e, "unexpected property payload");
            Lookup::NotFound
        })?;
        parsed
            .property_table
            .properties
            .first()
            .and_then(|row| row.get(&self.property))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or(Lookup::NotFound)
    }
}

#[async_trait]
impl<T: Transport> StructureResolver for PubChemClient<T> {
    #[instrument(level = "debug", skip(self))]
    async fn resolve(&self, cas: &str) -> Lookup {
        let cid = match self.cid_for(cas).await {
            Ok(cid) => cid,
            Err(miss) => return miss,
        };
        debug!(cas, cid, "resolved CID");
        match self.smiles_for(cid).await {
            Ok(smiles) => Lookup::Found(smiles),
            Err(miss) => miss,
        }
    }
}
