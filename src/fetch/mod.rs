// src/fetch/mod.rs

use async_trait::async_trait;

pub mod pubchem;
pub mod retry;
pub mod transport;

/// Outcome of resolving one CAS number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(String),
    /// PubChem answered but had no usable structure for the name.
    NotFound,
    /// No usable answer: network failure or retries exhausted.
    TransportError(String),
}

impl Lookup {
    pub fn label(&self) -> &'static str {
        match self {
            Lookup::Found(_) => "found",
            Lookup::NotFound => "not_found",
            Lookup::TransportError(_) => "transport_error",
        }
    }

    /// Value written into the SMILES cell; every miss becomes an empty string.
    pub fn into_cell_text(self) -> String {
        match self {
            Lookup::Found(smiles) => smiles,
            Lookup::NotFound | Lookup::TransportError(_) => String::new(),
        }
    }
}

/// CAS number → structure string. Implementations never fail; every problem
/// is folded into the returned [`Lookup`].
#[async_trait]
pub trait StructureResolver: Send + Sync {
    async fn resolve(&self, cas: &str) -> Lookup;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::transport::{HttpResponse, Transport, TransportError};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use url::Url;

    pub type Reply = Result<HttpResponse, TransportError>;

    pub fn ok(body: &str) -> Reply {
        Ok(HttpResponse {
            status: 200,
            body: body.to_string(),
            retry_after: None,
        })
    }

    pub fn not_found() -> Reply {
        Ok(HttpResponse {
            status: 404,
            body: r#"{"Fault":{"Code":"PUGREST.NotFound"}}"#.to_string(),
            retry_after: None,
        })
    }

    pub fn server_error(status: u16) -> Reply {
        Ok(HttpResponse {
            status,
            body: String::new(),
            retry_after: None,
        })
    }

    pub fn throttled(status: u16, retry_after: Duration) -> Reply {
        Ok(HttpResponse {
            status,
            body: String::new(),
            retry_after: Some(retry_after),
        })
    }

    /// Replays canned replies in order and records every requested URL.
    pub struct ScriptedTransport {
        replies: Mutex<VecDeque<Reply>>,
        seen: Mutex<Vec<Url>>,
    }

    impl ScriptedTransport {
        pub fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        pub fn urls(&self) -> Vec<Url> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(url.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Request("script exhausted".into())))
        }
    }
}
