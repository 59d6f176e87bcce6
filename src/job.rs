//! Job type - a unit of work handed out by the server.

use bytes::Bytes;

use crate::error::Result;

/// Server-assigned job identifier.
pub type JobId = u64;

/// A job: a server-assigned id plus an opaque byte payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Server-assigned id.
    pub id: JobId,
    /// Raw body bytes, exactly as stored on the server.
    pub payload: Bytes,
}

impl Job {
    /// Create a job from its parts.
    pub fn new(id: JobId, payload: Bytes) -> Self {
        Self { id, payload }
    }

    /// Body as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`BeanlineError::Utf8`](crate::BeanlineError::Utf8) when the
    /// body is not valid UTF-8; use [`Job::payload`] for binary bodies.
    pub fn payload_str(&self) -> Result<String> {
        Ok(String::from_utf8(self.payload.to_vec())?)
    }

    /// Body as a JSON value, for jobs submitted with
    /// [`Client::put_json`](crate::Client::put_json).
    pub fn payload_json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.payload)?)
    }
}
