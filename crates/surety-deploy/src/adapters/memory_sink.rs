//! # Memory Sink
//!
//! In-memory descriptor sink for testing. Records every write and can be
//! told to refuse writes.

use crate::errors::PublishError;
use crate::ports::outbound::DescriptorSink;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Descriptor sink that keeps written bytes in memory.
///
/// Clones share the same buffer, so a test can hand one clone to the
/// publisher and inspect another.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    name: String,
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
    failure: Option<String>,
}

impl MemorySink {
    /// Creates a sink that accepts writes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Creates a sink that rejects every write with `message`.
    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Most recent content, if any write succeeded.
    #[must_use]
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.writes.lock().last().cloned()
    }

    /// Number of successful writes.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.lock().len()
    }
}

#[async_trait]
impl DescriptorSink for MemorySink {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn write(&self, bytes: &[u8]) -> Result<(), PublishError> {
        if let Some(message) = &self.failure {
            return Err(PublishError::Write {
                sink: self.name.clone(),
                message: message.clone(),
            });
        }
        self.writes.lock().push(bytes.to_vec());
        Ok(())
    }
}
