//! # Descriptor Publisher
//!
//! Serializes a descriptor once and hands the same bytes to every sink.

use crate::domain::descriptor::DeploymentDescriptor;
use crate::domain::report::SinkReport;
use crate::errors::PublishError;
use crate::ports::outbound::DescriptorSink;
use std::sync::Arc;
use tracing::{info, warn};

/// Writes descriptors to a fixed, ordered set of sinks.
#[derive(Clone, Default)]
pub struct DescriptorPublisher {
    sinks: Vec<Arc<dyn DescriptorSink>>,
}

impl DescriptorPublisher {
    /// Create a publisher over `sinks`, written in the given order.
    pub fn new(sinks: Vec<Arc<dyn DescriptorSink>>) -> Self {
        Self { sinks }
    }

    /// Number of configured sinks.
    #[must_use]
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Publishes `descriptor` to every sink, sequentially.
    ///
    /// A failing sink does not stop the remaining ones. No write is retried.
    /// Returns one report per sink in configuration order.
    pub async fn publish(&self, descriptor: &DeploymentDescriptor) -> Vec<SinkReport> {
        let bytes = match descriptor.to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                let error = PublishError::Serialization(e.to_string());
                warn!(error = %error, "Descriptor serialization failed, no sink written");
                return self
                    .sinks
                    .iter()
                    .map(|sink| SinkReport {
                        sink: sink.name(),
                        result: Err(error.clone()),
                    })
                    .collect();
            }
        };

        let mut reports = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            let result = sink.write(&bytes).await;
            match &result {
                Ok(()) => info!(sink = %sink.name(), bytes = bytes.len(), "Descriptor published"),
                Err(e) => warn!(sink = %sink.name(), error = %e, "Descriptor publication failed"),
            }
            reports.push(SinkReport {
                sink: sink.name(),
                result,
            });
        }
        reports
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemorySink;
    use crate::domain::entities::Component;
    use crate::domain::interface::Interface;
    use crate::domain::value_objects::{Address, Hash};

    fn descriptor() -> DeploymentDescriptor {
        let data = Component::new("Data", Address::new([1; 20]), Interface::default(), Hash::ZERO);
        let app = Component::new("App", Address::new([2; 20]), Interface::default(), Hash::ZERO);
        DeploymentDescriptor::for_network("localhost", Some("http://localhost:8545"), &[&data, &app])
            .unwrap()
    }

    #[tokio::test]
    async fn test_every_sink_gets_identical_bytes() {
        let client = MemorySink::new("client");
        let server = MemorySink::new("server");
        let publisher = DescriptorPublisher::new(vec![
            Arc::new(client.clone()),
            Arc::new(server.clone()),
        ]);

        let reports = publisher.publish(&descriptor()).await;

        assert!(reports.iter().all(SinkReport::is_ok));
        assert_eq!(client.contents(), server.contents());
        assert_eq!(client.contents().unwrap(), descriptor().to_bytes().unwrap());
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_stop_later_sinks() {
        let later = MemorySink::new("server");
        let publisher = DescriptorPublisher::new(vec![
            Arc::new(MemorySink::failing("client", "permission denied")),
            Arc::new(later.clone()),
        ]);

        let reports = publisher.publish(&descriptor()).await;

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].sink, "client");
        assert!(!reports[0].is_ok());
        assert!(reports[1].is_ok());
        assert_eq!(later.write_count(), 1);
    }

    #[tokio::test]
    async fn test_no_sinks_no_reports() {
        let reports = DescriptorPublisher::default().publish(&descriptor()).await;
        assert!(reports.is_empty());
    }
}
