//! Mock adapters for demos and testing
//!
//! Scriptable adapters that count their invocations, so callers can verify
//! caching and deduplication without touching a real upstream.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use coverage_types::{
	AdapterError, AdapterResult, Coordinates, CoverageAdapter, ProviderDescriptor,
	ProviderResult, Technology,
};

/// What a [`MockCoverageAdapter`] answers with
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
	Covered { confidence: u8 },
	NotCovered,
	/// Connection-level failure
	TransportFailure,
	/// Upstream answered with an error
	Rejected,
	/// Never answers; relies on the engine timeout
	Hang,
}

#[derive(Debug, Clone)]
pub struct MockCoverageAdapter {
	descriptor: ProviderDescriptor,
	behavior: MockBehavior,
	delay: Duration,
	packages: Vec<String>,
	calls: Arc<AtomicUsize>,
}

impl MockCoverageAdapter {
	pub fn new(
		name: impl Into<String>,
		technologies: impl IntoIterator<Item = Technology>,
		priority: u8,
		behavior: MockBehavior,
	) -> Self {
		Self {
			descriptor: ProviderDescriptor::new(name, technologies, priority),
			behavior,
			delay: Duration::ZERO,
			packages: Vec::new(),
			calls: Arc::new(AtomicUsize::new(0)),
		}
	}

	pub fn covered(
		name: impl Into<String>,
		technologies: impl IntoIterator<Item = Technology>,
		priority: u8,
		confidence: u8,
	) -> Self {
		Self::new(
			name,
			technologies,
			priority,
			MockBehavior::Covered { confidence },
		)
	}

	pub fn not_covered(
		name: impl Into<String>,
		technologies: impl IntoIterator<Item = Technology>,
		priority: u8,
	) -> Self {
		Self::new(name, technologies, priority, MockBehavior::NotCovered)
	}

	pub fn failing(
		name: impl Into<String>,
		technologies: impl IntoIterator<Item = Technology>,
		priority: u8,
	) -> Self {
		Self::new(name, technologies, priority, MockBehavior::TransportFailure)
	}

	pub fn hanging(
		name: impl Into<String>,
		technologies: impl IntoIterator<Item = Technology>,
		priority: u8,
	) -> Self {
		Self::new(name, technologies, priority, MockBehavior::Hang)
	}

	/// Answer only after `delay_ms`
	pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
		self.delay = Duration::from_millis(delay_ms);
		self
	}

	pub fn with_packages<I, S>(mut self, packages: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.packages = packages.into_iter().map(Into::into).collect();
		self
	}

	/// Invocations so far, shared across clones
	pub fn call_count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn call_tracker(&self) -> Arc<AtomicUsize> {
		Arc::clone(&self.calls)
	}

	pub fn into_adapter(self) -> Arc<dyn CoverageAdapter> {
		Arc::new(self)
	}
}

#[async_trait]
impl CoverageAdapter for MockCoverageAdapter {
	fn descriptor(&self) -> &ProviderDescriptor {
		&self.descriptor
	}

	async fn check_coverage(&self, coordinates: Coordinates) -> AdapterResult<ProviderResult> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		if !self.delay.is_zero() {
			tokio::time::sleep(self.delay).await;
		}

		let name = self.descriptor.name.clone();
		let technologies = self.descriptor.supported_technologies.clone();
		match &self.behavior {
			MockBehavior::Covered { confidence } => {
				Ok(ProviderResult::covered(name, technologies, *confidence)
					.with_packages(self.packages.clone())
					.with_note(format!("Mock coverage at {}", coordinates)))
			},
			MockBehavior::NotCovered => Ok(ProviderResult::not_covered(
				name,
				technologies,
				format!("No mock coverage at {}", coordinates),
			)),
			MockBehavior::TransportFailure => Err(AdapterError::Connection(format!(
				"{} upstream unreachable",
				name
			))),
			MockBehavior::Rejected => Err(AdapterError::Rejected {
				code: "MOCK_ERROR".to_string(),
				message: "Simulated upstream rejection".to_string(),
			}),
			MockBehavior::Hang => std::future::pending().await,
		}
	}
}
