//! Core adapter trait for provider implementations

use async_trait::async_trait;
use std::fmt::Debug;

use super::AdapterResult;
use crate::models::{Coordinates, ProviderDescriptor, ProviderResult, TechnologySet};

/// Uniform wrapper around one upstream coverage source
///
/// Implementations talk to their upstream and translate its answer into a
/// [`ProviderResult`]. They may return an error for transport or upstream
/// problems; the service layer converts any error (and any timeout) into a
/// non-covered result, so callers never see provider-specific failures.
/// Coordinates are validated against the service area before an adapter is
/// invoked.
#[async_trait]
pub trait CoverageAdapter: Send + Sync + Debug {
	/// Registration metadata: unique name, technologies and priority
	fn descriptor(&self) -> &ProviderDescriptor;

	fn name(&self) -> &str {
		&self.descriptor().name
	}

	fn technologies(&self) -> &TechnologySet {
		&self.descriptor().supported_technologies
	}

	fn priority(&self) -> u8 {
		self.descriptor().priority
	}

	/// Determine what this provider can deliver at `coordinates`
	async fn check_coverage(&self, coordinates: Coordinates) -> AdapterResult<ProviderResult>;
}
