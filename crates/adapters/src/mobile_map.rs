//! Mobile coverage from a carrier map service
//!
//! The carrier publishes one coverage layer per technology. Layers are tried
//! in preference order and the first one that answers decides the verdict,
//! whatever that verdict is. Only when every layer fails at the transport
//! level does the adapter report an error.

use async_trait::async_trait;
use coverage_types::{
	AdapterError, AdapterResult, Coordinates, CoverageAdapter, MobileMapConfig,
	ProviderDescriptor, ProviderResult, Technology,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Answer from one coverage layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalReading {
	/// Explicit verdict from the upstream, when it gives one
	#[serde(default)]
	pub covered: Option<bool>,
	/// 0-100
	pub signal_strength: u8,
	#[serde(default)]
	pub packages: Vec<String>,
	#[serde(default)]
	pub message: Option<String>,
}

impl SignalReading {
	pub fn new(signal_strength: u8) -> Self {
		Self {
			covered: None,
			signal_strength,
			packages: Vec::new(),
			message: None,
		}
	}

	/// Upstream says there is no service here
	pub fn no_service() -> Self {
		Self {
			covered: Some(false),
			..Self::new(0)
		}
	}
}

/// Coarse signal rating shown alongside mobile results
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SignalQuality {
	NoSignal,
	Poor,
	Fair,
	Good,
	Excellent,
}

impl SignalQuality {
	pub fn from_strength(strength: u8) -> Self {
		match strength {
			80.. => SignalQuality::Excellent,
			60..=79 => SignalQuality::Good,
			40..=59 => SignalQuality::Fair,
			20..=39 => SignalQuality::Poor,
			_ => SignalQuality::NoSignal,
		}
	}
}

impl fmt::Display for SignalQuality {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			SignalQuality::NoSignal => "No Signal",
			SignalQuality::Poor => "Poor",
			SignalQuality::Fair => "Fair",
			SignalQuality::Good => "Good",
			SignalQuality::Excellent => "Excellent",
		};
		f.write_str(label)
	}
}

/// Query one technology layer of a carrier coverage map
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MapLookup: Send + Sync {
	async fn lookup(
		&self,
		coordinates: Coordinates,
		technology: Technology,
	) -> AdapterResult<SignalReading>;
}

pub struct MobileMapAdapter {
	descriptor: ProviderDescriptor,
	lookup: Arc<dyn MapLookup>,
	variants: Vec<Technology>,
	signal_threshold: u8,
	default_packages: Vec<String>,
}

impl fmt::Debug for MobileMapAdapter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MobileMapAdapter")
			.field("descriptor", &self.descriptor)
			.field("variants", &self.variants)
			.field("signal_threshold", &self.signal_threshold)
			.finish()
	}
}

impl MobileMapAdapter {
	pub fn new(
		name: impl Into<String>,
		priority: u8,
		config: &MobileMapConfig,
		lookup: Arc<dyn MapLookup>,
	) -> Self {
		Self {
			descriptor: ProviderDescriptor::new(name, config.variants.iter().copied(), priority),
			lookup,
			variants: config.variants.clone(),
			signal_threshold: config.signal_threshold,
			default_packages: config.default_packages.clone(),
		}
	}

	pub fn variants(&self) -> &[Technology] {
		&self.variants
	}

	/// Turn one layer's answer into a result
	///
	/// Only an explicit negative verdict from the upstream means no service.
	/// A signal below the threshold halves confidence but never flips the
	/// verdict on its own.
	fn interpret(&self, technology: Technology, reading: SignalReading) -> ProviderResult {
		let name = self.descriptor.name.as_str();
		let strength = reading.signal_strength.min(100);
		let quality = SignalQuality::from_strength(strength);
		if reading.covered == Some(false) {
			let note = reading
				.message
				.unwrap_or_else(|| format!("No {} service (signal {}, {})", technology, strength, quality));
			return ProviderResult::not_covered(name, [technology], note);
		}

		let (confidence, note) = if strength >= self.signal_threshold {
			(strength, format!("{} signal {} ({})", technology, strength, quality))
		} else {
			(
				strength / 2,
				format!(
					"Weak {} signal {} ({}), below threshold {}",
					technology, strength, quality, self.signal_threshold
				),
			)
		};

		let packages = if reading.packages.is_empty() {
			self.default_packages.clone()
		} else {
			reading.packages
		};

		ProviderResult::covered(name, [technology], confidence)
			.with_packages(packages)
			.with_note(note)
	}
}

#[async_trait]
impl CoverageAdapter for MobileMapAdapter {
	fn descriptor(&self) -> &ProviderDescriptor {
		&self.descriptor
	}

	async fn check_coverage(&self, coordinates: Coordinates) -> AdapterResult<ProviderResult> {
		let mut attempts = Vec::with_capacity(self.variants.len());

		for technology in &self.variants {
			match self.lookup.lookup(coordinates, *technology).await {
				Ok(reading) => {
					debug!(
						"{} {} layer answered with signal {}",
						self.descriptor.name, technology, reading.signal_strength
					);
					return Ok(self.interpret(*technology, reading));
				},
				Err(e) if e.is_transport() => {
					warn!(
						"{} {} layer unreachable, trying next variant: {}",
						self.descriptor.name, technology, e
					);
					attempts.push(format!("{}: {}", technology, e));
				},
				Err(e) => return Err(e),
			}
		}

		Err(AdapterError::VariantsExhausted { attempts })
	}
}
