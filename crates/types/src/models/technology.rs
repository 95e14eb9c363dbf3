//! Deliverable connectivity technologies

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// A connectivity type a provider can deliver at a location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Technology {
	#[serde(rename = "FIBRE")]
	Fibre,
	#[serde(rename = "FIXED_WIRELESS")]
	FixedWireless,
	#[serde(rename = "LTE")]
	Lte,
	#[serde(rename = "4G")]
	FourG,
	#[serde(rename = "5G")]
	FiveG,
}

/// Ordered set so serialized output and cache discriminators are stable
pub type TechnologySet = BTreeSet<Technology>;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unknown technology: {0}")]
pub struct UnknownTechnology(pub String);

impl Technology {
	pub const ALL: [Technology; 5] = [
		Technology::Fibre,
		Technology::FixedWireless,
		Technology::Lte,
		Technology::FourG,
		Technology::FiveG,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			Technology::Fibre => "FIBRE",
			Technology::FixedWireless => "FIXED_WIRELESS",
			Technology::Lte => "LTE",
			Technology::FourG => "4G",
			Technology::FiveG => "5G",
		}
	}

	/// Mobile technologies are served by carrier map lookups
	pub fn is_mobile(&self) -> bool {
		matches!(
			self,
			Technology::Lte | Technology::FourG | Technology::FiveG
		)
	}
}

impl fmt::Display for Technology {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl std::str::FromStr for Technology {
	type Err = UnknownTechnology;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_uppercase().as_str() {
			"FIBRE" | "FIBER" => Ok(Technology::Fibre),
			"FIXED_WIRELESS" => Ok(Technology::FixedWireless),
			"LTE" => Ok(Technology::Lte),
			"4G" => Ok(Technology::FourG),
			"5G" => Ok(Technology::FiveG),
			_ => Err(UnknownTechnology(s.to_string())),
		}
	}
}
