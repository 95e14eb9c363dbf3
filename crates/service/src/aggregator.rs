//! Combining per-provider answers into one coverage answer
//!
//! [`aggregate`] is a pure function: it performs no I/O and its output
//! depends only on its arguments, so ranking is reproducible regardless of
//! the order in which provider calls completed.

use chrono::{DateTime, Utc};
use coverage_types::models::{HIGH_CONFIDENCE, LOW_CONFIDENCE};
use coverage_types::{
	AggregatedResult, CoverageQuery, ProviderComparison, ProviderDescriptor, ProviderResult,
	Technology, TechnologyComparison, TechnologyRecommendation, TechnologySet,
};
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// A provider's result paired with the priority it was registered under
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderOutcome {
	pub priority: u8,
	pub result: ProviderResult,
}

impl ProviderOutcome {
	pub fn new(priority: u8, result: ProviderResult) -> Self {
		Self { priority, result }
	}
}

/// Build the combined answer from outcomes given in registration order
///
/// Covered results are ranked by priority, then confidence (both
/// descending), then registration order. The first ranked result is the
/// best provider and the rest are alternatives. The same ranking, narrowed
/// to the providers covering each technology, gives the per-technology
/// recommendations.
pub fn aggregate(
	query: CoverageQuery,
	outcomes: Vec<ProviderOutcome>,
	generated_at: DateTime<Utc>,
) -> AggregatedResult {
	let union_technologies: TechnologySet = outcomes
		.iter()
		.filter(|o| o.result.covered)
		.flat_map(|o| o.result.technologies.iter().copied())
		.collect();

	let overall_confidence = outcomes
		.iter()
		.filter(|o| o.result.covered)
		.map(|o| o.result.confidence)
		.max()
		.unwrap_or(0);

	let mut ranked: Vec<(usize, &ProviderOutcome)> = outcomes
		.iter()
		.enumerate()
		.filter(|(_, o)| o.result.covered)
		.collect();
	ranked.sort_by_key(|(index, o)| (Reverse(o.priority), Reverse(o.result.confidence), *index));

	let mut by_technology: BTreeMap<Technology, TechnologyRecommendation> = BTreeMap::new();
	for (_, outcome) in &ranked {
		for technology in &outcome.result.technologies {
			by_technology
				.entry(*technology)
				.and_modify(|r| r.alternatives.push(outcome.result.provider.clone()))
				.or_insert_with(|| TechnologyRecommendation {
					technology: *technology,
					recommended: outcome.result.provider.clone(),
					alternatives: Vec::new(),
				});
		}
	}

	let mut ranked = ranked.into_iter().map(|(_, o)| o.result.clone());
	let best_provider = ranked.next();
	let alternatives: Vec<ProviderResult> = ranked.collect();

	AggregatedResult {
		query,
		generated_at,
		covered_any: best_provider.is_some(),
		union_technologies,
		best_provider,
		alternatives,
		overall_confidence,
		by_technology,
		providers: outcomes.into_iter().map(|o| o.result).collect(),
	}
}

/// Compare every provider able to deliver `technology` within one answer
///
/// `descriptors` are the registered providers in registration order.
pub fn compare_technology(
	result: &AggregatedResult,
	technology: Technology,
	descriptors: &[ProviderDescriptor],
) -> TechnologyComparison {
	let covering = |r: &ProviderResult| r.covered && r.technologies.contains(&technology);

	let mut providers: Vec<ProviderComparison> = result
		.best_provider
		.iter()
		.chain(result.alternatives.iter())
		.filter(|r| covering(*r))
		.map(available)
		.collect();

	for descriptor in descriptors.iter().filter(|d| d.supports(technology)) {
		let listed = providers.iter().any(|p| p.provider == descriptor.name);
		let covers = result.provider(&descriptor.name).is_some_and(|r| covering(r));
		if !listed && !covers {
			providers.push(ProviderComparison {
				provider: descriptor.name.clone(),
				available: false,
				confidence: 0,
				pros: Vec::new(),
				cons: vec!["Service not available".to_string()],
			});
		}
	}

	TechnologyComparison {
		technology,
		providers,
	}
}

fn available(result: &ProviderResult) -> ProviderComparison {
	let mut pros = Vec::new();
	let mut cons = Vec::new();

	if result.confidence >= HIGH_CONFIDENCE {
		pros.push("High confidence coverage".to_string());
	} else if result.confidence < LOW_CONFIDENCE {
		cons.push("Low confidence in coverage data".to_string());
	}
	if result.available_packages.is_empty() {
		cons.push("No packages listed".to_string());
	} else {
		pros.push(format!("{} package(s) available", result.available_packages.len()));
	}
	match result.estimated_install_days {
		Some(days) => pros.push(format!("Installation in about {days} days")),
		None => cons.push("Installation estimate unavailable".to_string()),
	}

	ProviderComparison {
		provider: result.provider.clone(),
		available: true,
		confidence: result.confidence,
		pros,
		cons,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use coverage_types::Technology;
	use proptest::prelude::*;
	use std::collections::BTreeSet;

	fn query() -> CoverageQuery {
		CoverageQuery::new(-26.2041, 28.0473)
	}

	fn covered(name: &str, priority: u8, confidence: u8, tech: Technology) -> ProviderOutcome {
		ProviderOutcome::new(priority, ProviderResult::covered(name, [tech], confidence))
	}

	fn missing(name: &str, priority: u8) -> ProviderOutcome {
		ProviderOutcome::new(
			priority,
			ProviderResult::not_covered(name, [Technology::Fibre], "No fibre at this address"),
		)
	}

	#[test]
	fn test_nothing_covered() {
		let result = aggregate(query(), vec![missing("DFA", 8), missing("Vuma", 7)], Utc::now());
		assert!(!result.covered_any);
		assert!(result.best_provider.is_none());
		assert!(result.alternatives.is_empty());
		assert!(result.union_technologies.is_empty());
		assert_eq!(result.overall_confidence, 0);
		assert_eq!(result.providers.len(), 2);
	}

	#[test]
	fn test_empty_outcomes() {
		let result = aggregate(query(), vec![], Utc::now());
		assert!(!result.covered_any);
		assert!(result.providers.is_empty());
	}

	#[test]
	fn test_priority_beats_confidence() {
		let result = aggregate(
			query(),
			vec![
				covered("MTN", 6, 99, Technology::FourG),
				missing("DFA", 8),
				covered("CircleTel", 10, 70, Technology::Lte),
			],
			Utc::now(),
		);

		assert_eq!(result.best_provider_name(), Some("CircleTel"));
		assert_eq!(result.alternatives.len(), 1);
		assert_eq!(result.alternatives[0].provider, "MTN");
		assert_eq!(result.overall_confidence, 99);
		assert_eq!(
			result.union_technologies,
			BTreeSet::from([Technology::Lte, Technology::FourG])
		);
		let order: Vec<_> = result.providers.iter().map(|r| r.provider.as_str()).collect();
		assert_eq!(order, vec!["MTN", "DFA", "CircleTel"]);
	}

	#[test]
	fn test_ties_fall_back_to_confidence_then_registration() {
		let result = aggregate(
			query(),
			vec![
				covered("Vuma", 7, 80, Technology::Fibre),
				covered("Frogfoot", 7, 80, Technology::Fibre),
				covered("Octotel", 7, 90, Technology::Fibre),
			],
			Utc::now(),
		);

		assert_eq!(result.best_provider_name(), Some("Octotel"));
		let alternatives: Vec<_> = result.alternatives.iter().map(|r| r.provider.as_str()).collect();
		assert_eq!(alternatives, vec!["Vuma", "Frogfoot"]);
	}

	#[test]
	fn test_recommendations_per_technology() {
		let result = aggregate(
			query(),
			vec![
				ProviderOutcome::new(
					6,
					ProviderResult::covered("MTN", [Technology::Lte, Technology::FiveG], 70),
				),
				covered("Vuma", 7, 80, Technology::Fibre),
				ProviderOutcome::new(
					10,
					ProviderResult::covered(
						"CircleTel",
						[Technology::FixedWireless, Technology::Lte],
						60,
					),
				),
				missing("DFA", 8),
			],
			Utc::now(),
		);

		let lte = result.recommendation(Technology::Lte).unwrap();
		assert_eq!(lte.recommended, "CircleTel");
		assert_eq!(lte.alternatives, vec!["MTN"]);
		assert_eq!(result.recommendation(Technology::Fibre).unwrap().recommended, "Vuma");
		assert!(result
			.recommendation(Technology::FiveG)
			.unwrap()
			.alternatives
			.is_empty());
		assert!(result.recommendation(Technology::FourG).is_none());

		let technologies: Vec<_> = result.by_technology.keys().copied().collect();
		assert_eq!(
			technologies,
			vec![
				Technology::Fibre,
				Technology::FixedWireless,
				Technology::Lte,
				Technology::FiveG
			]
		);
	}

	#[test]
	fn test_compare_technology_lists_pros_and_cons() {
		let descriptors = vec![
			ProviderDescriptor::new("Openserve", [Technology::Fibre], 9),
			ProviderDescriptor::new("DFA", [Technology::Fibre], 8),
			ProviderDescriptor::new("Vuma", [Technology::Fibre], 7),
			ProviderDescriptor::new("MTN", [Technology::Lte], 6),
		];
		let result = aggregate(
			query(),
			vec![
				ProviderOutcome::new(
					9,
					ProviderResult::covered("Openserve", [Technology::Fibre], 30),
				),
				missing("DFA", 8),
				ProviderOutcome::new(
					7,
					ProviderResult::covered("Vuma", [Technology::Fibre], 92)
						.with_packages(["Vuma 100Mbps"])
						.with_install_days(7),
				),
				ProviderOutcome::new(6, ProviderResult::covered("MTN", [Technology::Lte], 70)),
			],
			Utc::now(),
		);

		let comparison = compare_technology(&result, Technology::Fibre, &descriptors);
		let names: Vec<_> = comparison.providers.iter().map(|p| p.provider.as_str()).collect();
		assert_eq!(names, vec!["Openserve", "Vuma", "DFA"]);
		assert_eq!(comparison.available().count(), 2);

		let openserve = &comparison.providers[0];
		assert!(openserve.pros.is_empty());
		assert_eq!(
			openserve.cons,
			vec![
				"Low confidence in coverage data",
				"No packages listed",
				"Installation estimate unavailable"
			]
		);

		let vuma = &comparison.providers[1];
		assert_eq!(
			vuma.pros,
			vec![
				"High confidence coverage",
				"1 package(s) available",
				"Installation in about 7 days"
			]
		);
		assert!(vuma.cons.is_empty());

		let dfa = &comparison.providers[2];
		assert!(!dfa.available);
		assert_eq!(dfa.cons, vec!["Service not available"]);
	}

	#[test]
	fn test_compare_technology_nobody_covers() {
		let descriptors = vec![ProviderDescriptor::new("DFA", [Technology::Fibre], 8)];
		let result = aggregate(query(), vec![missing("DFA", 8)], Utc::now());

		let comparison = compare_technology(&result, Technology::FiveG, &descriptors);
		assert!(comparison.providers.is_empty());

		let comparison = compare_technology(&result, Technology::Fibre, &descriptors);
		assert_eq!(comparison.providers.len(), 1);
		assert_eq!(comparison.available().count(), 0);
	}

	fn arb_technology() -> impl Strategy<Value = Technology> {
		prop::sample::select(Technology::ALL.to_vec())
	}

	fn arb_outcome() -> impl Strategy<Value = (u8, bool, u8, BTreeSet<Technology>)> {
		(
			1u8..=10,
			any::<bool>(),
			1u8..=100,
			prop::collection::btree_set(arb_technology(), 1..=3),
		)
	}

	fn arb_outcomes() -> impl Strategy<Value = Vec<ProviderOutcome>> {
		prop::collection::vec(arb_outcome(), 0..8).prop_map(|specs| {
			specs
				.into_iter()
				.enumerate()
				.map(|(i, (priority, is_covered, confidence, techs))| {
					let name = format!("provider-{i}");
					let result = if is_covered {
						ProviderResult::covered(name, techs, confidence)
					} else {
						ProviderResult::not_covered(name, techs, "no service")
					};
					ProviderOutcome::new(priority, result)
				})
				.collect()
		})
	}

	proptest! {
		#[test]
		fn prop_union_is_union_of_covered(outcomes in arb_outcomes()) {
			let expected: BTreeSet<Technology> = outcomes
				.iter()
				.filter(|o| o.result.covered)
				.flat_map(|o| o.result.technologies.iter().copied())
				.collect();
			let result = aggregate(query(), outcomes, Utc::now());
			prop_assert_eq!(result.union_technologies, expected);
		}

		#[test]
		fn prop_best_and_alternatives_partition_covered(outcomes in arb_outcomes()) {
			let covered_count = outcomes.iter().filter(|o| o.result.covered).count();
			let total = outcomes.len();
			let result = aggregate(query(), outcomes, Utc::now());

			prop_assert_eq!(result.covered_any, covered_count > 0);
			prop_assert_eq!(result.best_provider.is_some(), covered_count > 0);
			prop_assert_eq!(
				result.alternatives.len(),
				covered_count.saturating_sub(1)
			);
			prop_assert_eq!(result.providers.len(), total);
			prop_assert!(result.providers.iter().all(|r| r.is_consistent()));
			if let Some(best) = &result.best_provider {
				prop_assert!(result.alternatives.iter().all(|a| a.provider != best.provider));
			}
		}

		#[test]
		fn prop_ranking_is_deterministic_under_permutation(
			outcomes in arb_outcomes(),
			seed in any::<u64>(),
		) {
			let now = Utc::now();
			let first = aggregate(query(), outcomes.clone(), now);
			let again = aggregate(query(), outcomes.clone(), now);
			prop_assert_eq!(&first, &again);

			// Rotate registration order; ranking keys must come out the same
			let mut permuted = outcomes;
			if !permuted.is_empty() {
				let len = permuted.len();
				permuted.rotate_left((seed as usize) % len);
			}
			let priorities: std::collections::HashMap<String, u8> = permuted
				.iter()
				.map(|o| (o.result.provider.clone(), o.priority))
				.collect();
			let rotated = aggregate(query(), permuted, now);

			let keys = |r: &AggregatedResult| -> Vec<(u8, u8)> {
				r.best_provider
					.iter()
					.chain(r.alternatives.iter())
					.map(|p| (priorities[&p.provider], p.confidence))
					.collect()
			};
			prop_assert_eq!(keys(&first), keys(&rotated));
			prop_assert_eq!(first.overall_confidence, rotated.overall_confidence);
		}

		#[test]
		fn prop_recommendations_follow_overall_ranking(outcomes in arb_outcomes()) {
			let result = aggregate(query(), outcomes, Utc::now());
			let ranked: Vec<&str> = result
				.best_provider
				.iter()
				.chain(result.alternatives.iter())
				.map(|r| r.provider.as_str())
				.collect();
			prop_assert_eq!(
				result.by_technology.keys().copied().collect::<BTreeSet<_>>(),
				result.union_technologies.clone()
			);
			for recommendation in result.by_technology.values() {
				let names: Vec<&str> = std::iter::once(recommendation.recommended.as_str())
					.chain(recommendation.alternatives.iter().map(|n| n.as_str()))
					.collect();
				let positions: Vec<usize> = names
					.iter()
					.map(|n| ranked.iter().position(|r| r == n).unwrap_or(usize::MAX))
					.collect();
				prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
			}
		}

		#[test]
		fn prop_best_has_top_priority(outcomes in arb_outcomes()) {
			let top = outcomes
				.iter()
				.filter(|o| o.result.covered)
				.map(|o| o.priority)
				.max();
			let priorities: Vec<(String, u8)> = outcomes
				.iter()
				.map(|o| (o.result.provider.clone(), o.priority))
				.collect();
			let result = aggregate(query(), outcomes, Utc::now());
			let best_priority = result.best_provider.as_ref().map(|b| {
				priorities
					.iter()
					.find(|(name, _)| *name == b.provider)
					.map(|(_, p)| *p)
					.unwrap_or(0)
			});
			prop_assert_eq!(best_priority, top);
		}
	}
}
