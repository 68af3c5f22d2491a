//! Candidate generation from recorded header schemas
//!
//! Each recorded interaction for the inbound method and target contributes
//! its header *names*. The inbound values for those names are projected
//! into a candidate request, so the engine can match recordings that
//! were keyed on different header subsets (e.g. role-based responses).

use std::collections::HashSet;

use crate::cassette::{Interaction, InteractionRequest, Protocol};
use crate::fingerprint::Fingerprint;

use super::normalize::NormalizedRequest;

/// A request built to query the engine, with its fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Request to replay
    pub request: InteractionRequest,
    /// Engine fingerprint of `request`
    pub fingerprint: Fingerprint,
}

/// Build the ordered, deduplicated candidates for one inbound request
///
/// Candidates follow cassette order. When no recorded interaction yields
/// one, a single header-less fallback is returned. The fallback is *not*
/// appended when schema-driven candidates exist, even if they all miss.
pub fn build_candidates<F>(
    interactions: &[Interaction],
    inbound: &NormalizedRequest,
    fingerprint: F,
) -> Vec<Candidate>
where
    F: Fn(&InteractionRequest) -> Fingerprint,
{
    let (candidates, _) = interactions
        .iter()
        .map(|interaction| &interaction.request)
        .filter(|recorded| is_same_route(recorded, inbound))
        .filter_map(|recorded| project_headers(recorded, inbound))
        .map(|headers| candidate_request(inbound, headers))
        .fold(
            (Vec::new(), HashSet::new()),
            |(mut candidates, mut seen), request| {
                let fingerprint = fingerprint(&request);
                if seen.insert(fingerprint) {
                    candidates.push(Candidate {
                        request,
                        fingerprint,
                    });
                }
                (candidates, seen)
            },
        );

    if candidates.is_empty() {
        let request = candidate_request(inbound, Vec::new());
        let fingerprint = fingerprint(&request);
        return vec![Candidate {
            request,
            fingerprint,
        }];
    }

    candidates
}

fn is_same_route(recorded: &InteractionRequest, inbound: &NormalizedRequest) -> bool {
    recorded.protocol == Protocol::Http
        && recorded.action == inbound.method
        && recorded.target == inbound.target
}

/// Inbound values for every recorded header name, or `None` if any is absent
fn project_headers(
    recorded: &InteractionRequest,
    inbound: &NormalizedRequest,
) -> Option<Vec<(String, String)>> {
    recorded
        .header_names()
        .map(|name| inbound.header(name).map(|value| (name.to_string(), value)))
        .collect()
}

fn candidate_request(
    inbound: &NormalizedRequest,
    headers: Vec<(String, String)>,
) -> InteractionRequest {
    InteractionRequest::http(
        inbound.method.clone(),
        inbound.target.clone(),
        headers,
        inbound.body.clone(),
    )
}
