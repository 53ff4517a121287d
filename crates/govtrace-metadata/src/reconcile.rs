//! Pure trust-ranked reconciliation rules, kept free of I/O so they can
//! be tested against hand-built candidate lists.

use govtrace_core::DataSource;

/// Generic names a non-generic later source may override.
pub const GENERIC_NAMES: &[&str] =
    &["TransparentUpgradeableProxy", "ERC1967Proxy", "UUPSProxy", "Proxy", "ERC20", "Token"];

pub fn is_generic(name: &str) -> bool {
    GENERIC_NAMES.contains(&name)
}

/// One candidate value plus where it came from, already sorted by the
/// caller into trust order (highest trust first).
#[derive(Debug, Clone)]
pub struct Candidate {
    pub value: String,
    pub source: DataSource,
}

/// Rule 1: the first non-null candidate wins, unless it is a generic
/// name and a lower-trust candidate is non-generic — then the first
/// non-generic candidate wins instead.
pub fn resolve_contract_name(candidates: &[Candidate]) -> Option<Candidate> {
    let mut fallback: Option<&Candidate> = None;
    for candidate in candidates {
        if !is_generic(&candidate.value) {
            return Some(candidate.clone());
        }
        if fallback.is_none() {
            fallback = Some(candidate);
        }
    }
    fallback.cloned()
}

/// Rule 2: pick the longest (most informative) candidate string,
/// breaking ties in favor of the higher-trust (earlier) candidate.
pub fn resolve_longest(candidates: &[Candidate]) -> Option<Candidate> {
    let mut best: Option<&Candidate> = None;
    for candidate in candidates {
        if candidate.value.is_empty() {
            continue;
        }
        match best {
            Some(current) if candidate.value.len() <= current.value.len() => {}
            _ => best = Some(candidate),
        }
    }
    best.cloned()
}

/// Rule 5: parses the tag service's flat `KEY:value` attribute strings.
pub fn parse_tag_attribute(attribute: &str) -> Option<(&'static str, &str)> {
    if let Some(rest) = attribute.strip_prefix("CN:") {
        Some(("CN", rest))
    } else if let Some(rest) = attribute.strip_prefix("ENS:") {
        Some(("ENS", rest))
    } else if let Some(rest) = attribute.strip_prefix("TS:") {
        Some(("TS", rest))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(value: &str) -> Candidate {
        Candidate { value: value.to_string(), source: DataSource::Hardcoded { location: "test".into(), reason: "test".into() } }
    }

    #[test]
    fn generic_first_candidate_is_overridden_by_later_non_generic() {
        let candidates = vec![candidate("TransparentUpgradeableProxy"), candidate("Comet USDC")];
        assert_eq!(resolve_contract_name(&candidates).unwrap().value, "Comet USDC");
    }

    #[test]
    fn non_generic_first_candidate_wins_outright() {
        let candidates = vec![candidate("Comet USDC"), candidate("Proxy")];
        assert_eq!(resolve_contract_name(&candidates).unwrap().value, "Comet USDC");
    }

    #[test]
    fn all_generic_falls_back_to_highest_trust() {
        let candidates = vec![candidate("Proxy"), candidate("ERC20")];
        assert_eq!(resolve_contract_name(&candidates).unwrap().value, "Proxy");
    }

    #[test]
    fn longest_candidate_wins_ties_broken_by_trust_order() {
        let candidates = vec![candidate("USDC"), candidate("USD Coin (Bridged)"), candidate("USD")];
        assert_eq!(resolve_longest(&candidates).unwrap().value, "USD Coin (Bridged)");
    }

    #[test]
    fn tag_attribute_prefixes_parse() {
        assert_eq!(parse_tag_attribute("ENS:vitalik.eth"), Some(("ENS", "vitalik.eth")));
        assert_eq!(parse_tag_attribute("unrecognized:value"), None);
    }
}
