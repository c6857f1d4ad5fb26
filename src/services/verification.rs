//! Verification decision policy.
//!
//! The two check-in paths run the same comparison pipeline under different
//! parameters: the camera path tolerates weak detection but demands a closer
//! match, the fallback path enforces detection and raises the bar further.

use crate::clients::face::MatchResult;

/// Parameters governing one verification attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerifyPolicy {
    /// Whether the eye-separation liveness gate runs before comparison.
    pub liveness_gate: bool,
    /// Whether the matcher must find a face in both images.
    pub enforce_detection: bool,
    /// Minimum similarity (0-100) for acceptance, inclusive.
    pub min_similarity: f64,
}

/// Live-camera check-in: gated, lenient detection, 70% bar.
pub const PRIMARY: VerifyPolicy = VerifyPolicy {
    liveness_gate: true,
    enforce_detection: false,
    min_similarity: 70.0,
};

/// Credential-assisted fallback: ungated, strict detection, 80% bar.
pub const FALLBACK: VerifyPolicy = VerifyPolicy {
    liveness_gate: false,
    enforce_detection: true,
    min_similarity: 80.0,
};

/// Maps embedding distance to the 0-100 similarity scale.
#[must_use]
pub fn similarity_from_distance(distance: f64) -> f64 {
    (1.0 - distance) * 100.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    Accepted { similarity: f64 },
    Rejected { similarity: f64 },
}

/// Accepts only when the matcher agreed the faces match AND similarity
/// clears the policy's bar. Either condition alone is insufficient.
#[must_use]
pub fn decide(result: MatchResult, policy: &VerifyPolicy) -> Decision {
    let similarity = similarity_from_distance(result.distance);

    if result.verified && similarity >= policy.min_similarity {
        Decision::Accepted { similarity }
    } else {
        Decision::Rejected { similarity }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched(distance: f64) -> MatchResult {
        MatchResult {
            distance,
            verified: true,
        }
    }

    #[test]
    fn test_similarity_scale() {
        assert!((similarity_from_distance(0.0) - 100.0).abs() < 1e-9);
        assert!((similarity_from_distance(0.25) - 75.0).abs() < 1e-9);
        assert!((similarity_from_distance(1.0)).abs() < 1e-9);
    }

    #[test]
    fn test_primary_accepts_exactly_at_threshold() {
        // distance 0.25 -> similarity exactly 75 in binary floating point;
        // the bound is inclusive.
        let decision = decide(matched(0.25), &PRIMARY);
        assert!(matches!(decision, Decision::Accepted { .. }));

        let at_bar = decide(
            MatchResult {
                distance: 0.3,
                verified: true,
            },
            &PRIMARY,
        );
        assert!(matches!(at_bar, Decision::Accepted { .. }));
    }

    #[test]
    fn test_primary_rejects_just_below_threshold() {
        let decision = decide(matched(0.3001), &PRIMARY);
        match decision {
            Decision::Rejected { similarity } => assert!(similarity < 70.0),
            Decision::Accepted { .. } => panic!("69.99 must not clear the 70 bar"),
        }
    }

    #[test]
    fn test_unverified_match_rejected_despite_high_similarity() {
        let result = MatchResult {
            distance: 0.05,
            verified: false,
        };
        assert!(matches!(decide(result, &PRIMARY), Decision::Rejected { .. }));
    }

    #[test]
    fn test_fallback_bar_is_stricter() {
        // similarity 75: passes primary, fails fallback.
        assert!(matches!(
            decide(matched(0.25), &PRIMARY),
            Decision::Accepted { .. }
        ));
        assert!(matches!(
            decide(matched(0.25), &FALLBACK),
            Decision::Rejected { .. }
        ));
    }

    #[test]
    fn test_policy_parameters() {
        assert!(PRIMARY.liveness_gate);
        assert!(!PRIMARY.enforce_detection);
        assert!(!FALLBACK.liveness_gate);
        assert!(FALLBACK.enforce_detection);
    }
}
