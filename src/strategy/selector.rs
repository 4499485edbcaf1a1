use super::BaseVersion;

/// The winning candidate plus the ones it beat
#[derive(Debug, Clone)]
pub struct Selection {
    pub winner: BaseVersion,
    pub others: Vec<BaseVersion>,
}

/// Pick the highest version.
///
/// Equal versions prefer a candidate carrying a timestamp, then the earlier
/// one in declaration order. No candidates gives the non-incrementing
/// `0.0.0` fallback.
pub fn select(candidates: Vec<BaseVersion>) -> Selection {
    let mut best: Option<usize> = None;
    for (idx, candidate) in candidates.iter().enumerate() {
        let beats = match best {
            None => true,
            Some(b) => {
                let current = &candidates[b];
                candidate.semantic_version > current.semantic_version
                    || (candidate.semantic_version == current.semantic_version
                        && candidate.when.is_some()
                        && current.when.is_none())
            }
        };
        if beats {
            best = Some(idx);
        }
    }

    let Some(winner_idx) = best else {
        return Selection {
            winner: BaseVersion::fallback(),
            others: Vec::new(),
        };
    };

    let mut others = candidates;
    let winner = others.remove(winner_idx);
    tracing::debug!(winner = %winner, "Selected base version");
    Selection { winner, others }
}
