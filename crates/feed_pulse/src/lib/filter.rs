use crate::types::{Candidate, PrivacyStatus};

/// Page size limit of the channel listing
const MAX_LISTING_RESULTS: usize = 50;
const MIN_OVERFETCH: usize = 15;

/// How many candidates to request from a channel so that `count` survive filtering
pub fn overfetch_size(count: usize) -> usize {
    count
        .saturating_mul(3)
        .max(MIN_OVERFETCH)
        .min(MAX_LISTING_RESULTS)
}

/// Keeps up to `count` public candidates, in listing order.
///
/// Short-form and members-only videos are deliberately not excluded here; access
/// restrictions surface later while resolving the transcript.
pub fn select_candidates<I>(candidates: I, count: usize) -> Vec<Candidate>
where
    I: IntoIterator<Item = Candidate>,
{
    candidates
        .into_iter()
        .filter(|c| {
            let keep = c.privacy_status == PrivacyStatus::Public;
            if !keep {
                tracing::debug!(
                    video_id = %c.id,
                    privacy_status = ?c.privacy_status,
                    "Skipping non-public video"
                );
            }
            keep
        })
        .take(count)
        .collect()
}
