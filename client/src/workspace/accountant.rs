use contentflow_common::{word_count, GenerationHistory, PlanTier, User};

/// Monthly word allowance on the Free plan.
pub const FREE_WORD_LIMIT: u64 = 5_000;

/// Credits debited per successful generation.
pub const GENERATION_COST: i64 = 10;

/// Whether the user may start another generation.
pub fn can_generate(user: &User) -> bool {
    user.plan != PlanTier::Free || user.usage_this_month < FREE_WORD_LIMIT
}

/// Fold a completed generation into user and history.
///
/// Pure: returns the updated user and the new history with `entry`
/// prepended. Never touches the network; callers invoke it exactly once
/// per successful generation, never on failure. Credits are debited
/// without a floor.
pub fn apply_generation(
    user: &User,
    history: &[GenerationHistory],
    entry: GenerationHistory,
) -> (User, Vec<GenerationHistory>) {
    let mut updated = user.clone();
    updated.credits -= GENERATION_COST;
    updated.usage_this_month += word_count(&entry.content);

    let mut new_history = Vec::with_capacity(history.len() + 1);
    new_history.push(entry);
    new_history.extend_from_slice(history);

    (updated, new_history)
}
