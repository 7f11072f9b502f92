// Cost accounting (integer cents, no floats)

/// Micro-cents (1/1,000,000 cent) charged per input token
pub const INPUT_MICROCENTS_PER_TOKEN: i64 = 25;

/// Micro-cents charged per output token
pub const OUTPUT_MICROCENTS_PER_TOKEN: i64 = 100;

/// Rough bytes-per-token heuristic for pre-translation estimates
const BYTES_PER_TOKEN: i64 = 4;

/// Actual cost from provider token usage, rounded up, at least one cent.
pub fn actual_cost_cents(input_tokens: u32, output_tokens: u32) -> i64 {
    let microcents = i64::from(input_tokens) * INPUT_MICROCENTS_PER_TOKEN
        + i64::from(output_tokens) * OUTPUT_MICROCENTS_PER_TOKEN;
    microcents.div_ceil(1_000_000).max(1)
}

/// Enqueue-time estimate from source document size. Assumes output roughly
/// matches input length.
pub fn estimated_cost_cents(source_size_bytes: i64) -> i64 {
    let tokens = (source_size_bytes / BYTES_PER_TOKEN).max(1);
    let microcents = tokens * (INPUT_MICROCENTS_PER_TOKEN + OUTPUT_MICROCENTS_PER_TOKEN);
    microcents.div_ceil(1_000_000).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actual_cost_rounds_up_and_floors_at_one_cent() {
        assert_eq!(actual_cost_cents(1, 1), 1);
        // 100k in + 100k out = 2.5M + 10M microcents = 13 cents
        assert_eq!(actual_cost_cents(100_000, 100_000), 13);
    }

    #[test]
    fn estimate_scales_with_size() {
        let small = estimated_cost_cents(1_000);
        let large = estimated_cost_cents(1_000_000);
        assert!(small >= 1);
        assert!(large > small);
    }
}
