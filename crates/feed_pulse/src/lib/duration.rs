use std::sync::LazyLock;

use regex::Regex;

static ISO8601_DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").unwrap()
});

/// Converts an ISO-8601 video duration (`PT15M33S`) into seconds.
///
/// Any of the hour/minute/second fields may be absent. Input that does not start
/// with `PT` yields 0.
pub fn parse_duration(duration: &str) -> u64 {
    let Some(caps) = ISO8601_DURATION_RE.captures(duration) else {
        return 0;
    };

    let field = |idx: usize| {
        caps.get(idx)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };

    field(1)
        .saturating_mul(3600)
        .saturating_add(field(2).saturating_mul(60))
        .saturating_add(field(3))
}
