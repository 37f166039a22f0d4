//! Obstacle corpus construction
//!
//! Derives the course from the host page's section structure, or from a
//! canned fallback sequence when no usable structure exists. Building
//! never fails: missing structure, missing headings and unmatchable text
//! all degrade to generic labels or the fallback course.

use std::sync::LazyLock;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use regex::Regex;

use super::state::{Corpus, Obstacle, SimConfig};
use crate::consts::*;

/// A structural block of host content, as seen by the builder.
/// `top` is the block's position in the overall content flow, in the same
/// units as the scroll offset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentBlock {
    pub id: Option<String>,
    pub top: f32,
    pub height: f32,
    pub heading: Option<String>,
}

/// Exact block-id -> label lookup, tried before any text matching
const LABEL_OVERRIDES: &[(&str, &str)] = &[
    ("hero", "welcome"),
    ("how-it-works", "how it works"),
    ("four-steps", "four steps"),
    ("savings", "savings"),
    ("testimonials", "reviews"),
    ("faq", "FAQ"),
    ("get-started", "get started"),
];

/// Ordered heading patterns, first match wins. Content-coupled and
/// best-effort: when the page wording drifts, labels fall through to
/// generic shortening instead of failing.
static LABEL_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)four\s+steps", "four steps"),
        (r"(?i)pre.?approv", "pre-approval"),
        (r"(?i)\bagents?\b", "agents"),
        (r"(?i)\bsav(e|ings?)\b", "savings"),
        (r"(?i)\brates?\b", "rates"),
        (r"(?i)\bkeys?\b", "your keys"),
        (r"(?i)questions|faq", "FAQ"),
    ]
    .iter()
    .map(|(pattern, label)| (Regex::new(pattern).expect("static pattern"), *label))
    .collect()
});

/// Label used when a block yields no usable text at all
const GENERIC_LABEL: &str = "next step";

/// Canned course for pages without structural content
const FALLBACK_LABELS: &[&str] = &[
    "inspection",
    "appraisal",
    "escrow",
    "paperwork",
    "closing costs",
    "moving day",
    "new keys",
    "home at last",
];

/// Build the obstacle corpus for the current layout. Blocks with trivial
/// rendered height are skipped; if nothing qualifies, the fallback course
/// is generated instead.
pub fn build_corpus(blocks: &[ContentBlock], config: &SimConfig) -> Corpus {
    let corpus = structural_corpus(blocks, config);
    if corpus.is_empty() {
        fallback_corpus(config)
    } else {
        corpus
    }
}

fn structural_corpus(blocks: &[ContentBlock], config: &SimConfig) -> Corpus {
    let lead = config.lane_extent() * BLOCK_LEAD_FACTOR;
    let mut obstacles: Vec<Obstacle> = Vec::new();

    for block in blocks.iter().filter(|b| b.height >= MIN_BLOCK_HEIGHT) {
        let label = resolve_label(block, config.compact);
        let mut world_pos = block.top + lead;
        if let Some(prev) = obstacles.last() {
            world_pos = world_pos.max(prev.world_pos + MIN_OBSTACLE_GAP);
        }
        let id = obstacles.len() as u32 + 1;
        obstacles.push(Obstacle {
            id,
            width: obstacle_width(&label, config.compact),
            height: obstacle_height(obstacles.len(), config.compact),
            label,
            world_pos,
        });
    }

    Corpus { obstacles }
}

/// Fixed-length deterministic course. The seeded RNG gives the gaps and
/// heights a little variation while keeping rebuilds byte-identical.
fn fallback_corpus(config: &SimConfig) -> Corpus {
    let mut rng = Pcg32::seed_from_u64(FALLBACK_SEED);
    let mut world_pos = config.arena_width();
    let obstacles = FALLBACK_LABELS
        .iter()
        .enumerate()
        .map(|(index, label)| {
            world_pos += MIN_OBSTACLE_GAP + rng.random_range(0.0..FALLBACK_GAP_JITTER);
            let height = obstacle_height(index, config.compact) + rng.random_range(0.0..8.0);
            Obstacle {
                id: index as u32 + 1,
                label: (*label).to_string(),
                world_pos,
                width: obstacle_width(label, config.compact),
                height,
            }
        })
        .collect();

    Corpus { obstacles }
}

/// Label resolution order: id override table, then the heading pattern
/// list, then generic shortening, then the generic placeholder.
fn resolve_label(block: &ContentBlock, compact: bool) -> String {
    if let Some(id) = &block.id {
        if let Some((_, label)) = LABEL_OVERRIDES.iter().find(|(key, _)| key == id) {
            return (*label).to_string();
        }
    }

    if let Some(heading) = &block.heading {
        for (pattern, label) in LABEL_PATTERNS.iter() {
            if pattern.is_match(heading) {
                return (*label).to_string();
            }
        }
        if let Some(short) = shorten_label(heading, compact) {
            return short;
        }
    }

    GENERIC_LABEL.to_string()
}

/// Generic shortening: strip non-alphanumerics (keeping `%` and `&`),
/// take the first 2 (compact) or 3 words, hard-truncate with an ellipsis
/// past 18/22 characters. Returns None when nothing survives.
fn shorten_label(text: &str, compact: bool) -> Option<String> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '%' || *c == '&')
        .collect();

    let max_words = if compact {
        LABEL_MAX_WORDS_COMPACT
    } else {
        LABEL_MAX_WORDS
    };
    let words: Vec<&str> = cleaned.split_whitespace().take(max_words).collect();
    if words.is_empty() {
        return None;
    }

    let mut label = words.join(" ");
    let max_chars = if compact {
        LABEL_MAX_CHARS_COMPACT
    } else {
        LABEL_MAX_CHARS
    };
    if label.chars().count() > max_chars {
        label = label.chars().take(max_chars - 1).collect();
        label = label.trim_end().to_string();
        label.push('…');
    }
    Some(label)
}

fn obstacle_width(label: &str, compact: bool) -> f32 {
    let scale = if compact { COMPACT_DIM_SCALE } else { 1.0 };
    let base = OBSTACLE_BASE_WIDTH * scale;
    let max = OBSTACLE_MAX_WIDTH * scale;
    (base + label.chars().count() as f32 * LABEL_CHAR_WIDTH * scale).clamp(base, max)
}

fn obstacle_height(index: usize, compact: bool) -> f32 {
    let scale = if compact { COMPACT_DIM_SCALE } else { 1.0 };
    HEIGHT_PALETTE[index % HEIGHT_PALETTE.len()] * scale
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(id: Option<&str>, top: f32, height: f32, heading: Option<&str>) -> ContentBlock {
        ContentBlock {
            id: id.map(str::to_string),
            top,
            height,
            heading: heading.map(str::to_string),
        }
    }

    #[test]
    fn test_label_override_table() {
        let b = block(Some("faq"), 0.0, 400.0, Some("Anything else?"));
        assert_eq!(resolve_label(&b, false), "FAQ");
    }

    #[test]
    fn test_label_pattern_match() {
        let b = block(None, 0.0, 400.0, Some("Get pre-approved in minutes"));
        assert_eq!(resolve_label(&b, false), "pre-approval");

        let b = block(None, 0.0, 400.0, Some("Our agents know the market"));
        assert_eq!(resolve_label(&b, false), "agents");
    }

    #[test]
    fn test_label_generic_shortening() {
        // First pattern ("four steps") wins over shortening
        let b = block(
            None,
            0.0,
            400.0,
            Some("Four steps to your keys to home ownership"),
        );
        assert_eq!(resolve_label(&b, false), "four steps");

        // Unmatched heading falls through to shortening
        let short = shorten_label("Four steps to your keys to home ownership", false).unwrap();
        let words: Vec<&str> = short.split_whitespace().collect();
        assert_eq!(words.len(), 3);
        assert!(short.chars().count() <= 22);
        assert!(!short.ends_with(' '));
        assert_eq!(short, "Four steps to");
    }

    #[test]
    fn test_label_truncation_ellipsis() {
        let short = shorten_label("Congratulations homeowner celebration", false).unwrap();
        assert!(short.chars().count() <= 22);
        assert!(short.ends_with('…'));
        assert!(!short.trim_end_matches('…').ends_with(' '));
    }

    #[test]
    fn test_label_keeps_percent_and_ampersand() {
        let short = shorten_label("Save 10% & more today", false).unwrap();
        assert!(short.contains('&'));
        assert!(short.contains('%'));
    }

    #[test]
    fn test_label_empty_heading_placeholder() {
        assert_eq!(shorten_label("***!!!", false), None);
        let b = block(None, 0.0, 400.0, Some("***!!!"));
        assert_eq!(resolve_label(&b, false), GENERIC_LABEL);
        let b = block(None, 0.0, 400.0, None);
        assert_eq!(resolve_label(&b, false), GENERIC_LABEL);
    }

    #[test]
    fn test_compact_uses_two_words() {
        let short = shorten_label("Four steps to your keys", true).unwrap();
        assert_eq!(short, "Four steps");
        assert!(short.chars().count() <= 18);
    }

    #[test]
    fn test_structural_min_gap() {
        let config = SimConfig::default();
        // Deliberately cramped sections
        let blocks = [
            block(None, 0.0, 500.0, Some("One")),
            block(None, 50.0, 500.0, Some("Two")),
            block(None, 120.0, 500.0, Some("Three")),
        ];
        let corpus = structural_corpus(&blocks, &config);
        assert_eq!(corpus.len(), 3);
        for pair in corpus.obstacles.windows(2) {
            assert!(pair[1].world_pos - pair[0].world_pos >= MIN_OBSTACLE_GAP);
        }
    }

    #[test]
    fn test_short_blocks_skipped() {
        let config = SimConfig::default();
        let blocks = [
            block(None, 0.0, 60.0, Some("Tiny banner")),
            block(None, 200.0, 600.0, Some("Real section")),
        ];
        let corpus = structural_corpus(&blocks, &config);
        assert_eq!(corpus.len(), 1);
    }

    #[test]
    fn test_empty_blocks_select_fallback() {
        let config = SimConfig::default();
        let corpus = build_corpus(&[], &config);
        assert_eq!(corpus.len(), FALLBACK_LABELS.len());
        for pair in corpus.obstacles.windows(2) {
            assert!(pair[1].world_pos - pair[0].world_pos >= MIN_OBSTACLE_GAP);
        }
        // Ids are strictly increasing from 1
        for (index, obstacle) in corpus.obstacles.iter().enumerate() {
            assert_eq!(obstacle.id, index as u32 + 1);
        }
    }

    #[test]
    fn test_rebuild_idempotence() {
        let config = SimConfig::default();
        let blocks = [
            block(Some("hero"), 0.0, 700.0, Some("Your place is out there")),
            block(None, 900.0, 650.0, Some("Four steps to your keys")),
            block(None, 1800.0, 500.0, Some("What our buyers say")),
        ];

        let first = build_corpus(&blocks, &config);
        let second = build_corpus(&blocks, &config);
        assert_eq!(first, second);

        // Fallback path is deterministic too (fixed seed)
        let first = build_corpus(&[], &config);
        let second = build_corpus(&[], &config);
        assert_eq!(first, second);
    }

    #[test]
    fn test_width_clamped() {
        let w = obstacle_width("", false);
        assert_eq!(w, OBSTACLE_BASE_WIDTH);
        let w = obstacle_width("a very very long obstacle label indeed", false);
        assert_eq!(w, OBSTACLE_MAX_WIDTH);
    }
}
