//! Per-event transformations.
//!
//! Everything the export pipeline derives from an [`EventRecord`] lives here:
//! the display title, the one-line venue, the cleaned description and the
//! output filename.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, TimeZone};
use regex::Regex;

use crate::error::{CoreError, CoreResult};
use crate::event::{EventRecord, Venue};
use crate::markdown::html_to_markdown;

static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^-a-z0-9]").expect("Invalid slug regex"));

/// Fixed character substitutions applied after markdown conversion.
const SUBSTITUTIONS: [(char, &str); 4] = [
    ('\u{2022}', "*"),
    ('\u{00A0}', " "),
    ('\u{2014}', "-"),
    ('\u{2026}', "..."),
];

/// Compiles a user-supplied regular expression.
///
/// `what` names the option in the error message (e.g. "name filter").
pub fn compile_pattern(what: &'static str, pattern: &str) -> CoreResult<Regex> {
    Regex::new(pattern).map_err(|source| CoreError::InvalidPattern {
        what,
        pattern: pattern.to_string(),
        source,
    })
}

/// Derives the display title from an event name.
///
/// Every match of `cleanup` is removed and surrounding whitespace trimmed.
/// Without a pattern the name is returned unchanged.
pub fn derive_title(name: &str, cleanup: Option<&Regex>) -> String {
    match cleanup {
        Some(pattern) => pattern.replace_all(name, "").trim().to_string(),
        None => name.to_string(),
    }
}

/// Formats a venue as a single comma-separated line.
///
/// The name always comes first. Address lines are taken in order and the
/// first missing line ends the address part, so a lone `address_2` is never
/// shown. City, state and zip are all-or-nothing: if any one is missing the
/// whole group is dropped, including a city that is present.
pub fn format_venue(venue: &Venue) -> String {
    let mut parts = vec![venue.name.as_str()];
    parts.extend(venue.address_lines().into_iter().map_while(|line| line));
    if let [Some(city), Some(state), Some(zip)] = venue.locality() {
        parts.extend([city, state, zip]);
    }
    parts.join(", ")
}

/// Formats the venue of a record, or an empty string when none was announced.
pub fn event_venue(record: &EventRecord) -> String {
    record.venue.as_ref().map(format_venue).unwrap_or_default()
}

/// Converts an HTML description to cleaned markdown.
pub fn clean_description(html: &str) -> String {
    substitute_characters(&html_to_markdown(html))
}

/// Applies the fixed typographic substitutions.
///
/// Bullets become `*`, no-break spaces become plain spaces, em-dashes become
/// `-` and ellipses become three periods. Nothing else is touched.
pub fn substitute_characters(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match SUBSTITUTIONS.iter().find(|(from, _)| *from == ch) {
            Some((_, to)) => out.push_str(to),
            None => out.push(ch),
        }
    }
    out
}

/// Turns a title into a filename-safe slug.
pub fn slugify(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let hyphenated = WHITESPACE_RUNS.replace_all(&lowered, "-");
    NON_SLUG_CHARS.replace_all(&hyphenated, "").into_owned()
}

/// Computes the output path for an event page.
///
/// The filename is `{date}-{slug}.md` where the date is the event start in
/// the caller's timezone. Two events with the same title on the same date map
/// to the same path.
pub fn output_filename<Tz: TimeZone>(start: &DateTime<Tz>, title: &str, output_dir: &Path) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    output_dir.join(format!(
        "{}-{}.md",
        start.format("%Y-%m-%d"),
        slugify(title)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    mod titles {
        use super::*;

        #[test]
        fn unchanged_without_pattern() {
            assert_eq!(derive_title("  Rust Night  ", None), "  Rust Night  ");
        }

        #[test]
        fn removes_matches_and_trims() {
            let cleanup = compile_pattern("title cleanup", r"^Monthly Meetup:").unwrap();
            assert_eq!(
                derive_title("Monthly Meetup: Async Deep Dive ", Some(&cleanup)),
                "Async Deep Dive"
            );
        }

        #[test]
        fn removes_every_match() {
            let cleanup = compile_pattern("title cleanup", r"\[[^\]]*\]").unwrap();
            assert_eq!(
                derive_title("[Online] Borrow checker [Beginner]", Some(&cleanup)),
                "Borrow checker"
            );
        }

        #[test]
        fn invalid_pattern_is_reported() {
            let err = compile_pattern("title cleanup", "(").unwrap_err();
            assert!(matches!(err, CoreError::InvalidPattern { what: "title cleanup", .. }));
        }
    }

    mod venues {
        use super::*;

        #[test]
        fn name_only() {
            assert_eq!(format_venue(&Venue::new("Cafe")), "Cafe");
        }

        #[test]
        fn full_address() {
            let venue = Venue::new("Hack Space")
                .with_address(1, "1 Main St")
                .with_address(2, "Floor 2")
                .with_city("Springfield")
                .with_state("OR")
                .with_zip("97477");
            assert_eq!(
                format_venue(&venue),
                "Hack Space, 1 Main St, Floor 2, Springfield, OR, 97477"
            );
        }

        #[test]
        fn locality_dropped_when_state_missing() {
            let venue = Venue::new("X").with_address(1, "A").with_city("C");
            assert_eq!(format_venue(&venue), "X, A");
        }

        #[test]
        fn address_stops_at_first_gap() {
            let venue = Venue::new("X")
                .with_address(1, "A")
                .with_address(3, "Back door")
                .with_city("C")
                .with_state("S")
                .with_zip("Z");
            assert_eq!(format_venue(&venue), "X, A, C, S, Z");
        }

        #[test]
        fn missing_first_address_line_skips_all_lines() {
            let venue = Venue::new("X")
                .with_address(2, "Suite 5")
                .with_city("C")
                .with_state("S")
                .with_zip("Z");
            assert_eq!(format_venue(&venue), "X, C, S, Z");
        }

        #[test]
        fn locality_dropped_when_zip_missing() {
            let venue = Venue::new("X")
                .with_address(1, "A")
                .with_address(2, "B")
                .with_city("C")
                .with_state("S");
            assert_eq!(format_venue(&venue), "X, A, B");
        }

        #[test]
        fn zip_without_city_is_dropped() {
            let venue = Venue::new("X").with_state("S").with_zip("Z");
            assert_eq!(format_venue(&venue), "X");
        }

        #[test]
        fn record_without_venue() {
            let record = EventRecord::new("1", "Rust Night", Utc::now());
            assert_eq!(event_venue(&record), "");
        }
    }

    mod descriptions {
        use super::*;

        #[test]
        fn substitutes_typography() {
            let input = "a\u{2022}b\u{00A0}c\u{2014}d\u{2026}e";
            assert_eq!(clean_description(input), "a*b c-d...e");
        }

        #[test]
        fn leaves_other_characters_alone() {
            let input = "Caf\u{e9} \u{2013} na\u{ef}ve \u{201c}quotes\u{201d}";
            assert_eq!(substitute_characters(input), input);
        }

        #[test]
        fn converts_html_then_substitutes() {
            let html = "<p>Bring&nbsp;snacks&hellip;</p><p>&bull; pizza &mdash; drinks</p>";
            assert_eq!(
                clean_description(html),
                "Bring snacks...\n\n* pizza - drinks"
            );
        }
    }

    mod filenames {
        use super::*;

        #[test]
        fn slug_rules() {
            assert_eq!(slugify("  Rust Night: Async & Await!  "), "rust-night-async--await");
            assert_eq!(slugify("Multi\t\tspace   title"), "multi-space-title");
            assert_eq!(slugify("Caf\u{e9} Meetup"), "caf-meetup");
        }

        #[test]
        fn filename_uses_event_date() {
            let start = Utc.with_ymd_and_hms(2024, 3, 15, 18, 30, 0).unwrap();
            let path = output_filename(&start, "Rust Night", Path::new("/site/content"));
            assert_eq!(path, PathBuf::from("/site/content/2024-03-15-rust-night.md"));
        }

        #[test]
        fn filename_date_follows_timezone() {
            let start = Utc
                .with_ymd_and_hms(2024, 3, 15, 23, 30, 0)
                .unwrap()
                .with_timezone(&FixedOffset::east_opt(3600).unwrap());
            let path = output_filename(&start, "Late Night", Path::new("out"));
            assert_eq!(path, PathBuf::from("out/2024-03-16-late-night.md"));
        }

        #[test]
        fn same_title_same_day_collides() {
            let morning = Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap();
            let evening = Utc.with_ymd_and_hms(2024, 3, 15, 19, 0, 0).unwrap();
            let dir = Path::new("out");
            assert_eq!(
                output_filename(&morning, "Hack Night", dir),
                output_filename(&evening, "Hack Night", dir)
            );
        }
    }
}
