// pattern.rs — Path glob matching for routing patterns.
//
// Patterns are matched segment by segment. A segment that is exactly `**`
// matches any number of path segments (including zero); every other segment
// is a single-component glob (`*`, `?`, `[...]`) evaluated with the `glob`
// crate. Splitting on `/` first means `*` can never cross a directory
// boundary, and a `prefix/**` pattern only matches on a whole-directory
// boundary (`services/web` does not cover `services/web-old/x.ts`).
//
// A `**` embedded in a segment (`src/**.rs`, `docker-compose**`) spans
// directories: its prefix starts a segment, its suffix ends the same or a
// deeper one.
//
// Both sides are normalized before comparison: backslashes become `/`,
// repeated separators collapse, and a leading `./` is dropped. Paths also
// have `.` and `..` resolved; one that climbs above its start matches
// nothing.

use std::path::Path;

use glob::{MatchOptions, Pattern};

use crate::error::PolicyError;

/// Case-sensitive, per-segment matching. Leading dots are not special, so
/// `.claude/**` and `*.json` behave the same on dotfiles as on other files.
const SEGMENT_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
enum Segment {
    /// `**`: zero or more whole path segments.
    AnyDepth,
    /// A single path component glob.
    Glob(Pattern),
    /// `pre**suf`: one segment matching `pre*suf`, or a segment matching
    /// `pre*` followed at any depth by a segment matching `*suf`.
    Spanning {
        whole: Pattern,
        head: Pattern,
        tail: Pattern,
    },
}

/// A compiled routing pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern. Fails if any segment is not a valid glob.
    pub fn new(pattern: &str) -> Result<Self, PolicyError> {
        let normalized = normalize_path(pattern);
        let mut segments = Vec::new();

        for part in normalized.split('/') {
            if part == "**" {
                // `a/**/**/b` is the same as `a/**/b`.
                if !matches!(segments.last(), Some(Segment::AnyDepth)) {
                    segments.push(Segment::AnyDepth);
                }
                continue;
            }
            let compile = |glob: &str| {
                Pattern::new(glob).map_err(|e| PolicyError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: e.msg.to_string(),
                })
            };
            let segment = match part.split_once("**") {
                Some((prefix, suffix)) => {
                    // Further `**` in the suffix add nothing the span doesn't cover.
                    let suffix = suffix.replace("**", "*");
                    Segment::Spanning {
                        whole: compile(&format!("{}*{}", prefix, suffix))?,
                        head: compile(&format!("{}*", prefix))?,
                        tail: compile(&format!("*{}", suffix))?,
                    }
                }
                None => Segment::Glob(compile(part)?),
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    /// The pattern as written in the policy.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Check whether `path` matches this pattern.
    pub fn matches(&self, path: &str) -> bool {
        let Some(resolved) = resolve_path(path) else {
            return false;
        };
        let parts: Vec<&str> = resolved.split('/').collect();
        match_segments(&self.segments, &parts)
    }
}

fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::AnyDepth, rest)) => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((Segment::Glob(glob), rest)) => match path.split_first() {
            Some((head, tail)) => {
                glob.matches_with(head, SEGMENT_OPTIONS) && match_segments(rest, tail)
            }
            None => false,
        },
        Some((Segment::Spanning { whole, head, tail }, rest)) => match path.split_first() {
            Some((first, after)) => {
                (whole.matches_with(first, SEGMENT_OPTIONS) && match_segments(rest, after))
                    || (head.matches_with(first, SEGMENT_OPTIONS)
                        && (0..after.len()).any(|i| {
                            tail.matches_with(after[i], SEGMENT_OPTIONS)
                                && match_segments(rest, &after[i + 1..])
                        }))
            }
            None => false,
        },
    }
}

/// Check if a path matches a glob pattern.
///
/// If the pattern is invalid, it does not match (fail-closed, not fail-open).
pub fn matches(path: &str, pattern: &str) -> bool {
    match PathPattern::new(pattern) {
        Ok(p) => p.matches(path),
        Err(_) => false,
    }
}

/// Normalize separators so Windows-style and Unix-style paths compare equal.
pub fn normalize_path(path: &str) -> String {
    let unified = path.trim().replace('\\', "/");

    let mut out = String::with_capacity(unified.len());
    let mut previous_was_slash = false;
    for c in unified.chars() {
        if c == '/' {
            if previous_was_slash {
                continue;
            }
            previous_was_slash = true;
        } else {
            previous_was_slash = false;
        }
        out.push(c);
    }

    let mut trimmed = out.as_str();
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }
    if trimmed.len() > 1 {
        trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    }
    trimmed.to_string()
}

/// Normalize `path` and resolve `.` and `..` segments lexically.
///
/// Returns `None` when a `..` would climb above the start of the path (or
/// above `/` for an absolute path).
pub fn resolve_path(path: &str) -> Option<String> {
    let normalized = normalize_path(path);
    let absolute = normalized.starts_with('/');

    let mut parts: Vec<&str> = Vec::new();
    for part in normalized.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    Some(if absolute {
        format!("/{}", joined)
    } else {
        joined
    })
}

/// Expand a leading `~` to the given home directory.
///
/// Only `~` on its own or followed by a separator is expanded; `~user`
/// forms are left untouched.
pub fn expand_home(pattern: &str, home: Option<&Path>) -> String {
    let Some(home) = home else {
        return pattern.to_string();
    };
    let Some(rest) = pattern.strip_prefix('~') else {
        return pattern.to_string();
    };
    if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') {
        format!("{}{}", normalize_path(&home.to_string_lossy()), rest)
    } else {
        pattern.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn double_star_matches_any_depth() {
        let pattern = "services/admin-dashboard/**";
        assert!(matches("services/admin-dashboard/x.ts", pattern));
        assert!(matches("services/admin-dashboard/foo/bar.tsx", pattern));
        assert!(matches("services/admin-dashboard/a/b/c/d.json", pattern));
        assert!(!matches("services/web-portal/x.ts", pattern));
    }

    #[test]
    fn double_star_prefix_is_directory_aligned() {
        assert!(!matches(
            "services/admin-dashboard-old/x.ts",
            "services/admin-dashboard/**"
        ));
    }

    #[test]
    fn double_star_with_suffix_checks_filename() {
        let pattern = "services/admin-dashboard/**/*.test.tsx";
        assert!(matches("services/admin-dashboard/foo/bar.test.tsx", pattern));
        assert!(matches("services/admin-dashboard/bar.test.tsx", pattern));
        assert!(!matches("services/admin-dashboard/foo/bar.tsx", pattern));
    }

    #[test]
    fn double_star_in_the_middle() {
        let pattern = "agent/**/packaging/**";
        assert!(matches("agent/windows/packaging/setup.wxs", pattern));
        assert!(matches("agent/packaging/build.sh", pattern));
        assert!(!matches("agent/windows/src/main.cs", pattern));
    }

    #[test]
    fn bare_double_star_matches_everything() {
        assert!(matches("anything/at/all.rs", "**"));
        assert!(matches("top.rs", "**"));
    }

    #[test]
    fn backslashes_are_normalized_on_both_sides() {
        let pattern = "services/admin-dashboard/**";
        assert!(matches("services\\admin-dashboard\\x.ts", pattern));
        assert_eq!(
            matches("services\\admin-dashboard\\x.ts", pattern),
            matches("services/admin-dashboard/x.ts", pattern)
        );
        assert!(matches("tests/unit/a.cs", "tests\\**\\*.cs"));
    }

    #[test]
    fn single_star_stays_within_a_segment() {
        assert!(matches("docs/plan/phase-1.md", "docs/plan/*.md"));
        assert!(!matches("docs/plan/sub/phase-1.md", "docs/plan/*.md"));
        assert!(matches("docker-compose.prod.yml", "docker-compose*.yml"));
        assert!(matches("docs/plan/v2/design/mock.png", "docs/plan/*/design/**"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert!(matches("CLAUDE.md", "CLAUDE.md"));
        assert!(!matches("claude.md", "CLAUDE.md"));
        assert!(!matches("Services/admin-dashboard/x.ts", "services/admin-dashboard/**"));
    }

    #[test]
    fn question_mark_and_classes() {
        assert!(matches("src/a1.rs", "src/a?.rs"));
        assert!(matches("src/b.rs", "src/[abc].rs"));
        assert!(!matches("src/d.rs", "src/[abc].rs"));
    }

    #[test]
    fn dotfiles_are_not_special() {
        assert!(matches(".mcp.json", "*.json"));
        assert!(matches(".claude/settings.json", ".claude/**"));
    }

    #[test]
    fn invalid_patterns_never_match() {
        assert!(PathPattern::new("src/[.rs").is_err());
        assert!(!matches("src/a.rs", "src/[.rs"));
        assert!(!matches("src/a.rs", "src/a[.rs"));
    }

    #[test]
    fn embedded_double_star_spans_directories() {
        assert!(matches("src/a/b.rs", "src/**.rs"));
        assert!(matches("src/b.rs", "src/**.rs"));
        assert!(!matches("src/a/b.ts", "src/**.rs"));
        assert!(!matches("lib/a/b.rs", "src/**.rs"));

        assert!(matches("docker-compose.yml", "docker-compose**"));
        assert!(matches("docker-compose/prod/app.yml", "docker-compose**"));
        assert!(!matches("compose.yml", "docker-compose**"));

        assert!(matches("agent/win-x64/pkg/setup.wxs", "agent/win-**.wxs"));
        assert!(!matches("agent/linux/pkg/setup.wxs", "agent/win-**.wxs"));
    }

    #[test]
    fn dot_segments_are_resolved_before_matching() {
        assert!(!matches(".claude/../src/config.json", ".claude/**"));
        assert!(matches(".claude/../src/config.json", "src/**"));
        assert!(!matches(
            "services/admin-dashboard/../../agent/windows/x.cs",
            "services/admin-dashboard/**"
        ));
        assert!(matches("services/./admin-dashboard/x.ts", "services/admin-dashboard/**"));
    }

    #[test]
    fn climbing_above_the_start_matches_nothing() {
        assert!(!matches("../outside/x.ts", "**"));
        assert!(!matches("/../etc/passwd", "**"));
        assert_eq!(resolve_path("a/../../b"), None);
        assert_eq!(resolve_path("a/b/../c"), Some("a/c".to_string()));
        assert_eq!(resolve_path("/work/p/../q"), Some("/work/q".to_string()));
    }

    #[test]
    fn normalize_collapses_and_strips() {
        assert_eq!(normalize_path("./src//lib.rs"), "src/lib.rs");
        assert_eq!(normalize_path("a\\b\\c/"), "a/b/c");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("/home//u/x"), "/home/u/x");
    }

    #[test]
    fn absolute_patterns_match_absolute_paths() {
        assert!(matches(
            "/home/dev/.claude/plans/plan.md",
            "/home/dev/.claude/plans/*.md"
        ));
        assert!(!matches("home/dev/.claude/plans/plan.md", "/home/dev/.claude/plans/*.md"));
    }

    #[test]
    fn home_expansion() {
        let home = PathBuf::from("/home/dev");
        assert_eq!(
            expand_home("~/.claude/plans/*.md", Some(&home)),
            "/home/dev/.claude/plans/*.md"
        );
        assert_eq!(expand_home("~", Some(&home)), "/home/dev");
        assert_eq!(expand_home("~other/x", Some(&home)), "~other/x");
        assert_eq!(expand_home("docs/*.md", Some(&home)), "docs/*.md");
        assert_eq!(expand_home("~/x", None), "~/x");
    }
}
