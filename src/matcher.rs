//! User-Agent pattern matching.

use regex::{Regex, RegexBuilder};

/// Compile a definition's User-Agent pattern case-insensitively.
///
/// Returns `None` for patterns that fail to compile; the definition
/// carrying such a pattern never matches anything.
pub fn compile_ua_pattern(pattern: &str) -> Option<Regex> {
    RegexBuilder::new(pattern).case_insensitive(true).build().ok()
}

/// Test a claimed User-Agent string against a pattern.
///
/// The test is case-insensitive. An invalid pattern yields `false` for
/// every input.
pub fn ua_matches(user_agent: &str, pattern: &str) -> bool {
    compile_ua_pattern(pattern).is_some_and(|re| re.is_match(user_agent))
}
