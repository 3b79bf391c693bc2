//! Compiled required/rejected patterns of a regex profile.

use regex_lite::Regex;

use crate::config::RegexProfile;

use super::RejectReason;

/// A regex profile ready to run against titles. Patterns are case-insensitive.
#[derive(Debug, Clone)]
pub struct CompiledRegexProfile {
    pub name: String,
    required: Vec<(String, Regex)>,
    rejected: Vec<(String, Regex)>,
}

fn compile_all(patterns: &[String]) -> Result<Vec<(String, Regex)>, regex_lite::Error> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?i){}", p)).map(|re| (p.clone(), re)))
        .collect()
}

impl CompiledRegexProfile {
    pub fn compile(profile: &RegexProfile) -> Result<Self, regex_lite::Error> {
        Ok(Self {
            name: profile.name.clone(),
            required: compile_all(&profile.required)?,
            rejected: compile_all(&profile.rejected)?,
        })
    }

    /// Check a raw title.
    ///
    /// A rejected pattern is ignored when it also matches one of the wanted
    /// titles ("Cam" in a title about a camera operator). When required
    /// patterns exist at least one must match.
    pub fn check<'a>(
        &self,
        title: &str,
        wanted: impl IntoIterator<Item = &'a str> + Clone,
    ) -> Result<(), RejectReason> {
        for (pattern, re) in &self.rejected {
            if re.is_match(title) && !wanted.clone().into_iter().any(|w| re.is_match(w)) {
                return Err(RejectReason::RegexRejected(pattern.clone()));
            }
        }

        if !self.required.is_empty() && !self.required.iter().any(|(_, re)| re.is_match(title)) {
            return Err(RejectReason::RegexRequiredMissing);
        }

        Ok(())
    }
}
