use crate::domain::SemanticVersion;
use regex::Regex;

/// Tag naming scheme: a fixed prefix followed by the version (e.g. "v1.2.3").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPattern {
    pub prefix: String,
}

impl TagPattern {
    /// Create a new tag pattern
    pub fn new(prefix: impl Into<String>) -> Self {
        TagPattern {
            prefix: prefix.into(),
        }
    }

    /// Tag name for a version: prefix="v", version=1.2.3 -> "v1.2.3"
    pub fn tag_for(&self, version: &SemanticVersion) -> String {
        format!("{}{}", self.prefix, version)
    }

    /// Strip a leading tag-style prefix from user input.
    ///
    /// The configured prefix wins; a bare leading 'v' or 'V' is also accepted so
    /// that "v1.0.0" works under any prefix.
    pub fn strip<'a>(&self, input: &'a str) -> &'a str {
        let input = input.trim();
        if !self.prefix.is_empty() {
            if let Some(rest) = input.strip_prefix(self.prefix.as_str()) {
                return rest;
            }
        }
        input
            .strip_prefix('v')
            .or_else(|| input.strip_prefix('V'))
            .unwrap_or(input)
    }

    /// Tag name for a free-form version string after prefix normalization.
    pub fn tag_for_input(&self, input: &str) -> String {
        format!("{}{}", self.prefix, self.strip(input))
    }

    /// Whether a tag belongs to this scheme at all.
    pub fn matches(&self, tag: &str) -> bool {
        tag.starts_with(self.prefix.as_str())
    }

    /// Extract the version from a tag that follows this scheme exactly.
    pub fn version_of(&self, tag: &str) -> Option<SemanticVersion> {
        let pattern = format!(r"^{}(\d+\.\d+\.\d+)$", regex::escape(&self.prefix));
        let re = Regex::new(&pattern).ok()?;
        let captures = re.captures(tag)?;
        SemanticVersion::parse(captures.get(1)?.as_str()).ok()
    }

    /// Tags sharing the prefix, newest version first, at most `limit`.
    ///
    /// Tags that carry the prefix but no parseable version come last, in
    /// their original order.
    pub fn relevant_tags(&self, tags: &[String], limit: usize) -> Vec<String> {
        let mut versioned: Vec<(SemanticVersion, &String)> = Vec::new();
        let mut other: Vec<&String> = Vec::new();

        for tag in tags.iter().filter(|t| self.matches(t)) {
            match self.version_of(tag) {
                Some(version) => versioned.push((version, tag)),
                None => other.push(tag),
            }
        }

        versioned.sort_by(|a, b| b.0.cmp(&a.0));
        versioned
            .into_iter()
            .map(|(_, tag)| tag)
            .chain(other)
            .take(limit)
            .cloned()
            .collect()
    }
}

impl Default for TagPattern {
    fn default() -> Self {
        TagPattern::new("v")
    }
}
