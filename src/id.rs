use std::str::FromStr;

use compact_str::CompactString;

use crate::result::ExportError;

/// `owner/name` identifier of a GitHub repository
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct RepoName {
    owner: CompactString,
    name: CompactString,
}

impl RepoName {
    pub fn new(owner: impl Into<CompactString>, name: impl Into<CompactString>) -> Self {
        Self { owner: owner.into(), name: name.into() }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for RepoName {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split('/').collect::<Vec<_>>().as_slice() {
            [owner, name] if !owner.is_empty() && !name.is_empty() => {
                Ok(RepoName::new(*owner, *name))
            },
            _ => Err(ExportError::InvalidRepoName(s.to_string())),
        }
    }
}

impl std::fmt::Display for RepoName {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_owner_and_name() {
        let repo: RepoName = "acme/widgets".parse().unwrap();
        assert_eq!(repo.owner(), "acme");
        assert_eq!(repo.name(), "widgets");
        assert_eq!(repo.to_string(), "acme/widgets");
    }

    #[test]
    fn rejects_malformed_names() {
        for input in ["widgets", "acme/", "/widgets", "acme/widgets/extra", ""] {
            let err = input.parse::<RepoName>().unwrap_err();
            assert!(
                matches!(err, ExportError::InvalidRepoName(ref s) if s == input),
                "{input} should be rejected"
            );
        }
    }
}
