use std::fmt;

/// Machine-readable error codes shared by the library crates and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    InvalidPerson,
    UnknownPerson,
    SelfRelationship,
    DuplicateRelationship,
    CycleDetected,
    DuplicateIdentifier,
    InvalidPosition,
    CyclicLayout,
    DanglingRelationship,
    CorruptTree,
    UnsupportedVersion,
    TreeWriteFailed,
    LockContention,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::InvalidPerson => "E2001",
            Self::UnknownPerson => "E2002",
            Self::SelfRelationship => "E2003",
            Self::DuplicateRelationship => "E2004",
            Self::CycleDetected => "E2005",
            Self::DuplicateIdentifier => "E2006",
            Self::InvalidPosition => "E2007",
            Self::CyclicLayout => "E3001",
            Self::DanglingRelationship => "E3002",
            Self::CorruptTree => "E4001",
            Self::UnsupportedVersion => "E4002",
            Self::TreeWriteFailed => "E5001",
            Self::LockContention => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Family tree not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidPerson => "Invalid person record",
            Self::UnknownPerson => "Person not found",
            Self::SelfRelationship => "Person cannot be related to themselves",
            Self::DuplicateRelationship => "Relationship already exists",
            Self::CycleDetected => "Person would become their own ancestor",
            Self::DuplicateIdentifier => "Identifier used twice",
            Self::InvalidPosition => "Position is not a finite coordinate",
            Self::CyclicLayout => "Parent-child graph contains a cycle",
            Self::DanglingRelationship => "Relationship references a missing person",
            Self::CorruptTree => "Stored tree is corrupt",
            Self::UnsupportedVersion => "Stored tree version is not supported",
            Self::TreeWriteFailed => "Tree file write failed",
            Self::LockContention => "Lock contention",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to users.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `kin init` to create a family tree here."),
            Self::ConfigParseError => Some("Fix syntax in .kindred/config.toml and retry."),
            Self::InvalidPerson => Some("Provide a non-empty preferred name (--goes-by)."),
            Self::UnknownPerson => Some("Run `kin list` to see current person IDs."),
            Self::SelfRelationship => None,
            Self::DuplicateRelationship => {
                Some("Run `kin show <id>` to inspect existing relationships.")
            }
            Self::CycleDetected => Some("Check the direction of the parent-child link."),
            Self::DuplicateIdentifier => Some("Give every person and relationship a unique id."),
            Self::InvalidPosition => Some("Use finite numbers for x and y."),
            Self::CyclicLayout => {
                Some("The input was not produced by kindred; run `kin check` and repair it.")
            }
            Self::DanglingRelationship => Some("Remove relationships that point at deleted people."),
            Self::CorruptTree => Some("Restore from an export with `kin import`, or `kin reset`."),
            Self::UnsupportedVersion => Some("Upgrade kindred to read this tree."),
            Self::TreeWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other `kin` process releases its lock."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::NotInitialized,
            ErrorCode::ConfigParseError,
            ErrorCode::InvalidPerson,
            ErrorCode::UnknownPerson,
            ErrorCode::SelfRelationship,
            ErrorCode::DuplicateRelationship,
            ErrorCode::CycleDetected,
            ErrorCode::DuplicateIdentifier,
            ErrorCode::InvalidPosition,
            ErrorCode::CyclicLayout,
            ErrorCode::DanglingRelationship,
            ErrorCode::CorruptTree,
            ErrorCode::UnsupportedVersion,
            ErrorCode::TreeWriteFailed,
            ErrorCode::LockContention,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::CycleDetected.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn display_matches_code() {
        assert_eq!(ErrorCode::UnknownPerson.to_string(), "E2002");
    }
}
