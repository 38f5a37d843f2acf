//! Cache key layout for reference snapshots.
//!
//! Keys follow `db_query:{cluster}:{customer}:{material_type}:{timestamp}:{suffix}`
//! where `suffix` is `master` or a table suffix. Scope values are embedded
//! verbatim, so parsing always happens relative to a known scope.

use std::fmt;

use crate::domain::{ReferenceTable, Scope, SnapshotTimestamp};

const NAMESPACE: &str = "db_query";
const MASTER_SUFFIX: &str = "master";

/// Identifies one snapshot: its scope and build timestamp.
///
/// Renders as the master key.
///
/// # Examples
/// ```
/// use reference_enrichment::domain::{ReferenceTable, Scope, SnapshotTimestamp};
/// use reference_enrichment::domain::ports::SnapshotKey;
///
/// let scope = Scope::new("Knits", "Acme", "Fabric").expect("scope");
/// let ts = SnapshotTimestamp::parse("20250101_120000").expect("timestamp");
/// let key = SnapshotKey::new(scope, ts);
/// assert_eq!(key.master_key(), "db_query:Knits:Acme:Fabric:20250101_120000:master");
/// assert_eq!(
///     key.table_key(ReferenceTable::Suppliers),
///     "db_query:Knits:Acme:Fabric:20250101_120000:supplier"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    scope: Scope,
    timestamp: SnapshotTimestamp,
}

impl SnapshotKey {
    pub fn new(scope: Scope, timestamp: SnapshotTimestamp) -> Self {
        Self { scope, timestamp }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn timestamp(&self) -> &SnapshotTimestamp {
        &self.timestamp
    }

    /// Key holding the snapshot manifest.
    pub fn master_key(&self) -> String {
        self.with_suffix(MASTER_SUFFIX)
    }

    /// Key holding the rows for `table`.
    pub fn table_key(&self, table: ReferenceTable) -> String {
        self.with_suffix(table.key_suffix())
    }

    fn with_suffix(&self, suffix: &str) -> String {
        format!("{}{}:{suffix}", scope_prefix(&self.scope), self.timestamp)
    }

    /// Glob pattern matching every master key of `scope`.
    ///
    /// Glob metacharacters inside scope values are escaped so a scope such as
    /// `Knits*` never matches a sibling scope.
    pub fn master_pattern(scope: &Scope) -> String {
        format!(
            "{NAMESPACE}:{}:{}:{}:*:{MASTER_SUFFIX}",
            escape_glob(&scope.cluster),
            escape_glob(&scope.customer),
            escape_glob(&scope.material_type),
        )
    }

    /// Parse a master key returned by a pattern scan.
    ///
    /// The timestamp is read from the right and the remaining prefix must
    /// reproduce `scope` exactly; anything else yields `None`.
    ///
    /// Scope values may themselves contain `:`, so `EU:North`/`Acme` and
    /// `EU`/`North:Acme` share a prefix and both parse the same key. Callers
    /// confirm the scope against the master record before trusting a match.
    pub fn parse_master(scope: &Scope, raw: &str) -> Option<Self> {
        let rest = raw.strip_prefix(scope_prefix(scope).as_str())?;
        let timestamp = rest.strip_suffix(MASTER_SUFFIX)?.strip_suffix(':')?;
        if timestamp.contains(':') {
            return None;
        }
        let timestamp = SnapshotTimestamp::parse(timestamp).ok()?;
        Some(Self::new(scope.clone(), timestamp))
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.master_key())
    }
}

fn scope_prefix(scope: &Scope) -> String {
    format!(
        "{NAMESPACE}:{}:{}:{}:",
        scope.cluster, scope.customer, scope.material_type
    )
}

fn escape_glob(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
