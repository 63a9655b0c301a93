//! `pool:namespace/name` path grammar. Ported from `parsepath` in
//! `libcephsqlite.cc`: two regexes, one for a numeric pool id, one for a
//! named pool, both requiring the same `name`/`namespace` character
//! class.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::VfsError;

/// Which object-store pool a logical file lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pool {
    Named(String),
    Numeric(u64),
}

/// A parsed `pool:namespace/name` path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLoc {
    pub pool: Pool,
    pub namespace: String,
    pub name: String,
}

fn numeric_pool_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^/*(\*[0-9]+):([A-Za-z0-9._-]*)/([A-Za-z0-9._-]+)$").unwrap()
    })
}

fn named_pool_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^/*([A-Za-z0-9._-]+):([A-Za-z0-9._-]*)/([A-Za-z0-9._-]+)$").unwrap()
    })
}

/// Does `name` end in the WAL journal suffix? The engine is required to
/// run in a non-WAL journal mode, so these are always rejected.
pub fn is_wal_name(name: &str) -> bool {
    name.ends_with("-wal")
}

/// Parse `path` against the grammar, trying the numeric-pool form first.
pub fn parse(path: &str) -> Result<FileLoc, VfsError> {
    let caps = numeric_pool_re()
        .captures(path)
        .or_else(|| named_pool_re().captures(path))
        .ok_or_else(|| VfsError::InvalidPath(path.to_string()))?;

    let pool_raw = &caps[1];
    let namespace = caps[2].to_string();
    let name = caps[3].to_string();

    if is_wal_name(&name) {
        return Err(VfsError::WalUnsupported(path.to_string()));
    }

    let pool = if let Some(digits) = pool_raw.strip_prefix('*') {
        let id = digits
            .parse::<u64>()
            .map_err(|_| VfsError::InvalidPath(path.to_string()))?;
        Pool::Numeric(id)
    } else {
        Pool::Named(pool_raw.to_string())
    };

    Ok(FileLoc {
        pool,
        namespace,
        name,
    })
}

/// The canonical `pool:namespace/name` form returned by `FullPathname`:
/// no leading slash, no extra separators.
pub fn full_pathname(loc: &FileLoc) -> String {
    let pool = match &loc.pool {
        Pool::Named(p) => p.clone(),
        Pool::Numeric(id) => format!("*{id}"),
    };
    format!("{pool}:{}/{}", loc.namespace, loc.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_pool_with_namespace() {
        let loc = parse("*42:ns/db").unwrap();
        assert_eq!(loc.pool, Pool::Numeric(42));
        assert_eq!(loc.namespace, "ns");
        assert_eq!(loc.name, "db");
    }

    #[test]
    fn named_pool_with_empty_namespace() {
        let loc = parse("mypool:/db").unwrap();
        assert_eq!(loc.pool, Pool::Named("mypool".to_string()));
        assert_eq!(loc.namespace, "");
        assert_eq!(loc.name, "db");
    }

    #[test]
    fn wal_suffix_is_rejected() {
        let err = parse("mypool:ns/db-wal").unwrap_err();
        assert!(matches!(err, VfsError::WalUnsupported(_)));
    }

    #[test]
    fn garbage_path_is_invalid() {
        assert!(parse("not-a-valid-path").is_err());
        assert!(parse("pool:ns/").is_err());
        assert!(parse("pool:ns/bad name").is_err());
    }

    #[test]
    fn leading_slashes_are_tolerated() {
        let loc = parse("///mypool:ns/db").unwrap();
        assert_eq!(loc.pool, Pool::Named("mypool".to_string()));
    }

    #[test]
    fn full_pathname_is_canonical() {
        let loc = FileLoc {
            pool: Pool::Named("mypool".to_string()),
            namespace: String::new(),
            name: "db".to_string(),
        };
        assert_eq!(full_pathname(&loc), "mypool:/db");

        let loc = FileLoc {
            pool: Pool::Numeric(7),
            namespace: "ns".to_string(),
            name: "db".to_string(),
        };
        assert_eq!(full_pathname(&loc), "*7:ns/db");
    }
}
