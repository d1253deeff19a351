use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("malformed identifier: {0}")]
    MalformedIdentifier(String),
}

/// Components of a fully qualified remote identifier.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SplitId {
    pub db: Option<String>,
    pub schema: Option<String>,
    pub table: String,
}

/// Break a qualified id (`database.schema.table`, `schema.table`,
/// `database.table` or bare `table`) into its components.
///
/// With exactly one dot the `use_db` flag decides whether the first part is
/// a database (`db.table`, the remote-side convention) or a schema
/// (`schema.table`, the destination-side convention).
pub fn split_id(id: &str, use_db: bool) -> Result<SplitId, IdError> {
    let parts: Vec<&str> = id.split('.').collect();
    match parts.as_slice() {
        [table] => Ok(SplitId {
            db: None,
            schema: None,
            table: (*table).to_string(),
        }),
        [first, table] => {
            if use_db {
                Ok(SplitId {
                    db: Some((*first).to_string()),
                    schema: None,
                    table: (*table).to_string(),
                })
            } else {
                Ok(SplitId {
                    db: None,
                    schema: Some((*first).to_string()),
                    table: (*table).to_string(),
                })
            }
        }
        [db, schema, table] => Ok(SplitId {
            db: Some((*db).to_string()),
            schema: Some((*schema).to_string()),
            table: (*table).to_string(),
        }),
        _ => Err(IdError::MalformedIdentifier(id.to_string())),
    }
}

/// ASCII-fold an identifier to lowercase. Remote identifiers are stored
/// lowercase everywhere; multibyte characters pass through unchanged.
pub fn fold_ident(id: &str) -> String {
    id.chars()
        .map(|c| c.to_ascii_lowercase())
        .collect::<String>()
}

/// Escape embedded single quotes by doubling them, optionally wrapping the
/// whole value in single quotes.
pub fn escape_single_quote(input: &str, add_quote: bool) -> String {
    let mut out = String::with_capacity(input.len() + 2);
    if add_quote {
        out.push('\'');
    }
    for c in input.chars() {
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
    if add_quote {
        out.push('\'');
    }
    out
}

/// Strip every balanced `(...)` group from a type token, e.g.
/// `interval day(3) to second(6)` -> `interval day to second`. Returns the
/// cleaned token and whether anything was stripped.
pub fn remove_precision(token: &str) -> (String, bool) {
    let mut out = String::with_capacity(token.len());
    let mut removed = false;
    let mut depth = 0usize;
    for c in token.chars() {
        match c {
            '(' => {
                depth += 1;
                removed = true;
            }
            ')' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    (out, removed)
}
