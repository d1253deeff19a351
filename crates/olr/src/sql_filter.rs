//! Filtering and normalisation of raw Oracle DDL text before it reaches
//! the SQL parser. The parser does not speak every Oracle dialect corner,
//! so only table lifecycle statements pass and known noise is stripped.

/// Normalise a DDL statement and check it against the whitelist. Returns
/// the cleaned statement, or `None` for anything outside
/// CREATE/ALTER/DROP TABLE.
pub fn normalize_ddl(sql: &str) -> Option<String> {
    // embedded quoting from the event JSON is meaningless to the parser
    let mut sql: String = sql.chars().filter(|c| *c != '"' && *c != '\\').collect();
    let upper = sql.to_uppercase();

    let mut allowed = false;

    // Oracle's recycle bin turns drops into `DROP TABLE x AS y`; the
    // internal rename after AS must go
    if upper.contains("DROP") && upper.contains("TABLE") {
        if let Some(pos) = upper.find(" AS ") {
            sql.truncate(pos);
        }
        allowed = true;
    }

    // CREATE TABLE t (...) INITRANS 4 PCTFREE 10 ... - storage clauses
    // after the closing column paren are Oracle-internal
    if upper.contains("CREATE") && upper.contains("TABLE") {
        truncate_after_column_defs(&mut sql);
        allowed = true;
    }

    if upper.contains("ALTER") && upper.contains("TABLE") {
        allowed = true;
    }

    if allowed {
        Some(sql.trim().to_string())
    } else {
        None
    }
}

/// Truncate everything after the paren that closes the column definition
/// list.
fn truncate_after_column_defs(sql: &mut String) {
    let mut depth = 0i32;
    for (i, c) in sql.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    sql.truncate(i + 1);
                    return;
                }
            }
            _ => {}
        }
    }
}
