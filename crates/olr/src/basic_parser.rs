//! Small recursive-descent parser covering the whitelisted Oracle table
//! lifecycle statements. The parser interface stays injectable so a full
//! dialect parser can replace this one without touching the event path.

use crate::ast::{OraAlterCmd, OraColumnDef, OraStatement, OracleDdlParser};
use crate::error::OlrError;

pub struct BasicOracleParser;

impl OracleDdlParser for BasicOracleParser {
    fn parse(&self, sql: &str) -> Result<Vec<OraStatement>, OlrError> {
        let tokens = tokenize(sql);
        let mut p = Parser { tokens, pos: 0 };
        let stmt = p.parse_statement()?;
        Ok(vec![stmt])
    }
}

fn tokenize(sql: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    for c in sql.chars() {
        if c.is_alphanumeric() || c == '_' || c == '$' || c == '#' {
            word.push(c);
        } else {
            if !word.is_empty() {
                tokens.push(std::mem::take(&mut word));
            }
            match c {
                '(' | ')' | ',' | '.' => tokens.push(c.to_string()),
                ';' => break,
                _ => {}
            }
        }
    }
    if !word.is_empty() {
        tokens.push(word);
    }
    tokens
}

struct Parser {
    tokens: Vec<String>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn next(&mut self) -> Option<String> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn peek_is(&self, kw: &str) -> bool {
        self.peek().is_some_and(|t| t.eq_ignore_ascii_case(kw))
    }

    fn accept(&mut self, kw: &str) -> bool {
        if self.peek_is(kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kw: &str) -> Result<(), OlrError> {
        if self.accept(kw) {
            Ok(())
        } else {
            Err(OlrError::UnsupportedDdl(format!(
                "expected '{}', found '{}'",
                kw,
                self.peek().unwrap_or("<eof>")
            )))
        }
    }

    fn ident(&mut self) -> Result<String, OlrError> {
        self.next()
            .ok_or_else(|| OlrError::UnsupportedDdl("unexpected end of statement".to_string()))
    }

    /// `name` or `schema.name`
    fn qualified_name(&mut self) -> Result<(Option<String>, String), OlrError> {
        let first = self.ident()?;
        if self.accept(".") {
            let second = self.ident()?;
            Ok((Some(first), second))
        } else {
            Ok((None, first))
        }
    }

    fn parse_statement(&mut self) -> Result<OraStatement, OlrError> {
        if self.accept("CREATE") {
            self.expect("TABLE")?;
            return self.parse_create();
        }
        if self.accept("ALTER") {
            self.expect("TABLE")?;
            return self.parse_alter();
        }
        if self.accept("DROP") {
            self.expect("TABLE")?;
            let (schema, table) = self.qualified_name()?;
            return Ok(OraStatement::DropTable { schema, table });
        }
        Err(OlrError::UnsupportedDdl(format!(
            "statement starts with '{}'",
            self.peek().unwrap_or("<eof>")
        )))
    }

    fn parse_create(&mut self) -> Result<OraStatement, OlrError> {
        let (schema, table) = self.qualified_name()?;
        self.expect("(")?;
        let mut columns = Vec::new();
        let mut primary_key = Vec::new();
        loop {
            if self.peek_is("CONSTRAINT") || self.peek_is("PRIMARY") {
                let (constraint, cols) = self.parse_table_constraint()?;
                let _ = constraint;
                primary_key.extend(cols);
            } else {
                columns.push(self.parse_column_def()?);
            }
            if self.accept(",") {
                continue;
            }
            self.expect(")")?;
            break;
        }
        // inline PRIMARY KEY markers join the table-level list
        for col in &columns {
            if col.primary_key && !primary_key.contains(&col.name) {
                primary_key.push(col.name.clone());
            }
        }
        Ok(OraStatement::CreateTable {
            schema,
            table,
            columns,
            primary_key,
        })
    }

    fn parse_table_constraint(&mut self) -> Result<(Option<String>, Vec<String>), OlrError> {
        let constraint = if self.accept("CONSTRAINT") {
            Some(self.ident()?)
        } else {
            None
        };
        self.expect("PRIMARY")?;
        self.expect("KEY")?;
        Ok((constraint, self.parse_name_list()?))
    }

    fn parse_name_list(&mut self) -> Result<Vec<String>, OlrError> {
        self.expect("(")?;
        let mut names = Vec::new();
        loop {
            names.push(self.ident()?);
            if self.accept(",") {
                continue;
            }
            self.expect(")")?;
            break;
        }
        Ok(names)
    }

    fn parse_column_def(&mut self) -> Result<OraColumnDef, OlrError> {
        let mut col = OraColumnDef {
            name: self.ident()?,
            ..Default::default()
        };

        // a data type is one or more words, e.g. TIMESTAMP WITH TIME ZONE
        let mut type_words: Vec<String> = Vec::new();
        while let Some(tok) = self.peek() {
            if tok == "(" || tok == ")" || tok == "," {
                break;
            }
            if !type_words.is_empty()
                && (tok.eq_ignore_ascii_case("DEFAULT")
                    || tok.eq_ignore_ascii_case("NOT")
                    || tok.eq_ignore_ascii_case("NULL")
                    || tok.eq_ignore_ascii_case("PRIMARY")
                    || tok.eq_ignore_ascii_case("CONSTRAINT"))
            {
                break;
            }
            type_words.push(self.next().expect("peeked"));
        }
        if type_words.is_empty() {
            return Err(OlrError::UnsupportedDdl(format!(
                "column {} has no data type",
                col.name
            )));
        }

        // precision and scale
        if self.accept("(") {
            if let Some(tok) = self.next() {
                col.length = tok.parse().unwrap_or(0);
            }
            if self.accept(",") {
                if let Some(tok) = self.next() {
                    col.scale = tok.parse().unwrap_or(0);
                }
            }
            self.expect(")")?;
        }
        // INTERVAL DAY TO SECOND(6) - the type continues after precision
        while self.peek().is_some_and(|t| {
            t.eq_ignore_ascii_case("TO")
                || (type_words
                    .last()
                    .is_some_and(|w| w.eq_ignore_ascii_case("TO")))
        }) {
            type_words.push(self.next().expect("peeked"));
            if self.accept("(") {
                if let Some(tok) = self.next() {
                    col.scale = tok.parse().unwrap_or(0);
                }
                self.expect(")")?;
            }
        }
        col.type_name = type_words.join(" ").to_lowercase();

        // trailing column properties
        loop {
            if self.accept("DEFAULT") {
                col.has_default = true;
                self.skip_default_expression();
            } else if self.accept("NOT") {
                self.expect("NULL")?;
                col.not_null = true;
            } else if self.accept("NULL") {
                // explicit nullability, nothing to record
            } else if self.accept("PRIMARY") {
                self.expect("KEY")?;
                col.primary_key = true;
            } else if self.accept("CONSTRAINT") {
                // named inline constraint: CONSTRAINT x NOT NULL / PRIMARY KEY
                let _ = self.ident()?;
            } else if self.accept("ENABLE") {
                // constraint state keyword, irrelevant here
            } else {
                break;
            }
        }
        Ok(col)
    }

    /// A default expression runs until the next comma or the closing paren
    /// of the column list, skipping balanced parens inside.
    fn skip_default_expression(&mut self) {
        let mut depth = 0;
        while let Some(tok) = self.peek() {
            match tok {
                "(" => depth += 1,
                ")" => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                "," => {
                    if depth == 0 {
                        return;
                    }
                }
                t if depth == 0
                    && (t.eq_ignore_ascii_case("NOT")
                        || t.eq_ignore_ascii_case("PRIMARY")
                        || t.eq_ignore_ascii_case("CONSTRAINT")) =>
                {
                    return;
                }
                _ => {}
            }
            self.pos += 1;
        }
    }

    fn parse_alter(&mut self) -> Result<OraStatement, OlrError> {
        let (schema, table) = self.qualified_name()?;
        let mut cmds = Vec::new();

        if self.accept("ADD") {
            if self.peek_is("CONSTRAINT") || self.peek_is("PRIMARY") {
                let (constraint, columns) = self.parse_table_constraint()?;
                cmds.push(OraAlterCmd::AddPrimaryKey {
                    constraint,
                    columns,
                });
            } else if self.accept("(") {
                loop {
                    cmds.push(OraAlterCmd::AddColumn(self.parse_column_def()?));
                    if self.accept(",") {
                        continue;
                    }
                    self.expect(")")?;
                    break;
                }
            } else {
                cmds.push(OraAlterCmd::AddColumn(self.parse_column_def()?));
            }
        } else if self.accept("DROP") {
            if self.accept("CONSTRAINT") {
                cmds.push(OraAlterCmd::DropConstraint(self.ident()?));
            } else if self.accept("COLUMN") {
                cmds.push(OraAlterCmd::DropColumn(self.ident()?));
            } else if self.accept("(") {
                loop {
                    cmds.push(OraAlterCmd::DropColumn(self.ident()?));
                    if self.accept(",") {
                        continue;
                    }
                    self.expect(")")?;
                    break;
                }
            } else if self.accept("PRIMARY") {
                self.expect("KEY")?;
                cmds.push(OraAlterCmd::DropConstraint("primary key".to_string()));
            } else {
                return Err(OlrError::UnsupportedDdl("unsupported DROP form".to_string()));
            }
        } else if self.accept("MODIFY") {
            if self.accept("(") {
                loop {
                    cmds.push(OraAlterCmd::ModifyColumn(self.parse_column_def()?));
                    if self.accept(",") {
                        continue;
                    }
                    self.expect(")")?;
                    break;
                }
            } else {
                cmds.push(OraAlterCmd::ModifyColumn(self.parse_column_def()?));
            }
        } else if self.accept("RENAME") {
            return Err(OlrError::UnsupportedDdl(
                "ALTER TABLE RENAME is not supported".to_string(),
            ));
        } else {
            return Err(OlrError::UnsupportedDdl(format!(
                "unhandled ALTER form '{}'",
                self.peek().unwrap_or("<eof>")
            )));
        }

        Ok(OraStatement::AlterTable {
            schema,
            table,
            cmds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(sql: &str) -> OraStatement {
        BasicOracleParser.parse(sql).unwrap().remove(0)
    }

    #[test]
    fn create_table_with_inline_and_table_pk() {
        let stmt = parse_one(
            "CREATE TABLE HR.EMP (ID NUMBER(10,0) NOT NULL PRIMARY KEY, \
             NAME VARCHAR2(40) DEFAULT 'x', SALARY NUMBER(8,2), \
             CONSTRAINT emp_uk PRIMARY KEY (ID))",
        );
        let OraStatement::CreateTable {
            schema,
            table,
            columns,
            primary_key,
        } = stmt
        else {
            panic!("expected create");
        };
        assert_eq!(schema.as_deref(), Some("HR"));
        assert_eq!(table, "EMP");
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0].type_name, "number");
        assert_eq!(columns[0].length, 10);
        assert!(columns[0].not_null);
        assert!(columns[1].has_default);
        assert_eq!(columns[1].length, 40);
        assert_eq!(columns[2].scale, 2);
        assert_eq!(primary_key, vec!["ID".to_string()]);
    }

    #[test]
    fn interval_type_keeps_trailing_words() {
        let stmt = parse_one("CREATE TABLE T (SPAN INTERVAL DAY(3) TO SECOND(6))");
        let OraStatement::CreateTable { columns, .. } = stmt else {
            panic!("expected create");
        };
        assert_eq!(columns[0].type_name, "interval day to second");
        assert_eq!(columns[0].length, 3);
        assert_eq!(columns[0].scale, 6);
    }

    #[test]
    fn alter_add_and_drop_and_modify() {
        let stmt = parse_one("ALTER TABLE HR.EMP ADD (NOTE VARCHAR2(100))");
        let OraStatement::AlterTable { cmds, .. } = stmt else {
            panic!("expected alter");
        };
        assert!(matches!(&cmds[0], OraAlterCmd::AddColumn(c) if c.name == "NOTE"));

        let stmt = parse_one("ALTER TABLE HR.EMP DROP COLUMN NOTE");
        let OraStatement::AlterTable { cmds, .. } = stmt else {
            panic!("expected alter");
        };
        assert_eq!(cmds[0], OraAlterCmd::DropColumn("NOTE".to_string()));

        let stmt = parse_one("ALTER TABLE HR.EMP MODIFY (NAME VARCHAR2(80) NOT NULL)");
        let OraStatement::AlterTable { cmds, .. } = stmt else {
            panic!("expected alter");
        };
        assert!(matches!(&cmds[0], OraAlterCmd::ModifyColumn(c) if c.length == 80 && c.not_null));
    }

    #[test]
    fn alter_add_constraint() {
        let stmt = parse_one("ALTER TABLE HR.EMP ADD CONSTRAINT EMP_PK PRIMARY KEY (ID, DEPT)");
        let OraStatement::AlterTable { cmds, .. } = stmt else {
            panic!("expected alter");
        };
        assert_eq!(
            cmds[0],
            OraAlterCmd::AddPrimaryKey {
                constraint: Some("EMP_PK".to_string()),
                columns: vec!["ID".to_string(), "DEPT".to_string()],
            }
        );
    }

    #[test]
    fn drop_table() {
        let stmt = parse_one("DROP TABLE HR.EMP");
        assert_eq!(
            stmt,
            OraStatement::DropTable {
                schema: Some("HR".to_string()),
                table: "EMP".to_string(),
            }
        );
    }

    #[test]
    fn unsupported_statement_errors() {
        assert!(BasicOracleParser
            .parse("COMMENT ON TABLE HR.EMP IS 'x'")
            .is_err());
    }
}
