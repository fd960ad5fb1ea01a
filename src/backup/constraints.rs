// ABOUTME: Separates CONSTRAINT clauses from CREATE TABLE text
// ABOUTME: Builds the deferred script that re-adds them after the data is loaded

use crate::utils::quote_identifier;
use once_cell::sync::Lazy;
use regex::Regex;

/// A comma and optional whitespace in front of a `CONSTRAINT` keyword
static CONSTRAINT_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*CONSTRAINT\b").unwrap());

/// Schema text with its constraint clauses split out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedSchema {
    /// The DDL with every matched clause (and its leading comma) removed
    pub cleaned: String,
    /// Captured clauses, each starting with `CONSTRAINT`, in source order
    pub constraints: Vec<String>,
}

/// Strip comma-prefixed `CONSTRAINT ...` clauses from `ddl`
///
/// # Examples
///
/// ```
/// # use mysql_table_dumper::backup::extract_constraints;
/// let ddl = "CREATE TABLE `a` (\n  `id` int,\n  `b_id` int,\n  \
///            CONSTRAINT `fk_b` FOREIGN KEY (`b_id`) REFERENCES `b` (`id`)\n)";
/// let extracted = extract_constraints(ddl);
/// assert_eq!(
///     extracted.constraints,
///     ["CONSTRAINT `fk_b` FOREIGN KEY (`b_id`) REFERENCES `b` (`id`)"]
/// );
/// assert_eq!(extracted.cleaned, "CREATE TABLE `a` (\n  `id` int,\n  `b_id` int\n)");
/// ```
pub fn extract_constraints(ddl: &str) -> ExtractedSchema {
    let mut cleaned = String::with_capacity(ddl.len());
    let mut constraints = Vec::new();
    let mut copied = 0;

    while let Some(found) = CONSTRAINT_START_RE.find_at(ddl, copied) {
        let start = found.end() - "CONSTRAINT".len();
        let end = clause_end(ddl, start);

        cleaned.push_str(&ddl[copied..found.start()]);
        constraints.push(ddl[start..end].trim_end().to_string());
        copied = end;
    }
    cleaned.push_str(&ddl[copied..]);

    ExtractedSchema {
        cleaned,
        constraints,
    }
}

/// Byte offset where the clause starting at `start` ends
///
/// The clause runs to the first comma or newline outside parentheses and
/// quotes, or to the `)` closing the table body. Nested groups such as
/// `CHECK ((a in (1,2)))` stay inside the clause.
fn clause_end(ddl: &str, start: usize) -> usize {
    let bytes = ddl.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = start;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' && q != b'`' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'\'' | b'"' | b'`' => quote = Some(b),
                b'(' => depth += 1,
                b')' if depth == 0 => return i,
                b')' => depth -= 1,
                b',' | b'\n' if depth == 0 => return i,
                _ => {}
            },
        }
        i += 1;
    }

    bytes.len()
}

/// Deferred-constraints script for `table`
///
/// Uniqueness and foreign key checks are disabled around a single
/// `ALTER TABLE ... ADD ...` so the order tables are loaded in does not matter.
pub fn constraints_script(table: &str, constraints: &[String]) -> String {
    format!(
        "/*!40014 SET @OLD_UNIQUE_CHECKS=@@UNIQUE_CHECKS, UNIQUE_CHECKS=0 */;\n\
         /*!40014 SET @OLD_FOREIGN_KEY_CHECKS=@@FOREIGN_KEY_CHECKS, FOREIGN_KEY_CHECKS=0 */;\n\
         ALTER TABLE {} ADD {};\n\
         /*!40014 SET FOREIGN_KEY_CHECKS=@OLD_FOREIGN_KEY_CHECKS */;\n\
         /*!40014 SET UNIQUE_CHECKS=@OLD_UNIQUE_CHECKS */;\n",
        quote_identifier(table),
        constraints.join(",\n ADD ")
    )
}
