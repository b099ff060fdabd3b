//! Data locations addressing database queries

use serde::{Deserialize, Serialize};
use sqlparser::ast::{SetExpr, Statement};
use sqlparser::dialect::GenericDialect;
use sqlparser::keywords::Keyword;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Token, Tokenizer};

use super::error::LocationError;
use super::{check_table_name_syntax, normalize_input};

/// One or more `SELECT ... FROM ...` statements over single tables
///
/// Statements are trimmed and otherwise kept as written, so string literals
/// reach the database unchanged. Table names and projections are derived
/// upper-cased; WHERE predicates are derived as written. All statements
/// must project the same variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLocation")]
pub struct DatabaseQueryLocation {
    addresses: Vec<String>,
}

#[derive(Deserialize)]
struct RawLocation {
    addresses: Vec<String>,
}

impl TryFrom<RawLocation> for DatabaseQueryLocation {
    type Error = LocationError;

    fn try_from(raw: RawLocation) -> Result<Self, Self::Error> {
        DatabaseQueryLocation::new(raw.addresses)
    }
}

impl DatabaseQueryLocation {
    /// Construct a query location, validating every statement
    pub fn new<I, S>(queries: I) -> Result<Self, LocationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let addresses = normalize_input(queries)?;
        if addresses.is_empty() {
            return Err(LocationError::Empty);
        }

        for query in &addresses {
            validate_query(query)?;
            check_table_name_syntax(&table_name_of(query))?;
        }

        let location = Self { addresses };
        location.check_projection_consistency()?;
        Ok(location)
    }

    /// Query statements, one per address
    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    /// Table names: the token following `FROM` in each statement
    pub fn table_names(&self) -> Vec<String> {
        self.addresses.iter().map(|q| table_name_of(q)).collect()
    }

    /// WHERE predicates, empty for statements without one
    pub fn where_clauses(&self) -> Vec<String> {
        self.addresses.iter().map(|q| where_clause_of(q)).collect()
    }

    /// Projected variable names; empty means all columns (`SELECT *`)
    pub fn variable_names(&self) -> Vec<String> {
        self.addresses
            .first()
            .map(|q| projection_of(q))
            .unwrap_or_default()
    }

    /// Conjoin a predicate to every statement
    ///
    /// Statements with a WHERE clause get `AND <predicate>`; the others get
    /// `WHERE <predicate>`. One predicate per statement, or a single
    /// predicate applied to all of them.
    pub fn append_where_clause<S: AsRef<str>>(
        &self,
        predicates: &[S],
    ) -> Result<DatabaseQueryLocation, LocationError> {
        let predicates: Vec<&str> = predicates.iter().map(|p| p.as_ref().trim()).collect();
        let paired: Vec<&str> = if predicates.len() == self.addresses.len() {
            predicates
        } else if predicates.len() == 1 {
            vec![predicates[0]; self.addresses.len()]
        } else {
            return Err(LocationError::PredicateCountMismatch {
                locations: self.addresses.len(),
                predicates: predicates.len(),
            });
        };

        let statements: Vec<String> = self
            .addresses
            .iter()
            .zip(paired)
            .map(|(query, predicate)| conjoin(query, predicate))
            .collect();

        DatabaseQueryLocation::new(statements)
    }

    fn check_projection_consistency(&self) -> Result<(), LocationError> {
        let mut projections = self.addresses.iter().map(|q| projection_of(q));
        if let Some(first) = projections.next() {
            for other in projections {
                if other != first {
                    return Err(LocationError::InconsistentProjection { first, other });
                }
            }
        }
        Ok(())
    }
}

fn validate_query(query: &str) -> Result<(), LocationError> {
    let leading = query.split_whitespace().next().unwrap_or("");
    if !leading.eq_ignore_ascii_case("SELECT") || find_keyword(query, "FROM").is_none() {
        return Err(LocationError::InvalidQuery(query.to_string()));
    }

    let dialect = GenericDialect {};
    if let Some(keyword) = reserved_keyword(&dialect, query)? {
        return Err(LocationError::UnsupportedQuery {
            query: query.to_string(),
            keyword: keyword.to_string(),
        });
    }

    let statements = Parser::parse_sql(&dialect, query)
        .map_err(|e| LocationError::InvalidQuery(format!("{}: {}", query, e)))?;
    match statements.as_slice() {
        [Statement::Query(q)] if matches!(q.body.as_ref(), SetExpr::Select(_)) => Ok(()),
        _ => Err(LocationError::InvalidQuery(query.to_string())),
    }
}

/// First unsupported keyword outside quoted text
fn reserved_keyword(
    dialect: &GenericDialect,
    query: &str,
) -> Result<Option<&'static str>, LocationError> {
    let tokens = Tokenizer::new(dialect, query)
        .tokenize()
        .map_err(|e| LocationError::InvalidQuery(format!("{}: {}", query, e)))?;
    let keywords: Vec<Keyword> = tokens
        .iter()
        .filter_map(|token| match token {
            Token::Word(word) if word.quote_style.is_none() => Some(word.keyword),
            _ => None,
        })
        .collect();
    for (index, keyword) in keywords.iter().enumerate() {
        let found = match keyword {
            Keyword::AS => Some("AS"),
            Keyword::JOIN => Some("JOIN"),
            Keyword::LIMIT => Some("LIMIT"),
            Keyword::PARTITION => Some("PARTITION"),
            Keyword::GROUP if keywords.get(index + 1) == Some(&Keyword::BY) => Some("GROUP BY"),
            _ => None,
        };
        if found.is_some() {
            return Ok(found);
        }
    }
    Ok(None)
}

/// Byte offset of a whitespace-delimited keyword outside quoted text
fn find_keyword(query: &str, keyword: &str) -> Option<usize> {
    let bytes = query.as_bytes();
    let mut quote: Option<u8> = None;
    for (i, &b) in bytes.iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'\'' || b == b'"' => quote = Some(b),
            None => {
                let end = i + keyword.len();
                if i > 0
                    && bytes[i - 1].is_ascii_whitespace()
                    && end < bytes.len()
                    && bytes[end].is_ascii_whitespace()
                    && bytes[i..end].eq_ignore_ascii_case(keyword.as_bytes())
                {
                    return Some(i);
                }
            }
        }
    }
    None
}

fn table_name_of(query: &str) -> String {
    find_keyword(query, "FROM")
        .and_then(|at| query[at + 4..].split_whitespace().next())
        .map(str::to_uppercase)
        .unwrap_or_default()
}

fn where_clause_of(query: &str) -> String {
    find_keyword(query, "WHERE")
        .map(|at| query[at + 5..].trim().to_string())
        .unwrap_or_default()
}

fn projection_of(query: &str) -> Vec<String> {
    let head = find_keyword(query, "FROM").map_or(query, |at| &query[..at]);
    let head = head.trim();
    let list = match head.get(..6) {
        Some(select) if select.eq_ignore_ascii_case("SELECT") => head[6..].trim(),
        _ => head,
    };
    if list == "*" {
        Vec::new()
    } else {
        list.split(',')
            .map(|v| v.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase())
            .collect()
    }
}

/// Append `predicate` to `query`, keeping OR-groups intact
fn conjoin(query: &str, predicate: &str) -> String {
    match find_keyword(query, "WHERE") {
        None => format!("{} WHERE {}", query, predicate),
        Some(at) => {
            let base = query[..at].trim_end();
            let existing = query[at + 5..].trim();
            if has_keyword(existing, "OR") || has_keyword(predicate, "OR") {
                format!("{} WHERE ({}) AND ({})", base, existing, predicate)
            } else {
                format!("{} WHERE {} AND {}", base, existing, predicate)
            }
        }
    }
}

fn has_keyword(text: &str, keyword: &str) -> bool {
    find_keyword(&format!(" {} ", text), keyword).is_some()
}
