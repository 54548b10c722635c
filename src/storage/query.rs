//! Translates a [`TrackFilter`] into a parameterized `WHERE` clause.
//!
//! Filter values only ever travel as bound parameters; the SQL text is built
//! from column constants alone.

use clap::Args;
use rusqlite::{Connection, functions::FunctionFlags, types::Value};

use crate::storage::schema::columns::*;

/// Optional search predicates, combined with AND
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct TrackFilter {
    /// Song title contains (case-insensitive)
    #[arg(long)]
    pub title_contains: Option<String>,
    /// Band name contains (case-insensitive)
    #[arg(long)]
    pub band_name_contains: Option<String>,
    /// Album title contains (case-insensitive)
    #[arg(long)]
    pub album_title_contains: Option<String>,
    /// Label contains (case-insensitive)
    #[arg(long)]
    pub label_contains: Option<String>,
    /// Main artist contains (case-insensitive)
    #[arg(long)]
    pub artist_main_contains: Option<String>,
    /// Other playing artist contains (case-insensitive)
    #[arg(long)]
    pub other_artist_contains: Option<String>,
    /// Composer contains (case-insensitive)
    #[arg(long)]
    pub composer_contains: Option<String>,
    #[arg(long)]
    pub min_year_recorded: Option<i64>,
    #[arg(long)]
    pub max_year_recorded: Option<i64>,
    #[arg(long)]
    pub min_year_released: Option<i64>,
    #[arg(long)]
    pub max_year_released: Option<i64>,
}

/// SQL function folding text the same way search patterns are folded.
/// SQLite's own `LOWER` only knows ASCII.
pub(crate) const FOLD_CASE_FN: &str = "fold_case";

pub(crate) fn register_case_folding(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.create_scalar_function(
        FOLD_CASE_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|s| s.to_lowercase())),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Predicate {
    Contains,
    AtLeast,
    AtMost,
}

#[derive(Debug, Default, PartialEq)]
pub struct WhereClause {
    pub sql: String,
    pub params: Vec<Value>,
}

impl TrackFilter {
    fn text_predicates(&self) -> [(&'static str, &Option<String>); 7] {
        [
            (SONG_TITLE, &self.title_contains),
            (BAND_NAME, &self.band_name_contains),
            (ALBUM_TITLE, &self.album_title_contains),
            (LABEL, &self.label_contains),
            (ARTIST_MAIN, &self.artist_main_contains),
            (OTHER_ARTIST_PLAYING, &self.other_artist_contains),
            (COMPOSER, &self.composer_contains),
        ]
    }

    fn range_predicates(&self) -> [(&'static str, Predicate, Option<i64>); 4] {
        [
            (YEAR_RECORDED, Predicate::AtLeast, self.min_year_recorded),
            (YEAR_RECORDED, Predicate::AtMost, self.max_year_recorded),
            (YEAR_RELEASED, Predicate::AtLeast, self.min_year_released),
            (YEAR_RELEASED, Predicate::AtMost, self.max_year_released),
        ]
    }

    /// (column, predicate, bound value) for every predicate actually supplied
    fn supplied(&self) -> Vec<(&'static str, Predicate, Value)> {
        let text = self
            .text_predicates()
            .into_iter()
            .filter_map(|(column, value)| {
                value
                    .as_deref()
                    .filter(|v| !v.is_empty())
                    .map(|v| (column, Predicate::Contains, contains_pattern(v)))
            });

        let ranges = self
            .range_predicates()
            .into_iter()
            .filter_map(|(column, predicate, value)| {
                value.map(|v| (column, predicate, Value::Integer(v)))
            });

        text.chain(ranges).collect()
    }

    /// Builds ` WHERE ...` (or an empty string) with numbered placeholders
    pub fn where_clause(&self) -> WhereClause {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        for (column, predicate, value) in self.supplied() {
            let idx = params.len() + 1;
            conditions.push(match predicate {
                Predicate::Contains => {
                    format!("{FOLD_CASE_FN}({column}) LIKE ?{idx} ESCAPE '\\'")
                }
                Predicate::AtLeast => format!("{column} >= ?{idx}"),
                Predicate::AtMost => format!("{column} <= ?{idx}"),
            });
            params.push(value);
        }

        if conditions.is_empty() {
            return WhereClause::default();
        }

        WhereClause {
            sql: format!(" WHERE {}", conditions.join(" AND ")),
            params,
        }
    }
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn contains_pattern(needle: &str) -> Value {
    Value::Text(format!("%{}%", escape_like(&needle.to_lowercase())))
}

#[cfg(test)]
mod tests {
    use rusqlite::types::Value;

    use super::{TrackFilter, WhereClause};

    #[test]
    fn empty_filter_has_no_where() {
        let filter = TrackFilter::default();
        assert_eq!(filter.where_clause(), WhereClause::default());
    }

    #[test]
    fn empty_strings_are_not_predicates() {
        let filter = TrackFilter {
            title_contains: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(filter.where_clause(), WhereClause::default());
    }

    #[test]
    fn predicates_are_numbered_and_bound() {
        let filter = TrackFilter {
            title_contains: Some("Blue".into()),
            composer_contains: Some("Ellington".into()),
            min_year_recorded: Some(1960),
            max_year_released: Some(1970),
            ..Default::default()
        };

        let clause = filter.where_clause();

        assert_eq!(
            clause.sql,
            " WHERE fold_case(song_title) LIKE ?1 ESCAPE '\\' \
             AND fold_case(composer) LIKE ?2 ESCAPE '\\' \
             AND year_recorded >= ?3 \
             AND year_released <= ?4"
        );
        assert_eq!(
            clause.params,
            vec![
                Value::Text("%blue%".into()),
                Value::Text("%ellington%".into()),
                Value::Integer(1960),
                Value::Integer(1970),
            ]
        );
    }

    #[test]
    fn values_never_reach_sql_text() {
        let filter = TrackFilter {
            band_name_contains: Some("x'); DROP TABLE music_tracks; --".into()),
            ..Default::default()
        };

        let clause = filter.where_clause();

        assert!(!clause.sql.contains("DROP"));
        assert_eq!(clause.params.len(), 1);
    }

    #[test]
    fn fold_case_lowers_unicode_and_keeps_null() -> anyhow::Result<()> {
        let conn = rusqlite::Connection::open_in_memory()?;
        super::register_case_folding(&conn)?;

        let folded: String =
            conn.query_row("SELECT fold_case('ÉLAN Björk')", [], |r| r.get(0))?;
        let null: Option<String> =
            conn.query_row("SELECT fold_case(NULL)", [], |r| r.get(0))?;

        assert_eq!(folded, "élan björk");
        assert_eq!(null, None);
        Ok(())
    }

    #[test]
    fn like_wildcards_are_escaped() {
        let filter = TrackFilter {
            label_contains: Some("100%_\\".into()),
            ..Default::default()
        };

        assert_eq!(
            filter.where_clause().params,
            vec![Value::Text("%100\\%\\_\\\\%".into())]
        );
    }
}
