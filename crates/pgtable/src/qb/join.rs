//! Join composition.
//!
//! A [`Join`] relates two columns and is resolved lazily against the tables a
//! query already has in scope: whichever side is in scope anchors the join,
//! the other side's table is the one being joined.

use crate::column::Column;
use crate::error::{OrmError, OrmResult};
use crate::ident::TableRef;

/// Join flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Join,
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
}

impl JoinKind {
    pub fn keyword(self) -> &'static str {
        match self {
            JoinKind::Join => "JOIN",
            JoinKind::Inner => "INNER JOIN",
            JoinKind::LeftOuter => "LEFT OUTER JOIN",
            JoinKind::RightOuter => "RIGHT OUTER JOIN",
            JoinKind::FullOuter => "FULL OUTER JOIN",
        }
    }

    /// Relate two columns with this join flavor.
    pub fn on(self, first: &Column, second: &Column) -> Join {
        Join {
            kind: self,
            first: first.clone(),
            second: second.clone(),
        }
    }
}

/// A deferred join between two columns.
#[derive(Debug, Clone)]
pub struct Join {
    kind: JoinKind,
    first: Column,
    second: Column,
}

impl Join {
    pub fn kind(&self) -> JoinKind {
        self.kind
    }

    /// Resolve against the tables in scope, returning the JOIN fragment and
    /// the newly joined table.
    ///
    /// Exactly one of the two owning tables must already be in scope.
    pub fn resolve(&self, tables: &[TableRef]) -> OrmResult<(String, TableRef)> {
        let first_in = tables.contains(self.first.table_ref());
        let second_in = tables.contains(self.second.table_ref());

        let (anchor, joined) = match (first_in, second_in) {
            (true, false) => (&self.first, &self.second),
            (false, true) => (&self.second, &self.first),
            (true, true) => {
                return Err(OrmError::configuration(format!(
                    "cannot join {} and {}: both tables are already in scope",
                    self.first, self.second
                )));
            }
            (false, false) => {
                return Err(OrmError::configuration(format!(
                    "cannot join {} and {}: neither table is in scope",
                    self.first, self.second
                )));
            }
        };

        let table = joined.table_ref().clone();
        let sql = format!(
            "{} {} ON {} = {}",
            self.kind.keyword(),
            table,
            anchor.to_sql(),
            joined.to_sql()
        );
        Ok((sql, table))
    }
}

/// `JOIN`
pub fn join(first: &Column, second: &Column) -> Join {
    JoinKind::Join.on(first, second)
}

/// `INNER JOIN`
pub fn inner_join(first: &Column, second: &Column) -> Join {
    JoinKind::Inner.on(first, second)
}

/// `LEFT OUTER JOIN`
pub fn left_join(first: &Column, second: &Column) -> Join {
    JoinKind::LeftOuter.on(first, second)
}

/// `RIGHT OUTER JOIN`
pub fn right_join(first: &Column, second: &Column) -> Join {
    JoinKind::RightOuter.on(first, second)
}

/// `FULL OUTER JOIN`
pub fn full_join(first: &Column, second: &Column) -> Join {
    JoinKind::FullOuter.on(first, second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnDef;
    use crate::schema::Schema;
    use crate::types::SqlType;
    use std::sync::Arc;

    fn tables() -> (Arc<Schema>, Arc<Schema>) {
        let a = Schema::builder("public", "a")
            .column(ColumnDef::new("id", SqlType::serial()).primary_key())
            .build()
            .unwrap();
        let b = Schema::builder("public", "b")
            .column(ColumnDef::new("id", SqlType::serial()).primary_key())
            .column(ColumnDef::new("a_id", SqlType::integer()))
            .build()
            .unwrap();
        (a, b)
    }

    #[test]
    fn resolves_new_table() {
        let (a, b) = tables();
        let j = inner_join(a.col("id").unwrap(), b.col("a_id").unwrap());
        let (sql, table) = j.resolve(&[a.table_ref().clone()]).unwrap();
        assert_eq!(&table, b.table_ref());
        assert_eq!(
            sql,
            r#"INNER JOIN "public"."b" ON "public"."a"."id" = "public"."b"."a_id""#
        );
    }

    #[test]
    fn anchor_can_be_second_column() {
        let (a, b) = tables();
        let j = left_join(a.col("id").unwrap(), b.col("a_id").unwrap());
        let (sql, table) = j.resolve(&[b.table_ref().clone()]).unwrap();
        assert_eq!(&table, a.table_ref());
        assert_eq!(
            sql,
            r#"LEFT OUTER JOIN "public"."a" ON "public"."b"."a_id" = "public"."a"."id""#
        );
    }

    #[test]
    fn neither_in_scope() {
        let (a, b) = tables();
        let j = join(a.col("id").unwrap(), b.col("a_id").unwrap());
        assert!(j.resolve(&[]).unwrap_err().is_configuration());
    }

    #[test]
    fn both_in_scope() {
        let (a, b) = tables();
        let j = full_join(a.col("id").unwrap(), b.col("a_id").unwrap());
        let scope = [a.table_ref().clone(), b.table_ref().clone()];
        assert!(j.resolve(&scope).unwrap_err().is_configuration());
    }

    #[test]
    fn keywords() {
        assert_eq!(JoinKind::Join.keyword(), "JOIN");
        assert_eq!(JoinKind::RightOuter.keyword(), "RIGHT OUTER JOIN");
    }
}
