//! Filter clauses shared by SELECT, UPDATE and DELETE.

use crate::column::Column;
use crate::error::{OrmError, OrmResult};
use crate::ident::TableRef;
use crate::qb::expr::Expression;
use crate::qb::join::Join;
use crate::qb::param::Params;

/// Something usable as a WHERE condition.
///
/// Comparators return `OrmResult<Expression>`; passing that straight to
/// `filter` defers the error to `build()`.
pub trait IntoFilter {
    fn into_filter(self) -> OrmResult<Expression>;
}

impl IntoFilter for Expression {
    fn into_filter(self) -> OrmResult<Expression> {
        Ok(self)
    }
}

impl IntoFilter for OrmResult<Expression> {
    fn into_filter(self) -> OrmResult<Expression> {
        self
    }
}

/// Joins, filters, ordering and paging collected by a builder.
#[derive(Debug)]
pub(crate) struct FilterClauses {
    joins: Vec<Join>,
    filters: Vec<Expression>,
    order_by: Option<Column>,
    ascending: bool,
    limit: Option<i64>,
    offset: Option<i64>,
    error: Option<OrmError>,
}

impl Default for FilterClauses {
    fn default() -> Self {
        Self {
            joins: Vec::new(),
            filters: Vec::new(),
            order_by: None,
            ascending: true,
            limit: None,
            offset: None,
            error: None,
        }
    }
}

impl FilterClauses {
    pub(crate) fn join(&mut self, join: Join) {
        self.joins.push(join);
    }

    pub(crate) fn filter(&mut self, filter: impl IntoFilter) {
        match filter.into_filter() {
            Ok(expr) => self.filters.push(expr),
            Err(err) => self.record_error(err),
        }
    }

    pub(crate) fn order_by(&mut self, column: &Column) {
        self.order_by = Some(column.clone());
    }

    pub(crate) fn ascending(&mut self, ascending: bool) {
        self.ascending = ascending;
    }

    pub(crate) fn limit(&mut self, limit: i64) {
        if limit < 0 {
            self.record_error(OrmError::configuration(format!(
                "LIMIT must be non-negative, got {limit}"
            )));
        } else {
            self.limit = Some(limit);
        }
    }

    pub(crate) fn offset(&mut self, offset: i64) {
        if offset < 0 {
            self.record_error(OrmError::configuration(format!(
                "OFFSET must be non-negative, got {offset}"
            )));
        } else {
            self.offset = Some(offset);
        }
    }

    /// Keep the first error; it is reported by `build()`.
    pub(crate) fn record_error(&mut self, err: OrmError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    pub(crate) fn take_error(&mut self) -> OrmResult<()> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub(crate) fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    /// Render every clause in order. Joined tables are appended to `tables`
    /// and filter parameters merged into `params`.
    pub(crate) fn render(
        &self,
        tables: &mut Vec<TableRef>,
        params: &mut Params,
    ) -> OrmResult<RenderedClauses> {
        let mut joins = Vec::with_capacity(self.joins.len());
        for join in &self.joins {
            let (sql, table) = join.resolve(tables)?;
            tables.push(table);
            joins.push(sql);
        }

        let filter = if self.filters.is_empty() {
            None
        } else {
            let parts: Vec<&str> = self.filters.iter().map(Expression::sql).collect();
            for expr in &self.filters {
                params.extend(expr.params().iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Some(format!("WHERE {}", parts.join(" AND ")))
        };

        let order = match &self.order_by {
            Some(column) => {
                if !tables.contains(column.table_ref()) {
                    return Err(OrmError::reference(format!(
                        "cannot order by {column}: table {} is not in the query",
                        column.table_ref()
                    )));
                }
                let direction = if self.ascending { "ASC" } else { "DESC" };
                Some(format!("ORDER BY {} {direction}", column.to_sql()))
            }
            None => None,
        };

        Ok(RenderedClauses {
            joins,
            filter,
            order,
            limit: self.limit.map(|n| format!("LIMIT {n}")),
            offset: self.offset.map(|n| format!("OFFSET {n}")),
        })
    }
}

/// Rendered clause fragments, each without leading whitespace.
#[derive(Debug, Default)]
pub(crate) struct RenderedClauses {
    joins: Vec<String>,
    filter: Option<String>,
    order: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
}

impl RenderedClauses {
    /// UPDATE and DELETE cannot carry these directly.
    pub(crate) fn needs_row_subquery(&self) -> bool {
        !self.joins.is_empty() || self.order.is_some() || self.limit.is_some() || self.offset.is_some()
    }

    /// Append every clause, each preceded by a space.
    pub(crate) fn write_all(&self, out: &mut String) {
        self.write_joins(out);
        self.write_filter(out);
        for part in [&self.order, &self.limit, &self.offset].into_iter().flatten() {
            out.push(' ');
            out.push_str(part);
        }
    }

    pub(crate) fn write_joins(&self, out: &mut String) {
        for join in &self.joins {
            out.push(' ');
            out.push_str(join);
        }
    }

    pub(crate) fn write_filter(&self, out: &mut String) {
        if let Some(filter) = &self.filter {
            out.push(' ');
            out.push_str(filter);
        }
    }

    /// `WHERE ctid IN (SELECT <table>.ctid FROM <table> ...)` selecting the
    /// target rows with every clause applied.
    pub(crate) fn write_row_subquery(&self, table: &TableRef, out: &mut String) {
        out.push_str(" WHERE ctid IN (SELECT ");
        table.write_sql(out);
        out.push_str(".ctid FROM ");
        table.write_sql(out);
        self.write_all(out);
        out.push(')');
    }
}

/// Builder methods for the shared filter clauses. The builder must have a
/// `clauses: FilterClauses` field.
macro_rules! filter_clause_methods {
    () => {
        /// Add a join; the joined table is in scope for later joins, filters and ORDER BY.
        pub fn join(mut self, join: $crate::qb::Join) -> Self {
            self.clauses.join(join);
            self
        }

        /// Add a WHERE condition; conditions are ANDed.
        pub fn filter(mut self, filter: impl $crate::qb::IntoFilter) -> Self {
            self.clauses.filter(filter);
            self
        }

        pub fn order_by(mut self, column: &$crate::column::Column) -> Self {
            self.clauses.order_by(column);
            self
        }

        /// Sort direction for `order_by`; ascending unless set.
        pub fn ascending(mut self, ascending: bool) -> Self {
            self.clauses.ascending(ascending);
            self
        }

        pub fn limit(mut self, limit: i64) -> Self {
            self.clauses.limit(limit);
            self
        }

        pub fn offset(mut self, offset: i64) -> Self {
            self.clauses.offset(offset);
            self
        }
    };
}

pub(crate) use filter_clause_methods;
