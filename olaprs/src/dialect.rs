//! SQL dialect abstraction.
//!
//! Dialects render identifiers and primitive expression pieces. Walking the
//! query tree lives in [`crate::sql_ast::SqlRenderer`]; the dialect only maps
//! logical constructs to SQL fragments.

use crate::types::Calculation;

pub trait Dialect {
    /// Quote an output alias.
    fn quote_ident(&self, ident: &str) -> String;
    fn qualify_table(&self, table: &str) -> String {
        table.to_string()
    }
    fn qualify_column(&self, table: &str, column: &str) -> String {
        format!("{table}.{column}")
    }
    fn render_aggregation(&self, calculation: Calculation, expr: &str) -> String {
        match calculation {
            Calculation::Sum => format!("SUM({expr})"),
            Calculation::Count => format!("COUNT({expr})"),
            Calculation::CountDistinct => format!("COUNT(DISTINCT {expr})"),
            Calculation::Min => format!("MIN({expr})"),
            Calculation::Max => format!("MAX({expr})"),
            Calculation::Avg => format!("AVG({expr})"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgres_quotes_and_aggregates() {
        let dialect = PostgresDialect;
        assert_eq!(dialect.quote_ident("pcs"), "\"pcs\"");
        assert_eq!(dialect.quote_ident("a\"b"), "\"a\"\"b\"");
        assert_eq!(
            dialect.render_aggregation(Calculation::CountDistinct, "dim_game.sk_id_game"),
            "COUNT(DISTINCT dim_game.sk_id_game)"
        );
        assert_eq!(dialect.qualify_column("base_sales", "year"), "base_sales.year");
    }
}
