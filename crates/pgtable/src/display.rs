//! Tabular rendering of instances.

use crate::error::{OrmError, OrmResult};
use crate::instance::Instance;
use crate::schema::Schema;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};

/// Render instances as a text table: one header of column names, then one
/// row per instance, columns in declaration order.
pub fn render_table(schema: &Schema, instances: &[Instance]) -> OrmResult<String> {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            schema
                .columns()
                .iter()
                .map(|c| Cell::new(c.name()).add_attribute(Attribute::Bold)),
        );

    for instance in instances {
        if !instance.is_of(schema) {
            return Err(OrmError::reference(format!(
                "cannot display an instance of {} as {}",
                instance.schema().table_ref(),
                schema.table_ref()
            )));
        }
        table.add_row((0..schema.columns().len()).map(|i| Cell::new(instance.get_at(i))));
    }

    Ok(table.to_string())
}
