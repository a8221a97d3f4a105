//! Tables command: registers and lists the floor plan.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result, bail};
use meeple_core::{Table, TableId, VenueId};
use meeple_db::Database;
use uuid::Uuid;

/// Formats the venue's tables as a fixed-width listing.
#[must_use]
pub fn format_tables(venue_id: &VenueId, tables: &[Table]) -> String {
    let mut output = String::new();
    writeln!(output, "TABLES {venue_id}").unwrap();

    if tables.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "No tables registered.").unwrap();
        writeln!(output).unwrap();
        writeln!(
            output,
            "Hint: run 'meeple tables add --venue {venue_id} --label <label>' to set up the floor."
        )
        .unwrap();
        return output;
    }

    writeln!(output).unwrap();
    for table in tables {
        let state = if table.is_active { "active" } else { "retired" };
        writeln!(output, "{}  {:<20}  {state}", table.id, table.label).unwrap();
    }
    output
}

/// Lists the venue's tables, as text or JSON.
pub fn list<W: Write>(writer: &mut W, db: &Database, venue: &str, json: bool) -> Result<()> {
    let venue_id = VenueId::new(venue).context("invalid venue id")?;
    let tables = db
        .list_tables(&venue_id)
        .context("failed to list tables")?;
    if json {
        let rendered =
            serde_json::to_string_pretty(&tables).context("failed to serialize tables")?;
        writeln!(writer, "{rendered}")?;
    } else {
        write!(writer, "{}", format_tables(&venue_id, &tables))?;
    }
    Ok(())
}

/// Registers a new table and prints its id.
pub fn add<W: Write>(writer: &mut W, db: &mut Database, venue: &str, label: &str) -> Result<()> {
    let venue_id = VenueId::new(venue).context("invalid venue id")?;
    let label = label.trim();
    if label.is_empty() {
        bail!("label cannot be empty");
    }

    let table_id =
        TableId::new(Uuid::new_v4().to_string()).context("generated table id was invalid")?;
    let table = Table::new(table_id, venue_id, label);
    db.insert_table(&table).context("failed to register table")?;
    tracing::info!(table_id = %table.id, venue_id = %table.venue_id, "registered table");
    writeln!(writer, "{}", table.id)?;
    Ok(())
}
