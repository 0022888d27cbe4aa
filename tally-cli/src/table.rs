//! Reading and writing rows as CSV

use std::{io::Write, path::Path};

use tally_physical::{
    datavalues::DataValue,
    tabular::{Row, Schema},
};

use crate::error::CliError;

/// Read a CSV file with a header row.
///
/// Every field is typed by [DataValue::from_lexical], so empty fields become `NULL`.
pub fn read_csv(path: &Path) -> Result<(Schema, Vec<Row>), CliError> {
    let mut reader = csv::Reader::from_path(path)?;
    let schema = Schema::new(reader.headers()?.iter());

    let rows = reader
        .records()
        .map(|record| Ok(record?.iter().map(DataValue::from_lexical).collect::<Row>()))
        .collect::<Result<Vec<_>, CliError>>()?;

    log::info!(
        "read {} rows with columns [{schema}] from {}",
        rows.len(),
        path.display()
    );

    Ok((schema, rows))
}

/// Write the rows as CSV with a header row.
///
/// `NULL` is written as an empty field.
pub fn write_csv<W: Write>(writer: W, schema: &Schema, rows: &[Row]) -> Result<(), CliError> {
    let mut writer = csv::Writer::from_writer(writer);

    writer.write_record(schema.attributes())?;
    for row in rows {
        writer.write_record(row.iter().map(|value| match value {
            DataValue::Null => String::new(),
            value => value.to_string(),
        }))?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod test {
    use super::write_csv;
    use tally_physical::{
        datavalues::DataValue,
        tabular::{Row, Schema},
    };
    use test_log::test;

    #[test]
    fn nulls_are_empty() {
        let mut output = Vec::new();
        write_csv(
            &mut output,
            &Schema::new(["k", "total"]),
            &[Row::new(vec![DataValue::string("a"), DataValue::Null])],
        )
        .unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "k,total\na,\n");
    }
}
