use super::model::{Column, Table};
use crate::config::ColumnRef;
use crate::error::{PlotError, Result};

// ---------------------------------------------------------------------------
// Column selection
// ---------------------------------------------------------------------------

/// Resolve one reference against the table's columns.
pub fn resolve<'t>(table: &'t Table, reference: &ColumnRef) -> Result<&'t Column> {
    match reference {
        ColumnRef::Index(i) => table.columns.get(*i).ok_or(PlotError::IndexOutOfRange {
            index: *i,
            len: table.n_columns(),
        }),
        ColumnRef::Name(n) => table
            .column(n)
            .ok_or_else(|| PlotError::ColumnNotFound(n.clone())),
    }
}

/// Build a new table holding the referenced columns in the order given.
///
/// * `None` keeps every column in its original order.
/// * Positions copy the column under its original name.
/// * Repeated references give repeated columns.
///
/// The index travels with the selection.
pub fn select(table: &Table, columns: Option<&[ColumnRef]>) -> Result<Table> {
    let Some(refs) = columns else {
        return Ok(table.clone());
    };

    let selected = refs
        .iter()
        .map(|r| resolve(table, r).cloned())
        .collect::<Result<Vec<Column>>>()?;

    log::info!(
        "selected columns {:?}",
        selected.iter().map(|c| c.name.as_str()).collect::<Vec<_>>()
    );
    Ok(Table::new(table.index.clone(), selected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Value;

    fn abc() -> Table {
        let col = |name: &str, a: i64, b: i64| {
            Column::new(name, vec![Value::Integer(a), Value::Integer(b)])
        };
        Table::new(None, vec![col("a", 1, 4), col("b", 2, 5), col("c", 3, 6)])
    }

    fn refs(tokens: &[&str]) -> Vec<ColumnRef> {
        tokens.iter().map(|t| ColumnRef::parse(t)).collect()
    }

    #[test]
    fn no_selection_keeps_everything() {
        let table = abc();
        assert_eq!(select(&table, None).unwrap(), table);
    }

    #[test]
    fn mixes_positions_and_names_in_request_order() {
        let out = select(&abc(), Some(&refs(&["0", "c"]))).unwrap();
        assert_eq!(out.column_names(), vec!["a", "c"]);
        assert_eq!(
            out.columns[0].values,
            vec![Value::Integer(1), Value::Integer(4)]
        );
        assert_eq!(
            out.columns[1].values,
            vec![Value::Integer(3), Value::Integer(6)]
        );

        let reversed = select(&abc(), Some(&refs(&["c", "b", "a"]))).unwrap();
        assert_eq!(reversed.column_names(), vec!["c", "b", "a"]);
    }

    #[test]
    fn duplicates_are_kept() {
        let out = select(&abc(), Some(&refs(&["b", "1", "b"]))).unwrap();
        assert_eq!(out.column_names(), vec!["b", "b", "b"]);
        assert_eq!(out.n_rows(), 2);
    }

    #[test]
    fn position_and_name_pick_the_same_column() {
        let table = abc();
        let by_pos = select(&table, Some(&refs(&["2"]))).unwrap();
        let by_name = select(&table, Some(&refs(&["c"]))).unwrap();
        assert_eq!(by_pos, by_name);
    }

    #[test]
    fn unresolvable_references() {
        assert!(matches!(
            select(&abc(), Some(&refs(&["3"]))),
            Err(PlotError::IndexOutOfRange { index: 3, len: 3 })
        ));
        assert!(matches!(
            select(&abc(), Some(&refs(&["a", "z"]))),
            Err(PlotError::ColumnNotFound(name)) if name == "z"
        ));
    }

    #[test]
    fn positional_names_from_headerless_files_resolve_as_positions() {
        let table = Table::new(
            None,
            vec![
                Column::new("0", vec![Value::Integer(1)]),
                Column::new("1", vec![Value::Integer(2)]),
                Column::new("2", vec![Value::Integer(3)]),
            ],
        );
        let out = select(&table, Some(&refs(&["2", "0"]))).unwrap();
        assert_eq!(out.column_names(), vec!["2", "0"]);
    }

    #[test]
    fn index_is_carried_over() {
        let mut table = abc();
        table.index = Some(Column::new(
            "day",
            vec![Value::String("mon".into()), Value::String("tue".into())],
        ));
        let out = select(&table, Some(&refs(&["b"]))).unwrap();
        assert_eq!(out.index, table.index);
    }
}
