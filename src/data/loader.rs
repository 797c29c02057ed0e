use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;

use super::model::{Column, Table, Value};
use crate::config::ColumnRef;
use crate::error::{PlotError, Result};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Supported input families, chosen by file extension only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `.csv` / `.tsv` / `.tab` / `.txt` / `.dat`
    Delimited,
    /// `.parquet` / `.pq`
    Parquet,
}

impl Format {
    pub fn from_path(path: &Path) -> Option<Format> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" | "tsv" | "tab" | "txt" | "dat" => Some(Format::Delimited),
            "parquet" | "pq" => Some(Format::Parquet),
            _ => None,
        }
    }
}

/// Options for delimited text. Parquet files ignore them.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub has_headers: bool,
    pub index_column: Option<ColumnRef>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
            index_column: None,
        }
    }
}

/// Load a table from a file.  Dispatch by extension.
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<Table> {
    let format =
        Format::from_path(path).ok_or_else(|| PlotError::UnsupportedFormat(path.to_path_buf()))?;
    log::debug!("loading {} as {format:?}", path.display());

    let table = match format {
        Format::Delimited => load_delimited(path, options)?,
        Format::Parquet => {
            if *options != LoadOptions::default() {
                log::debug!("delimiter, header and index options do not apply to parquet files");
            }
            load_parquet(path)?
        }
    };

    log::info!(
        "loaded {} rows with columns {:?}",
        table.n_rows(),
        table.column_names()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

fn load_delimited(path: &Path, options: &LoadOptions) -> Result<Table> {
    let csv_err = |source: csv::Error| PlotError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::open(path).map_err(|source| PlotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(options.has_headers)
        .from_reader(file);

    let mut names: Vec<String> = if options.has_headers {
        dedupe_names(
            reader
                .headers()
                .map_err(csv_err)?
                .iter()
                .map(|h| h.trim().to_string()),
        )
    } else {
        Vec::new()
    };

    let mut cells: Vec<Vec<Value>> = vec![Vec::new(); names.len()];
    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        if cells.is_empty() {
            // headerless: the first record fixes the width
            names = (0..record.len()).map(|i| i.to_string()).collect();
            cells = vec![Vec::new(); record.len()];
        }
        for (col, field) in cells.iter_mut().zip(record.iter()) {
            col.push(Value::guess(field));
        }
    }

    if names.is_empty() {
        return Err(PlotError::EmptyData(path.to_path_buf()));
    }

    let mut columns: Vec<Column> = names
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Column::new(name, values))
        .collect();

    let index = match &options.index_column {
        Some(r) => {
            let pos = match r {
                ColumnRef::Index(i) if *i < columns.len() => *i,
                ColumnRef::Index(i) => {
                    return Err(PlotError::IndexOutOfRange {
                        index: *i,
                        len: columns.len(),
                    })
                }
                ColumnRef::Name(n) => columns
                    .iter()
                    .position(|c| c.name == *n)
                    .ok_or_else(|| PlotError::ColumnNotFound(n.clone()))?,
            };
            Some(columns.remove(pos))
        }
        None => None,
    };

    Ok(Table::new(index, columns))
}

/// Repeated header names get a `.1`, `.2`, ... suffix, skipping any name
/// that is already taken, the way pandas renames them.
fn dedupe_names(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    names
        .into_iter()
        .map(|mut name| {
            let mut count = counts.get(&name).copied().unwrap_or(0);
            while count > 0 {
                counts.insert(name.clone(), count + 1);
                name = format!("{name}.{count}");
                count = counts.get(&name).copied().unwrap_or(0);
            }
            counts.insert(name.clone(), 1);
            name
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// The part of the pandas schema metadata we care about.
#[derive(Debug, Deserialize)]
struct PandasMetadata {
    #[serde(default)]
    index_columns: Vec<serde_json::Value>,
}

/// Column written by pandas for an unnamed index when no metadata is kept.
const PANDAS_DEFAULT_INDEX: &str = "__index_level_0__";

/// Load a Parquet file, keeping the index pandas or polars stored in it.
fn load_parquet(path: &Path) -> Result<Table> {
    let parquet_err = |source: parquet::errors::ParquetError| PlotError::Parquet {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::open(path).map_err(|source| PlotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(parquet_err)?;
    let schema = builder.schema().clone();
    let index_names = stored_index_names(path, &schema)?;
    let reader = builder.build().map_err(parquet_err)?;

    let mut columns: Vec<Column> = schema
        .fields()
        .iter()
        .map(|f| Column::new(f.name().clone(), Vec::new()))
        .collect();

    for (batch_no, batch_result) in reader.enumerate() {
        let batch = batch_result.map_err(|source| PlotError::Arrow {
            path: path.to_path_buf(),
            source,
        })?;
        if batch_no == 0 && log::log_enabled!(log::Level::Debug) {
            let preview = batch.slice(0, batch.num_rows().min(5));
            if let Ok(text) = arrow::util::pretty::pretty_format_batches(&[preview]) {
                log::debug!("first rows of {}:\n{text}", path.display());
            }
        }
        for (column, array) in columns.iter_mut().zip(batch.columns()) {
            extend_values(&mut column.values, array);
        }
    }

    let mut index_parts = Vec::new();
    for name in &index_names {
        if let Some(pos) = columns.iter().position(|c| c.name == *name) {
            index_parts.push(columns.remove(pos));
        }
    }

    Ok(Table::new(combine_index(index_parts), columns))
}

/// Names of the columns holding the stored index, in level order.
fn stored_index_names(path: &Path, schema: &arrow::datatypes::Schema) -> Result<Vec<String>> {
    if let Some(json) = schema.metadata().get("pandas") {
        let meta: PandasMetadata =
            serde_json::from_str(json).map_err(|source| PlotError::PandasMetadata {
                path: path.to_path_buf(),
                source,
            })?;
        // range indexes are stored as objects and carry no column
        return Ok(meta
            .index_columns
            .iter()
            .filter_map(|c| c.as_str().map(str::to_string))
            .collect());
    }
    if schema.field_with_name(PANDAS_DEFAULT_INDEX).is_ok() {
        return Ok(vec![PANDAS_DEFAULT_INDEX.to_string()]);
    }
    Ok(Vec::new())
}

/// A multi-level index is flattened into `(a, b)` labels.
fn combine_index(mut parts: Vec<Column>) -> Option<Column> {
    match parts.len() {
        0 => None,
        1 => parts.pop(),
        _ => {
            let name = parts
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let n_rows = parts[0].values.len();
            let values = (0..n_rows)
                .map(|row| {
                    let labels: Vec<String> =
                        parts.iter().map(|c| c.values[row].to_string()).collect();
                    Value::String(format!("({})", labels.join(", ")))
                })
                .collect();
            Some(Column::new(name, values))
        }
    }
}

// -- Arrow helpers --

/// Append every cell of an Arrow array as a [`Value`].
fn extend_values(out: &mut Vec<Value>, col: &Arc<dyn Array>) {
    macro_rules! ints {
        ($t:ty) => {
            out.extend(
                col.as_primitive::<$t>()
                    .iter()
                    .map(|v| v.map_or(Value::Null, |v| Value::Integer(v as i64))),
            )
        };
    }
    // u64 beyond i64::MAX falls back to a float
    macro_rules! uints {
        ($t:ty) => {
            out.extend(col.as_primitive::<$t>().iter().map(|v| {
                v.map_or(Value::Null, |v| {
                    i64::try_from(v).map_or(Value::Float(v as f64), Value::Integer)
                })
            }))
        };
    }
    macro_rules! floats {
        ($t:ty) => {
            out.extend(
                col.as_primitive::<$t>()
                    .iter()
                    .map(|v| v.map_or(Value::Null, |v| Value::Float(v as f64))),
            )
        };
    }

    match col.data_type() {
        DataType::Int8 => ints!(Int8Type),
        DataType::Int16 => ints!(Int16Type),
        DataType::Int32 => ints!(Int32Type),
        DataType::Int64 => ints!(Int64Type),
        DataType::UInt8 => ints!(UInt8Type),
        DataType::UInt16 => ints!(UInt16Type),
        DataType::UInt32 => ints!(UInt32Type),
        DataType::UInt64 => uints!(UInt64Type),
        DataType::Float32 => floats!(Float32Type),
        DataType::Float64 => floats!(Float64Type),
        DataType::Boolean => out.extend(
            col.as_boolean()
                .iter()
                .map(|v| v.map_or(Value::Null, Value::Bool)),
        ),
        DataType::Utf8 => out.extend(
            col.as_string::<i32>()
                .iter()
                .map(|v| v.map_or(Value::Null, |s| Value::String(s.to_string()))),
        ),
        DataType::LargeUtf8 => out.extend(
            col.as_string::<i64>()
                .iter()
                .map(|v| v.map_or(Value::Null, |s| Value::String(s.to_string()))),
        ),
        _ => out.extend((0..col.len()).map(|row| {
            if col.is_null(row) {
                return Value::Null;
            }
            array_value_to_string(&**col, row)
                .map(Value::String)
                .unwrap_or(Value::Null)
        })),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use arrow::array::{Date32Array, Float64Array, Int64Array, StringArray, UInt64Array};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;

    fn fixture(name: &str, contents: &[u8]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("plot-file-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn write_parquet(name: &str, batch: RecordBatch) -> PathBuf {
        let path = fixture(name, b"");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        path
    }

    fn ints(col: &Column) -> Vec<i64> {
        col.values
            .iter()
            .map(|v| match v {
                Value::Integer(i) => *i,
                other => panic!("expected integer, got {other:?}"),
            })
            .collect()
    }

    #[test]
    fn format_is_chosen_by_extension() {
        assert_eq!(Format::from_path(Path::new("a.csv")), Some(Format::Delimited));
        assert_eq!(Format::from_path(Path::new("a.TSV")), Some(Format::Delimited));
        assert_eq!(Format::from_path(Path::new("a.txt")), Some(Format::Delimited));
        assert_eq!(Format::from_path(Path::new("a.parquet")), Some(Format::Parquet));
        assert_eq!(Format::from_path(Path::new("a.xyz")), None);
        assert_eq!(Format::from_path(Path::new("noext")), None);
    }

    #[test]
    fn unknown_extension_fails_before_touching_the_file() {
        let err = load_file(Path::new("/does/not/exist.xyz"), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, PlotError::UnsupportedFormat(_)));
    }

    #[test]
    fn headers_are_trimmed_and_counted() {
        let path = fixture("trim.csv", b" a , b,c \n1,2,3\n4,5,6\n");
        let table = load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(table.column_names(), vec!["a", "b", "c"]);
        assert_eq!(table.n_rows(), 2);
        assert_eq!(ints(&table.columns[2]), vec![3, 6]);
        assert!(table.index.is_none());
    }

    #[test]
    fn headerless_files_get_positional_names() {
        let path = fixture("noheader.csv", b"1,2,3\n4,5,6\n");
        let options = LoadOptions {
            has_headers: false,
            ..LoadOptions::default()
        };
        let table = load_file(&path, &options).unwrap();
        assert_eq!(table.column_names(), vec!["0", "1", "2"]);
        assert_eq!(ints(&table.columns[0]), vec![1, 4]);
    }

    #[test]
    fn custom_delimiter() {
        let path = fixture("semi.txt", b"x;y\n1;2.5\n");
        let options = LoadOptions {
            delimiter: b';',
            ..LoadOptions::default()
        };
        let table = load_file(&path, &options).unwrap();
        assert_eq!(table.column_names(), vec!["x", "y"]);
        assert_eq!(table.columns[1].values, vec![Value::Float(2.5)]);
    }

    #[test]
    fn index_column_by_position_or_name() {
        let path = fixture("indexed.csv", b"day,a,b\nmon,1,2\ntue,3,4\n");

        let by_pos = LoadOptions {
            index_column: Some(ColumnRef::Index(0)),
            ..LoadOptions::default()
        };
        let table = load_file(&path, &by_pos).unwrap();
        assert_eq!(table.column_names(), vec!["a", "b"]);
        let index = table.index.as_ref().unwrap();
        assert_eq!(index.name, "day");
        assert_eq!(index.values[1], Value::String("tue".into()));

        let by_name = LoadOptions {
            index_column: Some(ColumnRef::Name("day".into())),
            ..LoadOptions::default()
        };
        assert_eq!(load_file(&path, &by_name).unwrap(), table);

        let missing = LoadOptions {
            index_column: Some(ColumnRef::Name("week".into())),
            ..LoadOptions::default()
        };
        assert!(matches!(
            load_file(&path, &missing),
            Err(PlotError::ColumnNotFound(_))
        ));

        let out_of_range = LoadOptions {
            index_column: Some(ColumnRef::Index(3)),
            ..LoadOptions::default()
        };
        assert!(matches!(
            load_file(&path, &out_of_range),
            Err(PlotError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn duplicate_headers_are_renamed() {
        let path = fixture("dupes.csv", b"a,a,b,a,a.1\n1,2,3,4,5\n");
        let table = load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(table.column_names(), vec!["a", "a.1", "b", "a.2", "a.1.1"]);
        assert_eq!(ints(table.column("a.2").unwrap()), vec![4]);
    }

    #[test]
    fn ragged_rows_are_a_parse_error() {
        let path = fixture("ragged.csv", b"a,b\n1,2\n3\n");
        let err = load_file(&path, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, PlotError::Csv { .. }));
    }

    #[test]
    fn empty_file_is_reported() {
        let path = fixture("empty.csv", b"");
        let err = load_file(&path, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, PlotError::EmptyData(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_file(Path::new("/does/not/exist.csv"), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, PlotError::Io { .. }));
    }

    #[test]
    fn parquet_columns_and_types() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("n", DataType::Int64, false),
            Field::new("x", DataType::Float64, true),
            Field::new("label", DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![1, 2, 3])),
                Arc::new(Float64Array::from(vec![Some(0.5), None, Some(1.5)])),
                Arc::new(StringArray::from(vec!["a", "b", "c"])),
            ],
        )
        .unwrap();
        let path = write_parquet("plain.parquet", batch);

        let table = load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(table.column_names(), vec!["n", "x", "label"]);
        assert_eq!(ints(&table.columns[0]), vec![1, 2, 3]);
        assert_eq!(table.columns[1].values[1], Value::Null);
        assert_eq!(table.columns[2].values[2], Value::String("c".into()));
        assert!(table.index.is_none());
    }

    #[test]
    fn parquet_keeps_the_pandas_index() {
        let metadata = HashMap::from([(
            "pandas".to_string(),
            r#"{"index_columns": ["when"], "columns": []}"#.to_string(),
        )]);
        let schema = Arc::new(Schema::new_with_metadata(
            vec![
                Field::new("v", DataType::Float64, false),
                Field::new("when", DataType::Utf8, false),
            ],
            metadata,
        ));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Float64Array::from(vec![1.0, 2.0])),
                Arc::new(StringArray::from(vec!["2024-01", "2024-02"])),
            ],
        )
        .unwrap();
        let path = write_parquet("indexed.parquet", batch);

        // index options are ignored for parquet
        let options = LoadOptions {
            index_column: Some(ColumnRef::Index(0)),
            ..LoadOptions::default()
        };
        let table = load_file(&path, &options).unwrap();
        assert_eq!(table.column_names(), vec!["v"]);
        let index = table.index.unwrap();
        assert_eq!(index.name, "when");
        assert_eq!(index.values[0], Value::String("2024-01".into()));
    }

    #[test]
    fn parquet_range_index_stays_positional() {
        let metadata = HashMap::from([(
            "pandas".to_string(),
            r#"{"index_columns": [{"kind": "range", "start": 0, "stop": 2, "step": 1}]}"#
                .to_string(),
        )]);
        let schema = Arc::new(Schema::new_with_metadata(
            vec![Field::new("v", DataType::Int64, false)],
            metadata,
        ));
        let batch =
            RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(vec![5, 6]))]).unwrap();
        let path = write_parquet("range.parquet", batch);

        let table = load_file(&path, &LoadOptions::default()).unwrap();
        assert!(table.index.is_none());
        assert_eq!(ints(&table.columns[0]), vec![5, 6]);
    }

    #[test]
    fn parquet_default_index_column() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("v", DataType::Int64, false),
            Field::new(PANDAS_DEFAULT_INDEX, DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![7, 8])),
                Arc::new(Int64Array::from(vec![10, 20])),
            ],
        )
        .unwrap();
        let path = write_parquet("level0.parquet", batch);

        let table = load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(table.column_names(), vec!["v"]);
        let index = table.index.unwrap();
        assert_eq!(index.name, PANDAS_DEFAULT_INDEX);
        assert_eq!(ints(&index), vec![10, 20]);
    }

    #[test]
    fn invalid_pandas_metadata_is_reported() {
        let metadata = HashMap::from([("pandas".to_string(), "{not json".to_string())]);
        let schema = Arc::new(Schema::new_with_metadata(
            vec![Field::new("v", DataType::Int64, false)],
            metadata,
        ));
        let batch =
            RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(vec![1]))]).unwrap();
        let path = write_parquet("badmeta.parquet", batch);

        let err = load_file(&path, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, PlotError::PandasMetadata { .. }));
    }

    #[test]
    fn other_arrow_types_are_rendered_as_text() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("day", DataType::Date32, true),
            Field::new("big", DataType::UInt64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                // 19723 days after the epoch
                Arc::new(Date32Array::from(vec![Some(19723), None])),
                Arc::new(UInt64Array::from(vec![1, u64::MAX])),
            ],
        )
        .unwrap();
        let path = write_parquet("types.parquet", batch);

        let table = load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(
            table.columns[0].values,
            vec![Value::String("2024-01-01".into()), Value::Null]
        );
        assert_eq!(
            table.columns[1].values,
            vec![Value::Integer(1), Value::Float(u64::MAX as f64)]
        );
    }

    #[test]
    fn corrupt_parquet_is_a_parse_error() {
        let path = fixture("corrupt.parquet", b"definitely not parquet");
        let err = load_file(&path, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, PlotError::Parquet { .. }));
    }

    #[test]
    fn multi_level_index_labels() {
        let index = combine_index(vec![
            Column::new("a", vec![Value::Integer(1)]),
            Column::new("b", vec![Value::String("x".into())]),
        ])
        .unwrap();
        assert_eq!(index.name, "a, b");
        assert_eq!(index.values, vec![Value::String("(1, x)".into())]);
    }
}
