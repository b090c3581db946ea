use serde_json::{Map, Value};
use std::collections::HashMap;

/// Keys under which the various Eastmoney endpoints nest their record lists.
/// Searched in this order, recursively.
const CONTAINER_KEYS: [&str; 7] = ["data", "Data", "result", "diff", "list", "Datas", "datas"];

/// Untyped table as delivered by a feed: one header row plus cells.
///
/// Every feed is reduced to this shape before normalization, so the
/// normalizers only ever deal with header names, never with payload layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Build a table from a parsed feed body
    ///
    /// # Arguments
    /// * `payload` - Parsed JSON body
    /// * `aliases` - Raw key -> header renames (e.g. `f12` -> `代码`), keys case-insensitive
    /// * `positional` - Header names for rows delivered as arrays or comma-joined strings
    pub fn from_payload(
        payload: &Value,
        aliases: &HashMap<String, String>,
        positional: &[String],
    ) -> Result<Self, String> {
        let aliases: HashMap<String, String> = aliases
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.clone()))
            .collect();
        let aliases = &aliases;

        // Explicit {"columns": [...], "rows": [[...]]}
        if let (Some(Value::Array(cols)), Some(Value::Array(rows))) =
            (payload.get("columns"), payload.get("rows"))
        {
            let columns = cols
                .iter()
                .map(|c| {
                    let raw = value_to_key(c);
                    aliases.get(&raw.to_lowercase()).cloned().unwrap_or(raw)
                })
                .collect::<Vec<_>>();
            let rows = rows
                .iter()
                .filter_map(|r| r.as_array())
                .map(|r| pad_row(r.clone(), columns.len()))
                .collect();
            return Ok(Self::new(columns, rows));
        }

        match locate_records(payload) {
            Some(items) => Ok(Self::from_items(&items, aliases, positional)),
            None if has_null_container(payload) => Ok(Self::default()),
            None => Err(describe(payload)),
        }
    }

    fn from_items(items: &[&Value], aliases: &HashMap<String, String>, positional: &[String]) -> Self {
        let header = |raw: &str| {
            aliases
                .get(&raw.to_lowercase())
                .cloned()
                .unwrap_or_else(|| raw.to_string())
        };

        // Pass 1: columns in first-seen order
        let mut columns: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut add_column = |name: String, columns: &mut Vec<String>| {
            if !index.contains_key(&name) {
                index.insert(name.clone(), columns.len());
                columns.push(name);
            }
        };

        for item in items {
            match *item {
                Value::Object(map) => {
                    for key in map.keys() {
                        add_column(header(key), &mut columns);
                    }
                }
                Value::Array(cells) => {
                    for i in 0..cells.len() {
                        add_column(positional_name(positional, i, &header), &mut columns);
                    }
                }
                Value::String(line) => {
                    for i in 0..line.split(',').count() {
                        add_column(positional_name(positional, i, &header), &mut columns);
                    }
                }
                _ => {}
            }
        }

        let position: HashMap<&str, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();

        // Pass 2: cells
        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            let mut row = vec![Value::Null; columns.len()];
            match *item {
                Value::Object(map) => fill_from_record(&mut row, map, &position, &header),
                Value::Array(cells) => {
                    for (i, cell) in cells.iter().enumerate() {
                        let name = positional_name(positional, i, &header);
                        if let Some(&col) = position.get(name.as_str()) {
                            row[col] = cell.clone();
                        }
                    }
                }
                Value::String(line) => {
                    for (i, cell) in line.split(',').enumerate() {
                        let name = positional_name(positional, i, &header);
                        if let Some(&col) = position.get(name.as_str()) {
                            row[col] = Value::String(cell.to_string());
                        }
                    }
                }
                _ => continue,
            }
            rows.push(row);
        }

        Self::new(columns, rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Exact header lookup
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell by position; out of range reads as null
    pub fn cell(&self, row: usize, col: usize) -> &Value {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&Value::Null)
    }
}

fn fill_from_record(
    row: &mut [Value],
    map: &Map<String, Value>,
    position: &HashMap<&str, usize>,
    header: &impl Fn(&str) -> String,
) {
    for (key, value) in map {
        if let Some(&col) = position.get(header(key).as_str()) {
            row[col] = value.clone();
        }
    }
}

fn positional_name(positional: &[String], i: usize, header: &impl Fn(&str) -> String) -> String {
    match positional.get(i) {
        Some(name) => header(name),
        None => format!("col{}", i),
    }
}

fn pad_row(mut row: Vec<Value>, width: usize) -> Vec<Value> {
    row.resize(width, Value::Null);
    row
}

fn value_to_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Find the record list inside a payload
fn locate_records(value: &Value) -> Option<Vec<&Value>> {
    match value {
        Value::Array(items) => Some(items.iter().collect()),
        Value::Object(map) => {
            for key in CONTAINER_KEYS {
                match map.get(key) {
                    // push2 `diff` is sometimes an index-keyed object instead of a list
                    Some(Value::Object(inner)) if key == "diff" => {
                        return Some(inner.values().collect());
                    }
                    Some(inner) => {
                        if let Some(found) = locate_records(inner) {
                            return Some(found);
                        }
                    }
                    None => {}
                }
            }
            None
        }
        _ => None,
    }
}

/// Eastmoney answers `{"data": null}` when a query matches nothing
fn has_null_container(value: &Value) -> bool {
    match value {
        Value::Object(map) => CONTAINER_KEYS.iter().any(|key| match map.get(*key) {
            Some(Value::Null) => true,
            Some(inner) => has_null_container(inner),
            None => false,
        }),
        _ => false,
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Object(map) => format!(
            "top-level keys {:?}",
            map.keys().take(8).collect::<Vec<_>>()
        ),
        Value::Null => "empty body".to_string(),
        other => format!("unexpected {}", kind(other)),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parse a feed body that may be wrapped as JSONP (`cb({...});`) or a
/// script assignment (`var rankData = {...};`).
pub fn parse_body(body: &str) -> Result<Value, serde_json::Error> {
    let trimmed = body.trim();
    match serde_json::from_str(trimmed) {
        Ok(value) => Ok(value),
        Err(err) => {
            let start = trimmed.find(&['{', '['][..]);
            let end = trimmed.rfind(&['}', ']'][..]);
            match (start, end) {
                (Some(s), Some(e)) if s < e && (s > 0 || e + 1 < trimmed.len()) => {
                    serde_json::from_str(&trimmed[s..=e])
                }
                _ => Err(err),
            }
        }
    }
}
