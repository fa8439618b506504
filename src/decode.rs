use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::{
    wire::{self, json_kind},
    Blob, BlobPolicy, DataRow, DataValue, QueryResult, ResultRow, Value, ValueType,
};

impl From<wire::RawDataValue> for DataValue {
    fn from(raw: wire::RawDataValue) -> Self {
        decode_value(raw)
    }
}

/// Converts a cell's payload to the [`Value`] its tag names.
///
/// Never fails. An unknown tag becomes [`Value::Unknown`]; a scalar payload
/// that does not fit its tag is kept as [`Value::Verbatim`].
pub(crate) fn decode_value(raw: wire::RawDataValue) -> DataValue {
    let value = match ValueType::try_from(raw.kind) {
        Ok(ValueType::Binary) => match raw.value {
            serde_json::Value::String(payload) => Value::Binary(Blob::Text(payload)),
            other => Value::Binary(Blob::Unexpected(json_kind(&other))),
        },
        Ok(ValueType::Image) => Value::Image,
        Ok(ValueType::Null) => Value::Null,
        Ok(ValueType::Text) => Value::Text(scalar_text(raw.value)),
        Ok(ValueType::Integer) => decode_integer(raw.value),
        Ok(ValueType::Float) => decode_float(raw.value),
        Err(tag) => {
            #[cfg(feature = "tracing")]
            tracing::debug!(tag, column = %raw.name, "unknown cell type tag");
            Value::Unknown(tag)
        }
    };

    DataValue {
        name: raw.name,
        value,
    }
}

fn decode_integer(value: serde_json::Value) -> Value {
    match &value {
        serde_json::Value::Number(number) => {
            let integral = number.as_i64().or_else(|| {
                number
                    .as_f64()
                    .filter(|float| float.fract() == 0.0 && float.abs() < 9.0e18)
                    .map(|float| float as i64)
            });
            if let Some(integer) = integral {
                return Value::Integer(integer);
            }
        }
        serde_json::Value::String(text) => {
            if let Ok(integer) = text.parse::<i64>() {
                if integer.to_string() == *text {
                    return Value::Integer(integer);
                }
            }
        }
        _ => {}
    }
    Value::Verbatim {
        kind: ValueType::Integer,
        text: scalar_text(value),
    }
}

fn decode_float(value: serde_json::Value) -> Value {
    match &value {
        serde_json::Value::Number(number) => {
            if let Some(float) = number.as_f64() {
                return Value::Float(float);
            }
        }
        serde_json::Value::String(text) => {
            if let Ok(float) = text.parse::<f64>() {
                if float.is_finite() && float.to_string() == *text {
                    return Value::Float(float);
                }
            }
        }
        _ => {}
    }
    Value::Verbatim {
        kind: ValueType::Float,
        text: scalar_text(value),
    }
}

/// Text of a scalar payload: strings as sent, `null` as empty.
fn scalar_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Flattens typed rows into string rows.
///
/// Every source row yields exactly one output row with one field per cell.
pub(crate) fn project_rows(rows: Vec<DataRow>, blobs: BlobPolicy) -> QueryResult {
    let rows = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| project_value(&cell.value, blobs))
                .collect::<ResultRow>()
        })
        .collect();
    QueryResult { rows }
}

/// Renders one cell for a [`ResultRow`].
pub(crate) fn project_value(value: &Value, blobs: BlobPolicy) -> String {
    match value {
        Value::Text(text) => text.clone(),
        Value::Integer(integer) => integer.to_string(),
        // `Display` for f64 is the shortest string that parses back exactly.
        Value::Float(float) => float.to_string(),
        Value::Binary(blob) => match (blobs, blob) {
            (BlobPolicy::Skip, _) => String::new(),
            (BlobPolicy::Base64, Blob::Text(payload)) => STANDARD.encode(payload.as_bytes()),
            (BlobPolicy::Base64, Blob::Unexpected(kind)) => {
                format!("unexpected data type '{kind}' for returned BLOB")
            }
        },
        Value::Verbatim { text, .. } => text.clone(),
        Value::Image | Value::Null | Value::Unknown(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{decode, wire, Blob, BlobPolicy, DataRow, DataValue, ResultRow, Value, ValueType};

    fn raw(kind: i64, value: serde_json::Value) -> wire::RawDataValue {
        wire::RawDataValue {
            name: "col".to_owned(),
            kind,
            value,
        }
    }

    fn project_one(value: Value, blobs: BlobPolicy) -> String {
        let rows = vec![vec![DataValue::new("col", value)]];
        let mut result = decode::project_rows(rows, blobs);
        result.rows.remove(0).fields.remove(0)
    }

    #[test]
    fn decode_keeps_binary_tag_for_string_payload() {
        let cell = decode::decode_value(raw(0, json!("AB")));
        assert_eq!(cell.value, Value::Binary(Blob::Text("AB".to_owned())));
    }

    #[test]
    fn decode_integer_from_number_and_string() {
        let from_number = decode::decode_value(raw(4, json!(42)));
        let from_float = decode::decode_value(raw(4, json!(42.0)));
        let from_text = decode::decode_value(raw(4, json!("42")));
        assert_eq!(from_number.value, Value::Integer(42));
        assert_eq!(from_float.value, Value::Integer(42));
        assert_eq!(from_text.value, Value::Integer(42));
    }

    #[test]
    fn decode_keeps_unparseable_scalars_as_sent() {
        let integer = decode::decode_value(raw(4, json!("abc")));
        assert_eq!(
            integer.value,
            Value::Verbatim {
                kind: ValueType::Integer,
                text: "abc".to_owned()
            }
        );
        assert_eq!(project_one(integer.value, BlobPolicy::Skip), "abc");

        let padded = decode::decode_value(raw(5, json!("3.1400")));
        assert_eq!(padded.value.value_type(), Some(ValueType::Float));
        assert_eq!(project_one(padded.value, BlobPolicy::Skip), "3.1400");

        let exact = decode::decode_value(raw(5, json!("2.5")));
        assert_eq!(exact.value, Value::Float(2.5));
    }

    #[test]
    fn unknown_tag_projects_to_placeholder_and_keeps_row_width() {
        let rows: Vec<DataRow> = serde_json::from_str(
            r#"[[{"Name":"id","Type":4,"Value":1},{"Name":"x","Type":6,"Value":"?"},{"Name":"i","Type":4,"Value":"abc"}]]"#,
        )
        .expect("must decode");
        assert_eq!(rows[0][1].value, Value::Unknown(6));

        let result = decode::project_rows(rows, BlobPolicy::Base64);
        assert_eq!(
            result.rows,
            vec![ResultRow {
                fields: vec!["1".to_owned(), String::new(), "abc".to_owned()]
            }]
        );
    }

    #[test]
    fn decode_row_from_json() {
        let row: DataRow = serde_json::from_value(json!([
            { "Name": "id", "Type": 4, "Value": 2 },
            { "Name": "Name", "Type": 3, "Value": "Bar" },
            { "Name": "photo", "Type": 1, "Value": null }
        ]))
        .expect("must decode");
        assert_eq!(row.len(), 3);
        assert_eq!(row[0].value, Value::Integer(2));
        assert_eq!(row[1].value, Value::Text("Bar".to_owned()));
        assert_eq!(row[2].value, Value::Image);
    }

    #[test]
    #[allow(clippy::approx_constant)]
    fn project_scalars() {
        assert_eq!(project_one(Value::text("hello"), BlobPolicy::Skip), "hello");
        assert_eq!(project_one(Value::Integer(42), BlobPolicy::Skip), "42");
        let float = project_one(Value::Float(3.14), BlobPolicy::Skip);
        assert_eq!(float.parse::<f64>().expect("must parse"), 3.14);
    }

    #[test]
    fn project_blob_per_policy() {
        assert_eq!(project_one(Value::blob("AB"), BlobPolicy::Base64), "QUI=");
        assert_eq!(project_one(Value::blob("AB"), BlobPolicy::Skip), "");
    }

    #[test]
    fn project_blob_with_unexpected_payload() {
        let cell = decode::decode_value(raw(0, json!(17)));
        let field = project_one(cell.value, BlobPolicy::Base64);
        assert_eq!(field, "unexpected data type 'number' for returned BLOB");
    }

    #[test]
    fn project_placeholders_for_null_and_image() {
        assert_eq!(project_one(Value::Null, BlobPolicy::Base64), "");
        assert_eq!(project_one(Value::Image, BlobPolicy::Base64), "");
    }

    #[test]
    fn project_preserves_row_shape() {
        let rows = vec![
            vec![
                DataValue::new("id", 1_i64),
                DataValue::new("blob", Value::blob("x")),
                DataValue::new("gone", Value::Null),
            ],
            vec![],
            vec![DataValue::new("name", "Kit")],
        ];
        let result = decode::project_rows(rows, BlobPolicy::Skip);
        assert_eq!(
            result.rows,
            vec![
                ResultRow {
                    fields: vec!["1".to_owned(), String::new(), String::new()]
                },
                ResultRow { fields: vec![] },
                ResultRow {
                    fields: vec!["Kit".to_owned()]
                },
            ]
        );
    }
}
