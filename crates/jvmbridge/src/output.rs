use std::fmt::Write as _;
use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use jvmbridge_wire::{CallPayload, Value};
use serde::Serialize;
use serde_json::json;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ArgOutput {
    index: usize,
    tag: &'static str,
    tag_byte: String,
    value: serde_json::Value,
}

#[derive(Serialize)]
struct CallOutput<'a> {
    total_length: i32,
    is_static: bool,
    process_id: i32,
    thread_id: i32,
    target: &'a str,
    method: &'a str,
    args: Vec<ArgOutput>,
}

pub fn print_call(call: &CallPayload, format: OutputFormat) {
    let args: Vec<ArgOutput> = call
        .args
        .iter()
        .enumerate()
        .map(|(index, arg)| ArgOutput {
            index,
            tag: arg.tag().name(),
            tag_byte: char::from(arg.tag().byte()).to_string(),
            value: value_to_json(arg),
        })
        .collect();

    match format {
        OutputFormat::Json => {
            let out = CallOutput {
                total_length: call.total_length,
                is_static: call.is_static,
                process_id: call.process_id,
                thread_id: call.thread_id,
                target: &call.target,
                method: &call.method,
                args,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut header = Table::new();
            header
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["LENGTH", "STATIC", "PID", "TID", "TARGET", "METHOD"])
                .add_row(vec![
                    call.total_length.to_string(),
                    call.is_static.to_string(),
                    call.process_id.to_string(),
                    call.thread_id.to_string(),
                    call.target.clone(),
                    call.method.clone(),
                ]);
            println!("{header}");

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "TAG", "VALUE"]);
            for arg in &args {
                table.add_row(vec![
                    arg.index.to_string(),
                    format!("{} ('{}')", arg.tag, arg.tag_byte),
                    arg.value.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{}call {}.{} pid={} tid={} length={}",
                if call.is_static { "static " } else { "" },
                call.target,
                call.method,
                call.process_id,
                call.thread_id,
                call.total_length
            );
            for arg in &args {
                println!("  [{}] {}: {}", arg.index, arg.tag, arg.value);
            }
        }
    }
}

#[derive(Serialize)]
pub struct FrameSummary {
    pub index: usize,
    pub size: usize,
}

#[derive(Serialize)]
struct FramesOutput<'a> {
    frames: &'a [FrameSummary],
    total_bytes: usize,
}

pub fn print_frames(frames: &[FrameSummary], format: OutputFormat) {
    let total_bytes = frames.iter().map(|f| f.size).sum();
    match format {
        OutputFormat::Json => {
            let out = FramesOutput {
                frames,
                total_bytes,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FRAME", "SIZE"]);
            for frame in frames {
                table.add_row(vec![frame.index.to_string(), frame.size.to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for frame in frames {
                println!("frame {} size={}", frame.index, frame.size);
            }
            println!("{} frames, {} bytes", frames.len(), total_bytes);
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Render a decoded argument for display.
///
/// Plain JSON kinds map directly; handles, timestamps, byte buffers, rows
/// and maps are wrapped in a single-key object naming their kind.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Int32(v) => json!(v),
        Value::Int64(v) => json!(v),
        Value::Bool(v) => json!(v),
        Value::Double(v) => json!(v),
        Value::Single(v) => json!(v),
        Value::String(v) => json!(v),
        Value::Bytes(v) => json!({ "bytes": hex(v) }),
        Value::Handle(v) => json!({ "handle": v.id() }),
        Value::Date(v) => json!(v.to_string()),
        Value::Timestamp(v) => json!({ "timestamp": v.unix_seconds() }),
        Value::Int32Array(v) => json!(v),
        Value::Int64Array(v) => json!(v),
        Value::DoubleArray(v) => json!(v),
        Value::SingleArray(v) => json!(v),
        Value::DoubleMatrix(v) => json!(v),
        Value::SingleMatrix(v) => json!(v),
        Value::BytesArray(v) => v.iter().map(|b| json!({ "bytes": hex(b) })).collect(),
        Value::StringArray(v) => json!(v),
        Value::HandleArray(v) => v.iter().map(|h| json!({ "handle": h.id() })).collect(),
        Value::Row(row) => json!({ "row": list_to_json(row.values()) }),
        Value::Rows(rows) => json!({
            "rows": rows.iter().map(|r| list_to_json(r.values())).collect::<Vec<_>>()
        }),
        Value::ObjectArray(items) | Value::Sequence(items) => list_to_json(items),
        Value::Map(map) => json!({
            "map": map
                .iter()
                .map(|(k, v)| json!([value_to_json(k), value_to_json(v)]))
                .collect::<Vec<_>>()
        }),
    }
}

fn list_to_json(items: &[Value]) -> serde_json::Value {
    items.iter().map(value_to_json).collect()
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use jvmbridge_wire::{Date, GenericRow, ObjectRef, TypeTag, ValueMap};

    #[test]
    fn scalars_render_as_plain_json() {
        assert_eq!(value_to_json(&Value::Null), json!(null));
        assert_eq!(value_to_json(&Value::Int64(-3)), json!(-3));
        assert_eq!(value_to_json(&Value::from("x")), json!("x"));
        assert_eq!(
            value_to_json(&Value::Date(Date::new(2020, 2, 29).unwrap())),
            json!("2020-02-29")
        );
    }

    #[test]
    fn tagged_kinds_are_wrapped() {
        assert_eq!(
            value_to_json(&Value::Handle(ObjectRef::new("12"))),
            json!({ "handle": "12" })
        );
        assert_eq!(
            value_to_json(&Value::Bytes(vec![0x0a, 0xff].into())),
            json!({ "bytes": "0aff" })
        );

        let mut map = ValueMap::new(TypeTag::Int32);
        map.insert(1i32, Value::Row(GenericRow::new(vec![Value::Bool(true)])));
        assert_eq!(
            value_to_json(&Value::Map(map)),
            json!({ "map": [[1, { "row": [true] }]] })
        );
    }
}
