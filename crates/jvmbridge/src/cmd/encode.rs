use jvmbridge_wire::{encode_to_bytes, TypeTag, Value, ValueMap, WireError};

use crate::cmd::EncodeArgs;
use crate::exit::{io_error, wire_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_raw, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let json: serde_json::Value = serde_json::from_str(&args.args)
        .map_err(|err| CliError::new(USAGE, format!("--args is not valid JSON: {err}")))?;
    let call_args = arguments_from_json(&json)?;

    let process_id = match args.pid {
        Some(pid) => pid,
        None => i32::try_from(std::process::id()).unwrap_or(i32::MAX),
    };
    let payload = encode_to_bytes(
        args.is_static,
        process_id,
        args.tid,
        &args.target,
        &args.method,
        &call_args,
    )
    .map_err(|err| wire_error("encode failed", err))?;

    if payload.len() > args.limits.max_payload {
        return Err(wire_error(
            "encode failed",
            WireError::PayloadTooLarge {
                size: payload.len(),
                max: args.limits.max_payload,
            },
        ));
    }
    tracing::debug!(
        payload_len = payload.len(),
        args = call_args.len(),
        "encoded call payload"
    );

    match &args.out {
        Some(path) => {
            std::fs::write(path, &payload).map_err(|err| {
                io_error(&format!("failed writing {}", path.display()), err)
            })?;
            print_written(path, payload.len(), format);
        }
        None => print_raw(&payload),
    }

    Ok(SUCCESS)
}

fn print_written(path: &std::path::Path, size: usize, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "out": path.display().to_string(), "bytes": size })
        ),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("wrote {size} bytes to {}", path.display())
        }
    }
}

fn arguments_from_json(json: &serde_json::Value) -> CliResult<Vec<Value>> {
    match json {
        serde_json::Value::Array(items) => items.iter().map(value_from_json).collect(),
        _ => Err(CliError::new(USAGE, "--args must be a JSON array")),
    }
}

/// Map a JSON value onto the closest argument kind.
///
/// Integers become int32 when they fit and int64 otherwise; other numbers
/// become doubles. Arrays become lists, objects become string-keyed maps.
pub fn value_from_json(json: &serde_json::Value) -> CliResult<Value> {
    Ok(match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                match i32::try_from(i) {
                    Ok(small) => Value::Int32(small),
                    Err(_) => Value::Int64(i),
                }
            } else if let Some(u) = n.as_u64() {
                Value::try_from(u).map_err(|err| CliError::new(USAGE, err.to_string()))?
            } else {
                Value::Double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => Value::list(
            items
                .iter()
                .map(value_from_json)
                .collect::<CliResult<Vec<_>>>()?,
        ),
        serde_json::Value::Object(fields) => {
            let mut map = ValueMap::new(TypeTag::String);
            for (key, value) in fields {
                map.insert(key.as_str(), value_from_json(value)?);
            }
            Value::Map(map)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_pick_the_narrowest_kind() {
        assert_eq!(value_from_json(&json!(7)).unwrap(), Value::Int32(7));
        assert_eq!(
            value_from_json(&json!(5_000_000_000i64)).unwrap(),
            Value::Int64(5_000_000_000)
        );
        assert_eq!(value_from_json(&json!(0.25)).unwrap(), Value::Double(0.25));
        assert_eq!(
            value_from_json(&json!(u64::MAX)).unwrap_err().code,
            USAGE
        );
    }

    #[test]
    fn arrays_collapse_when_homogeneous() {
        assert_eq!(
            value_from_json(&json!([1, 2])).unwrap(),
            Value::Int32Array(vec![1, 2])
        );
        assert_eq!(
            value_from_json(&json!(["a", "b"])).unwrap(),
            Value::StringArray(vec!["a".into(), "b".into()])
        );
        assert!(matches!(
            value_from_json(&json!([1, "a"])).unwrap(),
            Value::Sequence(_)
        ));
    }

    #[test]
    fn objects_become_string_keyed_maps() {
        let Value::Map(map) = value_from_json(&json!({ "k": null })).unwrap() else {
            panic!("expected map");
        };
        assert_eq!(map.key_tag(), TypeTag::String);
        assert_eq!(map.get(&Value::from("k")), Some(&Value::Null));
    }

    #[test]
    fn arguments_must_be_an_array() {
        assert_eq!(arguments_from_json(&json!({})).unwrap_err().code, USAGE);
        assert_eq!(arguments_from_json(&json!([true])).unwrap(), vec![Value::Bool(true)]);
    }
}
