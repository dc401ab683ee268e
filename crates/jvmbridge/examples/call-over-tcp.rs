//! Send one call over a loopback TCP connection and decode it on the
//! other side.
//!
//! Run with:
//!   cargo run --example call-over-tcp

use std::net::{TcpListener, TcpStream};
use std::thread;

use jvmbridge::wire::{read_payload, DecoderConfig, PayloadWriter, TypeTag, Value, ValueMap};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    eprintln!("Listening on {addr}");

    let backend = thread::spawn(move || -> Result<(), jvmbridge::wire::WireError> {
        let (stream, _) = listener.accept()?;
        let call = read_payload(stream, &DecoderConfig::default())?;
        eprintln!(
            "Received {} bytes: {}.{} with {} args",
            call.total_length,
            call.target,
            call.method,
            call.args.len()
        );
        for (i, arg) in call.args.iter().enumerate() {
            eprintln!("  arg {i}: {} {:?}", arg.tag(), arg);
        }
        Ok(())
    });

    let mut options = ValueMap::new(TypeTag::String);
    options.insert("header", "true");
    options.insert("inferSchema", "false");

    let mut writer = PayloadWriter::new(TcpStream::connect(addr)?);
    writer.send(
        false,
        std::process::id() as i32,
        1,
        "7",
        "csv",
        &[
            Value::from(vec!["/data/a.csv", "/data/b.csv"]),
            Value::Map(options),
            Value::list([Value::Double(0.5), Value::Double(1.5)]),
        ],
    )?;

    backend
        .join()
        .map_err(|_| "backend thread panicked")??;
    Ok(())
}
