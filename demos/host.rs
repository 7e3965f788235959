// In demos/host.rs
//
// Runs both request/response scenarios through an in-process guest.
//
//   RUST_LOG=membridge=debug cargo run --example host [k] [numbers...]
use membridge::App::{FilterGreaterThan, RecordTransform};
use membridge::Exchange::{Exchange, GuestBuilder};
use membridge::Wire::message::{DataRequest, DataResponse, Record};
use std::env;
use tracing_subscriber::EnvFilter;

fn main() -> membridge::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let k = if args.len() > 1 {
        args[1].parse().unwrap_or(42)
    } else {
        42
    };
    let numbers: Vec<i32> = if args.len() > 2 {
        args[2..].iter().filter_map(|arg| arg.parse().ok()).collect()
    } else {
        vec![10, 43, 13, 24, 56, 16]
    };

    let guest = GuestBuilder::new().build(FilterGreaterThan)?;
    let mut exchange = Exchange::new(guest);
    let request = DataRequest { numbers, k };
    println!("Host: filtering {:?} by k = {}", request.numbers, request.k);

    {
        let lease = exchange.call::<_, DataResponse>(&request)?;
        println!(
            "Host: response of {} bytes at {:#x}: {:?}",
            lease.len(),
            lease.address(),
            lease.view().numbers_greater_k()
        );
    }
    println!("Guest state: {:?}", exchange.module().allocator());

    let guest = GuestBuilder::new().build(RecordTransform::default())?;
    let mut exchange = Exchange::new(guest);
    let request = Record {
        text: "foo".to_string(),
        values: vec![1, 2, 3],
        number: 42,
    };
    let response: Record = exchange.call_owned(&request)?;
    println!("Host: {:?} -> {:?}", request, response);
    println!("Guest state: {:?}", exchange.module());

    Ok(())
}
