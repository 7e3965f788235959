// End-to-end calls from a host `Exchange` into a `Guest`.

use membridge::App::{FilterGreaterThan, RecordTransform};
use membridge::Core::alloc::HEAP_BASE;
use membridge::Exchange::{Boundary, Exchange, Guest, GuestBuilder, Handler};
use membridge::Wire::message::{
    DataRequest, DataResponse, DataResponseViewer, Message, Record, RecordViewer,
};
use membridge::Error;

fn filter_exchange() -> Exchange<Guest<FilterGreaterThan>> {
    Exchange::new(GuestBuilder::new().build(FilterGreaterThan).unwrap())
}

#[test]
fn test_filter_scenario() {
    let mut exchange = filter_exchange();
    let request = DataRequest {
        numbers: vec![10, 43, 13, 24, 56, 16],
        k: 42,
    };

    let response: DataResponse = exchange.call_owned(&request).unwrap();
    assert_eq!(response.numbers_greater_k, vec![43, 56]);

    let guest = exchange.module();
    assert_eq!(guest.processed(), 1);
    assert_eq!(guest.allocator().live_count(), 0);
}

#[test]
fn test_record_scenario() {
    let guest = GuestBuilder::new().build(RecordTransform::default()).unwrap();
    let mut exchange = Exchange::new(guest);
    let request = Record {
        text: "foo".into(),
        values: vec![1, 2, 3],
        number: 42,
    };

    let response: Record = exchange.call_owned(&request).unwrap();
    assert_eq!(
        response,
        Record {
            text: "foobar".into(),
            values: vec![-1, -2, -3, -5],
            number: 43,
        }
    );
    assert_eq!(exchange.module().allocator().live_count(), 0);
}

#[test]
fn test_filter_edge_cases() {
    let mut exchange = filter_exchange();
    let cases: Vec<(Vec<i32>, i32, Vec<i32>)> = vec![
        (vec![], 0, vec![]),
        (vec![5, 5, 5], 5, vec![]),
        (vec![i32::MIN, i32::MAX], i32::MIN, vec![i32::MAX]),
        (vec![3, 1, 2], i32::MIN, vec![3, 1, 2]),
        (vec![-1, -2, 0], -2, vec![-1, 0]),
    ];

    for (numbers, k, expected) in cases {
        let response: DataResponse = exchange
            .call_owned(&DataRequest { numbers, k })
            .unwrap();
        assert_eq!(response.numbers_greater_k, expected);
    }
    assert_eq!(exchange.calls(), 5);
    assert_eq!(exchange.module().allocator().live_count(), 0);
}

#[test]
fn test_lease_reads_in_place_and_releases_on_drop() {
    let mut exchange = filter_exchange();
    let request = DataRequest {
        numbers: vec![1, 100, 2, 200],
        k: 50,
    };

    {
        let lease = exchange.call::<_, DataResponse>(&request).unwrap();
        assert!(lease.address() >= HEAP_BASE);
        assert_eq!(lease.len(), DataResponse::header_size() + 8);
        let view: DataResponseViewer<'_> = lease.view();
        assert_eq!(view.numbers_greater_k(), [100, 200]);
    }

    assert_eq!(exchange.module().allocator().live_count(), 0);
}

#[test]
fn test_call_with_consumes_view() {
    let mut exchange = filter_exchange();
    let request = DataRequest {
        numbers: (0..100).collect(),
        k: 89,
    };
    let sum = exchange
        .call_with::<_, DataResponse, _, _>(&request, |view| {
            view.numbers_greater_k().iter().sum::<i32>()
        })
        .unwrap();
    assert_eq!(sum, (90..100).sum::<i32>());
    assert_eq!(exchange.module().allocator().live_count(), 0);
}

#[test]
fn test_many_calls_do_not_leak() {
    let mut exchange = filter_exchange();
    let mut heap_top = None;

    for round in 0..500 {
        let len = fastrand::usize(..256);
        let numbers: Vec<i32> = std::iter::repeat_with(|| fastrand::i32(-1000..1000))
            .take(len)
            .collect();
        let k = fastrand::i32(-1000..1000);
        let expected: Vec<i32> = numbers.iter().copied().filter(|&n| n > k).collect();

        let response: DataResponse = exchange.call_owned(&DataRequest { numbers, k }).unwrap();
        assert_eq!(response.numbers_greater_k, expected, "round {}", round);

        let allocator = exchange.module().allocator();
        assert_eq!(allocator.live_count(), 0);
        assert_eq!(allocator.bytes_in_use(), 0);
        heap_top.get_or_insert(allocator.heap_top());
    }
    assert_eq!(exchange.module().allocator().heap_top(), HEAP_BASE);
    assert_eq!(heap_top, Some(HEAP_BASE));
}

#[test]
fn test_guest_out_of_memory_surfaces_to_host() {
    let guest = GuestBuilder::new()
        .with_initial_pages(1)
        .with_max_pages(1)
        .build(FilterGreaterThan)
        .unwrap();
    let mut exchange = Exchange::new(guest);
    let request = DataRequest {
        numbers: vec![1; 20_000],
        k: 0,
    };

    let err = exchange.call_owned::<_, DataResponse>(&request).unwrap_err();
    assert!(matches!(err, Error::OutOfMemory { .. }));
    assert_eq!(exchange.calls(), 0);
    assert_eq!(exchange.module().allocator().live_count(), 0);
}

#[test]
fn test_response_that_does_not_fit_is_no_response() {
    let guest = GuestBuilder::new()
        .with_max_pages(1)
        .build(FilterGreaterThan)
        .unwrap();
    let mut exchange = Exchange::new(guest);
    // the request fits, but request and response together do not
    let request = DataRequest {
        numbers: vec![1; 9_000],
        k: 0,
    };

    let err = exchange.call_owned::<_, DataResponse>(&request).unwrap_err();
    assert_eq!(err, Error::NoResponse);
    assert_eq!(exchange.calls(), 1);
    assert_eq!(exchange.module().allocator().live_count(), 0);

    // the guest is still usable afterwards
    let response: DataResponse = exchange
        .call_owned(&DataRequest {
            numbers: vec![1, 2, 3],
            k: 1,
        })
        .unwrap();
    assert_eq!(response.numbers_greater_k, vec![2, 3]);
}

#[test]
fn test_raw_boundary_protocol() {
    let mut guest = GuestBuilder::new().build(FilterGreaterThan).unwrap();
    let bytes = DataRequest {
        numbers: vec![10, 43, 13, 24, 56, 16],
        k: 42,
    }
    .encode()
    .unwrap();

    let address = Boundary::allocate(&mut guest, bytes.len() as u32);
    assert_ne!(address, 0);
    let start = address as usize;
    guest.memory_mut()[start..start + bytes.len()].copy_from_slice(&bytes);

    let word = Boundary::process(&mut guest, address, bytes.len() as u32);
    Boundary::release(&mut guest, address);
    assert_ne!(word, 0);

    let response_address = (word >> 32) as usize;
    let response_length = (word & 0xFFFF_FFFF) as usize;
    let response = DataResponse::read_as_root(
        &guest.memory()[response_address..response_address + response_length],
    );
    assert_eq!(response.numbers_greater_k, vec![43, 56]);

    Boundary::release(&mut guest, response_address as u32);
    assert_eq!(guest.allocator().live_count(), 0);
}

#[test]
fn test_custom_handler() {
    // counts the characters of the text and echoes the values reversed
    struct Reverse;

    impl Handler for Reverse {
        type Request = Record;
        type Response = Record;

        fn handle(&mut self, request: RecordViewer<'_>) -> Record {
            Record {
                text: request.text().chars().rev().collect(),
                values: request.values().iter().rev().collect(),
                number: request.text().chars().count() as i32,
            }
        }
    }

    let mut exchange = Exchange::new(GuestBuilder::new().build(Reverse).unwrap());
    let response: Record = exchange
        .call_owned(&Record {
            text: "añb".into(),
            values: vec![1, 2, 3],
            number: 0,
        })
        .unwrap();
    assert_eq!(response.text, "bña");
    assert_eq!(response.values, vec![3, 2, 1]);
    assert_eq!(response.number, 3);
}

#[test]
fn test_builder_rejects_bad_limits() {
    let err = GuestBuilder::new()
        .with_initial_pages(4)
        .with_max_pages(2)
        .build(FilterGreaterThan)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));

    let err = GuestBuilder::new()
        .with_max_pages(65_537)
        .build(FilterGreaterThan)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
}
