use crate::{
    key::{ByteEntityEncoder, SeedRangeEncoder},
    model::{Element, SeedRangePair},
    stage::{ScanConstraints, StageFactory, StageKind, StageStack},
    store::{
        CborElementCodec, CodecError, ElementCodec, MemoryStore, RawEntry, ScanHandle, Store,
        StoreCapabilities, StoreError, StoreKey,
    },
    test_support::{config, entity_view, knows, person},
    value::Value,
    view::ViewElementDefinition,
};

fn person_stack() -> StageStack {
    let config = config();
    let view = entity_view("Person", ViewElementDefinition::new());

    StageFactory::new(&config)
        .build_stages(&view, "Person", &ScanConstraints::default())
        .expect("stack should build")
}

fn drain<H: ScanHandle>(handle: &mut H) -> Vec<Element> {
    let codec = CborElementCodec;
    let mut out = Vec::new();
    while let Some(entry) = handle.next_entry().expect("read should succeed") {
        out.push(codec.decode(&entry).expect("entry should decode"));
    }

    out
}

#[test]
fn store_keys_order_by_row_first() {
    let low = StoreKey::new(vec![1], "Zeta", vec![9]);
    let high = StoreKey::new(vec![2], "Alpha", vec![0]);

    assert!(low < high);
    assert!(StoreKey::new(vec![1], "A", vec![1]) < StoreKey::new(vec![1], "B", vec![0]));
}

#[test]
fn codec_writes_one_entry_per_row() {
    let codec = CborElementCodec;

    let entity = codec.encode(&person("a", 1), 7).expect("entity should encode");
    let edge = codec
        .encode(&knows("a", "b", true, 1), 8)
        .expect("edge should encode");
    let self_loop = codec
        .encode(&knows("a", "a", false, 1), 9)
        .expect("self loop should encode");

    assert_eq!(entity.len(), 1);
    assert_eq!(entity[0].key.family, "Person");
    assert_eq!(entity[0].key.qualifier, 7u64.to_be_bytes().to_vec());
    assert_eq!(edge.len(), 2);
    assert_eq!(self_loop.len(), 1);
    assert_eq!(
        codec.decode(&edge[1]).expect("edge should decode"),
        knows("a", "b", true, 1)
    );
}

#[test]
fn codec_rejects_entries_outside_their_family() {
    let codec = CborElementCodec;
    let mut entry = codec
        .encode(&person("a", 1), 0)
        .expect("entity should encode")
        .remove(0);
    entry.key.family = "Knows".to_string();

    assert!(matches!(
        codec.decode(&entry),
        Err(CodecError::FamilyMismatch { .. })
    ));
}

#[test]
fn codec_rejects_corrupt_values() {
    let entry = RawEntry {
        key: StoreKey::new(vec![0x05], "Person", vec![]),
        value: vec![0xff, 0x00],
    };

    assert!(matches!(
        CborElementCodec.decode(&entry),
        Err(CodecError::Deserialize(_))
    ));
}

#[test]
fn memory_scan_summarises_rows_in_range() {
    let store = MemoryStore::new();
    store
        .insert([person("a", 1), person("a", 2), person("b", 4), person("c", 8)])
        .expect("insert should succeed");
    let range = ByteEntityEncoder
        .range(&SeedRangePair::vertices("a", "b"))
        .expect("range should encode");

    let mut scan = store
        .open_scan(&range, person_stack().as_slice())
        .expect("scan should open");
    let out = drain(&mut scan);

    assert_eq!(out.len(), 2);
    assert_eq!(out[0].property("count"), Some(&Value::Uint(3)));
    assert_eq!(out[1].property("count"), Some(&Value::Uint(4)));
    assert_eq!(store.len(), 4);
}

#[test]
fn memory_scans_track_open_handles() {
    let store = MemoryStore::new();
    let range = ByteEntityEncoder
        .range(&SeedRangePair::single("a"))
        .expect("range should encode");
    let stack = person_stack();

    let mut first = store
        .open_scan(&range, stack.as_slice())
        .expect("scan should open");
    let second = store
        .open_scan(&range, stack.as_slice())
        .expect("scan should open");
    assert_eq!(store.open_scans(), 2);

    first.close();
    first.close();
    assert_eq!(store.open_scans(), 1);
    assert_eq!(first.next_entry(), Err(StoreError::Closed));

    drop(second);
    assert_eq!(store.open_scans(), 0);
    assert_eq!(store.scans_opened(), 2);
    assert_eq!(store.installed_stacks().len(), 2);
}

#[test]
fn memory_store_rejects_unsupported_stages() {
    let store = MemoryStore::new()
        .with_capabilities(StoreCapabilities::default().without(StageKind::RowKeyAggregator));
    let range = ByteEntityEncoder
        .range(&SeedRangePair::single("a"))
        .expect("range should encode");

    let err = store
        .validate_stages(person_stack().as_slice())
        .expect_err("aggregator is unsupported");
    assert!(matches!(
        err,
        StoreError::StageRejected {
            stage: "row_key_aggregator",
            ..
        }
    ));
    assert!(store.open_scan(&range, person_stack().as_slice()).is_err());
    assert_eq!(store.open_scans(), 0);
    assert_eq!(store.scans_opened(), 0);
}

#[test]
fn capabilities_cap_stack_depth() {
    let capabilities = StoreCapabilities {
        max_stages: 0,
        ..StoreCapabilities::default()
    };

    assert_eq!(
        capabilities.check(person_stack().as_slice()),
        Err(StoreError::TooManyStages { count: 1, max: 0 })
    );
}

#[test]
fn memory_store_injects_read_failures() {
    let store = MemoryStore::new();
    store
        .insert([person("a", 1), person("b", 2)])
        .expect("insert should succeed");
    let range = ByteEntityEncoder
        .range(&SeedRangePair::vertices("a", "b"))
        .expect("range should encode");
    store.fail_reads_after(1);

    let mut scan = store
        .open_scan(&range, person_stack().as_slice())
        .expect("scan should open");

    assert!(matches!(scan.next_entry(), Ok(Some(_))));
    assert!(matches!(scan.next_entry(), Err(StoreError::Unavailable(_))));
}
