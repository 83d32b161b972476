use super::*;

#[test]
fn lookup_returns_the_registered_region() {
    let mut reg = TransferRegistry::new();
    let mem = SharedMemory::new(256);
    let id = reg.register(mem.clone()).unwrap();
    assert_eq!(id, 1);

    let entry = reg.lookup(id).unwrap();
    assert_eq!(entry.id, 1);
    assert_eq!(entry.size_words, 256);
    assert!(entry.memory.same_region(&mem));
}

#[test]
fn miss_is_an_api_error() {
    let reg = TransferRegistry::new();
    let err = reg.lookup(7).unwrap_err();
    assert!(matches!(err, CmdbufError::UnknownTransferBuffer(7)));
}

#[test]
fn destroyed_ids_are_reused_smallest_first() {
    let mut reg = TransferRegistry::new();
    let a = reg.create(4).unwrap();
    let b = reg.create(4).unwrap();
    let c = reg.create(4).unwrap();
    assert_eq!((a, b, c), (1, 2, 3));

    reg.destroy(c).unwrap();
    reg.destroy(a).unwrap();
    assert!(reg.lookup(a).is_err());
    assert_eq!(reg.len(), 1);

    assert_eq!(reg.create(8).unwrap(), 1);
    assert_eq!(reg.create(8).unwrap(), 3);
    assert_eq!(reg.create(8).unwrap(), 4);
}

#[test]
fn destroying_unknown_id_fails() {
    let mut reg = TransferRegistry::default();
    assert!(reg.is_empty());
    assert!(reg.destroy(1).is_err());
    // A default registry still hands out ids from 1.
    assert_eq!(reg.create(1).unwrap(), 1);
}
