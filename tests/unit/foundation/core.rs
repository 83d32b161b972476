use super::*;

#[test]
fn header_packs_length_low_and_opcode_high() {
    let h = CommandHeader::new(7, 2).unwrap();
    assert_eq!(h.encode(), (7 << 21) | 2);
    assert_eq!(CommandHeader::decode(h.encode()), h);
    assert_eq!(h.arg_count(), 1);
}

#[test]
fn header_limits_are_enforced() {
    assert!(CommandHeader::new(MAX_OPCODE, MAX_COMMAND_LENGTH).is_ok());
    assert!(CommandHeader::new(MAX_OPCODE + 1, 1).is_err());
    assert!(CommandHeader::new(0, 0).is_err());
    assert!(CommandHeader::new(0, MAX_COMMAND_LENGTH + 1).is_err());
}

#[test]
fn zero_length_word_decodes_without_panicking() {
    let h = CommandHeader::decode(9 << 21);
    assert_eq!(h.opcode, 9);
    assert_eq!(h.length, 0);
    assert_eq!(h.arg_count(), 0);
}

#[test]
fn encode_command_prefixes_header() {
    let words = encode_command(8, &[10, 20, 30]).unwrap();
    assert_eq!(words.len(), 4);
    assert_eq!(CommandHeader::decode(words[0]), CommandHeader::new(8, 4).unwrap());
    assert_eq!(&words[1..], &[10, 20, 30]);
}
