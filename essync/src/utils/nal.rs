//! Annex B emulation-prevention handling.
//!
//! NAL unit payloads must not contain the byte patterns 0x000000, 0x000001,
//! 0x000002 or 0x000003; an 0x03 byte is inserted after every pair of zero
//! bytes that would otherwise be followed by a byte in 0x00..=0x03.

/// Inserts emulation-prevention bytes in place.
pub fn add_emulation_prevention(buf: &mut Vec<u8>) {
    let mut i = 2;
    while i < buf.len() {
        if buf[i - 2] == 0 && buf[i - 1] == 0 && buf[i] <= 3 {
            buf.insert(i, 3);
            i += 1;
        }
        i += 1;
    }
}

/// Returns a copy of `data` with emulation-prevention bytes removed.
pub fn clear_emulation_prevention(data: &[u8]) -> Vec<u8> {
    if data.len() <= 2 {
        return data.to_vec();
    }

    let mut out = Vec::with_capacity(data.len());
    out.extend_from_slice(&data[..2]);

    for i in 2..data.len() {
        if !(data[i - 2] == 0 && data[i - 1] == 0 && data[i] == 3) {
            out.push(data[i]);
        }
    }

    out
}

#[test]
fn inserts_after_zero_pairs() {
    let mut buf = vec![0x4E, 0x01, 0x00, 0x00, 0x01, 0xAA];
    add_emulation_prevention(&mut buf);
    assert_eq!(buf, vec![0x4E, 0x01, 0x00, 0x00, 0x03, 0x01, 0xAA]);
}

#[test]
fn leading_zero_pair_is_escaped() {
    let mut buf = vec![0x00, 0x00, 0x00, 0x00];
    add_emulation_prevention(&mut buf);
    assert_eq!(buf, vec![0x00, 0x00, 0x03, 0x00, 0x00]);
}

#[test]
fn removal_inverts_insertion() {
    let cases: [&[u8]; 6] = [
        &[],
        &[0x00, 0x00],
        &[0x00, 0x00, 0x03],
        &[0x00, 0x00, 0x00, 0x00, 0x00],
        &[0x7C, 0x01, 0x19, 0x00, 0x00, 0x02, 0x00, 0x00, 0x01],
        &[0xFF, 0x00, 0x00, 0x04, 0x00, 0x00, 0x03, 0x00],
    ];

    for case in cases {
        let mut escaped = case.to_vec();
        add_emulation_prevention(&mut escaped);

        for window in escaped.windows(3) {
            assert!(!(window[0] == 0 && window[1] == 0 && window[2] <= 2));
        }

        assert_eq!(clear_emulation_prevention(&escaped), case);
    }
}

#[test]
fn passthrough_when_no_pattern() {
    let mut buf = vec![0x01, 0x02, 0x03, 0x04];
    add_emulation_prevention(&mut buf);
    assert_eq!(buf, vec![0x01, 0x02, 0x03, 0x04]);

    assert_eq!(clear_emulation_prevention(&buf), buf);
}
