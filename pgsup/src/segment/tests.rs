/*
 * SPDX-License-Identifier: CC0-1.0
 */

use super::*;

fn segment_bytes(kind: u8, pts: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![0x50, 0x47];
    out.extend_from_slice(&pts.to_be_bytes());
    out.extend_from_slice(&[0, 0, 0, 0]);
    out.push(kind);
    out.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

fn raw(kind: u8, payload: &[u8]) -> RawSegment {
    RawSegment {
        kind,
        pts: 0,
        offset: 0,
        payload: payload.to_vec(),
    }
}

#[test]
fn test_reader_single_segment() {

    let data = segment_bytes(KIND_END, 1234, &[]);
    let segments = SegmentReader::new(&data).collect::<Vec<_>>();

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].kind, KIND_END);
    assert_eq!(segments[0].pts, 1234);
    assert_eq!(segments[0].offset, 0);
    assert!(segments[0].payload.is_empty());
}

#[test]
fn test_reader_resynchronizes_after_garbage() {

    let mut data = b"XXXX".to_vec();
    data.extend_from_slice(&segment_bytes(KIND_END, 42, &[]));

    let segments = SegmentReader::new(&data).collect::<Vec<_>>();

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].pts, 42);
    assert_eq!(segments[0].offset, 4);
}

#[test]
fn test_reader_advances_one_byte_per_resync() {

    // A single stray 0x50 must not make the reader jump past the valid header that starts
    // at the very next byte.
    let mut data = vec![0x50];
    data.extend_from_slice(&segment_bytes(KIND_END, 7, &[]));

    let segments = SegmentReader::new(&data).collect::<Vec<_>>();

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].offset, 1);
}

#[test]
fn test_reader_stops_on_truncated_trailer() {

    let mut data = segment_bytes(KIND_END, 99, &[]);
    data.extend_from_slice(&[0x50, 0x47, 0x00]);

    let segments = SegmentReader::new(&data).collect::<Vec<_>>();

    assert_eq!(segments.len(), 1);
}

#[test]
fn test_reader_stops_on_truncated_payload() {

    let mut data = vec![0x50, 0x47];
    data.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0]);
    data.push(KIND_PDS);
    data.extend_from_slice(&10u16.to_be_bytes());
    data.extend_from_slice(&[1, 2, 3, 4]); // 4 of the declared 10 bytes

    let segments = SegmentReader::new(&data).collect::<Vec<_>>();

    assert!(segments.is_empty());
}

#[test]
fn test_reader_empty_input() {
    assert_eq!(SegmentReader::new(&[]).count(), 0);
}

#[test]
fn test_parse_pcs() {

    let mut payload = Vec::new();
    payload.extend_from_slice(&1920u16.to_be_bytes());
    payload.extend_from_slice(&1080u16.to_be_bytes());
    payload.push(0x10);
    payload.extend_from_slice(&7u16.to_be_bytes());
    payload.push(0x80); // epoch start
    payload.push(0x00); // no palette update
    payload.push(3);    // palette id
    payload.push(1);    // one composition object
    payload.extend_from_slice(&2u16.to_be_bytes()); // object id
    payload.push(0);    // window id
    payload.push(0x00); // not cropped
    payload.extend_from_slice(&100u16.to_be_bytes());
    payload.extend_from_slice(&900u16.to_be_bytes());

    let segment = Segment::parse(&raw(KIND_PCS, &payload)).unwrap();
    let pcs = match segment {
        Segment::PresentationComposition(pcs) => pcs,
        _ => panic!("wrong segment variant"),
    };

    assert_eq!(pcs.width, 1920);
    assert_eq!(pcs.height, 1080);
    assert_eq!(pcs.composition_number, 7);
    assert_eq!(pcs.composition_state, CompositionState::EpochStart);
    assert!(!pcs.palette_update);
    assert_eq!(pcs.palette_id, 3);
    assert_eq!(pcs.composition_objects.len(), 1);
    assert_eq!(pcs.composition_objects[0].object_id, 2);
    assert_eq!(pcs.composition_objects[0].window_id, 0);
    assert_eq!(pcs.composition_objects[0].x, 100);
    assert_eq!(pcs.composition_objects[0].y, 900);
}

#[test]
fn test_parse_pcs_cropped_entry() {

    let mut payload = Vec::new();
    payload.extend_from_slice(&1280u16.to_be_bytes());
    payload.extend_from_slice(&720u16.to_be_bytes());
    payload.push(0x10);
    payload.extend_from_slice(&1u16.to_be_bytes());
    payload.push(0x00);
    payload.push(0x00);
    payload.push(0);
    payload.push(1);
    payload.extend_from_slice(&5u16.to_be_bytes());
    payload.push(2);
    payload.push(0x40); // cropped, entry grows to 16 bytes
    payload.extend_from_slice(&10u16.to_be_bytes());
    payload.extend_from_slice(&20u16.to_be_bytes());
    payload.extend_from_slice(&[0u8; 8]); // cropping data, ignored

    let segment = Segment::parse(&raw(KIND_PCS, &payload)).unwrap();
    let pcs = match segment {
        Segment::PresentationComposition(pcs) => pcs,
        _ => panic!("wrong segment variant"),
    };

    assert_eq!(pcs.composition_objects.len(), 1);
    assert_eq!(pcs.composition_objects[0].object_id, 5);
    assert_eq!(pcs.composition_objects[0].window_id, 2);
    assert_eq!(pcs.composition_objects[0].x, 10);
    assert_eq!(pcs.composition_objects[0].y, 20);
}

#[test]
fn test_parse_pcs_rejects_bad_length() {
    assert!(matches!(
        Segment::parse(&raw(KIND_PCS, &[0u8; 12])),
        Err(SegmentError::InvalidCompositionLength { length: 12 }),
    ));
}

#[test]
fn test_parse_wds() {

    let mut payload = vec![1u8];
    payload.push(4); // window id
    payload.extend_from_slice(&8u16.to_be_bytes());
    payload.extend_from_slice(&16u16.to_be_bytes());
    payload.extend_from_slice(&320u16.to_be_bytes());
    payload.extend_from_slice(&240u16.to_be_bytes());

    let segment = Segment::parse(&raw(KIND_WDS, &payload)).unwrap();
    let wds = match segment {
        Segment::WindowDefinition(wds) => wds,
        _ => panic!("wrong segment variant"),
    };

    assert_eq!(wds.windows.len(), 1);
    assert_eq!(wds.windows[0].id, 4);
    assert_eq!(wds.windows[0].x, 8);
    assert_eq!(wds.windows[0].y, 16);
    assert_eq!(wds.windows[0].width, 320);
    assert_eq!(wds.windows[0].height, 240);
}

#[test]
fn test_parse_wds_rejects_bad_modulus() {
    assert!(matches!(
        Segment::parse(&raw(KIND_WDS, &[0u8; 12])),
        Err(SegmentError::InvalidWindowLength { length: 12 }),
    ));
}

#[test]
fn test_parse_pds_record_order() {

    // On the wire the record order is Y, Cr, Cb.
    let payload = vec![6, 2, 9, 180, 90, 45, 255];
    let segment = Segment::parse(&raw(KIND_PDS, &payload)).unwrap();
    let pds = match segment {
        Segment::PaletteDefinition(pds) => pds,
        _ => panic!("wrong segment variant"),
    };

    assert_eq!(pds.id, 6);
    assert_eq!(pds.version, 2);
    assert_eq!(pds.entries.len(), 1);
    assert_eq!(pds.entries[0].id, 9);
    assert_eq!(pds.entries[0].y, 180);
    assert_eq!(pds.entries[0].cr, 90);
    assert_eq!(pds.entries[0].cb, 45);
    assert_eq!(pds.entries[0].alpha, 255);
}

#[test]
fn test_parse_pds_rejects_bad_modulus() {
    assert!(matches!(
        Segment::parse(&raw(KIND_PDS, &[0u8; 8])),
        Err(SegmentError::InvalidPaletteLength { length: 8 }),
    ));
}

#[test]
fn test_parse_ods_first_fragment() {

    let rle = [0x01, 0x02, 0x03];
    let mut payload = Vec::new();
    payload.extend_from_slice(&11u16.to_be_bytes()); // object id
    payload.push(0); // version
    payload.push(0xC0); // first and last
    payload.extend_from_slice(&[0x00, 0x00, 0x07]); // declared length, header inclusive
    payload.extend_from_slice(&3u16.to_be_bytes());
    payload.extend_from_slice(&1u16.to_be_bytes());
    payload.extend_from_slice(&rle);

    let segment = Segment::parse(&raw(KIND_ODS, &payload)).unwrap();
    let ods = match segment {
        Segment::ObjectDefinition(ods) => ods,
        _ => panic!("wrong segment variant"),
    };

    assert_eq!(ods.id, 11);
    assert!(ods.first_in_sequence);
    assert!(ods.last_in_sequence);
    let header = ods.header.unwrap();
    assert_eq!(header.declared_length, 3); // 4-byte size header subtracted
    assert_eq!(header.width, 3);
    assert_eq!(header.height, 1);
    assert_eq!(ods.data, rle);
}

#[test]
fn test_parse_ods_continuation_fragment() {

    let mut payload = Vec::new();
    payload.extend_from_slice(&11u16.to_be_bytes());
    payload.push(0);
    payload.push(0x40); // last, not first
    payload.extend_from_slice(&[0xAA, 0xBB, 0xCC]);

    let segment = Segment::parse(&raw(KIND_ODS, &payload)).unwrap();
    let ods = match segment {
        Segment::ObjectDefinition(ods) => ods,
        _ => panic!("wrong segment variant"),
    };

    assert!(!ods.first_in_sequence);
    assert!(ods.last_in_sequence);
    assert!(ods.header.is_none());
    assert_eq!(ods.data, [0xAA, 0xBB, 0xCC]);
}

#[test]
fn test_parse_ods_rejects_short_payloads() {

    assert!(matches!(
        Segment::parse(&raw(KIND_ODS, &[0u8; 3])),
        Err(SegmentError::InvalidObjectLength { length: 3 }),
    ));

    // A first fragment needs the full 11-byte header.
    let mut payload = vec![0, 1, 0, 0x80];
    payload.extend_from_slice(&[0u8; 5]);
    assert!(matches!(
        Segment::parse(&raw(KIND_ODS, &payload)),
        Err(SegmentError::InvalidObjectLength { length: 9 }),
    ));
}

#[test]
fn test_parse_unrecognized_kind() {
    assert!(matches!(
        Segment::parse(&raw(0x42, &[])),
        Err(SegmentError::UnrecognizedKind { kind: 0x42 }),
    ));
}

#[test]
fn test_parse_end() {
    assert_eq!(Segment::parse(&raw(KIND_END, &[])).unwrap(), Segment::End);
}
