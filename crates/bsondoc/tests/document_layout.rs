use bsondoc::{
    Binary, BsonValue, CodeWithScope, Document, DocumentError, ElementType, MaxKey, MinKey, Null,
    ObjectId, Regex, Timestamp, ValidationError,
};

const EMPTY: [u8; 5] = [5, 0, 0, 0, 0];

fn header(doc: &Document) -> i32 {
    i32::from_le_bytes(doc.as_bytes()[..4].try_into().unwrap())
}

#[test]
fn append_and_remove_exact_bytes() {
    let mut doc = Document::new();
    doc.append("a", BsonValue::Int32(1));
    assert_eq!(
        doc.as_bytes(),
        &[12, 0, 0, 0, 0x10, b'a', 0x00, 1, 0, 0, 0, 0x00]
    );

    assert_eq!(doc.remove("a"), Some(BsonValue::Int32(1)));
    assert_eq!(doc.as_bytes(), &EMPTY);
    assert_eq!(doc.remove("a"), None);
}

#[test]
fn short_or_overlong_headers_give_invalid_empty_document() {
    let inputs: [&[u8]; 5] = [
        &[],
        &[1, 2, 3],
        &[5, 0, 0, 0],
        &[40, 0, 0, 0, 0x10, b'a', 0, 1, 0, 0, 0, 0],
        &[0xFF, 0xFF, 0xFF, 0xFF, 0],
    ];
    for bytes in inputs {
        let doc = Document::from_bytes(bytes);
        assert!(doc.is_invalid(), "{bytes:?}");
        assert_eq!(doc.as_bytes(), &EMPTY);
        assert!(doc.is_empty());

        let owned = Document::from_vec(bytes.to_vec());
        assert!(owned.is_invalid());
        assert_eq!(owned, doc);
    }
}

#[test]
fn construction_paths_agree() {
    let doc = Document::from_pairs([("k", "v")]);
    let mut framed = vec![0xAA, 0xBB];
    framed.extend_from_slice(doc.as_bytes());

    assert_eq!(Document::from_bytes(doc.as_bytes()), doc);
    assert_eq!(Document::from_slice(&framed, 2), doc);
    assert_eq!(Document::from_vec(doc.as_bytes().to_vec()), doc);
}

#[test]
fn every_element_type_round_trips() {
    let mut doc = Document::new();
    doc.append("double", 2.5f64);
    doc.append("string", "héllo");
    doc.append("doc", Document::from_pairs([("inner", 1i32)]));
    doc.append("array", BsonValue::Array(Document::from_values([1i64, 2, 3])));
    doc.append(
        "binary",
        Binary {
            subtype: 0x80,
            data: vec![0, 1, 2],
        },
    );
    doc.append("oid", ObjectId::from_bytes([7; 12]));
    doc.append("bool", true);
    doc.append("date", BsonValue::DateTime(1_600_000_000_000));
    doc.append("null", Null);
    doc.append(
        "regex",
        Regex {
            pattern: "^x".into(),
            options: "i".into(),
        },
    );
    doc.append("code", BsonValue::JavaScriptCode("return 1".into()));
    doc.append(
        "scoped",
        CodeWithScope {
            code: "x".into(),
            scope: Document::from_pairs([("x", 1i32)]),
        },
    );
    doc.append("int32", -5i32);
    doc.append(
        "ts",
        Timestamp {
            increment: 1,
            timestamp: 2,
        },
    );
    doc.append("int64", i64::MIN);
    doc.append("min", MinKey);
    doc.append("max", MaxKey);

    assert_eq!(doc.len(), 17);
    assert_eq!(header(&doc) as usize, doc.byte_len());
    assert_eq!(doc.validate(), Ok(()));

    let reparsed = Document::from_bytes(doc.as_bytes());
    assert_eq!(reparsed.as_bytes(), doc.as_bytes());
    assert_eq!(reparsed.element_positions(), doc.element_positions());

    let tags: Vec<u8> = doc
        .element_positions()
        .iter()
        .map(|&position| doc.as_bytes()[position])
        .collect();
    assert_eq!(
        tags,
        vec![
            0x01, 0x02, 0x03, 0x04, 0x05, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0D, 0x0F, 0x10, 0x11,
            0x12, 0xFF, 0x7F
        ]
    );
    assert_eq!(doc.get("min"), Some(BsonValue::MinKey));
    assert_eq!(doc.get("int64"), Some(BsonValue::Int64(i64::MIN)));
    assert_eq!(doc.get("string").unwrap().as_str(), Some("héllo"));
}

#[test]
fn iteration_faults_on_unknown_tag() {
    let mut bytes = Document::from_pairs([("a", 1i32), ("b", 2i32)]).into_bytes();
    // second element's tag
    bytes[11] = 0x06;
    let doc = Document::from_bytes(&bytes);

    let items: Vec<_> = doc.iter().collect();
    assert_eq!(
        items,
        vec![
            Ok(("a".to_string(), BsonValue::Int32(1))),
            Err(DocumentError::CorruptBuffer {
                offset: 11,
                tag: 0x06
            }),
        ]
    );
    assert!(matches!(
        doc.validate(),
        Err(ValidationError::UnknownElementType { offset: 11, tag: 0x06 })
    ));
    assert_eq!(ElementType::from_byte(0x06), None);
}

#[test]
fn mutation_is_not_shared_between_clones() {
    let original = Document::from_pairs([("a", 1i32)]);
    let mut copy = original.clone();
    copy.append("b", 2i32);
    copy.remove("a");

    assert_eq!(original.keys().collect::<Vec<_>>(), vec!["a"]);
    assert_eq!(copy.keys().collect::<Vec<_>>(), vec!["b"]);
}

#[test]
fn write_to_file_is_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.bson");
    let doc = Document::from_pairs([("name", "bsondoc")]);
    doc.write_to_file(&path).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), doc.as_bytes());
}

#[test]
fn write_to_missing_directory_surfaces_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("doc.bson");
    let err = Document::new().write_to_file(&path).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}
