use bsondoc::{
    decode_documents, encode_documents, write_documents_to_file, BsonValue, BulkDecodeOptions,
    Document,
};

#[test]
fn trailing_garbage_after_one_document() {
    let mut bytes = vec![12, 0, 0, 0, 0x10, b'a', 0, 1, 0, 0, 0, 0];
    bytes.extend_from_slice(&[0x01, 0x02]);

    let documents = decode_documents(&bytes, &BulkDecodeOptions::default());
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].as_bytes(), &bytes[..12]);
}

#[test]
fn stream_round_trip() {
    let documents = vec![
        Document::from_pairs([("id", 1i32)]),
        Document::from_pairs([("id", BsonValue::Int32(2)), ("tag", BsonValue::from("x"))]),
        Document::new(),
    ];
    let bytes = encode_documents(&documents);
    assert_eq!(
        bytes.len(),
        documents.iter().map(Document::byte_len).sum::<usize>()
    );
    assert_eq!(
        decode_documents(&bytes, &BulkDecodeOptions::default()),
        documents
    );
}

#[test]
fn truncated_last_document_is_dropped() {
    let first = Document::from_pairs([("a", "one")]);
    let second = Document::from_pairs([("b", "two")]);
    let mut bytes = encode_documents([&first, &second]);
    bytes.truncate(bytes.len() - 3);

    let documents = decode_documents(&bytes, &BulkDecodeOptions::default());
    assert_eq!(documents, vec![first]);
}

#[test]
fn tiny_declared_length_without_validation() {
    // a declared length of 1..=4 still frames that many bytes; the document
    // built from them is the invalid empty one
    let bytes = [4, 0, 0, 0, 0];
    let documents = decode_documents(&bytes, &BulkDecodeOptions::default());
    assert_eq!(documents.len(), 1);
    assert!(documents[0].is_invalid());

    assert!(decode_documents(&bytes, &BulkDecodeOptions::validating()).is_empty());
}

#[test]
fn write_stream_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stream.bson");
    let documents = [
        Document::from_pairs([("n", 1i32)]),
        Document::from_pairs([("n", 2i32)]),
    ];
    write_documents_to_file(&path, &documents).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(
        decode_documents(&bytes, &BulkDecodeOptions::validating()),
        documents
    );
}
