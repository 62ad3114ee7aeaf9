//! End-to-end scenarios exercising compile + evaluate together against a
//! small hand-built schema, encoded as raw wire bytes the way a code
//! generator's output would be.

use pbquery::schema::{message_field, scalar_field, MessageDescriptor};
use pbquery::{compile, evaluate_all, evaluate_first};

fn varint(mut value: u64) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
    out
}

fn tag(field: u32, wire_type: u8) -> Vec<u8> {
    varint(((field as u64) << 3) | wire_type as u64)
}

fn len_delimited(field: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = tag(field, 2);
    out.extend(varint(payload.len() as u64));
    out.extend_from_slice(payload);
    out
}

fn varint_field(field: u32, value: u64) -> Vec<u8> {
    let mut out = tag(field, 0);
    out.extend(varint(value));
    out
}

/// ```proto
/// message Tag {
///   string name = 1;
/// }
/// message Book {
///   string title = 1;
///   int64 year = 2;
///   repeated Tag tags = 3;
/// }
/// message Library {
///   repeated Book books = 1;
///   string name = 2;
/// }
/// ```
fn tag_schema() -> MessageDescriptor {
    MessageDescriptor::new("library.Tag", vec![scalar_field("name", 1)])
}

fn book_schema() -> MessageDescriptor {
    MessageDescriptor::new(
        "library.Book",
        vec![
            scalar_field("title", 1),
            scalar_field("year", 2),
            message_field("tags", 3, tag_schema()),
        ],
    )
}

fn library_schema() -> MessageDescriptor {
    MessageDescriptor::new(
        "library.Library",
        vec![
            message_field("books", 1, book_schema()),
            scalar_field("name", 2),
        ],
    )
}

fn encode_tag(name: &str) -> Vec<u8> {
    len_delimited(1, name.as_bytes())
}

fn encode_book(title: &str, year: u64, tags: &[&str]) -> Vec<u8> {
    let mut out = len_delimited(1, title.as_bytes());
    out.extend(varint_field(2, year));
    for t in tags {
        out.extend(len_delimited(3, &encode_tag(t)));
    }
    out
}

fn encode_library(books: &[Vec<u8>], name: &str) -> Vec<u8> {
    let mut out = Vec::new();
    for book in books {
        out.extend(len_delimited(1, book));
    }
    out.extend(len_delimited(2, name.as_bytes()));
    out
}

#[test]
fn s1_selects_a_scalar_field() {
    let buf = encode_book("Moby Dick", 1851, &[]);
    let plan = compile(&book_schema(), "title").unwrap();
    let results = evaluate_all(&buf, &plan).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].as_bytes(), b"Moby Dick");
}

#[test]
fn s2_descends_through_a_repeated_message_field() {
    let library = encode_library(
        &[
            encode_book("Moby Dick", 1851, &[]),
            encode_book("Dune", 1965, &[]),
        ],
        "Classics",
    );
    let plan = compile(&library_schema(), "books.title").unwrap();
    let results = evaluate_all(&library, &plan).unwrap();
    let titles: Vec<&[u8]> = results.iter().map(|s| s.as_bytes()).collect();
    assert_eq!(titles, vec![b"Moby Dick".as_slice(), b"Dune".as_slice()]);
}

#[test]
fn s3_equality_filter_on_a_sibling_field() {
    let library = encode_library(
        &[
            encode_book("Moby Dick", 1851, &[]),
            encode_book("Dune", 1965, &[]),
        ],
        "Classics",
    );
    let plan = compile(&library_schema(), "books[title='Dune'].year").unwrap();
    let results = evaluate_all(&library, &plan).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].as_bytes(), varint(1965));
}

#[test]
fn s4_inequality_filter_excludes_the_match() {
    let library = encode_library(
        &[
            encode_book("Moby Dick", 1851, &[]),
            encode_book("Dune", 1965, &[]),
        ],
        "Classics",
    );
    let plan = compile(&library_schema(), "books[title!='Dune'].title").unwrap();
    let results = evaluate_all(&library, &plan).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].as_bytes(), b"Moby Dick");
}

#[test]
fn s5_at_reference_filters_a_nested_scalar_by_its_own_value() {
    let book = encode_book("Dune", 1965, &["sci-fi", "classic"]);
    let plan = compile(&book_schema(), "tags.name[@='classic']").unwrap();
    let results = evaluate_all(&book, &plan).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].as_bytes(), b"classic");
}

#[test]
fn s6_unknown_field_is_a_compile_time_failure() {
    let err = compile(&book_schema(), "publisher").unwrap_err();
    assert!(err.to_string().contains("publisher"));
}

#[test]
fn evaluate_first_short_circuits_after_one_match() {
    let library = encode_library(
        &[
            encode_book("Moby Dick", 1851, &[]),
            encode_book("Dune", 1965, &[]),
        ],
        "Classics",
    );
    let plan = compile(&library_schema(), "books.title").unwrap();
    let first = evaluate_first(&library, &plan).unwrap().unwrap();
    assert_eq!(first.as_bytes(), b"Moby Dick");
}

#[test]
fn nested_filters_compose_across_message_boundaries() {
    let library = encode_library(
        &[
            encode_book("Moby Dick", 1851, &["classic"]),
            encode_book("Dune", 1965, &["sci-fi"]),
        ],
        "Classics",
    );
    let plan = compile(&library_schema(), "books[tags.name='sci-fi'].title").unwrap();
    let results = evaluate_all(&library, &plan).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].as_bytes(), b"Dune");
}

#[test]
fn huge_length_prefix_is_a_malformed_wire_error_not_a_panic() {
    env_logger::try_init().ok();

    // field 1, wire type 2 (length-delimited), with a length varint claiming
    // close to u64::MAX bytes of payload and nothing behind it.
    let mut buf = tag(1, 2);
    buf.extend(varint(u64::MAX - 1));

    let plan = compile(&book_schema(), "title").unwrap();
    let err = evaluate_all(&buf, &plan).unwrap_err();
    assert!(err.to_string().contains("malformed wire"));
}
