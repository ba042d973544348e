//! Layout fuzz target: decode arbitrary bytes with a fixed schema and lay them out.
//! Nothing may panic; whenever decoding succeeds, layout must succeed and the field end
//! offsets must be the running sum of lengths.
//! Build with: cargo fuzz run layout_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fn schema() -> visistruct::Schema {
    use visistruct::{field, Encoding, LengthPrefix, Node, ScalarSpec, Schema};
    Schema::new(vec![
        field("n", Node::Scalar(ScalarSpec::INT8UL)),
        field(
            "items",
            Node::array_sized_by(
                "n",
                Node::structure(vec![
                    field("tag", Node::enumeration(ScalarSpec::INT8SB, [("X", 1), ("Y", 2)])),
                    field("name", Node::pascal_string(LengthPrefix::VarInt, Encoding::Utf16)),
                    field("v", Node::Scalar(ScalarSpec::FLOAT32L)),
                ]),
            ),
        ),
        field("tail", Node::cstring(Encoding::Utf8)),
    ])
}

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let v = match visistruct::VisiStruct::from_bytes(schema(), data.to_vec()) {
        Ok(v) => v,
        Err(visistruct::VisiError::Decoding(_)) => return,
        Err(e) => panic!("layout failed on decodable input: {}", e),
    };
    let mut end = 0;
    for f in v.fields() {
        end += f.length;
        assert_eq!(f.offset, end);
    }
    assert!(end <= data.len());
    let _ = v.hex_rows(16);
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run layout_fuzz");
}
