#![no_main]

use arbitrary::Arbitrary;
use gramdex::index::IndexBuilder;
use gramdex::query::Substring;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    files: Vec<(String, Vec<u8>)>,
    pattern: String,
    file_name: bool,
    case_sensitive: bool,
}

fuzz_target!(|input: Input| {
    let mut builder = IndexBuilder::new("fuzz");
    for (name, content) in input.files.iter().take(16) {
        let _ = builder.add_file(name, content);
    }
    let Ok(index) = builder.finish() else {
        return;
    };

    let query = Substring {
        pattern: input.pattern,
        case_sensitive: input.case_sensitive,
        file_name: input.file_name,
    };
    let Ok(mut iter) = index.get_doc_iterator(&query) else {
        return;
    };
    let check = iter.needs_verification();
    for cand in iter.collect_candidates() {
        let ok = index.verify(&cand).expect("in-memory reader never fails");
        assert!(check || ok, "unchecked candidate did not verify: {:?}", cand);
    }
});
