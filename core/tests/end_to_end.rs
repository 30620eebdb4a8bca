//! End-to-end scenarios from spec.md §8, exercised against the local
//! substrate (the HTTP-facing scenarios live in `httpd`'s own test suite,
//! which needs a bound socket).

use flocons_core::service::LocalFileService;
use flocons_core::{FileService, FileServiceError, Path};

fn count_container_pairs(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tar"))
        .count()
}

/// Literal scenario 1: two contexts share a directory; each writes its own
/// files, the other reads them back unchanged.
#[test]
fn two_contexts_share_a_directory() {
    let root = tempfile::tempdir().unwrap();
    let test1 = LocalFileService::new("test1", root.path());
    let test2 = LocalFileService::new("test2", root.path());

    test2.create_directory(&Path::parse("/lol")).unwrap();
    let lol = test1.get_file(&Path::parse("/lol")).unwrap();
    assert_eq!(lol.meta().path.to_string(), "/lol");

    test1.create_regular_file(&Path::parse("/lol/testFyle"), 0o644, b"my test content").unwrap();
    assert_eq!(
        test2.get_regular_file(&Path::parse("/lol/testFyle")).unwrap().content().unwrap(),
        b"my test content"
    );

    test1.create_regular_file(&Path::parse("/lol/testFyle2"), 0o644, b"my test content 2").unwrap();
    assert_eq!(
        test2.get_regular_file(&Path::parse("/lol/testFyle2")).unwrap().content().unwrap(),
        b"my test content 2"
    );
}

/// Literal scenario 2: looking up a path that was never created fails with
/// NotFound/ENOENT semantics.
#[test]
fn missing_file_on_an_empty_root_is_not_found() {
    let root = tempfile::tempdir().unwrap();
    let service = LocalFileService::new("test1", root.path());
    let err = service.get_file(&Path::parse("/lol")).unwrap_err();
    assert!(err.is_not_found());
}

/// Invariant 3 (append monotonicity): writing several files under one
/// directory and one context without restarting never fragments into a
/// second container pair.
#[test]
fn writing_many_files_in_one_context_stays_in_one_container_pair() {
    let root = tempfile::tempdir().unwrap();
    let service = LocalFileService::new("alice", root.path());
    for i in 0..20 {
        let path = Path::parse(&format!("/file{i}.txt"));
        service.create_regular_file(&path, 0o644, format!("content {i}").as_bytes()).unwrap();
    }
    assert_eq!(count_container_pairs(root.path()), 1);

    // Every file is still independently addressable afterward.
    for i in 0..20 {
        let path = Path::parse(&format!("/file{i}.txt"));
        let content = service.get_regular_file(&path).unwrap().content().unwrap();
        assert_eq!(content, format!("content {i}").as_bytes());
    }
}

/// Invariant 3, continued: a second context writing into the same
/// directory gets its own container pair (order 1 within its own
/// namespace), never reusing or fragmenting the first context's.
#[test]
fn a_second_context_gets_its_own_container_pair() {
    let root = tempfile::tempdir().unwrap();
    let alice = LocalFileService::new("alice", root.path());
    let bob = LocalFileService::new("bob", root.path());

    alice.create_regular_file(&Path::parse("/a.txt"), 0o644, b"from alice").unwrap();
    bob.create_regular_file(&Path::parse("/b.txt"), 0o644, b"from bob").unwrap();

    assert_eq!(count_container_pairs(root.path()), 2);
}

/// Invariant 5: creating the same directory twice is rejected the second
/// time with AlreadyExists/EEXIST.
#[test]
fn creating_the_same_directory_twice_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    let service = LocalFileService::new("alice", root.path());
    service.create_directory(&Path::parse("/d")).unwrap();
    let err = service.create_directory(&Path::parse("/d")).unwrap_err();
    assert!(matches!(err, FileServiceError::AlreadyExists { .. }));
}

/// Invariant 4: truncating the `.tar` file after a crash must not panic on
/// reopen, and members written before the truncation point stay
/// retrievable.
#[test]
fn truncating_the_tar_file_does_not_panic_and_keeps_earlier_members() {
    let root = tempfile::tempdir().unwrap();
    let service = LocalFileService::new("alice", root.path());
    service.create_regular_file(&Path::parse("/first.txt"), 0o644, b"first file content").unwrap();
    let first_entry = service.get_regular_file(&Path::parse("/first.txt")).unwrap();
    let cutoff = first_entry.address + first_entry.size;
    drop(first_entry);

    service.create_regular_file(&Path::parse("/second.txt"), 0o644, b"second file content, longer").unwrap();

    let tar_path = std::fs::read_dir(root.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .find(|e| e.file_name().to_string_lossy().ends_with(".tar"))
        .unwrap()
        .path();
    let full_len = std::fs::metadata(&tar_path).unwrap().len();
    assert!(full_len > cutoff);
    // Truncate midway through the second member's header -- a crash
    // between the header flush and the CSV append.
    let truncate_at = cutoff + 100;
    let file = std::fs::OpenOptions::new().write(true).open(&tar_path).unwrap();
    file.set_len(truncate_at).unwrap();
    drop(file);

    // Reopening the service (fresh containers, fresh indices) must not
    // panic, and the file written before the truncation point must still
    // be readable byte-for-byte.
    let reopened = LocalFileService::new("alice", root.path());
    let first = reopened.get_regular_file(&Path::parse("/first.txt")).unwrap();
    assert_eq!(first.content().unwrap(), b"first file content");
}

/// Empty regular files round-trip.
#[test]
fn an_empty_regular_file_round_trips() {
    let root = tempfile::tempdir().unwrap();
    let service = LocalFileService::new("alice", root.path());
    service.create_regular_file(&Path::parse("/empty.bin"), 0o644, b"").unwrap();
    let file = service.get_regular_file(&Path::parse("/empty.bin")).unwrap();
    assert_eq!(file.size, 0);
    assert_eq!(file.content().unwrap(), b"");
}

/// Listing a directory sees both subdirectories (filesystem-backed) and
/// regular files (container-backed) with no duplicates between the two
/// disjoint namespaces.
#[test]
fn listing_combines_subdirectories_and_regular_files_without_duplicates() {
    let root = tempfile::tempdir().unwrap();
    let service = LocalFileService::new("alice", root.path());
    service.create_directory(&Path::parse("/sub")).unwrap();
    service.create_regular_file(&Path::parse("/a.txt"), 0o644, b"a").unwrap();
    service.create_regular_file(&Path::parse("/b.txt"), 0o644, b"b").unwrap();

    let listing = service.list_files(&Path::parse("/")).unwrap();
    assert_eq!(listing.len(), 3);
    let names: std::collections::HashSet<_> = listing.iter().map(|f| f.meta().path.basename().to_string()).collect();
    assert_eq!(names, ["sub", "a.txt", "b.txt"].into_iter().map(String::from).collect());
}
