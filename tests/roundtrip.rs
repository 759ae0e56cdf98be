//! End-to-end pack / list / unpack tests over real directory trees.

use std::cell::Cell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use kar::archive::{EntryHeader, GlobalHeader};
use kar::fs::SourceFile;
use kar::{
    ArchiveError, Extractor, FileMeta, FileSystem, LocalFs, NoProgress, Packer, list,
    open_archive, verify,
};
use tempfile::TempDir;

// ============================================================================
// Test Helpers
// ============================================================================

fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn sample_tree(root: &Path) {
    write(root, "readme.txt", b"hello world\n");
    write(root, "empty.bin", b"");
    write(root, "docs/guide.md", b"# Guide\n\nSome text.\n");
    write(root, "docs/deep/a/b/c/leaf.dat", &[0xAB; 3000]);
    let big: Vec<u8> = (0..200_000u32).map(|i| (i % 253) as u8).collect();
    write(root, "data/big.bin", &big);
}

/// Relative path -> content for every regular file under `root`.
fn snapshot(root: &Path) -> Vec<(String, Vec<u8>)> {
    let mut out = Vec::new();
    for ent in walkdir::WalkDir::new(root).sort_by_file_name() {
        let ent = ent.unwrap();
        if ent.file_type().is_file() {
            let rel = ent.path().strip_prefix(root).unwrap();
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            out.push((rel, fs::read(ent.path()).unwrap()));
        }
    }
    out
}

fn pack(src: &Path, archive: &Path) -> kar::PackSummary {
    Packer::new()
        .pack_to_file(src, archive, &mut NoProgress)
        .unwrap()
}

/// Local disk whose second content read fails, as if the file vanished
/// between the walk and the read.
struct VanishingFs {
    inner: LocalFs,
    reads: Cell<usize>,
}

impl FileSystem for VanishingFs {
    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn walk(&self, root: &Path, exclude: Option<&Path>) -> kar::Result<Vec<SourceFile>> {
        self.inner.walk(root, exclude)
    }

    fn read_file(&self, path: &Path) -> kar::Result<Vec<u8>> {
        self.reads.set(self.reads.get() + 1);
        if self.reads.get() == 2 {
            return Err(io::Error::new(io::ErrorKind::NotFound, "vanished").into());
        }
        self.inner.read_file(path)
    }

    fn metadata(&self, path: &Path) -> FileMeta {
        self.inner.metadata(path)
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> kar::Result<()> {
        self.inner.write_file(path, contents)
    }

    fn restore_metadata(&self, path: &Path, meta: &FileMeta) -> kar::Result<()> {
        self.inner.restore_metadata(path, meta)
    }

    fn create_dir_all(&self, path: &Path) -> kar::Result<()> {
        self.inner.create_dir_all(path)
    }
}

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn unpack_reproduces_tree() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    let out = tmp.path().join("out");
    let archive = tmp.path().join("tree.kar");
    sample_tree(&src);

    let summary = pack(&src, &archive);
    assert_eq!(summary.entries, 5);

    let written = Extractor::new()
        .unpack_file(&archive, &out, &mut NoProgress)
        .unwrap();
    assert_eq!(written, 5);
    assert_eq!(snapshot(&src), snapshot(&out));
}

#[test]
fn container_length_matches_declared_records() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    let archive = tmp.path().join("tree.kar");
    sample_tree(&src);
    pack(&src, &archive);

    let entries = list(open_archive(&archive).unwrap()).unwrap();
    let expected: u64 = GlobalHeader::SIZE as u64
        + entries
            .iter()
            .map(|e| EntryHeader::SIZE as u64 + e.path.len() as u64 + e.content_size)
            .sum::<u64>();
    assert_eq!(fs::metadata(&archive).unwrap().len(), expected);
}

#[test]
fn list_reports_paths_and_sizes_in_walk_order() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    let archive = tmp.path().join("tree.kar");
    sample_tree(&src);
    pack(&src, &archive);

    let entries = list(open_archive(&archive).unwrap()).unwrap();
    let summary: Vec<_> = entries
        .iter()
        .map(|e| (e.path.as_str(), e.content_size))
        .collect();
    assert_eq!(
        summary,
        [
            ("data/big.bin", 200_000),
            ("docs/deep/a/b/c/leaf.dat", 3000),
            ("docs/guide.md", 20),
            ("empty.bin", 0),
            ("readme.txt", 12),
        ]
    );
}

#[test]
fn repacking_unchanged_tree_gives_identical_payloads() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    sample_tree(&src);

    let first = tmp.path().join("first.kar");
    let second = tmp.path().join("second.kar");
    pack(&src, &first);
    pack(&src, &second);

    let a = fs::read(&first).unwrap();
    let b = fs::read(&second).unwrap();
    assert_eq!(a.len(), b.len());
    // created_at is the only field allowed to differ.
    assert_eq!(a[..10], b[..10]);
    assert_eq!(a[18..], b[18..]);
}

#[test]
fn archive_inside_source_is_not_packed_into_itself() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    write(&src, "a.txt", b"a");
    let archive = src.join("self.kar");

    pack(&src, &archive);
    // Pack again now that the archive exists inside the tree.
    let summary = pack(&src, &archive);
    assert_eq!(summary.entries, 1);

    let entries = list(open_archive(&archive).unwrap()).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].path, "a.txt");
}

#[cfg(unix)]
#[test]
fn permissions_and_mtime_survive_round_trip() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    let out = tmp.path().join("out");
    let archive = tmp.path().join("perm.kar");
    write(&src, "run.sh", b"#!/bin/sh\necho hi\n");
    write(&src, "ro.txt", b"read only");
    fs::set_permissions(src.join("run.sh"), fs::Permissions::from_mode(0o755)).unwrap();
    fs::set_permissions(src.join("ro.txt"), fs::Permissions::from_mode(0o444)).unwrap();

    pack(&src, &archive);
    Extractor::new()
        .unpack_file(&archive, &out, &mut NoProgress)
        .unwrap();

    let mode = |p: PathBuf| fs::metadata(p).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode(out.join("run.sh")), 0o755);
    assert_eq!(mode(out.join("ro.txt")), 0o444);

    let mtime = |p: PathBuf| {
        fs::metadata(p)
            .unwrap()
            .modified()
            .unwrap()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs()
    };
    assert_eq!(mtime(out.join("run.sh")), mtime(src.join("run.sh")));
}

// ============================================================================
// Boundaries and failures
// ============================================================================

#[test]
fn empty_directory_gives_empty_archive() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    fs::create_dir_all(&src).unwrap();
    let archive = tmp.path().join("empty.kar");

    let summary = pack(&src, &archive);
    assert_eq!(summary.entries, 0);
    assert_eq!(fs::metadata(&archive).unwrap().len(), GlobalHeader::SIZE as u64);

    assert!(list(open_archive(&archive).unwrap()).unwrap().is_empty());
    let report = verify(open_archive(&archive).unwrap(), &mut NoProgress).unwrap();
    assert_eq!(report.entries, 0);

    let out = tmp.path().join("out");
    let written = Extractor::new()
        .unpack_file(&archive, &out, &mut NoProgress)
        .unwrap();
    assert_eq!(written, 0);
    assert!(out.is_dir());
}

#[test]
fn missing_source_fails_before_creating_output() {
    let tmp = TempDir::new().unwrap();
    let archive = tmp.path().join("never.kar");

    let err = Packer::new()
        .pack_to_file(&tmp.path().join("nope"), &archive, &mut NoProgress)
        .unwrap_err();
    assert!(matches!(err, ArchiveError::NotFound(_)));
    assert!(!archive.exists());
}

#[test]
fn uncreatable_output_is_io_error() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    write(&src, "a", b"a");

    let err = Packer::new()
        .pack_to_file(&src, &tmp.path().join("no/such/dir/out.kar"), &mut NoProgress)
        .unwrap_err();
    assert!(matches!(err, ArchiveError::Io(_)));
}

#[test]
fn unreadable_file_aborts_pack_and_removes_output() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    let archive = tmp.path().join("partial.kar");
    sample_tree(&src);

    let vanishing = VanishingFs {
        inner: LocalFs,
        reads: Cell::new(0),
    };
    let err = Packer::with_fs(vanishing)
        .pack_to_file(&src, &archive, &mut NoProgress)
        .unwrap_err();

    assert!(matches!(err, ArchiveError::Io(_)), "{err}");
    assert!(!archive.exists());
}

#[test]
fn missing_archive_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let err = Extractor::new()
        .unpack_file(&tmp.path().join("nope.kar"), tmp.path(), &mut NoProgress)
        .unwrap_err();
    assert!(matches!(err, ArchiveError::NotFound(_)));
}

#[test]
fn bad_magic_fails_every_operation() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    let archive = tmp.path().join("bad.kar");
    sample_tree(&src);
    pack(&src, &archive);

    let mut data = fs::read(&archive).unwrap();
    data[0..4].copy_from_slice(b"ZIPP");

    assert!(matches!(list(&data[..]), Err(ArchiveError::InvalidFormat(_))));
    assert!(matches!(
        verify(&data[..], &mut NoProgress),
        Err(ArchiveError::InvalidFormat(_))
    ));

    let out = tmp.path().join("out");
    assert!(matches!(
        Extractor::new().unpack(&data[..], &out, &mut NoProgress),
        Err(ArchiveError::InvalidFormat(_))
    ));
    assert!(!out.exists());
}

#[test]
fn truncated_archive_is_invalid_format() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    let archive = tmp.path().join("cut.kar");
    sample_tree(&src);
    pack(&src, &archive);

    let data = fs::read(&archive).unwrap();
    let cut = &data[..data.len() - 5];

    assert!(matches!(list(cut), Err(ArchiveError::InvalidFormat(_))));
    assert!(matches!(
        Extractor::new().unpack(cut, &tmp.path().join("out"), &mut NoProgress),
        Err(ArchiveError::InvalidFormat(_))
    ));
}
