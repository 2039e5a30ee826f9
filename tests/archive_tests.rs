mod common;

use std::path::PathBuf;

use romzip::{ArchiveError, ArchiveSession, ExistingFilePolicy, ScratchNaming, SessionConfig};

use common::*;

#[tokio::test]
async fn open_rejects_non_container_names() {
    let dir = temp_dir();
    let session = session_in(dir.path());

    for name in ["collection.d64", "collection", "collection.zip.bak"] {
        let path = fixture_copy(FIXTURE, dir.path(), name);
        let result = session.open(&path).await;
        assert!(
            matches!(result, Err(ArchiveError::NotAContainer(_))),
            "{name} should not open"
        );
    }
    assert_eq!(session.open_count(), 0);
}

#[tokio::test]
async fn open_fails_for_missing_or_garbage_files() {
    let dir = temp_dir();
    let session = session_in(dir.path());

    let missing = session.open(dir.path().join("missing.zip")).await;
    assert!(matches!(missing, Err(ArchiveError::Io(_))));

    let garbage = dir.path().join("garbage.zip");
    std::fs::write(&garbage, b"this is not a zip archive at all").unwrap();
    let result = session.open(&garbage).await;
    assert!(matches!(result, Err(ArchiveError::InvalidArchive(_))));
}

#[tokio::test]
async fn catalog_follows_physical_order() {
    let dir = temp_dir();
    let session = session_in(dir.path());
    let path = fixture_copy(FIXTURE, dir.path(), "COLLECTION.ZIP");

    let handle = session.open(&path).await.expect("fixture should open");
    let entries = handle.entries().unwrap();

    let names: Vec<&str> = entries.iter().map(|e| e.name()).collect();
    assert_eq!(
        names,
        [
            "data/",
            "data/game.crt",
            "data/readme.txt",
            "disks/",
            "disks/side1.d64",
            "disks/side2.D64",
            "tools/loader.prg",
        ]
    );
    assert_eq!(entries.iter().filter(|e| !e.is_directory()).count(), 5);

    let crt = &entries[1];
    assert_eq!(crt.uncompressed_size(), 16384);
    assert_eq!(crt.compressed_size(), 16384);
    assert!(entries[4].compressed_size() < entries[4].uncompressed_size());
    assert_eq!(handle.source_path(), path.as_path());
}

#[tokio::test]
async fn exists_matches_whole_file_names_only() {
    let dir = temp_dir();
    let session = session_in(dir.path());
    let handle = session
        .open(fixture_copy(FIXTURE, dir.path(), "c.zip"))
        .await
        .unwrap();

    assert!(handle.exists("data/game.crt"));
    assert!(handle.exists("disks/side2.D64"));
    assert!(!handle.exists("disks/side2.d64"));
    assert!(!handle.exists("game.crt"));
    assert!(!handle.exists("data/game"));
    assert!(!handle.exists("data/"));
    assert!(!handle.exists(""));
}

#[tokio::test]
async fn extract_to_buffer_returns_exact_contents() {
    let dir = temp_dir();
    let session = session_in(dir.path());
    let handle = session
        .open(fixture_copy(FIXTURE, dir.path(), "c.zip"))
        .await
        .unwrap();

    let stored = handle.extract_to_buffer("data/game.crt").await.unwrap();
    assert_eq!(stored.len(), 16384);
    assert_eq!(stored.as_slice(), game_crt().as_slice());
    assert_eq!(stored.name(), "data/game.crt");

    let deflated = handle.extract_to_buffer("disks/side1.d64").await.unwrap();
    assert_eq!(deflated.into_vec(), side1_d64());

    let deflated = handle.extract_to_buffer("disks/side2.D64").await.unwrap();
    assert_eq!(deflated.as_slice(), side2_d64().as_slice());

    let text = handle.extract_to_buffer("data/readme.txt").await.unwrap();
    assert_eq!(text.as_slice(), README);
}

#[tokio::test]
async fn extract_to_buffer_rejects_absent_empty_and_directory_names() {
    let dir = temp_dir();
    let session = session_in(dir.path());
    let handle = session
        .open(fixture_copy(FIXTURE, dir.path(), "c.zip"))
        .await
        .unwrap();

    let absent = handle.extract_to_buffer("data/missing.crt").await;
    assert!(matches!(absent, Err(ArchiveError::EntryNotFound(_))));

    let empty = handle.extract_to_buffer("").await;
    assert!(matches!(empty, Err(ArchiveError::EmptyName)));

    let directory = handle.extract_to_buffer("disks/").await;
    assert!(matches!(directory, Err(ArchiveError::EntryNotFound(_))));
}

#[tokio::test]
async fn find_media_uses_catalog_order() {
    let dir = temp_dir();
    let session = session_in(dir.path());
    let handle = session
        .open(fixture_copy(FIXTURE, dir.path(), "c.zip"))
        .await
        .unwrap();

    assert_eq!(handle.find_media(Some(&[".crt"][..])).unwrap(), "data/game.crt");

    // .d64 ranks above .crt in the default list, but the cartridge comes first
    assert_eq!(handle.find_media::<&str>(None).unwrap(), "data/game.crt");

    assert_eq!(handle.find_media(Some(&["D64"][..])).unwrap(), "disks/side1.d64");
    assert_eq!(
        handle.find_media(Some(&[".prg", ".d64"][..])).unwrap(),
        "disks/side1.d64"
    );

    let none = handle.find_media(Some(&[".tap"][..]));
    assert!(matches!(none, Err(ArchiveError::NoMedia(_))));
}

#[tokio::test]
async fn scratch_extractions_get_distinct_paths() {
    let dir = temp_dir();
    let session = session_in(dir.path());
    let handle = session
        .open(fixture_copy(FIXTURE, dir.path(), "c.zip"))
        .await
        .unwrap();

    let first = session.extract_to_scratch(&handle, "data/game.crt").await.unwrap();
    let second = session.extract_to_scratch(&handle, "data/game.crt").await.unwrap();

    assert_ne!(first, second);
    for path in [&first, &second] {
        assert_eq!(path.parent().unwrap(), session.scratch().root());
        let file_name = path.file_name().unwrap().to_string_lossy();
        assert!(file_name.starts_with("temp_"));
        assert!(file_name.ends_with("_game.crt"));
        assert!(file_name.contains(session.scratch().token()));
        assert_eq!(std::fs::read(path).unwrap(), game_crt());
    }
}

#[tokio::test]
async fn counter_naming_matches_legacy_layout() {
    let dir = temp_dir();
    let config = SessionConfig {
        naming: ScratchNaming::Counter,
        ..SessionConfig::with_scratch_dir(dir.path().join("scratch"))
    };
    let session = ArchiveSession::new(config);
    let handle = session
        .open(fixture_copy(FIXTURE, dir.path(), "c.zip"))
        .await
        .unwrap();

    let first = session.extract_to_scratch(&handle, "disks/side1.d64").await.unwrap();
    let second = session.extract_to_scratch(&handle, "tools/loader.prg").await.unwrap();

    assert_eq!(first, dir.path().join("scratch/temp_1_side1.d64"));
    assert_eq!(second, dir.path().join("scratch/temp_2_loader.prg"));
    assert_eq!(std::fs::read(&first).unwrap(), side1_d64());
}

#[tokio::test]
async fn existing_scratch_file_policy() {
    let dir = temp_dir();
    let scratch = dir.path().join("scratch");
    std::fs::create_dir_all(&scratch).unwrap();
    std::fs::write(scratch.join("temp_1_game.crt"), b"left over from a previous run").unwrap();

    let archive = fixture_copy(FIXTURE, dir.path(), "c.zip");

    let strict = ArchiveSession::new(SessionConfig {
        naming: ScratchNaming::Counter,
        existing: ExistingFilePolicy::Fail,
        ..SessionConfig::with_scratch_dir(&scratch)
    });
    let handle = strict.open(&archive).await.unwrap();
    let clash = strict.extract_to_scratch(&handle, "data/game.crt").await;
    assert!(matches!(clash, Err(ArchiveError::ScratchExists(_))));
    // the counter moved on, so the next attempt gets a fresh name
    let next = strict.extract_to_scratch(&handle, "data/game.crt").await.unwrap();
    assert_eq!(next, scratch.join("temp_2_game.crt"));

    let lenient = ArchiveSession::new(SessionConfig {
        naming: ScratchNaming::Counter,
        ..SessionConfig::with_scratch_dir(&scratch)
    });
    let handle = lenient.open(&archive).await.unwrap();
    let path = lenient.extract_to_scratch(&handle, "data/game.crt").await.unwrap();
    assert_eq!(path, scratch.join("temp_1_game.crt"));
    assert_eq!(std::fs::read(&path).unwrap(), game_crt());
}

#[tokio::test]
async fn closed_handle_fails_cleanly() {
    let dir = temp_dir();
    let session = session_in(dir.path());
    let handle = session
        .open(fixture_copy(FIXTURE, dir.path(), "c.zip"))
        .await
        .unwrap();
    assert!(handle.is_open());
    assert_eq!(session.open_count(), 1);

    handle.close();

    assert!(!handle.is_open());
    assert_eq!(session.open_count(), 0);
    assert!(!handle.exists("data/game.crt"));
    assert!(matches!(
        handle.extract_to_buffer("data/game.crt").await,
        Err(ArchiveError::HandleClosed)
    ));
    assert!(matches!(handle.entries(), Err(ArchiveError::HandleClosed)));
    assert!(matches!(
        session.extract_to_scratch(&handle, "data/game.crt").await,
        Err(ArchiveError::HandleClosed)
    ));

    // closing twice is a no-op
    handle.close();
    assert!(!handle.is_open());
}

#[tokio::test]
async fn close_all_closes_every_open_handle() {
    let dir = temp_dir();
    let session = session_in(dir.path());
    let archive = fixture_copy(FIXTURE, dir.path(), "c.zip");

    let a = session.open(&archive).await.unwrap();
    let b = session.open(&archive).await.unwrap();
    let c = session.open(&archive).await.unwrap();
    assert_eq!(session.open_count(), 3);
    assert_ne!(a.id(), b.id());
    assert_ne!(b.id(), c.id());

    let written = session.extract_to_scratch(&a, "data/game.crt").await.unwrap();

    session.close_all();
    assert_eq!(session.open_count(), 0);
    for handle in [&a, &b, &c] {
        assert!(!handle.is_open());
        assert!(!handle.exists("data/game.crt"));
    }

    // scratch files survive, and a second sweep is harmless
    assert!(written.exists());
    session.close_all();
    assert_eq!(session.open_count(), 0);

    a.close();
    drop(b);
}

#[tokio::test]
async fn dropping_a_handle_unregisters_it() {
    let dir = temp_dir();
    let session = session_in(dir.path());
    let archive = fixture_copy(FIXTURE, dir.path(), "c.zip");

    {
        let _handle = session.open(&archive).await.unwrap();
        assert_eq!(session.open_count(), 1);
    }
    assert_eq!(session.open_count(), 0);
}

#[tokio::test]
async fn find_and_extract_closes_on_every_path() {
    let dir = temp_dir();
    let session = session_in(dir.path());
    let archive = fixture_copy(FIXTURE, dir.path(), "c.zip");

    let path = session
        .find_and_extract_to_scratch(&archive, Some(&[".d64"][..]))
        .await
        .unwrap();
    assert!(path.to_string_lossy().ends_with("_side1.d64"));
    assert_eq!(std::fs::read(&path).unwrap(), side1_d64());
    assert_eq!(session.open_count(), 0);

    let missing = session
        .find_and_extract_to_scratch(&archive, Some(&[".tap"][..]))
        .await;
    assert!(matches!(missing, Err(ArchiveError::NoMedia(_))));
    assert_eq!(session.open_count(), 0);

    let default = session
        .find_and_extract_to_scratch::<&str>(&archive, None)
        .await
        .unwrap();
    assert!(default.to_string_lossy().ends_with("_game.crt"));
}

#[tokio::test]
async fn boundary_calls_respect_buffer_capacity() {
    let dir = temp_dir();
    let session = session_in(dir.path());
    let archive = fixture_copy(FIXTURE, dir.path(), "c.zip");

    let mut tiny = [0u8; 8];
    assert!(
        !session
            .find_and_extract_to_scratch_into::<&str>(&archive, None, &mut tiny)
            .await
    );
    assert_eq!(tiny, [0u8; 8]);

    let mut out = [0u8; 1024];
    assert!(
        session
            .find_and_extract_to_scratch_into::<&str>(&archive, None, &mut out)
            .await
    );
    let len = out.iter().position(|&b| b == 0).unwrap();
    let path = PathBuf::from(std::str::from_utf8(&out[..len]).unwrap());
    assert_eq!(std::fs::read(&path).unwrap(), game_crt());

    let handle = session.open(&archive).await.unwrap();
    let mut out = [0u8; 1024];
    assert!(
        session
            .extract_to_scratch_into(&handle, "tools/loader.prg", &mut out)
            .await
    );
    assert!(
        !session
            .extract_to_scratch_into(&handle, "tools/missing.prg", &mut out)
            .await
    );
}

#[tokio::test]
async fn empty_archive_opens_with_no_entries() {
    let dir = temp_dir();
    let session = session_in(dir.path());
    let handle = session
        .open(fixture_copy("empty.zip", dir.path(), "empty.zip"))
        .await
        .expect("an empty archive is still a valid archive");

    assert!(handle.entries().unwrap().is_empty());
    assert!(matches!(
        handle.find_media::<&str>(None),
        Err(ArchiveError::NoMedia(_))
    ));
    assert!(matches!(
        handle.extract_to_buffer("anything.prg").await,
        Err(ArchiveError::EntryNotFound(_))
    ));
}

#[tokio::test]
async fn oversized_entries_are_refused() {
    let dir = temp_dir();
    let session = ArchiveSession::new(SessionConfig {
        max_entry_size: 100,
        ..SessionConfig::with_scratch_dir(dir.path().join("scratch"))
    });
    let handle = session
        .open(fixture_copy(FIXTURE, dir.path(), "c.zip"))
        .await
        .unwrap();

    assert!(matches!(
        handle.extract_to_buffer("data/game.crt").await,
        Err(ArchiveError::TooLarge { size: 16384, limit: 100, .. })
    ));
    assert!(handle.extract_to_buffer("tools/loader.prg").await.is_ok());
}
