use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use icon_extractor::batch::{run_batch, start_batch, BatchEvent, BatchState, FileOutcome};
use icon_extractor::tga::write_tga;
use icon_extractor::{Converter, Error};
use image::{Rgba, RgbaImage};

fn write_icon(dir: &Path, name: &str, size: u32) -> PathBuf {
    let path = dir.join(name);
    let img = RgbaImage::from_fn(size, size, |x, y| Rgba([x as u8, y as u8, 0x80, 0xFF]));
    write_tga(&path, &img).unwrap();
    path
}

fn write_empty(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"").unwrap();
    path
}

fn run(files: &[PathBuf], out: &Path) -> (icon_extractor::BatchResult, Vec<BatchEvent>) {
    let mut events = Vec::new();
    let cancel = AtomicBool::new(false);
    let result = run_batch(files, &Converter::new(out), &cancel, |e| events.push(e)).unwrap();
    (result, events)
}

#[test]
fn converts_icon_onto_centered_canvas() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let files = vec![write_icon(input.path(), "item_42.tga", 64)];

    let (result, _) = run(&files, output.path());
    assert_eq!((result.succeeded, result.total), (1, 1));

    let png = image::open(output.path().join("item_42.png")).unwrap().into_rgba8();
    assert_eq!(png.dimensions(), (320, 320));
    for (x, y, px) in png.enumerate_pixels() {
        let inside = (128..192).contains(&x) && (128..192).contains(&y);
        assert_eq!(px[3] != 0, inside, "pixel ({}, {})", x, y);
    }
    assert_eq!(*png.get_pixel(128, 128), Rgba([0, 0, 0x80, 0xFF]));
    assert_eq!(*png.get_pixel(191, 191), Rgba([63, 63, 0x80, 0xFF]));
}

#[test]
fn corrupt_file_does_not_stop_batch() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let files = vec![
        write_icon(input.path(), "a.tga", 32),
        write_empty(input.path(), "b.tga"),
    ];

    let (result, events) = run(&files, output.path());
    assert_eq!(result.succeeded, 1);
    assert_eq!(result.total, 2);
    assert_eq!(result.failed(), 1);
    assert_eq!(result.state, BatchState::Completed);
    assert!(output.path().join("a.png").exists());
    assert!(!output.path().join("b.png").exists());
    assert!(matches!(&result.outcomes[1], FileOutcome::Failed { input, .. } if input == &files[1]));

    let done: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            BatchEvent::FileDone { file_name, .. } => Some(file_name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(done, ["a.tga"]);
}

#[test]
fn counts_successes_with_many_corrupt_files() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let mut files = Vec::new();
    for i in 0..7 {
        let name = format!("icon_{}.tga", i);
        if i % 3 == 0 {
            files.push(write_empty(input.path(), &name));
        } else {
            files.push(write_icon(input.path(), &name, 8 + i));
        }
    }

    let (result, _) = run(&files, output.path());
    assert_eq!((result.succeeded, result.processed, result.total), (4, 7, 7));
    for i in 0..7 {
        let exists = output.path().join(format!("icon_{}.png", i)).exists();
        assert_eq!(exists, i % 3 != 0, "icon_{}", i);
    }
}

#[test]
fn events_are_ordered() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let files = vec![
        write_icon(input.path(), "one.tga", 4),
        write_empty(input.path(), "two.tga"),
        write_icon(input.path(), "three.tga", 4),
    ];

    let (_, events) = run(&files, output.path());
    let expected = vec![
        BatchEvent::Started { total: 3 },
        BatchEvent::Progress { index: 1, total: 3, file_name: "one.tga".into() },
        BatchEvent::FileDone { file_name: "one.tga".into(), output_path: output.path().join("one.png") },
        BatchEvent::Progress { index: 2, total: 3, file_name: "two.tga".into() },
        BatchEvent::Progress { index: 3, total: 3, file_name: "three.tga".into() },
        BatchEvent::FileDone { file_name: "three.tga".into(), output_path: output.path().join("three.png") },
    ];
    assert_eq!(events, expected);
}

#[test]
fn same_input_gives_identical_png() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let files = vec![write_icon(input.path(), "icon.tga", 48)];

    run(&files, output.path());
    let first = fs::read(output.path().join("icon.png")).unwrap();
    run(&files, output.path());
    let second = fs::read(output.path().join("icon.png")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn later_file_with_same_name_wins() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    fs::create_dir(input.path().join("1.0")).unwrap();
    fs::create_dir(input.path().join("2.0")).unwrap();
    let files = vec![
        write_icon(&input.path().join("1.0"), "icon.tga", 16),
        write_icon(&input.path().join("2.0"), "icon.tga", 64),
    ];

    let (result, _) = run(&files, output.path());
    assert_eq!(result.succeeded, 2);
    let png = image::open(output.path().join("icon.png")).unwrap().into_rgba8();
    assert_ne!(png.get_pixel(128, 128)[3], 0);
}

#[test]
fn cancellation_stops_at_file_boundary() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let files: Vec<_> = (0..5)
        .map(|i| write_icon(input.path(), &format!("icon_{}.tga", i), 8))
        .collect();

    let cancel = AtomicBool::new(false);
    let mut done = 0;
    let result = run_batch(&files, &Converter::new(output.path()), &cancel, |e| {
        if let BatchEvent::FileDone { .. } = e {
            done += 1;
            if done == 2 {
                cancel.store(true, Ordering::SeqCst);
            }
        }
    })
    .unwrap();

    assert_eq!(result.state, BatchState::Cancelled);
    assert_eq!((result.succeeded, result.processed, result.total), (2, 2, 5));
    let written = fs::read_dir(output.path()).unwrap().count();
    assert_eq!(written, 2);
    assert!(output.path().join("icon_1.png").exists());
    assert!(!output.path().join("icon_2.png").exists());
}

#[test]
fn cancelled_before_start_writes_nothing() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let files = vec![write_icon(input.path(), "icon.tga", 8)];

    let cancel = AtomicBool::new(true);
    let result = run_batch(&files, &Converter::new(output.path()), &cancel, |_| {}).unwrap();
    assert_eq!((result.processed, result.state), (0, BatchState::Cancelled));
    assert!(!output.path().join("icon.png").exists());
}

#[test]
fn output_dir_is_created_and_recreated() {
    let input = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let out = root.path().join("nested").join("icons");
    let files = vec![
        write_icon(input.path(), "a.tga", 8),
        write_icon(input.path(), "b.tga", 8),
    ];

    let cancel = AtomicBool::new(false);
    let result = run_batch(&files, &Converter::new(&out), &cancel, |e| {
        if let BatchEvent::FileDone { .. } = e {
            fs::remove_dir_all(&out).unwrap();
        }
    })
    .unwrap();

    assert_eq!(result.succeeded, 2);
    assert!(out.join("b.png").exists());
}

#[test]
fn empty_batch_completes() {
    let output = tempfile::tempdir().unwrap();
    let (result, events) = run(&[], output.path());
    assert_eq!((result.succeeded, result.total, result.state), (0, 0, BatchState::Completed));
    assert_eq!(events, vec![BatchEvent::Started { total: 0 }]);
}

#[test]
fn unwritable_output_dir_fails_batch() {
    let input = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let blocker = root.path().join("file");
    fs::write(&blocker, b"").unwrap();
    let files = vec![write_icon(input.path(), "icon.tga", 8)];

    let handle = start_batch(files, Converter::new(blocker.join("icons")));
    let events: Vec<_> = handle.events().iter().collect();
    assert!(matches!(events.as_slice(), [BatchEvent::Failed { .. }]));
    assert_eq!(handle.state(), BatchState::Idle);
    assert!(matches!(handle.join(), Err(Error::Io(_))));
}

#[test]
fn worker_reports_progress_and_result() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let files = vec![
        write_icon(input.path(), "a.tga", 32),
        write_empty(input.path(), "b.tga"),
    ];

    let handle = start_batch(files, Converter::new(output.path()));
    let events: Vec<_> = handle.events().iter().collect();

    let progress: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            BatchEvent::Progress { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(progress, [1, 2]);
    match events.last() {
        Some(BatchEvent::Finished(r)) => assert_eq!((r.succeeded, r.total), (1, 2)),
        other => panic!("unexpected last event: {:?}", other),
    }

    assert_eq!(handle.state(), BatchState::Completed);
    let result = handle.join().unwrap();
    assert_eq!(result.succeeded, 1);
}

#[test]
fn worker_can_be_cancelled() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    // large first icon keeps the worker busy while the cancel request arrives
    let mut files = vec![write_icon(input.path(), "icon_0.tga", 1024)];
    files.extend((1..20).map(|i| write_icon(input.path(), &format!("icon_{}.tga", i), 16)));

    let handle = start_batch(files, Converter::new(output.path()));
    for event in handle.events() {
        if let BatchEvent::Progress { index: 1, .. } = event {
            handle.cancel();
            break;
        }
    }

    let result = handle.join().unwrap();
    assert!(result.is_cancelled());
    assert_eq!(result.state, BatchState::Cancelled);
    assert!(result.processed >= 1);
    assert!(result.processed < result.total);
    let written = fs::read_dir(output.path()).unwrap().count();
    assert_eq!(written, result.succeeded);
}
