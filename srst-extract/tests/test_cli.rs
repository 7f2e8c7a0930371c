use std::{fs, path::Path, process::Command};

use assert_cmd::prelude::*;
use srst::{EntrySource, Platform, SrstBuilder};
use tempfile::tempdir;

fn ktss(seed: u8, len: usize) -> Vec<u8> {
    let mut payload = b"KTSS".to_vec();
    payload.extend((0..len).map(|i| seed.wrapping_mul(3).wrapping_add(i as u8)));
    payload
}

fn write_sample(path: &Path, payloads: &[Vec<u8>]) {
    let mut builder = SrstBuilder::new(Platform::Switch, 0x272C_6EFB);
    for (i, payload) in payloads.iter().enumerate() {
        builder.push_entry(EntrySource::new(0x10 + i as u32, payload.clone()));
    }
    fs::write(path, builder.to_bytes().unwrap()).unwrap();
}

fn srst_extract() -> Command {
    Command::new(assert_cmd::cargo_bin!("srst-extract"))
}

#[test]
fn it_extracts_every_stream() {
    let d = tempdir().unwrap();
    let input = d.path().join("0x272c6efb.file");
    let payloads: Vec<_> = (0..3).map(|i| ktss(i, 20 + i as usize)).collect();
    write_sample(&input, &payloads);
    let prefix = d.path().join("music");

    let output = srst_extract()
        .arg(&input)
        .arg(&prefix)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).unwrap();
    assert!(stdout.contains("platform: 4 [Switch]"), "{stdout}");
    assert!(stdout.contains("writing [002]"), "{stdout}");

    for (i, payload) in payloads.iter().enumerate() {
        let path = d.path().join(format!("music.{i}.kns"));
        assert_eq!(&fs::read(&path).unwrap(), payload, "{}", path.display());
    }
    assert!(!d.path().join("music.3.kns").exists());
}

#[test]
fn it_lists_without_prefix() {
    let d = tempdir().unwrap();
    let input = d.path().join("sample.file");
    write_sample(&input, &[ktss(0, 4), ktss(1, 4)]);

    let output = srst_extract().arg(&input).assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(output).unwrap();
    // 64 bytes in front of the stream plus 8 bytes of stream
    assert!(
        stdout.contains("entry 0 type: 00000010, size: 72 [0x48]"),
        "{stdout}"
    );
    assert!(
        stdout.contains("entry 1 type: 00000011, size: 72 [0x90]"),
        "{stdout}"
    );
    assert_eq!(fs::read_dir(d.path()).unwrap().count(), 1);
}

#[test]
fn it_ignores_other_files() {
    let d = tempdir().unwrap();
    let input = d.path().join("other.file");
    fs::write(&input, vec![0xAB; 0x200]).unwrap();

    srst_extract().arg(&input).assert().success();
}

#[test]
fn it_fails_on_broken_files() {
    let d = tempdir().unwrap();
    let input = d.path().join("broken.file");
    write_sample(&input, &[ktss(0, 4), ktss(1, 4)]);
    let mut data = fs::read(&input).unwrap();
    // size of the first entry
    data[0x8C..0x90].copy_from_slice(&0u32.to_le_bytes());
    fs::write(&input, data).unwrap();

    srst_extract().arg(&input).assert().failure().code(1);
}

#[test]
fn it_keeps_going_when_asked() {
    let d = tempdir().unwrap();
    let input = d.path().join("partial.file");
    write_sample(&input, &[ktss(0, 4), ktss(1, 4), ktss(2, 4)]);
    let mut data = fs::read(&input).unwrap();
    // KTSS marker of the first entry
    data[0x88 + 64] = b'X';
    fs::write(&input, data).unwrap();
    let prefix = d.path().join("out");

    srst_extract()
        .arg(&input)
        .arg(&prefix)
        .assert()
        .failure()
        .code(1);
    assert!(!d.path().join("out.0.kns").exists());
    assert!(!d.path().join("out.1.kns").exists());

    srst_extract()
        .arg("--keep-going")
        .arg(&input)
        .arg(&prefix)
        .assert()
        .failure()
        .code(1);
    assert!(!d.path().join("out.0.kns").exists());
    assert_eq!(fs::read(d.path().join("out.1.kns")).unwrap(), ktss(1, 4));
    assert_eq!(fs::read(d.path().join("out.2.kns")).unwrap(), ktss(2, 4));
}

#[test]
fn it_fails_on_missing_input() {
    let d = tempdir().unwrap();
    srst_extract()
        .arg(d.path().join("does-not-exist"))
        .assert()
        .failure()
        .code(1);
}
