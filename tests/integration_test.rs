use sqsh::codec::CodecId;
use sqsh::frame::ChecksumMode;
use sqsh::pipeline;
use std::fs::File;
use std::io::Write;
use std::process::{Command, Stdio};
use tempfile::NamedTempFile;

#[test]
fn test_encode_and_decode_round_trip_through_files() {
    let mut input_file = NamedTempFile::new().unwrap();
    let test_data = b"Hello, SQSH format! aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    input_file.write_all(test_data).unwrap();

    let compressed_path = NamedTempFile::new().unwrap().into_temp_path();
    {
        let mut src = File::open(input_file.path()).unwrap();
        let mut sink = File::create(&compressed_path).unwrap();
        pipeline::encode(
            &mut src,
            &mut sink,
            &[CodecId::Rle],
            4096,
            ChecksumMode {
                uncomp: true,
                comp: true,
            },
        )
        .unwrap();
    }

    let mut decoded = Vec::new();
    {
        let mut src = File::open(&compressed_path).unwrap();
        pipeline::decode(&mut src, &mut decoded).unwrap();
    }

    assert_eq!(decoded, test_data);
}

#[test]
fn cli_enc_dec_round_trips_a_file() {
    let bin = env!("CARGO_BIN_EXE_sqsh");
    let mut input_file = NamedTempFile::new().unwrap();
    let test_data = b"the mellow yellow fellow mellowed a yellow fellow";
    input_file.write_all(test_data).unwrap();

    let compressed_path = NamedTempFile::new().unwrap().into_temp_path();
    let status = Command::new(bin)
        .args([
            "enc",
            "-codec",
            "LZSS",
            "-o",
        ])
        .arg(&compressed_path)
        .arg(input_file.path())
        .stdout(Stdio::null())
        .status()
        .unwrap();
    assert!(status.success());

    let output = Command::new(bin)
        .args(["dec", "-o", "-"])
        .arg(&compressed_path)
        .stdout(Stdio::piped())
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(output.stdout, test_data);
}

#[test]
fn cli_rejects_unknown_codec_name() {
    let bin = env!("CARGO_BIN_EXE_sqsh");
    let mut input_file = NamedTempFile::new().unwrap();
    input_file.write_all(b"data").unwrap();

    let status = Command::new(bin)
        .args(["enc", "-codec", "NOT-A-CODEC", "-o", "-"])
        .arg(input_file.path())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
}

#[test]
fn cli_detects_corrupted_stream_on_decode() {
    let bin = env!("CARGO_BIN_EXE_sqsh");
    let mut input_file = NamedTempFile::new().unwrap();
    input_file.write_all(b"some data to compress for corruption test").unwrap();

    let compressed_path = NamedTempFile::new().unwrap().into_temp_path();
    let status = Command::new(bin)
        .args(["enc", "-codec", "RAW", "-checksum", "c", "-o"])
        .arg(&compressed_path)
        .arg(input_file.path())
        .status()
        .unwrap();
    assert!(status.success());

    let mut bytes = std::fs::read(&compressed_path).unwrap();
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0xFF;
    std::fs::write(&compressed_path, &bytes).unwrap();

    let output = Command::new(bin)
        .args(["dec", "-o", "-"])
        .arg(&compressed_path)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}
