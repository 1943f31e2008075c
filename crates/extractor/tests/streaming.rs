use flate2::write::GzEncoder;
use flate2::Compression as GzLevel;
use mrf_extractor::{
    ByteSource, ExtractConfig, ExtractError, Extractor, LineSink, ResultSet, ResultSink,
};
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const EMPIRE_PPO: &str = "https://empirebcbs.mrf.bcbs.com/2024-07-01_empire_ppo.json.gz";

fn write_gz(dir: &Path, name: &str, json: &str) -> PathBuf {
    let path = dir.join(name);
    let mut encoder = GzEncoder::new(Vec::new(), GzLevel::fast());
    encoder.write_all(json.as_bytes()).expect("compress fixture");
    fs::write(&path, encoder.finish().expect("finish gzip")).expect("write fixture");
    path
}

fn run(input: &Path, output: &Path) -> Result<usize, ExtractError> {
    let extractor = Extractor::new(ExtractConfig::default())?;
    let mut sink = LineSink::from_path(output);
    extractor
        .run(&ByteSource::from_path(input), &mut sink)
        .map(|summary| summary.urls_written)
}

fn lines(path: &Path) -> BTreeSet<String> {
    fs::read_to_string(path)
        .expect("read output")
        .lines()
        .map(str::to_string)
        .collect()
}

fn index_doc(files: &str) -> String {
    format!(
        r#"{{
  "reporting_entity_name": "Anthem",
  "reporting_entity_type": "Health Insurance Issuer",
  "reporting_structure": [{{"reporting_plans": [{{"plan_name": "PPO", "plan_id": "1"}}]}}],
  "in_network_files": [{files}],
  "version": "1.3.1"
}}"#
    )
}

#[test]
fn run_is_idempotent() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_gz(
        temp.path(),
        "index.json.gz",
        &index_doc(&format!(
            r#"{{"description": "Empire PPO Plan", "location": "{EMPIRE_PPO}"}},
               {{"description": "Empire PPO Select", "location": "https://empirebcbs.mrf.bcbs.com/other.json.gz"}},
               {{"description": "Empire HMO", "location": "https://empirebcbs.mrf.bcbs.com/hmo.json.gz"}}"#
        )),
    );
    let first = temp.path().join("first.txt");
    let second = temp.path().join("second.txt");

    assert_eq!(run(&input, &first).expect("first run"), 2);
    assert_eq!(run(&input, &second).expect("second run"), 2);
    assert_eq!(lines(&first), lines(&second));
    assert!(lines(&first).contains(EMPIRE_PPO));
}

#[test]
fn duplicate_locations_collapse_to_one_line() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_gz(
        temp.path(),
        "index.json.gz",
        &index_doc(&format!(
            r#"{{"description": "Empire PPO Plan", "location": "{EMPIRE_PPO}"}},
               {{"description": "Empire HMO", "location": "{EMPIRE_PPO}"}},
               {{"description": "another ppo", "location": "{EMPIRE_PPO}"}}"#
        )),
    );
    let output = temp.path().join("urls.txt");

    assert_eq!(run(&input, &output).expect("run"), 1);
    assert_eq!(
        fs::read_to_string(&output).expect("read output"),
        format!("{EMPIRE_PPO}\n")
    );
}

#[test]
fn missing_target_key_writes_empty_file() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_gz(
        temp.path(),
        "index.json.gz",
        r#"{"reporting_entity_name": "Anthem", "reporting_structure": []}"#,
    );
    let output = temp.path().join("urls.txt");

    assert_eq!(run(&input, &output).expect("run"), 0);
    assert_eq!(fs::read_to_string(&output).expect("read output"), "");
}

#[test]
fn malformed_record_aborts_without_output() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_gz(
        temp.path(),
        "index.json.gz",
        &index_doc(&format!(
            r#"{{"description": "Empire PPO Plan", "location": "{EMPIRE_PPO}"}}, "not an object""#
        )),
    );
    let output = temp.path().join("urls.txt");

    let err = run(&input, &output).expect_err("bare string element must fail");
    assert!(err.is_malformed_input(), "unexpected error: {err}");
    assert!(!output.exists());
}

#[test]
fn multiple_occurrences_are_merged() {
    let temp = TempDir::new().expect("tempdir");
    let json = format!(
        r#"{{
  "in_network_files": [{{"description": "PPO", "location": "{EMPIRE_PPO}"}}],
  "reporting_structure": [],
  "in_network_files": [
    {{"description": "PPO", "location": "{EMPIRE_PPO}"}},
    {{"description": "Essential PPO", "location": "https://empirebcbs.mrf.bcbs.com/b.json.gz"}}
  ]
}}"#
    );
    let input = write_gz(temp.path(), "index.json.gz", &json);

    let extractor = Extractor::new(ExtractConfig::default()).expect("extractor");
    let extraction = extractor
        .extract(&ByteSource::from_path(&input))
        .expect("extract");
    assert_eq!(extraction.stats.arrays_found, 2);
    assert_eq!(extraction.stats.records_processed, 3);
    assert_eq!(
        extraction.results.sorted(),
        vec![EMPIRE_PPO, "https://empirebcbs.mrf.bcbs.com/b.json.gz"]
    );
}

#[test]
fn truncated_gzip_aborts_without_output() {
    let temp = TempDir::new().expect("tempdir");
    let records: Vec<String> = (0..2_000)
        .map(|i| {
            format!(
                r#"{{"description": "PPO {i}", "location": "https://empirebcbs.mrf.bcbs.com/{i}.json.gz"}}"#
            )
        })
        .collect();
    let full = write_gz(temp.path(), "full.json.gz", &index_doc(&records.join(",")));
    let bytes = fs::read(&full).expect("read fixture");
    let truncated = temp.path().join("truncated.json.gz");
    fs::write(&truncated, &bytes[..bytes.len() / 2]).expect("write truncated");
    let output = temp.path().join("urls.txt");

    let err = run(&truncated, &output).expect_err("truncated gzip must fail");
    assert!(
        matches!(err, ExtractError::SourceCorrupt { .. }),
        "unexpected error: {err}"
    );
    assert!(!err.is_malformed_input());
    assert!(!output.exists());
}

#[test]
fn corrupt_gzip_header_is_source_unavailable() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_gz(temp.path(), "index.json.gz", &index_doc(""));
    let mut bytes = fs::read(&input).expect("read fixture");
    bytes[2] = 0;
    fs::write(&input, bytes).expect("write corrupt fixture");
    let output = temp.path().join("urls.txt");

    let err = run(&input, &output).expect_err("corrupt header must fail");
    assert!(
        matches!(err, ExtractError::SourceUnavailable { .. }),
        "unexpected error: {err}"
    );
    assert!(!output.exists());
}

#[test]
fn missing_input_is_source_unavailable() {
    let temp = TempDir::new().expect("tempdir");
    let output = temp.path().join("urls.txt");
    let err = run(&temp.path().join("absent.json.gz"), &output).expect_err("missing input");
    assert!(matches!(err, ExtractError::SourceUnavailable { .. }));
    assert!(!output.exists());
}

#[test]
fn memory_does_not_scale_with_ignored_data() {
    // ~9 MB of sibling data that the locator has to walk through.
    let filler: Vec<String> = (0..50_000)
        .map(|i| {
            format!(
                r#"{{"negotiated_rates": [{{"provider_references": [{i}, {}], "negotiated_prices": [{{"negotiated_type": "negotiated", "negotiated_rate": 123.45, "expiration_date": "9999-12-31"}}]}}], "billing_code": "{i:05}"}}"#,
                i + 1
            )
        })
        .collect();
    let json = format!(
        r#"{{"provider_references": [{}], "in_network_files": [{{"description": "PPO", "location": "{EMPIRE_PPO}"}}]}}"#,
        filler.join(",")
    );
    assert!(json.len() > 8 * 1024 * 1024);

    let extractor = Extractor::new(ExtractConfig::default()).expect("extractor");
    let extraction = extractor
        .extract_from_reader(std::io::BufReader::new(json.as_bytes()))
        .expect("extract");

    assert_eq!(extraction.stats.bytes_read, json.len() as u64);
    assert_eq!(extraction.stats.records_processed, 1);
    let record_len = format!(r#"{{"description": "PPO", "location": "{EMPIRE_PPO}"}}"#).len();
    assert_eq!(extraction.stats.peak_record_bytes, record_len);
}

#[test]
fn sink_failure_is_reported_after_processing() {
    struct Broken;
    impl ResultSink for Broken {
        fn write(&mut self, _: &ResultSet) -> mrf_extractor::Result<usize> {
            Err(ExtractError::sink_unavailable(
                "/dev/full",
                std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            ))
        }
    }

    let temp = TempDir::new().expect("tempdir");
    let input = write_gz(temp.path(), "index.json.gz", &index_doc(""));
    let extractor = Extractor::new(ExtractConfig::default()).expect("extractor");
    let err = extractor
        .run(&ByteSource::from_path(&input), &mut Broken)
        .expect_err("sink failure must propagate");
    assert!(matches!(err, ExtractError::SinkUnavailable { .. }));
}
