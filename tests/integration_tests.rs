use std::fs;
use std::path::PathBuf;
use std::process::Command;

fn clonotrack_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_clonotrack"))
}

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn cli_help_flag() {
    let output = clonotrack_cmd()
        .arg("--help")
        .output()
        .expect("Failed to execute");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("clonotrack"));
    assert!(stdout.contains("filter"));
    assert!(stdout.contains("analyze"));
}

#[test]
fn cli_version_flag() {
    let output = clonotrack_cmd()
        .arg("--version")
        .output()
        .expect("Failed to execute");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn cli_missing_args() {
    let output = clonotrack_cmd()
        .arg("filter")
        .output()
        .expect("Failed to execute");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("required") || stderr.contains("Usage"));
}

#[test]
fn cli_invalid_chain() {
    let output = clonotrack_cmd()
        .arg("filter")
        .arg(fixture_path("parsed.tsv"))
        .arg("2")
        .arg("gamma")
        .output()
        .expect("Failed to execute");
    assert!(!output.status.success());
}

#[test]
fn cli_filter_beta_to_stdout() {
    let output = clonotrack_cmd()
        .arg("--quiet")
        .arg("filter")
        .arg(fixture_path("parsed.tsv"))
        .arg("2")
        .arg("beta")
        .output()
        .expect("Failed to execute");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout,
        "epitope\tsubject\tcdr3a\tcdr3b\n\
         NAI\ts1\tCAVRDGGYQKVTF\tCASSLGQGYTF\n\
         NAI\ts1\tCAVSDGGYQKVTF\tCASSLGQGYTF\n\
         NAI\ts3\tCAAFDNYGQNFVF\tCASSLGQGYTF\n"
    );
}

#[test]
fn cli_filter_alpha_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("alpha.tsv");
    let output = clonotrack_cmd()
        .arg("filter")
        .arg(fixture_path("parsed.tsv"))
        .arg("2")
        .arg("alpha")
        .arg("--output")
        .arg(&out)
        .output()
        .expect("Failed to execute");
    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let written = fs::read_to_string(&out).unwrap();
    let cdr3a: Vec<_> = written
        .lines()
        .skip(1)
        .map(|l| l.split('\t').nth(2).unwrap())
        .collect();
    assert_eq!(
        cdr3a,
        vec![
            "CAVRDGGYQKVTF",
            "CAVRDGGYQKVTF",
            "CAAFDNYGQNFVF",
            "CAAFDNYGQNFVF"
        ]
    );
}

#[test]
fn cli_filter_missing_column_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("no_cdr3.tsv");
    fs::write(&input, "id\tcount\n1\t4\n").unwrap();

    let output = clonotrack_cmd()
        .arg("filter")
        .arg(&input)
        .arg("1")
        .arg("beta")
        .output()
        .expect("Failed to execute");
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("beta"));
}

#[test]
fn cli_analyze_writes_six_tables() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("cohort");
    let output = clonotrack_cmd()
        .arg("analyze")
        .arg(fixture_path("cohort"))
        .arg("--prefix")
        .arg(&prefix)
        .output()
        .expect("Failed to execute");
    assert!(output.status.success());

    let read = |name: &str| fs::read_to_string(dir.path().join(name)).unwrap();
    assert_eq!(read("cohort_public_nt.txt"), "AA_SEQ\tNUM_NT\nGAGY\t3\n");
    assert_eq!(
        read("cohort_private_nt.txt"),
        "AA_SEQ\tNUM_NT\nCASS\t1\nCAWF\t1\n"
    );
    assert_eq!(read("cohort_public_gly.txt"), "AA_SEQ\tNUM_GLY\nGAGY\t2\n");
    assert_eq!(
        read("cohort_private_gly.txt"),
        "AA_SEQ\tNUM_GLY\nCASS\t0\nCAWF\t0\n"
    );
    assert_eq!(
        read("cohort_public_ins.txt"),
        "DNA_SEQ\tAA_SEQ\tNUM_INS\nGGAGCAGGATAT\tGAGY\t2\nGGTGCTGGCTAC\tGAGY\t3\n"
    );
    assert_eq!(
        read("cohort_private_ins.txt"),
        "DNA_SEQ\tAA_SEQ\tNUM_INS\nTGTGCATGGTTT\tCAWF\t4\nTGTGCCAGCAGC\tCASS\t3\n"
    );
}

#[test]
fn cli_analyze_doubled_n1() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("cohort");
    let output = clonotrack_cmd()
        .arg("analyze")
        .arg(fixture_path("cohort"))
        .arg("--prefix")
        .arg(&prefix)
        .arg("--insertions")
        .arg("doubled-n1")
        .output()
        .expect("Failed to execute");
    assert!(output.status.success());

    let public = fs::read_to_string(dir.path().join("cohort_public_ins.txt")).unwrap();
    assert_eq!(
        public,
        "DNA_SEQ\tAA_SEQ\tNUM_INS\nGGAGCAGGATAT\tGAGY\t2\nGGTGCTGGCTAC\tGAGY\t4\n"
    );
}

#[test]
fn cli_analyze_empty_folder_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = clonotrack_cmd()
        .arg("analyze")
        .arg(dir.path())
        .output()
        .expect("Failed to execute");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no .tsv files"));
}

#[test]
fn cli_pair_reads() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("paired.tsv");
    let output = clonotrack_cmd()
        .arg("pair")
        .arg(fixture_path("reads.fa"))
        .arg(fixture_path("reads.qual"))
        .arg(&out)
        .arg("donor7")
        .output()
        .expect("Failed to execute");
    assert!(output.status.success());

    let written = fs::read_to_string(&out).unwrap();
    assert_eq!(
        written,
        "id\tepitope\tsubject\ta_nucseq\tb_nucseq\ta_quals\tb_quals\n\
         NAI01\tNAI\tdonor7\tACGTACGTACGT\tTTGGCCAA\t\
         30.31.32.33.34.35.36.37.38.39.40.41\t20.21.22.23.24.25.26.27\n"
    );
}

#[test]
fn cli_count_json() {
    let output = clonotrack_cmd()
        .arg("count")
        .arg(fixture_path("parsed.tsv"))
        .arg("beta")
        .arg("--format")
        .arg("json")
        .arg("--min-count")
        .arg("2")
        .output()
        .expect("Failed to execute");
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        parsed,
        serde_json::json!([{"sequence": "CASSLGQGYTF", "count": 3}])
    );
}

#[test]
fn cli_count_tsv() {
    let output = clonotrack_cmd()
        .arg("count")
        .arg(fixture_path("parsed.tsv"))
        .arg("alpha")
        .output()
        .expect("Failed to execute");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout,
        "CAAFDNYGQNFVF\t2\nCAVRDGGYQKVTF\t2\nCAVSDGGYQKVTF\t1\n"
    );
}
