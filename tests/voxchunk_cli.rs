use std::process::Command;

fn combined_output(output: &std::process::Output) -> String {
    let mut combined = String::new();
    combined.push_str(&String::from_utf8_lossy(&output.stdout));
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}

fn voxchunk_bin() -> &'static str {
    option_env!("CARGO_BIN_EXE_voxchunk").expect("voxchunk test binary not built")
}

#[test]
fn help_mentions_name() {
    let output = Command::new(voxchunk_bin())
        .arg("--help")
        .output()
        .expect("run voxchunk --help");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("voxchunk"));
}

#[test]
fn list_input_devices_prints_message() {
    let output = Command::new(voxchunk_bin())
        .arg("--list-input-devices")
        .output()
        .expect("run voxchunk --list-input-devices");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(
        combined.contains("audio input devices")
            || combined.contains("Failed to list audio input devices")
    );
}

#[test]
fn zero_seconds_is_rejected_before_any_capture() {
    let output = Command::new(voxchunk_bin())
        .args(["--seconds", "0"])
        .output()
        .expect("run voxchunk --seconds 0");
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("--seconds"));
}

#[test]
fn out_of_range_chunk_secs_is_rejected_before_any_capture() {
    let output = Command::new(voxchunk_bin())
        .args(["--chunk-secs", "100000"])
        .output()
        .expect("run voxchunk --chunk-secs 100000");
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("--chunk-secs"));
}
