use std::process::Command;

#[test]
fn terminal_headless_smoke() {
    let bin = env!("CARGO_BIN_EXE_bracetopia");
    let mut cmd = Command::new(bin);
    cmd.args(["-d", "11", "-t", "1000"])
        .env("BRACETOPIA_TERMINAL_HEADLESS", "1")
        .env("BRACETOPIA_TERMINAL_HEADLESS_FRAMES", "6")
        .env_remove("BRACETOPIA_TERMINAL_HEADLESS_REPORT")
        .env("TERM", "xterm-256color")
        .env("RUST_LOG", "off");

    let output = cmd.output().expect("failed to run bracetopia binary");
    assert!(output.status.success(), "terminal headless run failed");
    assert!(output.stdout.is_empty());
}
