use std::process::{Command, Output};

fn riverford(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_riverford"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to launch riverford binary")
}

#[test]
fn scripted_build_draws_the_bridge_on_the_bundled_map() {
    let output = riverford(&["--action", "build:6,5"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "riverford should exit cleanly");
    assert!(
        stdout.starts_with("Welcome to Riverford."),
        "banner comes first, got:\n{stdout}"
    );
    assert!(
        stdout.contains("built Land bridge of 7 tiles"),
        "commit should be reported, got:\n{stdout}"
    );
    assert!(
        stdout.contains("o-----o"),
        "rendered map should show ramps around the deck, got:\n{stdout}"
    );
}

#[test]
fn unknown_action_fails_before_touching_the_map() {
    let output = riverford(&["--action", "jump:1,1"]);

    assert!(!output.status.success(), "unknown verbs should be rejected");
    assert!(
        output.stdout.is_empty(),
        "nothing should be printed when arguments are invalid"
    );
}
