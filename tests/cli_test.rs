use std::io::Write;
use std::process::{Command, Output, Stdio};

fn decrpn(args: &[&str]) -> Output {
	Command::new(env!("CARGO_BIN_EXE_decrpn")).args(args).output().unwrap()
}

fn text(bytes: &[u8]) -> &str {
	std::str::from_utf8(bytes).unwrap()
}

#[test]
fn test_success_exits_zero() {
	let out = decrpn(&["3", "4", "+", "print"]);
	assert!(out.status.success());
	assert_eq!(text(&out.stdout), "7\n");
	assert_eq!(text(&out.stderr), "");
}

#[test]
fn test_unprinted_stack_is_silent() {
	let out = decrpn(&["1", "2"]);
	assert!(out.status.success());
	assert_eq!(text(&out.stdout), "");
}

#[test]
fn test_parse_error_exits_one() {
	let out = decrpn(&["1", "print", "bogus"]);
	assert_eq!(out.status.code(), Some(1));
	assert_eq!(text(&out.stdout), "1\n");
	assert_eq!(text(&out.stderr), "! 2: Cannot parse bogus\n");
}

#[cfg(unix)]
#[test]
fn test_non_utf8_arg_exits_one() {
	use std::ffi::OsStr;
	use std::os::unix::ffi::OsStrExt;
	let out = Command::new(env!("CARGO_BIN_EXE_decrpn"))
		.args([OsStr::new("1"), OsStr::new("print"), OsStr::from_bytes(b"\xff")])
		.output()
		.unwrap();
	assert_eq!(out.status.code(), Some(1));
	assert_eq!(text(&out.stdout), "1\n");
	assert_eq!(text(&out.stderr), "! 2: Cannot parse \u{fffd}\n");

	let out = Command::new(env!("CARGO_BIN_EXE_decrpn")).arg(OsStr::from_bytes(b"\xff")).output().unwrap();
	assert_eq!(out.status.code(), Some(1));
	assert_eq!(text(&out.stderr), "! 0: Cannot parse \u{fffd}\n");
}

#[test]
fn test_stdin_not_utf8() {
	let mut child = Command::new(env!("CARGO_BIN_EXE_decrpn"))
		.arg("-")
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.spawn()
		.unwrap();
	child.stdin.take().unwrap().write_all(b"1 print \xff 2\n").unwrap();
	let out = child.wait_with_output().unwrap();
	assert_eq!(out.status.code(), Some(1));
	assert_eq!(text(&out.stdout), "1\n");
	assert_eq!(text(&out.stderr), "! 2: Cannot parse \u{fffd}\n");
}

#[test]
fn test_underflow_exits_one() {
	let out = decrpn(&["+"]);
	assert_eq!(out.status.code(), Some(1));
	assert_eq!(text(&out.stderr), "! +: need at least two args on stack\n");
}

#[test]
fn test_no_args_prints_usage() {
	let out = decrpn(&[]);
	assert_eq!(out.status.code(), Some(1));
	assert_eq!(text(&out.stdout), "");
	let err = text(&out.stderr);
	assert!(err.starts_with("Usage: decrpn op op ..."));
	assert!(err.contains("dumpstk"));
	assert!(err.contains("fma"));
}

#[test]
fn test_stdin_mode() {
	let mut child = Command::new(env!("CARGO_BIN_EXE_decrpn"))
		.arg("-")
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.spawn()
		.unwrap();
	child.stdin.take().unwrap().write_all(b"2 3\n4 fma\nprint 42 hex:\n").unwrap();
	let out = child.wait_with_output().unwrap();
	assert!(out.status.success());
	assert_eq!(text(&out.stdout), "10\n31c0:0000:0000:002a\n");
}

#[test]
fn test_stdin_mode_ignores_other_args() {
	let mut child = Command::new(env!("CARGO_BIN_EXE_decrpn"))
		.args(["-", "bogus"])
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.spawn()
		.unwrap();
	child.stdin.take().unwrap().write_all(b"5 print").unwrap();
	let out = child.wait_with_output().unwrap();
	assert!(out.status.success());
	assert_eq!(text(&out.stdout), "5\n");
}
