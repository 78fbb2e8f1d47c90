#![allow(dead_code)]
use decrpn::{IOTriple, State};

/// Runs tokens on a fresh state, returns stdout with any error appended as `! msg`.
pub fn run(tokens: &str) -> String {
	run_on(&mut State::default(), tokens)
}

pub fn run_on(st: &mut State, tokens: &str) -> String {
	let mut input: &[u8] = b"";
	let mut output = Vec::new();
	let mut error = Vec::new();
	let res = decrpn::exec(
		st,
		&mut IOTriple {input: &mut input, output: &mut output, error: &mut error},
		tokens.split_whitespace(),
	);
	render(output, res)
}

/// Same, but tokens come through the input stream.
pub fn run_input(text: impl AsRef<[u8]>) -> String {
	let mut input = text.as_ref();
	let mut output = Vec::new();
	let mut error = Vec::new();
	let res = decrpn::exec_input(
		&mut State::default(),
		&mut IOTriple {input: &mut input, output: &mut output, error: &mut error},
	);
	render(output, res)
}

fn render(output: Vec<u8>, res: Result<(), decrpn::Error>) -> String {
	let mut s = String::from_utf8(output).unwrap();
	if let Err(e) = res {
		s.push_str(&format!("! {}\n", e));
	}
	s
}
