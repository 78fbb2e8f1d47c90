use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;
use decrpn::{IOTriple, State, exec, exec_input, usage, stdio};

fn main() -> ExitCode {
	let args: Vec<OsString> = std::env::args_os().skip(1).collect();	//get args, skip name of binary
	let mut io = stdio!();

	let res = if args.is_empty() {
		Err(usage())
	}
	else {
		let mut st = State::default();
		let res = if args[0] == "-" {
			exec_input(&mut st, &mut io)
		}
		else {
			exec(&mut st, &mut io, &args)
		};
		res.map_err(|err| format!("! {err}\n"))
	};

	match res.map_err(|msg| report(&mut io, &msg)) {
		Ok(()) => ExitCode::SUCCESS,
		Err(_) => ExitCode::FAILURE,	//whether or not the message got out
	}
}

///results printed so far go out before the message
fn report(io: &mut IOTriple<'_>, msg: &str) -> std::io::Result<()> {
	let flushed = io.output.flush();
	io.error.write_all(msg.as_bytes())?;
	io.error.flush()?;
	flushed
}
