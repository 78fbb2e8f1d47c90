use std::fmt;
use std::ffi::OsStr;
use std::io::{Write, BufRead};
use phf::phf_ordered_map;
#[macro_use]
extern crate lazy_static;

pub mod decimal;
pub mod math;
pub use decimal::Decimal64;

///default stack capacity, in values
pub const STACK_SIZE: usize = 1 << 20;

///everything that ends a run early
#[derive(Debug)]
pub enum Error {
	///operator needs more operands than the stack holds
	StackUnderflow {op: String, need: u8},
	///push beyond the fixed capacity
	StackOverflow {op: String, cap: usize},
	///token is neither registered nor a decimal literal
	ParseError {index: usize, token: String},
	///malformed hex literal or memory store
	SyntaxError(String),
	///reading tokens or writing output failed
	Io(std::io::Error),
}
impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::StackUnderflow {op, need} => write!(f, "{op}: need at least {} on stack", match need {
				1 => "one arg",
				2 => "two args",
				_ => "three args"
			}),
			Self::StackOverflow {op, cap} => write!(f, "{op}: stack overflow (capacity {cap})"),
			Self::ParseError {index, token} => write!(f, "{index}: Cannot parse {token}"),
			Self::SyntaxError(msg) => f.write_str(msg),
			Self::Io(err) => write!(f, "I/O error: {err}"),
		}
	}
}
impl std::error::Error for Error {}
impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

/*----------------------
	EVALUATION STACK
----------------------*/
///Fixed-capacity stack, allocated once.
///
///Grows downward: `bos` (bottom of stack) starts at the capacity and the top value lives at `buf[bos]`.
pub struct Stack {
	buf: Box<[Decimal64]>,
	bos: usize
}
impl Stack {
	pub fn new(cap: usize) -> Self {
		Self {
			buf: vec![Decimal64::ZERO; cap].into_boxed_slice(),
			bos: cap
		}
	}

	pub fn capacity(&self) -> usize {
		self.buf.len()
	}

	pub fn depth(&self) -> usize {
		self.buf.len() - self.bos
	}

	pub fn is_empty(&self) -> bool {
		self.bos == self.buf.len()
	}

	pub fn peek(&self) -> Option<Decimal64> {
		self.buf.get(self.bos).copied()
	}

	///bottom to top
	pub fn iter(&self) -> impl Iterator<Item = &Decimal64> {
		self.buf[self.bos..].iter().rev()
	}

	#[inline(always)]
	///check that `op` has `n` operands available
	fn need(&self, op: &str, n: u8) -> Result<(), Error> {
		if self.depth() < n as usize {
			Err(Error::StackUnderflow {op: op.into(), need: n})
		}
		else {Ok(())}
	}

	pub fn push(&mut self, op: &str, v: Decimal64) -> Result<(), Error> {
		if self.bos == 0 {
			return Err(Error::StackOverflow {op: op.into(), cap: self.capacity()});
		}
		self.bos -= 1;
		self.buf[self.bos] = v;
		Ok(())
	}

	pub fn pop(&mut self, op: &str) -> Result<Decimal64, Error> {
		self.need(op, 1)?;
		let v = self.buf[self.bos];
		self.bos += 1;
		Ok(v)
	}

	pub fn dup(&mut self, op: &str) -> Result<(), Error> {
		self.need(op, 1)?;
		self.push(op, self.buf[self.bos])
	}

	///replace the top with f(top)
	pub fn unary(&mut self, op: &str, f: fn(Decimal64) -> Decimal64) -> Result<(), Error> {
		self.need(op, 1)?;
		self.buf[self.bos] = f(self.buf[self.bos]);
		Ok(())
	}

	///`a b` -> f(a, b), result takes the slot of `a`
	pub fn binary(&mut self, op: &str, f: fn(Decimal64, Decimal64) -> Decimal64) -> Result<(), Error> {
		self.need(op, 2)?;
		let b = self.buf[self.bos];
		self.bos += 1;
		self.buf[self.bos] = f(self.buf[self.bos], b);
		Ok(())
	}

	///`a b c` -> f(a, b, c), result takes the slot of `a`
	pub fn ternary(&mut self, op: &str, f: fn(Decimal64, Decimal64, Decimal64) -> Decimal64) -> Result<(), Error> {
		self.need(op, 3)?;
		let c = self.buf[self.bos];
		let b = self.buf[self.bos + 1];
		self.bos += 2;
		self.buf[self.bos] = f(self.buf[self.bos], b, c);
		Ok(())
	}
}

///Bundled state storage for one run
pub struct State {
	///evaluation stack
	stk: Stack,
	///memory cells A-Z
	mem: [Decimal64; 26]
}
impl Default for State {
	///stack of `STACK_SIZE` values, all memory cells +0
	fn default() -> Self {
		Self::with_capacity(STACK_SIZE)
	}
}
impl State {
	///custom stack capacity
	pub fn with_capacity(cap: usize) -> Self {
		Self {
			stk: Stack::new(cap),
			mem: [Decimal64::ZERO; 26]
		}
	}

	///custom initial memory cells, `cells[0]` is `A`
	pub fn custom_memory(mut self, cells: [Decimal64; 26]) -> Self {
		self.mem = cells;
		self
	}

	pub fn stack(&self) -> &Stack {
		&self.stk
	}

	///current value of memory cell `A`..`Z`
	pub fn cell(&self, name: char) -> Option<Decimal64> {
		if name.is_ascii_uppercase() {Some(self.mem[name as usize - 'A' as usize])} else {None}
	}
}

/*-------------------------
	OPERATION REGISTRY
-------------------------*/
///stack access for commands that aren't pure functions
pub type Action = fn(&mut State, &mut IOTriple<'_>, &str) -> Result<(), Error>;

///registry entry
#[derive(Clone, Copy)]
pub enum Op {
	Constant(Decimal64),
	Unary(fn(Decimal64) -> Decimal64),
	Binary(fn(Decimal64, Decimal64) -> Decimal64),
	Ternary(fn(Decimal64, Decimal64, Decimal64) -> Decimal64),
	Action(Action),
}

///every named token, in help banner order
pub static OPS: phf::OrderedMap<&'static str, Op> = phf_ordered_map! {
	/*---------------
		CONSTANTS
	---------------*/
	"pi" => Op::Constant(Decimal64::PI),
	"π" => Op::Constant(Decimal64::PI),
	"e" => Op::Constant(Decimal64::E),
	"inf" => Op::Constant(Decimal64::INFINITY),
	"-inf" => Op::Constant(Decimal64::NEG_INFINITY),
	"nan" => Op::Constant(Decimal64::NAN),
	/*-------------
		ACTIONS
	-------------*/
	"dumpstk" => Op::Action(dumpstk),
	"dup" => Op::Action(dup),
	"hex" => Op::Action(hex),
	"hex:" => Op::Action(hex_grouped),
	"pop" => Op::Action(pop),
	"print" => Op::Action(print),
	"?" => Op::Action(print),
	/*-----------
		UNARY
	-----------*/
	"not" => Op::Unary(math::not),
	"!" => Op::Unary(math::not),
	"acos" => Op::Unary(math::acos),
	"asin" => Op::Unary(math::asin),
	"atan" => Op::Unary(math::atan),
	"cos" => Op::Unary(math::cos),
	"sin" => Op::Unary(math::sin),
	"tan" => Op::Unary(math::tan),
	"cosh" => Op::Unary(math::cosh),
	"sinh" => Op::Unary(math::sinh),
	"tanh" => Op::Unary(math::tanh),
	"acosh" => Op::Unary(math::acosh),
	"asinh" => Op::Unary(math::asinh),
	"atanh" => Op::Unary(math::atanh),
	"exp" => Op::Unary(math::exp),
	"log" => Op::Unary(math::log),
	"log10" => Op::Unary(math::log10),
	"expm1" => Op::Unary(math::expm1),
	"log1p" => Op::Unary(math::log1p),
	"logb" => Op::Unary(math::logb),
	"exp2" => Op::Unary(math::exp2),
	"log2" => Op::Unary(math::log2),
	"sqrt" => Op::Unary(math::sqrt),
	"cbrt" => Op::Unary(math::cbrt),
	"ceil" => Op::Unary(math::ceil),
	"fabs" => Op::Unary(math::fabs),
	"floor" => Op::Unary(math::floor),
	"erf" => Op::Unary(math::erf),
	"erfc" => Op::Unary(math::erfc),
	"lgamma" => Op::Unary(math::lgamma),
	"tgamma" => Op::Unary(math::tgamma),
	"rint" => Op::Unary(math::rint),
	"nearbyint" => Op::Unary(math::nearbyint),
	"round" => Op::Unary(math::round),
	"roundeven" => Op::Unary(math::roundeven),
	"trunc" => Op::Unary(math::trunc),
	"quantum" => Op::Unary(math::quantum),
	/*------------
		BINARY
	------------*/
	"=" => Op::Binary(math::eq),
	"==" => Op::Binary(math::eq),
	"!=" => Op::Binary(math::ne),
	"<" => Op::Binary(math::lt),
	"{" => Op::Binary(math::lt),
	"<=" => Op::Binary(math::le),
	"{=" => Op::Binary(math::le),
	">=" => Op::Binary(math::ge),
	"}=" => Op::Binary(math::ge),
	">" => Op::Binary(math::gt),
	"}" => Op::Binary(math::gt),
	"+" => Op::Binary(math::add),
	"-" => Op::Binary(math::sub),
	"*" => Op::Binary(math::mul),
	"/" => Op::Binary(math::div),
	"^" => Op::Binary(math::pow),
	"atan2" => Op::Binary(math::atan2),
	"pow" => Op::Binary(math::pow),
	"hypot" => Op::Binary(math::hypot),
	"fmod" => Op::Binary(math::fmod),
	"copysign" => Op::Binary(math::copysign),
	"nextafter" => Op::Binary(math::nextafter),
	"remainder" => Op::Binary(math::remainder),
	"fdim" => Op::Binary(math::fdim),
	"fmax" => Op::Binary(math::fmax),
	"fmin" => Op::Binary(math::fmin),
	"quantize" => Op::Binary(math::quantize),
	/*-------------
		TERNARY
	-------------*/
	"fma" => Op::Ternary(math::fma),
};

/*-------------
	ACTIONS
-------------*/
///print the whole stack bottom to top, unchanged
fn dumpstk(st: &mut State, io: &mut IOTriple<'_>, _op: &str) -> Result<(), Error> {
	let items: Vec<String> = st.stk.iter().map(Decimal64::to_string).collect();
	writeln!(io.output, "[{}]", items.join(" "))?;
	Ok(())
}

fn dup(st: &mut State, _io: &mut IOTriple<'_>, op: &str) -> Result<(), Error> {
	st.stk.dup(op)
}

fn pop(st: &mut State, _io: &mut IOTriple<'_>, op: &str) -> Result<(), Error> {
	st.stk.pop(op).map(|_| ())
}

///pop and print as decimal text
fn print(st: &mut State, io: &mut IOTriple<'_>, op: &str) -> Result<(), Error> {
	let v = st.stk.pop(op)?;
	writeln!(io.output, "{v}")?;
	io.output.flush()?;
	Ok(())
}

///pop and print the bit pattern
fn hex(st: &mut State, io: &mut IOTriple<'_>, op: &str) -> Result<(), Error> {
	let v = st.stk.pop(op)?;
	writeln!(io.output, "{}", v.to_hex(false))?;
	io.output.flush()?;
	Ok(())
}

///pop and print the bit pattern in 2-byte groups
fn hex_grouped(st: &mut State, io: &mut IOTriple<'_>, op: &str) -> Result<(), Error> {
	let v = st.stk.pop(op)?;
	writeln!(io.output, "{}", v.to_hex(true))?;
	io.output.flush()?;
	Ok(())
}

/*-----------------
	HELP BANNER
-----------------*/
const USAGE: &str = r##"Usage: decrpn op op ...
       decrpn -

Decimal64 RPN calculator

-  = read op op ... from stdin
op = one of:
  [±]d…d.d…d[e[±]d…d] (a decimal number)
  @<16 hex digits and :'s> (encoded big-endian decimal64 bits)
    - e.g.: @31c0:0000:0000:002a = 42 (:'s optional)
  [±]inf, nan
  +, -, *, /, ^, !
  =, == (same as =), !=, <, <=, >, >=
  {, {=, }, }= (same as <, <=, >, >=, but no need to escape on cmdline)
  ?, print (pop and print)
  hex (pop and print encoded big-endian decimal64 bits)
  hex: (same, with : separators)
  [A-Z]= (pop into memory cell A...Z)
  [A-Z] (push memory cell A...Z)
"##;

///Usage text followed by every registered name, grouped by kind and wrapped at 64 columns.
pub fn usage() -> String {
	let sections: [(&str, fn(&Op) -> bool); 5] = [
		("constants", |op| matches!(op, Op::Constant(_))),
		("actions", |op| matches!(op, Op::Action(_))),
		("unary operations", |op| matches!(op, Op::Unary(_))),
		("binary operations", |op| matches!(op, Op::Binary(_))),
		("ternary operations", |op| matches!(op, Op::Ternary(_))),
	];
	let mut out = String::from(USAGE);
	for (title, is_kind) in sections {
		out.push_str(&format!("\n  {title}:\n    "));
		let mut col = 4;
		for (name, _) in OPS.entries().filter(|(_, op)| is_kind(op)) {
			let w = name.chars().count() + 2;
			let first = col == 4;
			col += w;
			if col >= 64 {
				out.push_str("\n    ");
				col = 4 + w;
			}
			else if !first {
				out.push_str(", ");
			}
			out.push_str(name);
		}
	}
	out.push('\n');
	out
}

/*---------------------
	TOKEN DISPATCHER
---------------------*/
///Bundle of generic IO streams, for brevity.
pub struct IOTriple<'a> {
	pub input: &'a mut dyn BufRead,
	pub output: &'a mut dyn Write,
	pub error: &'a mut dyn Write
}
#[macro_export]
///Default IO triple using stdin, stdout, stderr
macro_rules! stdio {
	() => {
		::decrpn::IOTriple {
			input: &mut ::std::io::BufReader::new(::std::io::stdin()),
			output: &mut ::std::io::stdout(),
			error: &mut ::std::io::stderr()
		}
	}
}

///Applies one token to the state; `index` is its 0-based position in the token stream.
///
///Resolution order, first match wins:
///1. `@` + 16 hex digits (`:` allowed anywhere): push that bit pattern
///2. `A=`..`Z=`: pop into memory cell
///3. `A`..`Z`: push memory cell
///4. registered constant, unary/binary/ternary function or action
///5. decimal literal
pub fn exec_token(st: &mut State, io: &mut IOTriple<'_>, index: usize, token: &str) -> Result<(), Error> {
	if let Some(digits) = token.strip_prefix('@') {
		let v = Decimal64::from_hex(digits)
			.map_err(|err| Error::SyntaxError(format!("unable to parse {token} ({err})")))?;
		return st.stk.push(token, v);
	}
	match token.as_bytes() {
		[cell @ b'A'..=b'Z', mark] => {
			if *mark != b'=' {
				return Err(Error::SyntaxError(format!("{token}: expected = after memory cell name")));
			}
			st.mem[(cell - b'A') as usize] = st.stk.pop(token)?;
			return Ok(());
		}
		[cell @ b'A'..=b'Z'] => {
			let v = st.mem[(cell - b'A') as usize];
			return st.stk.push(token, v);
		}
		_ => {}
	}
	match OPS.get(token) {
		Some(Op::Constant(c)) => st.stk.push(token, *c),
		Some(Op::Unary(f)) => st.stk.unary(token, *f),
		Some(Op::Binary(f)) => st.stk.binary(token, *f),
		Some(Op::Ternary(f)) => st.stk.ternary(token, *f),
		Some(Op::Action(f)) => f(st, io, token),
		None => match Decimal64::parse(token) {
			Some(v) => st.stk.push(token, v),
			None => Err(Error::ParseError {index, token: token.into()})
		}
	}
}

///Executes tokens in order on given state, stops at the first error.
///
///Tokens that aren't valid UTF-8 fail with `ParseError` like any other unknown token.
pub fn exec<I, S>(st: &mut State, io: &mut IOTriple<'_>, tokens: I) -> Result<(), Error>
	where I: IntoIterator<Item = S>, S: AsRef<OsStr> {
	for (index, token) in tokens.into_iter().enumerate() {
		let token = token.as_ref();
		match token.to_str() {
			Some(text) => exec_token(st, io, index, text)?,
			None => {return Err(Error::ParseError {index, token: token.to_string_lossy().into_owned()});}
		}
	}
	Ok(())
}

///Executes words separated by ASCII whitespace, read from `io.input` until end of stream, stops at the first error.
pub fn exec_input(st: &mut State, io: &mut IOTriple<'_>) -> Result<(), Error> {
	let mut index = 0;
	let mut line = Vec::new();
	loop {
		line.clear();
		if io.input.read_until(b'\n', &mut line)? == 0 {
			return Ok(());
		}
		for word in line.split(u8::is_ascii_whitespace).filter(|w| !w.is_empty()) {
			match std::str::from_utf8(word) {
				Ok(text) => exec_token(st, io, index, text)?,
				Err(_) => {return Err(Error::ParseError {index, token: String::from_utf8_lossy(word).into_owned()});}
			}
			index += 1;
		}
	}
}
