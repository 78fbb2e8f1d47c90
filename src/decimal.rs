use std::fmt;
use rug::{Integer, Complete};
use regex::Regex;

/*--------------------------------
	DECIMAL64 LAYOUT (BID)
	sign | combination | coefficient
--------------------------------*/
///significant digits
pub const DIGITS: i64 = 16;
///largest coefficient
pub const MAX_COEF: u64 = 9_999_999_999_999_999;
///smallest exponent of the integer coefficient (etiny)
pub const QMIN: i64 = -398;
///largest exponent of the integer coefficient
pub const QMAX: i64 = 369;
const BIAS: i64 = 398;

const SIGN: u64 = 1 << 63;
const SPECIAL_MASK: u64 = 0x7c00_0000_0000_0000;
const INF_BITS: u64 = 0x7800_0000_0000_0000;
const NAN_BITS: u64 = 0x7c00_0000_0000_0000;
const SNAN_BIT: u64 = 0x0200_0000_0000_0000;
const LARGE_COEF: u64 = 0x6000_0000_0000_0000;	//combination starts with 11

///exponents beyond this are treated as certain overflow/underflow while parsing
const HUGE_EXP: i64 = 1 << 40;

lazy_static! {
	///strtod-like literal: sign, integer digits, fraction digits, exponent
	static ref LITERAL: Regex = Regex::new(r"^([+-]?)(?:([0-9]+)(?:\.([0-9]*))?|\.([0-9]+))(?:[eE]([+-]?[0-9]+))?$").unwrap();
	///spelled-out specials
	static ref SPECIAL: Regex = Regex::new(r"^([+-]?)(?i:(inf(?:inity)?)|nan)$").unwrap();
}

///IEEE 754-2008 decimal64, stored as its BID bit pattern.
///
///Equality is bit-pattern identity (`nan == nan`, `0 != -0`),
///numeric comparison is `math::compare`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal64(u64);

///decoded view of a bit pattern
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parts {
	Nan {neg: bool},
	Inf {neg: bool},
	///value is (-1)^neg * coef * 10^exp
	Finite {neg: bool, coef: u64, exp: i64},
}

///10^n as an Integer
#[inline(always)]
pub(crate) fn pow10(n: u32) -> Integer {
	Integer::u_pow_u(10, n).complete()
}

///decimal digit count of a non-negative Integer
#[inline(always)]
pub(crate) fn digit_count(n: &Integer) -> i64 {
	if *n == 0 {1} else {n.to_string_radix(10).len() as i64}
}

impl Decimal64 {
	pub const ZERO: Self = Self::from_finite(false, 0, 0);
	pub const ONE: Self = Self::from_finite(false, 1, 0);
	pub const NAN: Self = Self(NAN_BITS);
	pub const INFINITY: Self = Self(INF_BITS);
	pub const NEG_INFINITY: Self = Self(SIGN | INF_BITS);
	pub const PI: Self = Self::from_finite(false, 3_141_592_653_589_793, -15);
	pub const E: Self = Self::from_finite(false, 2_718_281_828_459_045, -15);

	pub const fn from_bits(bits: u64) -> Self {
		Self(bits)
	}

	pub const fn to_bits(self) -> u64 {
		self.0
	}

	///encode a canonical finite value, caller guarantees `coef <= MAX_COEF` and `QMIN <= exp <= QMAX`
	pub const fn from_finite(neg: bool, coef: u64, exp: i64) -> Self {
		let e = (exp + BIAS) as u64;
		let sign = if neg {SIGN} else {0};
		if coef < 1 << 53 {
			Self(sign | e << 53 | coef)
		}
		else {
			Self(sign | LARGE_COEF | e << 51 | (coef & 0x0007_ffff_ffff_ffff))
		}
	}

	pub const fn infinity(neg: bool) -> Self {
		if neg {Self::NEG_INFINITY} else {Self::INFINITY}
	}

	pub fn parts(self) -> Parts {
		let b = self.0;
		let neg = b & SIGN != 0;
		match b & SPECIAL_MASK {
			NAN_BITS => {return Parts::Nan {neg};}
			INF_BITS => {return Parts::Inf {neg};}
			_ => {}
		}
		let (exp, coef) = if b & LARGE_COEF == LARGE_COEF {
			((b >> 51) & 0x3ff, 0x0020_0000_0000_0000 | (b & 0x0007_ffff_ffff_ffff))
		}
		else {
			((b >> 53) & 0x3ff, b & 0x001f_ffff_ffff_ffff)
		};
		Parts::Finite {
			neg,
			coef: if coef > MAX_COEF {0} else {coef},	//non-canonical coefficients read as zero
			exp: exp as i64 - BIAS
		}
	}

	pub fn is_nan(self) -> bool {
		self.0 & SPECIAL_MASK == NAN_BITS
	}

	pub fn is_sign_negative(self) -> bool {
		self.0 & SIGN != 0
	}

	pub fn is_zero(self) -> bool {
		matches!(self.parts(), Parts::Finite {coef: 0, ..})
	}

	///same pattern with the sign bit flipped
	pub fn negate(self) -> Self {
		Self(self.0 ^ SIGN)
	}

	///same pattern with the sign bit cleared
	pub fn abs(self) -> Self {
		Self(self.0 & !SIGN)
	}

	///same NaN with the signaling bit cleared
	pub fn quiet(self) -> Self {
		Self(self.0 & !SNAN_BIT)
	}

	///Round an exact result to decimal64, ties to even.
	///
	///`coef * 10^exp` is the magnitude; `sticky` marks nonzero digits lost below `coef`,
	///in which case `coef` must carry at least one digit more than the result keeps.
	///Overflow gives infinity, underflow gives subnormals or zero, zero keeps its sign.
	pub fn rounded(neg: bool, mut coef: Integer, mut exp: i64, sticky: bool) -> Self {
		if coef == 0 {
			return Self::from_finite(neg, 0, exp.clamp(QMIN, QMAX));
		}
		let digits = digit_count(&coef);
		let drop = (digits - DIGITS).max(QMIN - exp).max(0);
		if drop > digits {	//whole coefficient is below half of the last kept place
			return Self::from_finite(neg, 0, QMIN);
		}
		if drop > 0 {
			let (q, r) = coef.div_rem(pow10(drop as u32));
			let half = pow10(drop as u32 - 1) * 5_u32;
			let up = match r.cmp(&half) {
				std::cmp::Ordering::Greater => true,
				std::cmp::Ordering::Less => false,
				std::cmp::Ordering::Equal => sticky || q.is_odd(),
			};
			coef = q;
			if up {coef += 1;}
			exp += drop;
			if digit_count(&coef) > DIGITS {	//carried into a 17th digit
				coef /= 10;
				exp += 1;
			}
		}
		if exp > QMAX {
			let shift = exp - QMAX;
			if digit_count(&coef) + shift > DIGITS {
				return Self::infinity(neg);
			}
			coef *= pow10(shift as u32);	//fold the exponent into the coefficient
			exp = QMAX;
		}
		if coef == 0 {
			return Self::from_finite(neg, 0, exp.clamp(QMIN, QMAX));
		}
		Self::from_finite(neg, coef.to_u64_wrapping(), exp)
	}

	///Parse a decimal literal: `[±]digits[.digits][e[±]digits]`, `[±]inf`, `[±]infinity`, `[±]nan`.
	///
	///The literal keeps its quantum (`1.50` stays `150e-2`), excess digits round half to even.
	pub fn parse(src: &str) -> Option<Self> {
		if let Some(c) = SPECIAL.captures(src) {
			let neg = &c[1] == "-";
			return Some(
				if c.get(2).is_some() {Self::infinity(neg)}
				else if neg {Self::NAN.negate()}
				else {Self::NAN}
			);
		}
		let c = LITERAL.captures(src)?;
		let neg = &c[1] == "-";
		let int = c.get(2).map_or("", |m| m.as_str());
		let frac = c.get(3).or_else(|| c.get(4)).map_or("", |m| m.as_str());
		let exp = match c.get(5) {
			Some(m) => m.as_str().parse::<i64>().unwrap_or(	//absurdly long exponent, saturate
				if m.as_str().starts_with('-') {-HUGE_EXP} else {HUGE_EXP}
			).clamp(-HUGE_EXP, HUGE_EXP),
			None => 0
		};
		let coef = Integer::from_str_radix(&format!("{int}{frac}"), 10).ok()?;
		Some(Self::rounded(neg, coef, exp - frac.len() as i64, false))
	}

	///Decode 16 hex digits (big-endian bit pattern), `:` separators are skipped wherever they occur.
	pub fn from_hex(src: &str) -> Result<Self, HexError> {
		let mut bytes = [0_u8; 8];
		let mut n = 0;
		for (i, c) in src.chars().enumerate() {
			if c == ':' {continue;}
			let d = c.to_digit(16).ok_or(HexError::BadChar(i, c))? as u8;
			if n == 16 {return Err(HexError::TooMany);}
			bytes[n / 2] |= if n % 2 == 0 {d << 4} else {d};
			n += 1;
		}
		if n < 16 {
			return Err(HexError::TooFew);
		}
		Ok(Self(u64::from_be_bytes(bytes)))
	}

	///Encode as 16 lowercase hex digits (big-endian), optionally `:` between 2-byte groups.
	pub fn to_hex(self, grouped: bool) -> String {
		let mut s = String::with_capacity(19);
		for (i, b) in self.0.to_be_bytes().iter().enumerate() {
			if grouped && i > 0 && i % 2 == 0 {s.push(':');}
			s.push_str(&format!("{b:02x}"));
		}
		s
	}
}

///reasons a hex bit pattern is rejected
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HexError {
	///(element, character)
	BadChar(usize, char),
	TooFew,
	TooMany,
}
impl fmt::Display for HexError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::BadChar(i, c) => write!(f, "element {i}, '{c}', not hex digit or ':'"),
			Self::TooFew => write!(f, "not enough digits"),
			Self::TooMany => write!(f, "too many digits"),
		}
	}
}

///IEEE to-scientific-string, with `inf`/`nan` spelled the way they are typed
impl fmt::Display for Decimal64 {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let (neg, coef, exp) = match self.parts() {
			Parts::Nan {neg, ..} => {return f.write_str(if neg {"-nan"} else {"nan"});}
			Parts::Inf {neg} => {return f.write_str(if neg {"-inf"} else {"inf"});}
			Parts::Finite {neg, coef, exp} => (neg, coef, exp)
		};
		if neg {f.write_str("-")?;}
		let digits = coef.to_string();
		let adjusted = exp + digits.len() as i64 - 1;
		if exp <= 0 && adjusted >= -6 {	//plain notation
			let point = digits.len() as i64 + exp;
			if exp == 0 {
				f.write_str(&digits)
			}
			else if point > 0 {
				let (ipart, fpart) = digits.split_at(point as usize);
				write!(f, "{ipart}.{fpart}")
			}
			else {
				write!(f, "0.{}{digits}", "0".repeat(point.unsigned_abs() as usize))
			}
		}
		else {	//scientific notation
			let (head, tail) = digits.split_at(1);
			f.write_str(head)?;
			if !tail.is_empty() {write!(f, ".{tail}")?;}
			write!(f, "e{}{}", if adjusted < 0 {'-'} else {'+'}, adjusted.unsigned_abs())
		}
	}
}
impl fmt::Debug for Decimal64 {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} (@{})", self, self.to_hex(false))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn d(s: &str) -> Decimal64 {
		Decimal64::parse(s).unwrap()
	}

	#[test]
	fn known_patterns() {
		assert_eq!(Decimal64::from_hex("31c0000000000000").unwrap(), Decimal64::ZERO);
		assert_eq!(Decimal64::from_hex("31c0:0000:0000:002a").unwrap(), d("42"));
		assert_eq!(Decimal64::ONE.to_hex(false), "31c0000000000001");
		assert_eq!(Decimal64::INFINITY.to_hex(true), "7800:0000:0000:0000");
		assert_eq!(Decimal64::NAN.to_hex(false), "7c00000000000000");
		assert_eq!(d("-1").to_hex(false), "b1c0000000000001");
	}

	#[test]
	fn large_coefficient_form() {
		let max = d("9999999999999999");
		assert_eq!(max.to_hex(false), "6c7386f26fc0ffff");
		assert_eq!(max.parts(), Parts::Finite {neg: false, coef: MAX_COEF, exp: 0});
		assert_eq!(Decimal64::from_hex("6c7386f26fc0ffff").unwrap(), max);
	}

	#[test]
	fn hex_is_bit_exact() {
		for bits in [
			0x7c00_0000_0000_002a_u64,	//quiet NaN with payload
			0xfe00_0000_0000_0001,	//negative signaling NaN
			0xf800_0000_0000_0000,
			0xb1c0_0000_0000_0000,	//-0
			0x6fff_ffff_ffff_ffff,	//non-canonical coefficient
			0x0000_0000_0000_0001,	//smallest subnormal
		] {
			let v = Decimal64::from_bits(bits);
			assert_eq!(Decimal64::from_hex(&v.to_hex(false)).unwrap().to_bits(), bits);
			assert_eq!(Decimal64::from_hex(&v.to_hex(true)).unwrap().to_bits(), bits);
		}
	}

	#[test]
	fn hex_sweep() {
		//every sign and combination-field prefix, filled from a fixed LCG
		let mut x = 0x2545_f491_4f6c_dd1d_u64;
		for prefix in 0..64_u64 {
			for _ in 0..64 {
				x = x.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
				let bits = prefix << 58 | x >> 6;
				let v = Decimal64::from_bits(bits);
				assert_eq!(v.to_hex(false), format!("{bits:016x}"));
				assert_eq!(Decimal64::from_hex(&v.to_hex(true)).unwrap().to_bits(), bits);
				assert_eq!(Decimal64::from_hex(&format!("{bits:016X}")).unwrap().to_hex(false), format!("{bits:016x}"));
				if let Parts::Finite {coef, ..} = v.parts() {
					assert!(coef <= MAX_COEF, "{bits:016x}");
				}
			}
		}
	}

	#[test]
	fn hex_canonicalizes_text() {
		let v = Decimal64::from_hex("31C0:00:00::0000:002A").unwrap();
		assert_eq!(v.to_hex(false), "31c000000000002a");
		assert_eq!(v.to_hex(true), "31c0:0000:0000:002a");
	}

	#[test]
	fn hex_errors() {
		assert_eq!(Decimal64::from_hex("31c0"), Err(HexError::TooFew));
		assert_eq!(Decimal64::from_hex("31c00000000000000"), Err(HexError::TooMany));
		assert_eq!(Decimal64::from_hex("31c0:00x0"), Err(HexError::BadChar(7, 'x')));
		assert_eq!(
			HexError::BadChar(7, 'x').to_string(),
			"element 7, 'x', not hex digit or ':'"
		);
	}

	#[test]
	fn non_canonical_reads_as_zero() {
		let v = Decimal64::from_bits(0x6fff_ffff_ffff_ffff);
		assert!(v.is_zero());
	}

	#[test]
	fn parse_keeps_quantum() {
		assert_eq!(d("1.50").to_string(), "1.50");
		assert_eq!(d("1.50").parts(), Parts::Finite {neg: false, coef: 150, exp: -2});
		assert_eq!(d(".5").to_string(), "0.5");
		assert_eq!(d("1.").to_string(), "1");
		assert_eq!(d("-0").to_string(), "-0");
		assert_eq!(d("+7").to_string(), "7");
		assert_eq!(d("0.00").to_string(), "0.00");
	}

	#[test]
	fn scientific_layout() {
		assert_eq!(d("1e3").to_string(), "1e+3");
		assert_eq!(d("123e1").to_string(), "1.23e+3");
		assert_eq!(d("1.23e-7").to_string(), "1.23e-7");
		assert_eq!(d("0.000001").to_string(), "0.000001");
		assert_eq!(d("0.0000001").to_string(), "1e-7");
		assert_eq!(d("0e5").to_string(), "0e+5");
	}

	#[test]
	fn parse_specials() {
		assert_eq!(d("inf"), Decimal64::INFINITY);
		assert_eq!(d("-Infinity"), Decimal64::NEG_INFINITY);
		assert!(d("NaN").is_nan());
		assert!(d("-nan").is_sign_negative());
		assert_eq!(d("nan").to_string(), "nan");
	}

	#[test]
	fn parse_rejects() {
		for s in ["", ".", "e5", "1e", "1..2", "--1", "0x10", "bogus", "1 2", "infinit"] {
			assert!(Decimal64::parse(s).is_none(), "{s:?}");
		}
	}

	#[test]
	fn parse_rounds_half_even() {
		assert_eq!(d("12345678901234567").to_string(), "1.234567890123457e+16");
		assert_eq!(d("12345678901234565").to_string(), "1.234567890123456e+16");
		assert_eq!(d("1.0000000000000005").to_string(), "1.000000000000000");
		assert_eq!(d("99999999999999995").to_string(), "1.000000000000000e+17");
	}

	#[test]
	fn parse_range_limits() {
		assert_eq!(d("1e385"), Decimal64::INFINITY);
		assert_eq!(d("-1e99999999999999999999"), Decimal64::NEG_INFINITY);
		assert_eq!(d("1e384").to_string(), "1.000000000000000e+384");
		assert_eq!(d("0e999").parts(), Parts::Finite {neg: false, coef: 0, exp: QMAX});
		assert_eq!(d("1e-398").to_bits(), 1);
		assert_eq!(d("6e-399").to_bits(), 1);
		assert!(d("5e-399").is_zero());
		assert!(d("1e-99999").is_zero());
	}
}
