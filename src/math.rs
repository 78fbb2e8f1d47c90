//! Decimal64 arithmetic, the pure functions behind the operator table.
//!
//! Exact operations (`+ - * / fma sqrt`, rounding, `fmod`, `quantize`, ...) are computed on
//! `rug::Integer` coefficients and rounded once, ties to even. Transcendental functions are
//! evaluated on a 256-bit `rug::Float` and rounded once to 16 digits.
use std::cmp::Ordering;
use rug::{Integer, Rational, Float, float::Special, ops::Pow};
use crate::decimal::{Decimal64, Parts, pow10, digit_count, DIGITS, MAX_COEF, QMIN, QMAX};
use Parts::*;

///working precision of the Float detour
const PREC: u32 = 256;

#[inline(always)]
fn bool_val(b: bool) -> Decimal64 {
	if b {Decimal64::ONE} else {Decimal64::ZERO}
}

///first NaN operand, quieted
#[inline(always)]
fn nan_of(args: &[Decimal64]) -> Option<Decimal64> {
	args.iter().find(|a| a.is_nan()).map(|a| a.quiet())
}

///bring two coefficients to their common (smaller) exponent
fn align(ca: u64, ea: i64, cb: u64, eb: i64) -> (Integer, Integer, i64) {
	let e = ea.min(eb);
	(
		Integer::from(ca) * pow10((ea - e) as u32),
		Integer::from(cb) * pow10((eb - e) as u32),
		e
	)
}

///exact signed sum of two (neg, magnitude, exponent) triples, rounded once
fn exact_sum(a: (bool, Integer, i64), b: (bool, Integer, i64)) -> Decimal64 {
	let e = a.2.min(b.2);
	let x = a.1 * pow10((a.2 - e) as u32);
	let y = b.1 * pow10((b.2 - e) as u32);
	let sum = (if a.0 {-x} else {x}) + (if b.0 {-y} else {y});
	if sum == 0 {	//exact zero is negative only when both addends are
		return Decimal64::rounded(a.0 && b.0, sum, e, false);
	}
	Decimal64::rounded(sum < 0, sum.abs(), e, false)
}

///strip trailing zeros while the exponent is below `ideal`
fn reduce_toward(mut coef: Integer, mut exp: i64, ideal: i64) -> (Integer, i64) {
	while exp < ideal && coef != 0 && coef.is_divisible_u(10) {
		coef /= 10;
		exp += 1;
	}
	(coef, exp)
}

/*----------------
	COMPARISON
----------------*/
///IEEE ordering, `None` when either side is NaN; -0 equals +0
pub fn compare(a: Decimal64, b: Decimal64) -> Option<Ordering> {
	match (a.parts(), b.parts()) {
		(Nan {..}, _)|(_, Nan {..}) => None,
		(Inf {neg: x}, Inf {neg: y}) => Some(y.cmp(&x)),
		(Inf {neg}, _) => Some(if neg {Ordering::Less} else {Ordering::Greater}),
		(_, Inf {neg}) => Some(if neg {Ordering::Greater} else {Ordering::Less}),
		(Finite {neg: na, coef: ca, exp: ea}, Finite {neg: nb, coef: cb, exp: eb}) => {
			let (x, y, _) = align(ca, ea, cb, eb);
			let x = if na {-x} else {x};
			let y = if nb {-y} else {y};
			Some(x.cmp(&y))
		}
	}
}

pub fn eq(a: Decimal64, b: Decimal64) -> Decimal64 {
	bool_val(compare(a, b) == Some(Ordering::Equal))
}
pub fn ne(a: Decimal64, b: Decimal64) -> Decimal64 {
	bool_val(compare(a, b) != Some(Ordering::Equal))
}
pub fn lt(a: Decimal64, b: Decimal64) -> Decimal64 {
	bool_val(compare(a, b) == Some(Ordering::Less))
}
pub fn le(a: Decimal64, b: Decimal64) -> Decimal64 {
	bool_val(matches!(compare(a, b), Some(Ordering::Less|Ordering::Equal)))
}
pub fn gt(a: Decimal64, b: Decimal64) -> Decimal64 {
	bool_val(compare(a, b) == Some(Ordering::Greater))
}
pub fn ge(a: Decimal64, b: Decimal64) -> Decimal64 {
	bool_val(matches!(compare(a, b), Some(Ordering::Greater|Ordering::Equal)))
}

///logical not: 1 for (either) zero, 0 otherwise, NaN included
pub fn not(a: Decimal64) -> Decimal64 {
	bool_val(a.is_zero())
}

/*----------------
	ARITHMETIC
----------------*/
pub fn add(a: Decimal64, b: Decimal64) -> Decimal64 {
	if let Some(n) = nan_of(&[a, b]) {return n;}
	match (a.parts(), b.parts()) {
		(Inf {neg: x}, Inf {neg: y}) => if x == y {Decimal64::infinity(x)} else {Decimal64::NAN},
		(Inf {neg}, _)|(_, Inf {neg}) => Decimal64::infinity(neg),
		(Finite {neg: na, coef: ca, exp: ea}, Finite {neg: nb, coef: cb, exp: eb}) => {
			exact_sum((na, Integer::from(ca), ea), (nb, Integer::from(cb), eb))
		}
		_ => Decimal64::NAN
	}
}

pub fn sub(a: Decimal64, b: Decimal64) -> Decimal64 {
	if let Some(n) = nan_of(&[a, b]) {return n;}
	add(a, b.negate())
}

pub fn mul(a: Decimal64, b: Decimal64) -> Decimal64 {
	if let Some(n) = nan_of(&[a, b]) {return n;}
	match (a.parts(), b.parts()) {
		(Inf {..}, Finite {coef: 0, ..})|(Finite {coef: 0, ..}, Inf {..}) => Decimal64::NAN,
		(Inf {neg: x}|Finite {neg: x, ..}, Inf {neg: y})|(Inf {neg: x}, Finite {neg: y, ..}) => Decimal64::infinity(x ^ y),
		(Finite {neg: na, coef: ca, exp: ea}, Finite {neg: nb, coef: cb, exp: eb}) => {
			Decimal64::rounded(na ^ nb, Integer::from(ca) * cb, ea + eb, false)
		}
		_ => Decimal64::NAN
	}
}

pub fn div(a: Decimal64, b: Decimal64) -> Decimal64 {
	if let Some(n) = nan_of(&[a, b]) {return n;}
	match (a.parts(), b.parts()) {
		(Inf {..}, Inf {..}) => Decimal64::NAN,
		(Inf {neg: x}, Finite {neg: y, ..}) => Decimal64::infinity(x ^ y),
		(Finite {neg: x, ..}, Inf {neg: y}) => Decimal64::rounded(x ^ y, Integer::new(), QMIN, false),
		(Finite {coef: 0, ..}, Finite {coef: 0, ..}) => Decimal64::NAN,
		(Finite {neg: x, ..}, Finite {neg: y, coef: 0, ..}) => Decimal64::infinity(x ^ y),
		(Finite {neg: na, coef: ca, exp: ea}, Finite {neg: nb, coef: cb, exp: eb}) => {
			let ideal = ea - eb;
			if ca == 0 {
				return Decimal64::rounded(na ^ nb, Integer::new(), ideal, false);
			}
			let ca = Integer::from(ca);
			let cb = Integer::from(cb);
			//enough digits for a rounding digit below the 16 kept ones
			let shift = (DIGITS + 1 + digit_count(&cb) - digit_count(&ca)).max(0);
			let (q, r) = (ca * pow10(shift as u32)).div_rem(cb);
			let inexact = r != 0;
			let (q, exp) = if inexact {(q, ideal - shift)} else {reduce_toward(q, ideal - shift, ideal)};
			Decimal64::rounded(na ^ nb, q, exp, inexact)
		}
		_ => Decimal64::NAN
	}
}

///a*b+c with a single rounding
pub fn fma(a: Decimal64, b: Decimal64, c: Decimal64) -> Decimal64 {
	if let Some(n) = nan_of(&[a, b, c]) {return n;}
	let product = match (a.parts(), b.parts()) {
		(Inf {..}, Finite {coef: 0, ..})|(Finite {coef: 0, ..}, Inf {..}) => {return Decimal64::NAN;}
		(Inf {neg: x}|Finite {neg: x, ..}, Inf {neg: y})|(Inf {neg: x}, Finite {neg: y, ..}) => Err(x ^ y),
		(Finite {neg: na, coef: ca, exp: ea}, Finite {neg: nb, coef: cb, exp: eb}) => {
			Ok((na ^ nb, Integer::from(ca) * cb, ea + eb))
		}
		_ => {return Decimal64::NAN;}
	};
	match (product, c.parts()) {
		(Err(x), Inf {neg: y}) => if x == y {c} else {Decimal64::NAN},
		(Err(x), _) => Decimal64::infinity(x),
		(Ok(_), Inf {..}) => c,
		(Ok(p), Finite {neg, coef, exp}) => exact_sum(p, (neg, Integer::from(coef), exp)),
		(Ok(_), Nan {..}) => c.quiet(),
	}
}

///correctly rounded square root, exact results take exponent floor(e/2)
pub fn sqrt(a: Decimal64) -> Decimal64 {
	match a.parts() {
		Nan {..} => a.quiet(),
		Inf {neg: false} => a,
		Finite {neg, coef: 0, exp} => Decimal64::rounded(neg, Integer::new(), exp.div_euclid(2), false),
		Inf {neg: true}|Finite {neg: true, ..} => Decimal64::NAN,
		Finite {coef, exp, ..} => {
			let ideal = exp.div_euclid(2);
			let mut c = Integer::from(coef);
			let mut e = exp;
			if e.rem_euclid(2) != 0 {
				c *= 10;
				e -= 1;
			}
			//radicand of at least 34 digits leaves 17 in the root
			let k = ((2 * (DIGITS + 1) - digit_count(&c)).max(0) + 1) / 2;
			c *= pow10(2 * k as u32);
			e -= 2 * k;
			let (root, rem) = c.sqrt_rem(Integer::new());
			let inexact = rem != 0;
			let (root, exp) = if inexact {(root, e / 2)} else {reduce_toward(root, e / 2, ideal)};
			Decimal64::rounded(false, root, exp, inexact)
		}
	}
}

/*------------------------
	INTEGRAL ROUNDING
------------------------*/
#[derive(Clone, Copy)]
enum Mode {
	Ceil,
	Floor,
	Trunc,
	HalfAway,
	HalfEven,
}

///round to an integral value, exponent becomes max(e, 0)
fn to_integral(a: Decimal64, mode: Mode) -> Decimal64 {
	let (neg, coef, exp) = match a.parts() {
		Nan {..} => {return a.quiet();}
		Inf {..} => {return a;}
		Finite {exp, ..} if exp >= 0 => {return a;}
		Finite {neg, coef, exp} => (neg, Integer::from(coef), exp)
	};
	let drop = exp.unsigned_abs() as u32;
	let (q, r) = coef.div_rem(pow10(drop));
	let half = pow10(drop) / 2_u32;
	let up = match mode {
		Mode::Ceil => r != 0 && !neg,
		Mode::Floor => r != 0 && neg,
		Mode::Trunc => false,
		Mode::HalfAway => r >= half,
		Mode::HalfEven => r > half || (r == half && q.is_odd()),
	};
	Decimal64::rounded(neg, if up {q + 1_u32} else {q}, 0, false)
}

pub fn ceil(a: Decimal64) -> Decimal64 {to_integral(a, Mode::Ceil)}
pub fn floor(a: Decimal64) -> Decimal64 {to_integral(a, Mode::Floor)}
pub fn trunc(a: Decimal64) -> Decimal64 {to_integral(a, Mode::Trunc)}
pub fn round(a: Decimal64) -> Decimal64 {to_integral(a, Mode::HalfAway)}
pub fn roundeven(a: Decimal64) -> Decimal64 {to_integral(a, Mode::HalfEven)}
///current rounding direction, which is always ties-to-even here
pub fn rint(a: Decimal64) -> Decimal64 {to_integral(a, Mode::HalfEven)}
pub fn nearbyint(a: Decimal64) -> Decimal64 {to_integral(a, Mode::HalfEven)}

/*--------------------------
	SIGN, EXPONENT, QUANTUM
--------------------------*/
pub fn fabs(a: Decimal64) -> Decimal64 {
	a.abs()
}

pub fn copysign(a: Decimal64, b: Decimal64) -> Decimal64 {
	if a.is_sign_negative() == b.is_sign_negative() {a} else {a.negate()}
}

///exponent of the most significant digit
pub fn logb(a: Decimal64) -> Decimal64 {
	match a.parts() {
		Nan {..} => a.quiet(),
		Inf {..} => Decimal64::INFINITY,
		Finite {coef: 0, ..} => Decimal64::NEG_INFINITY,
		Finite {coef, exp, ..} => {
			let adjusted = exp + digit_count(&Integer::from(coef)) - 1;
			Decimal64::rounded(adjusted < 0, Integer::from(adjusted.unsigned_abs()), 0, false)
		}
	}
}

///1 in the units of the last place
pub fn quantum(a: Decimal64) -> Decimal64 {
	match a.parts() {
		Nan {..} => a.quiet(),
		Inf {..} => Decimal64::INFINITY,
		Finite {exp, ..} => Decimal64::from_finite(false, 1, exp)
	}
}

///a rescaled to the exponent of b, NaN when the coefficient would not fit
pub fn quantize(a: Decimal64, b: Decimal64) -> Decimal64 {
	if let Some(n) = nan_of(&[a, b]) {return n;}
	match (a.parts(), b.parts()) {
		(Inf {..}, Inf {..}) => a,
		(Finite {neg, coef, exp}, Finite {exp: target, ..}) => {
			if target <= exp {
				let c = Integer::from(coef) * pow10((exp - target) as u32);
				if digit_count(&c) > DIGITS {Decimal64::NAN}
				else {Decimal64::from_finite(neg, c.to_u64_wrapping(), target)}
			}
			else {
				let drop = (target - exp) as u32;
				let (q, r) = Integer::from(coef).div_rem(pow10(drop));
				let half = pow10(drop) / 2_u32;
				let up = r > half || (r == half && q.is_odd());
				let q = if up {q + 1_u32} else {q};
				if digit_count(&q) > DIGITS {Decimal64::NAN}
				else {Decimal64::from_finite(neg, q.to_u64_wrapping(), target)}
			}
		}
		_ => Decimal64::NAN
	}
}

///next representable value after a in the direction of b
pub fn nextafter(a: Decimal64, b: Decimal64) -> Decimal64 {
	if let Some(n) = nan_of(&[a, b]) {return n;}
	let up = match compare(a, b) {
		Some(Ordering::Less) => true,
		Some(Ordering::Greater) => false,
		_ => {return b;}
	};
	match a.parts() {
		Inf {neg} => Decimal64::from_finite(neg, MAX_COEF, QMAX),
		Finite {coef: 0, ..} => Decimal64::from_finite(!up, 1, QMIN),
		Finite {neg, mut coef, mut exp} => {
			const LOW: u64 = 1_000_000_000_000_000;
			while coef < LOW && exp > QMIN {	//widen to full precision
				coef *= 10;
				exp -= 1;
			}
			if up != neg {	//magnitude grows
				coef += 1;
				if coef > MAX_COEF {
					coef = LOW;
					exp += 1;
					if exp > QMAX {return Decimal64::infinity(neg);}
				}
			}
			else {
				coef -= 1;
				if coef < LOW && exp > QMIN {
					coef = MAX_COEF;
					exp -= 1;
				}
			}
			Decimal64::from_finite(neg, coef, exp)
		}
		Nan {..} => Decimal64::NAN
	}
}

/*---------------------
	REMAINDERS, MIN/MAX
---------------------*/
///shared special cases of fmod and remainder, `Err` carries aligned magnitudes
fn rem_operands(a: Decimal64, b: Decimal64) -> Result<(bool, Integer, Integer, i64), Decimal64> {
	if let Some(n) = nan_of(&[a, b]) {return Err(n);}
	match (a.parts(), b.parts()) {
		(Inf {..}, _)|(_, Finite {coef: 0, ..}) => Err(Decimal64::NAN),
		(Finite {..}, Inf {..}) => Err(a),
		(Finite {neg, coef: ca, exp: ea}, Finite {coef: cb, exp: eb, ..}) => {
			let (x, y, e) = align(ca, ea, cb, eb);
			Ok((neg, x, y, e))
		}
		_ => Err(Decimal64::NAN)
	}
}

///a - trunc(a/b)*b, exact, sign of a
pub fn fmod(a: Decimal64, b: Decimal64) -> Decimal64 {
	match rem_operands(a, b) {
		Err(v) => v,
		Ok((neg, x, y, e)) => Decimal64::rounded(neg, x % y, e, false)
	}
}

///a - n*b with n = a/b rounded half to even, exact
pub fn remainder(a: Decimal64, b: Decimal64) -> Decimal64 {
	match rem_operands(a, b) {
		Err(v) => v,
		Ok((neg, x, y, e)) => {
			let (q, r) = x.div_rem(y.clone());
			let twice = Integer::from(&r * 2_u32);
			if twice > y || (twice == y && q.is_odd()) {
				Decimal64::rounded(!neg, y - r, e, false)
			}
			else {
				Decimal64::rounded(neg, r, e, false)
			}
		}
	}
}

///positive difference
pub fn fdim(a: Decimal64, b: Decimal64) -> Decimal64 {
	if let Some(n) = nan_of(&[a, b]) {return n;}
	if compare(a, b) == Some(Ordering::Greater) {sub(a, b)} else {Decimal64::ZERO}
}

///larger value, a NaN loses against a number
pub fn fmax(a: Decimal64, b: Decimal64) -> Decimal64 {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => a.quiet(),
		(true, false) => b,
		(false, true) => a,
		_ => match compare(a, b) {
			Some(Ordering::Less) => b,
			Some(Ordering::Equal) if a.is_sign_negative() => b,
			_ => a
		}
	}
}

///smaller value, a NaN loses against a number
pub fn fmin(a: Decimal64, b: Decimal64) -> Decimal64 {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => a.quiet(),
		(true, false) => b,
		(false, true) => a,
		_ => match compare(a, b) {
			Some(Ordering::Greater) => b,
			Some(Ordering::Equal) if b.is_sign_negative() => b,
			_ => a
		}
	}
}

/*-----------------------------
	TRANSCENDENTAL (via Float)
-----------------------------*/
fn to_rational(neg: bool, coef: u64, exp: i64) -> Rational {
	let mut r = Rational::from(Integer::from(coef));
	if exp >= 0 {r *= pow10(exp as u32);} else {r /= pow10(exp.unsigned_abs() as u32);}
	if neg {-r} else {r}
}

fn to_float(a: Decimal64) -> Float {
	match a.parts() {
		Nan {..} => Float::with_val(PREC, Special::Nan),
		Inf {neg} => Float::with_val(PREC, if neg {Special::NegInfinity} else {Special::Infinity}),
		Finite {neg, coef: 0, ..} => Float::with_val(PREC, if neg {Special::NegZero} else {Special::Zero}),
		Finite {neg, coef, exp} => Float::with_val(PREC, to_rational(neg, coef, exp))
	}
}

///round to 16 digits; a result that is exactly a short decimal gets the shortest
///coefficient with exponent at most 0 (so `exp 0` is `1`, not `1.000000000000000`)
fn from_float(f: &Float) -> Decimal64 {
	if f.is_nan() {
		return Decimal64::NAN;
	}
	if f.is_infinite() {
		return Decimal64::infinity(f.is_sign_negative());
	}
	if f.is_zero() {
		return Decimal64::rounded(f.is_sign_negative(), Integer::new(), 0, false);
	}
	let text = f.to_string_radix(10, Some(DIGITS as usize)).replace('@', "e");
	let d = match Decimal64::parse(&text) {
		Some(d) => d,
		None => {return Decimal64::NAN;}
	};
	match d.parts() {
		Finite {coef, exp, ..} if coef == 0 || exp + digit_count(&Integer::from(coef)) - 1 < QMIN + DIGITS - 1 => from_tiny_float(f),
		Finite {neg, coef, exp} if Float::with_val(PREC, to_rational(neg, coef, exp)) == *f => {
			let (coef, exp) = reduce_toward(Integer::from(coef), exp, 0);
			Decimal64::rounded(neg, coef, exp, false)
		}
		_ => d
	}
}

///Subnormal or zero result: round the exact binary value once, straight to the
///coarser quantum, since a 16-digit string would already be rounded.
fn from_tiny_float(f: &Float) -> Decimal64 {
	let neg = f.is_sign_negative();
	//far below half of the smallest subnormal (10^-398 is about 2^-1322)
	if f.get_exp().map_or(true, |e| e < -1400) {
		return Decimal64::rounded(neg, Integer::new(), QMIN, false);
	}
	let (m, e) = match f.to_integer_exp() {
		Some(p) => p,
		None => {return Decimal64::NAN;}
	};
	//|f| scaled to one digit below the subnormal quantum: |m| * 10^(1 - QMIN) * 2^e
	let num = m.abs() * pow10((1 - QMIN) as u32);
	let (coef, rem) = if e >= 0 {
		(num << e as u32, Integer::new())
	}
	else {
		num.div_rem(Integer::from(1) << e.unsigned_abs())
	};
	let sticky = rem != 0;
	let (coef, exp) = if sticky {(coef, QMIN - 1)} else {reduce_toward(coef, QMIN - 1, 0)};
	Decimal64::rounded(neg, coef, exp, sticky)
}

///apply a Float function, NaN results take the payload of a NaN operand when there is one
fn via_float<const N: usize>(args: [Decimal64; N], f: impl FnOnce([Float; N]) -> Float) -> Decimal64 {
	let r = f(args.map(to_float));
	if r.is_nan() {
		return nan_of(&args).unwrap_or(Decimal64::NAN);
	}
	from_float(&r)
}

macro_rules! float_unary {
	($($name:ident => $method:ident),* $(,)?) => {$(
		pub fn $name(a: Decimal64) -> Decimal64 {
			via_float([a], |[x]| x.$method())
		}
	)*};
}
float_unary! {
	acos => acos, asin => asin, atan => atan,
	cos => cos, sin => sin, tan => tan,
	cosh => cosh, sinh => sinh, tanh => tanh,
	acosh => acosh, asinh => asinh, atanh => atanh,
	exp => exp, log => ln, log10 => log10,
	expm1 => exp_m1, log1p => ln_1p,
	exp2 => exp2, log2 => log2, cbrt => cbrt,
	erf => erf, erfc => erfc, tgamma => gamma,
}

///ln|Γ(a)|
pub fn lgamma(a: Decimal64) -> Decimal64 {
	via_float([a], |[x]| x.ln_abs_gamma().0)
}

///atan(y/x) in the quadrant of (x, y), operands pushed as `y x`
pub fn atan2(y: Decimal64, x: Decimal64) -> Decimal64 {
	via_float([y, x], |[y, x]| y.atan2(&x))
}

pub fn hypot(a: Decimal64, b: Decimal64) -> Decimal64 {
	via_float([a, b], |[a, b]| a.hypot(&b))
}

pub fn pow(a: Decimal64, b: Decimal64) -> Decimal64 {
	via_float([a, b], |[a, b]| a.pow(&b))
}
