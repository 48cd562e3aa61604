//! Dispatch adapters: erase any callable into `bytes in → bytes out`.
//!
//! A registered callable is wrapped once, at registration time, into a
//! [`Handler`]. Invoking the handler decodes the callable's argument tuple
//! from the request, calls it, and encodes the return value. `()` is the
//! void-equivalent return: it encodes to zero bytes.
//!
//! ```text
//!  Fn(A, B) -> R            ──▶ FnHandler          ┐
//!  Fn(&O, A, B) -> R  + &O  ──▶ MethodHandler      ├──▶ Box<dyn Handler>
//!  FnMut(&mut O, A) -> R + &mut O ──▶ MethodMutHandler ┘
//! ```
//!
//! Arity is covered up to eight parameters per callable.

use core::marker::PhantomData;

use crate::error::DecodeError;

use super::codec::{Decode, Encode, Reader};

/// The uniform, type-erased handler signature.
pub trait Handler {
    /// Decode arguments from `input`, run the callable, append the encoded
    /// result to `output`. The callable is not run if decoding fails.
    fn call(&mut self, input: &mut Reader<'_>, output: &mut Vec<u8>) -> Result<(), DecodeError>;
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn call(&mut self, input: &mut Reader<'_>, output: &mut Vec<u8>) -> Result<(), DecodeError> {
        (**self).call(input, output)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Callable shapes
// ═══════════════════════════════════════════════════════════════

/// A free callable taking the argument tuple `Args`.
pub trait Callable<Args> {
    type Output: Encode;
    fn invoke(&mut self, args: Args) -> Self::Output;
}

/// A callable taking a shared reference to a bound object first.
pub trait Method<Obj: ?Sized, Args> {
    type Output: Encode;
    fn invoke(&mut self, target: &Obj, args: Args) -> Self::Output;
}

/// A callable taking an exclusive reference to a bound object first.
pub trait MethodMut<Obj: ?Sized, Args> {
    type Output: Encode;
    fn invoke(&mut self, target: &mut Obj, args: Args) -> Self::Output;
}

macro_rules! impl_callables {
    ($($ty:ident $var:ident),*) => {
        impl<Func, Ret, $($ty),*> Callable<($($ty,)*)> for Func
        where
            Func: FnMut($($ty),*) -> Ret,
            Ret: Encode,
        {
            type Output = Ret;

            fn invoke(&mut self, ($($var,)*): ($($ty,)*)) -> Ret {
                (self)($($var),*)
            }
        }

        impl<Func, Obj, Ret, $($ty),*> Method<Obj, ($($ty,)*)> for Func
        where
            Obj: ?Sized,
            Func: FnMut(&Obj, $($ty),*) -> Ret,
            Ret: Encode,
        {
            type Output = Ret;

            fn invoke(&mut self, target: &Obj, ($($var,)*): ($($ty,)*)) -> Ret {
                (self)(target, $($var),*)
            }
        }

        impl<Func, Obj, Ret, $($ty),*> MethodMut<Obj, ($($ty,)*)> for Func
        where
            Obj: ?Sized,
            Func: FnMut(&mut Obj, $($ty),*) -> Ret,
            Ret: Encode,
        {
            type Output = Ret;

            fn invoke(&mut self, target: &mut Obj, ($($var,)*): ($($ty,)*)) -> Ret {
                (self)(target, $($var),*)
            }
        }
    };
}

impl_callables!();
impl_callables!(A1 a1);
impl_callables!(A1 a1, A2 a2);
impl_callables!(A1 a1, A2 a2, A3 a3);
impl_callables!(A1 a1, A2 a2, A3 a3, A4 a4);
impl_callables!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
impl_callables!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6);
impl_callables!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7);
impl_callables!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8);

// ═══════════════════════════════════════════════════════════════
//  Adapters
// ═══════════════════════════════════════════════════════════════

/// Adapter for a free function, closure or function object.
pub struct FnHandler<F, Args> {
    func: F,
    _args: PhantomData<fn(Args)>,
}

impl<F, Args> FnHandler<F, Args>
where
    F: Callable<Args>,
    Args: Decode,
{
    pub fn new(func: F) -> Self {
        Self {
            func,
            _args: PhantomData,
        }
    }
}

impl<F, Args> Handler for FnHandler<F, Args>
where
    F: Callable<Args>,
    Args: Decode,
{
    fn call(&mut self, input: &mut Reader<'_>, output: &mut Vec<u8>) -> Result<(), DecodeError> {
        let args = Args::decode(input)?;
        self.func.invoke(args).encode(output);
        Ok(())
    }
}

/// Adapter for a method bound to a borrowed object.
///
/// The object is not owned: it must outlive the registry holding this
/// handler, which the `'a` lifetime enforces.
pub struct MethodHandler<'a, O: ?Sized, F, Args> {
    target: &'a O,
    method: F,
    _args: PhantomData<fn(Args)>,
}

impl<'a, O, F, Args> MethodHandler<'a, O, F, Args>
where
    O: ?Sized,
    F: Method<O, Args>,
    Args: Decode,
{
    pub fn new(target: &'a O, method: F) -> Self {
        Self {
            target,
            method,
            _args: PhantomData,
        }
    }
}

impl<O, F, Args> Handler for MethodHandler<'_, O, F, Args>
where
    O: ?Sized,
    F: Method<O, Args>,
    Args: Decode,
{
    fn call(&mut self, input: &mut Reader<'_>, output: &mut Vec<u8>) -> Result<(), DecodeError> {
        let args = Args::decode(input)?;
        self.method.invoke(self.target, args).encode(output);
        Ok(())
    }
}

/// Adapter for a mutating method bound to an exclusively borrowed object.
pub struct MethodMutHandler<'a, O: ?Sized, F, Args> {
    target: &'a mut O,
    method: F,
    _args: PhantomData<fn(Args)>,
}

impl<'a, O, F, Args> MethodMutHandler<'a, O, F, Args>
where
    O: ?Sized,
    F: MethodMut<O, Args>,
    Args: Decode,
{
    pub fn new(target: &'a mut O, method: F) -> Self {
        Self {
            target,
            method,
            _args: PhantomData,
        }
    }
}

impl<O, F, Args> Handler for MethodMutHandler<'_, O, F, Args>
where
    O: ?Sized,
    F: MethodMut<O, Args>,
    Args: Decode,
{
    fn call(&mut self, input: &mut Reader<'_>, output: &mut Vec<u8>) -> Result<(), DecodeError> {
        let args = Args::decode(input)?;
        self.method.invoke(&mut *self.target, args).encode(output);
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────
