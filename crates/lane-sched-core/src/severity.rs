// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! # Violation Severity
//!
//! `Severity<C>` is the magnitude of a constraint violation. Constraint
//! checks report non-negative severities; the managers sum them per item
//! and per partner pair and compare the totals lexicographically, so the
//! type only needs ordered, overflow-checked addition.

use num_traits::{CheckedAdd, CheckedSub, SaturatingAdd, Zero};
use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Sub, SubAssign},
};

/// A non-negative violation magnitude.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Severity<C>(C);

impl<C: Copy> Severity<C> {
    #[inline]
    pub const fn new(value: C) -> Self {
        Severity(value)
    }

    #[inline]
    pub const fn value(self) -> C {
        self.0
    }

    #[inline]
    pub fn zero() -> Self
    where
        C: Zero,
    {
        Severity(C::zero())
    }

    #[inline]
    pub fn is_zero(self) -> bool
    where
        C: Zero,
    {
        self.0.is_zero()
    }

    #[inline]
    pub fn checked_add(self, other: Severity<C>) -> Option<Self>
    where
        C: CheckedAdd<Output = C>,
    {
        self.0.checked_add(&other.0).map(Severity)
    }

    #[inline]
    pub fn saturating_add(self, other: Severity<C>) -> Self
    where
        C: SaturatingAdd<Output = C>,
    {
        Severity(self.0.saturating_add(&other.0))
    }
}

impl<C: Copy + Display> Display for Severity<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Severity({})", self.0)
    }
}

impl<C> Add for Severity<C>
where
    C: Copy + CheckedAdd<Output = C>,
{
    type Output = Severity<C>;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Severity(
            self.0
                .checked_add(&rhs.0)
                .expect("overflow in Severity + Severity"),
        )
    }
}

impl<C> AddAssign for Severity<C>
where
    C: Copy + CheckedAdd<Output = C>,
{
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self
            .0
            .checked_add(&rhs.0)
            .expect("overflow in Severity += Severity");
    }
}

impl<C> Sub for Severity<C>
where
    C: Copy + CheckedSub<Output = C>,
{
    type Output = Severity<C>;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Severity(
            self.0
                .checked_sub(&rhs.0)
                .expect("underflow in Severity - Severity"),
        )
    }
}

impl<C> SubAssign for Severity<C>
where
    C: Copy + CheckedSub<Output = C>,
{
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.0 = self
            .0
            .checked_sub(&rhs.0)
            .expect("underflow in Severity -= Severity");
    }
}

impl<C> Zero for Severity<C>
where
    C: Copy + Zero + CheckedAdd<Output = C>,
{
    #[inline]
    fn zero() -> Self {
        Severity(C::zero())
    }

    #[inline]
    fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl<C: Copy> From<C> for Severity<C> {
    #[inline]
    fn from(value: C) -> Self {
        Severity(value)
    }
}

impl<C> Default for Severity<C>
where
    C: Copy + Zero,
{
    #[inline]
    fn default() -> Self {
        Severity(C::zero())
    }
}

impl<C> Sum for Severity<C>
where
    C: Copy + Zero + CheckedAdd<Output = C>,
{
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Severity(C::zero()), |acc, x| acc + x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_value() {
        let s = Severity::new(9_i64);
        assert_eq!(s.value(), 9);
    }

    #[test]
    fn test_zero() {
        let s: Severity<i64> = Severity::zero();
        assert!(s.is_zero());
    }

    #[test]
    fn test_add() {
        assert_eq!(
            Severity::new(3_i64) + Severity::new(4),
            Severity::new(7_i64)
        );
    }

    #[test]
    fn test_add_assign() {
        let mut s = Severity::new(1_i64);
        s += Severity::new(2);
        assert_eq!(s, Severity::new(3));
    }

    #[test]
    fn test_checked_add_overflow() {
        let s = Severity::new(i64::MAX);
        assert_eq!(s.checked_add(Severity::new(1)), None);
    }

    #[test]
    fn test_ordering() {
        assert!(Severity::new(2_i64) < Severity::new(3));
    }

    #[test]
    fn test_sum() {
        let total: Severity<i64> = [1, 2, 3].iter().map(|&v| Severity::new(v)).sum();
        assert_eq!(total, Severity::new(6));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Severity::new(5_i64)), "Severity(5)");
    }
}
