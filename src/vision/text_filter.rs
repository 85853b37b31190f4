// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Digit filtering of recognized text fragments

/// Join recognized fragments with a single space and keep ASCII digits only
///
/// An empty result is not an error here; the caller decides whether an empty
/// digit string is a failure.
pub fn filter_digits<'a, I>(fragments: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let joined = fragments.into_iter().collect::<Vec<_>>().join(" ");
    joined.chars().filter(|c| c.is_ascii_digit()).collect()
}
