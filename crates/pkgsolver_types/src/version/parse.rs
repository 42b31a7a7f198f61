use smallvec::SmallVec;
use thiserror::Error;

use super::{Component, Segment, Version};

/// An error produced while parsing a [`Version`].
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ParseVersionError {
    /// The version string was empty.
    #[error("empty version string")]
    Empty,
    /// The epoch (before `!`) was not a non-negative integer.
    #[error("invalid epoch in version {0:?}")]
    InvalidEpoch(String),
    /// A segment contained an empty component, e.g. two consecutive dots.
    #[error("empty version component in {0:?}")]
    EmptyComponent(String),
}

pub(super) fn parse_version(source: &str) -> Result<Version, ParseVersionError> {
    let trimmed = source.trim();
    if trimmed.is_empty() {
        return Err(ParseVersionError::Empty);
    }

    // normalize the comparison value: case-insensitive, dashes behave like
    // underscores unless the string already uses underscores.
    let normalized = if trimmed.contains('_') {
        trimmed.to_ascii_lowercase()
    } else {
        trimmed.replace('-', "_").to_ascii_lowercase()
    };

    let (epoch_str, rest) = match normalized.split_once('!') {
        Some((epoch, rest)) => (Some(epoch), rest),
        None => (None, normalized.as_str()),
    };
    let epoch = match epoch_str {
        Some(e) => e
            .parse::<u64>()
            .map_err(|_| ParseVersionError::InvalidEpoch(source.to_string()))?,
        None => 0,
    };

    let (release_str, local_str) = match rest.split_once('+') {
        Some((release, local)) => (release, Some(local)),
        None => (rest, None),
    };

    let release = parse_segments(release_str, source)?.into_iter().collect();
    let local = match local_str {
        Some(s) => parse_segments(s, source)?.into_iter().collect(),
        None => SmallVec::new(),
    };

    Ok(Version {
        source: trimmed.into(),
        epoch,
        release,
        local,
    })
}

fn parse_segments(text: &str, original: &str) -> Result<Vec<Segment>, ParseVersionError> {
    let mut segments = Vec::new();
    for part in text.split(['.', '_']) {
        segments.push(parse_segment(part, original)?);
    }
    Ok(segments)
}

/// Splits a single dot/underscore-delimited segment into alternating runs of
/// digits and non-digits, inserting the implicit leading zero when the
/// segment starts with a letter.
fn parse_segment(part: &str, original: &str) -> Result<Segment, ParseVersionError> {
    if part.is_empty() {
        return Err(ParseVersionError::EmptyComponent(original.to_string()));
    }

    let mut components: Segment = SmallVec::new();
    let mut chars = part.char_indices().peekable();
    let mut run_start = 0usize;
    let mut run_is_digit = part.starts_with(|c: char| c.is_ascii_digit());

    if !run_is_digit {
        components.push(Component::Zero);
    }

    while let Some((idx, ch)) = chars.next() {
        let is_digit = ch.is_ascii_digit();
        if is_digit != run_is_digit {
            components.push(make_component(&part[run_start..idx], run_is_digit));
            run_start = idx;
            run_is_digit = is_digit;
        }
        if chars.peek().is_none() {
            components.push(make_component(&part[run_start..], run_is_digit));
        }
    }

    Ok(components)
}

fn make_component(run: &str, is_digit: bool) -> Component {
    if is_digit {
        // Unwrap is safe: `run` is a maximal run of ASCII digits.
        Component::Numeral(run.parse().unwrap_or(u64::MAX))
    } else {
        match run {
            "dev" => Component::Dev,
            "post" => Component::Post,
            other => Component::Ident(other.into()),
        }
    }
}
