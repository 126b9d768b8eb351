use std::fmt;

use super::Selection;
use crate::configuration::Limits;
use crate::error::ExecutionError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct OperationLimits<T> {
    pub(crate) depth: T,
    pub(crate) height: T,
    pub(crate) root_fields: T,
    pub(crate) aliases: T,
}

impl<A> OperationLimits<A> {
    fn map<B>(self, mut f: impl FnMut(A) -> B) -> OperationLimits<B> {
        OperationLimits {
            depth: f(self.depth),
            height: f(self.height),
            root_fields: f(self.root_fields),
            aliases: f(self.aliases),
        }
    }

    fn combine<B, C>(
        self,
        other: OperationLimits<B>,
        mut f: impl FnMut(&'static str, A, B) -> C,
    ) -> OperationLimits<C> {
        OperationLimits {
            depth: f("depth", self.depth, other.depth),
            height: f("height", self.height, other.height),
            root_fields: f("root_fields", self.root_fields, other.root_fields),
            aliases: f("aliases", self.aliases, other.aliases),
        }
    }
}

impl OperationLimits<bool> {
    fn any(&self) -> bool {
        let Self {
            depth,
            height,
            root_fields,
            aliases,
        } = *self;
        depth || height || root_fields || aliases
    }
}

impl fmt::Display for OperationLimits<u32> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "depth: {}, height: {}, root_fields: {}, aliases: {}",
            self.depth, self.height, self.root_fields, self.aliases
        )
    }
}

/// Checks the merged root selection of an operation against the configured limits.
pub(crate) fn check(limits: &Limits, selection: &Selection) -> Result<(), ExecutionError> {
    let max = OperationLimits {
        depth: limits.max_depth,
        height: limits.max_height,
        root_fields: limits.max_root_fields,
        aliases: limits.max_aliases,
    };
    if !max.map(|limit| limit.is_some()).any() {
        // No configured limit
        return Ok(());
    }

    let measured = measure(selection);
    tracing::debug!("measured operation: {measured}");
    let exceeded = max.combine(measured, |_, config, measured| {
        config.is_some_and(|limit| measured > limit)
    });
    if !exceeded.any() {
        return Ok(());
    }

    let mut messages = Vec::new();
    max.combine(measured, |ident, max, measured| {
        if let Some(max) = max {
            if measured > max {
                messages.push(format!("{ident}: {measured}, max_{ident}: {max}"))
            }
        }
    });
    let message = messages.join(", ");
    tracing::warn!("request exceeded complexity limits: {message}");
    if limits.warn_only {
        Ok(())
    } else {
        Err(ExecutionError::LimitsExceeded(message))
    }
}

/// Measures a selection against each limit.
///
/// Fields are counted once they are merged, so repeating a field or spreading the same
/// fragment twice does not count twice.
pub(crate) fn measure(selection: &Selection) -> OperationLimits<u32> {
    OperationLimits {
        root_fields: selection.len() as u32,
        ..count(selection)
    }
}

fn count(selection: &Selection) -> OperationLimits<u32> {
    let mut counts = OperationLimits::<u32>::default();
    for (_, field) in selection.iter() {
        counts.height += 1;
        if field.alias().is_some() {
            counts.aliases += 1;
        }
        let nested = field.selection().map(count).unwrap_or_default();
        counts.depth = counts.depth.max(1 + nested.depth);
        counts.height += nested.height;
        counts.aliases += nested.aliases;
    }
    counts
}
