// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Right-hand-side label updates.
use std::fmt;
use std::sync::Arc;

use crate::label::Label;

/// Procedural label mutation.
pub type UpdateFn = Arc<dyn Fn(&mut Label) + Send + Sync>;

/// Mutation applied to a matched node or edge label.
#[derive(Clone, Default)]
pub enum UpdateSpec {
    /// No-op.
    #[default]
    Keep,
    /// Deep-merge a partial structure (see [`Label::merge`]).
    Merge(Label),
    /// Run a closure against the label.
    Apply(UpdateFn),
}

impl UpdateSpec {
    /// Wraps a closure as an [`UpdateSpec::Apply`].
    pub fn apply<F>(f: F) -> Self
    where
        F: Fn(&mut Label) + Send + Sync + 'static,
    {
        Self::Apply(Arc::new(f))
    }

    /// Mutates `label` in place.
    pub fn run(&self, label: &mut Label) {
        match self {
            Self::Keep => {}
            Self::Merge(patch) => label.merge(patch),
            Self::Apply(f) => f(label),
        }
    }
}

impl From<Label> for UpdateSpec {
    fn from(patch: Label) -> Self {
        Self::Merge(patch)
    }
}

impl From<Option<Label>> for UpdateSpec {
    fn from(patch: Option<Label>) -> Self {
        patch.map_or(Self::Keep, Self::Merge)
    }
}

impl fmt::Debug for UpdateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keep => f.write_str("Keep"),
            Self::Merge(patch) => f.debug_tuple("Merge").field(patch).finish(),
            Self::Apply(_) => f.write_str("Apply(..)"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn keep_is_a_no_op() {
        let mut label = Label::new().with("a", 1);
        UpdateSpec::from(None).run(&mut label);
        assert_eq!(label, Label::new().with("a", 1));
    }

    #[test]
    fn apply_runs_the_closure() {
        let mut label = Label::new().with("depth", 2);
        let bump = UpdateSpec::apply(|l| {
            let depth = l.num("depth").unwrap_or(0.0);
            l.insert("depth", depth + 1.0);
        });
        bump.run(&mut label);
        assert_eq!(label.num("depth"), Some(3.0));
    }
}
