//! Action executor - converges a single resource through its provider
//!
//! Each resource moves through
//! `Pending -> Probing -> {Unchanged | Diffed} -> Applying -> {Converged | Failed}`.
//! A dry run stops at `Diffed` and reports the change as simulated.

use crate::context::ApplyContext;
use crate::diff::{Diff, DiffKind};
use crate::error::Result;
use crate::provider::Provider;
use crate::report::Outcome;
use crate::resource::ResourceInstance;

/// Converge one resource and return its outcome.
///
/// Probe, apply and timeout errors from the provider are reported as
/// [`Outcome::Failed`]; this function never panics on provider errors.
pub fn execute(resource: &ResourceInstance, provider: &dyn Provider, ctx: &ApplyContext) -> Outcome {
    match converge(resource, provider, ctx) {
        Ok(outcome) => outcome,
        Err(error) => {
            log::warn!("{}: {} failed: {error}", resource.key(), resource.action());
            Outcome::Failed { error }
        }
    }
}

fn converge(resource: &ResourceInstance, provider: &dyn Provider, ctx: &ApplyContext) -> Result<Outcome> {
    let key = resource.key();
    log::debug!("{key}: probing with {}", provider.name());

    let current = provider.probe(resource, ctx)?;
    let desired = provider.desired(resource, &current, ctx)?;
    if !resource.is_sensitive() {
        log::trace!("{key}: current {current:?}, desired {desired:?}");
    }

    let action = resource.action();
    let Some(diff) = Diff::between(&desired, &current, |field, want, have| {
        provider.field_matches(action, field, want, have)
    }) else {
        log::debug!("{key}: unchanged");
        return Ok(Outcome::Unchanged);
    };

    let diff = if resource.is_sensitive() { diff.redacted() } else { diff };
    log::debug!("{key}: diffed ({diff})");

    if ctx.dry_run {
        log::debug!("{key}: dry run, skipping apply");
        return Ok(Outcome::Updated { diff });
    }

    log::debug!("{key}: applying {action}");
    provider.apply(resource, &desired, &current, ctx)?;
    log::info!("{key}: {action} converged");

    Ok(match diff.kind {
        DiffKind::Create => Outcome::Created { diff },
        DiffKind::Modify => Outcome::Updated { diff },
        DiffKind::Remove => Outcome::Deleted { diff },
    })
}
