//! Package provider - converges package resources through a `pkgkit::Backend`

use declarative::{
    Action, ApplyContext, ConvergeError, CurrentState, DesiredState, Fields, Provider,
    ResourceInstance, Value,
};
use pkgkit::backend::ensure_candidate;
use pkgkit::{Backend, PackageRequest};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

/// Observed and desired field carrying the package version
const VERSION: &str = "version";

/// Provider for `*_package` resources backed by a package manager
pub struct PackageProvider {
    backend: Arc<dyn Backend>,
}

impl PackageProvider {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    fn request(resource: &ResourceInstance, version: Option<&Value>) -> PackageRequest {
        let mut request = PackageRequest::new(resource.identity());
        if let Some(version) = version {
            request = request.with_version(version.to_string());
        }
        if let Some(source) = resource.string("source") {
            request = request.with_source(source);
        }
        if let Some(options) = resource.string("options") {
            request = request.with_options(options);
        }
        request
    }

    /// Per-resource `timeout` property, falling back to the engine budget
    fn timeout(resource: &ResourceInstance, ctx: &ApplyContext) -> declarative::Result<Option<Duration>> {
        match resource.property("timeout") {
            None => Ok(ctx.timeout),
            Some(Value::Integer(secs)) if *secs > 0 => Ok(Some(Duration::from_secs(*secs as u64))),
            Some(other) => Err(ConvergeError::apply(format!(
                "invalid timeout '{other}', expected a positive number of seconds"
            ))),
        }
    }
}

/// Map backend failures onto the convergence taxonomy
fn apply_error(err: pkgkit::Error) -> ConvergeError {
    match err {
        pkgkit::Error::Timeout { after, .. } => ConvergeError::Timeout { after },
        other => ConvergeError::Apply {
            stderr: other.stderr().map(ToString::to_string),
            message: other.to_string(),
        },
    }
}

fn probe_error(err: pkgkit::Error) -> ConvergeError {
    ConvergeError::probe(err.to_string())
}

impl Provider for PackageProvider {
    fn name(&self) -> &'static str {
        self.backend.name()
    }

    /// Two resources naming the same package never run concurrently
    fn target_key(&self, resource: &ResourceInstance) -> String {
        format!("package:{}", resource.identity())
    }

    fn probe(&self, resource: &ResourceInstance, _ctx: &ApplyContext) -> declarative::Result<CurrentState> {
        let installed = self
            .backend
            .query(resource.identity())
            .map_err(probe_error)?;

        Ok(match installed {
            Some(package) => {
                let mut fields = Fields::new();
                fields.insert(VERSION.to_string(), Value::String(package.version));
                CurrentState::Present(fields)
            }
            None => CurrentState::NotPresent,
        })
    }

    fn desired(
        &self,
        resource: &ResourceInstance,
        _current: &CurrentState,
        _ctx: &ApplyContext,
    ) -> declarative::Result<DesiredState> {
        let version = match resource.action() {
            action if action.is_removal() => return Ok(DesiredState::Absent),
            Action::Upgrade => match resource.property(VERSION) {
                Some(version) => Some(version.clone()),
                None => self
                    .backend
                    .candidate_version(&Self::request(resource, None))
                    .map_err(probe_error)?
                    .map(Value::String),
            },
            _ => resource.property(VERSION).cloned(),
        };

        let mut fields = Fields::new();
        if let Some(version) = version {
            fields.insert(VERSION.to_string(), version);
        }
        Ok(DesiredState::Present(fields))
    }

    fn field_matches(
        &self,
        action: Action,
        field: &str,
        desired: &Value,
        current: Option<&Value>,
    ) -> bool {
        let (Some(wanted), Some(installed)) = (desired.as_str(), current.and_then(Value::as_str))
        else {
            return current == Some(desired);
        };
        if field != VERSION {
            return wanted == installed;
        }

        let ordering = self.backend.compare_versions(installed, wanted);
        match action {
            Action::Upgrade => ordering != Ordering::Less,
            _ => ordering == Ordering::Equal,
        }
    }

    fn apply(
        &self,
        resource: &ResourceInstance,
        desired: &DesiredState,
        _current: &CurrentState,
        ctx: &ApplyContext,
    ) -> declarative::Result<()> {
        let request = Self::request(resource, desired.field(VERSION));
        let timeout = Self::timeout(resource, ctx)?;
        log::debug!(
            "{} {} {} (timeout: {:?})",
            self.backend.name(),
            resource.action(),
            request.name,
            timeout
        );

        // A pin the candidate cannot meet would be reinstalled on every run
        let result = match resource.action() {
            Action::Upgrade => ensure_candidate(self.backend.as_ref(), &request, true)
                .and_then(|()| self.backend.upgrade(&request, timeout)),
            Action::Remove => self.backend.remove(&request, timeout),
            Action::Purge => self.backend.purge(&request, timeout),
            _ => ensure_candidate(self.backend.as_ref(), &request, false)
                .and_then(|()| self.backend.install(&request, timeout)),
        };
        result.map_err(apply_error)
    }
}
