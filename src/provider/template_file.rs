//! Templated file provider
//!
//! Files are compared by blake3 content hash, so a second convergence with the
//! same variables never rewrites the file. Writes go to a temp file in the
//! target directory which is then renamed over the target.

use declarative::{
    Action, ApplyContext, ConvergeError, CurrentState, DesiredState, Fields, Provider,
    ResourceInstance, TemplateRenderer, Value,
};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Observed and desired field carrying the content hash
const CONTENT: &str = "content";

/// Builds template variables from a resource
pub type VariablesFn = fn(&ResourceInstance) -> BTreeMap<String, Value>;

/// Provider that renders one template into `<dir>/<filename>`
pub struct TemplateFileProvider {
    name: &'static str,
    dir: PathBuf,
    template: &'static str,
    variables: VariablesFn,
    renderer: Arc<dyn TemplateRenderer>,
}

impl TemplateFileProvider {
    pub fn new(
        name: &'static str,
        dir: impl Into<PathBuf>,
        template: &'static str,
        variables: VariablesFn,
        renderer: Arc<dyn TemplateRenderer>,
    ) -> Self {
        Self {
            name,
            dir: dir.into(),
            template,
            variables,
            renderer,
        }
    }

    /// Target path; the filename must stay inside the directory
    fn path(&self, resource: &ResourceInstance) -> declarative::Result<PathBuf> {
        let filename = resource
            .string("filename")
            .ok_or_else(|| ConvergeError::probe("resource has no filename"))?;
        if filename.is_empty()
            || filename == ".."
            || filename.contains('/')
            || filename.contains(std::path::MAIN_SEPARATOR)
        {
            return Err(ConvergeError::probe(format!(
                "invalid filename '{filename}'"
            )));
        }
        Ok(self.dir.join(filename))
    }

    fn render(&self, resource: &ResourceInstance) -> declarative::Result<Vec<u8>> {
        self.renderer
            .render(self.template, &(self.variables)(resource))
            .map_err(|e| ConvergeError::apply(format!("failed to render {}: {e:#}", self.template)))
    }
}

fn content_state(bytes: &[u8]) -> Fields {
    let mut fields = Fields::new();
    fields.insert(
        CONTENT.to_string(),
        Value::String(blake3::hash(bytes).to_hex().to_string()),
    );
    fields
}

/// Write via a temp file in the same directory, then rename
fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(content)?;
    file.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(file.path(), fs::Permissions::from_mode(0o644))?;
    }

    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl Provider for TemplateFileProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn target_key(&self, resource: &ResourceInstance) -> String {
        match self.path(resource) {
            Ok(path) => format!("file:{}", path.display()),
            Err(_) => resource.key(),
        }
    }

    fn probe(&self, resource: &ResourceInstance, _ctx: &ApplyContext) -> declarative::Result<CurrentState> {
        let path = self.path(resource)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(CurrentState::Present(content_state(&bytes))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(CurrentState::NotPresent),
            Err(e) => Err(ConvergeError::probe(format!(
                "cannot read {}: {e}",
                path.display()
            ))),
        }
    }

    fn desired(
        &self,
        resource: &ResourceInstance,
        _current: &CurrentState,
        _ctx: &ApplyContext,
    ) -> declarative::Result<DesiredState> {
        if resource.action().is_removal() {
            return Ok(DesiredState::Absent);
        }
        Ok(DesiredState::Present(content_state(&self.render(resource)?)))
    }

    fn apply(
        &self,
        resource: &ResourceInstance,
        _desired: &DesiredState,
        _current: &CurrentState,
        _ctx: &ApplyContext,
    ) -> declarative::Result<()> {
        let path = self.path(resource)?;

        if resource.action() == Action::Delete {
            log::debug!("Removing {}", path.display());
            return match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(ConvergeError::apply(format!(
                    "cannot remove {}: {e}",
                    path.display()
                ))),
            };
        }

        let content = self.render(resource)?;
        log::debug!("Writing {} ({} bytes)", path.display(), content.len());
        write_atomic(&path, &content)
            .map_err(|e| ConvergeError::apply(format!("cannot write {}: {e}", path.display())))
    }
}
