//! Transaction orchestrator
//!
//! [`Provider`] runs the create, read, update, delete and import flows of any
//! [`Resource`] against sessions opened by a [`SessionFactory`]:
//!
//! - **create**: compatibility and prerequisite checks, existence pre-check,
//!   lock, load `set` lines, commit, unlock, existence post-check
//! - **update**: lock, load `delete` lines of the prior state, load `set`
//!   lines of the new configuration, commit, unlock
//! - **delete**: lock, load `delete` lines, commit, unlock
//! - **read**: under the [`ReadCoordinator`], `show configuration` then parse
//!
//! Any failure after the lock discards the candidate configuration and
//! releases the lock. Failures of that cleanup, of the unlock and of closing
//! the session become warnings of the [`Outcome`]; they never replace the
//! primary error. Nothing is retried.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::coordinator::ReadCoordinator;
use super::ident::split_id;
use super::resource::Resource;
use super::text::has_configuration;
use crate::diagnostics::{Diagnostic, Diagnostics, Outcome};
use crate::error::{Error, Result};
use crate::session::{CommitOptions, DeviceSession, SessionFactory, SetFile};

/// Behavior switches of the orchestrator
#[derive(Debug, Clone, Default)]
pub struct ProviderOptions {
    /// Commit with `confirmed` and this many minutes before auto-rollback
    pub commit_confirmed: Option<u32>,
    /// Write create lines to this file instead of the device
    pub fake_create: Option<SetFile>,
    /// Also write update lines to the set file
    pub fake_update_also: bool,
    /// Also write delete lines to the set file
    pub fake_delete_also: bool,
}

/// Identifier and configuration of a managed resource
#[derive(Debug, Clone, PartialEq)]
pub struct State<C> {
    pub id: String,
    pub config: C,
}

/// Result of reading a resource back from the device
#[derive(Debug, Clone, PartialEq)]
pub enum ReadState<C> {
    Present(State<C>),
    /// The resource no longer exists and should leave the tracked state
    Gone,
}

/// Drives resources through device transactions
pub struct Provider {
    sessions: Arc<dyn SessionFactory>,
    reads: ReadCoordinator,
    options: ProviderOptions,
}

impl Provider {
    pub fn new(sessions: Arc<dyn SessionFactory>) -> Self {
        Self {
            sessions,
            reads: ReadCoordinator::global(),
            options: ProviderOptions::default(),
        }
    }

    pub fn with_reads(mut self, reads: ReadCoordinator) -> Self {
        self.reads = reads;
        self
    }

    pub fn with_options(mut self, options: ProviderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ProviderOptions {
        &self.options
    }

    /// Lines an update from `prior` to `config` would load
    pub fn plan<R: Resource>(
        &self,
        resource: &R,
        prior: &R::Config,
        config: &R::Config,
    ) -> Result<Vec<String>> {
        let (validation, _) = validate(resource, config);
        validation?;
        let mut lines = resource.delete_lines(prior);
        lines.extend(resource.set_lines(config)?);
        Ok(lines)
    }

    // ========================================================================
    // Create
    // ========================================================================

    pub async fn create<R: Resource>(
        &self,
        resource: &R,
        config: R::Config,
    ) -> Outcome<State<R::Config>> {
        let (validation, mut warnings) = validate(resource, &config);
        if let Err(err) = validation {
            return Outcome::err(err).with_warnings(warnings);
        }
        let id = resource.id(&config);
        info!(resource = R::TYPE_NAME, id = %id, "Creating resource");

        if let Some(ref set_file) = self.options.fake_create {
            let result = match resource.set_lines(&config) {
                Ok(lines) => set_file.append(&lines).await,
                Err(err) => Err(err),
            };
            return Outcome::from_result(result.map(|_| State { id, config }))
                .with_warnings(warnings);
        }

        let mut session = match self.sessions.open().await {
            Ok(session) => session,
            Err(err) => return Outcome::err(err).with_warnings(warnings),
        };
        let result = self
            .create_in_session(resource, &config, session.as_mut(), &mut warnings)
            .await;
        close(session, &mut warnings).await;

        Outcome::from_result(result.map(|_| State { id, config })).with_warnings(warnings)
    }

    async fn create_in_session<R: Resource>(
        &self,
        resource: &R,
        config: &R::Config,
        session: &mut dyn DeviceSession,
        warnings: &mut Vec<Diagnostic>,
    ) -> Result<()> {
        if resource.requires_security() {
            let info = session.system_information().await?;
            if !info.is_security_capable() {
                return Err(Error::Incompatible {
                    resource: R::TYPE_NAME.to_string(),
                    model: info.hardware_model,
                });
            }
        }
        for prerequisite in resource.prerequisites(config) {
            let output = session
                .command(&show_command(&prerequisite.path, false))
                .await?;
            if !has_configuration(&output) {
                return Err(Error::MissingParent(prerequisite.message));
            }
        }
        if resource.checks_existence() && exists(resource, config, session).await? {
            return Err(Error::AlreadyExists {
                resource: R::TYPE_NAME.to_string(),
                id: resource.id(config),
            });
        }

        let batches = vec![resource.set_lines(config)];
        self.transaction(session, commit_message::<R>("create"), batches, warnings)
            .await?;

        if resource.checks_existence() && !exists(resource, config, session).await? {
            return Err(Error::NotFoundAfterCommit {
                resource: R::TYPE_NAME.to_string(),
                id: resource.id(config),
            });
        }
        Ok(())
    }

    // ========================================================================
    // Read
    // ========================================================================

    pub async fn read<R: Resource>(
        &self,
        resource: &R,
        prior: &R::Config,
    ) -> Outcome<ReadState<R::Config>> {
        let mut warnings = Vec::new();
        let result = {
            let _guard = self.reads.acquire().await;
            self.read_device(resource, prior, &mut warnings).await
        };

        let result = result.map(|mut config| {
            let id = resource.id(&config);
            if id.is_empty() {
                debug!(resource = R::TYPE_NAME, "Resource no longer exists");
                return ReadState::Gone;
            }
            resource.carry_over(prior, &mut config);
            ReadState::Present(State { id, config })
        });
        Outcome::from_result(result).with_warnings(warnings)
    }

    async fn read_device<R: Resource>(
        &self,
        resource: &R,
        key: &R::Config,
        warnings: &mut Vec<Diagnostic>,
    ) -> Result<R::Config> {
        let mut session = self.sessions.open().await?;
        let output = session
            .command(&show_command(&resource.show_path(key), true))
            .await;
        close(session, warnings).await;

        let (config, report) = resource.read(key, &output?)?;
        debug!(
            resource = R::TYPE_NAME,
            matched = report.matched,
            unmatched = report.unmatched,
            "Read configuration"
        );
        Ok(config)
    }

    // ========================================================================
    // Update
    // ========================================================================

    pub async fn update<R: Resource>(
        &self,
        resource: &R,
        prior: &R::Config,
        config: R::Config,
    ) -> Outcome<State<R::Config>> {
        let (validation, mut warnings) = validate(resource, &config);
        if let Err(err) = validation {
            return Outcome::err(err).with_warnings(warnings);
        }
        let id = resource.id(&config);
        let prior_id = resource.id(prior);
        if !prior_id.is_empty() && prior_id != id {
            return Outcome::err(Error::InvalidInput {
                resource: R::TYPE_NAME.to_string(),
                message: format!(
                    "identifier cannot change from '{}' to '{}', the resource must be replaced",
                    prior_id, id
                ),
            })
            .with_warnings(warnings);
        }
        info!(resource = R::TYPE_NAME, id = %id, "Updating resource");

        if let Some(set_file) = self.fake_file(self.options.fake_update_also) {
            let mut lines = resource.delete_lines(prior);
            let result = match resource.set_lines(&config) {
                Ok(set_lines) => {
                    lines.extend(set_lines);
                    set_file.append(&lines).await
                }
                Err(err) => Err(err),
            };
            return Outcome::from_result(result.map(|_| State { id, config }))
                .with_warnings(warnings);
        }

        let mut session = match self.sessions.open().await {
            Ok(session) => session,
            Err(err) => return Outcome::err(err).with_warnings(warnings),
        };
        let batches = vec![Ok(resource.delete_lines(prior)), resource.set_lines(&config)];
        let result = self
            .transaction(
                session.as_mut(),
                commit_message::<R>("update"),
                batches,
                &mut warnings,
            )
            .await;
        close(session, &mut warnings).await;

        Outcome::from_result(result.map(|_| State { id, config })).with_warnings(warnings)
    }

    // ========================================================================
    // Delete
    // ========================================================================

    pub async fn delete<R: Resource>(&self, resource: &R, config: &R::Config) -> Outcome<()> {
        let lines = resource.destroy_lines(config);
        info!(resource = R::TYPE_NAME, id = %resource.id(config), "Deleting resource");
        if lines.is_empty() {
            debug!(resource = R::TYPE_NAME, "Nothing to remove from the device");
            return Outcome::ok(());
        }

        if let Some(set_file) = self.fake_file(self.options.fake_delete_also) {
            return Outcome::from_result(set_file.append(&lines).await);
        }

        let mut warnings = Vec::new();
        let mut session = match self.sessions.open().await {
            Ok(session) => session,
            Err(err) => return Outcome::err(err),
        };
        let result = self
            .transaction(
                session.as_mut(),
                commit_message::<R>("delete"),
                vec![Ok(lines)],
                &mut warnings,
            )
            .await;
        close(session, &mut warnings).await;

        Outcome::from_result(result).with_warnings(warnings)
    }

    // ========================================================================
    // Import
    // ========================================================================

    pub async fn import<R: Resource>(&self, resource: &R, id: &str) -> Outcome<State<R::Config>> {
        let key = match split_id(R::TYPE_NAME, id, R::ID_PARTS, R::ID_FORMAT)
            .and_then(|parts| resource.from_import_id(&parts))
        {
            Ok(key) => key,
            Err(err) => return Outcome::err(err),
        };
        info!(resource = R::TYPE_NAME, id = %id, "Importing resource");

        let Outcome { result, warnings } = self.read(resource, &key).await;
        let result = result.and_then(|state| match state {
            ReadState::Present(state) => Ok(state),
            ReadState::Gone => Err(Error::ImportNotFound {
                resource: R::TYPE_NAME.to_string(),
                id: id.to_string(),
                expected: R::ID_FORMAT.to_string(),
            }),
        });
        Outcome::from_result(result).with_warnings(warnings)
    }

    // ========================================================================
    // Transaction
    // ========================================================================

    fn fake_file(&self, enabled: bool) -> Option<&SetFile> {
        self.options.fake_create.as_ref().filter(|_| enabled)
    }

    /// Lock, load every batch in order, commit and unlock
    async fn transaction(
        &self,
        session: &mut dyn DeviceSession,
        message: String,
        batches: Vec<Result<Vec<String>>>,
        warnings: &mut Vec<Diagnostic>,
    ) -> Result<()> {
        session.config_lock().await?;

        let mut options = CommitOptions::new().with_comment(message);
        if let Some(minutes) = self.options.commit_confirmed {
            options = options.with_confirm_timeout(minutes);
        }

        match load_and_commit(session, batches, &options).await {
            Ok(commit_warnings) => {
                warnings.extend(commit_warnings.into_iter().map(Diagnostic::warning));
                unlock(session, warnings).await;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Transaction failed, discarding candidate configuration");
                if let Err(clear_err) = session.config_clear().await {
                    warnings.push(
                        Diagnostic::warning("failed to clear candidate configuration")
                            .with_detail(clear_err.to_string()),
                    );
                }
                unlock(session, warnings).await;
                Err(err)
            }
        }
    }
}

async fn load_and_commit(
    session: &mut dyn DeviceSession,
    batches: Vec<Result<Vec<String>>>,
    options: &CommitOptions,
) -> Result<Vec<String>> {
    for batch in batches {
        let lines = batch?;
        if lines.is_empty() {
            continue;
        }
        debug!(lines = lines.len(), "Loading configuration lines");
        session.config_set(&lines).await?;
    }
    session.commit_conf(options).await
}

async fn unlock(session: &mut dyn DeviceSession, warnings: &mut Vec<Diagnostic>) {
    if let Err(err) = session.config_unlock().await {
        warnings.push(
            Diagnostic::warning("failed to unlock configuration").with_detail(err.to_string()),
        );
    }
}

async fn close(mut session: Box<dyn DeviceSession>, warnings: &mut Vec<Diagnostic>) {
    if let Err(err) = session.close().await {
        warnings.push(Diagnostic::warning("failed to close session").with_detail(err.to_string()));
    }
}

async fn exists<R: Resource>(
    resource: &R,
    key: &R::Config,
    session: &mut dyn DeviceSession,
) -> Result<bool> {
    let output = session
        .command(&show_command(&resource.show_path(key), true))
        .await?;
    let (config, _) = resource.read(key, &output)?;
    Ok(!resource.id(&config).is_empty())
}

fn validate<R: Resource>(resource: &R, config: &R::Config) -> (Result<()>, Vec<Diagnostic>) {
    let mut diags = Diagnostics::new();
    resource.validate(config, &mut diags);
    let warnings = diags.warnings().cloned().collect();
    (diags.into_result(), warnings)
}

fn show_command(path: &str, relative: bool) -> String {
    if relative {
        format!("show configuration {} | display set relative", path)
    } else {
        format!("show configuration {} | display set", path)
    }
}

fn commit_message<R: Resource>(action: &str) -> String {
    format!("{} resource {}", action, R::TYPE_NAME)
}
