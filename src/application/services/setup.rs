//! Database setup generation service
//!
//! Scans service directories and aggregates their database requirements
//! into the postgres init script and the container env file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::application::services::discovery::{
    discover_service_dirs, read_secret, read_service_config,
};
use crate::application::{ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{
    env_entry, env_header, sql_block, DomainError, MissingFields, OutputBuffer,
    ServiceDescriptor, SkippedService,
};
use crate::infrastructure::traits::FileSystem;

/// Result of scanning a root directory.
#[derive(Debug, Clone)]
pub struct GeneratedSetup {
    /// Services included in the output, in scan order
    pub services: Vec<ServiceDescriptor>,
    /// Directories with a config file that lacked required fields
    pub skipped: Vec<SkippedService>,
    /// Lines of init.sql
    pub sql: OutputBuffer,
    /// Lines of the container env file
    pub env: OutputBuffer,
}

/// Locations of the generated files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub dir: PathBuf,
    pub sql: PathBuf,
    pub env: PathBuf,
}

/// Per-directory result of `SetupService::list`.
#[derive(Debug, Clone)]
pub enum ServiceStatus {
    Ready {
        service: ServiceDescriptor,
        secret_present: bool,
    },
    Incomplete(SkippedService),
}

/// Service generating the postgres init files.
pub struct SetupService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl SetupService {
    /// Create a new setup service.
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    /// Scan `root` and build both output buffers.
    ///
    /// Directories without a config file are ignored. Configs missing a
    /// required field are collected in `skipped`. A missing or empty
    /// password aborts the scan with `DomainError::MissingSecret`.
    pub fn generate(&self, root: &Path) -> ApplicationResult<GeneratedSetup> {
        debug!("generate: root={}", root.display());
        let mut services = Vec::new();
        let mut skipped = Vec::new();
        let mut sql = OutputBuffer::new();
        let mut env = OutputBuffer::new();
        env.extend(env_header(
            &self.settings.admin.user,
            &self.settings.admin.password,
        ));

        for dir in discover_service_dirs(self.fs.as_ref(), root)? {
            let service = match self.load_service(&dir)? {
                None => continue,
                Some(Err(missing)) => {
                    debug!("generate: skipping {} (missing {:?})", dir.display(), missing.fields);
                    skipped.push(missing);
                    continue;
                }
                Some(Ok(service)) => service,
            };

            let secrets_path = self.secrets_path(&dir);
            let key = &self.settings.password_key;
            let password = read_secret(self.fs.as_ref(), &secrets_path, key)?
                .filter(|secret| !secret.is_empty())
                .ok_or_else(|| DomainError::MissingSecret {
                    key: key.clone(),
                    path: secrets_path.clone(),
                })?;

            info!(
                "generate: {} -> database {} for user {}",
                service.name, service.database, service.user
            );
            sql.extend(sql_block(&service, &password));
            env.extend(env_entry(&service, &password));
            services.push(service);
        }

        Ok(GeneratedSetup {
            services,
            skipped,
            sql,
            env,
        })
    }

    /// Write both buffers, creating the output directory if needed.
    pub fn write(&self, root: &Path, setup: &GeneratedSetup) -> ApplicationResult<OutputPaths> {
        let paths = self.output_paths(root);
        self.fs
            .create_dir_all(&paths.dir)
            .with_path_context("create output directory", &paths.dir)?;
        self.fs
            .write(&paths.sql, &setup.sql.render())
            .with_path_context("write sql script", &paths.sql)?;
        self.fs
            .write(&paths.env, &setup.env.render())
            .with_path_context("write env file", &paths.env)?;
        debug!("write: {} and {}", paths.sql.display(), paths.env.display());
        Ok(paths)
    }

    /// Where `write` puts the generated files for `root`.
    pub fn output_paths(&self, root: &Path) -> OutputPaths {
        let dir = if self.settings.output_dir.is_absolute() {
            self.settings.output_dir.clone()
        } else {
            root.join(&self.settings.output_dir)
        };
        OutputPaths {
            sql: dir.join(&self.settings.sql_file),
            env: dir.join(&self.settings.env_file),
            dir,
        }
    }

    /// Report every directory that has a config file, without aborting on
    /// missing secrets and without writing anything.
    pub fn list(&self, root: &Path) -> ApplicationResult<Vec<ServiceStatus>> {
        let mut statuses = Vec::new();
        for dir in discover_service_dirs(self.fs.as_ref(), root)? {
            let status = match self.load_service(&dir)? {
                None => continue,
                Some(Err(missing)) => ServiceStatus::Incomplete(missing),
                Some(Ok(service)) => {
                    let secret = read_secret(
                        self.fs.as_ref(),
                        &self.secrets_path(&dir),
                        &self.settings.password_key,
                    )?;
                    ServiceStatus::Ready {
                        service,
                        secret_present: secret.is_some_and(|s| !s.is_empty()),
                    }
                }
            };
            statuses.push(status);
        }
        Ok(statuses)
    }

    /// Read the config of one directory.
    ///
    /// `None` when the directory has no config file.
    fn load_service(
        &self,
        dir: &Path,
    ) -> ApplicationResult<Option<Result<ServiceDescriptor, MissingFields>>> {
        let config_path = dir.join(&self.settings.config_file);
        if !self.fs.is_file(&config_path) {
            debug!("load_service: no {} in {}", self.settings.config_file, dir.display());
            return Ok(None);
        }
        let config = read_service_config(self.fs.as_ref(), &config_path)?;
        Ok(Some(ServiceDescriptor::from_config(dir.to_path_buf(), &config)))
    }

    fn secrets_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.settings.secrets_file)
    }
}
