//! Post-order traversal of a manifest.
//!
//! A visitor opts into the callbacks it cares about by returning itself from
//! the matching `as_*_visitor` accessor. For each environment the walk calls
//! every service, then every application, then the environment itself.

use tracing::trace;

use crate::manifest::{Application, Environment, Manifest, Service};
use crate::{Error, Result};

/// Called once for every service in every environment.
pub trait ServiceVisitor {
    fn service(&mut self, env: &Environment, svc: &Service) -> Result<()>;
}

/// Called once for every application deployed to an environment.
pub trait ApplicationVisitor {
    fn application(&mut self, env: &Environment, app: &Application) -> Result<()>;
}

/// Called once for every environment, after its services and applications.
pub trait EnvironmentVisitor {
    fn environment(&mut self, env: &Environment) -> Result<()>;
}

/// Capability dispatch for [`Manifest::walk`].
///
/// ```ignore
/// impl Visitor for Builder {
///     fn as_application_visitor(&mut self) -> Option<&mut dyn ApplicationVisitor> {
///         Some(self)
///     }
/// }
/// ```
pub trait Visitor {
    fn as_service_visitor(&mut self) -> Option<&mut dyn ServiceVisitor> {
        None
    }

    fn as_application_visitor(&mut self) -> Option<&mut dyn ApplicationVisitor> {
        None
    }

    fn as_environment_visitor(&mut self) -> Option<&mut dyn EnvironmentVisitor> {
        None
    }
}

impl Manifest {
    /// Visit every service, application and environment exactly once.
    ///
    /// Environments are visited in name order. The first error returned by a
    /// callback stops the walk and is returned unchanged.
    pub fn walk<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<()> {
        self.resolve_environment_refs()?;

        for env in self.sorted_environments() {
            trace!(env = %env.name, "Walking environment");
            if let Some(v) = visitor.as_service_visitor() {
                for svc in &env.services {
                    v.service(env, svc)?;
                }
            }

            if let Some(v) = visitor.as_application_visitor() {
                for app in &env.apps {
                    v.application(env, app)?;
                }
                for app in self.deployments_to(env) {
                    v.application(env, &app)?;
                }
            }

            if let Some(v) = visitor.as_environment_visitor() {
                v.environment(env)?;
            }
        }
        Ok(())
    }

    /// Environments ordered by name, leaving the manifest untouched.
    pub fn sorted_environments(&self) -> Vec<&Environment> {
        let mut envs: Vec<&Environment> = self.environments.iter().collect();
        envs.sort_by(|a, b| a.name.cmp(&b.name));
        envs
    }

    fn resolve_environment_refs(&self) -> Result<()> {
        self.apps
            .iter()
            .flat_map(|app| &app.environments)
            .find(|reference| self.environment(&reference.name).is_none())
            .map_or(Ok(()), |reference| {
                Err(Error::EnvironmentNotFound(reference.name.clone()))
            })
    }

    // Manifest-level applications as seen from one environment: the services
    // are the subset deployed there.
    fn deployments_to<'a>(
        &'a self,
        env: &'a Environment,
    ) -> impl Iterator<Item = Application> + 'a {
        self.apps.iter().flat_map(move |app| {
            app.environments
                .iter()
                .filter(move |reference| reference.name == env.name)
                .map(move |reference| Application {
                    name: app.name.clone(),
                    services: reference.services.clone(),
                    config_repo: app.config_repo.clone(),
                    environments: Vec::new(),
                })
        })
    }
}
