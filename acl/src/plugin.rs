use std::{collections::HashMap, sync::Arc};

use tracing::info;

use crate::{
    dal::Dal,
    model::{AccessCtlObjectId, AccessType, ObjectClass, ObjectId, UserId},
    policy::{
        AccessPolicy, AccessRequest, AclAccessPolicy, DefaultVerifier, OwnerAccessPolicy, Policy,
        Verifier,
    },
    schema, Error,
};

pub const PLUGIN_ID: &str = "accessControlPlugin";

/// Name of the built-in [AclAccessPolicy].
pub const ACL_ACCESS_POLICY: &str = "aclAccessPolicy";
/// Name of the built-in [OwnerAccessPolicy].
pub const OWNER_ACCESS_POLICY: &str = "ownerAccessPolicy";

/// Application specific settings for the plugin.
pub struct Config {
    policies: Vec<(String, Arc<dyn AccessPolicy>)>,
    verifier: Arc<dyn Verifier>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policies: Vec::new(),
            verifier: Arc::new(DefaultVerifier),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extra policy. Using a built-in name replaces that built-in.
    pub fn with_policy(
        mut self,
        name: impl Into<String>,
        policy: impl AccessPolicy + 'static,
    ) -> Self {
        self.policies.push((name.into(), Arc::new(policy)));
        self
    }

    /// Wrap every policy with `verifier` instead of [DefaultVerifier].
    pub fn with_verifier(mut self, verifier: impl Verifier + 'static) -> Self {
        self.verifier = Arc::new(verifier);
        self
    }
}

/// The running plugin: the ACL store and the named policies guarding it.
#[derive(Clone)]
pub struct AccessControl {
    dal: Arc<dyn Dal>,
    policies: HashMap<String, Policy>,
}

impl AccessControl {
    /// Check the installed schema and instantiate the configured policies.
    pub async fn start(dal: Arc<dyn Dal>, config: Config) -> Result<Self, Error> {
        schema::check(dal.as_ref()).await?;

        let builtins: [(String, Arc<dyn AccessPolicy>); 2] = [
            (ACL_ACCESS_POLICY.to_string(), Arc::new(AclAccessPolicy)),
            (OWNER_ACCESS_POLICY.to_string(), Arc::new(OwnerAccessPolicy)),
        ];

        let policies: HashMap<_, _> = builtins
            .into_iter()
            .chain(config.policies)
            .map(|(name, policy)| (name, Policy::new(policy, config.verifier.clone())))
            .collect();

        info!(
            plugin = PLUGIN_ID,
            policies = policies.len(),
            "access control started"
        );

        Ok(Self { dal, policies })
    }

    pub fn id(&self) -> &'static str {
        PLUGIN_ID
    }

    pub fn dal(&self) -> &dyn Dal {
        self.dal.as_ref()
    }

    pub fn policy(&self, name: &str) -> Option<&Policy> {
        self.policies.get(name)
    }

    /// Names of all registered policies, sorted.
    pub fn policy_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.policies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Verify `request` against the policy registered as `name`.
    pub async fn verify_access(
        &self,
        name: &str,
        request: &AccessRequest,
    ) -> Result<AccessCtlObjectId, Error> {
        let policy = self
            .policy(name)
            .ok_or_else(|| Error::UnknownPolicy(name.to_string()))?;

        policy.verify_access(self.dal(), request).await
    }

    pub async fn grant(
        &self,
        object_class: &ObjectClass,
        object_id: ObjectId,
        grantee_id: UserId,
        access_type: &AccessType,
    ) -> Result<(), Error> {
        self.dal
            .grant(object_class, object_id, grantee_id, access_type)
            .await?;

        Ok(())
    }

    pub async fn revoke(
        &self,
        object_class: &ObjectClass,
        object_id: ObjectId,
        grantee_id: UserId,
        access_type: &AccessType,
    ) -> Result<(), Error> {
        self.dal
            .revoke(object_class, object_id, grantee_id, access_type)
            .await?;

        Ok(())
    }

    pub async fn add_access_ctl_object(
        &self,
        object_class: &ObjectClass,
        object_id: ObjectId,
        owner_id: UserId,
    ) -> Result<AccessCtlObjectId, Error> {
        Ok(self
            .dal
            .add_access_ctl_object(object_class, object_id, owner_id)
            .await?)
    }
}
