//! Access policies decide whether a user may touch an application object.
//!
//! A policy either returns the [AccessCtlObjectId] backing the requested object or
//! rejects the request with [Error::Forbidden]. Every policy call goes through a
//! [Verifier], which applications can replace to add their own checks around the
//! policies.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::{
    dal::Dal,
    model::{AccessCtlObjectId, AccessType, ObjectClass, ObjectId, UserId},
    Error,
};

/// Who wants to access what. `user_id` is `None` for anonymous requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequest {
    pub user_id: Option<UserId>,
    pub object_class: ObjectClass,
    pub object_id: ObjectId,
    pub access_type: Option<AccessType>,
}

impl AccessRequest {
    pub fn new(user_id: Option<UserId>, object_class: ObjectClass, object_id: ObjectId) -> Self {
        Self {
            user_id,
            object_class,
            object_id,
            access_type: None,
        }
    }

    pub fn with_access_type(mut self, access_type: AccessType) -> Self {
        self.access_type = Some(access_type);
        self
    }
}

#[async_trait]
pub trait AccessPolicy: Send + Sync {
    async fn verify(
        &self,
        dal: &dyn Dal,
        request: &AccessRequest,
    ) -> Result<AccessCtlObjectId, Error>;
}

/// Requires a rule granting the requested access type to the requester.
#[derive(Debug, Default, Clone, Copy)]
pub struct AclAccessPolicy;

#[async_trait]
impl AccessPolicy for AclAccessPolicy {
    async fn verify(
        &self,
        dal: &dyn Dal,
        request: &AccessRequest,
    ) -> Result<AccessCtlObjectId, Error> {
        let Some(user_id) = request.user_id else {
            return Err(Error::Forbidden);
        };
        let access_type = request
            .access_type
            .as_ref()
            .ok_or(Error::MissingArgument("access type"))?;

        match dal
            .find_rule(&request.object_class, request.object_id, user_id, access_type)
            .await?
        {
            Some(aco_id) => Ok(aco_id),
            None => {
                debug!(
                    user_id,
                    object_class = %request.object_class,
                    object_id = request.object_id,
                    %access_type,
                    "no access rule found"
                );

                Err(Error::Forbidden)
            }
        }
    }
}

/// Requires the requester to own the requested object.
#[derive(Debug, Default, Clone, Copy)]
pub struct OwnerAccessPolicy;

#[async_trait]
impl AccessPolicy for OwnerAccessPolicy {
    async fn verify(
        &self,
        dal: &dyn Dal,
        request: &AccessRequest,
    ) -> Result<AccessCtlObjectId, Error> {
        let Some(user_id) = request.user_id else {
            return Err(Error::Forbidden);
        };

        match dal
            .find_ownership(&request.object_class, request.object_id, user_id)
            .await?
        {
            Some(aco_id) => Ok(aco_id),
            None => {
                debug!(
                    user_id,
                    object_class = %request.object_class,
                    object_id = request.object_id,
                    "requester is not the owner"
                );

                Err(Error::Forbidden)
            }
        }
    }
}

/// Runs a policy against a request.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(
        &self,
        policy: &dyn AccessPolicy,
        dal: &dyn Dal,
        request: &AccessRequest,
    ) -> Result<AccessCtlObjectId, Error>;
}

/// Defers entirely to the policy.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultVerifier;

#[async_trait]
impl Verifier for DefaultVerifier {
    async fn verify(
        &self,
        policy: &dyn AccessPolicy,
        dal: &dyn Dal,
        request: &AccessRequest,
    ) -> Result<AccessCtlObjectId, Error> {
        policy.verify(dal, request).await
    }
}

/// A policy bound to the verifier it was configured with.
#[derive(Clone)]
pub struct Policy {
    policy: Arc<dyn AccessPolicy>,
    verifier: Arc<dyn Verifier>,
}

impl Policy {
    pub fn new(policy: Arc<dyn AccessPolicy>, verifier: Arc<dyn Verifier>) -> Self {
        Self { policy, verifier }
    }

    pub async fn verify_access(
        &self,
        dal: &dyn Dal,
        request: &AccessRequest,
    ) -> Result<AccessCtlObjectId, Error> {
        self.verifier
            .verify(self.policy.as_ref(), dal, request)
            .await
    }
}
