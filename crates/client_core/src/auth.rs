//! Credential verification and the signed-in session.
//!
//! The backend exposes no login endpoint, so the verifier is a seam: the
//! shipped [`DemoCredentialVerifier`] checks a configured account list and any
//! real identity provider can be substituted behind [`CredentialVerifier`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use shared::{
    domain::{Role, User},
    error::ValidationErrors,
    validation::{login_schema, LoginForm},
};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    #[error("sign in required")]
    Unauthenticated,
    #[error("only professors can manage records")]
    Forbidden,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub token: String,
}

impl Session {
    pub fn can_manage_content(&self) -> bool {
        self.user.role.can_manage_content()
    }
}

#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Session, AuthError>;
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DemoAccount {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl DemoAccount {
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                id: "1".into(),
                name: "Professor Demo".into(),
                email: "professor@blog.com".into(),
                password: "professor123".into(),
                role: Role::Professor,
            },
            Self {
                id: "2".into(),
                name: "Student Demo".into(),
                email: "aluno@blog.com".into(),
                password: "aluno123".into(),
                role: Role::Student,
            },
        ]
    }
}

pub struct DemoCredentialVerifier {
    accounts: Vec<DemoAccount>,
}

impl DemoCredentialVerifier {
    pub fn new(accounts: Vec<DemoAccount>) -> Self {
        Self { accounts }
    }
}

impl Default for DemoCredentialVerifier {
    fn default() -> Self {
        Self::new(DemoAccount::defaults())
    }
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[async_trait]
impl CredentialVerifier for DemoCredentialVerifier {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let account = self
            .accounts
            .iter()
            .find(|account| account.email.eq_ignore_ascii_case(email.trim()))
            .filter(|account| constant_time_compare(&account.password, password))
            .ok_or(AuthError::InvalidCredentials)?;

        Ok(Session {
            user: User {
                id: account.id.clone(),
                name: account.name.clone(),
                email: account.email.clone(),
                role: account.role,
            },
            token: Uuid::new_v4().to_string(),
        })
    }
}

/// Holds the current session; mutation actions are gated on its role.
pub struct AuthContext {
    verifier: Arc<dyn CredentialVerifier>,
    session: RwLock<Option<Session>>,
}

impl AuthContext {
    pub fn new(verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self {
            verifier,
            session: RwLock::new(None),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        login_schema().validate(&LoginForm { email, password })?;

        match self.verifier.authenticate(email, password).await {
            Ok(session) => {
                let user = session.user.clone();
                info!(user_id = %user.id, role = ?user.role, "auth: signed in");
                *self.session.write().await = Some(session);
                Ok(user)
            }
            Err(err) => {
                warn!("auth: sign in rejected: {err}");
                Err(err)
            }
        }
    }

    pub async fn logout(&self) {
        if let Some(session) = self.session.write().await.take() {
            info!(user_id = %session.user.id, "auth: signed out");
        }
    }

    pub async fn current_user(&self) -> Option<User> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|session| session.user.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_some()
    }

    pub async fn require_professor(&self) -> Result<Session, AuthError> {
        match self.session.read().await.as_ref() {
            None => Err(AuthError::Unauthenticated),
            Some(session) if !session.can_manage_content() => Err(AuthError::Forbidden),
            Some(session) => Ok(session.clone()),
        }
    }
}
