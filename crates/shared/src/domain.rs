use std::fmt;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    protocol::{
        NewPost, NewProfessor, NewStudent, PostChanges, ProfessorChanges, StudentChanges,
    },
    validation::Validate,
};

/// Opaque record identifier assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Professor,
    Student,
}

impl Role {
    pub fn can_manage_content(self) -> bool {
        matches!(self, Role::Professor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Which collection a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Post,
    Professor,
    Student,
}

impl EntityKind {
    /// Path segment used when the configuration does not override it.
    pub fn default_collection(self) -> &'static str {
        match self {
            EntityKind::Post => "posts",
            EntityKind::Professor => "professors",
            EntityKind::Student => "students",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Post => "post",
            EntityKind::Professor => "professor",
            EntityKind::Student => "student",
        }
    }
}

/// Implemented by every record type the client lists and mutates.
pub trait Entity: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;
    /// Payload accepted by the create endpoint.
    type Draft: Serialize + Validate + Send + Sync;
    /// Payload accepted by the update endpoint; absent fields are left as is.
    type Changes: Serialize + Validate + Send + Sync;

    fn id(&self) -> &EntityId;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id", alias = "id")]
    pub id: EntityId,
    #[serde(alias = "titulo")]
    pub title: String,
    #[serde(alias = "conteudo")]
    pub body: String,
    #[serde(alias = "autor")]
    pub author: String,
    #[serde(default, alias = "disciplina", skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(alias = "dataCriacao")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "dataAtualizacao")]
    pub updated_at: DateTime<Utc>,
}

impl Entity for Post {
    const KIND: EntityKind = EntityKind::Post;
    type Draft = NewPost;
    type Changes = PostChanges;

    fn id(&self) -> &EntityId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Professor {
    #[serde(rename = "_id", alias = "id")]
    pub id: EntityId,
    #[serde(alias = "nome")]
    pub name: String,
    pub email: String,
    #[serde(default, alias = "disciplina", skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(alias = "dataCriacao")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "dataAtualizacao")]
    pub updated_at: DateTime<Utc>,
}

impl Entity for Professor {
    const KIND: EntityKind = EntityKind::Professor;
    type Draft = NewProfessor;
    type Changes = ProfessorChanges;

    fn id(&self) -> &EntityId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(rename = "_id", alias = "id")]
    pub id: EntityId,
    #[serde(alias = "nome")]
    pub name: String,
    pub email: String,
    #[serde(default, alias = "turma", skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(alias = "dataCriacao")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "dataAtualizacao")]
    pub updated_at: DateTime<Utc>,
}

impl Entity for Student {
    const KIND: EntityKind = EntityKind::Student;
    type Draft = NewStudent;
    type Changes = StudentChanges;

    fn id(&self) -> &EntityId {
        &self.id
    }
}
