use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Company,
    Faculty,
    Scad,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Company => "company",
            Role::Faculty => "faculty",
            Role::Scad => "scad",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "company" => Ok(Role::Company),
            "faculty" => Ok(Role::Faculty),
            "scad" => Ok(Role::Scad),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// The authenticated caller of every workflow operation.
///
/// A company actor's id is the id of the company profile it manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(role: Role, id: Uuid) -> Self {
        Self { id, role }
    }

    pub fn student(id: Uuid) -> Self {
        Self::new(Role::Student, id)
    }

    pub fn company(id: Uuid) -> Self {
        Self::new(Role::Company, id)
    }

    pub fn faculty(id: Uuid) -> Self {
        Self::new(Role::Faculty, id)
    }

    pub fn scad(id: Uuid) -> Self {
        Self::new(Role::Scad, id)
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.role, self.id)
    }
}

/// Where a domain event should land. `id = None` addresses every holder of
/// the role (the SCAD office inbox).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub role: Role,
    pub id: Option<Uuid>,
}

impl Recipient {
    pub fn user(actor: Actor) -> Self {
        Self {
            role: actor.role,
            id: Some(actor.id),
        }
    }

    pub fn office(role: Role) -> Self {
        Self { role, id: None }
    }

    pub fn matches(&self, actor: &Actor) -> bool {
        self.role == actor.role && self.id.map_or(true, |id| id == actor.id)
    }
}
