use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Access Control Vocabulary ---

/// Role
///
/// The closed set of roles the Quiz Master application grants. Claims carrying any
/// other role string are treated as unrecognized by the gate rather than silently
/// compared as raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Parses the exact role string issued by the backend. Matching is case-sensitive.
    pub fn parse(raw: &str) -> Option<Role> {
        match raw {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    /// The dashboard a holder of this role lands on when denied a route.
    pub fn home(&self) -> RedirectTarget {
        match self {
            Role::Admin => RedirectTarget::AdminDashboard,
            Role::User => RedirectTarget::UserDashboard,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RouteMeta
///
/// The effective access-control metadata of a resolved route. For nested routes
/// this is the parent's metadata overridden by the child's own declarations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RouteMeta {
    #[serde(default)]
    pub requires_auth: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub role: Option<Role>,
}

impl RouteMeta {
    pub fn public() -> Self {
        Self::default()
    }

    pub fn authenticated() -> Self {
        Self {
            requires_auth: true,
            role: None,
        }
    }

    pub fn restricted(role: Role) -> Self {
        Self {
            requires_auth: true,
            role: Some(role),
        }
    }
}

/// DeclaredMeta
///
/// Metadata exactly as written on a route declaration. Absent fields inherit
/// from the enclosing layout route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclaredMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_auth: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl DeclaredMeta {
    pub fn restricted(role: Role) -> Self {
        Self {
            requires_auth: Some(true),
            role: Some(role),
        }
    }

    /// Applies these declarations on top of an inherited effective meta.
    pub fn merge_onto(&self, inherited: RouteMeta) -> RouteMeta {
        RouteMeta {
            requires_auth: self.requires_auth.unwrap_or(inherited.requires_auth),
            role: self.role.or(inherited.role),
        }
    }
}

// --- Route Declarations ---

/// RouteDescriptor
///
/// A static declaration of a navigable path. Child paths are relative to the parent
/// path, and children inherit the parent's metadata. This is the shape accepted
/// when loading a route table from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDescriptor {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub component: String,
    #[serde(default)]
    pub meta: DeclaredMeta,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteDescriptor>,
}

impl RouteDescriptor {
    pub fn new(path: &str, name: &str, component: &str) -> Self {
        Self {
            path: path.to_string(),
            name: Some(name.to_string()),
            component: component.to_string(),
            meta: DeclaredMeta::default(),
            children: Vec::new(),
        }
    }

    pub fn with_meta(mut self, meta: DeclaredMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_children(mut self, children: Vec<RouteDescriptor>) -> Self {
        self.children = children;
        self
    }
}

/// ResolvedRoute
///
/// The flattened form of a declaration: absolute path plus effective metadata.
/// This is what the gate evaluates and what `GET /routes` lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ResolvedRoute {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub name: Option<String>,
    pub component: String,
    pub meta: RouteMeta,
}

// --- Gate Outcomes ---

/// RedirectTarget
///
/// The well-known routes the gate may send a caller to. The route table maps each
/// of them to a concrete path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum RedirectTarget {
    Login,
    AdminDashboard,
    UserDashboard,
}

impl RedirectTarget {
    pub const ALL: [RedirectTarget; 3] = [
        RedirectTarget::Login,
        RedirectTarget::AdminDashboard,
        RedirectTarget::UserDashboard,
    ];

    /// Name of the route declaration that backs this target.
    pub fn route_name(&self) -> &'static str {
        match self {
            RedirectTarget::Login => "Login",
            RedirectTarget::AdminDashboard => "AdminDashboard",
            RedirectTarget::UserDashboard => "UserDashboard",
        }
    }
}

/// RedirectReason
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum RedirectReason {
    /// The route requires authentication and no credential is stored.
    Unauthenticated,
    /// The stored credential could not be decoded into a claim.
    InvalidCredential,
    /// The claim's role differs from the role the route requires.
    RoleMismatch,
    /// The claim names a role outside the known set.
    UnrecognizedRole,
}

/// Decision
///
/// The gate's verdict for a single navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "outcome", rename_all = "camelCase")]
#[ts(export)]
pub enum Decision {
    Allow,
    Redirect {
        target: RedirectTarget,
        reason: RedirectReason,
    },
}

impl Decision {
    pub fn redirect(target: RedirectTarget, reason: RedirectReason) -> Self {
        Decision::Redirect { target, reason }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn target(&self) -> Option<RedirectTarget> {
        match self {
            Decision::Allow => None,
            Decision::Redirect { target, .. } => Some(*target),
        }
    }

    /// Whether the caller must delete the stored credential before following
    /// this decision.
    pub fn purges_credential(&self) -> bool {
        matches!(
            self,
            Decision::Redirect {
                reason: RedirectReason::InvalidCredential | RedirectReason::UnrecognizedRole,
                ..
            }
        )
    }
}

// --- Request Payloads (Input Schemas) ---

/// NavigateRequest
///
/// Input payload for `POST /navigate`. The credential is passed explicitly; the
/// service never reads ambient storage.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NavigateRequest {
    pub path: String,
    #[serde(default)]
    #[ts(optional)]
    pub token: Option<String>,
}

// --- Response Payloads (Output Schemas) ---

/// NavigationResponse
///
/// `location` is the requested path when allowed, otherwise the redirect target's
/// path. When `purgeCredential` is set the client must delete its stored token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NavigationResponse {
    pub requested: String,
    pub location: String,
    pub decision: Decision,
    pub purge_credential: bool,
}
